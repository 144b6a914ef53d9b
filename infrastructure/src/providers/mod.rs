//! Model provider adapters

mod openai_gateway;

pub use openai_gateway::OpenAiGateway;
