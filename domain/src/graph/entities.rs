//! Execution graph entities
//!
//! These are the wire shapes produced by the decomposition model call. They
//! deserialize strictly: enum fields reject unknown members, so a malformed
//! decomposition fails before any node executes. Structural invariants that
//! serde cannot express (id uniqueness, acyclicity) live in
//! [`validation`](super::validation).

use crate::graph::strategy_method::StrategyMethod;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Broad category assigned to the user query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Lookup,
    Aggregation,
    Analysis,
    CrossDomain,
}

/// How involved the execution plan is expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

/// Data domains a query touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Email,
    Calendar,
    Contacts,
}

/// Classification of the user query, produced by decomposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryClassification {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    pub complexity: Complexity,
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub reasoning: String,
}

/// The technique and parameters executing one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySpec {
    pub method: StrategyMethod,
    /// Strategy-specific parameters; each strategy deserializes its own shape.
    #[serde(default)]
    pub params: Value,
}

/// Expected cost declared per node by the decomposition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectedCost {
    pub tokens: u64,
    pub llm_calls: u32,
    pub time_seconds: f64,
}

/// One atomic unit of retrieval+analysis work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InformationNode {
    /// Unique within the graph.
    pub id: String,
    pub description: String,
    /// Strategy tag; must agree with `strategy.method`.
    #[serde(rename = "type")]
    pub node_type: StrategyMethod,
    pub strategy: StrategySpec,
    /// Node ids whose results this node consumes.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Barrier group; groups execute in ascending order.
    pub parallel_group: u32,
    #[serde(default)]
    pub expected_cost: ExpectedCost,
}

/// Instructions for the final synthesis stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisInstructions {
    /// What the final answer should accomplish.
    pub task: String,
    /// Criteria used to rank items before capping (e.g. "urgency", "recency").
    pub ranking_criteria: Vec<String>,
    /// Desired answer shape (e.g. "bulleted summary").
    pub presentation_format: String,
    /// Tone/format/verbosity preferences carried from the user.
    pub user_preferences: Option<String>,
}

/// Whole-plan cost estimate; drives the confirmation short-circuit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceEstimate {
    pub total_items_accessed: u64,
    pub total_llm_calls: u32,
    pub estimated_tokens: u64,
    pub estimated_time_seconds: f64,
    pub estimated_cost_usd: f64,
    pub user_should_confirm: bool,
}

/// The DAG of information needs produced by decomposing one query.
///
/// Created fresh per request, consumed once by the coordinator, then
/// discarded. Nothing here outlives the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionGraph {
    pub query_classification: QueryClassification,
    pub information_needs: Vec<InformationNode>,
    #[serde(default)]
    pub synthesis_instructions: SynthesisInstructions,
    #[serde(default)]
    pub resource_estimate: ResourceEstimate,
}

impl ExecutionGraph {
    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&InformationNode> {
        self.information_needs.iter().find(|n| n.id == id)
    }

    /// Nodes partitioned by `parallel_group`, ascending.
    ///
    /// Each entry is `(group, nodes)`. Order within a group is the order the
    /// decomposition emitted, but callers must not rely on it: group members
    /// execute concurrently.
    pub fn parallel_groups(&self) -> Vec<(u32, Vec<&InformationNode>)> {
        let mut groups: Vec<(u32, Vec<&InformationNode>)> = Vec::new();
        let mut sorted: Vec<&InformationNode> = self.information_needs.iter().collect();
        sorted.sort_by_key(|n| n.parallel_group);
        for node in sorted {
            match groups.last_mut() {
                Some((group, members)) if *group == node.parallel_group => members.push(node),
                _ => groups.push((node.parallel_group, vec![node])),
            }
        }
        groups
    }
}
