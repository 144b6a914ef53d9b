//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for courier
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(author, version, about = "Ask natural-language questions over your mail and calendar")]
#[command(long_about = r#"
Courier answers questions about a local mail and calendar corpus.

Each question runs through three stages:
1. Decompose: one model call plans a graph of retrieval/analysis steps
2. Execute: the graph runs group-by-group with bounded concurrency
3. Synthesize: one model call turns the compressed findings into an answer

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./courier.toml      Project-level config
3. ~/.config/courier/config.toml   Global config

Example:
  courier "what emails need my attention?"
  courier --mailbox demo/mailbox.json "who attended standup this week?"
  courier --chat
"#)]
pub struct Cli {
    /// The question to ask (not required in chat mode)
    pub question: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Path to the JSON mailbox corpus
    #[arg(short, long, value_name = "PATH")]
    pub mailbox: Option<PathBuf>,

    /// Answer preferences passed to synthesis (e.g. "terse bullets")
    #[arg(long, value_name = "TEXT")]
    pub preferences: Option<String>,

    /// Print the full response as JSON (for scripting)
    #[arg(long)]
    pub json: bool,

    /// Approve expensive plans without prompting
    #[arg(short, long)]
    pub yes: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_question_with_flags() {
        let cli = Cli::parse_from([
            "courier",
            "--mailbox",
            "demo/mailbox.json",
            "--json",
            "-vv",
            "what needs my attention?",
        ]);
        assert_eq!(cli.question.as_deref(), Some("what needs my attention?"));
        assert_eq!(cli.mailbox.as_deref().unwrap().to_str(), Some("demo/mailbox.json"));
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.chat);
    }

    #[test]
    fn test_chat_mode_needs_no_question() {
        let cli = Cli::parse_from(["courier", "--chat"]);
        assert!(cli.chat);
        assert!(cli.question.is_none());
    }
}
