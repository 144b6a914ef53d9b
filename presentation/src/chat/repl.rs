//! REPL (Read-Eval-Print Loop) for interactive chat
//!
//! Keeps the conversation history of the session and feeds it back into
//! every decomposition, so follow-up questions ("and last week?") resolve
//! against earlier turns.

use crate::progress::reporter::ProgressReporter;
use crate::ConsoleFormatter;
use courier_application::{NoProgress, ProcessQueryInput, ProcessQueryUseCase, QueryOutcome};
use reedline::{
    DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal,
};
use std::io;
use std::sync::Arc;

/// Most recent turns fed back into the decomposer.
const HISTORY_TURNS: usize = 10;

/// Interactive chat REPL
pub struct ChatRepl {
    use_case: Arc<ProcessQueryUseCase>,
    user_id: String,
    preferences: Option<String>,
    show_progress: bool,
    auto_confirm: bool,
}

impl ChatRepl {
    pub fn new(use_case: Arc<ProcessQueryUseCase>, user_id: impl Into<String>) -> Self {
        Self {
            use_case,
            user_id: user_id.into(),
            preferences: None,
            show_progress: true,
            auto_confirm: false,
        }
    }

    /// Set whether to show progress bars
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Approve expensive plans without prompting
    pub fn with_auto_confirm(mut self, auto: bool) -> Self {
        self.auto_confirm = auto;
        self
    }

    /// Answer preferences passed to synthesis
    pub fn with_preferences(mut self, preferences: Option<String>) -> Self {
        self.preferences = preferences;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> io::Result<()> {
        let mut editor = Self::build_editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("courier".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        let mut conversation: Vec<(String, String)> = Vec::new();

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        if self.handle_command(line, &mut conversation) {
                            break;
                        }
                        continue;
                    }

                    self.process_question(line, &mut conversation, &mut editor)
                        .await?;
                }
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        Ok(())
    }

    fn build_editor() -> Reedline {
        let mut editor = Reedline::create();

        if let Some(data_dir) = dirs::data_dir() {
            let dir = data_dir.join("courier");
            let _ = std::fs::create_dir_all(&dir);
            if let Ok(history) = FileBackedHistory::with_file(1_000, dir.join("history.txt")) {
                editor = editor.with_history(Box::new(history));
            }
        }

        editor
    }

    fn print_welcome(&self) {
        println!();
        println!("courier - chat mode");
        println!();
        println!("Commands:");
        println!("  /help     - Show this help");
        println!("  /clear    - Forget the conversation so far");
        println!("  /quit     - Exit chat");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&self, cmd: &str, conversation: &mut Vec<(String, String)>) -> bool {
        match cmd {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                true
            }
            "/help" | "/h" | "/?" => {
                println!();
                println!("Commands:");
                println!("  /help, /h, /?    - Show this help");
                println!("  /clear           - Forget the conversation so far");
                println!("  /quit, /exit, /q - Exit chat");
                println!();
                false
            }
            "/clear" => {
                conversation.clear();
                println!("Conversation cleared.");
                false
            }
            _ => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
                false
            }
        }
    }

    async fn process_question(
        &self,
        question: &str,
        conversation: &mut Vec<(String, String)>,
        editor: &mut Reedline,
    ) -> io::Result<()> {
        println!();

        let mut input = ProcessQueryInput::new(question, self.user_id.clone())
            .with_history(conversation.clone());
        if let Some(preferences) = &self.preferences {
            input = input.with_preferences(preferences.clone());
        }
        if self.auto_confirm {
            input = input.confirmed();
        }

        let mut outcome = self.run_pipeline(input.clone()).await;

        if let Ok(QueryOutcome::ConfirmationNeeded { estimate, .. }) = &outcome {
            print!("{}", ConsoleFormatter::format_estimate(estimate));
            let confirm_prompt = DefaultPrompt::new(
                DefaultPromptSegment::Basic("proceed? [y/N]".to_string()),
                DefaultPromptSegment::Empty,
            );
            match editor.read_line(&confirm_prompt)? {
                Signal::Success(answer)
                    if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") =>
                {
                    outcome = self.run_pipeline(input.confirmed()).await;
                }
                _ => {
                    println!("Skipped.");
                    println!();
                    return Ok(());
                }
            }
        }

        match outcome {
            Ok(QueryOutcome::Answer(response)) => {
                println!("{}", ConsoleFormatter::format(&response));
                conversation.push(("user".to_string(), question.to_string()));
                conversation.push(("assistant".to_string(), response.message));
                let excess = conversation.len().saturating_sub(HISTORY_TURNS * 2);
                if excess > 0 {
                    conversation.drain(..excess);
                }
            }
            Ok(QueryOutcome::ConfirmationNeeded { .. }) => {
                // Confirmed re-run still asked for confirmation; treat as declined
                println!("Skipped.");
            }
            Err(e) => {
                eprintln!("Error: {}", e);
            }
        }
        println!();
        Ok(())
    }

    async fn run_pipeline(
        &self,
        input: ProcessQueryInput,
    ) -> Result<QueryOutcome, courier_application::ProcessQueryError> {
        if self.show_progress {
            let progress = ProgressReporter::new();
            self.use_case.execute(input, &progress).await
        } else {
            self.use_case.execute(input, &NoProgress).await
        }
    }
}
