//! Chat command handler.
//!
//! Line-by-line REPL over one session; memory lasts for the process lifetime.

use std::io::Write;

use catalog_core::{config::AppConfig, AppError, AppResult};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::runtime::build_service;

/// Interactive question session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Session identifier for conversation memory
    #[arg(short, long, default_value = "cli")]
    pub session: String,
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting chat for session '{}'", self.session);

        let service = build_service(config).await?;

        eprintln!("Ask about the catalog. Type 'exit' or press Ctrl-D to quit.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            if is_exit(&line) {
                break;
            }

            match service.handle_query(&self.session, &line).await {
                Ok(answer) => println!("{}\n", answer.answer),
                Err(AppError::EmptyQuery) => println!("{}\n", AppError::EmptyQuery),
                // A failed turn ends that question, not the session
                Err(e) => {
                    tracing::error!("Query failed: {}", e);
                    eprintln!("Error: {}\n", e);
                }
            }
        }

        Ok(())
    }
}

fn is_exit(line: &str) -> bool {
    matches!(line.trim(), "exit" | "quit")
}
