//! Ask command handler.
//!
//! Answers a single question within a session and prints the cited answer.

use catalog_core::{config::AppConfig, AppError, AppResult};
use clap::Args;

use super::runtime::build_service;

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Session identifier for conversation memory
    #[arg(short, long, default_value = "cli")]
    pub session: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command for session '{}'", self.session);

        let service = build_service(config).await?;
        let query = self.query.join(" ");

        match service.handle_query(&self.session, &query).await {
            Ok(answer) => {
                if self.json {
                    let json = serde_json::to_string_pretty(&answer)?;
                    println!("{}", json);
                } else {
                    println!("{}", answer.answer);
                }
                Ok(())
            }
            Err(AppError::EmptyQuery) => {
                println!("{}", AppError::EmptyQuery);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
