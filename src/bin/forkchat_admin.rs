use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use forkchat::application::services::{
    CleanupOptions, ConversationService, DEFAULT_CLEANUP_DAYS, SummaryService,
};
use forkchat::infrastructure::observability::{TracingConfig, init_tracing};
use forkchat::infrastructure::persistence::RepositoryFactory;
use forkchat::presentation::{Environment, Settings};

#[derive(Parser)]
#[command(name = "forkchat-admin", version, about = "Maintenance tasks for forkchat")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fill in summaries for conversations that have none.
    UpdateSummaries,
    /// Delete conversations that have not been modified for a while.
    Cleanup {
        #[arg(long, default_value_t = DEFAULT_CLEANUP_DAYS)]
        days: i64,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        force: bool,
        #[arg(long)]
        deleted_only: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load settings")?;
    init_tracing(
        TracingConfig::from_settings(environment, &settings.logging),
        "admin",
    );

    let repositories = RepositoryFactory::create(&settings.database)
        .await
        .context("Failed to initialise repositories")?;
    let summaries = SummaryService::new(Arc::clone(&repositories.conversations));
    let conversations = ConversationService::new(repositories.conversations, summaries.clone());

    match cli.command {
        Command::UpdateSummaries => {
            let report = summaries.update_all_conversation_summaries().await?;
            println!(
                "Updated {} conversation summaries ({} failed)",
                report.updated, report.failed
            );
        }
        Command::Cleanup {
            days,
            dry_run,
            force,
            deleted_only,
        } => {
            let options = CleanupOptions {
                older_than_days: days,
                deleted_only,
                dry_run: true,
            };
            let preview = conversations.cleanup_old_conversations(options).await?;

            if preview.matched == 0 {
                println!("No conversations older than {} days found", days);
                return Ok(());
            }

            println!(
                "Found {} conversations older than {} days",
                preview.matched, days
            );
            for conversation in &preview.examples {
                println!(
                    "  - {} ({}), last modified {}",
                    conversation.title, conversation.id, conversation.modified_at
                );
            }

            if dry_run {
                println!("Dry run, nothing deleted");
                return Ok(());
            }

            if !force && !confirm(preview.matched)? {
                println!("Cleanup cancelled");
                return Ok(());
            }

            let report = conversations
                .cleanup_old_conversations(CleanupOptions {
                    dry_run: false,
                    ..options
                })
                .await?;
            println!(
                "Deleted {} conversations ({} failed)",
                report.deleted, report.failed
            );
        }
    }

    Ok(())
}

fn confirm(count: usize) -> anyhow::Result<bool> {
    print!("Delete {} conversations? Type 'yes' to continue: ", count);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}
