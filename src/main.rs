use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use daybook::ai::client::ResilientAiClient;
use daybook::ai::gemini::GeminiClient;
use daybook::analytics::{self, AnalysisParams};
use daybook::chat::service as chat;
use daybook::config::DaybookConfig;
use daybook::db;
use daybook::journal::entries::{self, NewEntry};
use daybook::journal::types::Modality;

#[derive(Parser)]
#[command(
    name = "daybook",
    version,
    about = "Personal journaling core: streaks, PII-safe AI chat, and entry analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize the database at the configured path
    Init,
    /// Create a journal entry for today
    Add {
        #[arg(long, default_value = "local")]
        user: String,
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        answer: String,
        #[arg(long)]
        tag: Option<String>,
    },
    /// Send a chat message (starts a new conversation unless --conversation is given)
    Chat {
        #[arg(long, default_value = "local")]
        user: String,
        message: String,
        #[arg(long)]
        conversation: Option<String>,
    },
    /// Print journaling summary statistics
    Summary {
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Print activity trends over a day window
    Trends {
        #[arg(long, default_value = "local")]
        user: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Run AI analysis over recent entries
    Analyze {
        #[arg(long, default_value = "local")]
        user: String,
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        max_entries: Option<u32>,
        #[arg(long)]
        force_refresh: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = DaybookConfig::load()?;

    // Log to stderr so stdout stays clean for JSON output.
    let filter =
        EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Init => {
            let path = config.resolved_db_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            db::open_database(&path)?;
            println!("database ready at {}", path.display());
        }
        Command::Add {
            user,
            prompt,
            answer,
            tag,
        } => {
            let mut conn = db::open_database(config.resolved_db_path())?;
            let created = entries::create_entry(
                &mut conn,
                &user,
                NewEntry {
                    prompt,
                    answer,
                    modality: Modality::Text,
                    tag,
                },
                Utc::now(),
            )?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        Command::Chat {
            user,
            message,
            conversation,
        } => {
            let mut conn = db::open_database(config.resolved_db_path())?;
            let backend = GeminiClient::from_config(&config.ai)?;
            let client = ResilientAiClient::new(backend, &config.ai);
            let reply = chat::post_message(
                &mut conn,
                &client,
                &config.context,
                &user,
                &message,
                conversation.as_deref(),
                Utc::now(),
            )?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Command::Summary { user } => {
            let conn = db::open_database(config.resolved_db_path())?;
            let summary = analytics::summary(&conn, &user, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Trends { user, days } => {
            let conn = db::open_database(config.resolved_db_path())?;
            let trends = analytics::mood_trends(&conn, &user, days, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&trends)?);
        }
        Command::Analyze {
            user,
            days,
            max_entries,
            force_refresh,
        } => {
            let conn = db::open_database(config.resolved_db_path())?;
            let backend = GeminiClient::from_config(&config.ai)?;
            let client = ResilientAiClient::new(backend, &config.ai);

            let mut params = AnalysisParams::defaults(&config.analysis);
            if let Some(days) = days {
                params.days = days;
            }
            if let Some(max_entries) = max_entries {
                params.max_entries = max_entries;
            }
            params.force_refresh = force_refresh;

            let outcome =
                analytics::analyze(&conn, &client, &config.analysis, &user, &params, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
