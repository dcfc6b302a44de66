use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

mod config;
mod extract;
mod intent;
mod models;
mod projection;
mod respond;
mod session;
mod snapshot;

use config::AssistantConfig;
use models::AttendanceSnapshot;
use session::{ConversationSession, Sender, SessionState};

#[derive(Parser)]
#[command(name = "attendance-assistant")]
#[command(about = "Answers attendance questions for a student's active course", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        #[arg(long)]
        snapshot: Option<PathBuf>,
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Chat with the assistant on stdin/stdout
    Chat {
        #[arg(long)]
        snapshot: Option<PathBuf>,
        #[arg(long)]
        reply_delay_ms: Option<u64>,
    },
    /// Build a snapshot from a CSV of class records
    Import {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 0)]
        remaining: u32,
        #[arg(long, default_value = "snapshot.json")]
        out: PathBuf,
    },
    /// Print the attendance analytics for a snapshot
    Summary {
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ask { snapshot, query } => {
            let config = AssistantConfig::resolve(snapshot, None)?;
            let snapshot = config.load_snapshot()?;
            println!("{}", respond::answer(&query.join(" "), snapshot.as_ref()));
        }
        Commands::Chat {
            snapshot,
            reply_delay_ms,
        } => {
            let config = AssistantConfig::resolve(snapshot, reply_delay_ms)?;
            let snapshot = config.load_snapshot()?;
            chat(snapshot, config.reply_delay).await?;
        }
        Commands::Import {
            csv,
            remaining,
            out,
        } => {
            let snapshot = snapshot::import_csv(&csv, remaining)?;
            snapshot::write_snapshot(&out, &snapshot)?;
            println!(
                "Imported {} classes ({} attended) from {} into {}.",
                snapshot.total_classes,
                snapshot.attended_classes,
                csv.display(),
                out.display()
            );
        }
        Commands::Summary { snapshot } => {
            let config = AssistantConfig::resolve(snapshot, None)?;
            let reply = match config.load_snapshot()? {
                Some(snapshot) => respond::compose(&intent::Intent::Analytics, &snapshot),
                None => respond::NO_SNAPSHOT.to_string(),
            };
            println!("{reply}");
        }
    }

    Ok(())
}

async fn chat(snapshot: Option<AttendanceSnapshot>, reply_delay: Duration) -> anyhow::Result<()> {
    let mut session = ConversationSession::new(reply_delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown = print_bot_turns(&session, 0);

    loop {
        let due = session.next_due();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim() == "/reset" {
                    session.reset();
                    shown = print_bot_turns(&session, 0);
                    continue;
                }
                session.submit(&line, snapshot.as_ref());
            }
            _ = sleep_until_due(due) => {
                session.deliver_due(Instant::now());
                shown = print_bot_turns(&session, shown);
            }
        }
    }

    if session.state() == SessionState::AwaitingDisplay {
        session.settle().await;
        print_bot_turns(&session, shown);
    }
    Ok(())
}

async fn sleep_until_due(due: Option<Instant>) {
    match due {
        Some(due) => tokio::time::sleep_until(due).await,
        None => std::future::pending().await,
    }
}

// User turns are already on the terminal; only bot turns are echoed.
fn print_bot_turns(session: &ConversationSession, from: usize) -> usize {
    let turns = session.turns();
    for turn in turns.iter().skip(from) {
        if turn.sender == Sender::Bot {
            println!("assistant> {}\n", turn.text);
        }
    }
    turns.len()
}
