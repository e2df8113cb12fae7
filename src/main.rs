//! MomCare Assistant
//!
//! A rule-based assistant widget: free text is matched against an ordered
//! keyword table and answered with a canned response after a short
//! simulated typing delay. This binary hosts one assistant session in the
//! terminal.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod conversation;
mod core;
mod display;
mod intent;
mod notify;

use config::Config;
use crate::core::{ConversationController, SubmitOutcome, WidgetState};
use display::TerminalNotifier;
use notify::{Notification, Notifier, TracingNotifier};

const HELP: &str = "Commands: /open /close /toggle /min /state /rules /transcript /help /quit";

/// REPL commands. Any line not starting with `/` is chat text.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Quit,
    Help,
    Open,
    Close,
    Toggle,
    Minimize,
    State,
    Rules,
    Transcript,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let word = line.trim();
        if !word.starts_with('/') {
            return None;
        }

        Some(match word {
            "/quit" | "/exit" => Self::Quit,
            "/help" => Self::Help,
            "/open" => Self::Open,
            "/close" => Self::Close,
            "/toggle" => Self::Toggle,
            "/min" => Self::Minimize,
            "/state" => Self::State,
            "/rules" => Self::Rules,
            "/transcript" => Self::Transcript,
            other => Self::Unknown(other.to_string()),
        })
    }
}

/// Shows notifications in the terminal and in the log
struct AppNotifier;

impl Notifier for AppNotifier {
    fn notify(&self, notification: Notification) {
        TracingNotifier.notify(notification.clone());
        TerminalNotifier.notify(notification);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "momcare_assistant=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    let rules = Arc::new(config.load_rules().await?);

    tracing::info!(
        rules = rules.len(),
        delay_ms = config.response_delay_ms,
        "MomCare assistant ready"
    );

    let mut controller = ConversationController::new(&config, rules, Arc::new(AppNotifier));
    tracing::info!(session = %controller.id(), "Session started");
    let display = tokio::spawn(display::run(controller.subscribe()));

    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Some(Command::Quit) => break,
            Some(Command::Help) => println!("{}", HELP),
            Some(Command::Open) => controller.open(),
            Some(Command::Close) => controller.close(),
            Some(Command::Toggle) => controller.toggle_open(),
            Some(Command::Minimize) => controller.toggle_minimize(),
            Some(Command::State) => println!(
                "{:?} awaiting_response={}",
                controller.state(),
                controller.is_awaiting_response()
            ),
            Some(Command::Rules) => {
                for (index, rule) in controller.rules().rules().iter().enumerate() {
                    println!(
                        "{:>2}. {} {:?}",
                        index + 1,
                        rule.name().unwrap_or("-"),
                        rule.keywords()
                    );
                }
                println!("    fallback: {}", controller.rules().fallback());
            }
            Some(Command::Transcript) => {
                println!("{}", serde_json::to_string_pretty(&controller.messages())?)
            }
            Some(Command::Unknown(name)) => println!("Unknown command {}. {}", name, HELP),
            None => {
                if controller.state() != WidgetState::OpenExpanded {
                    println!("(open the assistant with /open first)");
                    continue;
                }

                controller.set_input(&line);
                if !controller.can_submit() {
                    if controller.is_awaiting_response() {
                        println!("(still typing, please wait)");
                    }
                    continue;
                }

                match controller.submit_pending() {
                    SubmitOutcome::Accepted(id) => tracing::debug!(message = %id, "Submitted"),
                    SubmitOutcome::TornDown => break,
                    SubmitOutcome::Empty | SubmitOutcome::Busy => {}
                }
            }
        }
    }

    controller.teardown();
    drop(controller);
    display.await?;

    tracing::info!("Goodbye");
    Ok(())
}
