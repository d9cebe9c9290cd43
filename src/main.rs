use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chatur::app::App;
use chatur::tui::{self, EventHandler, Tui};
use chatur::{handler, ui};
use chatur::{AnswerClient, ChatSession, Config, Resolution};

#[derive(Parser)]
#[command(name = "chatur")]
#[command(about = "Chat with the ChaturAI news assistant from the terminal")]
struct Cli {
    /// Base URL of the answer service
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Starting theme
    #[arg(short, long, value_parser = ["light", "dark"])]
    theme: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question and print the reply
    Ask {
        /// Your question
        question: String,
    },
    /// Write the effective endpoint and theme to the config file
    SaveConfig,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match &cli.command {
        Some(_) => init_logging(LogTarget::Stderr)?,
        None => init_logging(LogTarget::File)?,
    }

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    let config = Config::load_from(&config_path)?;
    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref());
    let theme = config.resolve_theme(cli.theme.as_deref());
    let client = AnswerClient::new(&endpoint);

    match cli.command {
        Some(Commands::Ask { question }) => ask_once(&client, &question).await,
        Some(Commands::SaveConfig) => {
            let saved = Config {
                endpoint: Some(endpoint),
                theme: Some(theme),
            };
            saved.save_to(&config_path)?;
            println!("Saved {}", config_path.display());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            let app = App::new(Arc::new(client), endpoint, theme);
            run_tui(app).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

enum LogTarget {
    Stderr,
    File,
}

fn init_logging(target: LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatur=info"));

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        // The terminal belongs to the UI, so logs go to a file
        LogTarget::File => {
            let log_dir = dirs::data_local_dir()
                .ok_or_else(|| anyhow!("Could not determine data directory"))?
                .join("chatur");
            fs::create_dir_all(&log_dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_dir.join("chatur.log"))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
    }

    Ok(())
}

async fn ask_once(client: &AnswerClient, question: &str) -> Result<ExitCode> {
    let mut session = ChatSession::default();

    let Some(resolution) = session.submit(client, question).await else {
        return Ok(ExitCode::from(2));
    };

    let reply = session
        .last_reply()
        .ok_or_else(|| anyhow!("No reply recorded"))?;
    println!("{}", reply.text());

    if resolution == Resolution::TransportFailure {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_tui(mut app: App) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run_app(&mut terminal, &mut app).await;

    tui::restore()?;
    result
}

async fn run_app(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();
    let tx = events.sender();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event, &tx)?;
    }

    Ok(())
}
