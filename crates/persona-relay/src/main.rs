//! Ask a persona one question from the terminal and print the reply.
//!
//! Reads the model credential from `GEMINI_API_KEY` (a `.env` file is
//! honoured). Without a credential the reply is templated locally.
//!
//! # Examples
//!
//! ```sh
//! # List available personas
//! persona-relay --list
//!
//! # One-shot question
//! persona-relay --persona hitesh --message "How do I start with backend?"
//!
//! # Pipe content from stdin
//! cat question.txt | persona-relay --persona piyush --stdin
//! ```

use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use persona_relay::DEFAULT_MODEL;
use persona_relay::api::RetryPolicy;
use persona_relay::chat::{ChatOptions, ChatRequest};
use persona_relay::config::{API_KEY_ENV, RelayConfig};
use persona_relay::generator::GeneratorConfig;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Ask a persona one question and print the reply.
#[derive(Parser)]
#[command(name = "persona-relay")]
struct Cli {
    /// Persona id to talk to (see --list)
    #[arg(long, short)]
    persona: Option<String>,

    /// Message to send
    #[arg(long, short)]
    message: Option<String>,

    /// Read the message from stdin
    #[arg(long)]
    stdin: bool,

    /// List persona ids and names, then exit
    #[arg(long)]
    list: bool,

    /// Model to use
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Directory of persona JSON files (defaults to the built-in personas)
    #[arg(long, env = "PERSONAS_DIR")]
    personas_dir: Option<PathBuf>,

    /// Model call attempts before falling back to a templated reply
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Overall time budget for the reply, in seconds
    #[arg(long, default_value_t = 30)]
    request_timeout_secs: u64,
}

fn read_stdin_content() -> Result<String, String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("failed to read stdin: {e}"))?;
    Ok(buf)
}

fn build_message(cli: &Cli) -> Result<String, String> {
    let stdin_text = if cli.stdin {
        Some(read_stdin_content()?)
    } else {
        None
    };

    match (&cli.message, stdin_text) {
        (Some(msg), Some(piped)) => Ok(format!("{msg}\n\n{piped}")),
        (Some(msg), None) => Ok(msg.clone()),
        (None, Some(piped)) => Ok(piped),
        (None, None) => Err("provide --message, --stdin, or both".to_string()),
    }
}

fn relay_config(cli: &Cli) -> RelayConfig {
    RelayConfig {
        api_key: std::env::var(API_KEY_ENV).ok(),
        personas_dir: cli.personas_dir.clone(),
        generator: GeneratorConfig {
            model: cli.model.clone(),
            ..Default::default()
        },
        retry: RetryPolicy::with_attempts(cli.max_attempts),
        chat: ChatOptions {
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            ..Default::default()
        },
    }
}

async fn run(cli: &Cli) -> Result<String, String> {
    let service = relay_config(cli).build().map_err(|e| e.to_string())?;

    if cli.list {
        let lines: Vec<String> = service
            .personas()
            .list()
            .into_iter()
            .map(|p| format!("{}\t{}", p.id, p.name))
            .collect();
        return Ok(lines.join("\n"));
    }

    let persona = cli
        .persona
        .clone()
        .ok_or_else(|| "provide --persona (see --list)".to_string())?;
    let message = build_message(cli)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let reply = service
        .reply(ChatRequest::new(persona, message), &cancel)
        .await
        .map_err(|e| e.to_string())?;
    debug!("Reply source: {:?}", reply.source);
    Ok(reply.reply)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
