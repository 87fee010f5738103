//! medchat: command-line front end for the MedChat backend.
//! Sends one message (argument or first stdin line) and prints the answer,
//! or triggers a knowledge-base reprocess / health check.

use clap::{Parser, Subcommand};
use medchat_client::{config, validate_outgoing, Client, Config};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "medchat", version, about = "Ask the MedChat assistant a question")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, env = "MEDCHAT_CONFIG", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides `server.base_url`
    #[arg(long, value_name = "URL", global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,

    /// Question to send; read from stdin when omitted
    message: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the backend knowledge base from its source PDF
    Reprocess,
    /// Query backend health
    Health,
}

fn load_config(cli: &Cli) -> Config {
    let result = match &cli.config {
        Some(path) => config::load(path).map_err(|e| (path.clone(), e)),
        None => match config::default_config_path() {
            Some(path) => config::load_or_default(&path).map_err(|e| (path, e)),
            None => Ok(Config::default()),
        },
    };
    let mut cfg = result.unwrap_or_else(|(path, e)| {
        eprintln!(
            "Error: failed to load config from {}: {}",
            path.display(),
            e
        );
        process::exit(1);
    });
    if let Some(url) = &cli.url {
        cfg.server.base_url = Some(url.clone());
    }
    cfg
}

fn read_question(cli: &Cli) -> String {
    if let Some(message) = &cli.message {
        return message.clone();
    }
    let mut line = String::new();
    if let Err(e) = io::stdin().lock().read_line(&mut line) {
        eprintln!("Error: failed to read stdin: {}", e);
        process::exit(1);
    }
    line
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}: {}", context, e);
    process::exit(1);
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = load_config(&cli);

    let client = Client::from_config(&cfg).unwrap_or_else(|e| fail("client setup failed", e));

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fail("failed to create runtime", e));

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Command::Reprocess) => {
            let reply = rt
                .block_on(client.reprocess_pdf())
                .unwrap_or_else(|e| fail("reprocess failed", e));
            if let Some(message) = &reply.message {
                let _ = writeln!(out, "{}", message);
            }
            let _ = writeln!(out, "Chunks: {}", reply.chunks_count);
        }
        Some(Command::Health) => {
            let report = rt
                .block_on(client.health())
                .unwrap_or_else(|e| fail("health check failed", e));
            let _ = writeln!(out, "Status: {}", report.status);
            if let Some(stats) = &report.vector_database {
                let _ = writeln!(out, "Chunks: {}", stats.total_chunks);
            }
            if let Some(model) = &report.model {
                let _ = writeln!(out, "Model: {}", model);
            }
        }
        None => {
            let raw = read_question(&cli);
            let question = validate_outgoing(&raw, cfg.max_message_chars())
                .unwrap_or_else(|e| fail("invalid message", e));
            let reply = rt
                .block_on(client.chat(question))
                .unwrap_or_else(|e| fail("chat failed", e));
            let _ = writeln!(out, "{}", reply.response);
            if let Some(ts) = &reply.timestamp {
                let _ = writeln!(out, "[{}]", ts);
            }
        }
    }
}
