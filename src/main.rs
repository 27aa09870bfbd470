//! gptbot - Command Line Entry Point
//!
//! Offline tools around the relay: format a markdown answer the way the bot
//! would send it, inspect stored conversations, and preview the completion
//! request for a new message.

use clap::{Parser, Subcommand};
use log::{debug, error, info};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use gptbot::config::{load_gpt_config, EnvSettings};
use gptbot::conversation::{collect_history, CompletionRequest, Storage};
use gptbot::error::{Error, Result};
use gptbot::telegram::prepare_reply;

#[derive(Parser)]
#[command(name = "gptbot")]
#[command(version)]
#[command(about = "Markdown relay between a chat bot and a language model")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert markdown into the messages the bot would send
    Format {
        /// Markdown file to read; stdin when omitted
        file: Option<PathBuf>,
    },

    /// Print the stored conversation ending at a message
    History {
        /// User the conversation belongs to
        #[arg(long)]
        user: i64,

        /// Latest message of the conversation
        #[arg(long)]
        message: i32,
    },

    /// Print the completion request for a new message
    Request {
        /// User sending the message
        #[arg(long)]
        user: i64,

        /// Message being replied to, if any
        #[arg(long)]
        reply_to: Option<i32>,

        /// Message text
        text: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli.command) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Format { file } => {
            let markdown = read_input(file.as_ref())?;
            let messages = prepare_reply(&markdown);
            info!("Prepared {} message(s)", messages.len());
            print_json(&messages)
        }
        Command::History { user, message } => {
            let storage = open_storage()?;
            let messages = storage.transaction(user, |chain| Ok(chain.read(message)))?;
            print_json(&messages)
        }
        Command::Request {
            user,
            reply_to,
            text,
        } => {
            let settings = EnvSettings::from_env();
            let config = load_gpt_config(&settings.config_path);
            let storage = Storage::open(&settings.storage_path)?;

            let history =
                storage.transaction(user, |chain| collect_history(chain, reply_to, &text))?;
            debug!("Collected {} turn(s) for user {}", history.len(), user);

            print_json(&CompletionRequest::build(&config, &history))
        }
    }
}

fn open_storage() -> Result<Storage> {
    let settings = EnvSettings::from_env();
    debug!("Using conversation log {}", settings.storage_path.display());
    Storage::open(&settings.storage_path)
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            Error::Application(format!("Cannot read '{}': {}", path.display(), e))
        }),
        None => {
            let mut markdown = String::new();
            io::stdin().read_to_string(&mut markdown)?;
            Ok(markdown)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Application(format!("Cannot serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}
