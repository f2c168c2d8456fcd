use std::{
    env,
    error::Error,
    fmt::Display,
    io::{self, Write},
    path::PathBuf,
    process,
};

use clap::{Parser, Subcommand};
use log::{error, info};

use crate::config::Credentials;
use crate::poller::{CycleOutcome, Poller, SystemClock};
use crate::practicum::PracticumClient;
use crate::telegram::TelegramBot;
use crate::utils::TeeWriter;

mod config;
mod poller;
mod practicum;
mod response;
mod telegram;
mod utils;
mod verdict;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,
    /// Config file to use instead of ~/.config/hwbot/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Commands {
    /// Poll forever, notifying on every status change (default)
    Run,
    /// Poll a single time and exit
    Once,
}

const CRITICAL_TARGET: &str = "critical";

fn write_record(
    out: &mut impl Write,
    timestamp: impl Display,
    record: &log::Record,
) -> io::Result<()> {
    let level = if record.target() == CRITICAL_TARGET {
        "CRITICAL".to_string()
    } else {
        record.level().to_string()
    };
    writeln!(
        out,
        "{} - {} - {} - {}:{}",
        timestamp,
        level,
        record.args(),
        record.module_path().unwrap_or("unknown"),
        record.line().unwrap_or(0)
    )
}

fn setup_logging(verbose: bool, log_file: Option<PathBuf>) -> anyhow::Result<()> {
    let mut log_builder = env_logger::builder();
    if verbose {
        log_builder.filter(None, log::LevelFilter::Debug);
    } else if env::var("RUST_LOG").is_err() {
        // Only set default of info if not configured via env already
        log_builder.filter(None, log::LevelFilter::Info);
    }
    log_builder.format(|buf, record| {
        let timestamp = buf.timestamp();
        write_record(buf, timestamp, record)
    });
    let writer = TeeWriter::new(log_file.as_deref())?;
    log_builder.target(env_logger::Target::Pipe(Box::new(writer)));
    log_builder.init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = config::get_config(cli.config.as_deref())?;
    setup_logging(cli.verbose, config.log_file_path())?;

    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(err) => {
            error!(target: CRITICAL_TARGET, "{err}, refusing to start");
            process::exit(1);
        }
    };

    let timeout = config.request_timeout();
    let source = PracticumClient::new(
        config.endpoint_url()?,
        credentials.practicum_token,
        timeout,
    );
    let bot = TelegramBot::new(
        config.telegram_api_url()?,
        credentials.telegram_token,
        credentials.telegram_chat_id,
        timeout,
    );
    let mut poller = Poller::new(source, bot, SystemClock, config.poll_settings());

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            info!("Bot started");
            poller.run(None);
        }
        Commands::Once => match poller.run_cycle() {
            CycleOutcome::Failed { reported } => {
                error!("Cycle failed (reported to chat: {reported})");
                process::exit(1);
            }
            outcome => info!("Cycle finished: {outcome:?}"),
        },
    }

    Ok(())
}
