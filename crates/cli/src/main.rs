//! bwt - issue and check Binary Web Tokens from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;

use bwt_cli::{commands, CliConfig, IssueOptions, Settings};

/// Issue, inspect, verify and revoke Binary Web Tokens
#[derive(Parser, Debug)]
#[command(name = "bwt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Base64-encoded signing secret
    #[arg(long = "secret", env = "BWT_SECRET", hide_env_values = true, global = true)]
    secret: Option<String>,

    /// Session database path
    #[arg(long = "db", env = "SQLITE_PATH", global = true)]
    db: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long = "verbose", global = true)]
    verbose: bool,

    /// Log output format
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mint a token for a resource owner and record its session
    Issue {
        /// Resource owner identifier
        did: String,

        /// Expiry time (YYYY-MM-DDTHH:MM:SS+ZZZZ); defaults to the configured validity
        #[arg(long = "expires")]
        expires: Option<String>,

        /// Host recorded with the session
        #[arg(long = "host", default_value = "")]
        host: String,

        /// Note recorded with the session
        #[arg(long = "note", default_value = "")]
        note: String,

        /// Print the token without recording a session
        #[arg(long = "no-record")]
        no_record: bool,
    },
    /// Create the session database if it does not exist
    InitDb,
    /// Decode a token without verifying it
    Inspect {
        token: String,
    },
    /// Verify a token against the secret and the session database
    Verify {
        token: String,
    },
    /// Revoke a session by its key
    Revoke {
        jti: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    let file = CliConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(cli.secret.as_deref(), cli.db, file);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(run(cli.command, settings))
}

async fn run(command: Commands, settings: Settings) -> Result<ExitCode> {
    let now = chrono::Utc::now();

    match command {
        Commands::Issue {
            did,
            expires,
            host,
            note,
            no_record,
        } => {
            let opts = IssueOptions {
                did,
                expires,
                host,
                note,
                record: !no_record,
            };
            let token = commands::issue(&settings, opts, now).await?;
            println!("{token}");
        }
        Commands::InitDb => {
            commands::init_db(&settings)?;
        }
        Commands::Inspect { token } => {
            println!("{}", commands::inspect(&token)?);
        }
        Commands::Verify { token } => match commands::verify(&settings, &token, now).await? {
            Ok(authorized) => println!("{}", commands::describe(&authorized)?),
            Err(e) => {
                let code = e.code().map_or("error#internal", |code| code.as_str());
                warn!(error = %e, "Token rejected");
                println!("{code}: {e}");
                return Ok(ExitCode::FAILURE);
            }
        },
        Commands::Revoke { jti } => {
            commands::revoke(&settings, &jti).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_logging(verbose: bool, format: LogFormat) {
    let log_level = if verbose { "debug" } else { "info" };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.with_target(false).init(),
        LogFormat::Json => builder.json().init(),
    }
}
