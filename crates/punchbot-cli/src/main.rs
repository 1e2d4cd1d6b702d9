mod punch;
mod run;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use punchbot_types::PunchKind;

#[derive(Parser)]
#[command(name = "punchbot", about = "HR attendance automation agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the heartbeat agent until interrupted
    Run {
        /// Path to the settings file
        #[arg(short, long, default_value = "config.ini")]
        config: PathBuf,
    },
    /// Log in and print today's attendance record
    Status {
        /// Path to the settings file
        #[arg(short, long, default_value = "config.ini")]
        config: PathBuf,
    },
    /// Submit a single check-in or check-out now
    Punch {
        /// Which event to submit
        #[arg(value_enum)]
        kind: PunchArg,

        /// Path to the settings file
        #[arg(short, long, default_value = "config.ini")]
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PunchArg {
    In,
    Out,
}

impl From<PunchArg> for PunchKind {
    fn from(arg: PunchArg) -> Self {
        match arg {
            PunchArg::In => PunchKind::In,
            PunchArg::Out => PunchKind::Out,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run::run_agent(config))?;
        }
        Commands::Status { config } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(status::run_status(config))?;
        }
        Commands::Punch { kind, config } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(punch::run_punch(kind.into(), config))?;
        }
    }

    Ok(())
}
