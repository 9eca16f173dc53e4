use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use overlap_tracker::AllocationBasis;
use overlap_tracker::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for overlap_tracker::AppCommand {
    fn from(cmd: Commands) -> overlap_tracker::AppCommand {
        match cmd {
            Commands::Summary => overlap_tracker::AppCommand::Summary,
            Commands::Alloc { by } => overlap_tracker::AppCommand::Alloc { by },
            Commands::Overlap {
                fund,
                include_inactive,
            } => overlap_tracker::AppCommand::Overlap {
                funds: fund,
                include_inactive,
            },
            Commands::Coverage {
                index,
                include_inactive,
            } => overlap_tracker::AppCommand::Coverage {
                index,
                include_inactive,
            },
            Commands::Holders {
                stock,
                include_inactive,
            } => overlap_tracker::AppCommand::Holders {
                stock,
                include_inactive,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display invested and current value of each portfolio
    Summary,
    /// Display how each portfolio is spread across categories
    Alloc {
        /// Grouping to use
        #[arg(long, value_enum, default_value_t = AllocationBasis::Category)]
        by: AllocationBasis,
    },
    /// Display stocks held by more than one fund
    Overlap {
        /// Fund id to compare; repeat for more. Defaults to every fund in the config
        #[arg(long)]
        fund: Vec<String>,

        /// Compare inactive funds too
        #[arg(long)]
        include_inactive: bool,
    },
    /// Display how much of each fund is invested in an index
    Coverage {
        /// Index id, e.g. NIFTY50
        #[arg(long)]
        index: String,

        /// Measure inactive funds too
        #[arg(long)]
        include_inactive: bool,
    },
    /// Display which configured funds hold a stock
    Holders {
        /// Stock id, e.g. INFY
        #[arg(long)]
        stock: String,

        /// Look through inactive funds too
        #[arg(long)]
        include_inactive: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => overlap_tracker::cli::setup::setup_at_path(path),
            None => overlap_tracker::cli::setup::setup(),
        },
        Some(cmd) => overlap_tracker::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
