use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxcalc::core::CurrencyCode;
use fxcalc::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// API key for the rate service, overrides the configuration file
    #[arg(long, global = true, env = "FXCALC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxcalc::AppCommand {
    fn from(cmd: Commands) -> fxcalc::AppCommand {
        match cmd {
            Commands::Currencies => fxcalc::AppCommand::Currencies,
            Commands::Convert { amount, from, to } => {
                fxcalc::AppCommand::Convert { amount, from, to }
            }
            Commands::Interactive => fxcalc::AppCommand::Interactive,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List currencies supported by the rate service
    Currencies,
    /// Convert an amount using the latest exchange rate
    ///
    /// Results above about 7.9e28 are reported as out of range.
    Convert {
        /// Amount in the source currency
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Source currency, defaults to the configured currency
        #[arg(short, long)]
        from: Option<CurrencyCode>,
        /// Target currency, defaults to the configured currency
        #[arg(short, long)]
        to: Option<CurrencyCode>,
    },
    /// Convert amounts as you type them
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxcalc::cli::setup::setup(),
        Some(cmd) => {
            fxcalc::run_command(cmd.into(), cli.config_path.as_deref(), cli.api_key).await
        }
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
