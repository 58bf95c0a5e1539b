use anyhow::Context;
use parlor::cli::commands::Runner;
use parlor::cli::init::{self, InitConfig, InitResult};
use parlor::cli::output::Output;
use parlor::cli::{Cli, Commands};
use parlor::ConfigManager;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(level: &str, verbose: bool, json: bool) {
    let fallback = if verbose {
        "debug".to_string()
    } else {
        format!("warn,parlor={}", level)
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli, output: Output) -> anyhow::Result<()> {
    if let Commands::Init {
        path,
        force,
        api_url,
    } = cli.command
    {
        init_tracing("info", cli.verbose, cli.json_logs);
        return match init::run(
            InitConfig {
                path,
                force,
                api_url,
            },
            &output,
        ) {
            InitResult::Success | InitResult::AlreadyExists => Ok(()),
            InitResult::Error(e) => Err(anyhow::anyhow!(e)),
        };
    }

    let config = ConfigManager::new(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_tracing(&config.config().logging.level, cli.verbose, cli.json_logs);

    let runner = Runner::build(Arc::new(config), output)?;
    runner.run(cli.command).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };
    let errors = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match run(cli, output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = match e.downcast_ref::<parlor::AppError>() {
                Some(app) => app.user_message(),
                None => format!("{:#}", e),
            };
            errors.error(&message);
            ExitCode::FAILURE
        }
    }
}
