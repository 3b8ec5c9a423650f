use clap::Parser;
use lookaside::cli::{Cli, Commands};
use lookaside::types::config::Config;
use lookaside::LookasideResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> LookasideResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = if cli.config.exists() {
        Config::load(&cli.config).unwrap_or_else(|_| Config::default_config())
    } else {
        Config::default_config()
    };

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("lookaside={}", log_level)
            .parse()
            .unwrap_or_else(|_| "lookaside=info".parse().expect("fallback directive is valid")),
    );

    // stdout carries protocol traffic when serving, so logs go to stderr.
    if config.general.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Init { path } => {
            lookaside::cli::commands::init(path).await?;
        }
        Commands::Serve => {
            lookaside::cli::commands::serve(&config).await?;
        }
        Commands::Lookup { keys } => {
            lookaside::cli::commands::lookup(&keys, &config).await?;
        }
        Commands::Simulate {
            tasks,
            requests,
            keys,
            latency_ms,
            capacity,
            single_flight,
        } => {
            let mut cache = config.cache.clone();
            if let Some(capacity) = capacity {
                cache.capacity = capacity;
            }
            cache.single_flight |= single_flight;
            lookaside::cli::commands::simulate(tasks, requests, keys, latency_ms, &cache).await?;
        }
        Commands::Config => {
            lookaside::cli::commands::config_cmd(&cli.config).await?;
        }
        Commands::Doctor => {
            lookaside::cli::commands::doctor(&config).await?;
        }
        Commands::Version => {
            lookaside::cli::commands::version();
        }
    }

    Ok(())
}
