mod commands;

use clap::{Parser, Subcommand};
use commands::{GenerateKeyCommand, ServeCommand};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "mailroom")]
#[command(about = "Transactional email dispatch service", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "MAILROOM_LOG_LEVEL")]
    log_level: String,

    /// Log format (compact, full)
    #[arg(long, global = true, default_value = "compact", env = "MAILROOM_LOG_FORMAT")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve(ServeCommand),
    /// Generate a new encryption key for tenant settings
    GenerateKey(GenerateKeyCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, &cli.log_format)?;

    match cli.command {
        Commands::Serve(cmd) => cmd.execute(),
        Commands::GenerateKey(cmd) => cmd.execute(),
    }
}

fn init_tracing(level: &str, format: &str) -> anyhow::Result<()> {
    // RUST_LOG takes precedence over the --log-level flag.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env().expect("Invalid RUST_LOG value")
    } else {
        EnvFilter::new(format!(
            "mailroom_cli={level},mailroom_config={level},mailroom_core={level},\
             mailroom_database={level},mailroom_dispatch={level},mailroom_entities={level},\
             mailroom_migrations={level},\
             sqlx=warn,sea_orm=warn,h2=warn,tower=warn,hyper=warn,reqwest=warn,rustls=warn"
        ))
    };

    let fmt_layer = match format {
        "full" => tracing_subscriber::fmt::layer().with_target(true).boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
