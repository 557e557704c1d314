// the counter host should report failures, not crash on them
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

use {
    std::{path::PathBuf, process::exit},
    tracing::{info, error},
    tracing_subscriber::FmtSubscriber,
    clap::{Parser, Subcommand},
    anyhow::{Context, anyhow},
    tally_core::{CounterRecord, HandlerContext, HandlerEvent},
    tally_store::Table,
    tally_handler::CounterHandler,
    tally_server::{CounterServer, ServerConfig, table_registry},
};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Yaml config file. Defaults apply when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `GET /counter` over http.
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Invoke the counter once and print the response.
    Invoke,
    /// Write the counter record to the configured table.
    Seed {
        #[arg(long, default_value_t = 0)]
        value: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let path = std::env::current_dir()?.join(path);
            ServerConfig::load(&path).await
                .with_context(|| format!("failed to load config from {path:?}"))?
        },
        None => ServerConfig::default(),
    }.with_env_overrides()?;

    FmtSubscriber::builder().with_max_level(config.logger.level()?).init();

    run_command(config, args.command).await
}

async fn run_command(config: ServerConfig, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve { port } => {
            if config.table_name.is_none() {
                error!("counter table name is not set, invocations will fail until COUNTER_TABLE_NAME is provided");
            }
            let server = CounterServer::from_config(&config)?;
            let listener = CounterServer::bind(port.unwrap_or(config.port)).await?;
            server.serve(listener).await;
        },
        Command::Invoke => {
            let handler = CounterHandler::new(table_registry(&config)?, config.handler_config());
            let response = handler.handle(&HandlerEvent::empty(), &HandlerContext::new());
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.is_success() {
                exit(1);
            }
        },
        Command::Seed { value } => {
            let table_name = config.table_name.as_deref()
                .ok_or_else(|| anyhow!("counter table name is not set"))?;
            table_registry(&config)?
                .resolve(table_name)?
                .put_item(&CounterRecord::key(), CounterRecord::new(value).into())?;
            info!("counter in {table_name:?} set to {value}");
        },
    }

    Ok(())
}
