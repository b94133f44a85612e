use crate::{
    commands::Commands,
    conn::{ConnectionPinger, MssqlConnectionPinger},
    env::EnvManager,
    error::CliError,
    output::LoadReport,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use connectors::sql::mssql::adapter::MssqlAdapter;
use engine_runtime::load::BulkLoader;
use model::core::identifiers::TableRef;
use planner::{ddl::DdlPlanner, typemap::SampledStringSizing};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod env;
mod error;
mod output;
mod settings;
mod shutdown;

#[derive(Parser)]
#[command(name = "bulkload", version = "0.1.0", about = "Bulk load tables into SQL Server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli.command, &shutdown).await {
        Ok(()) => ExitCode::Success,
        Err(CliError::ShutdownRequested) => ExitCode::ShutdownRequested,
        Err(err) => {
            error!("{err}");
            ExitCode::GeneralError
        }
    };
    std::process::exit(code.as_i32());
}

async fn run(command: Commands, shutdown: &ShutdownCoordinator) -> Result<(), CliError> {
    match command {
        Commands::Load {
            input,
            target,
            conn_str,
            env_file,
            output,
        } => {
            let options = settings::resolve_options(&target)?;
            let (_, table) = settings::read_input(&input)?;
            let conn_str = expand_conn_str(&conn_str, env_file.as_deref())?;

            let adapter = MssqlAdapter::connect(&conn_str).await?;
            let mut loader = BulkLoader::new(adapter);
            let cancel = shutdown.cancel_token();

            let summary = tokio::select! {
                result = loader.load(Box::new(table.into_rows()), &target.table, &options) => result?,
                _ = cancel.cancelled() => {
                    info!(table = %target.table, "Load interrupted, committed statements are kept");
                    return Err(CliError::ShutdownRequested);
                }
            };

            output::emit(&LoadReport::from(&summary), output.as_deref()).await?;
        }
        Commands::Plan { input, target } => {
            let options = settings::resolve_options(&target)?;
            let (_, table) = settings::read_input(&input)?;

            let table_ref = TableRef::new(Some(options.schema.as_str()), &target.table);
            let sizing = SampledStringSizing::new(options.string_sizes.clone());
            let sql = DdlPlanner::default().create_table(&table_ref, &table.schema(), &sizing)?;
            println!("{sql}");
        }
        Commands::Inspect { input, output } => {
            let (metadata, _) = settings::read_input(&input)?;
            output::emit(&metadata, output.as_deref()).await?;
        }
        Commands::TestConn { conn_str, env_file } => {
            let conn_str = expand_conn_str(&conn_str, env_file.as_deref())?;
            MssqlConnectionPinger { conn_str }.ping().await?;
        }
    }

    Ok(())
}

fn expand_conn_str(conn_str: &str, env_file: Option<&str>) -> Result<String, CliError> {
    let mut env = EnvManager::new();
    if let Some(path) = env_file {
        env.load_from_file(path)?;
    }
    env.expand(conn_str)
}
