use crate::{env::EnvManager, error::CliError};
use async_trait::async_trait;
use connectors::sql::mssql::adapter::MssqlAdapter;
use tracing::{error, info};

/// Trait for "pinging" a data source
#[async_trait]
pub trait ConnectionPinger {
    /// Attempts to ping; returns Err if unreachable
    async fn ping(&self) -> Result<(), CliError>;
}

/// SQL Server pinger
pub struct MssqlConnectionPinger {
    pub conn_str: String,
}

#[async_trait]
impl ConnectionPinger for MssqlConnectionPinger {
    async fn ping(&self) -> Result<(), CliError> {
        let masked = EnvManager::mask(&self.conn_str);
        info!("Pinging SQL Server at '{}'", masked);

        let mut adapter = MssqlAdapter::connect(&self.conn_str).await.map_err(|e| {
            error!("SQL Server connection to '{}' failed: {}", masked, e);
            CliError::Connect(e)
        })?;

        let version = adapter.server_version().await.map_err(|e| {
            error!("SQL Server version query on '{}' failed: {}", masked, e);
            CliError::Database(e)
        })?;

        let first_line = version.lines().next().unwrap_or_default();
        info!("SQL Server ping to '{}' succeeded: {}", masked, first_line);
        Ok(())
    }
}
