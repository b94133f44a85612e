use crate::error::ConnectorError;
use tiberius::{Client, Config};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, warn};

pub(crate) type MssqlClient = Client<Compat<TcpStream>>;

/// Opens a TDS connection from an ADO.NET style connection string
/// (`server=tcp:host,1433;user=sa;password=...;database=...`).
pub(crate) async fn connect_client(conn_str: &str) -> Result<MssqlClient, ConnectorError> {
    let config = Config::from_ado_string(conn_str)
        .map_err(|e| ConnectorError::InvalidUrl(e.to_string()))?;

    let addr = config.get_addr();
    debug!(%addr, "Connecting to SQL Server");

    let tcp = TcpStream::connect(&addr).await?;
    if let Err(error) = tcp.set_nodelay(true) {
        warn!(%error, "Failed to set TCP_NODELAY");
    }

    let client = Client::connect(config, tcp.compat_write()).await?;
    Ok(client)
}
