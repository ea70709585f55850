use crate::configs::server::TransportConfig;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use shoal::error::ShoalError;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info};

/// The transport primitive the replication client writes protocol traffic
/// through. Implementations own the connection lifecycle; callers only ever
/// address a peer by `(ip, port)`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn start(&self) -> Result<(), ShoalError>;
    async fn write(&self, ip: &str, port: u16, bytes: Bytes) -> Result<(), ShoalError>;
    async fn stop(&self);
}

impl Debug for dyn Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish()
    }
}

/// One connection slot per peer. The slot is created synchronously on first
/// use and the stream inside is established under the slot's lock, so
/// concurrent first writes to the same peer share a single connection.
type ConnectionSlot = Arc<Mutex<Option<TcpStream>>>;

/// TCP transport owning one long-lived connection per `(ip, port)`.
/// Connections are established lazily on first write and all writes to a given
/// peer are serialized on its connection, so messages are never interleaved.
/// A failed write tears the connection down; the next write reconnects.
#[derive(Debug)]
pub struct TcpReplEndpoint {
    config: TransportConfig,
    connections: DashMap<String, ConnectionSlot>,
    running: AtomicBool,
}

impl TcpReplEndpoint {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            connections: DashMap::new(),
            running: AtomicBool::new(false),
        }
    }

    async fn connect(&self, address: &str) -> Result<TcpStream, ShoalError> {
        debug!("Connecting to replication peer {address}...");
        let connect_timeout = Duration::from_millis(self.config.connect_timeout_ms);
        let stream = timeout(connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| ShoalError::CannotEstablishConnection(address.to_string()))?
            .map_err(|error| {
                error!("Cannot connect to replication peer {address}: {error}");
                ShoalError::CannotEstablishConnection(address.to_string())
            })?;
        if let Err(error) = stream.set_nodelay(self.config.nodelay) {
            debug!("Cannot set nodelay on connection to {address}: {error}");
        }

        info!("Connected to replication peer {address}");
        Ok(stream)
    }
}

#[async_trait]
impl Transport for TcpReplEndpoint {
    async fn start(&self) -> Result<(), ShoalError> {
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    async fn write(&self, ip: &str, port: u16, bytes: Bytes) -> Result<(), ShoalError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(ShoalError::NotConnected);
        }

        let address = format!("{ip}:{port}");
        let slot = self
            .connections
            .entry(address.clone())
            .or_default()
            .clone();
        let mut connection = slot.lock().await;
        if connection.is_none() {
            *connection = Some(self.connect(&address).await?);
        }
        let Some(stream) = connection.as_mut() else {
            return Err(ShoalError::NotConnected);
        };

        let result = async {
            stream.write_all(&bytes).await?;
            stream.flush().await
        }
        .await;
        if let Err(error) = result {
            *connection = None;
            self.connections.remove(&address);
            error!("Cannot write to replication peer {address}: {error}");
            return Err(ShoalError::from(error));
        }

        Ok(())
    }

    async fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.connections.clear();
        info!("Replication endpoint stopped");
    }
}
