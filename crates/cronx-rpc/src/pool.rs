use std::time::Duration;

use async_trait::async_trait;
use cronx_model::WorkerAddr;
use dashmap::DashMap;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, trace};

use crate::{error::PoolError, proto::worker_client::WorkerClient};

/// Source of clients for worker addresses.
///
/// Implementations must be cheap to call repeatedly for the same address and
/// safe to share across concurrent dispatches.
#[async_trait]
pub trait ConnectionPool: Send + Sync + 'static {
    async fn get(&self, addr: &WorkerAddr) -> Result<WorkerClient<Channel>, PoolError>;

    /// Drop any cached connection for `addr` so the next `get` reconnects.
    fn evict(&self, addr: &WorkerAddr);
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub connect_timeout: Duration,
    pub keepalive_interval: Duration,
    pub keepalive_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            keepalive_interval: Duration::from_secs(30),
            keepalive_timeout: Duration::from_secs(3),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.connect_timeout.is_zero() {
            return Err("connect timeout must be positive".into());
        }
        if self.keepalive_timeout >= self.keepalive_interval {
            return Err("keepalive timeout must be shorter than the keepalive interval".into());
        }
        Ok(())
    }
}

/// One multiplexed HTTP/2 channel per worker address.
///
/// Channels are created on first use and reused afterwards; a tonic
/// `Channel` is itself cheap to clone and reconnects transparently, so the
/// pool only has to remember one per address.
pub struct ChannelPool {
    cfg: PoolConfig,
    channels: DashMap<WorkerAddr, Channel>,
}

impl ChannelPool {
    pub fn new(cfg: PoolConfig) -> Self {
        Self {
            cfg,
            channels: DashMap::new(),
        }
    }

    /// Number of cached channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn endpoint(&self, addr: &WorkerAddr) -> Result<Endpoint, PoolError> {
        let endpoint = Endpoint::from_shared(addr.endpoint_uri()).map_err(|e| {
            PoolError::InvalidEndpoint {
                addr: addr.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(endpoint
            .connect_timeout(self.cfg.connect_timeout)
            .http2_keep_alive_interval(self.cfg.keepalive_interval)
            .keep_alive_timeout(self.cfg.keepalive_timeout)
            .keep_alive_while_idle(true)
            .tcp_nodelay(true))
    }
}

impl Default for ChannelPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

#[async_trait]
impl ConnectionPool for ChannelPool {
    async fn get(&self, addr: &WorkerAddr) -> Result<WorkerClient<Channel>, PoolError> {
        if let Some(channel) = self.channels.get(addr).map(|c| c.value().clone()) {
            trace!(target: "cronx.rpc.pool", %addr, "reusing channel");
            return Ok(WorkerClient::new(channel));
        }

        let channel = self
            .endpoint(addr)?
            .connect()
            .await
            .map_err(|source| PoolError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        debug!(target: "cronx.rpc.pool", %addr, "connected");

        // Two racing first calls may both connect; the first insert wins.
        let channel = self
            .channels
            .entry(addr.clone())
            .or_insert(channel)
            .value()
            .clone();
        Ok(WorkerClient::new(channel))
    }

    fn evict(&self, addr: &WorkerAddr) {
        if self.channels.remove(addr).is_some() {
            debug!(target: "cronx.rpc.pool", %addr, "channel evicted");
        }
    }
}
