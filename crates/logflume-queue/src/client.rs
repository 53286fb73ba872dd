//! Redis list transport for serialized envelopes.
//!
//! One named list carries both envelope kinds. Push appends to the tail,
//! pop blocks on the head with a timeout, so producers never wait and the
//! worker never spins. FIFO order holds per queue; with several worker
//! processes popping concurrently, Redis's atomic BLPOP is the only
//! cross-process synchronization in the pipeline.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `REDIS_URL`: Redis connection URL (default: redis://127.0.0.1:6379)
//! - `LOG_QUEUE_KEY`: list name (default: logs_queue)

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use logflume_core::defaults::{DEFAULT_REDIS_URL, ENV_QUEUE_KEY, ENV_REDIS_URL, QUEUE_KEY};
use logflume_core::{LogQueue, Result};

/// Connection settings for the envelope queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis connection URL.
    pub redis_url: String,
    /// Name of the list carrying envelopes.
    pub queue_key: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            queue_key: QUEUE_KEY.to_string(),
        }
    }
}

impl QueueConfig {
    /// Load configuration from environment variables with fallback to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var(ENV_REDIS_URL) {
            config.redis_url = val;
        }

        if let Ok(val) = std::env::var(ENV_QUEUE_KEY) {
            if !val.is_empty() {
                config.queue_key = val;
            }
        }

        config
    }

    /// Set the Redis URL.
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Set the queue key.
    pub fn with_queue_key(mut self, key: impl Into<String>) -> Self {
        self.queue_key = key.into();
        self
    }
}

/// Envelope queue backed by a Redis list.
///
/// Cloning is cheap and shares the underlying multiplexed connection;
/// the manager reconnects on its own after transient drops.
#[derive(Clone)]
pub struct RedisLogQueue {
    connection: ConnectionManager,
    queue_key: String,
}

impl RedisLogQueue {
    /// Connect to Redis using the given configuration.
    pub async fn connect(config: &QueueConfig) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        info!(
            subsystem = "queue",
            queue_key = %config.queue_key,
            "Connected to envelope queue"
        );

        Ok(Self {
            connection,
            queue_key: config.queue_key.clone(),
        })
    }

    /// Name of the backing list.
    pub fn queue_key(&self) -> &str {
        &self.queue_key
    }
}

#[async_trait]
impl LogQueue for RedisLogQueue {
    async fn push(&self, payload: String) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.rpush::<_, _, ()>(&self.queue_key, payload).await?;
        Ok(())
    }

    async fn pop(&self, timeout_secs: f64) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        // BLPOP replies with [list, element]; Nil on timeout.
        let reply: Option<(String, String)> =
            conn.blpop(&self.queue_key, timeout_secs).await?;
        Ok(reply.map(|(_, payload)| payload))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!(subsystem = "queue", op = "ping", reply = %pong, "Queue reachable");
        Ok(())
    }

    async fn depth(&self) -> Result<i64> {
        let mut conn = self.connection.clone();
        let len: i64 = conn.llen(&self.queue_key).await?;
        Ok(len)
    }
}
