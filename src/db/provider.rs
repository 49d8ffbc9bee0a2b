//! Connection providers.
//!
//! A provider owns the lifetime of the shared database session. The lazy
//! provider opens it on first request and hands the same client to every
//! caller until it is closed or lost.

use super::{DatabaseClient, PostgresClient};
use crate::config::ConnectionConfig;
use crate::error::{PgdashError, Result};
use crate::safety::StatementPolicy;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Supplies the shared database client.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Returns the shared client, creating it if needed.
    ///
    /// A connection error here is terminal for the caller's current operation.
    async fn client(&self) -> Result<Arc<dyn DatabaseClient>>;

    /// Closes the shared client, if one is open.
    async fn close(&self) -> Result<()>;
}

/// Opens a client for a configuration.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn DatabaseClient>>;
}

/// Connects with [`PostgresClient`], opening read-only sessions under
/// [`StatementPolicy::ReadOnly`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresConnector {
    policy: StatementPolicy,
}

impl PostgresConnector {
    pub fn new(policy: StatementPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn DatabaseClient>> {
        let client = PostgresClient::connect_with_policy(config, self.policy).await?;
        Ok(Arc::new(client))
    }
}

/// Creates the client on first use and reuses it afterwards.
///
/// Failed attempts are not remembered; the next call tries once more.
pub struct LazyConnectionProvider {
    config: ConnectionConfig,
    connector: Box<dyn Connector>,
    client: Mutex<Option<Arc<dyn DatabaseClient>>>,
    sessions_opened: AtomicUsize,
}

impl LazyConnectionProvider {
    /// Creates a provider that connects to PostgreSQL.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_connector(config, PostgresConnector::default())
    }

    /// Creates a provider whose PostgreSQL sessions follow `policy`.
    pub fn with_policy(config: ConnectionConfig, policy: StatementPolicy) -> Self {
        Self::with_connector(config, PostgresConnector::new(policy))
    }

    /// Creates a provider with a custom connector.
    pub fn with_connector(config: ConnectionConfig, connector: impl Connector + 'static) -> Self {
        Self {
            config,
            connector: Box::new(connector),
            client: Mutex::new(None),
            sessions_opened: AtomicUsize::new(0),
        }
    }

    /// Returns the configuration this provider connects with.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Returns how many sessions have been opened so far.
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionProvider for LazyConnectionProvider {
    async fn client(&self) -> Result<Arc<dyn DatabaseClient>> {
        // Held across the connect so concurrent first callers share one session.
        let mut slot = self.client.lock().await;

        if let Some(client) = slot.as_ref() {
            if !client.is_closed().await {
                return Ok(Arc::clone(client));
            }
            info!("Cached database session is closed, reconnecting");
            slot.take();
        }

        match self.connector.connect(&self.config).await {
            Ok(client) => {
                self.sessions_opened.fetch_add(1, Ordering::SeqCst);
                info!("Connected to {}", self.config.display_string());
                *slot = Some(Arc::clone(&client));
                Ok(client)
            }
            Err(e) => {
                error!("Database connection error: {}", e);
                Err(e)
            }
        }
    }

    async fn close(&self) -> Result<()> {
        let client = self.client.lock().await.take();
        match client {
            Some(client) => client.close().await,
            None => Ok(()),
        }
    }
}

/// Always hands out the same, already constructed client.
pub struct StaticProvider {
    client: Arc<dyn DatabaseClient>,
}

impl StaticProvider {
    pub fn new(client: impl DatabaseClient + 'static) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Wraps a client the caller keeps a handle to.
    pub fn from_arc(client: Arc<dyn DatabaseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConnectionProvider for StaticProvider {
    async fn client(&self) -> Result<Arc<dyn DatabaseClient>> {
        Ok(Arc::clone(&self.client))
    }

    async fn close(&self) -> Result<()> {
        self.client.close().await
    }
}

/// Never has a connection.
pub struct UnavailableProvider {
    reason: String,
}

impl UnavailableProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ConnectionProvider for UnavailableProvider {
    async fn client(&self) -> Result<Arc<dyn DatabaseClient>> {
        Err(PgdashError::connection(self.reason.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
