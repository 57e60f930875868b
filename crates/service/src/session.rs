//! Session lifecycle against the core service.
//!
//! A session is created per invocation. Handles are opened lazily on first use
//! and reused afterwards; [`Session::release`] closes whatever was opened and
//! runs at most once.

use crate::traits::{Connector, CoreService, StreamDownload};
use cmsweep_core::{Error, Result, SessionConfig};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub struct Session {
    config: SessionConfig,
    connector: Arc<dyn Connector>,
    service: OnceCell<Arc<dyn CoreService>>,
    download: OnceCell<Arc<dyn StreamDownload>>,
    version: OnceCell<String>,
    released: bool,
}

impl Session {
    /// Create a session. Nothing is opened until a handle is requested.
    pub fn acquire(config: SessionConfig, connector: Arc<dyn Connector>) -> Self {
        tracing::debug!(
            host = config.host(),
            port = config.port(),
            timeout_secs = config.timeout().as_secs(),
            "Acquired core service session"
        );
        Self {
            config,
            connector,
            service: OnceCell::new(),
            download: OnceCell::new(),
            version: OnceCell::new(),
            released: false,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The core service handle, connecting on first use.
    pub async fn service(&self) -> Result<Arc<dyn CoreService>> {
        self.ensure_open()?;
        let service = self
            .service
            .get_or_try_init(|| async {
                tracing::debug!(url = %self.config.service_url(), "Connecting to core service");
                self.connector.connect(&self.config).await
            })
            .await
            .map_err(|e| Error::Connectivity(e.to_string()))?;
        Ok(Arc::clone(service))
    }

    /// The streaming download handle, connecting on first use.
    pub async fn download(&self) -> Result<Arc<dyn StreamDownload>> {
        self.ensure_open()?;
        let download = self
            .download
            .get_or_try_init(|| async {
                tracing::debug!(url = %self.config.download_url(), "Connecting to download endpoint");
                self.connector.connect_download(&self.config).await
            })
            .await
            .map_err(|e| Error::Connectivity(e.to_string()))?;
        Ok(Arc::clone(download))
    }

    /// Service API version, fetched once. Any failure is a connectivity error.
    pub async fn version(&self) -> Result<String> {
        let version = self
            .version
            .get_or_try_init(|| async {
                let service = self.service().await?;
                let version = service
                    .api_version()
                    .await
                    .map_err(|e| Error::Connectivity(e.to_string()))?;
                tracing::info!(%version, "Connected to core service");
                Ok::<_, Error>(version)
            })
            .await?;
        Ok(version.clone())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.released {
            return Err(Error::Connectivity("session already released".to_string()));
        }
        Ok(())
    }

    /// Close every opened handle. Later calls are no-ops.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if self.service.take().is_some() {
            tracing::debug!("Closed core service handle");
        }
        if self.download.take().is_some() {
            tracing::debug!("Closed download handle");
        }
        self.version.take();
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Run `body` with this session and release it afterwards, whatever the outcome.
    pub async fn scoped<T, E>(
        mut self,
        body: impl AsyncFnOnce(&Session) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let result = body(&self).await;
        self.release();
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("connected", &self.service.initialized())
            .field("released", &self.released)
            .finish()
    }
}
