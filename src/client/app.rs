use std::sync::Arc;

use crate::client::config::ClientConfig;
use crate::client::models::session::Session;
use crate::client::services::auth_service::AuthService;
use crate::client::services::gateway::Gateway;
use crate::client::services::media_service::MediaService;
use crate::client::services::transport::{HttpTransport, Transport};
use crate::client::utils::session_store::KeyValueStore;
use crate::common::error::Result;

/// Everything a front end needs, wired once at startup
pub struct ClientApp {
    pub config: ClientConfig,
    pub session: Arc<Session>,
    pub auth: AuthService,
    pub gateway: Gateway,
    pub media: MediaService,
}

impl ClientApp {
    /// One HTTP client, one session, one transport per service
    pub fn from_config(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let session = Arc::new(Session::load(store));
        let client = HttpTransport::build_client(&config)?;
        let auth_transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(client.clone(), &config.auth_url, session.clone())?);
        let api_transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(client.clone(), &config.api_url, session.clone())?);
        let upload_transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(client, &config.upload_url, session.clone())?);

        let gateway = Gateway::new(api_transport);
        Ok(Self {
            auth: AuthService::new(auth_transport, session.clone()),
            media: MediaService::new(upload_transport, gateway.clone()),
            gateway,
            session,
            config,
        })
    }

    /// Builds from parts, for tests that substitute transports
    pub fn with_transports(
        config: ClientConfig,
        session: Arc<Session>,
        auth: Arc<dyn Transport>,
        api: Arc<dyn Transport>,
        uploads: Arc<dyn Transport>,
    ) -> Self {
        let gateway = Gateway::new(api);
        Self {
            auth: AuthService::new(auth, session.clone()),
            media: MediaService::new(uploads, gateway.clone()),
            gateway,
            session,
            config,
        }
    }
}
