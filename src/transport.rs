//! The shared HTTP session used by every pipeline stage.

use crate::config::PortalConfig;
use crate::error::DbHydroError;
use crate::streams::error::ResolveError;
use log::{debug, info, warn};
use reqwest::Client;

const MAIN_MENU: &str = "show_dbkey_info.main_menu";

/// An authenticated connection to the portal.
///
/// Holds a cookie-enabled `reqwest::Client` (itself a connection pool) and the
/// portal settings. It is shared by reference across fetch workers and is
/// never mutated after construction.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    config: PortalConfig,
}

impl Transport {
    /// Builds the HTTP client and, unless disabled in `config`, performs the
    /// session bootstrap request so the portal issues its session cookie.
    pub async fn connect(config: PortalConfig) -> Result<Self, DbHydroError> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .timeout(config.request_timeout)
            .build()
            .map_err(DbHydroError::ClientBuild)?;
        let transport = Self { client, config };

        if transport.config.bootstrap {
            transport.bootstrap().await?;
        }
        Ok(transport)
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    async fn bootstrap(&self) -> Result<(), DbHydroError> {
        let url = self.config.endpoint(MAIN_MENU);
        info!("Opening portal session at {}", url);
        self.client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| DbHydroError::Bootstrap { url, source })?;
        Ok(())
    }

    /// Issues one GET against a portal procedure and returns the body as text.
    pub(crate) async fn get_page(
        &self,
        procedure: &str,
        params: &[(&str, String)],
    ) -> Result<String, ResolveError> {
        let url = self.config.endpoint(procedure);
        debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| ResolveError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    ResolveError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    ResolveError::NetworkRequest(url, e)
                });
            }
        };

        response
            .text()
            .await
            .map_err(|e| ResolveError::NetworkRequest(url, e))
    }
}
