//! Portal and pipeline settings.

use bon::Builder;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://my.sfwmd.gov/dbhydroplsql";

/// Settings for talking to the DBHYDRO portal and for the fetch/parse worker pools.
///
/// Every field has a default, so `PortalConfig::default()` matches the portal's
/// public weather search. Use the builder to override individual settings.
///
/// ```
/// use dbhydro::PortalConfig;
/// use std::time::Duration;
///
/// let config = PortalConfig::builder()
///     .concurrency(4)
///     .batch_deadline(Duration::from_secs(600))
///     .max_retries(2)
///     .build();
/// assert_eq!(config.category, "WEATHER");
/// assert_eq!(config.worker_count(), 4);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct PortalConfig {
    /// Root of the portal's PL/SQL gateway, without a trailing slash.
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    /// Value of the `v_category` search filter.
    #[builder(into, default = "WEATHER".to_string())]
    pub category: String,
    /// Value of the `v_frequency` search filter (`BK` = breakpoint data).
    #[builder(into, default = "BK".to_string())]
    pub frequency: String,
    /// Maximum number of rows the search page should return.
    #[builder(default = 999_999)]
    pub display_quantity: u32,
    /// Upper bound on concurrent report downloads and concurrent payload parses.
    #[builder(default = 8)]
    pub concurrency: usize,
    /// Timeout applied to every single HTTP request.
    #[builder(default = Duration::from_secs(60))]
    pub request_timeout: Duration,
    /// Overall deadline for the fetch stage. Streams not fetched in time are dropped.
    pub batch_deadline: Option<Duration>,
    /// Extra attempts for a failed report download.
    #[builder(default = 0)]
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further attempt.
    #[builder(default = Duration::from_millis(500))]
    pub retry_backoff: Duration,
    /// Whether to request the portal's main menu first to establish a session cookie.
    #[builder(default = true)]
    pub bootstrap: bool,
}

impl PortalConfig {
    /// The worker-pool size, never less than one.
    pub fn worker_count(&self) -> usize {
        self.concurrency.max(1)
    }

    pub(crate) fn endpoint(&self, procedure: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), procedure)
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
