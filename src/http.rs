use crate::{
    error::BoxError,
    ports::{HttpClient, HttpResponse},
};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use std::time::Duration;

pub const HTTP_DIAL_TIMEOUT: Duration = Duration::from_secs(10);
pub const HTTP_KEEP_ALIVE: Duration = Duration::from_secs(600);
pub const HTTP_OVERALL_TIMEOUT: Duration = Duration::from_secs(15);
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(90);
pub const MAX_CONNECTIONS: usize = 100;

/// Connection and timeout settings shared by every request the host makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub keep_alive: Duration,
    pub idle_timeout: Duration,
    pub max_idle_per_host: usize,
    /// Deadline for the whole request, body included.
    pub timeout: Duration,
    /// Setting this to false accepts any certificate. Only for self-signed
    /// update endpoints you control.
    pub verify_tls: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: HTTP_DIAL_TIMEOUT,
            keep_alive: HTTP_KEEP_ALIVE,
            idle_timeout: IDLE_TIMEOUT,
            max_idle_per_host: MAX_CONNECTIONS,
            timeout: HTTP_OVERALL_TIMEOUT,
            verify_tls: true,
        }
    }
}

/// Blocking `reqwest` client. The underlying client is built on first use so
/// constructing a host never spins up connection machinery it might not need.
pub struct ReqwestClient {
    settings: HttpSettings,
    client: OnceCell<Client>,
}

impl ReqwestClient {
    pub fn new(settings: HttpSettings) -> Self {
        Self {
            settings,
            client: OnceCell::new(),
        }
    }

    fn client(&self) -> Result<&Client, reqwest::Error> {
        self.client.get_or_try_init(|| {
            if !self.settings.verify_tls {
                tracing::warn!("TLS certificate verification is disabled");
            }
            Client::builder()
                .connect_timeout(self.settings.connect_timeout)
                .tcp_keepalive(self.settings.keep_alive)
                .pool_idle_timeout(self.settings.idle_timeout)
                .pool_max_idle_per_host(self.settings.max_idle_per_host)
                .timeout(self.settings.timeout)
                .danger_accept_invalid_certs(!self.settings.verify_tls)
                .build()
        })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse, BoxError> {
        tracing::debug!(%url, "GET");
        let response = self.client()?.get(url).send().map_err(|e| {
            tracing::warn!(%url, error = %e, "GET failed");
            e
        })?;
        Ok(HttpResponse {
            status: response.status().as_u16(),
            body: Box::new(response),
        })
    }
}
