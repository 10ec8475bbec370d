//! HTTP client that leaves redirects to the caller and routes through a
//! proxy when one is configured.

use log::{debug, warn};
use reqwest::{Client, Proxy, Response, Url, redirect};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::proxy::{NoProxy, ProxyResolver};

pub const USER_AGENT: &str = concat!("relaybin/", env!("RELAYBIN_VERSION"));

/// Bounds how long a dead proxy can stall a request before the direct
/// fallback kicks in.
const PROXY_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct HttpClient {
    direct: Client,
    proxies: Arc<dyn ProxyResolver>,
    proxied: Arc<Mutex<HashMap<Url, Client>>>,
}

impl HttpClient {
    pub fn new(proxies: Arc<dyn ProxyResolver>) -> reqwest::Result<Self> {
        let direct = Self::builder().no_proxy().build()?;
        Ok(Self {
            direct,
            proxies,
            proxied: Arc::default(),
        })
    }

    pub fn direct() -> reqwest::Result<Self> {
        Self::new(Arc::new(NoProxy))
    }

    fn builder() -> reqwest::ClientBuilder {
        Client::builder()
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::none())
    }

    /// Issues a single GET without following redirects.
    ///
    /// When a proxy applies but cannot be reached (or refuses the tunnel),
    /// the request is repeated over a direct connection.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, url: &Url) -> reqwest::Result<Response> {
        if let Some(proxy_url) = self.proxies.resolve(url) {
            match self.proxied(&proxy_url) {
                Ok(client) => {
                    debug!("GET {} via proxy {}", url, proxy_url);
                    match client.get(url.clone()).send().await {
                        Ok(response) => return Ok(response),
                        Err(e) if e.is_connect() || e.is_timeout() => {
                            warn!(
                                "Could not reach {} through proxy {} ({}); proxy tunnelling is best effort, trying a direct connection",
                                url, proxy_url, e
                            );
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(e) => {
                    warn!(
                        "Ignoring proxy {} ({}); trying a direct connection",
                        proxy_url, e
                    );
                }
            }
        }

        debug!("GET {}", url);
        self.direct.get(url.clone()).send().await
    }

    /// One client per proxy, reused across redirect hops and attempts.
    fn proxied(&self, proxy_url: &Url) -> reqwest::Result<Client> {
        let mut cache = self
            .proxied
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(client) = cache.get(proxy_url) {
            return Ok(client.clone());
        }

        let client = Self::builder()
            .proxy(Proxy::all(proxy_url.clone())?)
            .connect_timeout(PROXY_CONNECT_TIMEOUT)
            .build()?;
        cache.insert(proxy_url.clone(), client.clone());
        Ok(client)
    }
}
