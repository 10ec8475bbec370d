//! Proxy discovery for download requests.

use log::warn;
use reqwest::Url;

use crate::runtime::Runtime;

/// Chooses a proxy for a request URL.
///
/// Routing is best effort: a resolver only names a proxy, it does not
/// promise that an HTTPS CONNECT tunnel through it will work. Callers fall
/// back to a direct connection when the proxy cannot be reached.
pub trait ProxyResolver: Send + Sync {
    fn resolve(&self, url: &Url) -> Option<Url>;
}

/// Never uses a proxy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProxy;

impl ProxyResolver for NoProxy {
    fn resolve(&self, _url: &Url) -> Option<Url> {
        None
    }
}

/// Reads `HTTPS_PROXY`/`https_proxy` and `HTTP_PROXY`/`http_proxy` once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvProxyResolver {
    https: Option<Url>,
    http: Option<Url>,
}

impl EnvProxyResolver {
    pub fn from_runtime<R: Runtime>(runtime: &R) -> Self {
        let lookup = |upper: &str, lower: &str| {
            runtime
                .env_var(upper)
                .or_else(|_| runtime.env_var(lower))
                .ok()
                .filter(|value| !value.trim().is_empty())
                .and_then(|value| parse_proxy(upper, &value))
        };

        Self {
            https: lookup("HTTPS_PROXY", "https_proxy"),
            http: lookup("HTTP_PROXY", "http_proxy"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.https.is_some() || self.http.is_some()
    }
}

impl ProxyResolver for EnvProxyResolver {
    fn resolve(&self, url: &Url) -> Option<Url> {
        let (preferred, fallback) = if url.scheme() == "https" {
            (&self.https, &self.http)
        } else {
            (&self.http, &self.https)
        };
        preferred.as_ref().or(fallback.as_ref()).cloned()
    }
}

/// `proxy.corp:3128` is accepted as shorthand for `http://proxy.corp:3128`.
fn parse_proxy(var: &str, value: &str) -> Option<Url> {
    let value = value.trim();
    let candidate = if value.contains("://") {
        value.to_string()
    } else {
        format!("http://{}", value)
    };

    match Url::parse(&candidate) {
        Ok(url) if url.host_str().is_some() => Some(url),
        Ok(_) | Err(_) => {
            warn!(
                "Ignoring {}={:?}: not a valid proxy URL, connecting directly",
                var, value
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use std::collections::HashMap;

    fn runtime_with_env(vars: &[(&'static str, &'static str)]) -> MockRuntime {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        let mut runtime = MockRuntime::new();
        runtime.expect_env_var().returning(move |key| {
            vars.get(key)
                .map(|v| v.to_string())
                .ok_or(std::env::VarError::NotPresent)
        });
        runtime
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_no_proxy_configured() {
        let resolver = EnvProxyResolver::from_runtime(&runtime_with_env(&[]));
        assert!(!resolver.is_configured());
        assert_eq!(resolver.resolve(&url("https://github.com/a")), None);
    }

    #[test]
    fn test_https_proxy_by_scheme() {
        let resolver = EnvProxyResolver::from_runtime(&runtime_with_env(&[
            ("HTTPS_PROXY", "http://secure.proxy:8443"),
            ("http_proxy", "http://plain.proxy:3128"),
        ]));

        assert_eq!(
            resolver.resolve(&url("https://github.com/a")),
            Some(url("http://secure.proxy:8443"))
        );
        assert_eq!(
            resolver.resolve(&url("http://example.com/a")),
            Some(url("http://plain.proxy:3128"))
        );
    }

    #[test]
    fn test_falls_back_to_other_scheme_variable() {
        let resolver =
            EnvProxyResolver::from_runtime(&runtime_with_env(&[("http_proxy", "proxy:3128")]));
        assert_eq!(
            resolver.resolve(&url("https://github.com/a")),
            Some(url("http://proxy:3128"))
        );
    }

    #[test]
    fn test_invalid_proxy_is_ignored() {
        let resolver = EnvProxyResolver::from_runtime(&runtime_with_env(&[(
            "HTTPS_PROXY",
            "http://",
        )]));
        assert!(!resolver.is_configured());
    }

    #[test]
    fn test_no_proxy_resolver() {
        assert_eq!(NoProxy.resolve(&url("https://github.com")), None);
    }
}
