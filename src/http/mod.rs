//! HTTP client module: manual redirect handling and best-effort proxy routing.

mod client;
mod proxy;

pub use client::{HttpClient, USER_AGENT};
pub use proxy::{EnvProxyResolver, NoProxy, ProxyResolver};
