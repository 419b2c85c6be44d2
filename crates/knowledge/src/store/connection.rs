//! Connection-string resolution with DNS fallback.
//!
//! Some deployments name the store host with a name that only resolves
//! inside a container network. When that lookup fails and a fallback host
//! is configured, the connection string is rewritten to use it.

use docqa_core::{AppError, AppResult, Settings};
use reqwest::Url;

/// Schemes that address local files or object storage; never DNS-checked.
const PASSTHROUGH_SCHEMES: [&str; 6] = ["file", "memory", "s3", "s3+ddb", "gs", "az"];

/// Resolves hostnames.
#[async_trait::async_trait]
pub trait HostResolver: Send + Sync {
    /// Ok when `host` resolves to at least one address.
    async fn resolve(&self, host: &str, port: u16) -> Result<(), String>;
}

/// Resolver backed by the system DNS configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait::async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> Result<(), String> {
        let mut addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| e.to_string())?;
        match addrs.next() {
            Some(_) => Ok(()),
            None => Err("no addresses returned".to_string()),
        }
    }
}

/// Connection string to use for this call.
///
/// Local paths and object-store URIs are returned unchanged. For network
/// URLs the host is looked up; on failure the configured fallback host is
/// substituted, or `NetworkResolution` is returned when there is none.
pub async fn resolve_connection_url(
    settings: &Settings,
    resolver: &dyn HostResolver,
) -> AppResult<String> {
    rewrite_unresolvable_host(
        &settings.store_url(),
        settings.store_fallback_host.as_deref(),
        resolver,
    )
    .await
}

pub async fn rewrite_unresolvable_host(
    raw: &str,
    fallback_host: Option<&str>,
    resolver: &dyn HostResolver,
) -> AppResult<String> {
    let mut url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return Ok(raw.to_string()),
    };

    if PASSTHROUGH_SCHEMES.contains(&url.scheme()) {
        return Ok(raw.to_string());
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => return Ok(raw.to_string()),
    };
    let port = url.port_or_known_default().unwrap_or(0);

    let reason = match resolver.resolve(&host, port).await {
        Ok(()) => return Ok(raw.to_string()),
        Err(reason) => reason,
    };

    let fallback = fallback_host
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::NetworkResolution {
            host: host.clone(),
            reason: reason.clone(),
        })?;

    url.set_host(Some(fallback)).map_err(|e| {
        AppError::Config(format!("Invalid fallback host '{}': {}", fallback, e))
    })?;

    tracing::warn!(
        "Host '{}' could not be resolved ({}); using fallback host '{}'",
        host,
        reason,
        fallback
    );

    Ok(url.to_string())
}
