//! Tenant identifier from the request host

use std::net::Ipv4Addr;

/// Tenant used when the host carries no tenant label
pub const DEFAULT_TENANT: &str = "app";

/// Resolve the tenant for a `Host` header value
///
/// - `acme.example.com` → `acme`
/// - `www.example.com`, `example.com` → [`DEFAULT_TENANT`]
/// - `acme.localhost:3000` → `acme`
/// - `localhost:3000`, `127.0.0.1` → [`DEFAULT_TENANT`]
pub fn resolve_tenant(host: &str) -> String {
    resolve_tenant_with_default(host, DEFAULT_TENANT)
}

/// Same as [`resolve_tenant`] with a caller-supplied default tenant
pub fn resolve_tenant_with_default(host: &str, default_tenant: &str) -> String {
    let host = strip_port(host.trim()).to_ascii_lowercase();
    let host = host.trim_end_matches('.');

    // Bracketed IPv6 literals never carry a tenant
    if host.is_empty() || host.starts_with('[') {
        return default_tenant.to_string();
    }

    let labels: Vec<&str> = host.split('.').collect();

    let leading = match local_prefix(&labels) {
        Some(prefix) => prefix.first().copied(),
        None if labels.len() > 2 => labels.first().copied(),
        None => None,
    };

    match leading {
        Some(label) if is_tenant_label(label) => label.to_string(),
        _ => default_tenant.to_string(),
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }

    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Labels in front of `localhost` or an IPv4 literal, if the host is local
fn local_prefix<'a>(labels: &'a [&'a str]) -> Option<&'a [&'a str]> {
    if labels.last() == Some(&"localhost") {
        return Some(&labels[..labels.len() - 1]);
    }

    if labels.len() >= 4 {
        let split = labels.len() - 4;
        if labels[split..].join(".").parse::<Ipv4Addr>().is_ok() {
            return Some(&labels[..split]);
        }
    }

    None
}

fn is_tenant_label(label: &str) -> bool {
    !label.is_empty() && label != "www" && label != "localhost"
}
