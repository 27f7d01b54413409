use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// Parse host:port into a SocketAddr, with fallback to 0.0.0.0.
pub fn parse_bind_address(host: &str, port: u16) -> SocketAddr {
    host.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, port))
        .or_else(|_| host.parse::<SocketAddr>())
        .or_else(|_| {
            host.trim_start_matches('[')
                .trim_end_matches(']')
                .parse::<Ipv6Addr>()
                .map(|ip| SocketAddr::new(IpAddr::V6(ip), port))
        })
        .unwrap_or_else(|_| {
            if host != "localhost" {
                tracing::warn!(%host, "host is not an IP address; binding 0.0.0.0");
                SocketAddr::from(([0, 0, 0, 0], port))
            } else {
                SocketAddr::from(([127, 0, 0, 1], port))
            }
        })
}

/// CORS layer from the `cors` section. `None` when no origin is allowed.
pub fn cors_layer_from_config(cfg: &effectforge_config::CorsConfig) -> Option<CorsLayer> {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if cfg.allow_all_origins || cfg.allowed_origins.iter().any(|o| o == "*") {
        return Some(base.allow_origin(Any));
    }

    let origins: Vec<HeaderValue> = cfg
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim_end_matches('/')) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%origin, error = %e, "ignoring unusable CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }
    Some(base.allow_origin(origins))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_forms() {
        assert_eq!(
            parse_bind_address("127.0.0.1", 6100),
            SocketAddr::from(([127, 0, 0, 1], 6100))
        );
        assert_eq!(
            parse_bind_address("localhost", 80),
            SocketAddr::from(([127, 0, 0, 1], 80))
        );
        assert_eq!(parse_bind_address("[::1]", 6100).port(), 6100);
        assert!(parse_bind_address("[::1]", 6100).is_ipv6());
        assert_eq!(
            parse_bind_address("effects.internal", 9000),
            SocketAddr::from(([0, 0, 0, 0], 9000))
        );
    }

    #[test]
    fn cors_only_when_origins_configured() {
        let mut cfg = effectforge_config::Config::default().cors;
        assert!(cors_layer_from_config(&cfg).is_none());
        cfg.allowed_origins = vec!["https://effects.example.com/".into()];
        assert!(cors_layer_from_config(&cfg).is_some());
        cfg.allowed_origins.clear();
        cfg.allow_all_origins = true;
        assert!(cors_layer_from_config(&cfg).is_some());
    }
}
