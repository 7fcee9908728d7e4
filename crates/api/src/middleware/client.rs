//! Client details recorded on each sign-in session.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use axum::http::HeaderMap;

/// Longest `User-Agent` kept on a session row.
const MAX_USER_AGENT_LEN: usize = 512;

/// Where a sign-in came from.
///
/// The address is the first `X-Forwarded-For` hop when a proxy set one,
/// otherwise the peer address of the connection. Both fields are absent
/// when the request carries neither (as in router-level tests).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(ClientInfo {
            user_agent: user_agent(&parts.headers),
            ip_address: forwarded_for(&parts.headers).or(peer),
        })
    }
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(USER_AGENT)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.chars().take(MAX_USER_AGENT_LEN).collect())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let first = headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim();
    (!first.is_empty()).then(|| first.to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, Request};

    use super::*;

    async fn extract(request: Request<()>) -> ClientInfo {
        let (mut parts, ()) = request.into_parts();
        match ClientInfo::from_request_parts(&mut parts, &()).await {
            Ok(info) => info,
            Err(never) => match never {},
        }
    }

    #[tokio::test]
    async fn first_forwarded_hop_wins_over_peer() {
        let mut request = Request::builder()
            .header(USER_AGENT, "Mozilla/5.0")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.2")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 2], 4000))));

        let info = extract(request).await;
        assert_eq!(info.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(info.ip_address.as_deref(), Some("203.0.113.9"));
    }

    #[tokio::test]
    async fn peer_address_is_used_without_proxy_header() {
        let mut request = Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 5555))));

        let info = extract(request).await;
        assert_eq!(info.user_agent, None);
        assert_eq!(info.ip_address.as_deref(), Some("192.0.2.1"));
    }

    #[tokio::test]
    async fn oversized_user_agent_is_truncated() {
        let long = "x".repeat(MAX_USER_AGENT_LEN + 40);
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&long).unwrap());

        assert_eq!(user_agent(&headers).map(|ua| ua.len()), Some(MAX_USER_AGENT_LEN));
    }
}
