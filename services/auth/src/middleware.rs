//! Middleware for throttling credential endpoints

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::Response,
};
use common::response;
use std::net::SocketAddr;

use crate::{rate_limiter::RateLimitDecision, state::AppState};

/// Client identity used as the rate limit key
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());

        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Reject the request with 429 once the caller exhausts its attempts
pub async fn auth_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let key = format!(
        "{}:{}",
        client_ip(
            req.headers(),
            peer,
            state.rate_limiter.config().trust_forwarded_for
        ),
        req.uri().path()
    );

    match state.rate_limiter.check(&key).await {
        RateLimitDecision::Allowed { .. } => next.run(req).await,
        RateLimitDecision::Limited { retry_after } => {
            let mut response = response::error(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many attempts, please try again later",
            );
            let seconds = retry_after.as_secs().max(1);
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(seconds));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_header_is_ignored_unless_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        let peer: SocketAddr = "192.0.2.1:5555".parse().unwrap();

        assert_eq!(client_ip(&headers, Some(peer), false), "192.0.2.1");
        assert_eq!(client_ip(&headers, Some(peer), true), "203.0.113.7");
        assert_eq!(client_ip(&HeaderMap::new(), None, true), "unknown");
    }
}
