//! Client address resolution for audit records.

use actix_web::HttpRequest;
use std::net::IpAddr;

/// Parses a header value as a single IP address, ignoring surrounding whitespace.
fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse::<IpAddr>().ok()
}

/// Extract the client IP address from an HTTP request.
///
/// Checks, in order: the first entry of X-Forwarded-For, X-Real-IP, then the peer
/// address. Header values that are not valid addresses are skipped.
pub fn extract_client_ip(req: &HttpRequest) -> Option<IpAddr> {
    let forwarded = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(parse_ip);
    if forwarded.is_some() {
        return forwarded;
    }

    let real_ip = req
        .headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .and_then(parse_ip);
    if real_ip.is_some() {
        return real_ip;
    }

    req.peer_addr().map(|addr| addr.ip())
}
