use actix_web::HttpRequest;

use crate::constants::UNKNOWN_CLIENT;

/// Resolve the client address used as the rate-limit key. Proxy headers are
/// only honored when `trust_proxy_headers` is set: the first non-empty hop of
/// x-forwarded-for wins, then x-real-ip, then the socket peer address.
pub fn get_client_ip(req: &HttpRequest, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        for header in ["x-forwarded-for", "x-real-ip"] {
            if let Some(value) = req.headers().get(header).and_then(|v| v.to_str().ok()) {
                if let Some(ip) = value.split(',').map(str::trim).find(|hop| !hop.is_empty()) {
                    return ip.to_string();
                }
            }
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
