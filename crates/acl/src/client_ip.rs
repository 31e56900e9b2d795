//! Client IP extraction, used by the ACL CIDR gate.

use std::net::{IpAddr, SocketAddr};

use http::HeaderMap;

/// Extracts the client IP per the precedence in §4.4: the first hop of
/// `X-Forwarded-For`, else `X-Real-IP`, else the remote socket address.
pub fn extract_client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            if let Ok(ip) = first.trim().parse() {
                return Some(ip);
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if let Ok(ip) = real_ip.trim().parse() {
            return Some(ip);
        }
    }

    remote.map(|addr| addr.ip())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_forwarded_for_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "1.2.3.4, 5.6.7.8".parse().unwrap());
        headers.insert("x-real-ip", "9.9.9.9".parse().unwrap());

        assert_eq!(extract_client_ip(&headers, None), Some("1.2.3.4".parse().unwrap()));
    }

    #[test]
    fn falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "9.9.9.9".parse().unwrap());

        assert_eq!(extract_client_ip(&headers, None), Some("9.9.9.9".parse().unwrap()));
    }

    #[test]
    fn falls_back_to_remote_socket() {
        let headers = HeaderMap::new();
        let remote: SocketAddr = "127.0.0.1:1234".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(remote)), Some("127.0.0.1".parse().unwrap()));
    }
}
