use actix_governor::{KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Rate-limit key: the client address, read from `Forwarded` /
/// `X-Forwarded-For` only when the peer is the trusted reverse proxy.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RealIpKeyExtractor {
    trusted_proxy: IpAddr,
}

impl RealIpKeyExtractor {
    pub fn new(trusted_proxy: IpAddr) -> Self {
        RealIpKeyExtractor { trusted_proxy }
    }
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    SocketAddr::from_str(raw)
        .map(|socket| socket.ip())
        .or_else(|_| IpAddr::from_str(raw))
        .ok()
}

impl KeyExtractor for RealIpKeyExtractor {
    type Key = IpAddr;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        let peer_ip = req.peer_addr().map(|socket| socket.ip());

        match peer_ip {
            // Behind the proxy: the forwarding headers carry the client.
            Some(peer) if peer == self.trusted_proxy => req
                .connection_info()
                .realip_remote_addr()
                .and_then(parse_ip)
                .ok_or_else(|| {
                    SimpleKeyExtractionError::new("Could not extract real IP address from request")
                }),
            Some(peer) => Ok(peer),
            None => Err(SimpleKeyExtractionError::new(
                "Could not extract peer IP address from request",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn extractor() -> RealIpKeyExtractor {
        RealIpKeyExtractor::new(IpAddr::from([10, 0, 0, 1]))
    }

    #[test]
    fn trusts_forwarded_header_from_the_proxy() {
        let req = TestRequest::default()
            .peer_addr("10.0.0.1:443".parse().unwrap())
            .insert_header(("x-forwarded-for", "203.0.113.7"))
            .to_srv_request();
        assert_eq!(extractor().extract(&req).unwrap(), IpAddr::from([203, 0, 113, 7]));
    }

    #[test]
    fn ignores_forwarded_header_from_anyone_else() {
        let req = TestRequest::default()
            .peer_addr("198.51.100.4:52100".parse().unwrap())
            .insert_header(("x-forwarded-for", "203.0.113.7"))
            .to_srv_request();
        assert_eq!(extractor().extract(&req).unwrap(), IpAddr::from([198, 51, 100, 4]));
    }

    #[test]
    fn request_without_a_peer_is_an_error() {
        let req = TestRequest::default().to_srv_request();
        assert!(extractor().extract(&req).is_err());
    }
}
