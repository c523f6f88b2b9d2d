//! OCI client construction from [`ClientOptions`].

use std::net::IpAddr;

use oci_client::client::{ClientConfig, ClientProtocol};
use oci_client::Client;

use crate::options::ClientOptions;

/// Client for one verification attempt.
///
/// Loopback, `localhost` and private-network registries are spoken to over
/// plain HTTP, everything else over HTTPS. `allow_insecure` turns off TLS
/// certificate validation.
pub(crate) fn registry_client(options: &ClientOptions, registries: &[&str]) -> Client {
    Client::new(client_config(options, registries))
}

pub(crate) fn client_config(options: &ClientOptions, registries: &[&str]) -> ClientConfig {
    let mut plain_http: Vec<String> = registries
        .iter()
        .filter(|registry| is_local_registry(registry))
        .map(|registry| registry.to_string())
        .collect();
    plain_http.sort();
    plain_http.dedup();

    let protocol = if plain_http.is_empty() {
        ClientProtocol::Https
    } else {
        ClientProtocol::HttpsExcept(plain_http)
    };

    ClientConfig {
        protocol,
        accept_invalid_certificates: options.remote.allow_insecure,
        ..Default::default()
    }
}

pub(crate) fn is_local_registry(registry: &str) -> bool {
    let host = strip_port(registry);
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => ip.is_loopback() || ip.is_private(),
        Ok(IpAddr::V6(ip)) => ip.is_loopback(),
        Err(_) => false,
    }
}

fn strip_port(registry: &str) -> &str {
    if let Some(rest) = registry.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match registry.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => registry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RemoteOptions;

    #[test]
    fn test_local_registries() {
        assert!(is_local_registry("localhost:5000"));
        assert!(is_local_registry("127.0.0.1:41234"));
        assert!(is_local_registry("10.1.2.3"));
        assert!(is_local_registry("192.168.1.10:5000"));
        assert!(is_local_registry("[::1]:5000"));
        assert!(!is_local_registry("ghcr.io"));
        assert!(!is_local_registry("docker.io"));
        assert!(!is_local_registry("8.8.8.8:443"));
    }

    #[test]
    fn test_client_config_protocol() {
        let config = client_config(&ClientOptions::default(), &["ghcr.io", "ghcr.io"]);
        assert!(matches!(config.protocol, ClientProtocol::Https));
        assert!(!config.accept_invalid_certificates);

        let config = client_config(
            &ClientOptions::default(),
            &["localhost:5000", "ghcr.io", "localhost:5000"],
        );
        match config.protocol {
            ClientProtocol::HttpsExcept(hosts) => assert_eq!(hosts, vec!["localhost:5000"]),
            _ => panic!("expected HttpsExcept"),
        }
    }

    #[test]
    fn test_allow_insecure() {
        let options = ClientOptions {
            remote: RemoteOptions {
                allow_insecure: true,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(client_config(&options, &["ghcr.io"]).accept_invalid_certificates);
    }
}
