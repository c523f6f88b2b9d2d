//! Command line.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use imgverify_core::config::{timeout_from_secs, DEFAULT_KEY_FILE};
use imgverify_core::{RegistryOptions, ServiceConfig};

use crate::logging::LogFormat;

#[derive(Parser, Debug)]
#[command(
    name = "imgverify",
    version,
    about = "Verify cosign signatures of container images over HTTP"
)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080", env = "IMGVERIFY_LISTEN")]
    pub listen: SocketAddr,

    /// PEM public key; relative paths resolve against the working directory
    #[arg(long, default_value = DEFAULT_KEY_FILE, env = "IMGVERIFY_KEY_FILE")]
    pub key_file: PathBuf,

    /// Skip TLS certificate validation for registries
    #[arg(long, env = "IMGVERIFY_ALLOW_INSECURE")]
    pub allow_insecure: bool,

    /// Read registry credentials from mounted image-pull secrets
    #[arg(long = "k8s-keychain", env = "IMGVERIFY_K8S_KEYCHAIN")]
    pub k8s_keychain: bool,

    /// Prefix for signature tags
    #[arg(long, env = "IMGVERIFY_TAG_PREFIX")]
    pub tag_prefix: Option<String>,

    /// Give up on a verification after this many seconds (0: never)
    #[arg(long, env = "IMGVERIFY_VERIFY_TIMEOUT_SECS")]
    pub verify_timeout_secs: Option<u64>,

    #[arg(long, value_enum, default_value_t, env = "IMGVERIFY_LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn service_config(&self) -> ServiceConfig {
        let registry = RegistryOptions::default()
            .with_allow_insecure(self.allow_insecure)
            .with_kubernetes_keychain(self.k8s_keychain)
            .with_tag_prefix(self.tag_prefix.clone().unwrap_or_default());

        ServiceConfig::default()
            .with_key_file(&self.key_file)
            .with_registry(registry)
            .with_verify_timeout(self.verify_timeout_secs.and_then(timeout_from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["imgverify"]).unwrap();
        assert_eq!(cli.listen, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cli.log_format, LogFormat::Text);

        let config = cli.service_config();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "imgverify",
            "--listen",
            "127.0.0.1:9000",
            "--key-file",
            "/etc/imgverify/cosign.pub",
            "--allow-insecure",
            "--k8s-keychain",
            "--tag-prefix",
            "mirror-",
            "--verify-timeout-secs",
            "20",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        let config = cli.service_config();
        assert_eq!(config.key_file, PathBuf::from("/etc/imgverify/cosign.pub"));
        assert!(config.registry.allow_insecure);
        assert!(config.registry.kubernetes_keychain);
        assert_eq!(config.registry.tag_prefix, "mirror-");
        assert_eq!(config.verify_timeout, Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_zero_timeout_disables() {
        let cli = Cli::try_parse_from(["imgverify", "--verify-timeout-secs", "0"]).unwrap();
        assert_eq!(cli.service_config().verify_timeout, None);
    }

    #[test]
    fn test_rejects_bad_listen_address() {
        assert!(Cli::try_parse_from(["imgverify", "--listen", "not-an-address"]).is_err());
    }
}
