//! Registry credential resolution.
//!
//! The Kubernetes keychain reads image-pull secrets mounted into the pod as a
//! docker config file (`.dockerconfigjson` format). Credential helpers and
//! cloud token exchange are not supported.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use oci_client::secrets::RegistryAuth;
use serde::Deserialize;

use crate::error::{ServiceError, ServiceResult};
use crate::options::Keychain;

/// Docker Hub hosts, in the order their credentials are preferred.
const DOCKER_HUB_ALIASES: &[&str] = &["index.docker.io", "docker.io", "registry-1.docker.io"];

#[derive(Debug, Default, Deserialize)]
struct DockerConfig {
    #[serde(default)]
    auths: BTreeMap<String, AuthEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthEntry {
    #[serde(default)]
    auth: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Location of the docker config file: `$DOCKER_CONFIG/config.json`, else
/// `~/.docker/config.json`.
pub fn docker_config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("DOCKER_CONFIG") {
        return Some(PathBuf::from(dir).join("config.json"));
    }
    dirs::home_dir().map(|home| home.join(".docker").join("config.json"))
}

/// Resolve the credentials to use for `registry`.
pub fn resolve_auth(keychain: Keychain, registry: &str) -> ServiceResult<RegistryAuth> {
    match keychain {
        Keychain::Anonymous => Ok(RegistryAuth::Anonymous),
        Keychain::Kubernetes => match docker_config_path() {
            Some(path) => resolve_from_file(&path, registry),
            None => Ok(RegistryAuth::Anonymous),
        },
    }
}

/// Resolve credentials for `registry` from a docker config file.
///
/// A missing file means anonymous access; an unreadable or malformed one is a
/// configuration error.
pub fn resolve_from_file(path: &Path, registry: &str) -> ServiceResult<RegistryAuth> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no docker config, using anonymous access");
            return Ok(RegistryAuth::Anonymous);
        }
        Err(e) => {
            return Err(ServiceError::Config {
                message: format!("failed to read {}: {}", path.display(), e),
            })
        }
    };

    let config: DockerConfig =
        serde_json::from_str(&content).map_err(|e| ServiceError::Config {
            message: format!("invalid docker config {}: {}", path.display(), e),
        })?;

    match config.credentials_for(registry)? {
        Some((username, password)) => {
            tracing::debug!(registry, username = %username, "using keychain credentials");
            Ok(RegistryAuth::Basic(username, password))
        }
        None => Ok(RegistryAuth::Anonymous),
    }
}

impl DockerConfig {
    /// An entry keyed by the registry's own host wins; otherwise Docker Hub
    /// aliases are tried in [`DOCKER_HUB_ALIASES`] order.
    fn credentials_for(&self, registry: &str) -> ServiceResult<Option<(String, String)>> {
        let wanted = bare_host(registry);
        let entry = self
            .auths
            .iter()
            .filter_map(|(key, entry)| {
                match_rank(&wanted, &bare_host(key)).map(|rank| (rank, entry))
            })
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, entry)| entry);

        match entry {
            Some(entry) => entry.credentials(),
            None => Ok(None),
        }
    }
}

impl AuthEntry {
    fn credentials(&self) -> ServiceResult<Option<(String, String)>> {
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return Ok(Some((username.clone(), password.clone())));
        }

        let Some(auth) = self.auth.as_deref().filter(|a| !a.is_empty()) else {
            return Ok(None);
        };

        let decoded = BASE64.decode(auth).map_err(|e| ServiceError::Config {
            message: format!("invalid base64 in docker config auth: {}", e),
        })?;
        let decoded = String::from_utf8(decoded).map_err(|e| ServiceError::Config {
            message: format!("docker config auth is not UTF-8: {}", e),
        })?;

        match decoded.split_once(':') {
            Some((username, password)) => Ok(Some((username.to_string(), password.to_string()))),
            None => Err(ServiceError::Config {
                message: "docker config auth must be base64(username:password)".to_string(),
            }),
        }
    }
}

/// Reduce a docker config key or registry name to a lowercase host.
fn bare_host(key: &str) -> String {
    key.trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// How well a config host serves `wanted`; lower is better.
fn match_rank(wanted: &str, host: &str) -> Option<usize> {
    if host == wanted {
        return Some(0);
    }
    if !DOCKER_HUB_ALIASES.contains(&wanted) {
        return None;
    }
    DOCKER_HUB_ALIASES
        .iter()
        .position(|alias| *alias == host)
        .map(|i| i + 1)
}
