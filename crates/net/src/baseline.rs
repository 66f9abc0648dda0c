//! Baseline services
//!
//! Network-dependent checks compare the package against previously published
//! state. Every fetch goes through [`BaselineService`]; a failure is returned
//! as a `NetworkError` and the caller turns it into an explicit skip.

use crate::client::{ensure_success, NetClient, NetConfig};
use pkgcheck_config::Config;
use pkgcheck_document::{json, Document, JsonOptions};
use pkgcheck_errors::NetworkError;
use pkgcheck_types::PlatformVersion;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Source of previously published state
pub trait BaselineService {
    /// The manifest published as `name@version`, or `None` if never published
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be reached or answers with
    /// anything other than the manifest or a 404.
    fn published_manifest(&self, name: &str, version: &str)
        -> Result<Option<Document>, NetworkError>;

    /// Names of the packages built into a platform release
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be fetched or decoded.
    fn builtin_packages(&self, platform: PlatformVersion)
        -> Result<BTreeSet<String>, NetworkError>;

    /// Raw confidential-content index blob
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be fetched.
    fn confidential_blob(&self) -> Result<Vec<u8>, NetworkError>;
}

#[derive(Debug, Deserialize)]
struct BuiltinList {
    packages: Vec<String>,
}

/// Baselines fetched over HTTP
#[derive(Debug, Clone)]
pub struct RegistryBaselines {
    client: NetClient,
    registry: Url,
    builtins: Option<Url>,
    confidential: Option<Url>,
}

impl RegistryBaselines {
    /// Create a service over explicit endpoints
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidUrl` if an endpoint is not a valid URL.
    pub fn new(
        client: NetClient,
        registry: &str,
        builtins: Option<&str>,
        confidential: Option<&str>,
    ) -> Result<Self, NetworkError> {
        Ok(Self {
            client,
            registry: parse_url(registry)?,
            builtins: builtins.map(parse_url).transpose()?,
            confidential: confidential.map(parse_url).transpose()?,
        })
    }

    /// Create a service from the `[network]` and `[baselines]` sections
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built or an endpoint is invalid.
    pub fn from_config(config: &Config) -> Result<Self, NetworkError> {
        let client = NetClient::new(NetConfig::from_config(&config.network))?;
        Self::new(
            client,
            &config.baselines.registry_url,
            config.baselines.builtins_url.as_deref(),
            config.baselines.confidential_url.as_deref(),
        )
    }

    fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, NetworkError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| NetworkError::InvalidUrl(base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl BaselineService for RegistryBaselines {
    fn published_manifest(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Option<Document>, NetworkError> {
        let url = Self::endpoint(&self.registry, &[name, version])?;
        tracing::debug!(%url, "fetching published manifest");

        let response = self.client.get(url.as_str())?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = ensure_success(response)?
            .bytes()
            .map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
        json::parse_with(&body, JsonOptions::legacy())
            .map(Some)
            .map_err(|e| NetworkError::DownloadFailed(format!("{url}: {e}")))
    }

    fn builtin_packages(
        &self,
        platform: PlatformVersion,
    ) -> Result<BTreeSet<String>, NetworkError> {
        let base = self
            .builtins
            .as_ref()
            .ok_or(NetworkError::NetworkUnavailable)?;
        let url = Self::endpoint(base, &[&format!("{platform}.json")])?;
        tracing::debug!(%url, "fetching built-in package list");

        let list: BuiltinList = ensure_success(self.client.get(url.as_str())?)?
            .json()
            .map_err(|e| NetworkError::DownloadFailed(format!("{url}: {e}")))?;
        Ok(list.packages.into_iter().collect())
    }

    fn confidential_blob(&self) -> Result<Vec<u8>, NetworkError> {
        let url = self
            .confidential
            .as_ref()
            .ok_or(NetworkError::NetworkUnavailable)?;
        tracing::debug!(%url, "fetching confidential-content index");
        self.client.get_bytes(url.as_str())
    }
}

/// A service that never reaches the network
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBaselines;

impl BaselineService for OfflineBaselines {
    fn published_manifest(&self, _: &str, _: &str) -> Result<Option<Document>, NetworkError> {
        Err(NetworkError::NetworkUnavailable)
    }

    fn builtin_packages(&self, _: PlatformVersion) -> Result<BTreeSet<String>, NetworkError> {
        Err(NetworkError::NetworkUnavailable)
    }

    fn confidential_blob(&self) -> Result<Vec<u8>, NetworkError> {
        Err(NetworkError::NetworkUnavailable)
    }
}

/// Baselines held in memory, for embedding and tests
///
/// Lookups that were never populated behave like an unreachable service.
#[derive(Debug, Clone, Default)]
pub struct FixedBaselines {
    published: BTreeMap<(String, String), Document>,
    registry_reachable: bool,
    builtins: BTreeMap<PlatformVersion, BTreeSet<String>>,
    confidential: Option<Vec<u8>>,
}

impl FixedBaselines {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the registry reachable; unknown versions read as unpublished
    #[must_use]
    pub fn with_registry(mut self) -> Self {
        self.registry_reachable = true;
        self
    }

    #[must_use]
    pub fn with_published(mut self, name: &str, version: &str, manifest: Document) -> Self {
        self.registry_reachable = true;
        self.published
            .insert((name.to_string(), version.to_string()), manifest);
        self
    }

    #[must_use]
    pub fn with_builtins<I, S>(mut self, platform: PlatformVersion, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builtins
            .insert(platform, names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_confidential_blob(mut self, blob: Vec<u8>) -> Self {
        self.confidential = Some(blob);
        self
    }
}

impl BaselineService for FixedBaselines {
    fn published_manifest(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Option<Document>, NetworkError> {
        if !self.registry_reachable {
            return Err(NetworkError::NetworkUnavailable);
        }
        Ok(self
            .published
            .get(&(name.to_string(), version.to_string()))
            .cloned())
    }

    fn builtin_packages(
        &self,
        platform: PlatformVersion,
    ) -> Result<BTreeSet<String>, NetworkError> {
        self.builtins
            .get(&platform)
            .cloned()
            .ok_or(NetworkError::NetworkUnavailable)
    }

    fn confidential_blob(&self) -> Result<Vec<u8>, NetworkError> {
        self.confidential
            .clone()
            .ok_or(NetworkError::NetworkUnavailable)
    }
}

/// The service selected by configuration
///
/// # Errors
///
/// Returns an error if the HTTP service cannot be constructed.
pub fn baselines_for(config: &Config) -> Result<Box<dyn BaselineService>, NetworkError> {
    if config.network.offline {
        tracing::debug!("offline mode, baseline checks will be skipped");
        return Ok(Box::new(OfflineBaselines));
    }
    Ok(Box::new(RegistryBaselines::from_config(config)?))
}

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed or invalid according to RFC 3986.
pub fn parse_url(url: &str) -> Result<Url, NetworkError> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url() {
        assert!(parse_url("https://example.com").is_ok());
        assert!(matches!(
            parse_url("not a url"),
            Err(NetworkError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let base = parse_url("https://registry.example.com/api/").unwrap();
        let url = RegistryBaselines::endpoint(&base, &["com.example.a", "1.0.0"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://registry.example.com/api/com.example.a/1.0.0"
        );

        let bare = parse_url("https://registry.example.com").unwrap();
        let url = RegistryBaselines::endpoint(&bare, &["2021.3.json"]).unwrap();
        assert_eq!(url.as_str(), "https://registry.example.com/2021.3.json");
    }

    #[test]
    fn test_offline_is_always_unavailable() {
        let offline = OfflineBaselines;
        assert!(matches!(
            offline.published_manifest("a.b", "1.0.0"),
            Err(NetworkError::NetworkUnavailable)
        ));
        assert!(matches!(
            offline.confidential_blob(),
            Err(NetworkError::NetworkUnavailable)
        ));
    }

    #[test]
    fn test_fixed_baselines() {
        let platform = PlatformVersion::new(2021, 3);
        let doc = json::parse(br#"{"name":"com.example.a"}"#).unwrap();
        let fixed = FixedBaselines::new()
            .with_published("com.example.a", "1.0.0", doc)
            .with_builtins(platform, ["com.unity.ugui"]);

        assert!(fixed
            .published_manifest("com.example.a", "1.0.0")
            .unwrap()
            .is_some());
        assert!(fixed
            .published_manifest("com.example.a", "1.0.1")
            .unwrap()
            .is_none());
        assert!(fixed
            .builtin_packages(platform)
            .unwrap()
            .contains("com.unity.ugui"));
        assert!(fixed.confidential_blob().is_err());
    }

    #[test]
    fn test_unconfigured_endpoints_are_unavailable() {
        let service =
            RegistryBaselines::new(NetClient::with_defaults().unwrap(), "http://localhost", None, None)
                .unwrap();
        assert!(matches!(
            service.builtin_packages(PlatformVersion::new(2022, 1)),
            Err(NetworkError::NetworkUnavailable)
        ));
        assert!(matches!(
            service.confidential_blob(),
            Err(NetworkError::NetworkUnavailable)
        ));
    }
}
