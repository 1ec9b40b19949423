// SPDX-License-Identifier: MPL-2.0

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::error::FetchError;
use super::payload::normalize_children;
use crate::config::{CascadeConfig, PARENT_MARKER};
use crate::error::ConfigError;
use crate::widgets::cascade::{ChoiceOption, Level};

/// Stands in for `{parent}` while the template is parsed, so the marker's
/// braces are not mangled by URL parsing.
const PARENT_SENTINEL: &str = "__cascadia_parent__";

/// Resolves a parent identifier to its children at a given level.
///
/// Implementations perform one lookup per call and must not cache: the
/// hierarchy can change between requests.
#[async_trait]
pub trait HierarchyResolver: Send + Sync {
    /// Fetch the children of `parent_id`, to be shown at `level`.
    async fn fetch_children(
        &self,
        level: Level,
        parent_id: &str,
    ) -> Result<Vec<ChoiceOption>, FetchError>;
}

#[derive(Debug, Clone)]
struct LevelEndpoint {
    endpoint: String,
    wrapper_key: Option<String>,
}

/// HTTP resolver backed by the per-level children endpoints.
#[derive(Debug, Clone)]
pub struct HierarchyClient {
    client: reqwest::Client,
    base_url: Url,
    roots_endpoint: Option<String>,
    endpoints: BTreeMap<Level, LevelEndpoint>,
}

impl HierarchyClient {
    /// Create a client for every level declared in `config`.
    ///
    /// The configuration is validated first, so a bad base URL or endpoint
    /// template is reported as a [`ConfigError`] here rather than as a fetch
    /// failure later.
    pub fn new(config: &CascadeConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        // Url::join drops the last path segment unless the base ends in '/'
        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&base).map_err(|_| ConfigError::InvalidBaseUrl(config.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl(config.base_url.clone()));
        }

        let endpoints = config
            .levels
            .iter()
            .map(|l| {
                (
                    l.level,
                    LevelEndpoint {
                        endpoint: l.endpoint.clone(),
                        wrapper_key: l.wrapper_key.clone(),
                    },
                )
            })
            .collect();

        Ok(Self {
            client,
            base_url,
            roots_endpoint: config.roots_endpoint.clone(),
            endpoints,
        })
    }

    /// Fetch the level 0 options from the root categories endpoint.
    pub async fn fetch_roots(&self) -> Result<Vec<ChoiceOption>, FetchError> {
        let Some(endpoint) = self.roots_endpoint.as_deref() else {
            return Ok(Vec::new());
        };
        let url = self
            .base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| FetchError::Transport(format!("bad endpoint '{}': {}", endpoint, e)))?;
        debug!(%url, "fetching root options");
        self.get_options(url, None).await
    }

    async fn get_options(
        &self,
        url: Url,
        wrapper_key: Option<&str>,
    ) -> Result<Vec<ChoiceOption>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::ResponseFormat(e.to_string()))?;

        normalize_children(body, wrapper_key)
    }

    /// Expand an endpoint template for one parent.
    ///
    /// The parent id is encoded as a query value or path segment depending on
    /// where the marker sits. The rest of the template is kept as written.
    pub fn children_url(&self, endpoint: &str, parent_id: &str) -> Result<Url, FetchError> {
        let templated = endpoint
            .trim_start_matches('/')
            .replace(PARENT_MARKER, PARENT_SENTINEL);
        let mut url = self
            .base_url
            .join(&templated)
            .map_err(|e| FetchError::Transport(format!("bad endpoint '{}': {}", endpoint, e)))?;

        if url.path().contains(PARENT_SENTINEL) {
            let path = url
                .path()
                .replace(PARENT_SENTINEL, &self.encode_segment(parent_id));
            url.set_path(&path);
        }

        if let Some(query) = url.query().filter(|q| q.contains(PARENT_SENTINEL)) {
            let query = query.replace(PARENT_SENTINEL, &self.encode_query_value(parent_id));
            url.set_query(Some(&query));
        }

        Ok(url)
    }

    /// Percent-encode `value` as a single path segment.
    fn encode_segment(&self, value: &str) -> String {
        let mut scratch = self.base_url.clone();
        if let Ok(mut segments) = scratch.path_segments_mut() {
            segments.clear().push(value);
        }
        scratch.path().trim_start_matches('/').to_string()
    }

    /// Form-encode `value` as a query value.
    fn encode_query_value(&self, value: &str) -> String {
        let mut scratch = self.base_url.clone();
        scratch.query_pairs_mut().clear().append_pair("v", value);
        scratch
            .query()
            .and_then(|q| q.strip_prefix("v="))
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
impl HierarchyResolver for HierarchyClient {
    async fn fetch_children(
        &self,
        level: Level,
        parent_id: &str,
    ) -> Result<Vec<ChoiceOption>, FetchError> {
        if parent_id.is_empty() {
            debug!(level, "empty parent, skipping request");
            return Ok(Vec::new());
        }

        let endpoint = self
            .endpoints
            .get(&level)
            .ok_or(FetchError::NoEndpoint { level })?;
        let url = self.children_url(&endpoint.endpoint, parent_id)?;
        debug!(level, parent_id, %url, "fetching children");
        self.get_options(url, endpoint.wrapper_key.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FetchErrorKind;
    use crate::config::LevelConfig;

    fn client_for(base_url: &str, endpoint: &str) -> HierarchyClient {
        let config = CascadeConfig {
            base_url: base_url.to_string(),
            levels: vec![LevelConfig {
                level: 1,
                name: "subcategory".to_string(),
                endpoint: endpoint.to_string(),
                wrapper_key: None,
            }],
            ..CascadeConfig::default()
        };
        HierarchyClient::new(&config).unwrap()
    }

    #[test]
    fn test_children_url_query_marker() {
        let client = client_for(
            "http://localhost:8000",
            "/store/ajax/load-subcategories/?category_id={parent}",
        );
        let url = client
            .children_url("/store/ajax/load-subcategories/?category_id={parent}", "5")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/store/ajax/load-subcategories/?category_id=5"
        );
    }

    #[test]
    fn test_children_url_encodes_parent() {
        let client = client_for("http://localhost:8000/admin/", "children?parent={parent}");
        let url = client.children_url("children?parent={parent}", "a&b=c").unwrap();
        assert_eq!(url.query(), Some("parent=a%26b%3Dc"));
        assert_eq!(url.path(), "/admin/children");
    }

    #[test]
    fn test_children_url_path_marker() {
        let client = client_for("http://localhost:8000", "/categories/{parent}/children/");
        let url = client
            .children_url("/categories/{parent}/children/", "42")
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/categories/42/children/");
    }

    #[test]
    fn test_children_url_keeps_escaped_path_segments() {
        let client = client_for("http://localhost:8000", "/my%20cats/{parent}/children/");
        let url = client
            .children_url("/my%20cats/{parent}/children/", "42")
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/my%20cats/42/children/");

        // A slash in the parent id must not split the segment.
        let url = client
            .children_url("/my%20cats/{parent}/children/", "a/b c")
            .unwrap();
        assert_eq!(url.path(), "/my%20cats/a%2Fb%20c/children/");
    }

    #[test]
    fn test_children_url_keeps_other_query_pairs() {
        let client = client_for(
            "http://localhost:8000",
            "children/?flag&format=a+b&parent={parent}",
        );
        let url = client
            .children_url("children/?flag&format=a+b&parent={parent}", "4 2")
            .unwrap();
        assert_eq!(url.query(), Some("flag&format=a+b&parent=4+2"));
        assert_eq!(url.path(), "/children/");
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = CascadeConfig {
            base_url: "not a url".to_string(),
            ..CascadeConfig::default()
        };
        let err = HierarchyClient::new(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(ref url) if url == "not a url"), "{err:?}");

        let config = CascadeConfig {
            levels: vec![LevelConfig {
                level: 1,
                name: "subcategory".to_string(),
                endpoint: "/children/".to_string(),
                wrapper_key: None,
            }],
            ..CascadeConfig::default()
        };
        let err = HierarchyClient::new(&config).unwrap_err();
        assert!(matches!(err, ConfigError::MissingParentMarker { level: 1, .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_empty_parent_issues_no_request() {
        // Nothing listens on this port; a request would fail.
        let client = client_for("http://127.0.0.1:9", "/children/?parent={parent}");
        let children = client.fetch_children(1, "").await.unwrap();
        assert!(children.is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_level() {
        let client = client_for("http://127.0.0.1:9", "/children/?parent={parent}");
        let err = client.fetch_children(3, "1").await.unwrap_err();
        assert_eq!(err, FetchError::NoEndpoint { level: 3 });
        assert_eq!(err.kind(), FetchErrorKind::TransportFailure);
    }
}
