use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Http(String),
    #[error("unexpected response status: {0}")]
    Status(String),
    #[error("invalid catalog JSON: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuilderInfo {
    #[serde(rename = "HostType", default)]
    pub host_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostInfo {
    #[serde(rename = "IsReverse", default)]
    pub is_reverse: bool,
    #[serde(rename = "ExpectNum", default)]
    pub expect_num: i64,
    #[serde(rename = "ContainerImage", default)]
    pub container_image: String,
    #[serde(rename = "VMImage", default)]
    pub vm_image: String,
}

/// Raw catalog as served by the farmer dashboard
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogDocument {
    #[serde(rename = "Builders", default)]
    pub builders: HashMap<String, BuilderInfo>,
    #[serde(rename = "Hosts", default)]
    pub hosts: HashMap<String, HostInfo>,
}

pub trait BuilderCatalogRepository: Send + Sync {
    fn fetch(&self) -> Result<CatalogDocument, CatalogError>;
}

/// Fetches the catalog with a blocking reqwest client built per call; keep it
/// off the async runtime.
pub struct ReqwestBuilderCatalogRepository {
    url: String,
}

impl ReqwestBuilderCatalogRepository {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl BuilderCatalogRepository for ReqwestBuilderCatalogRepository {
    fn fetch(&self) -> Result<CatalogDocument, CatalogError> {
        debug!(url = %self.url, "Fetching builder catalog");
        let client = Client::builder()
            .build()
            .map_err(|e| CatalogError::Http(format!("failed to build http client: {e}")))?;
        let response = client
            .get(&self.url)
            .send()
            .map_err(|e| CatalogError::Http(e.to_string()))?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(CatalogError::Status(response.status().to_string()));
        }
        let body = response
            .bytes()
            .map_err(|e| CatalogError::Http(e.to_string()))?;
        parse_catalog(&body)
    }
}

pub fn parse_catalog(body: &[u8]) -> Result<CatalogDocument, CatalogError> {
    serde_json::from_slice(body).map_err(|e| CatalogError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog_field_names() {
        let doc = parse_catalog(
            br#"{
                "Builders": {"linux-amd64": {"HostType": "host-linux"}},
                "Hosts": {"host-linux": {"IsReverse": false, "ExpectNum": 0, "ContainerImage": "linux:latest", "VMImage": ""}}
            }"#,
        )
        .unwrap();

        assert_eq!(doc.builders["linux-amd64"].host_type, "host-linux");
        assert_eq!(doc.hosts["host-linux"].container_image, "linux:latest");
        assert!(!doc.hosts["host-linux"].is_reverse);
    }

    #[test]
    fn test_parse_catalog_tolerates_missing_fields() {
        let doc = parse_catalog(br#"{"Builders": {"x": {}}, "Extra": 1}"#).unwrap();
        assert_eq!(doc.builders["x"].host_type, "");
        assert!(doc.hosts.is_empty());
    }

    #[test]
    fn test_parse_catalog_rejects_garbage() {
        let result = parse_catalog(b"<html>");
        assert!(matches!(result, Err(CatalogError::Decode(_))));
    }
}
