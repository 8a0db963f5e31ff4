use reqwest::blocking::Client;
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LegacyCreateError {
    #[error("command does not support groups")]
    GroupsUnsupported,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("failed to create buildlet: {0}")]
    Http(String),
    #[error("failed to create buildlet: unexpected response status: {0}")]
    Status(String),
    #[error("failed to create buildlet: decoding coordinator response: {0}")]
    Decode(String),
    #[error("failed to create buildlet: {0}")]
    Coordinator(String),
    #[error("failed to create buildlet: coordinator closed the response without a buildlet")]
    Incomplete,
    #[error("failed to create buildlet: {0}")]
    InvalidInstance(String),
}

/// Queue position reported while a buildlet request waits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WaitStatus {
    #[serde(default)]
    pub ahead: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct BuildletName {
    name: String,
}

/// One line of the coordinator's create response
#[derive(Debug, Deserialize)]
struct CreateEvent {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    status: Option<WaitStatus>,
    #[serde(default)]
    buildlet: Option<BuildletName>,
}

/// Blocking client for the coordinator's buildlet endpoint.
pub trait CoordinatorClient: Send + Sync {
    /// Creates one buildlet, calling `on_status` on this thread for every
    /// progress event, and returns its remote name.
    fn create_buildlet_with_status(
        &self,
        builder_type: &str,
        on_status: &mut dyn FnMut(&WaitStatus),
    ) -> Result<String, LegacyCreateError>;
}

/// Coordinator client over HTTP. The blocking reqwest client is built per
/// call, so this must only be used off the async runtime.
pub struct HttpCoordinatorClient {
    base_url: String,
}

impl HttpCoordinatorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn create_url(&self) -> String {
        format!("{}/buildlet/create", self.base_url.trim_end_matches('/'))
    }
}

impl CoordinatorClient for HttpCoordinatorClient {
    fn create_buildlet_with_status(
        &self,
        builder_type: &str,
        on_status: &mut dyn FnMut(&WaitStatus),
    ) -> Result<String, LegacyCreateError> {
        let url = self.create_url();
        debug!(url = %url, builder_type, "Requesting buildlet from coordinator");

        let client = Client::builder()
            .build()
            .map_err(|e| LegacyCreateError::Http(format!("failed to build http client: {e}")))?;
        let response = client
            .post(&url)
            .form(&[("builderType", builder_type)])
            .send()
            .map_err(|e| LegacyCreateError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(LegacyCreateError::Status(response.status().to_string()));
        }

        read_create_events(BufReader::new(response), on_status)
    }
}

/// Consumes newline-delimited create events until a buildlet or an error.
pub fn read_create_events(
    reader: impl BufRead,
    on_status: &mut dyn FnMut(&WaitStatus),
) -> Result<String, LegacyCreateError> {
    for line in reader.lines() {
        let line = line.map_err(|e| LegacyCreateError::Http(e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }

        let event: CreateEvent =
            serde_json::from_str(&line).map_err(|e| LegacyCreateError::Decode(e.to_string()))?;
        if let Some(error) = event.error.filter(|e| !e.is_empty()) {
            return Err(LegacyCreateError::Coordinator(error));
        }
        if let Some(buildlet) = event.buildlet {
            return Ok(buildlet.name);
        }
        if let Some(status) = event.status {
            on_status(&status);
        }
    }
    Err(LegacyCreateError::Incomplete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(body: &str) -> (Result<String, LegacyCreateError>, Vec<WaitStatus>) {
        let mut seen = Vec::new();
        let result = read_create_events(Cursor::new(body.to_string()), &mut |st| {
            seen.push(st.clone())
        });
        (result, seen)
    }

    #[test]
    fn test_reads_statuses_then_buildlet() {
        let (result, seen) = read(concat!(
            "{\"status\":{\"ahead\":2}}\n",
            "\n",
            "{\"status\":{\"ahead\":0,\"message\":\"booting VM\"}}\n",
            "{\"buildlet\":{\"name\":\"user-linux-amd64-0\"}}\n",
        ));

        assert_eq!(result.unwrap(), "user-linux-amd64-0");
        assert_eq!(
            seen,
            vec![
                WaitStatus {
                    ahead: 2,
                    message: String::new()
                },
                WaitStatus {
                    ahead: 0,
                    message: "booting VM".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_coordinator_error_stops_reading() {
        let (result, seen) = read(concat!(
            "{\"error\":\"unknown builder type\"}\n",
            "{\"buildlet\":{\"name\":\"never\"}}\n",
        ));

        let err = result.unwrap_err();
        assert!(matches!(err, LegacyCreateError::Coordinator(_)));
        assert_eq!(
            err.to_string(),
            "failed to create buildlet: unknown builder type"
        );
        assert!(seen.is_empty());
    }

    #[test]
    fn test_truncated_response_is_incomplete() {
        let (result, _) = read("{\"status\":{\"ahead\":1}}\n");
        assert!(matches!(result, Err(LegacyCreateError::Incomplete)));
    }

    #[test]
    fn test_malformed_line_is_decode_error() {
        let (result, _) = read("not json\n");
        assert!(matches!(result, Err(LegacyCreateError::Decode(_))));
    }

    #[test]
    fn test_create_url_trims_trailing_slash() {
        let client = HttpCoordinatorClient::new("https://farmer.golang.org/");
        assert_eq!(
            client.create_url(),
            "https://farmer.golang.org/buildlet/create"
        );
    }
}
