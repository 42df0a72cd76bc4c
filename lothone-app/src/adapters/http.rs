//! Shared HTTP plumbing for the Gotify and SSTP adapters
//!
//! Each adapter builds its own `RequestBuilder`; this module sends it, logs the
//! exchange and maps transport failures into `CoreError::ExternalService`.

use std::time::Duration;

use lothone_core::error::{CoreError, CoreResult};
use lothone_core::utils::log_sanitizer::truncate_for_log;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// HTTP tool function set
pub struct HttpUtils;

impl HttpUtils {
    /// Build a client. `None` leaves requests unbounded.
    pub fn client(timeout: Option<Duration>) -> CoreResult<Client> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(|e| CoreError::ExternalService {
            service: "http".to_string(),
            detail: format!("Failed to create HTTP client: {e}"),
        })
    }

    /// Sends a request and returns the response text of a 2xx reply
    ///
    /// # Arguments
    /// * `request_builder` - Configured request
    /// * `service` - Service name (for logging and errors)
    /// * `action` - Action name (for logging)
    pub async fn execute_request(
        request_builder: RequestBuilder,
        service: &str,
        action: &str,
    ) -> CoreResult<String> {
        log::debug!("[{service}] {action}");

        let response = request_builder.send().await.map_err(|e| {
            let detail = if e.is_timeout() {
                format!("request timed out: {e}")
            } else {
                e.to_string()
            };
            CoreError::ExternalService {
                service: service.to_string(),
                detail,
            }
        })?;

        let status = response.status();
        log::debug!("[{service}] Response Status: {}", status.as_u16());

        let text = response
            .text()
            .await
            .map_err(|e| CoreError::ExternalService {
                service: service.to_string(),
                detail: format!("Failed to read response body: {e}"),
            })?;
        log::debug!("[{service}] Response Body: {}", truncate_for_log(&text));

        if !status.is_success() {
            return Err(CoreError::ExternalService {
                service: service.to_string(),
                detail: format!("HTTP {}: {}", status.as_u16(), truncate_for_log(&text)),
            });
        }
        Ok(text)
    }

    /// Parse JSON response
    pub fn parse_json<T>(response_text: &str, service: &str) -> CoreResult<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!("[{service}] JSON parse failed: {e}");
            log::error!("[{service}] Raw response: {}", truncate_for_log(response_text));
            CoreError::ExternalService {
                service: service.to_string(),
                detail: format!("unexpected response: {e}"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Reply {
        id: u32,
    }

    #[test]
    fn parse_json_maps_errors() {
        let reply: Reply = HttpUtils::parse_json(r#"{"id": 7}"#, "sstp").unwrap();
        assert_eq!(reply.id, 7);

        let err = HttpUtils::parse_json::<Reply>("<html>", "sstp").unwrap_err();
        assert!(matches!(err, CoreError::ExternalService { ref service, .. } if service == "sstp"));
    }

    #[test]
    fn client_builds_with_and_without_timeout() {
        assert!(HttpUtils::client(None).is_ok());
        assert!(HttpUtils::client(Some(Duration::from_secs(5))).is_ok());
    }
}
