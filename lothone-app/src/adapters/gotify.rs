//! Gotify notification sink

use std::time::Duration;

use async_trait::async_trait;
use lothone_core::error::CoreResult;
use lothone_core::traits::NotificationSink;
use reqwest::Client;
use serde::Serialize;

use super::http::HttpUtils;

const SERVICE: &str = "gotify";

/// Upper bound for one notification post
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct GotifyMessage<'a> {
    title: &'a str,
    message: &'a str,
    priority: u8,
}

/// Posts every notification once per configured application key.
pub struct GotifyNotifier {
    client: Client,
    base_url: String,
    api_keys: Vec<String>,
}

impl GotifyNotifier {
    /// # Arguments
    /// * `server` - Host[:port] or full base URL; `https://` is assumed when no scheme is given
    /// * `api_keys` - Application tokens
    pub fn new(server: &str, api_keys: Vec<String>) -> CoreResult<Self> {
        Ok(Self {
            client: HttpUtils::client(Some(NOTIFY_TIMEOUT))?,
            base_url: base_url(server),
            api_keys,
        })
    }

    async fn send(&self, key: &str, body: &GotifyMessage<'_>) -> CoreResult<()> {
        let request = self
            .client
            .post(format!("{}/message", self.base_url))
            .query(&[("token", key)])
            .json(body);
        HttpUtils::execute_request(request, SERVICE, "POST /message").await?;
        Ok(())
    }
}

fn base_url(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.contains("://") {
        server.to_string()
    } else {
        format!("https://{server}")
    }
}

#[async_trait]
impl NotificationSink for GotifyNotifier {
    async fn notify(&self, title: &str, message: &str, priority: u8) {
        log::info!("Sending Gotify notifications");
        let body = GotifyMessage {
            title,
            message,
            priority,
        };
        for (index, key) in self.api_keys.iter().enumerate() {
            if let Err(e) = self.send(key, &body).await {
                log::warn!("[{SERVICE}] Notification to key #{index} failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_defaults_to_https() {
        assert_eq!(base_url("noti.localhost:11111"), "https://noti.localhost:11111");
        assert_eq!(base_url("http://10.0.0.2:80/"), "http://10.0.0.2:80");
    }

    #[tokio::test]
    async fn unreachable_server_is_swallowed() {
        let notifier =
            GotifyNotifier::new("http://127.0.0.1:9", vec!["token".to_string()]).unwrap();
        notifier.notify("title", "message", 5).await;
    }
}
