//! Opaque calls to the video-search and newsletter upstreams.
//!
//! Responses are relayed as JSON without interpretation.

use serde_json::{json, Value};

use crate::clients::errors::ClientError;
use crate::config::PassthroughSettings;

/// Number of videos requested per search.
const VIDEO_RESULTS: u32 = 20;

/// Client for the unauthenticated passthrough routes.
#[derive(Debug, Clone)]
pub struct PassthroughClient {
    http: reqwest::Client,
    settings: PassthroughSettings,
}

impl PassthroughClient {
    /// Creates a client sharing `http`'s connection pool.
    #[must_use]
    pub const fn new(http: reqwest::Client, settings: PassthroughSettings) -> Self {
        Self { http, settings }
    }

    /// Lists the configured channel's latest videos, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingCredential`] if the key or channel is
    /// not configured, otherwise any transport or upstream failure.
    pub async fn latest_videos(&self) -> Result<Value, ClientError> {
        let key = credential(self.settings.video_api_key.as_deref(), "YOUTUBEAPI")?;
        let channel = credential(self.settings.video_channel_id.as_deref(), "YOUTUBECHANNEL")?;
        let url = format!(
            "{}/youtube/v3/search",
            self.settings.video_base_url.trim_end_matches('/')
        );
        let max_results = VIDEO_RESULTS.to_string();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("key", key),
                ("channelId", channel),
                ("part", "snippet,id"),
                ("order", "date"),
                ("maxResults", max_results.as_str()),
            ])
            .send()
            .await?;
        relay(response).await
    }

    /// Subscribes `email` to the configured newsletter list.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingCredential`] if the list or key is not
    /// configured, otherwise any transport or upstream failure.
    pub async fn subscribe(&self, email: &str) -> Result<Value, ClientError> {
        let list = credential(self.settings.newsletter_list_id.as_deref(), "KLAVIYOLIST")?;
        let key = credential(self.settings.newsletter_api_key.as_deref(), "KLAVIYOAPI")?;
        let url = format!(
            "{}/api/v2/list/{}/subscribe",
            self.settings.newsletter_base_url.trim_end_matches('/'),
            urlencoding::encode(list)
        );

        let response = self
            .http
            .post(&url)
            .query(&[("api_key", key)])
            .header("Accept", "application/json")
            .json(&json!({ "profiles": [{ "email": email }] }))
            .send()
            .await?;
        relay(response).await
    }
}

fn credential<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ClientError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ClientError::MissingCredential { name })
}

async fn relay(response: reqwest::Response) -> Result<Value, ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::from_response(response).await);
    }
    response
        .json()
        .await
        .map_err(|e| ClientError::UnexpectedResponse {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base: &str) -> PassthroughSettings {
        PassthroughSettings {
            video_api_key: Some("yt-key".to_string()),
            video_channel_id: Some("UC123".to_string()),
            newsletter_list_id: Some("LIST1".to_string()),
            newsletter_api_key: Some("kl-key".to_string()),
            video_base_url: base.to_string(),
            newsletter_base_url: base.to_string(),
        }
    }

    #[tokio::test]
    async fn test_latest_videos_builds_search_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/search"))
            .and(query_param("key", "yt-key"))
            .and(query_param("channelId", "UC123"))
            .and(query_param("part", "snippet,id"))
            .and(query_param("order", "date"))
            .and(query_param("maxResults", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = PassthroughClient::new(reqwest::Client::new(), settings(&server.uri()));
        assert_eq!(client.latest_videos().await.unwrap(), json!({"items": []}));
    }

    #[tokio::test]
    async fn test_subscribe_posts_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/list/LIST1/subscribe"))
            .and(query_param("api_key", "kl-key"))
            .and(header("Accept", "application/json"))
            .and(body_json(json!({"profiles": [{"email": "a@example.com"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "p1"}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = PassthroughClient::new(reqwest::Client::new(), settings(&server.uri()));
        let body = client.subscribe("a@example.com").await.unwrap();
        assert_eq!(body[0]["id"], "p1");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota"))
            .mount(&server)
            .await;

        let client = PassthroughClient::new(reqwest::Client::new(), settings(&server.uri()));
        assert_eq!(client.latest_videos().await.unwrap_err().status(), Some(403));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_sending() {
        let client = PassthroughClient::new(reqwest::Client::new(), PassthroughSettings::default());
        assert!(matches!(
            client.subscribe("a@example.com").await,
            Err(ClientError::MissingCredential { name: "KLAVIYOLIST" })
        ));
    }
}
