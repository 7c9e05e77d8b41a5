use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Match, Profile, SearchFilter, SwipeAction, SwipeRecord};

/// Errors that can occur when talking to the backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Authoritative remote copy of swipes, matches and candidates.
///
/// Each instance acts on behalf of a single user.
#[async_trait]
pub trait BackendSync: Send + Sync {
    async fn submit_swipe(
        &self,
        target_id: &str,
        action: SwipeAction,
    ) -> Result<SwipeRecord, BackendError>;

    async fn fetch_matches(&self) -> Result<Vec<Match>, BackendError>;

    async fn fetch_candidate_profiles(
        &self,
        filter: &SearchFilter,
    ) -> Result<Vec<Profile>, BackendError>;

    async fn clear_all_swipes(&self) -> Result<(), BackendError>;
}

#[derive(Debug, Deserialize)]
struct MatchesEnvelope {
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct ProfilesEnvelope {
    profiles: Vec<Profile>,
}

/// REST client for the backend sync API
///
/// Handles all communication with the backend including:
/// - Submitting swipes
/// - Fetching resolved matches
/// - Querying candidate profiles
/// - Clearing swipe history
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    api_key: String,
    user_id: String,
    client: Client,
}

impl HttpBackend {
    /// Create a new backend client acting for `user_id`
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        user_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            user_id: user_id.into(),
            client,
        })
    }

    /// Same connection pool, different acting user
    pub fn for_user(&self, user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..self.clone()
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("X-User-Id", &self.user_id)
    }

    async fn check(&self, response: Response, what: &str) -> Result<Response, BackendError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BackendError::Unauthorized);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::debug!("Backend {} failed: {} - {}", what, status, body);
            return Err(BackendError::ApiError(format!("Failed to {}: {}", what, status)));
        }
        Ok(response)
    }
}

#[async_trait]
impl BackendSync for HttpBackend {
    async fn submit_swipe(
        &self,
        target_id: &str,
        action: SwipeAction,
    ) -> Result<SwipeRecord, BackendError> {
        let payload = json!({
            "userId": self.user_id,
            "targetUserId": target_id,
            "action": action,
        });

        let response = self
            .authorized(self.client.post(self.url("swipes")))
            .json(&payload)
            .send()
            .await?;
        let response = self.check(response, "submit swipe").await?;

        let record: SwipeRecord = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse swipe: {}", e)))?;

        tracing::debug!("Submitted swipe: {} -> {} ({})", self.user_id, target_id, action);
        Ok(record)
    }

    async fn fetch_matches(&self) -> Result<Vec<Match>, BackendError> {
        let response = self
            .authorized(self.client.get(self.url("matches")))
            .send()
            .await?;
        let response = self.check(response, "fetch matches").await?;

        let envelope: MatchesEnvelope = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse matches: {}", e)))?;

        Ok(envelope.matches)
    }

    async fn fetch_candidate_profiles(
        &self,
        filter: &SearchFilter,
    ) -> Result<Vec<Profile>, BackendError> {
        let filter_json = serde_json::to_string(filter)
            .map_err(|e| BackendError::InvalidResponse(format!("Unencodable filter: {}", e)))?;
        let url = format!(
            "{}?filter={}",
            self.url("profiles/candidates"),
            urlencoding::encode(&filter_json)
        );

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = self.check(response, "fetch candidates").await?;

        let envelope: ProfilesEnvelope = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse profiles: {}", e)))?;

        tracing::debug!("Fetched {} candidates for {}", envelope.profiles.len(), self.user_id);
        Ok(envelope.profiles)
    }

    async fn clear_all_swipes(&self) -> Result<(), BackendError> {
        let response = self
            .authorized(self.client.delete(self.url("swipes")))
            .send()
            .await?;
        self.check(response, "clear swipes").await?;

        tracing::info!("Cleared remote swipes for {}", self.user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn backend(server: &mockito::Server) -> HttpBackend {
        HttpBackend::new(server.url(), "test_key", "me", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_submit_swipe() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/swipes")
            .match_header("authorization", "Bearer test_key")
            .match_header("x-user-id", "me")
            .match_body(Matcher::PartialJson(json!({
                "targetUserId": "p1",
                "action": "superLike",
            })))
            .with_status(201)
            .with_body(
                r#"{"id":"s1","userId":"me","targetUserId":"p1","action":"superLike","createdAt":"2026-01-01T00:00:00Z"}"#,
            )
            .create_async()
            .await;

        let record = backend(&server)
            .submit_swipe("p1", SwipeAction::SuperLike)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(record.id, "s1");
        assert_eq!(record.action, SwipeAction::SuperLike);
    }

    #[tokio::test]
    async fn test_fetch_candidates_encodes_filter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/profiles/candidates")
            .match_query(Matcher::UrlEncoded(
                "filter".into(),
                serde_json::to_string(&SearchFilter::default()).unwrap(),
            ))
            .with_body(r#"{"profiles":[{"id":"p1"},{"id":"p2","hasPlace":true}]}"#)
            .create_async()
            .await;

        let profiles = backend(&server)
            .fetch_candidate_profiles(&SearchFilter::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(profiles.len(), 2);
        assert!(profiles[1].has_place);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/matches")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("DELETE", "/swipes")
            .with_status(503)
            .create_async()
            .await;

        let client = backend(&server);

        assert!(matches!(
            client.fetch_matches().await,
            Err(BackendError::Unauthorized)
        ));
        assert!(matches!(
            client.clear_all_swipes().await,
            Err(BackendError::ApiError(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_matches_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/matches")
            .with_body(r#"{"unexpected":true}"#)
            .create_async()
            .await;

        let result = backend(&server).fetch_matches().await;
        assert!(matches!(result, Err(BackendError::InvalidResponse(_))));
    }

    #[test]
    fn test_for_user_keeps_base_url() {
        let client =
            HttpBackend::new("https://api.test/v1/", "k", "a", Duration::from_secs(1)).unwrap();
        let other = client.for_user("b");

        assert_eq!(other.user_id(), "b");
        assert_eq!(other.url("matches"), "https://api.test/v1/matches");
    }
}
