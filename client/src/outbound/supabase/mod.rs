//! Supabase outbound adapters.
//!
//! [`SupabaseAuth`] implements the `AuthGateway` port against the GoTrue API
//! and [`SupabaseRest`] implements the `DataGateway` port against PostgREST.
//! Both share one [`Connection`] so table requests carry the signed-in
//! user's access token.

mod auth;
mod dto;
mod rest;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use tokio::sync::{RwLock, broadcast};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::AuthSession;
use crate::domain::ports::AuthEvent;

pub use auth::SupabaseAuth;
pub use rest::SupabaseRest;

const EVENT_CAPACITY: usize = 16;
const PREVIEW_CHAR_LIMIT: usize = 160;

/// HTTP client, endpoint and in-memory session shared by both adapters.
pub struct Connection {
    client: Client,
    base: Url,
    anon_key: Zeroizing<String>,
    session: RwLock<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Connection {
    /// Build a connection using a reqwest client with an explicit request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        anon_key: &str,
        timeout: Duration,
    ) -> Result<Arc<Self>, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Arc::new(Self {
            client,
            base: with_trailing_slash(endpoint),
            anon_key: Zeroizing::new(anon_key.to_owned()),
            session: RwLock::new(None),
            events,
        }))
    }

    /// Auth and data adapters sharing this connection.
    pub fn gateways(self: &Arc<Self>) -> (SupabaseAuth, SupabaseRest) {
        (SupabaseAuth::new(Arc::clone(self)), SupabaseRest::new(Arc::clone(self)))
    }

    fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path)
    }

    /// Attach `apikey` and the bearer token: the session's access token when
    /// signed in, the anonymous key otherwise.
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let session = self.session.read().await;
        let bearer = session
            .as_ref()
            .map_or(self.anon_key.as_str(), AuthSession::access_token);
        request
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(bearer)
    }

    fn publish(&self, event: AuthEvent) {
        let kind = event.kind;
        if self.events.send(event).is_err() {
            debug!(?kind, "no session listeners");
        }
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Human-readable failure text: the service's own message when the body
/// carries one, otherwise a compact preview.
fn describe_failure(status: reqwest::StatusCode, body: &[u8]) -> String {
    let detail = dto::ErrorBodyDto::parse(body)
        .and_then(|parsed| parsed.message())
        .unwrap_or_else(|| body_preview(body));
    if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {detail}", status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    //! Shared helpers for the Supabase adapters.

    use super::*;
    use reqwest::StatusCode;
    use rstest::rstest;

    pub(super) fn connection(base: &str) -> Arc<Connection> {
        Connection::new(
            Url::parse(base).expect("valid url"),
            "anon-key",
            Duration::from_secs(1),
        )
        .expect("client builds")
    }

    #[rstest]
    #[case("https://academy.example.com", "https://academy.example.com/auth/v1/signup")]
    #[case("https://example.com/project", "https://example.com/project/auth/v1/signup")]
    #[case("https://example.com/project/", "https://example.com/project/auth/v1/signup")]
    fn paths_are_joined_below_the_base(#[case] base: &str, #[case] expected: &str) {
        let url = connection(base).url("auth/v1/signup").expect("joins");
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    fn preview_compacts_and_truncates() {
        let body = format!("  a\n b  {}", "x".repeat(300));
        let preview = body_preview(body.as_bytes());
        assert!(preview.starts_with("a b x"));
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_CHAR_LIMIT + 3);
    }

    #[rstest]
    #[case(br#"{"message":"duplicate key value"}"#.as_slice(), "status 409: duplicate key value")]
    #[case(b"plain text".as_slice(), "status 409: plain text")]
    #[case(b"".as_slice(), "status 409")]
    fn failure_text_prefers_service_message(#[case] body: &[u8], #[case] expected: &str) {
        assert_eq!(describe_failure(StatusCode::CONFLICT, body), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn publish_without_listeners_is_harmless() {
        let connection = connection("https://academy.example.com");
        connection.publish(AuthEvent::signed_out());
        let mut subscription = connection.events.subscribe();
        connection.publish(AuthEvent::signed_out());
        assert!(subscription.recv().await.is_ok());
    }
}
