//! Webhook related structures
//!
//! GitHub payloads are decoded into one typed struct per supported event.
//! Every field is optional on the wire; the accessors below fill in the
//! placeholder values so rendering never deals with missing data itself.

use axum::body::Bytes;
use axum::http::HeaderMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

pub const X_GITHUB_EVENT: &str = "X-GitHub-Event";
pub const X_HUB_SIGNATURE_256: &str = "X-Hub-Signature-256";
pub const X_GITHUB_DELIVERY: &str = "X-GitHub-Delivery";

pub const UNKNOWN: &str = "Unknown";
pub const NO_LINK: &str = "#";

/// Everything the ingestion endpoint needs from a single HTTP call.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub body: Bytes,
    pub event_type: String,
    pub signature: String,
    pub delivery_id: String,
}

impl WebhookRequest {
    /// Missing or non-UTF-8 headers become empty strings; a missing delivery
    /// ID is replaced by a fresh UUIDv7 so logs can still be correlated.
    pub fn from_parts(headers: &HeaderMap, body: Bytes) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };

        let delivery_id = match header(X_GITHUB_DELIVERY) {
            id if id.is_empty() => Uuid::now_v7().to_string(),
            id => id,
        };

        Self {
            event_type: header(X_GITHUB_EVENT),
            signature: header(X_HUB_SIGNATURE_256),
            delivery_id,
            body,
        }
    }
}

/// GitHub sends `null` for absent objects (e.g. a deleted user); treat that
/// the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The allow-list of GitHub events that produce a notification.
#[derive(Debug)]
pub enum GitHubEvent {
    Push(PushEvent),
    PullRequest(PullRequestEvent),
    Issues(IssuesEvent),
    Release(ReleaseEvent),
    Create(RefEvent),
    Delete(RefEvent),
}

impl GitHubEvent {
    /// Decodes `payload` according to `event_type`.
    ///
    /// Returns `Ok(None)` for event types outside the allow-list and an error
    /// when the payload doesn't fit the expected shape at all (e.g. a string
    /// where an object is expected).
    pub fn from_payload(event_type: &str, payload: Value) -> serde_json::Result<Option<Self>> {
        let event = match event_type {
            "push" => Self::Push(serde_json::from_value(payload)?),
            "pull_request" => Self::PullRequest(serde_json::from_value(payload)?),
            "issues" => Self::Issues(serde_json::from_value(payload)?),
            "release" => Self::Release(serde_json::from_value(payload)?),
            "create" => Self::Create(serde_json::from_value(payload)?),
            "delete" => Self::Delete(serde_json::from_value(payload)?),
            _ => return Ok(None),
        };

        Ok(Some(event))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Repository {
    name: Option<String>,
    full_name: Option<String>,
    html_url: Option<String>,
}

impl Repository {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn full_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn html_url(&self) -> &str {
        self.html_url.as_deref().unwrap_or(NO_LINK)
    }

    /// Markdown link to the repository, as shown in notification fields.
    pub fn markdown_link(&self) -> String {
        format!("[{}]({})", self.full_name(), self.html_url())
    }
}

/// A GitHub account as it appears in `sender`, `user` or `author`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubUser {
    login: Option<String>,
    avatar_url: Option<String>,
}

impl GitHubUser {
    pub fn login(&self) -> &str {
        self.login.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn avatar_url(&self) -> &str {
        self.avatar_url.as_deref().unwrap_or_default()
    }
}

/// The `pusher` object of a push event, which uses `name` instead of `login`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Pusher {
    name: Option<String>,
    avatar_url: Option<String>,
}

impl Pusher {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn avatar_url(&self) -> &str {
        self.avatar_url.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PushEvent {
    r#ref: Option<String>,
    compare: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub pusher: Pusher,
    commits: Option<Vec<Commit>>,
}

impl PushEvent {
    pub fn git_ref(&self) -> &str {
        self.r#ref.as_deref().unwrap_or_default()
    }

    pub fn compare_url(&self) -> &str {
        self.compare.as_deref().unwrap_or_default()
    }

    pub fn commits(&self) -> &[Commit] {
        self.commits.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Commit {
    message: Option<String>,
    url: Option<String>,
}

impl Commit {
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("No message")
    }

    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or(NO_LINK)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PullRequestEvent {
    action: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub pull_request: IssueLike,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
}

impl PullRequestEvent {
    pub fn action(&self) -> &str {
        self.action.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IssuesEvent {
    action: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub issue: IssueLike,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
}

impl IssuesEvent {
    pub fn action(&self) -> &str {
        self.action.as_deref().unwrap_or_default()
    }
}

/// The parts of a pull request or an issue that notifications use; both
/// share the same shape in GitHub's payloads.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IssueLike {
    number: Option<u64>,
    title: Option<String>,
    state: Option<String>,
    html_url: Option<String>,
    body: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub user: GitHubUser,
    labels: Option<Vec<Label>>,
}

impl IssueLike {
    /// The number as displayed, `?` when absent.
    pub fn number(&self) -> String {
        self.number
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string())
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("No title")
    }

    pub fn state(&self) -> &str {
        self.state.as_deref().unwrap_or("unknown")
    }

    pub fn html_url(&self) -> &str {
        self.html_url.as_deref().unwrap_or(NO_LINK)
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    pub fn labels(&self) -> &[Label] {
        self.labels.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Label {
    name: Option<String>,
}

impl Label {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReleaseEvent {
    action: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub release: Release,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
}

impl ReleaseEvent {
    pub fn action(&self) -> &str {
        self.action.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Release {
    name: Option<String>,
    tag_name: Option<String>,
    html_url: Option<String>,
    body: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub author: GitHubUser,
}

impl Release {
    /// Release name, falling back to the tag when the release is unnamed.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.tag_name.as_deref())
            .unwrap_or("No title")
    }

    pub fn tag_name(&self) -> &str {
        self.tag_name.as_deref().unwrap_or("No tag")
    }

    pub fn html_url(&self) -> &str {
        self.html_url.as_deref().unwrap_or(NO_LINK)
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

/// Payload of both `create` and `delete` events.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefEvent {
    r#ref: Option<String>,
    ref_type: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: GitHubUser,
}

impl RefEvent {
    pub fn git_ref(&self) -> &str {
        self.r#ref.as_deref().unwrap_or_default()
    }

    /// `branch` or `tag` for events GitHub currently sends.
    pub fn ref_type(&self) -> &str {
        self.ref_type.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn request_reads_github_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(X_GITHUB_EVENT, HeaderValue::from_static("push"));
        headers.insert(X_HUB_SIGNATURE_256, HeaderValue::from_static("sha256=ab"));
        headers.insert(X_GITHUB_DELIVERY, HeaderValue::from_static("delivery-1"));

        let request = WebhookRequest::from_parts(&headers, Bytes::from_static(b"{}"));

        assert_eq!(request.event_type, "push");
        assert_eq!(request.signature, "sha256=ab");
        assert_eq!(request.delivery_id, "delivery-1");
        assert_eq!(&request.body[..], b"{}");
    }

    #[test]
    fn request_without_headers_gets_defaults() {
        let request = WebhookRequest::from_parts(&HeaderMap::new(), Bytes::new());

        assert_eq!(request.event_type, "");
        assert_eq!(request.signature, "");
        assert!(Uuid::parse_str(&request.delivery_id).is_ok());
    }

    #[test]
    fn unsupported_event_decodes_to_none() {
        let payload = json!({"zen": "hi"});
        let event = GitHubEvent::from_payload("ping", payload).unwrap();
        assert!(event.is_none());
    }

    #[test]
    fn empty_push_payload_fills_placeholders() {
        let event = GitHubEvent::from_payload("push", json!({})).unwrap();
        let Some(GitHubEvent::Push(push)) = event else {
            panic!("expected a push event");
        };

        assert_eq!(push.git_ref(), "");
        assert_eq!(push.compare_url(), "");
        assert!(push.commits().is_empty());
        assert_eq!(push.repository.name(), "Unknown");
        assert_eq!(push.repository.html_url(), "#");
        assert_eq!(push.pusher.name(), "Unknown");
        assert_eq!(push.pusher.avatar_url(), "");
    }

    #[test]
    fn null_fields_are_treated_as_missing() {
        let payload = json!({
            "action": "opened",
            "pull_request": {"number": 7, "body": null, "user": null, "labels": null},
            "repository": null
        });
        let event = GitHubEvent::from_payload("pull_request", payload).unwrap();
        let Some(GitHubEvent::PullRequest(pr)) = event else {
            panic!("expected a pull_request event");
        };

        assert_eq!(pr.pull_request.number(), "7");
        assert_eq!(pr.pull_request.body(), "");
        assert_eq!(pr.pull_request.user.login(), "Unknown");
        assert_eq!(pr.repository.full_name(), "Unknown");
    }

    #[test]
    fn wrongly_shaped_payload_is_an_error() {
        let issues = json!({"issue": "not an object"});
        assert!(GitHubEvent::from_payload("issues", issues).is_err());
        assert!(GitHubEvent::from_payload("push", json!([1, 2, 3])).is_err());
    }

    #[test]
    fn release_name_falls_back_to_tag() {
        let unnamed = json!({"name": "", "tag_name": "v1"});
        let release: Release = serde_json::from_value(unnamed).unwrap();
        assert_eq!(release.display_name(), "v1");

        let release: Release = serde_json::from_value(json!({})).unwrap();
        assert_eq!(release.display_name(), "No title");
        assert_eq!(release.tag_name(), "No tag");
    }
}
