use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value, from_str, from_value};
use thiserror::Error;

use snoosync_core::{FlatComment, Timeline};

const TOKEN_ENDPOINT: &str = "https://www.reddit.com/api/v1/access_token";
const OAUTH_ENDPOINT: &str = "https://oauth.reddit.com";

/// Listing entries with this kind tag are comments; everything else
/// ("more" stubs in particular) is filtered out of the traversal.
const COMMENT_KIND: &str = "t1";

/// The provider's documented page-size ceiling, mirrored client-side.
pub const MAX_PAGE_SIZE: u32 = 100;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RedditError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0} not found in response")]
    Protocol(&'static str),
}

/// Stateless client for the Reddit OAuth API. Holds only the HTTP handle
/// and the configured user agent; the bearer token is a parameter on every
/// call and is never cached.
#[derive(Debug, Clone)]
pub struct RedditClient {
    http: reqwest::Client,
    user_agent: String,
}

impl RedditClient {
    pub fn new(http: reqwest::Client, user_agent: String) -> Self {
        Self { http, user_agent }
    }

    /// Exchanges client credentials for a short-lived bearer token.
    pub async fn get_access_token(
        &self,
        client_id: &str,
        secret_key: &str,
    ) -> Result<String, RedditError> {
        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .basic_auth(client_id, Some(secret_key))
            .form(&[("grant_type", "client_credentials")])
            .header("User-Agent", &self.user_agent)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        parse_token_body(&body)
    }

    /// Fetches one page of posts for a subreddit timeline. Returns each
    /// listing child's inner data payload unmodified, in provider order.
    pub async fn fetch_posts(
        &self,
        subreddit: &str,
        limit: u32,
        token: &str,
        timeline: Timeline,
    ) -> Result<Vec<Map<String, Value>>, RedditError> {
        validate_listing_request(subreddit, limit)?;
        let response = self
            .http
            .get(listing_url(subreddit, timeline))
            .query(&[("limit", limit)])
            .bearer_auth(token)
            .header("User-Agent", &self.user_agent)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        parse_posts_body(&body)
    }

    /// Fetches a post's comment tree and flattens it depth-first. "Load
    /// more" stubs are dropped without a follow-up request, so the result
    /// covers exactly what the single response carries.
    pub async fn fetch_comments(
        &self,
        post_id: &str,
        token: &str,
    ) -> Result<Vec<FlatComment>, RedditError> {
        if post_id.trim().is_empty() {
            return Err(RedditError::Validation(
                "post id must be a non-empty string".to_string(),
            ));
        }
        let response = self
            .http
            .get(comments_url(post_id))
            .bearer_auth(token)
            .header("User-Agent", &self.user_agent)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        parse_comments_body(post_id, &body)
    }
}

fn listing_url(subreddit: &str, timeline: Timeline) -> String {
    format!("{OAUTH_ENDPOINT}/r/{subreddit}/{}", timeline.as_str())
}

fn comments_url(post_id: &str) -> String {
    format!("{OAUTH_ENDPOINT}/comments/{post_id}")
}

fn validate_listing_request(subreddit: &str, limit: u32) -> Result<(), RedditError> {
    if subreddit.trim().is_empty() {
        return Err(RedditError::Validation(
            "subreddit name must be a non-empty string".to_string(),
        ));
    }
    if limit < 1 || limit > MAX_PAGE_SIZE {
        return Err(RedditError::Validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}, got {limit}"
        )));
    }
    Ok(())
}

fn parse_token_body(body: &str) -> Result<String, RedditError> {
    let payload: TokenResponse =
        from_str(body).map_err(|err| RedditError::Validation(format!("invalid token payload: {err}")))?;
    match payload.access_token {
        Some(token) if !token.trim().is_empty() => Ok(token),
        _ => Err(RedditError::Protocol("access token")),
    }
}

fn parse_posts_body(body: &str) -> Result<Vec<Map<String, Value>>, RedditError> {
    let listing: PostListing = from_str(body).map_err(|err| {
        RedditError::Validation(format!("error processing response data: {err}"))
    })?;
    Ok(listing
        .data
        .children
        .into_iter()
        .filter_map(|child| child.data)
        .collect())
}

/// The comments endpoint answers with a two-element array: the post's own
/// listing (ignored) followed by the top-level comment listing.
fn parse_comments_body(post_id: &str, body: &str) -> Result<Vec<FlatComment>, RedditError> {
    let mut elements: Vec<Value> = from_str(body).map_err(|err| {
        RedditError::Validation(format!("error processing comment data: {err}"))
    })?;
    if elements.len() < 2 {
        return Err(RedditError::Validation(
            "error processing comment data: expected post and comment listings".to_string(),
        ));
    }
    let listing: CommentListing = from_value(elements.remove(1)).map_err(|err| {
        RedditError::Validation(format!("error processing comment data: {err}"))
    })?;
    let mut comments = Vec::new();
    flatten_children(listing.data.children, post_id, None, 0, &mut comments);
    Ok(comments)
}

/// Filters a listing's children down to actual comments and flattens each
/// in provider order. Entries whose payload is not a well-formed comment
/// node contribute nothing.
fn flatten_children(
    children: Vec<ListingChild>,
    post_id: &str,
    parent_id: Option<&str>,
    level: u32,
    out: &mut Vec<FlatComment>,
) {
    for child in children {
        if child.kind != COMMENT_KIND {
            continue;
        }
        let Ok(node) = from_value::<CommentNode>(child.data) else {
            continue;
        };
        flatten_node(node, post_id, parent_id, level, out);
    }
}

/// Pre-order traversal: the node's own record is appended before any of
/// its descendants, so parent references always point at an earlier record.
fn flatten_node(
    node: CommentNode,
    post_id: &str,
    parent_id: Option<&str>,
    level: u32,
    out: &mut Vec<FlatComment>,
) {
    let CommentNode {
        id,
        author,
        body,
        score,
        created_utc,
        edited,
        is_submitter,
        stickied,
        replies,
    } = node;
    out.push(FlatComment {
        comment_id: id.clone(),
        post_id: post_id.to_string(),
        parent_comment_id: parent_id.map(str::to_string),
        author,
        body,
        score,
        created_utc,
        edited: edited.as_bool(),
        is_submitter,
        stickied,
        level,
    });
    if let Replies::Listing(listing) = replies {
        flatten_children(listing.data.children, post_id, Some(&id), level + 1, out);
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostListing {
    data: PostListingData,
}

#[derive(Debug, Deserialize)]
struct PostListingData {
    children: Vec<PostChild>,
}

#[derive(Debug, Deserialize)]
struct PostChild {
    #[serde(default)]
    data: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct CommentListing {
    data: CommentListingData,
}

#[derive(Debug, Deserialize)]
struct CommentListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct CommentNode {
    id: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    created_utc: Option<f64>,
    #[serde(default)]
    edited: Edited,
    #[serde(default)]
    is_submitter: bool,
    #[serde(default)]
    stickied: bool,
    #[serde(default)]
    replies: Replies,
}

/// The provider sends `false` for unedited comments and the edit timestamp
/// otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Edited {
    Flag(bool),
    Timestamp(f64),
}

impl Edited {
    fn as_bool(&self) -> bool {
        match self {
            Edited::Flag(flag) => *flag,
            Edited::Timestamp(_) => true,
        }
    }
}

impl Default for Edited {
    fn default() -> Self {
        Edited::Flag(false)
    }
}

/// A node's replies field: a nested listing, or the provider's
/// empty-string sentinel meaning "no replies".
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Replies {
    Listing(CommentListing),
    Sentinel(serde::de::IgnoredAny),
}

impl Default for Replies {
    fn default() -> Self {
        Replies::Sentinel(serde::de::IgnoredAny)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        RedditError, listing_url, parse_comments_body, parse_posts_body, parse_token_body,
        validate_listing_request,
    };
    use snoosync_core::Timeline;

    #[test]
    fn listing_url_contains_timeline_segment() {
        let url = listing_url("rust", Timeline::Rising);
        assert_eq!(url, "https://oauth.reddit.com/r/rust/rising");
    }

    #[test]
    fn validate_rejects_empty_subreddit() {
        let err = validate_listing_request("", 10).unwrap_err();
        assert!(matches!(err, RedditError::Validation(_)));
        let err = validate_listing_request("   ", 10).unwrap_err();
        assert!(matches!(err, RedditError::Validation(_)));
    }

    #[test]
    fn validate_rejects_out_of_range_limit() {
        assert!(matches!(
            validate_listing_request("rust", 0),
            Err(RedditError::Validation(_))
        ));
        assert!(matches!(
            validate_listing_request("rust", 101),
            Err(RedditError::Validation(_))
        ));
        assert!(validate_listing_request("rust", 1).is_ok());
        assert!(validate_listing_request("rust", 100).is_ok());
    }

    #[test]
    fn parse_token_body_returns_token() {
        let body = r#"{"access_token":"abc","token_type":"bearer","expires_in":3600}"#;
        assert_eq!(parse_token_body(body).unwrap(), "abc");
    }

    #[test]
    fn parse_token_body_missing_token_is_protocol_error() {
        let body = r#"{"error":"invalid_grant"}"#;
        let err = parse_token_body(body).unwrap_err();
        assert!(matches!(err, RedditError::Protocol(_)));
        assert_eq!(err.to_string(), "access token not found in response");
    }

    #[test]
    fn parse_token_body_rejects_non_json() {
        let err = parse_token_body("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, RedditError::Validation(_)));
    }

    #[test]
    fn parse_posts_body_returns_inner_payloads_in_order() {
        let body = json!({
            "kind": "Listing",
            "data": {
                "children": [
                    {"kind": "t3", "data": {"id": "p1", "title": "first"}},
                    {"kind": "t3", "data": {"id": "p2", "title": "second"}},
                ]
            }
        })
        .to_string();
        let posts = parse_posts_body(&body).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0]["id"], "p1");
        assert_eq!(posts[1]["id"], "p2");
    }

    #[test]
    fn parse_posts_body_skips_children_without_payload() {
        let body = json!({
            "data": {
                "children": [
                    {"kind": "t3"},
                    {"kind": "t3", "data": {"id": "p2"}},
                ]
            }
        })
        .to_string();
        let posts = parse_posts_body(&body).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["id"], "p2");
    }

    #[test]
    fn parse_posts_body_rejects_malformed_listing() {
        let err = parse_posts_body(r#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, RedditError::Validation(_)));
        let err = parse_posts_body(r#"{"children":[]}"#).unwrap_err();
        assert!(matches!(err, RedditError::Validation(_)));
    }

    #[test]
    fn single_comment_with_sentinel_replies() {
        let body = json!([
            {"kind": "Listing", "data": {"children": []}},
            {"data": {"children": [
                {"kind": "t1", "data": {"id": "c1", "body": "hi", "replies": ""}}
            ]}}
        ])
        .to_string();
        let comments = parse_comments_body("abc123", &body).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].comment_id, "c1");
        assert_eq!(comments[0].post_id, "abc123");
        assert_eq!(comments[0].parent_comment_id, None);
        assert_eq!(comments[0].body.as_deref(), Some("hi"));
        assert_eq!(comments[0].level, 0);
    }

    #[test]
    fn nested_reply_follows_parent_in_order() {
        let body = json!([
            {},
            {"data": {"children": [
                {"kind": "t1", "data": {
                    "id": "c1",
                    "body": "root",
                    "replies": {"kind": "Listing", "data": {"children": [
                        {"kind": "t1", "data": {"id": "c2", "body": "child", "replies": ""}}
                    ]}}
                }}
            ]}}
        ])
        .to_string();
        let comments = parse_comments_body("abc123", &body).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].comment_id, "c1");
        assert_eq!(comments[0].level, 0);
        assert_eq!(comments[0].parent_comment_id, None);
        assert_eq!(comments[1].comment_id, "c2");
        assert_eq!(comments[1].level, 1);
        assert_eq!(comments[1].parent_comment_id.as_deref(), Some("c1"));
    }

    #[test]
    fn descendants_come_before_later_siblings() {
        let body = json!([
            {},
            {"data": {"children": [
                {"kind": "t1", "data": {
                    "id": "a",
                    "replies": {"data": {"children": [
                        {"kind": "t1", "data": {"id": "a1", "replies": {"data": {"children": [
                            {"kind": "t1", "data": {"id": "a1x", "replies": ""}}
                        ]}}}}
                    ]}}
                }},
                {"kind": "t1", "data": {"id": "b", "replies": ""}}
            ]}}
        ])
        .to_string();
        let comments = parse_comments_body("p", &body).unwrap();
        let ids: Vec<&str> = comments.iter().map(|c| c.comment_id.as_str()).collect();
        assert_eq!(ids, ["a", "a1", "a1x", "b"]);
        let levels: Vec<u32> = comments.iter().map(|c| c.level).collect();
        assert_eq!(levels, [0, 1, 2, 0]);
        assert_eq!(comments[2].parent_comment_id.as_deref(), Some("a1"));
    }

    #[test]
    fn more_stub_contributes_nothing() {
        let body = json!([
            {},
            {"data": {"children": [
                {"kind": "t1", "data": {
                    "id": "c1",
                    "replies": {"data": {"children": [
                        {"kind": "more", "data": {"count": 42, "children": ["c9", "c10"]}}
                    ]}}
                }},
                {"kind": "more", "data": {"count": 7}}
            ]}}
        ])
        .to_string();
        let comments = parse_comments_body("p", &body).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].comment_id, "c1");
    }

    #[test]
    fn malformed_node_is_skipped() {
        let body = json!([
            {},
            {"data": {"children": [
                {"kind": "t1", "data": "not an object"},
                {"kind": "t1", "data": {"body": "missing id"}},
                {"kind": "t1", "data": {"id": "c2", "replies": ""}}
            ]}}
        ])
        .to_string();
        let comments = parse_comments_body("p", &body).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].comment_id, "c2");
    }

    #[test]
    fn comment_field_defaults() {
        let body = json!([
            {},
            {"data": {"children": [
                {"kind": "t1", "data": {"id": "c1"}}
            ]}}
        ])
        .to_string();
        let comments = parse_comments_body("p", &body).unwrap();
        let comment = &comments[0];
        assert!(!comment.edited);
        assert!(!comment.is_submitter);
        assert!(!comment.stickied);
        assert_eq!(comment.author, None);
        assert_eq!(comment.score, None);
    }

    #[test]
    fn edited_timestamp_maps_to_true() {
        let body = json!([
            {},
            {"data": {"children": [
                {"kind": "t1", "data": {"id": "c1", "edited": 1638393600.0, "replies": ""}},
                {"kind": "t1", "data": {"id": "c2", "edited": false, "replies": ""}}
            ]}}
        ])
        .to_string();
        let comments = parse_comments_body("p", &body).unwrap();
        assert!(comments[0].edited);
        assert!(!comments[1].edited);
    }

    #[test]
    fn short_top_level_array_is_rejected() {
        let err = parse_comments_body("p", r#"[{"data":{}}]"#).unwrap_err();
        assert!(matches!(err, RedditError::Validation(_)));
        let err = parse_comments_body("p", r#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, RedditError::Validation(_)));
    }

    #[test]
    fn traversal_is_deterministic() {
        let body = json!([
            {},
            {"data": {"children": [
                {"kind": "t1", "data": {
                    "id": "c1",
                    "replies": {"data": {"children": [
                        {"kind": "t1", "data": {"id": "c2", "replies": ""}},
                        {"kind": "t1", "data": {"id": "c3", "replies": ""}}
                    ]}}
                }}
            ]}}
        ])
        .to_string();
        let first = parse_comments_body("p", &body).unwrap();
        let second = parse_comments_body("p", &body).unwrap();
        assert_eq!(first, second);
    }
}
