use serde::{Deserialize, Serialize};

/// One comment from a post's reply tree, flattened for relational storage.
///
/// Records are produced in pre-order: a comment always precedes its
/// descendants, so `parent_comment_id` only ever references an earlier
/// record of the same post (or is `None` for a top-level comment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatComment {
    pub comment_id: String,
    pub post_id: String,
    pub parent_comment_id: Option<String>,
    pub author: Option<String>,
    pub body: Option<String>,
    pub score: Option<i64>,
    /// Epoch seconds as reported by the provider, passed through unconverted.
    pub created_utc: Option<f64>,
    pub edited: bool,
    pub is_submitter: bool,
    pub stickied: bool,
    /// Depth in the reply tree, 0 for top-level comments.
    pub level: u32,
}
