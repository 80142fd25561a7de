//! Flattens Reddit's nested thread JSON into an ordered list of records.
//!
//! The walk is iterative over an explicit `(node, depth)` stack so hostile or
//! very deep reply chains cannot exhaust the call stack. Children are pushed in
//! reverse so they pop in source order, which keeps the output depth-first with
//! siblings in the order Reddit returned them.

use insights_core::{
    CommentRecord, FlatRecord, FlatThread, PostRecord, DELETED_SENTINEL, REMOVED_SENTINEL,
};
use serde_json::{Map, Value};
use tracing::debug;

pub const DEFAULT_MAX_DEPTH: usize = 10;

const KIND_LISTING: &str = "Listing";
const KIND_POST: &str = "t3";
const KIND_COMMENT: &str = "t1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flattener {
    max_depth: usize,
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl Flattener {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Accepts either the `[post-listing, comment-listing]` pair Reddit returns
    /// for thread endpoints or a single node. Unknown kinds and non-object
    /// nodes are skipped; subtrees deeper than `max_depth` are dropped whole.
    pub fn flatten(&self, raw: &Value) -> FlatThread {
        let mut stack: Vec<(&Value, usize)> = match raw {
            Value::Array(roots) => roots.iter().rev().map(|root| (root, 0)).collect(),
            other => vec![(other, 0)],
        };

        let mut post: Option<PostRecord> = None;
        let mut comments = Vec::new();
        let mut skipped_comments = 0usize;

        while let Some((node, depth)) = stack.pop() {
            if depth > self.max_depth {
                continue;
            }
            let Some(node) = node.as_object() else {
                continue;
            };
            let data = node.get("data").and_then(Value::as_object);

            match node.get("kind").and_then(Value::as_str) {
                Some(KIND_LISTING) => {
                    let children = data
                        .and_then(|d| d.get("children"))
                        .and_then(Value::as_array);
                    if let Some(children) = children {
                        // A listing is a container, not a level.
                        stack.extend(children.iter().rev().map(|child| (child, depth)));
                    }
                }
                Some(KIND_POST) => {
                    if post.is_none() {
                        post = Some(post_record(data));
                    } else {
                        debug!("Ignoring additional post node in thread payload");
                    }
                }
                Some(KIND_COMMENT) => {
                    match comment_record(data, depth) {
                        Some(comment) => comments.push(comment),
                        None => skipped_comments += 1,
                    }
                    // Replies of a filtered comment are still walked, one level down.
                    let replies = data
                        .and_then(|d| d.get("replies"))
                        .filter(|replies| replies.is_object());
                    if let Some(replies) = replies {
                        stack.push((replies, depth + 1));
                    }
                }
                _ => {}
            }
        }

        debug!(
            "Flattened thread: post={}, comments={}, filtered={}",
            post.is_some(),
            comments.len(),
            skipped_comments
        );

        let records = post
            .map(FlatRecord::Post)
            .into_iter()
            .chain(comments.into_iter().map(FlatRecord::Comment))
            .collect();
        FlatThread { records }
    }
}

/// Flattens with the default depth cap.
pub fn flatten_thread(raw: &Value) -> FlatThread {
    Flattener::default().flatten(raw)
}

/// True when a comment body carries real content.
pub fn is_usable_body(body: &str) -> bool {
    !body.is_empty() && body != DELETED_SENTINEL && body != REMOVED_SENTINEL
}

fn post_record(data: Option<&Map<String, Value>>) -> PostRecord {
    PostRecord {
        title: string_field(data, "title").unwrap_or_default().to_string(),
        body: string_field(data, "selftext").unwrap_or_default().to_string(),
        author: author_field(data),
        score: int_field(data, "score"),
        url: string_field(data, "url").unwrap_or_default().to_string(),
        num_comments: int_field(data, "num_comments"),
        created_utc: int_field(data, "created_utc"),
        subreddit: string_field(data, "subreddit").unwrap_or_default().to_string(),
    }
}

fn comment_record(data: Option<&Map<String, Value>>, depth: usize) -> Option<CommentRecord> {
    let body = string_field(data, "body").filter(|body| is_usable_body(body))?;
    Some(CommentRecord {
        body: body.to_string(),
        author: author_field(data),
        score: int_field(data, "score"),
        depth,
    })
}

fn string_field<'a>(data: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a str> {
    data.and_then(|d| d.get(key)).and_then(Value::as_str)
}

fn author_field(data: Option<&Map<String, Value>>) -> String {
    string_field(data, "author")
        .unwrap_or(DELETED_SENTINEL)
        .to_string()
}

/// Reddit sends integers for counts but floats for timestamps; accept both.
fn int_field(data: Option<&Map<String, Value>>, key: &str) -> i64 {
    match data.and_then(|d| d.get(key)) {
        Some(value) => value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        None => 0,
    }
}
