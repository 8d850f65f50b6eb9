use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::post::{Post, Thread};

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum RawNumber {
    Integer(u64),
    Text(String),
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawPost {
    pub(super) number: RawNumber,
    pub(super) time: i64,
    #[serde(default, alias = "replyTos")]
    pub(super) reply_tos: Vec<RawNumber>,
    #[serde(default)]
    pub(super) uid: Option<String>,
    #[serde(default)]
    pub(super) flag: Option<String>,
    #[serde(default)]
    pub(super) message: String,
    #[serde(default, alias = "isOP")]
    pub(super) is_op: bool,
}

/// Parses a thread document: either a bare array of posts or an object with
/// `thread` and `posts` keys.
pub fn parse_thread(raw: &str) -> Result<Thread> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in thread file")?;

    let (thread_id, entries) = match parsed {
        Value::Array(entries) => (None, entries),
        Value::Object(mut object) => {
            let thread_id = match object.get("thread") {
                Some(value) => Some(
                    RawNumber::deserialize(value)
                        .ok()
                        .and_then(|raw| normalize_post_number(&raw))
                        .ok_or_else(|| anyhow!("invalid thread id in thread file: {value}"))?,
                ),
                None => None,
            };
            let entries = match object.remove("posts") {
                Some(Value::Array(entries)) => entries,
                Some(_) => return Err(anyhow!("`posts` must be an array")),
                None => return Err(anyhow!("thread object has no `posts` array")),
            };
            (thread_id, entries)
        }
        _ => return Err(anyhow!("unexpected JSON type in thread file")),
    };

    let mut posts = Vec::with_capacity(entries.len());
    let mut seen = HashSet::with_capacity(entries.len());
    let mut skipped = 0usize;

    for (position, value) in entries.iter().enumerate() {
        let Ok(raw_post) = RawPost::deserialize(value) else {
            warn!(position, "skipping malformed post entry");
            skipped += 1;
            continue;
        };
        let Some(post) = convert_post(raw_post) else {
            warn!(position, "skipping post without a usable number or time");
            skipped += 1;
            continue;
        };
        if !seen.insert(post.number) {
            debug!(number = post.number, "skipping duplicate post number");
            skipped += 1;
            continue;
        }
        posts.push(post);
    }

    if let Some(thread_id) = thread_id {
        for post in &mut posts {
            post.is_op = post.number == thread_id;
        }
    }

    debug!(posts = posts.len(), skipped, thread = ?thread_id, "parsed thread");

    Ok(Thread {
        id: thread_id,
        posts,
    })
}

fn convert_post(raw: RawPost) -> Option<Post> {
    let number = normalize_post_number(&raw.number)?;
    let time = DateTime::<Utc>::from_timestamp(raw.time, 0)?;

    let mut seen = HashSet::new();
    let reply_tos = raw
        .reply_tos
        .iter()
        .filter_map(normalize_post_number)
        .filter(|reference| seen.insert(*reference))
        .collect();

    Some(Post {
        number,
        time,
        reply_tos,
        uid: raw.uid.map(normalize_uid).filter(|uid| !uid.is_empty()),
        flag: raw
            .flag
            .map(|flag| flag.trim().to_owned())
            .filter(|flag| !flag.is_empty()),
        message: raw.message,
        is_op: raw.is_op,
    })
}

/// Accepts `123`, `"123"`, `">>123"`, `"p123"` and `"#p123"`; the first run of
/// ASCII digits is the post number.
pub(super) fn normalize_post_number(value: &RawNumber) -> Option<u64> {
    match value {
        RawNumber::Integer(number) => Some(*number),
        RawNumber::Text(text) => {
            let digits = text
                .trim_start_matches(|c: char| !c.is_ascii_digit())
                .split(|c: char| !c.is_ascii_digit())
                .next()?;
            digits.parse().ok()
        }
    }
}

fn normalize_uid(uid: String) -> String {
    let trimmed = uid.trim();
    trimmed
        .strip_prefix("ID:")
        .map(str::trim_start)
        .unwrap_or(trimmed)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_array_keeps_explicit_op_flags() {
        let raw = r#"[
            {"number": 10, "time": 1700000000, "isOP": true},
            {"number": "11", "time": 1700000060, "replyTos": ["10"]}
        ]"#;
        let thread = parse_thread(raw).expect("parse thread");

        assert_eq!(thread.id, None);
        assert_eq!(thread.posts.len(), 2);
        assert!(thread.posts[0].is_op);
        assert_eq!(thread.posts[1].reply_tos, vec![10]);
    }

    #[test]
    fn wrapped_thread_marks_op_by_id() {
        let raw = r#"{
            "thread": "500",
            "posts": [
                {"number": 500, "time": 1700000000},
                {"number": 501, "time": 1700000001, "is_op": true, "reply_tos": [500]}
            ]
        }"#;
        let thread = parse_thread(raw).expect("parse thread");

        assert_eq!(thread.id, Some(500));
        assert!(thread.posts[0].is_op);
        assert!(!thread.posts[1].is_op);
    }

    #[test]
    fn malformed_and_duplicate_posts_are_skipped() {
        let raw = r#"[
            {"number": 1, "time": 1700000000, "message": "first"},
            {"number": "no digits", "time": 1700000001},
            {"time": 1700000002},
            {"number": 1, "time": 1700000003, "message": "second"},
            {"number": 2, "time": 1700000004}
        ]"#;
        let thread = parse_thread(raw).expect("parse thread");

        let numbers = thread.posts.iter().map(|p| p.number).collect::<Vec<_>>();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(thread.posts[0].message, "first");
    }

    #[test]
    fn reply_references_are_normalized_and_deduplicated() {
        let raw = r##"[
            {"number": 3, "time": 1700000000, "reply_tos": [">>1", "#p2", 1, "junk"]}
        ]"##;
        let thread = parse_thread(raw).expect("parse thread");
        assert_eq!(thread.posts[0].reply_tos, vec![1, 2]);
    }

    #[test]
    fn uid_prefix_and_blank_fields_are_cleaned() {
        let raw = r#"[
            {"number": 1, "time": 1700000000, "uid": "ID: AbCd1234", "flag": "  "}
        ]"#;
        let thread = parse_thread(raw).expect("parse thread");
        assert_eq!(thread.posts[0].uid.as_deref(), Some("AbCd1234"));
        assert_eq!(thread.posts[0].flag, None);
    }

    #[test]
    fn object_without_posts_is_an_error() {
        assert!(parse_thread(r#"{"thread": 1}"#).is_err());
        assert!(parse_thread(r#""just a string""#).is_err());
        assert!(parse_thread("not json").is_err());
    }
}
