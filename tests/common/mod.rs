#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use reply_grapher::thread::Post;

pub fn post(number: u64, reply_tos: &[u64]) -> Post {
    let time = Utc
        .timestamp_opt(1_700_000_000 + number as i64 * 30, 0)
        .single()
        .expect("valid timestamp");
    let mut post = Post::new(number, time);
    post.reply_tos = reply_tos.to_vec();
    post
}

pub fn op(number: u64) -> Post {
    let mut post = post(number, &[]);
    post.is_op = true;
    post
}

/// OP 0, posts 1 and 2 reply to it, 3 replies to 1 and 4 replies to 2.
pub fn forked_thread() -> Vec<Post> {
    vec![
        op(0),
        post(1, &[0]),
        post(2, &[0]),
        post(3, &[1]),
        post(4, &[2]),
    ]
}
