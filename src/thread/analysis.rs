//! Whole-thread heuristics shown next to the graph.

use std::collections::{HashMap, HashSet};

use super::post::{Post, Thread};

const SPAM_MIN_POSTS: usize = 5;
const SPAM_MAX_POSTS: usize = 1000;
const SPAM_CORRELATION: f64 = 0.99;
const SINGLE_POST_OP_MIN_POSTS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlagCount {
    pub flag: String,
    pub posts: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThreadReport {
    pub spam_trend: bool,
    pub single_post_op: bool,
    pub unique_uids: usize,
    pub flags: Vec<FlagCount>,
}

impl ThreadReport {
    pub fn analyze(thread: &Thread) -> Self {
        Self {
            spam_trend: detect_spam_trend(&thread.posts),
            single_post_op: is_single_post_op(thread),
            unique_uids: unique_uid_count(&thread.posts),
            flags: flag_summary(&thread.posts),
        }
    }
}

/// Flags threads whose post count grows almost perfectly linearly with time,
/// the signature of scripted bumping.
pub fn detect_spam_trend(posts: &[Post]) -> bool {
    if !(SPAM_MIN_POSTS..=SPAM_MAX_POSTS).contains(&posts.len()) {
        return false;
    }

    let Some(first) = posts.first() else {
        return false;
    };
    let first_time = first.time;

    let minutes = posts
        .iter()
        .map(|post| (post.time - first_time).num_milliseconds() as f64 / 60_000.0)
        .collect::<Vec<_>>();
    let positions = (1..=posts.len()).map(|n| n as f64).collect::<Vec<_>>();

    pearson_correlation(&minutes, &positions) >= SPAM_CORRELATION
}

/// True when the OP's poster ID shows up on exactly one post in a thread of
/// at least five posts.
pub fn is_single_post_op(thread: &Thread) -> bool {
    if thread.posts.len() < SINGLE_POST_OP_MIN_POSTS {
        return false;
    }

    let Some(op_uid) = thread.op().and_then(|op| op.uid.as_deref()) else {
        return false;
    };

    thread
        .posts
        .iter()
        .filter(|post| post.uid.as_deref() == Some(op_uid))
        .count()
        == 1
}

pub fn unique_uid_count(posts: &[Post]) -> usize {
    posts
        .iter()
        .filter_map(|post| post.uid.as_deref())
        .collect::<HashSet<_>>()
        .len()
}

/// Post counts per flag, most common first, ties by name.
pub fn flag_summary(posts: &[Post]) -> Vec<FlagCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for flag in posts.iter().filter_map(|post| post.flag.as_deref()) {
        *counts.entry(flag).or_insert(0) += 1;
    }

    let mut summary = counts
        .into_iter()
        .map(|(flag, posts)| FlagCount {
            flag: flag.to_owned(),
            posts,
        })
        .collect::<Vec<_>>();
    summary.sort_by(|a, b| b.posts.cmp(&a.posts).then_with(|| a.flag.cmp(&b.flag)));
    summary
}

fn pearson_correlation(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    if n != ys.len() || n < 2 {
        return 0.0;
    }

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denom_x = 0.0;
    let mut denom_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        numerator += dx * dy;
        denom_x += dx * dx;
        denom_y += dy * dy;
    }

    if denom_x == 0.0 || denom_y == 0.0 {
        return 0.0;
    }
    numerator / (denom_x * denom_y).sqrt()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn post_at(number: u64, seconds: i64) -> Post {
        let time = Utc
            .timestamp_opt(1_700_000_000 + seconds, 0)
            .single()
            .expect("valid timestamp");
        Post::new(number, time)
    }

    fn with_uid(mut post: Post, uid: &str) -> Post {
        post.uid = Some(uid.to_owned());
        post
    }

    #[test]
    fn evenly_spaced_posts_look_scripted() {
        let posts = (0..20).map(|i| post_at(i, i as i64 * 60)).collect::<Vec<_>>();
        assert!(detect_spam_trend(&posts));
    }

    #[test]
    fn bursty_posting_is_not_flagged() {
        let offsets = [0, 5, 10, 15, 3_600, 3_605, 3_610, 20_000, 20_001, 20_002];
        let posts = offsets
            .iter()
            .enumerate()
            .map(|(i, &offset)| post_at(i as u64, offset))
            .collect::<Vec<_>>();
        assert!(!detect_spam_trend(&posts));
    }

    #[test]
    fn spam_check_ignores_tiny_and_huge_threads() {
        let tiny = (0..4).map(|i| post_at(i, i as i64 * 60)).collect::<Vec<_>>();
        assert!(!detect_spam_trend(&tiny));

        let huge = (0..1001).map(|i| post_at(i, i as i64 * 60)).collect::<Vec<_>>();
        assert!(!detect_spam_trend(&huge));
    }

    #[test]
    fn simultaneous_posts_have_no_trend() {
        let posts = (0..10).map(|i| post_at(i, 0)).collect::<Vec<_>>();
        assert!(!detect_spam_trend(&posts));
    }

    #[test]
    fn op_posting_once_is_detected() {
        let mut op = with_uid(post_at(1, 0), "op");
        op.is_op = true;
        let mut posts = vec![op];
        posts.extend((2..7).map(|i| with_uid(post_at(i, i as i64), "other")));
        let thread = Thread { id: Some(1), posts };
        assert!(is_single_post_op(&thread));

        let mut thread = thread;
        thread.posts.push(with_uid(post_at(9, 9), "op"));
        assert!(!is_single_post_op(&thread));
    }

    #[test]
    fn single_post_op_needs_an_op_uid() {
        let mut op = post_at(1, 0);
        op.is_op = true;
        let mut posts = vec![op];
        posts.extend((2..8).map(|i| with_uid(post_at(i, i as i64), "x")));
        assert!(!is_single_post_op(&Thread { id: None, posts }));
    }

    #[test]
    fn flag_summary_orders_by_count_then_name() {
        let flags = ["Brazil", "Canada", "Brazil", "Austria", "Canada", "Brazil"];
        let posts = flags
            .iter()
            .enumerate()
            .map(|(i, flag)| {
                let mut post = post_at(i as u64, 0);
                post.flag = Some((*flag).to_owned());
                post
            })
            .collect::<Vec<_>>();

        let summary = flag_summary(&posts);
        let names = summary.iter().map(|f| f.flag.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Brazil", "Canada", "Austria"]);
        assert_eq!(summary[0].posts, 3);
    }

    #[test]
    fn unique_uids_ignore_missing_ids() {
        let posts = vec![
            with_uid(post_at(1, 0), "a"),
            with_uid(post_at(2, 0), "b"),
            with_uid(post_at(3, 0), "a"),
            post_at(4, 0),
        ];
        assert_eq!(unique_uid_count(&posts), 2);
    }
}
