use std::collections::HashSet;

use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Post {
    pub number: u64,
    pub time: DateTime<Utc>,
    pub reply_tos: Vec<u64>,
    pub uid: Option<String>,
    pub flag: Option<String>,
    pub message: String,
    pub is_op: bool,
}

impl Post {
    pub fn new(number: u64, time: DateTime<Utc>) -> Self {
        Self {
            number,
            time,
            reply_tos: Vec::new(),
            uid: None,
            flag: None,
            message: String::new(),
            is_op: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Thread {
    pub id: Option<u64>,
    pub posts: Vec<Post>,
}

impl Thread {
    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    pub fn highest_number(&self) -> Option<u64> {
        self.posts.iter().map(|post| post.number).max()
    }

    pub fn op(&self) -> Option<&Post> {
        self.posts.iter().rev().find(|post| post.is_op)
    }

    pub fn indices_with_flag(&self, flag: &str) -> Vec<usize> {
        self.posts
            .iter()
            .enumerate()
            .filter(|(_, post)| post.flag.as_deref() == Some(flag))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn indices_with_uid(&self, uid: &str) -> Vec<usize> {
        self.posts
            .iter()
            .enumerate()
            .filter(|(_, post)| post.uid.as_deref() == Some(uid))
            .map(|(index, _)| index)
            .collect()
    }

    /// Appends posts whose number is above the highest one already present
    /// and returns how many were added. Posts at or below that number are
    /// ignored even if they are missing locally, matching how a live thread
    /// only ever grows at the tail.
    pub fn merge_new_posts(&mut self, incoming: Thread) -> usize {
        if self.id.is_none() {
            self.id = incoming.id;
        }

        let mut highest = self.highest_number();
        let mut seen = self
            .posts
            .iter()
            .map(|post| post.number)
            .collect::<HashSet<_>>();
        let mut added = 0usize;

        for mut post in incoming.posts {
            if highest.is_some_and(|highest| post.number <= highest) || !seen.insert(post.number) {
                continue;
            }

            if self.op().is_some() {
                post.is_op = false;
            }
            highest = Some(post.number);
            self.posts.push(post);
            added += 1;
        }

        added
    }
}
