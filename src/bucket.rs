use crate::{ContextName, ContextNameRef, Token, TokenRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, num::NonZeroU32};

/// Per-session token state, one [`TokenBucket`] per context name.
///
/// This is the sub-tree the host session layer persists under
/// [`SESSION_KEY`](crate::SESSION_KEY). Buckets are created lazily when a
/// token is issued, never by validation.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FormTokens {
    buckets: HashMap<ContextName, TokenBucket>,
}

impl FormTokens {
    #[must_use]
    pub fn bucket(&self, name: &ContextNameRef) -> Option<&TokenBucket> {
        self.buckets.get(name)
    }

    pub(crate) fn bucket_mut(&mut self, name: &ContextNameRef) -> Option<&mut TokenBucket> {
        self.buckets.get_mut(name)
    }

    pub(crate) fn bucket_entry(&mut self, name: &ContextNameRef) -> &mut TokenBucket {
        self.buckets.entry(name.to_owned()).or_default()
    }
}

/// Ordered set of live tokens for one context, each with its usage count.
///
/// Insertion order is load-bearing: the oldest-inserted entry is the one
/// evicted when the bucket is at capacity, so removals go through
/// `shift_remove` to keep the remaining order intact.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TokenBucket {
    entries: IndexMap<Token, u32>,
}

impl TokenBucket {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, token: &TokenRef) -> bool {
        self.entries.contains_key(token)
    }

    /// Usage count of a live token, `None` if the token is not in the bucket.
    #[must_use]
    pub fn usage(&self, token: &TokenRef) -> Option<u32> {
        self.entries.get(token).copied()
    }

    /// Live tokens in insertion order, oldest first.
    pub fn tokens(&self) -> impl Iterator<Item = &TokenRef> {
        self.entries.keys().map(|token| &**token)
    }

    /// Call `draw` until it yields a value not already in the bucket.
    ///
    /// Unbounded: with a 62-character alphabet the first draw collides
    /// with overwhelming improbability, and truncating the loop would
    /// trade that for silently reusing a live token.
    pub(crate) fn draw_unique<F>(&self, mut draw: F) -> Token
    where
        F: FnMut() -> Token,
    {
        loop {
            let candidate = draw();
            if !self.entries.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    pub(crate) fn evict_oldest(&mut self) -> Option<Token> {
        self.entries.shift_remove_index(0).map(|(token, _)| token)
    }

    pub(crate) fn insert_fresh(&mut self, token: Token) {
        self.entries.insert(token, 0);
    }

    /// Record one successful validation of `token`.
    ///
    /// Returns `false` without touching the bucket when the token is not
    /// present. Otherwise the usage count advances and the entry is
    /// removed once it reaches `max_usage`, after which the token can
    /// never validate again.
    pub(crate) fn consume(&mut self, token: &TokenRef, max_usage: NonZeroU32) -> bool {
        let Some(count) = self.entries.get_mut(token) else {
            return false;
        };

        *count += 1;
        if *count >= max_usage.get() {
            self.entries.shift_remove(token);
        }

        true
    }
}
