//! # Slideshow Handoff Cache
//!
//! Photo lists can be too large to pass directly to the screen that hosts a
//! slideshow. The launching screen parks the list here under a fresh token
//! and hands over only the token. Entries live for the process lifetime
//! unless removed; the session removes its entry when it closes for good.

use crate::error::{Result, SlideshowError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// Opaque handle to a parked photo list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandoffToken(String);

impl HandoffToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accepts only tokens minted by [`generate`](Self::generate).
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(|id| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandoffToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-wide token to photo list map, safe to share across tasks.
#[derive(Debug, Default)]
pub struct HandoffCache {
    entries: RwLock<HashMap<HandoffToken, Vec<String>>>,
}

impl HandoffCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `uris` and return the token that retrieves them.
    pub fn put(&self, uris: Vec<String>) -> HandoffToken {
        let token = HandoffToken::generate();
        debug!(token = %token, photos = uris.len(), "Parked slideshow list");
        self.entries.write().insert(token.clone(), uris);
        token
    }

    /// Non-destructive read; the entry survives for later reads.
    pub fn get(&self, token: &HandoffToken) -> Option<Vec<String>> {
        self.entries.read().get(token).cloned()
    }

    /// Returns whether an entry was removed.
    pub fn remove(&self, token: &HandoffToken) -> bool {
        self.entries.write().remove(token).is_some()
    }

    /// Read and remove in one step.
    pub fn take(&self, token: &HandoffToken) -> Option<Vec<String>> {
        self.entries.write().remove(token)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Input handed to the slideshow screen: a cache token, a literal list, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideshowLaunch {
    pub token: Option<HandoffToken>,
    pub uris: Vec<String>,
}

impl SlideshowLaunch {
    /// Park `uris` in `cache` and launch by token only.
    pub fn via_cache(cache: &HandoffCache, uris: Vec<String>) -> Self {
        Self {
            token: Some(cache.put(uris)),
            uris: Vec::new(),
        }
    }

    pub fn literal(uris: Vec<String>) -> Self {
        Self { token: None, uris }
    }

    /// Literal list to use if the token no longer resolves.
    pub fn with_fallback(mut self, uris: Vec<String>) -> Self {
        self.uris = uris;
        self
    }

    /// Produce the ordered photo list for a session.
    ///
    /// The token wins when it resolves; otherwise the literal list is used.
    /// Unparsable URIs are dropped.
    ///
    /// # Errors
    /// `NoValidImages` when nothing usable remains.
    pub fn resolve(&self, cache: &HandoffCache) -> Result<Vec<String>> {
        let candidates = match self.token.as_ref().and_then(|token| cache.get(token)) {
            Some(uris) => uris,
            None => {
                if let Some(token) = &self.token {
                    debug!(token = %token, "Handoff token expired, using literal list");
                }
                self.uris.clone()
            }
        };

        let total = candidates.len();
        let valid: Vec<String> = candidates
            .into_iter()
            .filter(|uri| Url::parse(uri).is_ok())
            .collect();

        if valid.len() < total {
            warn!(dropped = total - valid.len(), "Dropped malformed slideshow URIs");
        }
        if valid.is_empty() {
            return Err(SlideshowError::NoValidImages);
        }
        Ok(valid)
    }
}
