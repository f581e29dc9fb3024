//! A tiny TTL cache keyed by `(page_fingerprint, target, action)`, per
//! spec.md §4.4: "The adapter may cache results keyed by (page_fingerprint,
//! target, action) for a configurable TTL."

use std::collections::HashMap;
use std::time::{Duration, Instant};

use runner_core_types::ActionKind;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CacheKey {
    pub page_fingerprint: String,
    pub target: String,
    pub action: ActionKind,
}

struct Entry {
    selector: Option<String>,
    expires_at: Instant,
}

pub struct TtlCache {
    ttl: Duration,
    entries: HashMap<CacheKey, Entry>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<Option<String>> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.selector.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&mut self, key: CacheKey, selector: Option<String>) {
        self.entries.insert(
            key,
            Entry {
                selector,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}
