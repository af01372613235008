/********************************************************************************
 * Copyright (c) 2025 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Rule index: exact-match map plus wildcard trie behind one writer lock.

use crate::errors::RouterError;
use crate::observability::events;
use crate::routing::topic_filter::{contains_wildcard, split_segments, validate_pattern};
use crate::routing::topic_trie::TopicTrie;
use crate::rule::Rule;
use metrics::{counter, gauge};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

const COMPONENT: &str = "topic_index";

#[derive(Default)]
struct IndexInner {
    exact: HashMap<String, Vec<Arc<Rule>>>,
    wildcard: TopicTrie,
}

/// Snapshot of index statistics. `lookups` and `matches` are monotonic
/// process-lifetime totals; the rule counts track current contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub rules: u64,
    pub wildcard_rules: u64,
    pub lookups: u64,
    pub matches: u64,
}

/// Maps a concrete incoming topic to the set of rules whose patterns match
/// it. Finds take the read side of the lock and run concurrently; add,
/// remove and clear are writer-exclusive, so a find that starts before a
/// mutation completes observes either the pre-state or the post-state.
pub struct TopicIndex {
    inner: RwLock<IndexInner>,
    rules: AtomicU64,
    wildcard_rules: AtomicU64,
    lookups: AtomicU64,
    matches: AtomicU64,
}

impl TopicIndex {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(IndexInner::default()),
            rules: AtomicU64::new(0),
            wildcard_rules: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
            matches: AtomicU64::new(0),
        }
    }

    /// Installs a rule. Exact patterns go to the hash map, wildcard patterns
    /// to the trie. Fails with `InvalidPattern` on ill-placed wildcards.
    pub fn add(&self, rule: Arc<Rule>) -> Result<(), RouterError> {
        validate_pattern(&rule.topic)?;
        let wildcard = contains_wildcard(&rule.topic);

        {
            let mut inner = self.inner.write();
            if wildcard {
                inner.wildcard.insert(rule.clone())?;
            } else {
                inner.exact.entry(rule.topic.clone()).or_default().push(rule.clone());
            }
        }

        if wildcard {
            self.wildcard_rules.fetch_add(1, Ordering::Relaxed);
        }
        let active = self.rules.fetch_add(1, Ordering::Relaxed) + 1;
        gauge!("rules_active").set(active as f64);

        debug!(
            event = events::INDEX_RULE_ADD,
            component = COMPONENT,
            pattern = rule.topic.as_str(),
            wildcard,
            "rule added to index"
        );
        Ok(())
    }

    /// Removes a rule by handle identity and prunes emptied buckets.
    pub fn remove(&self, rule: &Arc<Rule>) -> Result<(), RouterError> {
        let wildcard = contains_wildcard(&rule.topic);

        {
            let mut inner = self.inner.write();
            if wildcard {
                inner.wildcard.remove(rule)?;
            } else {
                let bucket = inner.exact.get_mut(&rule.topic).ok_or_else(|| {
                    RouterError::RuleNotFound {
                        pattern: rule.topic.clone(),
                    }
                })?;
                let before = bucket.len();
                bucket.retain(|candidate| !Arc::ptr_eq(candidate, rule));
                if bucket.len() == before {
                    return Err(RouterError::RuleNotFound {
                        pattern: rule.topic.clone(),
                    });
                }
                if bucket.is_empty() {
                    inner.exact.remove(&rule.topic);
                }
            }
        }

        if wildcard {
            self.wildcard_rules.fetch_sub(1, Ordering::Relaxed);
        }
        let active = self.rules.fetch_sub(1, Ordering::Relaxed) - 1;
        gauge!("rules_active").set(active as f64);

        debug!(
            event = events::INDEX_RULE_REMOVE,
            component = COMPONENT,
            pattern = rule.topic.as_str(),
            wildcard,
            "rule removed from index"
        );
        Ok(())
    }

    /// Returns all rules matching `topic` in deterministic order: exact
    /// matches first, then wildcard matches with more specific patterns
    /// before less specific ones; insertion order within a bucket.
    pub fn find(&self, topic: &str) -> Vec<Arc<Rule>> {
        let mut matches = Vec::new();
        self.find_into(topic, &mut matches);
        matches
    }

    /// `find` variant that appends into a caller-owned buffer, so the hot
    /// path can reuse pooled allocations.
    pub fn find_into(&self, topic: &str, matches: &mut Vec<Arc<Rule>>) {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        {
            let inner = self.inner.read();
            if let Some(bucket) = inner.exact.get(topic) {
                matches.extend(bucket.iter().cloned());
            }
            inner
                .wildcard
                .collect_matches(&split_segments(topic), matches);
        }

        if !matches.is_empty() {
            self.matches.fetch_add(1, Ordering::Relaxed);
            counter!("rule_matches_total").increment(1);
        }
    }

    /// Drops all rules and resets statistics except the monotonic totals.
    pub fn clear(&self) {
        {
            let mut inner = self.inner.write();
            inner.exact.clear();
            inner.wildcard.clear();
        }
        self.rules.store(0, Ordering::Relaxed);
        self.wildcard_rules.store(0, Ordering::Relaxed);
        gauge!("rules_active").set(0.0);

        debug!(event = events::INDEX_CLEARED, component = COMPONENT, "rule index cleared");
    }

    pub fn len(&self) -> usize {
        self.rules.load(Ordering::Relaxed) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            rules: self.rules.load(Ordering::Relaxed),
            wildcard_rules: self.wildcard_rules.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
        }
    }
}

impl Default for TopicIndex {
    fn default() -> Self {
        Self::new()
    }
}
