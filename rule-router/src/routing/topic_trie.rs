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

//! Segment trie for wildcard topic patterns.
//!
//! `+` and `#` are reserved child keys rather than node variants, which keeps
//! matching a plain key-lookup loop. Node rules are emitted only at full
//! depth, except `#` nodes, which emit at any depth at or past their own.

use crate::errors::RouterError;
use crate::routing::topic_filter::{
    split_segments, MULTI_LEVEL_WILDCARD, SINGLE_LEVEL_WILDCARD,
};
use crate::rule::Rule;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub(crate) struct TopicNode {
    rules: Vec<Arc<Rule>>,
    children: HashMap<String, TopicNode>,
}

impl TopicNode {
    fn is_prunable(&self) -> bool {
        self.rules.is_empty() && self.children.is_empty()
    }
}

/// Trie over wildcard patterns. Synchronization is the index's concern.
#[derive(Debug, Default)]
pub(crate) struct TopicTrie {
    root: TopicNode,
}

impl TopicTrie {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a wildcard rule, creating nodes as needed. The pattern is
    /// assumed pre-validated by [`validate_pattern`]; placement is still
    /// enforced here so a direct insert cannot corrupt the trie.
    ///
    /// [`validate_pattern`]: crate::routing::validate_pattern
    pub(crate) fn insert(&mut self, rule: Arc<Rule>) -> Result<(), RouterError> {
        let segments = split_segments(&rule.topic);
        let last = segments.len() - 1;

        let mut current = &mut self.root;
        for (i, segment) in segments.iter().enumerate() {
            if *segment == MULTI_LEVEL_WILDCARD && i != last {
                return Err(RouterError::InvalidPattern {
                    pattern: rule.topic.clone(),
                    reason: "`#` must be the last segment".to_string(),
                });
            }
            if segment.contains('+') && *segment != SINGLE_LEVEL_WILDCARD {
                return Err(RouterError::InvalidPattern {
                    pattern: rule.topic.clone(),
                    reason: "`+` must occupy an entire segment".to_string(),
                });
            }

            current = current.children.entry(segment.to_string()).or_default();
        }

        current.rules.push(rule);
        Ok(())
    }

    /// Removes a rule by handle identity and prunes emptied branches.
    pub(crate) fn remove(&mut self, rule: &Arc<Rule>) -> Result<(), RouterError> {
        let segments = split_segments(&rule.topic);
        Self::remove_at(&mut self.root, &segments, rule)
    }

    fn remove_at(
        node: &mut TopicNode,
        segments: &[&str],
        rule: &Arc<Rule>,
    ) -> Result<(), RouterError> {
        let not_found = || RouterError::RuleNotFound {
            pattern: rule.topic.clone(),
        };

        let Some((segment, rest)) = segments.split_first() else {
            let before = node.rules.len();
            node.rules.retain(|candidate| !Arc::ptr_eq(candidate, rule));
            return if node.rules.len() < before {
                Ok(())
            } else {
                Err(not_found())
            };
        };

        let child = node.children.get_mut(*segment).ok_or_else(not_found)?;
        Self::remove_at(child, rest, rule)?;

        if child.is_prunable() {
            node.children.remove(*segment);
        }
        Ok(())
    }

    /// Collects every rule whose pattern matches the topic segments, in
    /// traversal order: exact child, then `+`, then `#` at each node.
    pub(crate) fn collect_matches(&self, segments: &[&str], matches: &mut Vec<Arc<Rule>>) {
        Self::collect_at(&self.root, segments, matches);
    }

    fn collect_at(node: &TopicNode, segments: &[&str], matches: &mut Vec<Arc<Rule>>) {
        let Some((segment, rest)) = segments.split_first() else {
            matches.extend(node.rules.iter().cloned());
            return;
        };

        if let Some(child) = node.children.get(*segment) {
            Self::collect_at(child, rest, matches);
        }
        if let Some(child) = node.children.get(SINGLE_LEVEL_WILDCARD) {
            Self::collect_at(child, rest, matches);
        }
        if let Some(child) = node.children.get(MULTI_LEVEL_WILDCARD) {
            // `#` consumes all remaining segments; at least one remains here.
            matches.extend(child.rules.iter().cloned());
        }
    }

    pub(crate) fn clear(&mut self) {
        self.root = TopicNode::default();
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.root.is_prunable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Action, Rule};
    use chrono::Utc;

    fn rule(pattern: &str) -> Arc<Rule> {
        Arc::new(Rule {
            topic: pattern.to_string(),
            source_broker: None,
            description: None,
            enabled: true,
            conditions: None,
            action: Action {
                topic: "out".to_string(),
                target_broker: None,
                payload: String::new(),
                qos: 0,
                retain: false,
                headers: None,
            },
            priority: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    fn find(trie: &TopicTrie, topic: &str) -> Vec<String> {
        let mut matches = Vec::new();
        trie.collect_matches(&split_segments(topic), &mut matches);
        matches.iter().map(|r| r.topic.clone()).collect()
    }

    #[test]
    fn single_level_wildcard_matches_exactly_one_segment() {
        let mut trie = TopicTrie::new();
        trie.insert(rule("sensors/+/temperature")).unwrap();

        assert_eq!(find(&trie, "sensors/room1/temperature"), ["sensors/+/temperature"]);
        assert!(find(&trie, "sensors/room1/humidity").is_empty());
        assert!(find(&trie, "sensors/room1/floor2/temperature").is_empty());
        assert!(find(&trie, "sensors/temperature").is_empty());
    }

    #[test]
    fn multi_level_wildcard_matches_any_deeper_topic() {
        let mut trie = TopicTrie::new();
        trie.insert(rule("sensors/#")).unwrap();

        assert_eq!(find(&trie, "sensors/a"), ["sensors/#"]);
        assert_eq!(find(&trie, "sensors/a/b/c"), ["sensors/#"]);
        assert!(find(&trie, "sensors").is_empty());
        assert!(find(&trie, "other/a").is_empty());
    }

    #[test]
    fn hash_alone_matches_everything_including_the_empty_topic() {
        let mut trie = TopicTrie::new();
        trie.insert(rule("#")).unwrap();

        assert_eq!(find(&trie, "a"), ["#"]);
        assert_eq!(find(&trie, "a/b/c"), ["#"]);
        assert_eq!(find(&trie, ""), ["#"]);
    }

    #[test]
    fn more_specific_patterns_precede_less_specific_ones() {
        let mut trie = TopicTrie::new();
        trie.insert(rule("sensors/room1/+")).unwrap();
        trie.insert(rule("sensors/+/temperature")).unwrap();
        trie.insert(rule("sensors/#")).unwrap();

        assert_eq!(
            find(&trie, "sensors/room1/temperature"),
            ["sensors/room1/+", "sensors/+/temperature", "sensors/#"]
        );
    }

    #[test]
    fn insertion_order_is_preserved_within_one_pattern() {
        let mut trie = TopicTrie::new();
        let first = rule("sensors/+");
        let second = rule("sensors/+");
        trie.insert(first.clone()).unwrap();
        trie.insert(second.clone()).unwrap();

        let mut matches = Vec::new();
        trie.collect_matches(&split_segments("sensors/a"), &mut matches);
        assert!(Arc::ptr_eq(&matches[0], &first));
        assert!(Arc::ptr_eq(&matches[1], &second));
    }

    #[test]
    fn insert_rejects_ill_placed_wildcards() {
        let mut trie = TopicTrie::new();
        assert!(trie.insert(rule("sensors/#/more")).is_err());
        assert!(trie.insert(rule("sensors/temp+")).is_err());
    }

    #[test]
    fn remove_prunes_empty_branches() {
        let mut trie = TopicTrie::new();
        let kept = rule("sensors/+/temperature");
        let removed = rule("sensors/+/deep/humidity");
        trie.insert(kept.clone()).unwrap();
        trie.insert(removed.clone()).unwrap();

        trie.remove(&removed).unwrap();

        assert_eq!(find(&trie, "sensors/x/temperature"), ["sensors/+/temperature"]);
        assert!(find(&trie, "sensors/x/deep/humidity").is_empty());

        trie.remove(&kept).unwrap();
        assert!(trie.is_empty());
    }

    #[test]
    fn remove_of_unknown_rule_reports_not_found() {
        let mut trie = TopicTrie::new();
        trie.insert(rule("sensors/+")).unwrap();

        let stranger = rule("sensors/+");
        assert!(matches!(
            trie.remove(&stranger),
            Err(RouterError::RuleNotFound { .. })
        ));
        let missing_path = rule("other/+");
        assert!(trie.remove(&missing_path).is_err());
    }
}
