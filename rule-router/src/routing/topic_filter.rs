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

//! Topic grammar: segment splitting, wildcard placement, direct matching.
//!
//! A topic is a `/`-separated sequence of segments. Patterns allow two
//! wildcards: `+` matches exactly one segment and must be the entire
//! segment; `#` matches one or more trailing segments and must be the final
//! segment. Leading and trailing `/` produce empty edge segments, which are
//! permitted everywhere; empty middle segments are forbidden in concrete
//! published topics but permitted in filter patterns.

use crate::errors::RouterError;

/// Matches exactly one segment.
pub const SINGLE_LEVEL_WILDCARD: &str = "+";
/// Matches one or more trailing segments.
pub const MULTI_LEVEL_WILDCARD: &str = "#";

/// Splits a topic into its segments. The empty topic has one empty segment.
pub fn split_segments(topic: &str) -> Vec<&str> {
    topic.split('/').collect()
}

/// True when the pattern carries at least one wildcard segment.
pub fn contains_wildcard(pattern: &str) -> bool {
    pattern
        .split('/')
        .any(|segment| segment == SINGLE_LEVEL_WILDCARD || segment == MULTI_LEVEL_WILDCARD)
}

/// Validates wildcard placement in a filter pattern.
pub fn validate_pattern(pattern: &str) -> Result<(), RouterError> {
    if pattern.is_empty() {
        return Err(invalid(pattern, "pattern cannot be empty"));
    }

    let segments = split_segments(pattern);
    let last = segments.len() - 1;
    for (i, segment) in segments.iter().enumerate() {
        if segment.contains('#') {
            if *segment != MULTI_LEVEL_WILDCARD {
                return Err(invalid(pattern, "`#` must occupy an entire segment"));
            }
            if i != last {
                return Err(invalid(pattern, "`#` must be the last segment"));
            }
        }
        if segment.contains('+') && *segment != SINGLE_LEVEL_WILDCARD {
            return Err(invalid(pattern, "`+` must occupy an entire segment"));
        }
    }

    Ok(())
}

/// Validates a concrete published topic: no wildcards, no empty middle
/// segments.
pub fn validate_topic(topic: &str) -> Result<(), RouterError> {
    if topic.is_empty() {
        return Err(invalid(topic, "topic cannot be empty"));
    }
    if contains_wildcard(topic) {
        return Err(invalid(topic, "wildcards are not allowed in a concrete topic"));
    }

    let segments = split_segments(topic);
    let last = segments.len() - 1;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() && i != 0 && i != last {
            return Err(invalid(topic, "empty middle segments are not allowed"));
        }
    }

    Ok(())
}

/// Direct pattern-against-topic match, used where no index is warranted
/// (per-subscription dispatch in the in-process broker).
pub fn pattern_matches(pattern: &str, topic: &str) -> bool {
    let pattern_segments = split_segments(pattern);
    let topic_segments = split_segments(topic);

    for (i, pattern_segment) in pattern_segments.iter().enumerate() {
        if *pattern_segment == MULTI_LEVEL_WILDCARD {
            // `#` needs at least one remaining topic segment.
            return topic_segments.len() > i;
        }
        let Some(topic_segment) = topic_segments.get(i) else {
            return false;
        };
        if *pattern_segment != SINGLE_LEVEL_WILDCARD && pattern_segment != topic_segment {
            return false;
        }
    }

    pattern_segments.len() == topic_segments.len()
}

fn invalid(pattern: &str, reason: &str) -> RouterError {
    RouterError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}
