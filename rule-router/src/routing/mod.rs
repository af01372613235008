//! Topic matching: pattern grammar, wildcard trie and the rule index.
//!
//! The index maps a concrete incoming topic to the set of rules whose
//! patterns match it in O(depth + matches): exact patterns live in a hash
//! map, wildcard patterns in a segment trie with `+` and `#` as reserved
//! child keys.

mod topic_filter;
mod topic_index;
mod topic_trie;

pub use topic_filter::{
    contains_wildcard, pattern_matches, split_segments, validate_pattern, validate_topic,
    MULTI_LEVEL_WILDCARD, SINGLE_LEVEL_WILDCARD,
};
pub use topic_index::{IndexStats, TopicIndex};
