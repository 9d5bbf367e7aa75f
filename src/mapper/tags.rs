use crate::types::Tag;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Single-character tags are rejected.
pub const MIN_TAG_LEN: usize = 2;
pub const MAX_TAG_LEN: usize = 25;

static TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+( [a-z0-9]+)*$").expect("valid tag pattern"));

/// Lower-case, turn `-`/`_` into spaces, keep only tags data.world accepts.
/// Invalid tags are dropped; duplicates collapse. Output is sorted.
pub fn normalize_tags(tags: &[Tag]) -> Vec<String> {
    tags.iter()
        .filter_map(|tag| normalize_tag(&tag.name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn normalize_tag(name: &str) -> Option<String> {
    let cleaned = name.to_lowercase().replace(['-', '_'], " ");
    let len = cleaned.chars().count();
    if !(MIN_TAG_LEN..=MAX_TAG_LEN).contains(&len) {
        return None;
    }
    TAG_NAME.is_match(&cleaned).then_some(cleaned)
}
