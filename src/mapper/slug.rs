/// data.world rejects identifiers outside this range.
const MIN_SLUG_LEN: usize = 2;
const MAX_SLUG_LEN: usize = 100;

/// URL-safe identifier derived from a dataset title: whitespace collapsed,
/// spaces and underscores turned into hyphens, runs of hyphens squeezed,
/// lower-cased, anything outside `[a-z0-9-]` replaced.
pub fn dataworld_name(title: &str) -> String {
    let spaced = title.split_whitespace().collect::<Vec<_>>().join(" ");
    let hyphenated: String = spaced
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '-',
        })
        .collect();
    let mut slug = hyphenated
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    while slug.len() < MIN_SLUG_LEN {
        slug.push('_');
    }
    slug
}
