/// Checks if a URL path matches a glob-style path pattern
///
/// Two wildcards are supported:
/// 1. `*` matches any run of characters within a single path segment
/// 2. `**` (as a whole segment) matches zero or more path segments
///
/// Trailing slashes are insignificant: `/docs` and `/docs/` match the same
/// patterns.
///
/// # Examples
///
/// ```
/// use pagewalk::url::matches_path_pattern;
///
/// assert!(matches_path_pattern("/docs/*", "/docs/intro"));
/// assert!(!matches_path_pattern("/docs/*", "/docs/guide/setup"));
/// assert!(matches_path_pattern("/docs/**", "/docs/guide/setup"));
/// assert!(matches_path_pattern("/*.html", "/index.html"));
/// ```
pub fn matches_path_pattern(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match_segments(&pattern_segments, &path_segments)
}

/// Matches pattern segments against path segments recursively
fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => {
            // `**` may swallow zero or more leading path segments
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((first, rest)) => match path.split_first() {
            Some((segment, remaining)) => {
                match_segment(first, segment) && match_segments(rest, remaining)
            }
            None => false,
        },
    }
}

/// Matches a single segment with `*` wildcards
fn match_segment(pattern: &str, segment: &str) -> bool {
    let pattern_bytes = pattern.as_bytes();
    let segment_bytes = segment.as_bytes();
    match_bytes(pattern_bytes, segment_bytes)
}

fn match_bytes(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((b'*', rest)) => (0..=text.len()).any(|skip| match_bytes(rest, &text[skip..])),
        Some((c, rest)) => match text.split_first() {
            Some((t, trest)) => c == t && match_bytes(rest, trest),
            None => false,
        },
    }
}
