//! Segment-wise matching of request paths against `/`-delimited patterns.
//!
//! A pattern segment is either a literal or a single-segment placeholder
//! written `{name}`, where `name` consists of ASCII alphanumerics and `_`:
//! ```ignore
//!  Pattern: /info/{user}
//!
//!  /info/alice          match: user="alice"
//!  /info/               match: user=""
//!  /info/a/b/c          no match (exact length)
//! ```
//! Paths are compared as the transport hands them over; nothing is
//! percent-decoded or cleaned. Doubled slashes are kept, so `//api` has an
//! empty segment where `/api` has none and the two never match each other.

/// Returns whether `segment` is a `{name}` placeholder.
pub fn is_placeholder(segment: &str) -> bool {
    placeholder_name(segment).is_some()
}

fn placeholder_name(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix('{')?.strip_suffix('}')?;
    if !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        Some(name)
    } else {
        None
    }
}

/// Matches `path` against `pattern`.
///
/// With `exact_length` set both must have the same number of segments;
/// otherwise `pattern` only has to match a leading run of `path`'s
/// segments. An empty pattern never matches. In prefix mode every pattern
/// segment needs a path segment to match against, placeholders included:
/// `/tenant/{id}` does not match `/tenant`.
///
/// ```rust
/// use ctrlrouter::path::matches;
///
/// assert!(matches("/info/alice", "/info/{user}", true));
/// assert!(!matches("/info/a/b/c", "/info/{user}", true));
/// assert!(matches("/api/info/alice", "/api", false));
/// assert!(!matches("/api", "", false));
/// assert!(!matches("/tenant", "/tenant/{id}", false));
/// ```
pub fn matches(path: &str, pattern: &str, exact_length: bool) -> bool {
    if pattern.is_empty() {
        return false;
    }

    let mut path_segments = path.split('/');
    let mut pattern_segments = pattern.split('/');
    if exact_length && path.split('/').count() != pattern.split('/').count() {
        return false;
    }

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, _) => return true,
            (Some(_), None) => return false,
            (Some(rule), Some(segment)) => {
                if rule != segment && !is_placeholder(rule) {
                    return false;
                }
            }
        }
    }
}

/// Removes the leading segments of `path` covered by `prefix`.
///
/// `prefix` must already match `path` in prefix mode; the result is the
/// remainder starting at the separator that follows the prefix, or the
/// empty string when the whole path was consumed.
pub fn strip_prefix<'p>(path: &'p str, prefix: &str) -> &'p str {
    if prefix.is_empty() {
        return path;
    }

    let count = prefix.split('/').count();
    let consumed: usize = path.split('/').take(count).map(str::len).sum::<usize>() + count - 1;
    path.get(consumed.min(path.len())..).unwrap_or("")
}

/// Resolves placeholder `key` of `pattern` against the concrete `path`.
///
/// The segment aligned with the placeholder is returned. When a name occurs
/// more than once the last occurrence wins.
pub fn param<'p>(pattern: &str, path: &'p str, key: &str) -> Option<&'p str> {
    let position = pattern
        .split('/')
        .enumerate()
        .filter(|(_, segment)| placeholder_name(segment) == Some(key))
        .map(|(index, _)| index)
        .last()?;

    path.split('/').nth(position)
}
