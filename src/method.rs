//! Matching of request methods against a handler's registered method patterns.

/// The method pattern that accepted a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMatch<'a> {
    /// The registered pattern that matched, `""` for a wildcard.
    pub value: &'a str,
    /// `false` when only the empty wildcard pattern accepted the method.
    pub is_exact: bool,
}

/// Finds the pattern in `patterns` accepting `method`.
///
/// A case-insensitive equal pattern wins immediately. An empty pattern is
/// remembered as a degraded match but scanning goes on, so a later exact
/// pattern still takes precedence.
///
/// ```rust
/// use ctrlrouter::method::match_method;
///
/// let found = match_method("get", &["", "GET"]).unwrap();
/// assert_eq!(found.value, "GET");
/// assert!(found.is_exact);
///
/// assert!(!match_method("DELETE", &[""]).unwrap().is_exact);
/// assert!(match_method("DELETE", &["GET", "POST"]).is_none());
/// ```
pub fn match_method<'a, S: AsRef<str>>(method: &str, patterns: &'a [S]) -> Option<MethodMatch<'a>> {
    let mut degraded = None;

    for pattern in patterns {
        let pattern = pattern.as_ref();
        if pattern.eq_ignore_ascii_case(method) && !pattern.is_empty() {
            return Some(MethodMatch {
                value: pattern,
                is_exact: true,
            });
        }
        if pattern.is_empty() && degraded.is_none() {
            degraded = Some(MethodMatch {
                value: pattern,
                is_exact: false,
            });
        }
    }

    degraded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_case_insensitive() {
        let found = match_method("post", &["GET", "POST"]).unwrap();
        assert_eq!(found, MethodMatch { value: "POST", is_exact: true });
    }

    #[test]
    fn wildcard_is_degraded() {
        let found = match_method("PATCH", &["GET", ""]).unwrap();
        assert_eq!(found, MethodMatch { value: "", is_exact: false });
    }

    #[test]
    fn later_exact_overrides_wildcard() {
        let patterns = vec![String::new(), "put".to_owned()];
        let found = match_method("PUT", &patterns).unwrap();
        assert!(found.is_exact);
        assert_eq!(found.value, "put");
    }

    #[test]
    fn no_candidate() {
        assert_eq!(match_method("DELETE", &["GET", "POST"]), None);
        assert_eq!(match_method::<&str>("GET", &[]), None);
    }
}
