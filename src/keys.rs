use crate::error::KvError;

/// Build a store key from an optional name and one or more elements.
///
/// With a name set the result is `name + delim + elements.join(delim)`. If the first
/// element already carries the `name + delim` prefix the name is not repeated.
/// Elements are joined as-is: an element that itself contains the delimiter is not
/// escaped, so `["a:b"]` and `["a", "b"]` compose to the same key.
pub fn compose<S: AsRef<str>>(name: Option<&str>, delim: &str, elements: &[S]) -> Result<String, KvError> {
    let first = elements.first().ok_or(KvError::EmptyKey)?;

    let mut parts: Vec<&str> = Vec::with_capacity(elements.len() + 1);
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        if !has_name_prefix(first.as_ref(), name, delim) {
            parts.push(name);
        }
    }
    parts.extend(elements.iter().map(AsRef::as_ref));

    Ok(parts.join(delim))
}

/// Prefix used for starts-with queries.
///
/// When `match_whole_element` is set the prefix ends with the delimiter, so `a:b`
/// matches `a:b:c` but not `a:bc`.
pub fn compose_prefix<S: AsRef<str>>(
    name: Option<&str>,
    delim: &str,
    elements: &[S],
    match_whole_element: bool,
) -> Result<String, KvError> {
    let mut prefix = compose(name, delim, elements)?;
    if match_whole_element {
        prefix.push_str(delim);
    }
    Ok(prefix)
}

/// The part of `full_key` after `prefix`. Keys that don't start with the prefix are
/// returned whole.
pub fn strip_prefix<'a>(full_key: &'a str, prefix: &str) -> &'a str {
    full_key.strip_prefix(prefix).unwrap_or(full_key)
}

fn has_name_prefix(element: &str, name: &str, delim: &str) -> bool {
    element
        .strip_prefix(name)
        .map(|rest| rest.starts_with(delim))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_with_name() {
        let key = compose(Some("n"), ":", &["a", "b", "c"]).unwrap();
        assert_eq!(key, "n:a:b:c");
    }

    #[test]
    fn test_compose_without_name() {
        assert_eq!(compose(None, ":", &["a", "b"]).unwrap(), "a:b");
        assert_eq!(compose(Some(""), ":", &["a", "b"]).unwrap(), "a:b");
    }

    #[test]
    fn test_compose_is_deterministic() {
        let a = compose(Some("cfg"), "/", &["job", "7"]).unwrap();
        let b = compose(Some("cfg"), "/", &["job", "7"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "cfg/job/7");
    }

    #[test]
    fn test_compose_rejects_empty_elements() {
        let empty: [&str; 0] = [];
        assert!(matches!(compose(Some("n"), ":", &empty), Err(KvError::EmptyKey)));
    }

    #[test]
    fn test_compose_does_not_repeat_name() {
        assert_eq!(compose(Some("n"), ":", &["n:a", "b"]).unwrap(), "n:a:b");
        // only a delimited match counts as the name
        assert_eq!(compose(Some("n"), ":", &["na", "b"]).unwrap(), "n:na:b");
    }

    #[test]
    fn test_compose_does_not_escape_delimiter() {
        let joined = compose(None, ":", &["a:b"]).unwrap();
        let split_up = compose(None, ":", &["a", "b"]).unwrap();
        assert_eq!(joined, split_up);
    }

    #[test]
    fn test_compose_prefix_whole_element() {
        let prefix = compose_prefix(None, ":", &["a", "b"], true).unwrap();
        assert_eq!(prefix, "a:b:");
        assert!(prefix.ends_with(':'));
    }

    #[test]
    fn test_compose_prefix_partial_element() {
        let prefix = compose_prefix(None, ":", &["a", "b"], false).unwrap();
        assert_eq!(prefix, "a:b");
        assert!(!prefix.ends_with(':'));
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("n:a:b:c", "n:a:"), "b:c");
        assert_eq!(strip_prefix("other", "n:a:"), "other");
    }
}
