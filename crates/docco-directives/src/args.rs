//! Include argument parsing.
//!
//! Parses the `key="value" other='value' bare=value` tail of an include marker.

/// Ordered placeholder arguments of an include directive.
///
/// Order is preserved as written so that executable fragments receive
/// their `--key=value` flags in a stable order. A repeated key keeps its
/// first position and takes the last value.
///
/// # Example
///
/// ```
/// use docco_directives::DirectiveArgs;
///
/// let args = DirectiveArgs::parse(r#"name="Alice" count='3' unit=kg"#);
/// assert_eq!(args.get("name"), Some("Alice"));
/// assert_eq!(args.get("count"), Some("3"));
/// assert_eq!(args.get("unit"), Some("kg"));
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectiveArgs {
    pairs: Vec<(String, String)>,
}

impl DirectiveArgs {
    /// Parse an attribute string into ordered key-value pairs.
    ///
    /// Unrecognized characters between pairs are skipped.
    #[must_use]
    pub fn parse(attrs_str: &str) -> Self {
        let mut args = Self::default();
        let mut remaining = attrs_str.trim();

        while !remaining.is_empty() {
            remaining = remaining.trim_start();
            if remaining.is_empty() {
                break;
            }

            if let Some((key, value, rest)) = parse_key_value(remaining) {
                args.insert(key, value);
                remaining = rest;
            } else {
                // Skip to the next character boundary
                let skip = remaining.chars().next().map_or(1, char::len_utf8);
                remaining = &remaining[skip..];
            }
        }

        args
    }

    /// Insert or replace an argument.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.pairs.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.pairs.push((key, value));
        }
    }

    /// Get an argument value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(key, value)` pairs in written order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Argument keys in written order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Render as command-line flags: `--key=value`.
    #[must_use]
    pub fn to_flags(&self) -> Vec<String> {
        self.pairs
            .iter()
            .map(|(k, v)| format!("--{k}={v}"))
            .collect()
    }
}

/// Parse a key-value pair from the start of the attributes string.
///
/// Supports: `key="value"`, `key='value'`, `key=value`. Keys are word
/// characters only.
fn parse_key_value(s: &str) -> Option<(&str, &str, &str)> {
    let eq_pos = s.find('=')?;
    let key = s[..eq_pos].trim();

    if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    let after_eq = s[eq_pos + 1..].trim_start();

    if let Some(stripped) = after_eq.strip_prefix('"') {
        let end_quote = stripped.find('"')?;
        Some((key, &stripped[..end_quote], &stripped[end_quote + 1..]))
    } else if let Some(stripped) = after_eq.strip_prefix('\'') {
        let end_quote = stripped.find('\'')?;
        Some((key, &stripped[..end_quote], &stripped[end_quote + 1..]))
    } else {
        let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
        Some((key, &after_eq[..end], &after_eq[end..]))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_empty_args() {
        let args = DirectiveArgs::parse("");
        assert!(args.is_empty());
        assert_eq!(args.len(), 0);
    }

    #[test]
    fn test_double_quoted_value() {
        let args = DirectiveArgs::parse(r#"name="Alice""#);
        assert_eq!(args.get("name"), Some("Alice"));
    }

    #[test]
    fn test_value_with_spaces() {
        let args = DirectiveArgs::parse(r#"title="Hello World""#);
        assert_eq!(args.get("title"), Some("Hello World"));
    }

    #[test]
    fn test_empty_quoted_value() {
        let args = DirectiveArgs::parse(r#"alt="""#);
        assert_eq!(args.get("alt"), Some(""));
    }

    #[test]
    fn test_spaces_around_equals() {
        let args = DirectiveArgs::parse(r#"name = "Bob""#);
        assert_eq!(args.get("name"), Some("Bob"));
    }

    #[test]
    fn test_order_preserved() {
        let args = DirectiveArgs::parse(r#"b="2" a="1" c="3""#);
        assert_eq!(args.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_repeated_key_last_wins() {
        let args = DirectiveArgs::parse(r#"a="1" b="2" a="3""#);
        assert_eq!(args.len(), 2);
        assert_eq!(args.get("a"), Some("3"));
        assert_eq!(args.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_garbage_skipped() {
        let args = DirectiveArgs::parse(r#"!! name="x" ??"#);
        assert_eq!(args.len(), 1);
        assert_eq!(args.get("name"), Some("x"));
    }

    #[test]
    fn test_to_flags() {
        let args = DirectiveArgs::parse(r#"rows="3" title="A B""#);
        assert_eq!(args.to_flags(), vec!["--rows=3", "--title=A B"]);
    }

    #[test]
    fn test_get_nonexistent() {
        let args = DirectiveArgs::parse("foo=bar");
        assert_eq!(args.get("baz"), None);
    }
}
