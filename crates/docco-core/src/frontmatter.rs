//! YAML frontmatter at the top of a document.
//!
//! ```text
//! ---
//! css: [style.css, https://fonts.example.com/inter.css]
//! multilingual: true
//! base_language: en
//! ---
//! # Document
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

/// Keys docco understands. Anything else is reported and ignored.
const KNOWN_KEYS: &[&str] = &["css", "dpi", "multilingual", "base_language"];

/// Document settings from frontmatter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Frontmatter {
    /// Stylesheets: paths relative to the document, or `http(s)` URLs.
    #[serde(deserialize_with = "one_or_many")]
    pub css: Vec<String>,
    /// Target image resolution passed on to the render engine.
    pub dpi: Option<u32>,
    /// Build one output per language.
    pub multilingual: bool,
    /// Language of the source text in multilingual mode.
    pub base_language: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}

/// Frontmatter error.
#[derive(Debug, thiserror::Error)]
#[error("Invalid YAML in frontmatter: {0}")]
pub struct FrontmatterError(String);

/// Split a document into its frontmatter and body.
///
/// Frontmatter is recognised only when the first line is `---` and a later
/// line closes it with `---`; otherwise the whole text is the body. Unknown
/// keys are logged as warnings.
///
/// # Errors
///
/// Returns [`FrontmatterError`] if the block is not a valid YAML mapping of
/// the known keys.
pub fn split(text: &str) -> Result<(Frontmatter, &str), FrontmatterError> {
    let Some((yaml, body)) = delimit(text) else {
        return Ok((Frontmatter::default(), text));
    };
    if yaml.trim().is_empty() {
        return Ok((Frontmatter::default(), body));
    }

    let raw: BTreeMap<String, serde_yaml::Value> =
        serde_yaml::from_str::<Option<BTreeMap<String, serde_yaml::Value>>>(yaml)
            .map_err(|e| FrontmatterError(e.to_string()))?
            .unwrap_or_default();

    let unknown: Vec<&str> = raw
        .keys()
        .map(String::as_str)
        .filter(|key| !KNOWN_KEYS.contains(key))
        .collect();
    if !unknown.is_empty() {
        tracing::warn!(
            keys = %unknown.join(", "),
            "Unknown frontmatter declaration(s)"
        );
    }

    let known: serde_yaml::Mapping = raw
        .into_iter()
        .filter(|(key, _)| KNOWN_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (serde_yaml::Value::String(key), value))
        .collect();
    let frontmatter = serde_yaml::from_value(serde_yaml::Value::Mapping(known))
        .map_err(|e| FrontmatterError(e.to_string()))?;
    Ok((frontmatter, body))
}

/// Locate the YAML block and the body after it.
fn delimit(text: &str) -> Option<(&str, &str)> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim() != "---" {
        return None;
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim() == "---" {
            return Some((&text[yaml_start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_no_frontmatter() {
        let (fm, body) = split("# Title\n").unwrap();
        assert_eq!(fm, Frontmatter::default());
        assert_eq!(body, "# Title\n");
    }

    #[test]
    fn test_unterminated_is_body() {
        let text = "---\ncss: a.css\n# Title\n";
        let (fm, body) = split(text).unwrap();
        assert_eq!(fm, Frontmatter::default());
        assert_eq!(body, text);
    }

    #[test]
    fn test_full_frontmatter() {
        let (fm, body) = split(
            "---\ncss:\n  - style.css\n  - https://fonts.example.com/a.css\ndpi: 300\nmultilingual: true\nbase_language: en\n---\n# Title\n",
        )
        .unwrap();
        assert_eq!(
            fm,
            Frontmatter {
                css: vec![
                    "style.css".to_owned(),
                    "https://fonts.example.com/a.css".to_owned()
                ],
                dpi: Some(300),
                multilingual: true,
                base_language: Some("en".to_owned()),
            }
        );
        assert_eq!(body, "# Title\n");
    }

    #[test]
    fn test_css_string() {
        let (fm, _) = split("---\ncss: style.css\n---\n").unwrap();
        assert_eq!(fm.css, vec!["style.css"]);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let (fm, body) = split("---\ntitle: Manual\nmultilingual: false\n---\nBody").unwrap();
        assert!(!fm.multilingual);
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_empty_block() {
        let (fm, body) = split("---\n---\nBody").unwrap();
        assert_eq!(fm, Frontmatter::default());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_invalid_yaml() {
        let err = split("---\ncss: [unclosed\n---\n").unwrap_err();
        assert!(err.to_string().starts_with("Invalid YAML in frontmatter"));
    }

    #[test]
    fn test_wrong_type() {
        assert!(split("---\ndpi: high\n---\n").is_err());
        assert!(split("---\n- a\n- b\n---\n").is_err());
    }

    #[test]
    fn test_crlf_delimiters() {
        let (fm, body) = split("---\r\nmultilingual: true\r\n---\r\nBody").unwrap();
        assert!(fm.multilingual);
        assert_eq!(body, "Body");
    }
}
