//! Stylesheet collection from frontmatter `css` entries.

use std::path::Path;
use std::sync::LazyLock;

use docco_renderer::Stylesheet;
use docco_storage::{FragmentStore, StorageError, normalize_path};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;

static CSS_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(["']?([^)]+?)["']?\)"#).unwrap());

/// Characters kept as-is in `file://` URL paths.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b':')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn is_remote(entry: &str) -> bool {
    entry.starts_with("http://") || entry.starts_with("https://")
}

/// Collect the stylesheets named by `entries`.
///
/// `http(s)` entries become external links. Other entries are read relative
/// to `document_dir` and concatenated; a missing file is logged and skipped.
///
/// # Errors
///
/// Returns [`StorageError`] if an existing stylesheet cannot be read.
pub fn collect(
    store: &dyn FragmentStore,
    document_dir: &Path,
    entries: &[String],
) -> Result<Stylesheet, StorageError> {
    let mut stylesheet = Stylesheet::default();
    let mut inline = Vec::new();

    for entry in entries {
        if is_remote(entry) {
            tracing::debug!(url = %entry, "Using external stylesheet");
            stylesheet.external.push(entry.clone());
            continue;
        }

        let path = normalize_path(&document_dir.join(entry));
        let css = match store.read(&path) {
            Ok(css) => css,
            Err(e) if e.is_not_found() => {
                tracing::warn!(path = %path.display(), "CSS file not found");
                continue;
            }
            Err(e) => return Err(e),
        };

        let css = match store.local_path(&path) {
            Some(local) => absolutize_urls(&css, local.parent().unwrap_or(Path::new("/"))),
            None => css,
        };
        tracing::debug!(path = %path.display(), "Using stylesheet");
        inline.push(css);
    }

    stylesheet.inline = inline.join("\n");
    Ok(stylesheet)
}

/// Rewrite relative `url(...)` references in `css` to `file://` URLs
/// under `dir`. Remote, `file:` and `data:` URLs are left unchanged.
#[must_use]
pub fn absolutize_urls(css: &str, dir: &Path) -> String {
    CSS_URL_RE
        .replace_all(css, |caps: &regex::Captures<'_>| {
            let url = caps[1].trim_matches(|c| c == '"' || c == '\'' || c == ' ');
            if is_remote(url) || url.starts_with("file://") || url.starts_with("data:") {
                return caps[0].to_owned();
            }
            format!("url(\"{}\")", file_url(&normalize_path(&dir.join(url))))
        })
        .into_owned()
}

fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    let encoded = utf8_percent_encode(&path, PATH_ENCODE_SET);
    if path.starts_with('/') {
        format!("file://{encoded}")
    } else {
        format!("file:///{encoded}")
    }
}

#[cfg(test)]
mod tests {
    use docco_storage::{FsStore, MemoryStore};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_absolutize_relative_urls() {
        let css = r#"@font-face { src: url("fonts/Inter.woff2"); }
body { background: url('../img/bg.png'); }
h1 { background: url(icon.svg); }"#;
        assert_eq!(
            absolutize_urls(css, Path::new("/docs/styles")),
            r#"@font-face { src: url("file:///docs/styles/fonts/Inter.woff2"); }
body { background: url("file:///docs/img/bg.png"); }
h1 { background: url("file:///docs/styles/icon.svg"); }"#
        );
    }

    #[test]
    fn test_absolutize_keeps_absolute_urls() {
        let css = r#"a { b: url("https://x.example/a.png"); c: url(data:image/png;base64,AAAA); d: url(file:///x.png); }"#;
        assert_eq!(absolutize_urls(css, Path::new("/docs")), css);
    }

    #[test]
    fn test_absolutize_encodes_spaces() {
        assert_eq!(
            absolutize_urls("url(my font.woff)", Path::new("/my docs")),
            r#"url("file:///my%20docs/my%20font.woff")"#
        );
    }

    #[test]
    fn test_collect_separates_remote_and_local() {
        let store = MemoryStore::new().with_file("styles/base.css", "body { margin: 0; }");
        let entries = vec![
            "https://fonts.example.com/inter.css".to_owned(),
            "styles/base.css".to_owned(),
            "missing.css".to_owned(),
        ];
        let stylesheet = collect(&store, Path::new(""), &entries).unwrap();
        assert_eq!(
            stylesheet.external,
            vec!["https://fonts.example.com/inter.css"]
        );
        assert_eq!(stylesheet.inline, "body { margin: 0; }");
    }

    #[test]
    fn test_collect_concatenates_in_order() {
        let store = MemoryStore::new()
            .with_file("guide/a.css", "a {}")
            .with_file("shared/b.css", "b {}");
        let entries = vec!["a.css".to_owned(), "../shared/b.css".to_owned()];
        let stylesheet = collect(&store, Path::new("guide"), &entries).unwrap();
        assert_eq!(stylesheet.inline, "a {}\nb {}");
    }

    #[test]
    fn test_collect_absolutizes_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css/print.css"), "h1 { background: url(logo.png); }").unwrap();

        let store = FsStore::new(dir.path().to_path_buf());
        let stylesheet = collect(&store, Path::new(""), &["css/print.css".to_owned()]).unwrap();

        let css_dir = std::fs::canonicalize(dir.path().join("css")).unwrap();
        let expected = format!(
            "h1 {{ background: url(\"{}\"); }}",
            file_url(&css_dir.join("logo.png"))
        );
        assert_eq!(stylesheet.inline, expected);
        assert!(stylesheet.inline.contains("file:///"));
    }
}
