//! Gettext PO/POT reader and writer.
//!
//! Supports the subset docco produces and CAT tools round-trip: a header
//! entry, translator comments, flags, `#|` previous msgids, obsolete `#~`
//! entries and multi-line strings. Contexts and plural forms are rejected.
//!
//! Output is normalized for version control: the header carries only the
//! content type, source references are dropped, and entries are sorted by
//! msgid.

use std::path::Path;

use docco_storage::StorageError;

use crate::catalog::{Catalog, TranslationUnit};
use crate::error::CatalogError;

const HEADER: &str = "msgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset=UTF-8\\n\"\n";

/// Which string a continuation line extends.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Previous,
    Msgid,
    Msgstr,
}

#[derive(Default)]
struct Entry {
    start_line: usize,
    obsolete: bool,
    unit: TranslationUnit,
    msgid: Option<String>,
    msgstr: Option<String>,
}

impl Entry {
    fn is_blank(&self) -> bool {
        self.msgid.is_none()
            && self.msgstr.is_none()
            && self.unit.comments.is_empty()
            && self.unit.flags.is_empty()
            && !self.unit.fuzzy
            && self.unit.previous.is_none()
    }
}

struct Parser<'a> {
    path: &'a Path,
    catalog: Catalog,
    entry: Entry,
    field: Field,
    line: usize,
}

/// Parse PO or POT text. `path` is used in error messages only.
///
/// # Errors
///
/// Returns [`CatalogError::MalformedCatalog`] with the offending line for
/// syntax errors, duplicate msgids, `msgctxt` and plural forms.
pub fn parse(text: &str, path: &Path) -> Result<Catalog, CatalogError> {
    let mut parser = Parser {
        path,
        catalog: Catalog::new(),
        entry: Entry::default(),
        field: Field::None,
        line: 0,
    };
    for (index, line) in text.lines().enumerate() {
        parser.line = index + 1;
        parser.line(line.trim_end())?;
    }
    parser.flush()?;
    Ok(parser.catalog)
}

impl Parser<'_> {
    fn error(&self, line: usize, message: impl Into<String>) -> CatalogError {
        CatalogError::MalformedCatalog {
            path: self.path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    fn line(&mut self, line: &str) -> Result<(), CatalogError> {
        if line.trim().is_empty() {
            return self.flush();
        }

        let (obsolete, body) = match line.strip_prefix("#~") {
            Some(rest) => (true, rest.trim_start()),
            None => (false, line),
        };
        if obsolete != self.entry.obsolete && self.entry.msgid.is_some() {
            self.flush()?;
        }
        if self.entry.is_blank() {
            self.entry.start_line = self.line;
        }
        // Comments and flags of an obsolete entry are written without `#~`;
        // the entry takes the state of its keyword lines.
        if self.entry.msgid.is_none() {
            self.entry.obsolete = obsolete;
        }

        let comment = match body.strip_prefix('#') {
            Some(comment) => Some(comment),
            // `#~| msgid "..."`
            None if obsolete && body.starts_with('|') => Some(body),
            None => None,
        };
        if let Some(comment) = comment {
            // A comment after a complete entry starts the next one
            if self.entry.msgstr.is_some() {
                self.flush()?;
                self.entry.obsolete = obsolete;
                self.entry.start_line = self.line;
            }
            return self.comment(comment);
        }
        self.keyword(body)
    }

    fn comment(&mut self, comment: &str) -> Result<(), CatalogError> {
        if let Some(flags) = comment.strip_prefix(',') {
            for flag in flags.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                if flag == "fuzzy" {
                    self.entry.unit.fuzzy = true;
                } else {
                    self.entry.unit.flags.push(flag.to_owned());
                }
            }
            self.field = Field::None;
        } else if let Some(previous) = comment.strip_prefix('|') {
            let previous = previous.trim();
            if let Some(value) = previous.strip_prefix("msgid ") {
                self.entry.unit.previous = Some(self.unquote(value)?);
                self.field = Field::Previous;
            } else if previous.starts_with('"') && self.field == Field::Previous {
                let value = self.unquote(previous)?;
                if let Some(prev) = &mut self.entry.unit.previous {
                    prev.push_str(&value);
                }
            }
            // Previous contexts and plurals carry nothing we keep
        } else if comment.starts_with('.') || comment.starts_with(':') {
            // Extracted comments and source references are regenerated
            self.field = Field::None;
        } else {
            let text = comment.strip_prefix(' ').unwrap_or(comment);
            self.entry.unit.comments.push(text.to_owned());
            self.field = Field::None;
        }
        Ok(())
    }

    fn keyword(&mut self, body: &str) -> Result<(), CatalogError> {
        if body.starts_with("msgctxt") {
            return Err(self.error(self.line, "msgctxt is not supported"));
        }
        if body.starts_with("msgid_plural") || body.starts_with("msgstr[") {
            return Err(self.error(self.line, "plural forms are not supported"));
        }

        if let Some(value) = body.strip_prefix("msgid ") {
            if self.entry.msgstr.is_some() {
                let obsolete = self.entry.obsolete;
                self.flush()?;
                self.entry.obsolete = obsolete;
                self.entry.start_line = self.line;
            } else if self.entry.msgid.is_some() {
                return Err(self.error(self.line, "msgid without msgstr"));
            }
            self.entry.msgid = Some(self.unquote(value)?);
            self.field = Field::Msgid;
        } else if let Some(value) = body.strip_prefix("msgstr ") {
            if self.entry.msgid.is_none() {
                return Err(self.error(self.line, "msgstr without msgid"));
            }
            if self.entry.msgstr.is_some() {
                return Err(self.error(self.line, "duplicate msgstr"));
            }
            self.entry.msgstr = Some(self.unquote(value)?);
            self.field = Field::Msgstr;
        } else if body.starts_with('"') {
            let value = self.unquote(body)?;
            let target = match self.field {
                Field::Msgid => self.entry.msgid.as_mut(),
                Field::Msgstr => self.entry.msgstr.as_mut(),
                Field::Previous | Field::None => None,
            };
            let Some(target) = target else {
                return Err(self.error(self.line, "string continuation without a keyword"));
            };
            target.push_str(&value);
        } else {
            return Err(self.error(self.line, format!("unexpected line: {body}")));
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), CatalogError> {
        let entry = std::mem::take(&mut self.entry);
        self.field = Field::None;

        let Some(msgid) = entry.msgid else {
            // Comments with no entry attached
            return Ok(());
        };
        let Some(msgstr) = entry.msgstr else {
            return Err(self.error(entry.start_line, "msgid without msgstr"));
        };
        if msgid.is_empty() {
            // Header entry; rewritten on output
            return Ok(());
        }

        let unit = TranslationUnit {
            msgid,
            msgstr,
            ..entry.unit
        };
        if entry.obsolete {
            self.catalog.insert_obsolete(unit);
        } else {
            if self.catalog.contains(&unit.msgid) {
                return Err(self.error(
                    entry.start_line,
                    format!("duplicate msgid \"{}\"", escape(&unit.msgid)),
                ));
            }
            self.catalog.insert(unit);
        }
        Ok(())
    }

    fn unquote(&self, value: &str) -> Result<String, CatalogError> {
        let value = value.trim();
        let inner = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .filter(|_| value.len() >= 2)
            .ok_or_else(|| self.error(self.line, format!("expected a quoted string: {value}")))?;

        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    other => {
                        return Err(self.error(
                            self.line,
                            format!("invalid escape \\{}", other.map(String::from).unwrap_or_default()),
                        ));
                    }
                },
                '"' => return Err(self.error(self.line, "unescaped quote in string")),
                c => out.push(c),
            }
        }
        Ok(out)
    }
}

/// Read a catalog from a file outside any fragment store.
///
/// The language is taken from the file stem, uppercased (`nl.po` is `NL`).
///
/// # Errors
///
/// Returns [`CatalogError::Storage`] if the file can't be read, or
/// [`CatalogError::MalformedCatalog`] if it doesn't parse.
pub fn read_file(path: &Path) -> Result<Catalog, CatalogError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| StorageError::io(e, Some(path.to_path_buf())))?;
    let language = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default();
    Ok(parse(&text, path)?.with_language(language))
}

/// Serialize a catalog.
///
/// Entries are sorted by msgid and separated by blank lines; obsolete
/// entries follow the active ones.
#[must_use]
pub fn to_string(catalog: &Catalog) -> String {
    let mut out = String::from(HEADER);
    for unit in catalog.units() {
        out.push('\n');
        write_unit(&mut out, unit, "");
    }
    for unit in catalog.obsolete() {
        out.push('\n');
        write_unit(&mut out, unit, "#~ ");
    }
    out
}

fn write_unit(out: &mut String, unit: &TranslationUnit, prefix: &str) {
    for comment in &unit.comments {
        if comment.is_empty() {
            out.push_str("#\n");
        } else {
            out.push_str("# ");
            out.push_str(comment);
            out.push('\n');
        }
    }
    let mut flags: Vec<&str> = Vec::new();
    if unit.fuzzy {
        flags.push("fuzzy");
    }
    flags.extend(unit.flags.iter().map(String::as_str));
    if !flags.is_empty() {
        out.push_str("#, ");
        out.push_str(&flags.join(", "));
        out.push('\n');
    }
    if let Some(previous) = &unit.previous {
        let previous_prefix = if prefix.is_empty() { "#| " } else { "#~| " };
        write_string(out, previous_prefix, "msgid", previous);
    }
    write_string(out, prefix, "msgid", &unit.msgid);
    write_string(out, prefix, "msgstr", &unit.msgstr);
}

/// Write `keyword "value"`, splitting after embedded newlines.
fn write_string(out: &mut String, prefix: &str, keyword: &str, value: &str) {
    let lines: Vec<&str> = value.split_inclusive('\n').collect();
    if lines.len() <= 1 {
        out.push_str(&format!("{prefix}{keyword} \"{}\"\n", escape(value)));
        return;
    }
    out.push_str(&format!("{prefix}{keyword} \"\"\n"));
    for line in lines {
        out.push_str(&format!("{prefix}\"{}\"\n", escape(line)));
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}
