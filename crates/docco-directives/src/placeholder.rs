//! `{{name}}` placeholder substitution.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::args::DirectiveArgs;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").unwrap());

/// Result of substituting arguments into fragment text.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Substitution {
    /// Text with every placeholder replaced.
    pub text: String,
    /// Arguments that matched no placeholder.
    pub unused: Vec<String>,
    /// Placeholders with no matching argument (replaced by empty string).
    pub unfulfilled: Vec<String>,
}

/// Replace every `{{name}}` in `text` with the matching argument.
///
/// Placeholders without an argument resolve to the empty string, which
/// makes them optional.
#[must_use]
pub fn substitute(text: &str, args: &DirectiveArgs) -> Substitution {
    let mut used = BTreeSet::new();
    let mut unfulfilled = BTreeSet::new();

    let replaced = PLACEHOLDER_RE.replace_all(text, |caps: &Captures<'_>| {
        let name = &caps[1];
        if let Some(value) = args.get(name) {
            used.insert(name.to_owned());
            value.to_owned()
        } else {
            unfulfilled.insert(name.to_owned());
            String::new()
        }
    });

    Substitution {
        text: replaced.into_owned(),
        unused: args
            .keys()
            .filter(|k| !used.contains(*k))
            .map(str::to_owned)
            .collect(),
        unfulfilled: unfulfilled.into_iter().collect(),
    }
}
