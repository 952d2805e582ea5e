//! Directive expansion and language filtering for docco documents.
//!
//! Directives are HTML comments embedded in markdown source. This crate
//! handles the two text-level stages of the pipeline:
//!
//! 1. **Expansion** ([`Expander`]): recursively replaces
//!    `<!-- include:"path" key="value" -->` markers with fragment content,
//!    substituting `{{key}}` placeholders and applying per-kind
//!    post-processing ([`FragmentKind`]).
//!
//! 2. **Language filtering** ([`filter_language`]): keeps shared content and
//!    the `<!-- lang:CODE -->` blocks of one language.
//!
//! Markers inside fenced code blocks and inline code spans are never
//! interpreted ([`LiteralSpans`]).
//!
//! # Example
//!
//! ```
//! use docco_directives::filter_language;
//!
//! let text = "Hi<!-- lang:NL --> daar<!-- /lang --><!-- lang:EN --> there<!-- /lang -->";
//! assert_eq!(filter_language(text, "EN").unwrap(), "Hi there");
//! ```

mod args;
mod context;
mod error;
mod exec;
mod expander;
mod fragment;
mod language;
mod literal;
mod marker;
mod placeholder;

pub use args::DirectiveArgs;
pub use context::ExpansionContext;
pub use error::{ExpandError, FilterError};
pub use exec::ExecPolicy;
pub use expander::{Expander, ExpanderConfig, Expansion};
pub use fragment::{FragmentKind, Interpreters};
pub use language::{check_language_blocks, declared_languages, filter_language};
pub use literal::LiteralSpans;
pub use marker::{Directive, DirectiveKind, LayoutKind, parse_marker, scan};
pub use placeholder::{Substitution, substitute};
