//! Markup tree, heading numbering, page layout and render engines.
//!
//! The later stages of the docco pipeline work on a [`Markup`] tree rather
//! than on text:
//!
//! 1. [`convert`] parses expanded, language-filtered markdown into a tree
//!    whose text-bearing blocks carry serialized inline HTML.
//! 2. [`Numbering`] numbers headings and builds the [`Toc`].
//! 3. [`layout::annotate`] applies page breaks and orientation sections.
//! 4. A [`RenderEngine`] turns the tree and a [`Stylesheet`] into the output
//!    document.
//!
//! # Example
//!
//! ```
//! use docco_renderer::{Numbering, convert};
//!
//! let markup = convert("<!-- TOC -->\n\n# Intro\n## Scope\n");
//! let numbered = Numbering::default().number(markup);
//! assert_eq!(numbered.toc.entries().len(), 2);
//! assert!(numbered.markup.to_html().contains(r#"<span class="heading-number">1.1 </span>Scope"#));
//! ```

mod convert;
mod engine;
mod error;
pub mod layout;
mod markup;
mod numbering;
mod util;

pub use convert::{convert, options};
pub use engine::{CommandEngine, HtmlEngine, RenderEngine, Stylesheet, wrap_html};
pub use error::RenderError;
pub use layout::Orientation;
pub use markup::{Block, CodeBlock, Container, Heading, Markup, Marker, Section, TextBlock};
pub use numbering::{
    CounterState, HeadingNode, MAX_NUMBERED_LEVEL, Numbered, Numbering, NumberingConfig, Toc,
};
pub use util::{escape_html, plain_text, slugify};
