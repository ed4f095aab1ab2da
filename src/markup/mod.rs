//! Markup parsing, transformation and serialization.
//!
//! Markup from any source is parsed leniently with html5ever into an
//! [`ArenaDom`]. Every transformation (sanitizing, resource rewriting) produces
//! a new tree rather than editing one in place.

mod arena;
mod sanitize;
mod serialize;
mod text;
mod tree_sink;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute};
pub use sanitize::sanitize;
pub use serialize::{TextPoint, TreeOrder, escape_attr, escape_text, inner_html, outer_html, serialize_range};
pub use text::{block_text, text_content};

pub(crate) use text::NON_RENDERED;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use tree_sink::DomBuilder;

/// Parse an HTML or XHTML document (or fragment) into an arena DOM.
///
/// Fragments are wrapped in `html`/`body` by the parser; use
/// [`ArenaDom::body`] to get back to the content.
pub fn parse_html(html: &str) -> ArenaDom {
    parse_document(DomBuilder::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
}
