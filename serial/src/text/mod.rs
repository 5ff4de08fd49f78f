//! Human-readable text format.
//!
//! Documents are [`TextNode`] element trees rendered as RON. Names are
//! checked on read, missing elements leave fields at their defaults and
//! container sizes are implied by the number of child elements.

mod node;
mod reader;
mod writer;

pub use node::TextNode;
pub use reader::TextReader;
pub use writer::TextWriter;
