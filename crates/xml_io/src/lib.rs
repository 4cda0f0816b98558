//! XML I/O - Attribute codec and structured element protocol
//!
//! This crate provides the serialization plumbing shared by every format
//! and setting type in the model:
//!
//! - [`codec`]: lossless, locale-independent scalar <-> attribute-text
//!   encoding with explicit absent/malformed/out-of-range semantics
//! - [`element::XmlElement`]: the layered write/read contract per element
//! - [`writer::XmlWriter`] / [`reader::XmlReader`]: streaming drivers over
//!   quick-xml, with a sticky per-reader error flag
//! - [`color::Color`]: the RGBA scalar the codec carries in hex form

pub mod codec;
pub mod color;
mod element;
mod error;
pub mod reader;
pub mod writer;

pub use codec::{AttrMap, AttrWriter};
pub use color::Color;
pub use element::XmlElement;
pub use error::{Result, XmlIoError};
pub use reader::XmlReader;
pub use writer::{element_to_string, XmlWriter};
