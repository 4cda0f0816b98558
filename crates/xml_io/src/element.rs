//! Structured XML element protocol
//!
//! Every serializable object implements [`XmlElement`]. The write side emits
//! a start tag named by the object, its composed attribute contributions, an
//! optional text payload, nested children, and the matching end tag. The read
//! side receives an already-parsed attribute map and then streamed child and
//! text events until the end tag.
//!
//! Attribute contribution is layered: a concrete type invokes each
//! ancestor-in-spirit layer's immediate attributes in a fixed
//! ancestor-to-descendant order before its own. The read side mirrors this
//! with layered consumption from an [`AttrMap`]; leftovers after every layer
//! ran are a parse error unless the type explicitly tolerates unknowns.

use crate::codec::{AttrMap, AttrWriter};
use crate::error::{Result, XmlIoError};
use crate::reader::XmlReader;
use crate::writer::XmlWriter;

/// The write/read contract for one tagged element
pub trait XmlElement {
    /// Tag this element serializes under (the type name for formats)
    fn tag_name(&self) -> &str;

    /// Composed attribute layer, ancestor layers first
    fn contribute_attributes(&self, attrs: &mut AttrWriter);

    /// Composed attribute reader; each layer takes what it defines
    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> Result<()>;

    /// Optional character-data payload
    fn character_data(&self) -> Option<String> {
        None
    }

    /// Whether any child elements will be written
    fn has_children(&self) -> bool {
        false
    }

    /// Emit nested child elements
    fn write_children(&self, writer: &mut XmlWriter<'_>) -> Result<()> {
        let _ = writer;
        Ok(())
    }

    /// Types that tolerate attributes they do not define opt in here
    fn allows_unknown_attributes(&self) -> bool {
        false
    }

    /// A child start tag was seen. `attrs` holds the child's attributes;
    /// `is_empty` is true for a self-closing child. Implementations that
    /// accept children must consume the child's content (for non-empty
    /// children) before returning, e.g. via [`XmlReader::read_element_content`]
    /// or [`XmlReader::skip_element`]. The default forbids children.
    fn read_child(
        &mut self,
        reader: &mut XmlReader<'_>,
        attrs: AttrMap,
        is_empty: bool,
    ) -> Result<()> {
        let _ = (reader, is_empty);
        Err(XmlIoError::UnexpectedChild {
            parent: self.tag_name().to_string(),
            child: attrs.tag_name().to_string(),
        })
    }

    /// Character data was seen. Whitespace-only text never reaches this
    /// hook; the default rejects everything else.
    fn read_text(&mut self, text: &str) -> Result<()> {
        let _ = text;
        Err(XmlIoError::UnexpectedText {
            tag: self.tag_name().to_string(),
        })
    }
}
