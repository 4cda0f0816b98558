//! Format base contract and capability model
//!
//! A format is one renderable/structural aspect of a document element.
//! Conceptually the format types form a multiple-inheritance hierarchy; each
//! ancestor is an attribute layer held by composition, and the runtime is-a
//! relation survives as the capability set: every concrete type reports the
//! union of its layers' capability names plus its own type name.
//!
//! Two textual forms exist side by side. The canonical delimited form
//! (`to_delimited`/`from_delimited`) is a comma-joined, backslash-escaped
//! field list whose first field is the type name; it round-trips exactly.
//! The CSS form is a best-effort rendering hint and does not round-trip.

use crate::error::{FormatError, Result};
use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use xml_io::{AttrMap, AttrWriter, XmlElement};

/// Capability name satisfied by every format
pub const FORMAT_CAPABILITY: &str = "Format";

/// Set of ancestor type names a format satisfies. A true set: diamond
/// ancestors collapse and repeated computation yields equal sets.
pub type CapabilitySet = BTreeSet<&'static str>;

/// Capability set containing only the base capability
pub fn base_capabilities() -> CapabilitySet {
    let mut caps = CapabilitySet::new();
    caps.insert(FORMAT_CAPABILITY);
    caps
}

// =============================================================================
// Attribute layers
// =============================================================================

/// One inheritance layer reimplemented as composition.
///
/// A concrete format holds its layers as named fields and invokes them in a
/// fixed ancestor-to-descendant order for attribute writing, attribute
/// consumption, delimited fields, and CSS contribution. Each layer touches
/// only the fields it introduces.
pub trait AttributeLayer {
    /// Immediate attributes, delta-encoded against defaults
    fn contribute_attributes(&self, attrs: &mut AttrWriter);

    /// Take this layer's attributes from the map
    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()>;

    /// Append this layer's delimited fields
    fn append_fields(&self, fields: &mut Vec<String>);

    /// Parse this layer's delimited fields, in the order appended
    fn parse_fields(&mut self, fields: &mut FieldReader) -> Result<()>;

    /// Append this layer's CSS declarations
    fn append_css(&self, css: &mut String);
}

// =============================================================================
// Format trait
// =============================================================================

/// Shared, single-threaded handle to a format; document elements hold these
pub type SharedFormat = Rc<RefCell<Box<dyn Format>>>;

/// Wrap a freshly constructed format for shared ownership
pub fn share(format: Box<dyn Format>) -> SharedFormat {
    Rc::new(RefCell::new(format))
}

/// Common contract of every format value
pub trait Format: XmlElement + Any + std::fmt::Debug {
    /// Stable type name; the registry key and the XML tag
    fn type_name(&self) -> &'static str;

    /// Union of ancestor capabilities plus the own type name
    fn capabilities(&self) -> CapabilitySet;

    /// Advisory validity; invalid values may exist transiently (e.g. while
    /// a document is being read incrementally)
    fn is_valid(&self) -> bool {
        true
    }

    /// This format's delimited fields, excluding the leading type name
    fn delimited_fields(&self, fields: &mut Vec<String>);

    /// Rebuild the value from delimited fields (type name already removed)
    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()>;

    /// Canonical string form; first field is the type name
    fn to_delimited(&self) -> String {
        let mut fields = vec![self.type_name().to_string()];
        self.delimited_fields(&mut fields);
        fields
            .iter()
            .map(|field| escape_field(field))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Best-effort CSS rendering hint
    fn to_css(&self) -> String;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Value copy behind a fresh box
    fn clone_box(&self) -> Box<dyn Format>;
}

/// Capability check against a dynamic format
pub fn has_capability(format: &dyn Format, name: &str) -> bool {
    format.capabilities().contains(name)
}

// =============================================================================
// Delimited string form
// =============================================================================

/// Backslash-escape the field separators within one field
pub fn escape_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        if c == '\\' || c == ',' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Split a delimited string into unescaped fields
pub fn split_fields(text: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ',' {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);
    fields
}

/// Sequential typed access over the delimited fields of one format
pub struct FieldReader {
    fields: Vec<String>,
    pos: usize,
}

impl FieldReader {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields, pos: 0 }
    }

    fn next(&mut self) -> Result<&str> {
        let field = self
            .fields
            .get(self.pos)
            .ok_or_else(|| FormatError::MalformedDelimited("too few fields".to_string()))?;
        self.pos += 1;
        Ok(field)
    }

    pub fn next_string(&mut self) -> Result<String> {
        Ok(self.next()?.to_string())
    }

    pub fn next_bool(&mut self) -> Result<bool> {
        match self.next()? {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(FormatError::MalformedDelimited(format!(
                "expected boolean, found {other:?}"
            ))),
        }
    }

    pub fn next_int<T: TryFrom<i128>>(&mut self) -> Result<T> {
        let field = self.next()?;
        let wide: i128 = field
            .trim()
            .parse()
            .map_err(|_| FormatError::MalformedDelimited(format!("expected integer, found {field:?}")))?;
        T::try_from(wide)
            .map_err(|_| FormatError::MalformedDelimited(format!("integer out of range: {field:?}")))
    }

    pub fn next_f64(&mut self) -> Result<f64> {
        let field = self.next()?;
        field
            .trim()
            .parse()
            .map_err(|_| FormatError::MalformedDelimited(format!("expected number, found {field:?}")))
    }

    pub fn next_color(&mut self) -> Result<xml_io::Color> {
        let field = self.next()?;
        xml_io::Color::from_hex(field)
            .map_err(|_| FormatError::MalformedDelimited(format!("expected color, found {field:?}")))
    }

    /// All fields must have been consumed
    pub fn finish(self) -> Result<()> {
        if self.pos == self.fields.len() {
            Ok(())
        } else {
            Err(FormatError::MalformedDelimited(format!(
                "{} unexpected trailing field(s)",
                self.fields.len() - self.pos
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_round_trip() {
        let fields = ["plain", "with,comma", "back\\slash", "", "both\\,at,once"];
        let joined = fields
            .iter()
            .map(|f| escape_field(f))
            .collect::<Vec<_>>()
            .join(",");
        assert_eq!(split_fields(&joined), fields);
    }

    #[test]
    fn test_split_empty_string_is_one_empty_field() {
        assert_eq!(split_fields(""), vec![String::new()]);
    }

    #[test]
    fn test_field_reader_typed_access() {
        let mut reader = FieldReader::new(vec![
            "hello".to_string(),
            "true".to_string(),
            "-42".to_string(),
            "2.5".to_string(),
            "#FF0000".to_string(),
        ]);
        assert_eq!(reader.next_string().unwrap(), "hello");
        assert!(reader.next_bool().unwrap());
        assert_eq!(reader.next_int::<i32>().unwrap(), -42);
        assert_eq!(reader.next_f64().unwrap(), 2.5);
        assert_eq!(reader.next_color().unwrap(), xml_io::Color::opaque(255, 0, 0));
        reader.finish().unwrap();
    }

    #[test]
    fn test_field_reader_rejects_trailing() {
        let reader = FieldReader::new(vec!["extra".to_string()]);
        assert!(reader.finish().is_err());
    }

    #[test]
    fn test_field_reader_rejects_exhaustion() {
        let mut reader = FieldReader::new(Vec::new());
        assert!(reader.next_string().is_err());
    }
}
