//! Value field format
//!
//! A value field renders a stored value between two pieces of literal text.
//! Both texts are required in the XML form even when empty, so a reader can
//! distinguish "empty by choice" from a truncated element.

use crate::aggregation::{Aggregation, Membership};
use crate::error::Result;
use crate::fonts::{FontAggregationState, FontFormat};
use crate::format::{AttributeLayer, CapabilitySet, FieldReader, Format, SharedFormat};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use xml_io::{AttrMap, AttrWriter, XmlElement};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueFieldFormat {
    font: FontFormat,
    text1: String,
    text2: String,
}

impl ValueFieldFormat {
    pub const TYPE_NAME: &'static str = "ValueFieldFormat";

    pub fn capability_names() -> CapabilitySet {
        let mut caps = FontFormat::capability_names();
        caps.insert(Self::TYPE_NAME);
        caps
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn font(&self) -> &FontFormat {
        &self.font
    }

    pub fn font_mut(&mut self) -> &mut FontFormat {
        &mut self.font
    }

    pub fn text1(&self) -> &str {
        &self.text1
    }

    pub fn set_text1(&mut self, text: impl Into<String>) {
        self.text1 = text.into();
    }

    pub fn text2(&self) -> &str {
        &self.text2
    }

    pub fn set_text2(&mut self, text: impl Into<String>) {
        self.text2 = text.into();
    }
}

impl XmlElement for ValueFieldFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        AttributeLayer::contribute_attributes(&self.font, attrs);
        // Required attributes bypass delta encoding.
        attrs.push("text1", self.text1.clone());
        attrs.push("text2", self.text2.clone());
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        AttributeLayer::consume_attributes(&mut self.font, attrs)?;
        self.text1 = attrs.take_required_string("text1")?;
        self.text2 = attrs.take_required_string("text2")?;
        Ok(())
    }
}

impl Format for ValueFieldFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        self.font.append_fields(fields);
        fields.push(self.text1.clone());
        fields.push(self.text2.clone());
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.font.parse_fields(fields)?;
        self.text1 = fields.next_string()?;
        self.text2 = fields.next_string()?;
        Ok(())
    }

    fn to_css(&self) -> String {
        self.font.to_css()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn Format> {
        Box::new(self.clone())
    }
}

// =============================================================================
// Aggregation
// =============================================================================

#[derive(Default)]
pub struct ValueFieldAggregation {
    membership: Membership,
    pub fonts: FontAggregationState,
    pub texts1: BTreeSet<String>,
    pub texts2: BTreeSet<String>,
}

impl ValueFieldAggregation {
    fn fold(&mut self, format: &ValueFieldFormat) {
        self.fonts.fold(&format.font);
        self.texts1.insert(format.text1.clone());
        self.texts2.insert(format.text2.clone());
    }
}

impl Aggregation for ValueFieldAggregation {
    fn type_name(&self) -> &'static str {
        ValueFieldFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<ValueFieldFormat>() else {
            return false;
        };
        if !self.membership.insert(format) && !include_existing {
            return false;
        }
        self.fold(concrete);
        true
    }

    fn remove_format(&mut self, format: &SharedFormat) {
        self.membership.remove(format);
    }

    fn format_changed(&mut self) {
        let members = self.membership.live();
        self.fonts.reset();
        self.texts1.clear();
        self.texts2.clear();
        for member in members {
            let guard = member.borrow();
            if let Some(concrete) = guard.as_any().downcast_ref::<ValueFieldFormat>() {
                self.fold(concrete);
            }
        }
    }

    fn clear(&mut self) {
        self.membership.clear();
        self.fonts.reset();
        self.texts1.clear();
        self.texts2.clear();
    }

    fn member_count(&self) -> usize {
        self.membership.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_texts_still_written() {
        let format = ValueFieldFormat::new();
        let xml = xml_io::element_to_string(&format).unwrap();
        assert_eq!(xml, "<ValueFieldFormat text1=\"\" text2=\"\"/>");
    }

    #[test]
    fn test_missing_required_text_is_an_error() {
        let mut reader = xml_io::XmlReader::from_str("<ValueFieldFormat text1=\"x\"/>");
        let mut format = ValueFieldFormat::new();
        let err = reader.read_element(&mut format).unwrap_err();
        assert!(matches!(err, xml_io::XmlIoError::MissingAttribute { .. }));
    }

    #[test]
    fn test_texts_round_trip_with_escapes() {
        let mut format = ValueFieldFormat::new();
        format.set_text1("total: ");
        format.set_text2(" kg, net");
        let text = format.to_delimited();
        let fields = crate::format::split_fields(&text);
        let mut rebuilt = ValueFieldFormat::new();
        let mut reader = FieldReader::new(fields[1..].to_vec());
        rebuilt.load_delimited(&mut reader).unwrap();
        assert_eq!(rebuilt, format);
    }
}
