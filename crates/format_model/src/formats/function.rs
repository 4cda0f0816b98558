//! Function call format
//!
//! Functions share the operator's two bases (font and parenthesis) without
//! being operators themselves; the shared ancestry shows up only in the
//! capability set.

use crate::aggregation::{Aggregation, Membership};
use crate::error::Result;
use crate::fonts::{FontAggregationState, FontFormat};
use crate::format::{AttributeLayer, CapabilitySet, FieldReader, Format, SharedFormat};
use crate::formats::parenthesis::{ParenthesisAggregationState, ParenthesisFormat, ParenthesisMode};
use serde::{Deserialize, Serialize};
use std::any::Any;
use xml_io::{AttrMap, AttrWriter, XmlElement};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionFormat {
    font: FontFormat,
    parenthesis: ParenthesisFormat,
}

impl FunctionFormat {
    pub const TYPE_NAME: &'static str = "FunctionFormat";

    pub fn capability_names() -> CapabilitySet {
        let mut caps = FontFormat::capability_names();
        caps.append(&mut ParenthesisFormat::capability_names());
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

    pub fn parenthesis_mode(&self) -> ParenthesisMode {
        self.parenthesis.mode()
    }

    pub fn set_parenthesis_mode(&mut self, mode: ParenthesisMode) {
        self.parenthesis.set_mode(mode);
    }
}

impl XmlElement for FunctionFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        AttributeLayer::contribute_attributes(&self.font, attrs);
        AttributeLayer::contribute_attributes(&self.parenthesis, attrs);
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        AttributeLayer::consume_attributes(&mut self.font, attrs)?;
        AttributeLayer::consume_attributes(&mut self.parenthesis, attrs)
    }
}

impl Format for FunctionFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        self.font.append_fields(fields);
        self.parenthesis.append_fields(fields);
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.font.parse_fields(fields)?;
        self.parenthesis.parse_fields(fields)
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
pub struct FunctionAggregation {
    membership: Membership,
    pub fonts: FontAggregationState,
    pub parentheses: ParenthesisAggregationState,
}

impl Aggregation for FunctionAggregation {
    fn type_name(&self) -> &'static str {
        FunctionFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<FunctionFormat>() else {
            return false;
        };
        if !self.membership.insert(format) && !include_existing {
            return false;
        }
        self.fonts.fold(&concrete.font);
        self.parentheses.fold(&concrete.parenthesis);
        true
    }

    fn remove_format(&mut self, format: &SharedFormat) {
        self.membership.remove(format);
    }

    fn format_changed(&mut self) {
        let members = self.membership.live();
        self.fonts.reset();
        self.parentheses.reset();
        for member in members {
            let guard = member.borrow();
            if let Some(concrete) = guard.as_any().downcast_ref::<FunctionFormat>() {
                self.fonts.fold(&concrete.font);
                self.parentheses.fold(&concrete.parenthesis);
            }
        }
    }

    fn clear(&mut self) {
        self.membership.clear();
        self.fonts.reset();
        self.parentheses.reset();
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
    use crate::formats::operator::OperatorFormat;

    #[test]
    fn test_function_and_operator_are_distinct_types() {
        // Same capability bases, different own name.
        let function = FunctionFormat::capability_names();
        let operator = OperatorFormat::capability_names();
        assert!(function.contains(FunctionFormat::TYPE_NAME));
        assert!(!function.contains(OperatorFormat::TYPE_NAME));
        assert!(!operator.contains(FunctionFormat::TYPE_NAME));
    }

    #[test]
    fn test_xml_round_trip_keeps_mode() {
        let mut format = FunctionFormat::new();
        format.set_parenthesis_mode(ParenthesisMode::Stretched);
        let xml = xml_io::element_to_string(&format).unwrap();
        let mut reader = xml_io::XmlReader::from_str(&xml);
        let mut rebuilt = FunctionFormat::new();
        reader.read_element(&mut rebuilt).unwrap();
        assert_eq!(rebuilt, format);
    }
}
