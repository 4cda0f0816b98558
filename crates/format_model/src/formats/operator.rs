//! Operator format
//!
//! The diamond join of the hierarchy: an operator renders with a font and
//! with surrounding parentheses. Both bases are held as layers, and the
//! capability set collapses their shared ancestry into one entry.

use crate::aggregation::{Aggregation, Membership};
use crate::error::Result;
use crate::fonts::{FontAggregationState, FontFormat};
use crate::format::{AttributeLayer, CapabilitySet, FieldReader, Format, SharedFormat};
use crate::formats::parenthesis::{ParenthesisAggregationState, ParenthesisFormat, ParenthesisMode};
use serde::{Deserialize, Serialize};
use std::any::Any;
use xml_io::{AttrMap, AttrWriter, XmlElement};

/// Font plus parenthesis rendering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorFormat {
    font: FontFormat,
    parenthesis: ParenthesisFormat,
}

impl OperatorFormat {
    pub const TYPE_NAME: &'static str = "OperatorFormat";

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

impl AttributeLayer for OperatorFormat {
    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        AttributeLayer::contribute_attributes(&self.font, attrs);
        AttributeLayer::contribute_attributes(&self.parenthesis, attrs);
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        AttributeLayer::consume_attributes(&mut self.font, attrs)?;
        AttributeLayer::consume_attributes(&mut self.parenthesis, attrs)
    }

    fn append_fields(&self, fields: &mut Vec<String>) {
        self.font.append_fields(fields);
        self.parenthesis.append_fields(fields);
    }

    fn parse_fields(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.font.parse_fields(fields)?;
        self.parenthesis.parse_fields(fields)
    }

    fn append_css(&self, css: &mut String) {
        self.font.append_css(css);
        self.parenthesis.append_css(css);
    }
}

impl XmlElement for OperatorFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        AttributeLayer::contribute_attributes(self, attrs);
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        AttributeLayer::consume_attributes(self, attrs)
    }
}

impl Format for OperatorFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        self.append_fields(fields);
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.parse_fields(fields)
    }

    fn to_css(&self) -> String {
        let mut css = String::new();
        self.append_css(&mut css);
        css.trim_end().to_string()
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
pub struct OperatorAggregation {
    membership: Membership,
    pub fonts: FontAggregationState,
    pub parentheses: ParenthesisAggregationState,
}

impl Aggregation for OperatorAggregation {
    fn type_name(&self) -> &'static str {
        OperatorFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<OperatorFormat>() else {
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
            if let Some(concrete) = guard.as_any().downcast_ref::<OperatorFormat>() {
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
    use crate::format::FORMAT_CAPABILITY;

    #[test]
    fn test_capabilities_collapse_diamond() {
        let caps = OperatorFormat::capability_names();
        assert!(caps.contains(FORMAT_CAPABILITY));
        assert!(caps.contains(FontFormat::TYPE_NAME));
        assert!(caps.contains(ParenthesisFormat::TYPE_NAME));
        assert!(caps.contains(OperatorFormat::TYPE_NAME));
        assert_eq!(caps.len(), 4);
    }

    #[test]
    fn test_delimited_carries_both_layers() {
        let mut format = OperatorFormat::new();
        format.set_parenthesis_mode(ParenthesisMode::Invisible);
        let text = format.to_delimited();
        assert!(text.starts_with("OperatorFormat,"));
        assert!(text.ends_with(",invisible"));
    }
}
