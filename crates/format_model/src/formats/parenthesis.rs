//! Parenthesis rendering format
//!
//! The second base of the operator diamond: how an element's surrounding
//! parentheses are drawn. Shared as a layer by operators and functions.

use crate::aggregation::{Aggregation, Membership};
use crate::error::{FormatError, Result};
use crate::format::{
    base_capabilities, AttributeLayer, CapabilitySet, FieldReader, Format, SharedFormat,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use xml_io::{AttrMap, AttrWriter, XmlElement, XmlIoError};

/// How surrounding parentheses are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ParenthesisMode {
    /// Drawn at the natural glyph size
    #[default]
    Normal,
    /// Not drawn at all
    Invisible,
    /// Stretched to the enclosed content's height
    Stretched,
}

impl ParenthesisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParenthesisMode::Normal => "normal",
            ParenthesisMode::Invisible => "invisible",
            ParenthesisMode::Stretched => "stretched",
        }
    }

    pub fn parse(attribute: &str, text: &str) -> xml_io::Result<Self> {
        match text {
            "normal" => Ok(ParenthesisMode::Normal),
            "invisible" => Ok(ParenthesisMode::Invisible),
            "stretched" => Ok(ParenthesisMode::Stretched),
            _ => Err(XmlIoError::MalformedValue {
                attribute: attribute.to_string(),
                value: text.to_string(),
            }),
        }
    }
}

/// Parenthesis rendering format and layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParenthesisFormat {
    mode: ParenthesisMode,
}

impl ParenthesisFormat {
    pub const TYPE_NAME: &'static str = "ParenthesisFormat";

    pub fn capability_names() -> CapabilitySet {
        let mut caps = base_capabilities();
        caps.insert(Self::TYPE_NAME);
        caps
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: ParenthesisMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ParenthesisMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ParenthesisMode) {
        self.mode = mode;
    }
}

impl AttributeLayer for ParenthesisFormat {
    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        attrs.push_string(
            "parenthesisMode",
            self.mode.as_str(),
            ParenthesisMode::default().as_str(),
        );
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        let text = attrs.take_string("parenthesisMode", ParenthesisMode::default().as_str());
        self.mode = ParenthesisMode::parse("parenthesisMode", &text)?;
        Ok(())
    }

    fn append_fields(&self, fields: &mut Vec<String>) {
        fields.push(self.mode.as_str().to_string());
    }

    fn parse_fields(&mut self, fields: &mut FieldReader) -> Result<()> {
        let text = fields.next_string()?;
        self.mode = ParenthesisMode::parse("parenthesisMode", &text)
            .map_err(|_| FormatError::MalformedDelimited(format!("bad parenthesis mode {text:?}")))?;
        Ok(())
    }

    fn append_css(&self, _css: &mut String) {
        // No CSS equivalent; parentheses are drawn by the renderer.
    }
}

impl XmlElement for ParenthesisFormat {
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

impl Format for ParenthesisFormat {
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
        String::new()
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

/// Parenthesis summaries shared by aggregations with a parenthesis layer
#[derive(Default)]
pub struct ParenthesisAggregationState {
    pub modes: BTreeSet<ParenthesisMode>,
}

impl ParenthesisAggregationState {
    pub fn fold(&mut self, format: &ParenthesisFormat) {
        self.modes.insert(format.mode());
    }

    pub fn reset(&mut self) {
        self.modes.clear();
    }
}

#[derive(Default)]
pub struct ParenthesisAggregation {
    membership: Membership,
    pub parentheses: ParenthesisAggregationState,
}

impl Aggregation for ParenthesisAggregation {
    fn type_name(&self) -> &'static str {
        ParenthesisFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<ParenthesisFormat>() else {
            return false;
        };
        if !self.membership.insert(format) && !include_existing {
            return false;
        }
        self.parentheses.fold(concrete);
        true
    }

    fn remove_format(&mut self, format: &SharedFormat) {
        self.membership.remove(format);
    }

    fn format_changed(&mut self) {
        let members = self.membership.live();
        self.parentheses.reset();
        for member in members {
            let guard = member.borrow();
            if let Some(concrete) = guard.as_any().downcast_ref::<ParenthesisFormat>() {
                self.parentheses.fold(concrete);
            }
        }
    }

    fn clear(&mut self) {
        self.membership.clear();
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

    #[test]
    fn test_mode_parse_rejects_unknown() {
        assert!(ParenthesisMode::parse("parenthesisMode", "curly").is_err());
    }

    #[test]
    fn test_delimited_round_trip() {
        let format = ParenthesisFormat::with_mode(ParenthesisMode::Stretched);
        let text = format.to_delimited();
        assert_eq!(text, "ParenthesisFormat,stretched");
        let mut rebuilt = ParenthesisFormat::new();
        let fields = crate::format::split_fields(&text);
        let mut reader = FieldReader::new(fields[1..].to_vec());
        rebuilt.load_delimited(&mut reader).unwrap();
        assert_eq!(rebuilt, format);
    }
}
