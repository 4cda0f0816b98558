//! Division operator format

use crate::aggregation::{Aggregation, Membership};
use crate::error::{FormatError, Result};
use crate::fonts::FontAggregationState;
use crate::format::{AttributeLayer, CapabilitySet, FieldReader, Format, SharedFormat};
use crate::formats::operator::OperatorFormat;
use crate::formats::parenthesis::ParenthesisAggregationState;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use xml_io::{AttrMap, AttrWriter, XmlElement, XmlIoError};

/// Visual style of a division
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum DivisionStyle {
    /// Inline slash between the operands
    #[default]
    Slash,
    /// The division sign glyph
    Sign,
    /// Numerator over denominator with a horizontal line
    Line,
}

impl DivisionStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            DivisionStyle::Slash => "slash",
            DivisionStyle::Sign => "sign",
            DivisionStyle::Line => "line",
        }
    }

    pub fn parse(attribute: &str, text: &str) -> xml_io::Result<Self> {
        match text {
            "slash" => Ok(DivisionStyle::Slash),
            "sign" => Ok(DivisionStyle::Sign),
            "line" => Ok(DivisionStyle::Line),
            _ => Err(XmlIoError::MalformedValue {
                attribute: attribute.to_string(),
                value: text.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionOperatorFormat {
    operator: OperatorFormat,
    style: DivisionStyle,
}

impl DivisionOperatorFormat {
    pub const TYPE_NAME: &'static str = "DivisionOperatorFormat";

    pub fn capability_names() -> CapabilitySet {
        let mut caps = OperatorFormat::capability_names();
        caps.insert(Self::TYPE_NAME);
        caps
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn operator(&self) -> &OperatorFormat {
        &self.operator
    }

    pub fn operator_mut(&mut self) -> &mut OperatorFormat {
        &mut self.operator
    }

    pub fn style(&self) -> DivisionStyle {
        self.style
    }

    pub fn set_style(&mut self, style: DivisionStyle) {
        self.style = style;
    }
}

impl XmlElement for DivisionOperatorFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        AttributeLayer::contribute_attributes(&self.operator, attrs);
        attrs.push_string(
            "divisionStyle",
            self.style.as_str(),
            DivisionStyle::default().as_str(),
        );
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        AttributeLayer::consume_attributes(&mut self.operator, attrs)?;
        let text = attrs.take_string("divisionStyle", DivisionStyle::default().as_str());
        self.style = DivisionStyle::parse("divisionStyle", &text)?;
        Ok(())
    }
}

impl Format for DivisionOperatorFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        self.operator.append_fields(fields);
        fields.push(self.style.as_str().to_string());
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.operator.parse_fields(fields)?;
        let text = fields.next_string()?;
        self.style = DivisionStyle::parse("divisionStyle", &text)
            .map_err(|_| FormatError::MalformedDelimited(format!("bad division style {text:?}")))?;
        Ok(())
    }

    fn to_css(&self) -> String {
        self.operator.to_css()
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
pub struct DivisionOperatorAggregation {
    membership: Membership,
    pub fonts: FontAggregationState,
    pub parentheses: ParenthesisAggregationState,
    pub styles: BTreeSet<DivisionStyle>,
}

impl DivisionOperatorAggregation {
    fn fold(&mut self, format: &DivisionOperatorFormat) {
        self.fonts.fold(format.operator.font());
        self.parentheses.modes.insert(format.operator.parenthesis_mode());
        self.styles.insert(format.style);
    }
}

impl Aggregation for DivisionOperatorAggregation {
    fn type_name(&self) -> &'static str {
        DivisionOperatorFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<DivisionOperatorFormat>() else {
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
        self.parentheses.reset();
        self.styles.clear();
        for member in members {
            let guard = member.borrow();
            if let Some(concrete) = guard.as_any().downcast_ref::<DivisionOperatorFormat>() {
                self.fold(concrete);
            }
        }
    }

    fn clear(&mut self) {
        self.membership.clear();
        self.fonts.reset();
        self.parentheses.reset();
        self.styles.clear();
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
    fn test_default_style_is_omitted_from_xml() {
        let format = DivisionOperatorFormat::new();
        let xml = xml_io::element_to_string(&format).unwrap();
        assert_eq!(xml, "<DivisionOperatorFormat/>");
    }

    #[test]
    fn test_non_default_style_is_written() {
        let mut format = DivisionOperatorFormat::new();
        format.set_style(DivisionStyle::Line);
        let xml = xml_io::element_to_string(&format).unwrap();
        assert_eq!(xml, "<DivisionOperatorFormat divisionStyle=\"line\"/>");
    }
}
