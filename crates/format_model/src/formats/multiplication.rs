//! Multiplication operator format

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

/// Glyph used between the factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum MultiplicationSymbol {
    #[default]
    Asterisk,
    Cross,
    Dot,
    /// Juxtaposition, no glyph at all
    None,
}

impl MultiplicationSymbol {
    pub fn as_str(&self) -> &'static str {
        match self {
            MultiplicationSymbol::Asterisk => "asterisk",
            MultiplicationSymbol::Cross => "cross",
            MultiplicationSymbol::Dot => "dot",
            MultiplicationSymbol::None => "none",
        }
    }

    pub fn parse(attribute: &str, text: &str) -> xml_io::Result<Self> {
        match text {
            "asterisk" => Ok(MultiplicationSymbol::Asterisk),
            "cross" => Ok(MultiplicationSymbol::Cross),
            "dot" => Ok(MultiplicationSymbol::Dot),
            "none" => Ok(MultiplicationSymbol::None),
            _ => Err(XmlIoError::MalformedValue {
                attribute: attribute.to_string(),
                value: text.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplicationOperatorFormat {
    operator: OperatorFormat,
    symbol: MultiplicationSymbol,
}

impl MultiplicationOperatorFormat {
    pub const TYPE_NAME: &'static str = "MultiplicationOperatorFormat";

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

    pub fn symbol(&self) -> MultiplicationSymbol {
        self.symbol
    }

    pub fn set_symbol(&mut self, symbol: MultiplicationSymbol) {
        self.symbol = symbol;
    }
}

impl XmlElement for MultiplicationOperatorFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        AttributeLayer::contribute_attributes(&self.operator, attrs);
        attrs.push_string(
            "multiplicationSymbol",
            self.symbol.as_str(),
            MultiplicationSymbol::default().as_str(),
        );
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        AttributeLayer::consume_attributes(&mut self.operator, attrs)?;
        let text = attrs.take_string(
            "multiplicationSymbol",
            MultiplicationSymbol::default().as_str(),
        );
        self.symbol = MultiplicationSymbol::parse("multiplicationSymbol", &text)?;
        Ok(())
    }
}

impl Format for MultiplicationOperatorFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        self.operator.append_fields(fields);
        fields.push(self.symbol.as_str().to_string());
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.operator.parse_fields(fields)?;
        let text = fields.next_string()?;
        self.symbol = MultiplicationSymbol::parse("multiplicationSymbol", &text)
            .map_err(|_| FormatError::MalformedDelimited(format!("bad multiplication symbol {text:?}")))?;
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
pub struct MultiplicationOperatorAggregation {
    membership: Membership,
    pub fonts: FontAggregationState,
    pub parentheses: ParenthesisAggregationState,
    pub symbols: BTreeSet<MultiplicationSymbol>,
}

impl MultiplicationOperatorAggregation {
    fn fold(&mut self, format: &MultiplicationOperatorFormat) {
        self.fonts.fold(format.operator.font());
        self.parentheses.modes.insert(format.operator.parenthesis_mode());
        self.symbols.insert(format.symbol);
    }
}

impl Aggregation for MultiplicationOperatorAggregation {
    fn type_name(&self) -> &'static str {
        MultiplicationOperatorFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<MultiplicationOperatorFormat>() else {
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
        self.symbols.clear();
        for member in members {
            let guard = member.borrow();
            if let Some(concrete) = guard.as_any().downcast_ref::<MultiplicationOperatorFormat>() {
                self.fold(concrete);
            }
        }
    }

    fn clear(&mut self) {
        self.membership.clear();
        self.fonts.reset();
        self.parentheses.reset();
        self.symbols.clear();
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
    use crate::format::share;

    #[test]
    fn test_symbol_round_trips_through_delimited() {
        let mut format = MultiplicationOperatorFormat::new();
        format.set_symbol(MultiplicationSymbol::Dot);
        let text = format.to_delimited();
        let fields = crate::format::split_fields(&text);
        assert_eq!(fields[0], MultiplicationOperatorFormat::TYPE_NAME);
        let mut rebuilt = MultiplicationOperatorFormat::new();
        let mut reader = FieldReader::new(fields[1..].to_vec());
        rebuilt.load_delimited(&mut reader).unwrap();
        reader.finish().unwrap();
        assert_eq!(rebuilt.symbol(), MultiplicationSymbol::Dot);
    }

    #[test]
    fn test_aggregation_rejects_foreign_type() {
        let mut agg = MultiplicationOperatorAggregation::default();
        let other = share(Box::new(OperatorFormat::new()));
        assert!(!agg.add_format(&other, false));
        assert_eq!(agg.member_count(), 0);
    }

    #[test]
    fn test_aggregation_collects_symbols() {
        let mut agg = MultiplicationOperatorAggregation::default();
        let mut a = MultiplicationOperatorFormat::new();
        a.set_symbol(MultiplicationSymbol::Cross);
        let mut b = MultiplicationOperatorFormat::new();
        b.set_symbol(MultiplicationSymbol::None);
        let a = share(Box::new(a));
        let b = share(Box::new(b));
        assert!(agg.add_format(&a, false));
        assert!(agg.add_format(&b, false));
        assert_eq!(agg.symbols.len(), 2);
    }
}
