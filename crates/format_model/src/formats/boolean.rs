//! Boolean data type format

use crate::aggregation::{Aggregation, Membership};
use crate::error::Result;
use crate::fonts::{FontAggregationState, FontFormat};
use crate::format::{AttributeLayer, CapabilitySet, FieldReader, Format, SharedFormat};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use xml_io::{AttrMap, AttrWriter, XmlElement};

const DEFAULT_TRUE_WORD: &str = "true";
const DEFAULT_FALSE_WORD: &str = "false";

/// Rendering of boolean values: the words used for the two states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanDataTypeFormat {
    font: FontFormat,
    true_word: String,
    false_word: String,
}

impl Default for BooleanDataTypeFormat {
    fn default() -> Self {
        Self {
            font: FontFormat::default(),
            true_word: DEFAULT_TRUE_WORD.to_string(),
            false_word: DEFAULT_FALSE_WORD.to_string(),
        }
    }
}

impl BooleanDataTypeFormat {
    pub const TYPE_NAME: &'static str = "BooleanDataTypeFormat";

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

    pub fn true_word(&self) -> &str {
        &self.true_word
    }

    pub fn set_true_word(&mut self, word: impl Into<String>) {
        self.true_word = word.into();
    }

    pub fn false_word(&self) -> &str {
        &self.false_word
    }

    pub fn set_false_word(&mut self, word: impl Into<String>) {
        self.false_word = word.into();
    }

    /// Word shown for a concrete value
    pub fn word_for(&self, value: bool) -> &str {
        if value {
            &self.true_word
        } else {
            &self.false_word
        }
    }
}

impl XmlElement for BooleanDataTypeFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        AttributeLayer::contribute_attributes(&self.font, attrs);
        attrs.push_string("trueWord", &self.true_word, DEFAULT_TRUE_WORD);
        attrs.push_string("falseWord", &self.false_word, DEFAULT_FALSE_WORD);
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        AttributeLayer::consume_attributes(&mut self.font, attrs)?;
        self.true_word = attrs.take_string("trueWord", DEFAULT_TRUE_WORD);
        self.false_word = attrs.take_string("falseWord", DEFAULT_FALSE_WORD);
        Ok(())
    }
}

impl Format for BooleanDataTypeFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        self.font.append_fields(fields);
        fields.push(self.true_word.clone());
        fields.push(self.false_word.clone());
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.font.parse_fields(fields)?;
        self.true_word = fields.next_string()?;
        self.false_word = fields.next_string()?;
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
pub struct BooleanDataTypeAggregation {
    membership: Membership,
    pub fonts: FontAggregationState,
    pub true_words: BTreeSet<String>,
    pub false_words: BTreeSet<String>,
}

impl BooleanDataTypeAggregation {
    fn fold(&mut self, format: &BooleanDataTypeFormat) {
        self.fonts.fold(&format.font);
        self.true_words.insert(format.true_word.clone());
        self.false_words.insert(format.false_word.clone());
    }
}

impl Aggregation for BooleanDataTypeAggregation {
    fn type_name(&self) -> &'static str {
        BooleanDataTypeFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<BooleanDataTypeFormat>() else {
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
        self.true_words.clear();
        self.false_words.clear();
        for member in members {
            let guard = member.borrow();
            if let Some(concrete) = guard.as_any().downcast_ref::<BooleanDataTypeFormat>() {
                self.fold(concrete);
            }
        }
    }

    fn clear(&mut self) {
        self.membership.clear();
        self.fonts.reset();
        self.true_words.clear();
        self.false_words.clear();
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
    fn test_default_words_omitted_from_xml() {
        let format = BooleanDataTypeFormat::new();
        let xml = xml_io::element_to_string(&format).unwrap();
        assert_eq!(xml, "<BooleanDataTypeFormat/>");
    }

    #[test]
    fn test_custom_words_round_trip() {
        let mut format = BooleanDataTypeFormat::new();
        format.set_true_word("yes");
        format.set_false_word("no");
        let xml = xml_io::element_to_string(&format).unwrap();
        let mut rebuilt = BooleanDataTypeFormat::new();
        xml_io::XmlReader::from_str(&xml).read_element(&mut rebuilt).unwrap();
        assert_eq!(rebuilt.word_for(true), "yes");
        assert_eq!(rebuilt.word_for(false), "no");
    }
}
