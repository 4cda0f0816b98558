//! Brace conditional format
//!
//! A brace conditional renders one of several condition texts next to a
//! brace, with a fallback word for the "otherwise" branch. The condition
//! list is variable length, so the XML form uses one child element per
//! condition and the delimited form carries a count field.

use crate::aggregation::{Aggregation, Membership};
use crate::error::Result;
use crate::fonts::{FontAggregationState, FontFormat};
use crate::format::{AttributeLayer, CapabilitySet, FieldReader, Format, SharedFormat};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use xml_io::{AttrMap, AttrWriter, XmlElement, XmlIoError, XmlReader, XmlWriter};

const DEFAULT_ELSE_WORD: &str = "otherwise";
const DEFAULT_SEPARATOR_TEXT: &str = ", ";
const CONDITION_TAG: &str = "Condition";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BraceConditionalFormat {
    font: FontFormat,
    else_word: String,
    separator_text: String,
    conditions: Vec<String>,
}

impl Default for BraceConditionalFormat {
    fn default() -> Self {
        Self {
            font: FontFormat::default(),
            else_word: DEFAULT_ELSE_WORD.to_string(),
            separator_text: DEFAULT_SEPARATOR_TEXT.to_string(),
            conditions: Vec::new(),
        }
    }
}

impl BraceConditionalFormat {
    pub const TYPE_NAME: &'static str = "BraceConditionalFormat";

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

    pub fn else_word(&self) -> &str {
        &self.else_word
    }

    pub fn set_else_word(&mut self, word: impl Into<String>) {
        self.else_word = word.into();
    }

    pub fn separator_text(&self) -> &str {
        &self.separator_text
    }

    pub fn set_separator_text(&mut self, text: impl Into<String>) {
        self.separator_text = text.into();
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn add_condition(&mut self, condition: impl Into<String>) {
        self.conditions.push(condition.into());
    }

    pub fn clear_conditions(&mut self) {
        self.conditions.clear();
    }
}

impl XmlElement for BraceConditionalFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        AttributeLayer::contribute_attributes(&self.font, attrs);
        attrs.push_string("elseWord", &self.else_word, DEFAULT_ELSE_WORD);
        attrs.push_string("separatorText", &self.separator_text, DEFAULT_SEPARATOR_TEXT);
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        AttributeLayer::consume_attributes(&mut self.font, attrs)?;
        self.else_word = attrs.take_string("elseWord", DEFAULT_ELSE_WORD);
        self.separator_text = attrs.take_string("separatorText", DEFAULT_SEPARATOR_TEXT);
        self.conditions.clear();
        Ok(())
    }

    fn has_children(&self) -> bool {
        !self.conditions.is_empty()
    }

    fn write_children(&self, writer: &mut XmlWriter) -> xml_io::Result<()> {
        for condition in &self.conditions {
            let mut attrs = AttrWriter::new();
            attrs.push("text", condition.clone());
            writer.write_empty_child(CONDITION_TAG, &attrs)?;
        }
        Ok(())
    }

    fn read_child(
        &mut self,
        reader: &mut XmlReader,
        mut attrs: AttrMap,
        is_empty: bool,
    ) -> xml_io::Result<()> {
        if attrs.tag_name() != CONDITION_TAG {
            return Err(XmlIoError::UnexpectedChild {
                parent: Self::TYPE_NAME.to_string(),
                child: attrs.tag_name().to_string(),
            });
        }
        let text = attrs.take_required_string("text")?;
        attrs.finish()?;
        if !is_empty {
            reader.skip_element(CONDITION_TAG)?;
        }
        self.conditions.push(text);
        Ok(())
    }
}

impl Format for BraceConditionalFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        self.font.append_fields(fields);
        fields.push(self.else_word.clone());
        fields.push(self.separator_text.clone());
        fields.push(self.conditions.len().to_string());
        for condition in &self.conditions {
            fields.push(condition.clone());
        }
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.font.parse_fields(fields)?;
        self.else_word = fields.next_string()?;
        self.separator_text = fields.next_string()?;
        let count: usize = fields.next_int()?;
        self.conditions.clear();
        for _ in 0..count {
            self.conditions.push(fields.next_string()?);
        }
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
pub struct BraceConditionalAggregation {
    membership: Membership,
    pub fonts: FontAggregationState,
    pub else_words: BTreeSet<String>,
    pub separator_texts: BTreeSet<String>,
}

impl BraceConditionalAggregation {
    fn fold(&mut self, format: &BraceConditionalFormat) {
        self.fonts.fold(&format.font);
        self.else_words.insert(format.else_word.clone());
        self.separator_texts.insert(format.separator_text.clone());
    }
}

impl Aggregation for BraceConditionalAggregation {
    fn type_name(&self) -> &'static str {
        BraceConditionalFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<BraceConditionalFormat>() else {
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
        self.else_words.clear();
        self.separator_texts.clear();
        for member in members {
            let guard = member.borrow();
            if let Some(concrete) = guard.as_any().downcast_ref::<BraceConditionalFormat>() {
                self.fold(concrete);
            }
        }
    }

    fn clear(&mut self) {
        self.membership.clear();
        self.fonts.reset();
        self.else_words.clear();
        self.separator_texts.clear();
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
    fn test_conditions_written_as_children() {
        let mut format = BraceConditionalFormat::new();
        format.add_condition("x > 0");
        format.add_condition("x = 0");
        let xml = xml_io::element_to_string(&format).unwrap();
        assert_eq!(
            xml,
            "<BraceConditionalFormat>\
             <Condition text=\"x &gt; 0\"/>\
             <Condition text=\"x = 0\"/>\
             </BraceConditionalFormat>"
        );
        let mut rebuilt = BraceConditionalFormat::new();
        XmlReader::from_str(&xml).read_element(&mut rebuilt).unwrap();
        assert_eq!(rebuilt, format);
    }

    #[test]
    fn test_unknown_child_is_rejected() {
        let xml = "<BraceConditionalFormat><Rule text=\"x\"/></BraceConditionalFormat>";
        let mut format = BraceConditionalFormat::new();
        let err = XmlReader::from_str(xml).read_element(&mut format).unwrap_err();
        assert!(matches!(err, XmlIoError::UnexpectedChild { .. }));
    }

    #[test]
    fn test_delimited_fields_escape_separator_comma() {
        let mut format = BraceConditionalFormat::new();
        format.add_condition("a, b");
        let text = format.to_delimited();
        let fields = crate::format::split_fields(&text);
        let mut rebuilt = BraceConditionalFormat::new();
        let mut reader = FieldReader::new(fields[1..].to_vec());
        rebuilt.load_delimited(&mut reader).unwrap();
        assert_eq!(rebuilt.conditions(), ["a, b"]);
        assert_eq!(rebuilt.separator_text(), ", ");
    }
}
