//! List data type format

use crate::aggregation::{Aggregation, Membership};
use crate::error::Result;
use crate::fonts::{FontAggregationState, FontFormat};
use crate::format::{AttributeLayer, CapabilitySet, FieldReader, Format, SharedFormat};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use xml_io::{AttrMap, AttrWriter, XmlElement};

const DEFAULT_OPENING: &str = "(";
const DEFAULT_CLOSING: &str = ")";
const DEFAULT_SEPARATOR: &str = ",";

/// Rendering of list values: delimiters and the element separator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDataTypeFormat {
    font: FontFormat,
    opening_delimiter: String,
    closing_delimiter: String,
    separator: String,
}

impl Default for ListDataTypeFormat {
    fn default() -> Self {
        Self {
            font: FontFormat::default(),
            opening_delimiter: DEFAULT_OPENING.to_string(),
            closing_delimiter: DEFAULT_CLOSING.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl ListDataTypeFormat {
    pub const TYPE_NAME: &'static str = "ListDataTypeFormat";

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

    pub fn opening_delimiter(&self) -> &str {
        &self.opening_delimiter
    }

    pub fn set_opening_delimiter(&mut self, text: impl Into<String>) {
        self.opening_delimiter = text.into();
    }

    pub fn closing_delimiter(&self) -> &str {
        &self.closing_delimiter
    }

    pub fn set_closing_delimiter(&mut self, text: impl Into<String>) {
        self.closing_delimiter = text.into();
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn set_separator(&mut self, text: impl Into<String>) {
        self.separator = text.into();
    }
}

impl XmlElement for ListDataTypeFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        AttributeLayer::contribute_attributes(&self.font, attrs);
        attrs.push_string("openingDelimiter", &self.opening_delimiter, DEFAULT_OPENING);
        attrs.push_string("closingDelimiter", &self.closing_delimiter, DEFAULT_CLOSING);
        attrs.push_string("separator", &self.separator, DEFAULT_SEPARATOR);
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        AttributeLayer::consume_attributes(&mut self.font, attrs)?;
        self.opening_delimiter = attrs.take_string("openingDelimiter", DEFAULT_OPENING);
        self.closing_delimiter = attrs.take_string("closingDelimiter", DEFAULT_CLOSING);
        self.separator = attrs.take_string("separator", DEFAULT_SEPARATOR);
        Ok(())
    }
}

impl Format for ListDataTypeFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        self.font.append_fields(fields);
        fields.push(self.opening_delimiter.clone());
        fields.push(self.closing_delimiter.clone());
        fields.push(self.separator.clone());
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.font.parse_fields(fields)?;
        self.opening_delimiter = fields.next_string()?;
        self.closing_delimiter = fields.next_string()?;
        self.separator = fields.next_string()?;
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
pub struct ListDataTypeAggregation {
    membership: Membership,
    pub fonts: FontAggregationState,
    pub opening_delimiters: BTreeSet<String>,
    pub closing_delimiters: BTreeSet<String>,
    pub separators: BTreeSet<String>,
}

impl ListDataTypeAggregation {
    fn fold(&mut self, format: &ListDataTypeFormat) {
        self.fonts.fold(&format.font);
        self.opening_delimiters.insert(format.opening_delimiter.clone());
        self.closing_delimiters.insert(format.closing_delimiter.clone());
        self.separators.insert(format.separator.clone());
    }
}

impl Aggregation for ListDataTypeAggregation {
    fn type_name(&self) -> &'static str {
        ListDataTypeFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<ListDataTypeFormat>() else {
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
        self.opening_delimiters.clear();
        self.closing_delimiters.clear();
        self.separators.clear();
        for member in members {
            let guard = member.borrow();
            if let Some(concrete) = guard.as_any().downcast_ref::<ListDataTypeFormat>() {
                self.fold(concrete);
            }
        }
    }

    fn clear(&mut self) {
        self.membership.clear();
        self.fonts.reset();
        self.opening_delimiters.clear();
        self.closing_delimiters.clear();
        self.separators.clear();
    }

    fn member_count(&self) -> usize {
        self.membership.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
