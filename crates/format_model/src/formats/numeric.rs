//! Numeric data type format

use crate::aggregation::{Aggregation, Membership, TriState};
use crate::error::Result;
use crate::fonts::{FontAggregationState, FontFormat};
use crate::format::{AttributeLayer, CapabilitySet, FieldReader, Format, SharedFormat};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use xml_io::{AttrMap, AttrWriter, XmlElement};

/// Precision value meaning "show the value's natural number of digits"
pub const PRECISION_AUTOMATIC: i32 = -1;

/// Rendering of numeric values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericDataTypeFormat {
    font: FontFormat,
    precision: i32,
    digit_grouping: bool,
}

impl Default for NumericDataTypeFormat {
    fn default() -> Self {
        Self {
            font: FontFormat::default(),
            precision: PRECISION_AUTOMATIC,
            digit_grouping: false,
        }
    }
}

impl NumericDataTypeFormat {
    pub const TYPE_NAME: &'static str = "NumericDataTypeFormat";

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

    pub fn precision(&self) -> i32 {
        self.precision
    }

    pub fn set_precision(&mut self, precision: i32) {
        self.precision = precision;
    }

    pub fn digit_grouping(&self) -> bool {
        self.digit_grouping
    }

    pub fn set_digit_grouping(&mut self, grouping: bool) {
        self.digit_grouping = grouping;
    }
}

impl XmlElement for NumericDataTypeFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        AttributeLayer::contribute_attributes(&self.font, attrs);
        attrs.push_int("precision", self.precision, PRECISION_AUTOMATIC);
        attrs.push_bool("digitGrouping", self.digit_grouping, false);
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        AttributeLayer::consume_attributes(&mut self.font, attrs)?;
        self.precision = attrs.take_int("precision", PRECISION_AUTOMATIC)?;
        self.digit_grouping = attrs.take_bool("digitGrouping", false)?;
        Ok(())
    }
}

impl Format for NumericDataTypeFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn is_valid(&self) -> bool {
        self.precision >= PRECISION_AUTOMATIC
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        self.font.append_fields(fields);
        fields.push(self.precision.to_string());
        fields.push(xml_io::codec::encode_bool(self.digit_grouping).to_string());
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.font.parse_fields(fields)?;
        self.precision = fields.next_int()?;
        self.digit_grouping = fields.next_bool()?;
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
pub struct NumericDataTypeAggregation {
    membership: Membership,
    pub fonts: FontAggregationState,
    pub precisions: BTreeSet<i32>,
    pub digit_grouping: TriState,
}

impl NumericDataTypeAggregation {
    fn fold(&mut self, format: &NumericDataTypeFormat) {
        self.fonts.fold(&format.font);
        self.precisions.insert(format.precision);
        self.digit_grouping.observe(format.digit_grouping);
    }
}

impl Aggregation for NumericDataTypeAggregation {
    fn type_name(&self) -> &'static str {
        NumericDataTypeFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<NumericDataTypeFormat>() else {
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
        self.precisions.clear();
        self.digit_grouping = TriState::Invalid;
        for member in members {
            let guard = member.borrow();
            if let Some(concrete) = guard.as_any().downcast_ref::<NumericDataTypeFormat>() {
                self.fold(concrete);
            }
        }
    }

    fn clear(&mut self) {
        self.membership.clear();
        self.fonts.reset();
        self.precisions.clear();
        self.digit_grouping = TriState::Invalid;
    }

    fn member_count(&self) -> usize {
        self.membership.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
