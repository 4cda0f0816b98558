//! Character format
//!
//! Plain text runs carry only a font layer; the type exists as its own
//! registry entry so character formatting aggregates separately from
//! operators and data types.

use crate::aggregation::{Aggregation, Membership};
use crate::error::Result;
use crate::fonts::{FontAggregationState, FontFormat};
use crate::format::{AttributeLayer, CapabilitySet, FieldReader, Format, SharedFormat};
use serde::{Deserialize, Serialize};
use std::any::Any;
use xml_io::{AttrMap, AttrWriter, Color, XmlElement};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterFormat {
    font: FontFormat,
}

impl CharacterFormat {
    pub const TYPE_NAME: &'static str = "CharacterFormat";

    pub fn capability_names() -> CapabilitySet {
        let mut caps = FontFormat::capability_names();
        caps.insert(Self::TYPE_NAME);
        caps
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_font(font: FontFormat) -> Self {
        Self { font }
    }

    pub fn font(&self) -> &FontFormat {
        &self.font
    }

    pub fn font_mut(&mut self) -> &mut FontFormat {
        &mut self.font
    }

    pub fn color(&self) -> Color {
        self.font.color()
    }
}

impl XmlElement for CharacterFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        AttributeLayer::contribute_attributes(&self.font, attrs);
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        AttributeLayer::consume_attributes(&mut self.font, attrs)
    }
}

impl Format for CharacterFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        self.font.append_fields(fields);
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.font.parse_fields(fields)
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
pub struct CharacterAggregation {
    membership: Membership,
    pub fonts: FontAggregationState,
}

impl Aggregation for CharacterAggregation {
    fn type_name(&self) -> &'static str {
        CharacterFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<CharacterFormat>() else {
            return false;
        };
        if !self.membership.insert(format) && !include_existing {
            return false;
        }
        self.fonts.fold(&concrete.font);
        true
    }

    fn remove_format(&mut self, format: &SharedFormat) {
        self.membership.remove(format);
    }

    fn format_changed(&mut self) {
        let members = self.membership.live();
        self.fonts.reset();
        for member in members {
            let guard = member.borrow();
            if let Some(concrete) = guard.as_any().downcast_ref::<CharacterFormat>() {
                self.fonts.fold(&concrete.font);
            }
        }
    }

    fn clear(&mut self) {
        self.membership.clear();
        self.fonts.reset();
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
    use crate::aggregation::TriState;
    use crate::format::share;

    #[test]
    fn test_mutation_then_recompute_matches_fresh_fold() {
        let mut a = CharacterFormat::new();
        a.font_mut().set_italic(true);
        let a = share(Box::new(a));
        let b = share(Box::new(CharacterFormat::new()));

        let mut agg = CharacterAggregation::default();
        assert!(agg.add_format(&a, false));
        assert!(agg.add_format(&b, false));
        assert_eq!(agg.fonts.italic, TriState::Both);

        b.borrow_mut()
            .as_any_mut()
            .downcast_mut::<CharacterFormat>()
            .unwrap()
            .font_mut()
            .set_italic(true);
        agg.format_changed();
        assert_eq!(agg.fonts.italic, TriState::AllTrue);
    }

    #[test]
    fn test_dropped_member_leaves_summaries() {
        let mut agg = CharacterAggregation::default();
        let a = share(Box::new(CharacterFormat::new()));
        {
            let mut bold = CharacterFormat::new();
            bold.font_mut().set_weight(700);
            let b = share(Box::new(bold));
            assert!(agg.add_format(&a, false));
            assert!(agg.add_format(&b, false));
            assert_eq!(agg.fonts.weights.len(), 2);
        }
        // b dropped; recompute walks live members only
        agg.format_changed();
        assert_eq!(agg.member_count(), 1);
        assert_eq!(agg.fonts.weights.len(), 1);
    }
}
