//! Page layout format
//!
//! Extents are in typographic points. Defaults describe a US Letter page
//! with one-inch margins.

use crate::aggregation::{Aggregation, FloatSet, Membership};
use crate::error::{FormatError, Result};
use crate::format::{base_capabilities, CapabilitySet, FieldReader, Format, SharedFormat};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use xml_io::{AttrMap, AttrWriter, XmlElement, XmlIoError};

pub const DEFAULT_PAGE_WIDTH: f64 = 612.0;
pub const DEFAULT_PAGE_HEIGHT: f64 = 792.0;
pub const DEFAULT_MARGIN: f64 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }

    pub fn parse(attribute: &str, text: &str) -> xml_io::Result<Self> {
        match text {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            _ => Err(XmlIoError::MalformedValue {
                attribute: attribute.to_string(),
                value: text.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFormat {
    width: f64,
    height: f64,
    orientation: Orientation,
    margin_left: f64,
    margin_right: f64,
    margin_top: f64,
    margin_bottom: f64,
}

impl Default for PageFormat {
    fn default() -> Self {
        Self {
            width: DEFAULT_PAGE_WIDTH,
            height: DEFAULT_PAGE_HEIGHT,
            orientation: Orientation::Portrait,
            margin_left: DEFAULT_MARGIN,
            margin_right: DEFAULT_MARGIN,
            margin_top: DEFAULT_MARGIN,
            margin_bottom: DEFAULT_MARGIN,
        }
    }
}

impl PageFormat {
    pub const TYPE_NAME: &'static str = "PageFormat";

    pub fn capability_names() -> CapabilitySet {
        let mut caps = base_capabilities();
        caps.insert(Self::TYPE_NAME);
        caps
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn set_width(&mut self, width: f64) {
        self.width = width;
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn set_height(&mut self, height: f64) {
        self.height = height;
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn margin_left(&self) -> f64 {
        self.margin_left
    }

    pub fn set_margin_left(&mut self, margin: f64) {
        self.margin_left = margin;
    }

    pub fn margin_right(&self) -> f64 {
        self.margin_right
    }

    pub fn set_margin_right(&mut self, margin: f64) {
        self.margin_right = margin;
    }

    pub fn margin_top(&self) -> f64 {
        self.margin_top
    }

    pub fn set_margin_top(&mut self, margin: f64) {
        self.margin_top = margin;
    }

    pub fn margin_bottom(&self) -> f64 {
        self.margin_bottom
    }

    pub fn set_margin_bottom(&mut self, margin: f64) {
        self.margin_bottom = margin;
    }

    /// Width left for content after horizontal margins
    pub fn content_width(&self) -> f64 {
        self.width - self.margin_left - self.margin_right
    }

    /// Height left for content after vertical margins
    pub fn content_height(&self) -> f64 {
        self.height - self.margin_top - self.margin_bottom
    }
}

impl XmlElement for PageFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        attrs.push_f64("width", self.width, DEFAULT_PAGE_WIDTH);
        attrs.push_f64("height", self.height, DEFAULT_PAGE_HEIGHT);
        attrs.push_string(
            "orientation",
            self.orientation.as_str(),
            Orientation::default().as_str(),
        );
        attrs.push_f64("marginLeft", self.margin_left, DEFAULT_MARGIN);
        attrs.push_f64("marginRight", self.margin_right, DEFAULT_MARGIN);
        attrs.push_f64("marginTop", self.margin_top, DEFAULT_MARGIN);
        attrs.push_f64("marginBottom", self.margin_bottom, DEFAULT_MARGIN);
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        self.width = attrs.take_f64("width", DEFAULT_PAGE_WIDTH)?;
        self.height = attrs.take_f64("height", DEFAULT_PAGE_HEIGHT)?;
        let orientation = attrs.take_string("orientation", Orientation::default().as_str());
        self.orientation = Orientation::parse("orientation", &orientation)?;
        self.margin_left = attrs.take_f64("marginLeft", DEFAULT_MARGIN)?;
        self.margin_right = attrs.take_f64("marginRight", DEFAULT_MARGIN)?;
        self.margin_top = attrs.take_f64("marginTop", DEFAULT_MARGIN)?;
        self.margin_bottom = attrs.take_f64("marginBottom", DEFAULT_MARGIN)?;
        Ok(())
    }
}

impl Format for PageFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn is_valid(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.margin_left >= 0.0
            && self.margin_right >= 0.0
            && self.margin_top >= 0.0
            && self.margin_bottom >= 0.0
            && self.content_width() > 0.0
            && self.content_height() > 0.0
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        fields.push(xml_io::codec::encode_f64(self.width));
        fields.push(xml_io::codec::encode_f64(self.height));
        fields.push(self.orientation.as_str().to_string());
        fields.push(xml_io::codec::encode_f64(self.margin_left));
        fields.push(xml_io::codec::encode_f64(self.margin_right));
        fields.push(xml_io::codec::encode_f64(self.margin_top));
        fields.push(xml_io::codec::encode_f64(self.margin_bottom));
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.width = fields.next_f64()?;
        self.height = fields.next_f64()?;
        let orientation = fields.next_string()?;
        self.orientation = Orientation::parse("orientation", &orientation)
            .map_err(|_| FormatError::MalformedDelimited(format!("bad orientation {orientation:?}")))?;
        self.margin_left = fields.next_f64()?;
        self.margin_right = fields.next_f64()?;
        self.margin_top = fields.next_f64()?;
        self.margin_bottom = fields.next_f64()?;
        Ok(())
    }

    fn to_css(&self) -> String {
        format!(
            "width: {}pt; height: {}pt; padding: {}pt {}pt {}pt {}pt;",
            xml_io::codec::encode_f64(self.width),
            xml_io::codec::encode_f64(self.height),
            xml_io::codec::encode_f64(self.margin_top),
            xml_io::codec::encode_f64(self.margin_right),
            xml_io::codec::encode_f64(self.margin_bottom),
            xml_io::codec::encode_f64(self.margin_left),
        )
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

fn fold_min(slot: &mut Option<f64>, value: f64) {
    *slot = Some(match *slot {
        Some(current) if current <= value => current,
        _ => value,
    });
}

/// Page summaries across a selection.
///
/// The `maximum_allowable_*_margin` family keeps its historical name: each
/// tracks the minimum across members of that member's allowable margin
/// (the page extent minus the opposite margin).
#[derive(Default)]
pub struct PageAggregation {
    membership: Membership,
    pub widths: FloatSet,
    pub heights: FloatSet,
    pub orientations: BTreeSet<Orientation>,
    pub margins_left: FloatSet,
    pub margins_right: FloatSet,
    pub margins_top: FloatSet,
    pub margins_bottom: FloatSet,
    maximum_allowable_left_margin: Option<f64>,
    maximum_allowable_right_margin: Option<f64>,
    maximum_allowable_top_margin: Option<f64>,
    maximum_allowable_bottom_margin: Option<f64>,
}

impl PageAggregation {
    pub fn maximum_allowable_left_margin(&self) -> Option<f64> {
        self.maximum_allowable_left_margin
    }

    pub fn maximum_allowable_right_margin(&self) -> Option<f64> {
        self.maximum_allowable_right_margin
    }

    pub fn maximum_allowable_top_margin(&self) -> Option<f64> {
        self.maximum_allowable_top_margin
    }

    pub fn maximum_allowable_bottom_margin(&self) -> Option<f64> {
        self.maximum_allowable_bottom_margin
    }

    fn fold(&mut self, page: &PageFormat) {
        self.widths.insert(page.width);
        self.heights.insert(page.height);
        self.orientations.insert(page.orientation);
        self.margins_left.insert(page.margin_left);
        self.margins_right.insert(page.margin_right);
        self.margins_top.insert(page.margin_top);
        self.margins_bottom.insert(page.margin_bottom);
        fold_min(&mut self.maximum_allowable_left_margin, page.width - page.margin_right);
        fold_min(&mut self.maximum_allowable_right_margin, page.width - page.margin_left);
        fold_min(&mut self.maximum_allowable_top_margin, page.height - page.margin_bottom);
        fold_min(&mut self.maximum_allowable_bottom_margin, page.height - page.margin_top);
    }

    fn reset(&mut self) {
        self.widths.clear();
        self.heights.clear();
        self.orientations.clear();
        self.margins_left.clear();
        self.margins_right.clear();
        self.margins_top.clear();
        self.margins_bottom.clear();
        self.maximum_allowable_left_margin = None;
        self.maximum_allowable_right_margin = None;
        self.maximum_allowable_top_margin = None;
        self.maximum_allowable_bottom_margin = None;
    }
}

impl Aggregation for PageAggregation {
    fn type_name(&self) -> &'static str {
        PageFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<PageFormat>() else {
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
        self.reset();
        for member in members {
            let guard = member.borrow();
            if let Some(concrete) = guard.as_any().downcast_ref::<PageFormat>() {
                self.fold(concrete);
            }
        }
    }

    fn clear(&mut self) {
        self.membership.clear();
        self.reset();
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
    fn test_default_page_is_letter_with_inch_margins() {
        let page = PageFormat::new();
        assert_eq!(page.width(), 612.0);
        assert_eq!(page.height(), 792.0);
        assert_eq!(page.content_width(), 468.0);
        assert!(page.is_valid());
        let xml = xml_io::element_to_string(&page).unwrap();
        assert_eq!(xml, "<PageFormat/>");
    }

    #[test]
    fn test_margins_exceeding_extent_invalidate() {
        let mut page = PageFormat::new();
        page.set_margin_left(400.0);
        page.set_margin_right(400.0);
        assert!(!page.is_valid());
    }

    #[test]
    fn test_allowable_margins_track_minimum_across_members() {
        let mut wide = PageFormat::new();
        wide.set_width(1000.0);
        wide.set_margin_right(100.0);
        let mut narrow = PageFormat::new();
        narrow.set_width(500.0);
        narrow.set_margin_right(50.0);

        let mut agg = PageAggregation::default();
        assert!(agg.add_format(&share(Box::new(wide)), false));
        assert_eq!(agg.maximum_allowable_left_margin(), Some(900.0));
        assert!(agg.add_format(&share(Box::new(narrow)), false));
        // min(1000 - 100, 500 - 50)
        assert_eq!(agg.maximum_allowable_left_margin(), Some(450.0));
    }

    #[test]
    fn test_xml_round_trip_with_landscape() {
        let mut page = PageFormat::new();
        page.set_orientation(Orientation::Landscape);
        page.set_margin_top(36.0);
        let xml = xml_io::element_to_string(&page).unwrap();
        let mut rebuilt = PageFormat::new();
        xml_io::XmlReader::from_str(&xml).read_element(&mut rebuilt).unwrap();
        assert_eq!(rebuilt, page);
    }
}
