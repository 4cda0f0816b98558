//! Embedded image format

use crate::aggregation::{Aggregation, FloatSet, Membership};
use crate::error::{FormatError, Result};
use crate::format::{
    base_capabilities, CapabilitySet, FieldReader, Format, SharedFormat,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use xml_io::{AttrMap, AttrWriter, XmlElement, XmlIoError};

/// How the image is fitted into its display rectangle.
///
/// `Unset` exists so a freshly inserted image is distinguishable from one
/// the user has already sized; formats stay `Unset` only until the insert
/// dialog commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ScalingMode {
    #[default]
    Unset,
    /// Natural pixel size
    Original,
    /// Largest size that fits the frame while keeping the aspect ratio
    FitToFrame,
    /// Fill the frame exactly, distorting if needed
    Stretch,
}

impl ScalingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingMode::Unset => "unset",
            ScalingMode::Original => "original",
            ScalingMode::FitToFrame => "fitToFrame",
            ScalingMode::Stretch => "stretch",
        }
    }

    pub fn parse(attribute: &str, text: &str) -> xml_io::Result<Self> {
        match text {
            "unset" => Ok(ScalingMode::Unset),
            "original" => Ok(ScalingMode::Original),
            "fitToFrame" => Ok(ScalingMode::FitToFrame),
            "stretch" => Ok(ScalingMode::Stretch),
            _ => Err(XmlIoError::MalformedValue {
                attribute: attribute.to_string(),
                value: text.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageFormat {
    path: String,
    scaling_mode: ScalingMode,
    width: f64,
    height: f64,
}

impl ImageFormat {
    pub const TYPE_NAME: &'static str = "ImageFormat";

    pub fn capability_names() -> CapabilitySet {
        let mut caps = base_capabilities();
        caps.insert(Self::TYPE_NAME);
        caps
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    pub fn scaling_mode(&self) -> ScalingMode {
        self.scaling_mode
    }

    pub fn set_scaling_mode(&mut self, mode: ScalingMode) {
        self.scaling_mode = mode;
    }

    /// Display width in points
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn set_width(&mut self, width: f64) {
        self.width = width;
    }

    /// Display height in points
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn set_height(&mut self, height: f64) {
        self.height = height;
    }
}

impl XmlElement for ImageFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        attrs.push_string("path", &self.path, "");
        attrs.push_string(
            "scalingMode",
            self.scaling_mode.as_str(),
            ScalingMode::default().as_str(),
        );
        attrs.push_f64("width", self.width, 0.0);
        attrs.push_f64("height", self.height, 0.0);
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        self.path = attrs.take_string("path", "");
        let mode = attrs.take_string("scalingMode", ScalingMode::default().as_str());
        self.scaling_mode = ScalingMode::parse("scalingMode", &mode)?;
        self.width = attrs.take_f64("width", 0.0)?;
        self.height = attrs.take_f64("height", 0.0)?;
        Ok(())
    }
}

impl Format for ImageFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn is_valid(&self) -> bool {
        self.scaling_mode != ScalingMode::Unset && self.width >= 0.0 && self.height >= 0.0
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        fields.push(self.path.clone());
        fields.push(self.scaling_mode.as_str().to_string());
        fields.push(xml_io::codec::encode_f64(self.width));
        fields.push(xml_io::codec::encode_f64(self.height));
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.path = fields.next_string()?;
        let mode = fields.next_string()?;
        self.scaling_mode = ScalingMode::parse("scalingMode", &mode)
            .map_err(|_| FormatError::MalformedDelimited(format!("bad scaling mode {mode:?}")))?;
        self.width = fields.next_f64()?;
        self.height = fields.next_f64()?;
        Ok(())
    }

    fn to_css(&self) -> String {
        let mut css = String::new();
        if self.width > 0.0 {
            css.push_str(&format!("width: {}pt; ", xml_io::codec::encode_f64(self.width)));
        }
        if self.height > 0.0 {
            css.push_str(&format!("height: {}pt; ", xml_io::codec::encode_f64(self.height)));
        }
        if self.scaling_mode == ScalingMode::Stretch {
            css.push_str("object-fit: fill; ");
        } else if self.scaling_mode == ScalingMode::FitToFrame {
            css.push_str("object-fit: contain; ");
        }
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
pub struct ImageAggregation {
    membership: Membership,
    pub paths: BTreeSet<String>,
    pub scaling_modes: BTreeSet<ScalingMode>,
    pub widths: FloatSet,
    pub heights: FloatSet,
}

impl ImageAggregation {
    fn fold(&mut self, format: &ImageFormat) {
        self.paths.insert(format.path.clone());
        self.scaling_modes.insert(format.scaling_mode);
        self.widths.insert(format.width);
        self.heights.insert(format.height);
    }

    fn reset(&mut self) {
        self.paths.clear();
        self.scaling_modes.clear();
        self.widths.clear();
        self.heights.clear();
    }
}

impl Aggregation for ImageAggregation {
    fn type_name(&self) -> &'static str {
        ImageFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<ImageFormat>() else {
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
            if let Some(concrete) = guard.as_any().downcast_ref::<ImageFormat>() {
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
