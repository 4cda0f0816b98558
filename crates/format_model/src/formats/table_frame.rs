//! Table frame format
//!
//! Defaults plus sparse per-index overrides. An override equal to the
//! current default is normalized away immediately, so the maps hold only
//! genuine deviations and serialization writes exactly those.
//!
//! Index conventions: value maps (widths, colors) are keyed by column or
//! row index; line maps are keyed by boundary index, so a table with N
//! columns has N + 1 vertical boundaries (0 = left edge, N = right edge).

use crate::aggregation::{Aggregation, FloatSet, Membership};
use crate::error::{FormatError, Result};
use crate::format::{base_capabilities, CapabilitySet, FieldReader, Format, SharedFormat};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use xml_io::{AttrMap, AttrWriter, Color, XmlElement, XmlIoError, XmlReader, XmlWriter};

pub const DEFAULT_GUTTER: f64 = 3.0;
pub const DEFAULT_LINE_WIDTH: f64 = 1.0;

// =============================================================================
// Component values
// =============================================================================

/// Width of one table column
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ColumnWidth {
    /// Sized to content
    #[default]
    Auto,
    /// Fixed width in points
    Fixed(f64),
}

impl ColumnWidth {
    fn encode(&self) -> String {
        match self {
            ColumnWidth::Auto => "auto".to_string(),
            ColumnWidth::Fixed(points) => xml_io::codec::encode_f64(*points),
        }
    }

    fn parse(attribute: &str, text: &str) -> xml_io::Result<Self> {
        if text == "auto" {
            return Ok(ColumnWidth::Auto);
        }
        Ok(ColumnWidth::Fixed(xml_io::codec::parse_f64(attribute, text)?))
    }
}

/// Stroke style of a frame line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum LineStyle {
    /// Not drawn
    None,
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineStyle::None => "none",
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::Dotted => "dotted",
        }
    }

    pub fn parse(attribute: &str, text: &str) -> xml_io::Result<Self> {
        match text {
            "none" => Ok(LineStyle::None),
            "solid" => Ok(LineStyle::Solid),
            "dashed" => Ok(LineStyle::Dashed),
            "dotted" => Ok(LineStyle::Dotted),
            _ => Err(XmlIoError::MalformedValue {
                attribute: attribute.to_string(),
                value: text.to_string(),
            }),
        }
    }
}

/// One boundary line: stroke width and style
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSetting {
    pub width: f64,
    pub style: LineStyle,
}

impl Default for LineSetting {
    fn default() -> Self {
        Self {
            width: DEFAULT_LINE_WIDTH,
            style: LineStyle::Solid,
        }
    }
}

// =============================================================================
// Sparse map remapping
// =============================================================================

/// Value-map remapping after removal of index `removed`: the entry at the
/// removed index is dropped and later entries shift down.
fn value_map_removed<V>(map: &mut BTreeMap<usize, V>, removed: usize) {
    let tail: Vec<(usize, V)> = map.split_off(&removed).into_iter().collect();
    for (index, value) in tail {
        if index > removed {
            map.insert(index - 1, value);
        }
    }
}

/// Value-map remapping after inserting `count` entries after index
/// `after`: entries beyond it shift up, inserted slots inherit defaults.
fn value_map_inserted<V>(map: &mut BTreeMap<usize, V>, after: usize, count: usize) {
    let tail: Vec<(usize, V)> = map.split_off(&(after + 1)).into_iter().collect();
    for (index, value) in tail {
        map.insert(index + count, value);
    }
}

/// Boundary-map remapping after removal of value index `removed`: the
/// trailing boundary `removed + 1` disappears and later boundaries shift.
fn boundary_map_removed<V>(map: &mut BTreeMap<usize, V>, removed: usize) {
    let tail: Vec<(usize, V)> = map.split_off(&(removed + 1)).into_iter().collect();
    for (index, value) in tail {
        if index > removed + 1 {
            map.insert(index - 1, value);
        }
    }
}

/// Boundary-map remapping after insertion of `count` values after index
/// `after`: boundaries up to `after + 1` keep their position.
fn boundary_map_inserted<V>(map: &mut BTreeMap<usize, V>, after: usize, count: usize) {
    let tail: Vec<(usize, V)> = map.split_off(&(after + 2)).into_iter().collect();
    for (index, value) in tail {
        map.insert(index + count, value);
    }
}

// =============================================================================
// TableFrameFormat
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableFrameFormat {
    default_column_width: ColumnWidth,
    default_column_line: LineSetting,
    default_row_line: LineSetting,
    default_cell_color: Color,
    gutter_left: f64,
    gutter_right: f64,
    gutter_top: f64,
    gutter_bottom: f64,
    column_widths: BTreeMap<usize, ColumnWidth>,
    column_lines: BTreeMap<usize, LineSetting>,
    row_lines: BTreeMap<usize, LineSetting>,
    column_colors: BTreeMap<usize, Color>,
    row_colors: BTreeMap<usize, Color>,
    cell_colors: BTreeMap<(usize, usize), Color>,
}

impl Default for TableFrameFormat {
    fn default() -> Self {
        Self {
            default_column_width: ColumnWidth::Auto,
            default_column_line: LineSetting::default(),
            default_row_line: LineSetting::default(),
            default_cell_color: Color::TRANSPARENT,
            gutter_left: DEFAULT_GUTTER,
            gutter_right: DEFAULT_GUTTER,
            gutter_top: DEFAULT_GUTTER,
            gutter_bottom: DEFAULT_GUTTER,
            column_widths: BTreeMap::new(),
            column_lines: BTreeMap::new(),
            row_lines: BTreeMap::new(),
            column_colors: BTreeMap::new(),
            row_colors: BTreeMap::new(),
            cell_colors: BTreeMap::new(),
        }
    }
}

impl TableFrameFormat {
    pub const TYPE_NAME: &'static str = "TableFrameFormat";

    pub fn capability_names() -> CapabilitySet {
        let mut caps = base_capabilities();
        caps.insert(Self::TYPE_NAME);
        caps
    }

    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Defaults and gutters
    // -------------------------------------------------------------------------

    pub fn default_column_width(&self) -> ColumnWidth {
        self.default_column_width
    }

    pub fn set_default_column_width(&mut self, width: ColumnWidth) {
        self.default_column_width = width;
        self.column_widths.retain(|_, w| *w != width);
    }

    pub fn default_column_line(&self) -> LineSetting {
        self.default_column_line
    }

    pub fn set_default_column_line(&mut self, line: LineSetting) {
        self.default_column_line = line;
        self.column_lines.retain(|_, l| *l != line);
    }

    pub fn default_row_line(&self) -> LineSetting {
        self.default_row_line
    }

    pub fn set_default_row_line(&mut self, line: LineSetting) {
        self.default_row_line = line;
        self.row_lines.retain(|_, l| *l != line);
    }

    pub fn default_cell_color(&self) -> Color {
        self.default_cell_color
    }

    pub fn set_default_cell_color(&mut self, color: Color) {
        self.default_cell_color = color;
    }

    pub fn gutter_left(&self) -> f64 {
        self.gutter_left
    }

    pub fn gutter_right(&self) -> f64 {
        self.gutter_right
    }

    pub fn gutter_top(&self) -> f64 {
        self.gutter_top
    }

    pub fn gutter_bottom(&self) -> f64 {
        self.gutter_bottom
    }

    pub fn set_gutters(&mut self, left: f64, right: f64, top: f64, bottom: f64) {
        self.gutter_left = left;
        self.gutter_right = right;
        self.gutter_top = top;
        self.gutter_bottom = bottom;
    }

    // -------------------------------------------------------------------------
    // Column widths
    // -------------------------------------------------------------------------

    /// Effective width of a column, override or default
    pub fn column_width(&self, column: usize) -> ColumnWidth {
        self.column_widths
            .get(&column)
            .copied()
            .unwrap_or(self.default_column_width)
    }

    pub fn set_column_width(&mut self, column: usize, width: ColumnWidth) {
        if width == self.default_column_width {
            self.column_widths.remove(&column);
        } else {
            self.column_widths.insert(column, width);
        }
    }

    pub fn column_width_maps_to_default(&self, column: usize) -> bool {
        !self.column_widths.contains_key(&column)
    }

    // -------------------------------------------------------------------------
    // Boundary lines
    // -------------------------------------------------------------------------

    /// Vertical line at a column boundary (0 = left table edge)
    pub fn column_line(&self, boundary: usize) -> LineSetting {
        self.column_lines
            .get(&boundary)
            .copied()
            .unwrap_or(self.default_column_line)
    }

    pub fn set_column_line(&mut self, boundary: usize, line: LineSetting) {
        if line == self.default_column_line {
            self.column_lines.remove(&boundary);
        } else {
            self.column_lines.insert(boundary, line);
        }
    }

    pub fn column_line_maps_to_default(&self, boundary: usize) -> bool {
        !self.column_lines.contains_key(&boundary)
    }

    /// Horizontal line at a row boundary (0 = top table edge)
    pub fn row_line(&self, boundary: usize) -> LineSetting {
        self.row_lines
            .get(&boundary)
            .copied()
            .unwrap_or(self.default_row_line)
    }

    pub fn set_row_line(&mut self, boundary: usize, line: LineSetting) {
        if line == self.default_row_line {
            self.row_lines.remove(&boundary);
        } else {
            self.row_lines.insert(boundary, line);
        }
    }

    pub fn row_line_maps_to_default(&self, boundary: usize) -> bool {
        !self.row_lines.contains_key(&boundary)
    }

    // -------------------------------------------------------------------------
    // Colors
    // -------------------------------------------------------------------------

    /// Raw column color override, if any
    pub fn column_color(&self, column: usize) -> Option<Color> {
        self.column_colors.get(&column).copied()
    }

    pub fn set_column_color(&mut self, column: usize, color: Option<Color>) {
        match color {
            Some(color) => {
                self.column_colors.insert(column, color);
            }
            None => {
                self.column_colors.remove(&column);
            }
        }
    }

    /// Raw row color override, if any
    pub fn row_color(&self, row: usize) -> Option<Color> {
        self.row_colors.get(&row).copied()
    }

    pub fn set_row_color(&mut self, row: usize, color: Option<Color>) {
        match color {
            Some(color) => {
                self.row_colors.insert(row, color);
            }
            None => {
                self.row_colors.remove(&row);
            }
        }
    }

    /// Raw cell color override, if any
    pub fn cell_color(&self, row: usize, column: usize) -> Option<Color> {
        self.cell_colors.get(&(row, column)).copied()
    }

    pub fn set_cell_color(&mut self, row: usize, column: usize, color: Option<Color>) {
        match color {
            Some(color) => {
                self.cell_colors.insert((row, column), color);
            }
            None => {
                self.cell_colors.remove(&(row, column));
            }
        }
    }

    pub fn cell_color_maps_to_default(&self, row: usize, column: usize) -> bool {
        !self.cell_colors.contains_key(&(row, column))
    }

    /// Effective cell color: alpha-over blend of default, then column,
    /// row, and cell overrides, most specific last
    pub fn blended_color(&self, row: usize, column: usize) -> Color {
        let mut color = self.default_cell_color;
        if let Some(column_color) = self.column_color(column) {
            color = color.blend(column_color);
        }
        if let Some(row_color) = self.row_color(row) {
            color = color.blend(row_color);
        }
        if let Some(cell_color) = self.cell_color(row, column) {
            color = color.blend(cell_color);
        }
        color
    }

    // -------------------------------------------------------------------------
    // Structural edits
    // -------------------------------------------------------------------------

    /// A column was removed from the table; overrides at later indices
    /// keep following their columns.
    pub fn column_removed(&mut self, column: usize) {
        value_map_removed(&mut self.column_widths, column);
        value_map_removed(&mut self.column_colors, column);
        boundary_map_removed(&mut self.column_lines, column);
        let cells = std::mem::take(&mut self.cell_colors);
        for ((row, col), color) in cells {
            match col.cmp(&column) {
                std::cmp::Ordering::Less => {
                    self.cell_colors.insert((row, col), color);
                }
                std::cmp::Ordering::Equal => {}
                std::cmp::Ordering::Greater => {
                    self.cell_colors.insert((row, col - 1), color);
                }
            }
        }
    }

    /// A row was removed from the table
    pub fn row_removed(&mut self, row: usize) {
        value_map_removed(&mut self.row_colors, row);
        boundary_map_removed(&mut self.row_lines, row);
        let cells = std::mem::take(&mut self.cell_colors);
        for ((r, col), color) in cells {
            match r.cmp(&row) {
                std::cmp::Ordering::Less => {
                    self.cell_colors.insert((r, col), color);
                }
                std::cmp::Ordering::Equal => {}
                std::cmp::Ordering::Greater => {
                    self.cell_colors.insert((r - 1, col), color);
                }
            }
        }
    }

    /// `count` columns were inserted after column `after`; the new columns
    /// carry defaults.
    pub fn columns_inserted(&mut self, after: usize, count: usize) {
        value_map_inserted(&mut self.column_widths, after, count);
        value_map_inserted(&mut self.column_colors, after, count);
        boundary_map_inserted(&mut self.column_lines, after, count);
        let cells = std::mem::take(&mut self.cell_colors);
        for ((row, col), color) in cells {
            let col = if col > after { col + count } else { col };
            self.cell_colors.insert((row, col), color);
        }
    }

    /// `count` rows were inserted after row `after`
    pub fn rows_inserted(&mut self, after: usize, count: usize) {
        value_map_inserted(&mut self.row_colors, after, count);
        boundary_map_inserted(&mut self.row_lines, after, count);
        let cells = std::mem::take(&mut self.cell_colors);
        for ((row, col), color) in cells {
            let row = if row > after { row + count } else { row };
            self.cell_colors.insert((row, col), color);
        }
    }

    /// Cells merge into the anchor at (row, column); cell color overrides
    /// inside the merged rectangle vanish except the anchor's own. Row,
    /// column, and line overrides are untouched.
    pub fn merge_cells(&mut self, row: usize, column: usize, merge_right: usize, merge_down: usize) {
        self.cell_colors.retain(|&(r, c), _| {
            let inside = r >= row && r <= row + merge_down && c >= column && c <= column + merge_right;
            !inside || (r == row && c == column)
        });
    }

    /// Number of explicit overrides of every kind; zero means the frame
    /// is fully described by its defaults.
    pub fn override_count(&self) -> usize {
        self.column_widths.len()
            + self.column_lines.len()
            + self.row_lines.len()
            + self.column_colors.len()
            + self.row_colors.len()
            + self.cell_colors.len()
    }

    // -------------------------------------------------------------------------
    // XML children
    // -------------------------------------------------------------------------

    fn read_column_width(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        let index: usize = attrs.take_int("index", 0)?;
        let text = attrs.take_required_string("width")?;
        let width = ColumnWidth::parse("width", &text)?;
        self.column_widths.insert(index, width);
        Ok(())
    }

    fn read_line(&mut self, attrs: &mut AttrMap, vertical: bool) -> xml_io::Result<()> {
        let index: usize = attrs.take_int("index", 0)?;
        let width = attrs.take_f64("width", DEFAULT_LINE_WIDTH)?;
        let style_text = attrs.take_string("style", LineStyle::default().as_str());
        let style = LineStyle::parse("style", &style_text)?;
        let line = LineSetting { width, style };
        if vertical {
            self.column_lines.insert(index, line);
        } else {
            self.row_lines.insert(index, line);
        }
        Ok(())
    }
}

impl XmlElement for TableFrameFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        attrs.push_string(
            "defaultColumnWidth",
            &self.default_column_width.encode(),
            &ColumnWidth::Auto.encode(),
        );
        let line_defaults = LineSetting::default();
        attrs.push_f64("columnLineWidth", self.default_column_line.width, line_defaults.width);
        attrs.push_string(
            "columnLineStyle",
            self.default_column_line.style.as_str(),
            line_defaults.style.as_str(),
        );
        attrs.push_f64("rowLineWidth", self.default_row_line.width, line_defaults.width);
        attrs.push_string(
            "rowLineStyle",
            self.default_row_line.style.as_str(),
            line_defaults.style.as_str(),
        );
        attrs.push_color("cellColor", self.default_cell_color, Color::TRANSPARENT);
        attrs.push_f64("gutterLeft", self.gutter_left, DEFAULT_GUTTER);
        attrs.push_f64("gutterRight", self.gutter_right, DEFAULT_GUTTER);
        attrs.push_f64("gutterTop", self.gutter_top, DEFAULT_GUTTER);
        attrs.push_f64("gutterBottom", self.gutter_bottom, DEFAULT_GUTTER);
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        let width_text = attrs.take_string("defaultColumnWidth", &ColumnWidth::Auto.encode());
        self.default_column_width = ColumnWidth::parse("defaultColumnWidth", &width_text)?;
        let line_defaults = LineSetting::default();
        self.default_column_line = LineSetting {
            width: attrs.take_f64("columnLineWidth", line_defaults.width)?,
            style: LineStyle::parse(
                "columnLineStyle",
                &attrs.take_string("columnLineStyle", line_defaults.style.as_str()),
            )?,
        };
        self.default_row_line = LineSetting {
            width: attrs.take_f64("rowLineWidth", line_defaults.width)?,
            style: LineStyle::parse(
                "rowLineStyle",
                &attrs.take_string("rowLineStyle", line_defaults.style.as_str()),
            )?,
        };
        self.default_cell_color = attrs.take_color("cellColor", Color::TRANSPARENT)?;
        self.gutter_left = attrs.take_f64("gutterLeft", DEFAULT_GUTTER)?;
        self.gutter_right = attrs.take_f64("gutterRight", DEFAULT_GUTTER)?;
        self.gutter_top = attrs.take_f64("gutterTop", DEFAULT_GUTTER)?;
        self.gutter_bottom = attrs.take_f64("gutterBottom", DEFAULT_GUTTER)?;
        self.column_widths.clear();
        self.column_lines.clear();
        self.row_lines.clear();
        self.column_colors.clear();
        self.row_colors.clear();
        self.cell_colors.clear();
        Ok(())
    }

    fn has_children(&self) -> bool {
        self.override_count() > 0
    }

    fn write_children(&self, writer: &mut XmlWriter) -> xml_io::Result<()> {
        for (index, width) in &self.column_widths {
            let mut attrs = AttrWriter::new();
            attrs.push("index", index.to_string());
            attrs.push("width", width.encode());
            writer.write_empty_child("ColumnWidth", &attrs)?;
        }
        for (index, line) in &self.column_lines {
            let mut attrs = AttrWriter::new();
            attrs.push("index", index.to_string());
            attrs.push_f64("width", line.width, DEFAULT_LINE_WIDTH);
            attrs.push_string("style", line.style.as_str(), LineStyle::default().as_str());
            writer.write_empty_child("VerticalLine", &attrs)?;
        }
        for (index, line) in &self.row_lines {
            let mut attrs = AttrWriter::new();
            attrs.push("index", index.to_string());
            attrs.push_f64("width", line.width, DEFAULT_LINE_WIDTH);
            attrs.push_string("style", line.style.as_str(), LineStyle::default().as_str());
            writer.write_empty_child("HorizontalLine", &attrs)?;
        }
        for (index, color) in &self.column_colors {
            let mut attrs = AttrWriter::new();
            attrs.push("index", index.to_string());
            attrs.push("color", color.to_hex());
            writer.write_empty_child("ColumnColor", &attrs)?;
        }
        for (index, color) in &self.row_colors {
            let mut attrs = AttrWriter::new();
            attrs.push("index", index.to_string());
            attrs.push("color", color.to_hex());
            writer.write_empty_child("RowColor", &attrs)?;
        }
        for ((row, column), color) in &self.cell_colors {
            let mut attrs = AttrWriter::new();
            attrs.push("row", row.to_string());
            attrs.push("column", column.to_string());
            attrs.push("color", color.to_hex());
            writer.write_empty_child("CellColor", &attrs)?;
        }
        Ok(())
    }

    fn read_child(
        &mut self,
        reader: &mut XmlReader,
        mut attrs: AttrMap,
        is_empty: bool,
    ) -> xml_io::Result<()> {
        let tag = attrs.tag_name().to_string();
        match tag.as_str() {
            "ColumnWidth" => self.read_column_width(&mut attrs)?,
            "VerticalLine" => self.read_line(&mut attrs, true)?,
            "HorizontalLine" => self.read_line(&mut attrs, false)?,
            "ColumnColor" => {
                let index: usize = attrs.take_int("index", 0)?;
                let color = attrs.take_color("color", Color::TRANSPARENT)?;
                self.column_colors.insert(index, color);
            }
            "RowColor" => {
                let index: usize = attrs.take_int("index", 0)?;
                let color = attrs.take_color("color", Color::TRANSPARENT)?;
                self.row_colors.insert(index, color);
            }
            "CellColor" => {
                let row: usize = attrs.take_int("row", 0)?;
                let column: usize = attrs.take_int("column", 0)?;
                let color = attrs.take_color("color", Color::TRANSPARENT)?;
                self.cell_colors.insert((row, column), color);
            }
            _ => {
                return Err(XmlIoError::UnexpectedChild {
                    parent: Self::TYPE_NAME.to_string(),
                    child: tag,
                });
            }
        }
        attrs.finish()?;
        if !is_empty {
            reader.skip_element(&tag)?;
        }
        Ok(())
    }
}

impl Format for TableFrameFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn is_valid(&self) -> bool {
        self.gutter_left >= 0.0
            && self.gutter_right >= 0.0
            && self.gutter_top >= 0.0
            && self.gutter_bottom >= 0.0
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        fields.push(self.default_column_width.encode());
        fields.push(xml_io::codec::encode_f64(self.default_column_line.width));
        fields.push(self.default_column_line.style.as_str().to_string());
        fields.push(xml_io::codec::encode_f64(self.default_row_line.width));
        fields.push(self.default_row_line.style.as_str().to_string());
        fields.push(self.default_cell_color.to_hex());
        fields.push(xml_io::codec::encode_f64(self.gutter_left));
        fields.push(xml_io::codec::encode_f64(self.gutter_right));
        fields.push(xml_io::codec::encode_f64(self.gutter_top));
        fields.push(xml_io::codec::encode_f64(self.gutter_bottom));
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        let width_text = fields.next_string()?;
        self.default_column_width = ColumnWidth::parse("defaultColumnWidth", &width_text)
            .map_err(|_| FormatError::MalformedDelimited(format!("bad column width {width_text:?}")))?;
        let column_width = fields.next_f64()?;
        let column_style = fields.next_string()?;
        self.default_column_line = LineSetting {
            width: column_width,
            style: LineStyle::parse("columnLineStyle", &column_style)
                .map_err(|_| FormatError::MalformedDelimited(format!("bad line style {column_style:?}")))?,
        };
        let row_width = fields.next_f64()?;
        let row_style = fields.next_string()?;
        self.default_row_line = LineSetting {
            width: row_width,
            style: LineStyle::parse("rowLineStyle", &row_style)
                .map_err(|_| FormatError::MalformedDelimited(format!("bad line style {row_style:?}")))?,
        };
        self.default_cell_color = fields.next_color()?;
        self.gutter_left = fields.next_f64()?;
        self.gutter_right = fields.next_f64()?;
        self.gutter_top = fields.next_f64()?;
        self.gutter_bottom = fields.next_f64()?;
        Ok(())
    }

    fn to_css(&self) -> String {
        let mut css = format!(
            "border: {}pt {} currentColor; padding: {}pt {}pt {}pt {}pt;",
            xml_io::codec::encode_f64(self.default_column_line.width),
            self.default_column_line.style.as_str(),
            xml_io::codec::encode_f64(self.gutter_top),
            xml_io::codec::encode_f64(self.gutter_right),
            xml_io::codec::encode_f64(self.gutter_bottom),
            xml_io::codec::encode_f64(self.gutter_left),
        );
        if self.default_cell_color != Color::TRANSPARENT {
            css.push_str(&format!(" background-color: {};", self.default_cell_color.to_css()));
        }
        css
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
pub struct TableFrameAggregation {
    membership: Membership,
    pub default_cell_colors: BTreeSet<Color>,
    pub line_widths: FloatSet,
    pub line_styles: BTreeSet<LineStyle>,
    pub gutters: FloatSet,
}

impl TableFrameAggregation {
    fn fold(&mut self, format: &TableFrameFormat) {
        self.default_cell_colors.insert(format.default_cell_color);
        self.line_widths.insert(format.default_column_line.width);
        self.line_widths.insert(format.default_row_line.width);
        self.line_styles.insert(format.default_column_line.style);
        self.line_styles.insert(format.default_row_line.style);
        self.gutters.insert(format.gutter_left);
        self.gutters.insert(format.gutter_right);
        self.gutters.insert(format.gutter_top);
        self.gutters.insert(format.gutter_bottom);
    }

    fn reset(&mut self) {
        self.default_cell_colors.clear();
        self.line_widths.clear();
        self.line_styles.clear();
        self.gutters.clear();
    }
}

impl Aggregation for TableFrameAggregation {
    fn type_name(&self) -> &'static str {
        TableFrameFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(concrete) = guard.as_any().downcast_ref::<TableFrameFormat>() else {
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
            if let Some(concrete) = guard.as_any().downcast_ref::<TableFrameFormat>() {
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

    fn opaque(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, a: 0xFF }
    }

    #[test]
    fn test_override_equal_to_default_is_removed() {
        let mut frame = TableFrameFormat::new();
        frame.set_column_width(2, ColumnWidth::Fixed(120.0));
        assert!(!frame.column_width_maps_to_default(2));
        frame.set_column_width(2, ColumnWidth::Auto);
        assert!(frame.column_width_maps_to_default(2));
        assert_eq!(frame.override_count(), 0);
    }

    #[test]
    fn test_changing_default_drops_now_redundant_overrides() {
        let mut frame = TableFrameFormat::new();
        frame.set_column_width(0, ColumnWidth::Fixed(90.0));
        frame.set_column_width(1, ColumnWidth::Fixed(50.0));
        frame.set_default_column_width(ColumnWidth::Fixed(90.0));
        assert!(frame.column_width_maps_to_default(0));
        assert_eq!(frame.column_width(1), ColumnWidth::Fixed(50.0));
    }

    #[test]
    fn test_column_removed_remaps_values_and_boundaries() {
        let mut frame = TableFrameFormat::new();
        frame.set_column_width(0, ColumnWidth::Fixed(10.0));
        frame.set_column_width(1, ColumnWidth::Fixed(20.0));
        frame.set_column_width(2, ColumnWidth::Fixed(30.0));
        let thick = LineSetting { width: 3.0, style: LineStyle::Solid };
        frame.set_column_line(1, thick);
        frame.set_column_line(2, thick);
        frame.set_column_line(3, thick);

        frame.column_removed(1);

        assert_eq!(frame.column_width(0), ColumnWidth::Fixed(10.0));
        assert_eq!(frame.column_width(1), ColumnWidth::Fixed(30.0));
        assert!(frame.column_width_maps_to_default(2));
        // Boundary 2 (the removed column's trailing edge) is gone;
        // boundary 3 became boundary 2.
        assert_eq!(frame.column_line(1), thick);
        assert_eq!(frame.column_line(2), thick);
        assert!(frame.column_line_maps_to_default(3));
    }

    #[test]
    fn test_rows_inserted_in_three_by_two_table() {
        // 3x2 table, overrides on every row, insert 2 rows after row 0.
        let mut frame = TableFrameFormat::new();
        frame.set_row_color(0, Some(opaque(10, 0, 0)));
        frame.set_row_color(1, Some(opaque(20, 0, 0)));
        frame.set_row_color(2, Some(opaque(30, 0, 0)));
        let dashed = LineSetting { width: 1.0, style: LineStyle::Dashed };
        frame.set_row_line(1, dashed);
        frame.set_row_line(3, dashed);

        frame.rows_inserted(0, 2);

        assert_eq!(frame.row_color(0), Some(opaque(10, 0, 0)));
        assert_eq!(frame.row_color(1), None);
        assert_eq!(frame.row_color(2), None);
        assert_eq!(frame.row_color(3), Some(opaque(20, 0, 0)));
        assert_eq!(frame.row_color(4), Some(opaque(30, 0, 0)));
        // Boundary 1 hugs the insertion point and stays; boundary 3
        // follows its row down.
        assert_eq!(frame.row_line(1), dashed);
        assert!(frame.row_line_maps_to_default(3));
        assert_eq!(frame.row_line(5), dashed);
    }

    #[test]
    fn test_cell_overrides_follow_structural_edits() {
        // 3x2 table, cell override at (1, 2): dropping column 1 pulls it
        // to (1, 1), inserting a row after row 0 pushes it to (2, 1).
        let mut frame = TableFrameFormat::new();
        frame.set_cell_color(1, 2, Some(opaque(40, 0, 0)));
        frame.set_cell_color(1, 1, Some(opaque(50, 0, 0)));
        frame.set_row_color(1, Some(opaque(60, 0, 0)));

        frame.column_removed(1);
        assert_eq!(frame.cell_color(1, 1), Some(opaque(40, 0, 0)));
        assert_eq!(frame.cell_color(1, 2), None);

        frame.rows_inserted(0, 1);
        assert_eq!(frame.cell_color(2, 1), Some(opaque(40, 0, 0)));
        assert_eq!(frame.cell_color(1, 1), None);
        assert_eq!(frame.row_color(2), Some(opaque(60, 0, 0)));
        assert_eq!(frame.row_color(1), None);
        assert_eq!(frame.override_count(), 2);
    }

    #[test]
    fn test_merge_cells_keeps_anchor_override() {
        let mut frame = TableFrameFormat::new();
        frame.set_cell_color(0, 0, Some(opaque(1, 1, 1)));
        frame.set_cell_color(0, 1, Some(opaque(2, 2, 2)));
        frame.set_cell_color(1, 0, Some(opaque(3, 3, 3)));
        frame.set_cell_color(1, 1, Some(opaque(4, 4, 4)));
        frame.set_cell_color(2, 2, Some(opaque(5, 5, 5)));

        frame.merge_cells(0, 0, 1, 1);

        assert_eq!(frame.cell_color(0, 0), Some(opaque(1, 1, 1)));
        assert_eq!(frame.cell_color(0, 1), None);
        assert_eq!(frame.cell_color(1, 0), None);
        assert_eq!(frame.cell_color(1, 1), None);
        assert_eq!(frame.cell_color(2, 2), Some(opaque(5, 5, 5)));
    }

    #[test]
    fn test_blended_color_layers_most_specific_last() {
        let mut frame = TableFrameFormat::new();
        frame.set_default_cell_color(opaque(100, 100, 100));
        frame.set_column_color(0, Some(opaque(0, 200, 0)));
        frame.set_row_color(0, Some(Color { r: 200, g: 0, b: 0, a: 0 }));
        // Transparent row override leaves the column color visible.
        assert_eq!(frame.blended_color(0, 0), opaque(0, 200, 0));
        frame.set_cell_color(0, 0, Some(opaque(1, 2, 3)));
        assert_eq!(frame.blended_color(0, 0), opaque(1, 2, 3));
        // Untouched cell falls back to the default.
        assert_eq!(frame.blended_color(5, 5), opaque(100, 100, 100));
    }

    #[test]
    fn test_xml_round_trip_with_overrides() {
        let mut frame = TableFrameFormat::new();
        frame.set_default_cell_color(opaque(240, 240, 240));
        frame.set_column_width(1, ColumnWidth::Fixed(144.0));
        frame.set_column_line(0, LineSetting { width: 2.0, style: LineStyle::Dotted });
        frame.set_row_color(2, Some(opaque(255, 0, 0)));
        frame.set_cell_color(1, 1, Some(opaque(0, 0, 255)));

        let xml = xml_io::element_to_string(&frame).unwrap();
        let mut rebuilt = TableFrameFormat::new();
        XmlReader::from_str(&xml).read_element(&mut rebuilt).unwrap();
        assert_eq!(rebuilt, frame);
    }

    #[test]
    fn test_unknown_child_tag_is_a_hard_error() {
        let xml = "<TableFrameFormat><Sparkle index=\"0\"/></TableFrameFormat>";
        let mut frame = TableFrameFormat::new();
        let err = XmlReader::from_str(xml).read_element(&mut frame).unwrap_err();
        assert!(matches!(err, XmlIoError::UnexpectedChild { .. }));
    }
}
