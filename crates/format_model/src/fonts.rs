//! Font description flyweight
//!
//! Identical font descriptions are interned in a process-wide,
//! reference-counted cache, giving `FontFormat` cheap copy and compare
//! semantics: copying a format bumps a counter, comparing is usually a
//! pointer comparison, and an entry disappears when its last holder does.
//!
//! The production model is single-threaded, but the cache sits behind a
//! mutex so that multi-threaded hosts (and the test harness) stay sound.

use crate::aggregation::{Aggregation, FloatSet, Membership, TriState};
use crate::error::Result;
use crate::format::{
    base_capabilities, AttributeLayer, CapabilitySet, FieldReader, Format, SharedFormat,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use xml_io::{AttrMap, AttrWriter, Color, XmlElement};

// =============================================================================
// Font attribute tuple
// =============================================================================

/// Immutable font description tuple; the interning key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontAttributes {
    pub family: String,
    /// Point size
    pub point_size: f64,
    /// CSS-like weight, 100..=900; 400 regular, 700 bold
    pub weight: u16,
    pub italic: bool,
    pub underline: bool,
    pub overline: bool,
    pub strikeout: bool,
    /// Additional letter spacing in points
    pub letter_spacing: f64,
    pub color: Color,
    pub background: Color,
}

impl Default for FontAttributes {
    fn default() -> Self {
        Self {
            family: "Sans".to_string(),
            point_size: 12.0,
            weight: 400,
            italic: false,
            underline: false,
            overline: false,
            strikeout: false,
            letter_spacing: 0.0,
            color: Color::BLACK,
            background: Color::TRANSPARENT,
        }
    }
}

// Float fields compare and hash by bit pattern; NaN never enters the model.
impl PartialEq for FontAttributes {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family
            && self.point_size.to_bits() == other.point_size.to_bits()
            && self.weight == other.weight
            && self.italic == other.italic
            && self.underline == other.underline
            && self.overline == other.overline
            && self.strikeout == other.strikeout
            && self.letter_spacing.to_bits() == other.letter_spacing.to_bits()
            && self.color == other.color
            && self.background == other.background
    }
}

impl Eq for FontAttributes {}

impl Hash for FontAttributes {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.point_size.to_bits().hash(state);
        self.weight.hash(state);
        self.italic.hash(state);
        self.underline.hash(state);
        self.overline.hash(state);
        self.strikeout.hash(state);
        self.letter_spacing.to_bits().hash(state);
        self.color.hash(state);
        self.background.hash(state);
    }
}

// =============================================================================
// Flyweight cache
// =============================================================================

struct CacheEntry {
    refs: usize,
    shared: Arc<FontAttributes>,
}

/// Interned, reference-counted store of font attribute tuples
pub struct FontCache {
    entries: Mutex<HashMap<FontAttributes, CacheEntry>>,
}

static GLOBAL_FONT_CACHE: Lazy<FontCache> = Lazy::new(|| FontCache {
    entries: Mutex::new(HashMap::new()),
});

impl FontCache {
    /// The process-wide cache every `FontFormat` interns through
    pub fn global() -> &'static FontCache {
        &GLOBAL_FONT_CACHE
    }

    /// Look up or insert the tuple; a hit increments the reference count,
    /// an insert starts it at one
    pub fn acquire(&self, attrs: &FontAttributes) -> Arc<FontAttributes> {
        let mut entries = self.entries.lock().expect("font cache poisoned");
        if let Some(entry) = entries.get_mut(attrs) {
            entry.refs += 1;
            return Arc::clone(&entry.shared);
        }
        let shared = Arc::new(attrs.clone());
        entries.insert(
            attrs.clone(),
            CacheEntry {
                refs: 1,
                shared: Arc::clone(&shared),
            },
        );
        shared
    }

    /// Decrement the tuple's reference count, erasing the entry at zero
    pub fn release(&self, attrs: &FontAttributes) {
        let mut entries = self.entries.lock().expect("font cache poisoned");
        match entries.get_mut(attrs) {
            Some(entry) if entry.refs > 1 => entry.refs -= 1,
            Some(_) => {
                entries.remove(attrs);
            }
            None => {
                tracing::warn!(family = %attrs.family, "released a font tuple absent from the cache");
            }
        }
    }

    /// Number of distinct interned tuples; a test probe
    pub fn entry_count(&self) -> usize {
        self.entries.lock().expect("font cache poisoned").len()
    }

    /// Live holder count for a tuple; zero when not interned
    pub fn use_count(&self, attrs: &FontAttributes) -> usize {
        self.entries
            .lock()
            .expect("font cache poisoned")
            .get(attrs)
            .map(|entry| entry.refs)
            .unwrap_or(0)
    }
}

// =============================================================================
// FontFormat
// =============================================================================

/// Font description format; flyweight-backed.
///
/// Also serves as the font attribute layer for every composed format
/// (operators, data types, value fields, ...).
#[derive(Debug)]
pub struct FontFormat {
    attrs: Arc<FontAttributes>,
}

impl FontFormat {
    pub const TYPE_NAME: &'static str = "FontFormat";

    pub fn capability_names() -> CapabilitySet {
        let mut caps = base_capabilities();
        caps.insert(Self::TYPE_NAME);
        caps
    }

    pub fn new() -> Self {
        Self::from_attributes(FontAttributes::default())
    }

    /// Construct with the commonly edited subset
    pub fn configure(family: &str, point_size: f64, weight: u16, italic: bool) -> Self {
        Self::from_attributes(FontAttributes {
            family: family.to_string(),
            point_size,
            weight,
            italic,
            ..FontAttributes::default()
        })
    }

    pub fn from_attributes(attrs: FontAttributes) -> Self {
        Self {
            attrs: FontCache::global().acquire(&attrs),
        }
    }

    pub fn attributes(&self) -> &FontAttributes {
        &self.attrs
    }

    pub fn family(&self) -> &str {
        &self.attrs.family
    }

    pub fn point_size(&self) -> f64 {
        self.attrs.point_size
    }

    pub fn weight(&self) -> u16 {
        self.attrs.weight
    }

    pub fn is_italic(&self) -> bool {
        self.attrs.italic
    }

    pub fn is_underline(&self) -> bool {
        self.attrs.underline
    }

    pub fn is_overline(&self) -> bool {
        self.attrs.overline
    }

    pub fn is_strikeout(&self) -> bool {
        self.attrs.strikeout
    }

    pub fn letter_spacing(&self) -> f64 {
        self.attrs.letter_spacing
    }

    pub fn color(&self) -> Color {
        self.attrs.color
    }

    pub fn background(&self) -> Color {
        self.attrs.background
    }

    /// Swap the interned tuple: release the old entry, intern the new one.
    /// No-op when the value is unchanged.
    fn replace(&mut self, new: FontAttributes) {
        if *self.attrs == new {
            return;
        }
        let old = (*self.attrs).clone();
        self.attrs = FontCache::global().acquire(&new);
        FontCache::global().release(&old);
    }

    fn modify(&mut self, change: impl FnOnce(&mut FontAttributes)) {
        let mut copy = (*self.attrs).clone();
        change(&mut copy);
        self.replace(copy);
    }

    pub fn set_family(&mut self, family: &str) {
        self.modify(|a| a.family = family.to_string());
    }

    pub fn set_point_size(&mut self, point_size: f64) {
        self.modify(|a| a.point_size = point_size);
    }

    pub fn set_weight(&mut self, weight: u16) {
        self.modify(|a| a.weight = weight);
    }

    pub fn set_italic(&mut self, italic: bool) {
        self.modify(|a| a.italic = italic);
    }

    pub fn set_underline(&mut self, underline: bool) {
        self.modify(|a| a.underline = underline);
    }

    pub fn set_overline(&mut self, overline: bool) {
        self.modify(|a| a.overline = overline);
    }

    pub fn set_strikeout(&mut self, strikeout: bool) {
        self.modify(|a| a.strikeout = strikeout);
    }

    pub fn set_letter_spacing(&mut self, letter_spacing: f64) {
        self.modify(|a| a.letter_spacing = letter_spacing);
    }

    pub fn set_color(&mut self, color: Color) {
        self.modify(|a| a.color = color);
    }

    pub fn set_background(&mut self, background: Color) {
        self.modify(|a| a.background = background);
    }
}

impl Default for FontFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for FontFormat {
    fn clone(&self) -> Self {
        Self {
            attrs: FontCache::global().acquire(&self.attrs),
        }
    }
}

impl Drop for FontFormat {
    fn drop(&mut self) {
        FontCache::global().release(&self.attrs);
    }
}

impl PartialEq for FontFormat {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.attrs, &other.attrs) || *self.attrs == *other.attrs
    }
}

impl Eq for FontFormat {}

impl Serialize for FontFormat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.attrs.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FontFormat {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Self::from_attributes(FontAttributes::deserialize(deserializer)?))
    }
}

impl AttributeLayer for FontFormat {
    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        let defaults = FontAttributes::default();
        let a = self.attributes();
        attrs.push_string("family", &a.family, &defaults.family);
        attrs.push_f64("fontSize", a.point_size, defaults.point_size);
        attrs.push_int("weight", a.weight, defaults.weight);
        attrs.push_bool("italic", a.italic, defaults.italic);
        attrs.push_bool("underline", a.underline, defaults.underline);
        attrs.push_bool("overline", a.overline, defaults.overline);
        attrs.push_bool("strikeOut", a.strikeout, defaults.strikeout);
        attrs.push_f64("letterSpacing", a.letter_spacing, defaults.letter_spacing);
        attrs.push_color("fontColor", a.color, defaults.color);
        attrs.push_color("backgroundColor", a.background, defaults.background);
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        let defaults = FontAttributes::default();
        let new = FontAttributes {
            family: attrs.take_string("family", &defaults.family),
            point_size: attrs.take_f64("fontSize", defaults.point_size)?,
            weight: attrs.take_int("weight", defaults.weight)?,
            italic: attrs.take_bool("italic", defaults.italic)?,
            underline: attrs.take_bool("underline", defaults.underline)?,
            overline: attrs.take_bool("overline", defaults.overline)?,
            strikeout: attrs.take_bool("strikeOut", defaults.strikeout)?,
            letter_spacing: attrs.take_f64("letterSpacing", defaults.letter_spacing)?,
            color: attrs.take_color("fontColor", defaults.color)?,
            background: attrs.take_color("backgroundColor", defaults.background)?,
        };
        self.replace(new);
        Ok(())
    }

    fn append_fields(&self, fields: &mut Vec<String>) {
        let a = self.attributes();
        fields.push(a.family.clone());
        fields.push(xml_io::codec::encode_f64(a.point_size));
        fields.push(a.weight.to_string());
        fields.push(xml_io::codec::encode_bool(a.italic).to_string());
        fields.push(xml_io::codec::encode_bool(a.underline).to_string());
        fields.push(xml_io::codec::encode_bool(a.overline).to_string());
        fields.push(xml_io::codec::encode_bool(a.strikeout).to_string());
        fields.push(xml_io::codec::encode_f64(a.letter_spacing));
        fields.push(a.color.to_hex());
        fields.push(a.background.to_hex());
    }

    fn parse_fields(&mut self, fields: &mut FieldReader) -> Result<()> {
        let new = FontAttributes {
            family: fields.next_string()?,
            point_size: fields.next_f64()?,
            weight: fields.next_int()?,
            italic: fields.next_bool()?,
            underline: fields.next_bool()?,
            overline: fields.next_bool()?,
            strikeout: fields.next_bool()?,
            letter_spacing: fields.next_f64()?,
            color: fields.next_color()?,
            background: fields.next_color()?,
        };
        self.replace(new);
        Ok(())
    }

    fn append_css(&self, css: &mut String) {
        let a = self.attributes();
        css.push_str(&format!("font-family: {}; ", a.family));
        css.push_str(&format!("font-size: {}pt; ", xml_io::codec::encode_f64(a.point_size)));
        css.push_str(&format!("font-weight: {}; ", a.weight));
        if a.italic {
            css.push_str("font-style: italic; ");
        }
        let mut decorations = Vec::new();
        if a.underline {
            decorations.push("underline");
        }
        if a.overline {
            decorations.push("overline");
        }
        if a.strikeout {
            decorations.push("line-through");
        }
        if !decorations.is_empty() {
            css.push_str(&format!("text-decoration: {}; ", decorations.join(" ")));
        }
        if a.letter_spacing != 0.0 {
            css.push_str(&format!(
                "letter-spacing: {}pt; ",
                xml_io::codec::encode_f64(a.letter_spacing)
            ));
        }
        css.push_str(&format!("color: {}; ", a.color.to_css()));
        if a.background != Color::TRANSPARENT {
            css.push_str(&format!("background-color: {}; ", a.background.to_css()));
        }
    }
}

impl XmlElement for FontFormat {
    fn tag_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn contribute_attributes(&self, attrs: &mut AttrWriter) {
        AttributeLayer::contribute_attributes(self, attrs);
    }

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        AttributeLayer::consume_attributes(self, attrs)
    }
}

impl Format for FontFormat {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        Self::capability_names()
    }

    fn delimited_fields(&self, fields: &mut Vec<String>) {
        self.append_fields(fields);
    }

    fn load_delimited(&mut self, fields: &mut FieldReader) -> Result<()> {
        self.parse_fields(fields)
    }

    fn to_css(&self) -> String {
        let mut css = String::new();
        self.append_css(&mut css);
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

/// Font field summaries shared by every aggregation with a font layer
#[derive(Default)]
pub struct FontAggregationState {
    pub families: BTreeSet<String>,
    pub point_sizes: FloatSet,
    pub weights: BTreeSet<u16>,
    pub italic: TriState,
    pub underline: TriState,
    pub overline: TriState,
    pub strikeout: TriState,
    pub letter_spacings: FloatSet,
    pub colors: BTreeSet<Color>,
    pub backgrounds: BTreeSet<Color>,
}

impl FontAggregationState {
    pub fn fold(&mut self, font: &FontFormat) {
        let a = font.attributes();
        self.families.insert(a.family.clone());
        self.point_sizes.insert(a.point_size);
        self.weights.insert(a.weight);
        self.italic.observe(a.italic);
        self.underline.observe(a.underline);
        self.overline.observe(a.overline);
        self.strikeout.observe(a.strikeout);
        self.letter_spacings.insert(a.letter_spacing);
        self.colors.insert(a.color);
        self.backgrounds.insert(a.background);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Aggregation over plain `FontFormat` members
#[derive(Default)]
pub struct FontAggregation {
    membership: Membership,
    pub fonts: FontAggregationState,
}

impl FontAggregation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Aggregation for FontAggregation {
    fn type_name(&self) -> &'static str {
        FontFormat::TYPE_NAME
    }

    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool {
        let guard = format.borrow();
        let Some(font) = guard.as_any().downcast_ref::<FontFormat>() else {
            return false;
        };
        if !self.membership.insert(format) && !include_existing {
            return false;
        }
        self.fonts.fold(font);
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
            if let Some(font) = guard.as_any().downcast_ref::<FontFormat>() {
                self.fonts.fold(font);
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

    fn unique_attrs(tag: &str) -> FontAttributes {
        FontAttributes {
            family: format!("ProbeFamily-{tag}"),
            ..FontAttributes::default()
        }
    }

    #[test]
    fn test_identical_tuples_share_one_entry() {
        let attrs = unique_attrs("share");
        let a = FontFormat::from_attributes(attrs.clone());
        let b = FontFormat::from_attributes(attrs.clone());
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.attrs, &b.attrs));
        assert_eq!(FontCache::global().use_count(&attrs), 2);
    }

    #[test]
    fn test_copy_increments_and_drop_decrements() {
        let attrs = unique_attrs("refs");
        let a = FontFormat::from_attributes(attrs.clone());
        assert_eq!(FontCache::global().use_count(&attrs), 1);
        let b = a.clone();
        assert_eq!(FontCache::global().use_count(&attrs), 2);
        drop(b);
        assert_eq!(FontCache::global().use_count(&attrs), 1);
        drop(a);
        assert_eq!(FontCache::global().use_count(&attrs), 0);
    }

    #[test]
    fn test_mutation_moves_between_entries() {
        let attrs = unique_attrs("mutate");
        let mut a = FontFormat::from_attributes(attrs.clone());
        a.set_point_size(18.0);
        assert_eq!(FontCache::global().use_count(&attrs), 0);
        let mut moved = attrs.clone();
        moved.point_size = 18.0;
        assert_eq!(FontCache::global().use_count(&moved), 1);
        assert_eq!(a.point_size(), 18.0);
    }

    #[test]
    fn test_unchanged_mutation_is_noop() {
        let attrs = unique_attrs("noop");
        let mut a = FontFormat::from_attributes(attrs.clone());
        a.set_point_size(attrs.point_size);
        assert_eq!(FontCache::global().use_count(&attrs), 1);
    }

    #[test]
    fn test_eviction_makes_next_construction_fresh() {
        let attrs = unique_attrs("evict");
        let a = FontFormat::from_attributes(attrs.clone());
        drop(a);
        assert_eq!(FontCache::global().use_count(&attrs), 0);
        let _b = FontFormat::from_attributes(attrs.clone());
        assert_eq!(FontCache::global().use_count(&attrs), 1);
    }

    #[test]
    fn test_capabilities_contain_base_and_self() {
        let font = FontFormat::new();
        let caps = font.capabilities();
        assert!(caps.contains("Format"));
        assert!(caps.contains("FontFormat"));
        assert_eq!(caps, font.capabilities());
    }

    #[test]
    fn test_delimited_round_trip() {
        let mut font = FontFormat::configure("Deja Vu, Serif", 9.5, 700, true);
        font.set_underline(true);
        font.set_color(Color::opaque(0x10, 0x20, 0x30));
        let text = font.to_delimited();
        assert!(text.starts_with("FontFormat,"));

        let fields = crate::format::split_fields(&text);
        assert_eq!(fields[0], "FontFormat");
        let mut reader = FieldReader::new(fields[1..].to_vec());
        let mut rebuilt = FontFormat::new();
        rebuilt.load_delimited(&mut reader).unwrap();
        reader.finish().unwrap();
        assert_eq!(rebuilt, font);
    }

    #[test]
    fn test_css_mentions_family_and_size() {
        let font = FontFormat::configure("Mono", 11.0, 400, false);
        let css = font.to_css();
        assert!(css.contains("font-family: Mono"));
        assert!(css.contains("font-size: 11pt"));
    }
}
