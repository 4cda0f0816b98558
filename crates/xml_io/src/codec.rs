//! Attribute codec - typed scalars to and from XML attribute text
//!
//! All encoding is locale-independent. Decoding distinguishes three cases:
//! the attribute is absent (the caller's default applies, not an error), the
//! text is present but malformed (always an error, even with a default), and
//! the text decodes but falls outside the requested integer width.

use crate::color::Color;
use crate::error::{Result, XmlIoError};
use quick_xml::events::BytesStart;

// =============================================================================
// Scalar encoding
// =============================================================================

/// Canonical boolean attribute form
pub fn encode_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// f32 with 7 significant digits
pub fn encode_f32(value: f32) -> String {
    format_significant(value as f64, 7)
}

/// f64 with 14 significant digits
pub fn encode_f64(value: f64) -> String {
    format_significant(value, 14)
}

/// Format with a fixed significant-digit count, preferring plain decimal
/// notation and falling back to exponent form for extreme magnitudes.
fn format_significant(value: f64, digits: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    let sci = format!("{:.*e}", digits - 1, value);
    let (mantissa, exp) = sci
        .split_once('e')
        .expect("exponent formatting always contains 'e'");
    let exp: i32 = exp.parse().expect("exponent is a valid integer");
    if exp >= -4 && exp < digits as i32 {
        let decimals = (digits as i32 - 1 - exp).max(0) as usize;
        trim_fraction(format!("{:.*}", decimals, value))
    } else {
        format!("{}e{}", trim_fraction(mantissa.to_string()), exp)
    }
}

fn trim_fraction(text: String) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

// =============================================================================
// Scalar decoding
// =============================================================================

/// Decode a decimal integer of any width from i8 through u64. Non-numeric
/// text is malformed; numeric text outside the width is out of range.
pub fn parse_int<T: TryFrom<i128>>(attribute: &str, text: &str) -> Result<T> {
    let wide: i128 = text.trim().parse().map_err(|_| XmlIoError::MalformedValue {
        attribute: attribute.to_string(),
        value: text.to_string(),
    })?;
    T::try_from(wide).map_err(|_| XmlIoError::OutOfRange {
        attribute: attribute.to_string(),
        value: text.to_string(),
    })
}

/// Decode a float; accepts anything `str::parse` does
pub fn parse_f64(attribute: &str, text: &str) -> Result<f64> {
    text.trim().parse().map_err(|_| XmlIoError::MalformedValue {
        attribute: attribute.to_string(),
        value: text.to_string(),
    })
}

/// Exactly the canonical `true`/`false`, nothing else
pub fn parse_bool(attribute: &str, text: &str) -> Result<bool> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(XmlIoError::MalformedValue {
            attribute: attribute.to_string(),
            value: text.to_string(),
        }),
    }
}

// =============================================================================
// AttrMap - the read side
// =============================================================================

/// Attributes of one start tag, collected for layered consumption.
///
/// Each attribute layer takes the attributes it defines; whatever is left
/// after every layer ran is unexpected for types that forbid unknowns.
#[derive(Debug, Clone)]
pub struct AttrMap {
    tag: String,
    entries: Vec<(String, String)>,
}

impl AttrMap {
    /// Collect and unescape the attributes of a start tag
    pub fn from_start(start: &BytesStart) -> Result<AttrMap> {
        let tag = std::str::from_utf8(start.name().as_ref())?.to_string();
        let mut entries = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value()?.into_owned();
            entries.push((key, value));
        }
        Ok(AttrMap { tag, entries })
    }

    /// Empty map for a synthesized tag (used by tests)
    pub fn empty(tag: impl Into<String>) -> AttrMap {
        AttrMap {
            tag: tag.into(),
            entries: Vec::new(),
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn take(&mut self, name: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// String attribute with a default for absence
    pub fn take_string(&mut self, name: &str, default: &str) -> String {
        self.take(name).unwrap_or_else(|| default.to_string())
    }

    /// String attribute that must be present
    pub fn take_required_string(&mut self, name: &str) -> Result<String> {
        self.take(name).ok_or_else(|| XmlIoError::MissingAttribute {
            tag: self.tag.clone(),
            attribute: name.to_string(),
        })
    }

    /// Integer of any width i8..u64; absent means `default`
    pub fn take_int<T: TryFrom<i128>>(&mut self, name: &str, default: T) -> Result<T> {
        match self.take(name) {
            Some(text) => parse_int(name, &text),
            None => Ok(default),
        }
    }

    /// Opaque 64-bit handle, decimal form
    pub fn take_handle(&mut self, name: &str, default: u64) -> Result<u64> {
        self.take_int(name, default)
    }

    pub fn take_bool(&mut self, name: &str, default: bool) -> Result<bool> {
        match self.take(name) {
            Some(text) => parse_bool(name, &text),
            None => Ok(default),
        }
    }

    pub fn take_f32(&mut self, name: &str, default: f32) -> Result<f32> {
        match self.take(name) {
            Some(text) => Ok(parse_f64(name, &text)? as f32),
            None => Ok(default),
        }
    }

    pub fn take_f64(&mut self, name: &str, default: f64) -> Result<f64> {
        match self.take(name) {
            Some(text) => parse_f64(name, &text),
            None => Ok(default),
        }
    }

    pub fn take_color(&mut self, name: &str, default: Color) -> Result<Color> {
        match self.take(name) {
            Some(text) => Color::from_hex(&text),
            None => Ok(default),
        }
    }

    /// Color attribute where absence means "no override"
    pub fn take_opt_color(&mut self, name: &str) -> Result<Option<Color>> {
        match self.take(name) {
            Some(text) => Ok(Some(Color::from_hex(&text)?)),
            None => Ok(None),
        }
    }

    /// Reject leftovers once every layer has consumed its attributes
    pub fn finish(self) -> Result<()> {
        match self.entries.into_iter().next() {
            Some((name, _)) => Err(XmlIoError::UnexpectedAttribute {
                tag: self.tag,
                attribute: name,
            }),
            None => Ok(()),
        }
    }
}

// =============================================================================
// AttrWriter - the write side
// =============================================================================

/// Ordered attribute contributions for one start tag.
///
/// Layers push in ancestor-to-descendant order, which fixes the attribute
/// order in the emitted XML. The `push_*` helpers delta-encode: a value equal
/// to its default is omitted entirely.
#[derive(Debug, Default)]
pub struct AttrWriter {
    pairs: Vec<(String, String)>,
}

impl AttrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Unconditional attribute (required fields are always written)
    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.pairs.push((name.to_string(), value.into()));
    }

    pub fn push_string(&mut self, name: &str, value: &str, default: &str) {
        if value != default {
            self.push(name, value);
        }
    }

    pub fn push_bool(&mut self, name: &str, value: bool, default: bool) {
        if value != default {
            self.push(name, encode_bool(value));
        }
    }

    pub fn push_int<T: std::fmt::Display + PartialEq>(&mut self, name: &str, value: T, default: T) {
        if value != default {
            self.push(name, value.to_string());
        }
    }

    pub fn push_f32(&mut self, name: &str, value: f32, default: f32) {
        if value != default {
            self.push(name, encode_f32(value));
        }
    }

    pub fn push_f64(&mut self, name: &str, value: f64, default: f64) {
        if value != default {
            self.push(name, encode_f64(value));
        }
    }

    pub fn push_color(&mut self, name: &str, value: Color, default: Color) {
        if value != default {
            self.push(name, value.to_hex());
        }
    }

    pub fn push_opt_color(&mut self, name: &str, value: Option<Color>) {
        if let Some(color) = value {
            self.push(name, color.to_hex());
        }
    }

    pub fn push_handle(&mut self, name: &str, value: u64, default: u64) {
        if value != default {
            self.push(name, value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_widths_enforced() {
        assert_eq!(parse_int::<i8>("x", "127").unwrap(), 127);
        assert!(matches!(
            parse_int::<i8>("x", "128"),
            Err(XmlIoError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_int::<u16>("x", "-1"),
            Err(XmlIoError::OutOfRange { .. })
        ));
        assert_eq!(parse_int::<u64>("x", "18446744073709551615").unwrap(), u64::MAX);
        assert!(matches!(
            parse_int::<i32>("x", "12abc"),
            Err(XmlIoError::MalformedValue { .. })
        ));
    }

    #[test]
    fn test_bool_canonical_only() {
        assert!(parse_bool("b", "true").unwrap());
        assert!(!parse_bool("b", "false").unwrap());
        assert!(parse_bool("b", "True").is_err());
        assert!(parse_bool("b", "1").is_err());
        assert!(parse_bool("b", "").is_err());
    }

    #[test]
    fn test_float_formatting_plain() {
        assert_eq!(encode_f64(0.0), "0");
        assert_eq!(encode_f64(12.0), "12");
        assert_eq!(encode_f64(12.5), "12.5");
        assert_eq!(encode_f32(0.25), "0.25");
        assert_eq!(encode_f64(-3.75), "-3.75");
    }

    #[test]
    fn test_float_formatting_extremes() {
        assert!(encode_f64(1.0e20).contains('e'));
        assert!(encode_f64(1.0e-7).contains('e'));
        // 14 significant digits round-trip typical model values
        let v = 841.89;
        assert_eq!(parse_f64("w", &encode_f64(v)).unwrap(), v);
    }

    #[test]
    fn test_attr_map_default_only_for_absent() {
        let mut map = AttrMap::empty("PageFormat");
        assert_eq!(map.take_int("width", 600i32).unwrap(), 600);

        let mut map = AttrMap {
            tag: "PageFormat".to_string(),
            entries: vec![("width".to_string(), "oops".to_string())],
        };
        // Present but malformed fails despite the default
        assert!(map.take_int("width", 600i32).is_err());
    }

    #[test]
    fn test_attr_map_rejects_leftovers() {
        let mut map = AttrMap {
            tag: "CharacterFormat".to_string(),
            entries: vec![
                ("family".to_string(), "Mono".to_string()),
                ("bogus".to_string(), "1".to_string()),
            ],
        };
        assert_eq!(map.take_string("family", ""), "Mono");
        let err = map.finish().unwrap_err();
        assert!(matches!(err, XmlIoError::UnexpectedAttribute { ref attribute, .. } if attribute == "bogus"));
    }

    #[test]
    fn test_attr_writer_delta_encoding() {
        let mut attrs = AttrWriter::new();
        attrs.push_bool("italic", false, false);
        attrs.push_bool("bold", true, false);
        attrs.push_f64("size", 12.0, 12.0);
        attrs.push_string("family", "Mono", "Serif");
        assert_eq!(
            attrs.pairs(),
            &[
                ("bold".to_string(), "true".to_string()),
                ("family".to_string(), "Mono".to_string()),
            ]
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_int_round_trip(value in any::<i64>()) {
                prop_assert_eq!(parse_int::<i64>("v", &value.to_string()).unwrap(), value);
            }

            #[test]
            fn test_quarter_point_floats_round_trip(quarter in -40_000i32..40_000) {
                let value = f64::from(quarter) / 4.0;
                prop_assert_eq!(parse_f64("v", &encode_f64(value)).unwrap(), value);
            }
        }
    }
}
