//! Name-keyed factory registries for formats and aggregations
//!
//! Serialized documents name format types by string; the registries map
//! those names back to constructors. Production code builds one registry at
//! startup via `with_builtins` and never mutates it afterwards; tests build
//! fresh registries per case.

use crate::aggregation::Aggregation;
use crate::error::{FormatError, Result};
use crate::format::Format;
use crate::formats;
use std::collections::HashMap;
use xml_io::{XmlIoError, XmlReader};

/// Constructor of a default-valued format
pub type FormatCreator = fn() -> Box<dyn Format>;

/// Constructor of an empty aggregation
pub type AggregationCreator = fn() -> Box<dyn Aggregation>;

// =============================================================================
// Format registry
// =============================================================================

#[derive(Default)]
pub struct FormatRegistry {
    creators: HashMap<&'static str, FormatCreator>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every built-in format type
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, creator) in formats::builtin_formats() {
            registry.register_creator(name, creator);
        }
        registry
    }

    /// Register a constructor. The first registration of a name wins;
    /// re-registration is refused and reported.
    pub fn register_creator(&mut self, name: &'static str, creator: FormatCreator) -> bool {
        if self.creators.contains_key(name) {
            tracing::warn!(name, "format type registered twice; keeping the first creator");
            return false;
        }
        self.creators.insert(name, creator);
        true
    }

    /// Construct a default instance, or None for unregistered names
    pub fn create(&self, name: &str) -> Option<Box<dyn Format>> {
        self.creators.get(name).map(|creator| creator())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.creators.contains_key(name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.creators.keys().copied()
    }

    /// Rebuild a format from its canonical delimited string form
    pub fn format_from_delimited(&self, text: &str) -> Result<Box<dyn Format>> {
        let fields = crate::format::split_fields(text);
        let name = fields
            .first()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| FormatError::MalformedDelimited("empty format string".to_string()))?;
        let mut format = self
            .create(name)
            .ok_or_else(|| FormatError::UnknownTypeName(name.clone()))?;
        let mut reader = crate::format::FieldReader::new(fields[1..].to_vec());
        format.load_delimited(&mut reader)?;
        reader.finish()?;
        Ok(format)
    }

    /// Read the next element as a format, constructing it by tag name
    pub fn read_format(&self, reader: &mut XmlReader<'_>) -> Result<Box<dyn Format>> {
        let (attrs, is_empty) = reader.next_element_start()?.ok_or_else(|| {
            FormatError::Xml(XmlIoError::UnexpectedEof {
                tag: "format".to_string(),
            })
        })?;
        let mut format = self.create(attrs.tag_name()).ok_or_else(|| {
            let err = XmlIoError::UnknownTypeName(attrs.tag_name().to_string());
            FormatError::Xml(reader.raise_error(err))
        })?;
        reader.read_element_content(format.as_mut(), attrs, is_empty)?;
        Ok(format)
    }
}

// =============================================================================
// Aggregation registry
// =============================================================================

#[derive(Default)]
pub struct AggregationRegistry {
    creators: HashMap<&'static str, AggregationCreator>,
}

impl AggregationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every built-in aggregation type
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, creator) in formats::builtin_aggregations() {
            registry.register_creator(name, creator);
        }
        registry
    }

    pub fn register_creator(&mut self, name: &'static str, creator: AggregationCreator) -> bool {
        if self.creators.contains_key(name) {
            tracing::warn!(name, "aggregation type registered twice; keeping the first creator");
            return false;
        }
        self.creators.insert(name, creator);
        true
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn Aggregation>> {
        self.creators.get(name).map(|creator| creator())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.creators.contains_key(name)
    }
}

// =============================================================================
// Setting registry
// =============================================================================

/// Constructor of a default-valued document setting
pub type SettingCreator = fn() -> Box<dyn crate::settings::DocumentSetting>;

#[derive(Default)]
pub struct SettingRegistry {
    creators: HashMap<&'static str, SettingCreator>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every built-in setting type
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, creator) in crate::settings::builtin_settings() {
            registry.register_creator(name, creator);
        }
        registry
    }

    pub fn register_creator(&mut self, name: &'static str, creator: SettingCreator) -> bool {
        if self.creators.contains_key(name) {
            tracing::warn!(name, "setting type registered twice; keeping the first creator");
            return false;
        }
        self.creators.insert(name, creator);
        true
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn crate::settings::DocumentSetting>> {
        self.creators.get(name).map(|creator| creator())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.creators.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontFormat;

    #[test]
    fn test_create_by_name() {
        let registry = FormatRegistry::with_builtins();
        let format = registry.create("FontFormat").unwrap();
        assert_eq!(format.type_name(), "FontFormat");
        assert!(registry.create("NoSuchFormat").is_none());
    }

    #[test]
    fn test_double_registration_refused() {
        let mut registry = FormatRegistry::new();
        assert!(registry.register_creator("FontFormat", || Box::new(FontFormat::new())));
        // Second registration must fail and keep the first creator
        assert!(!registry.register_creator("FontFormat", || {
            Box::new(crate::formats::CharacterFormat::new())
        }));
        let created = registry.create("FontFormat").unwrap();
        assert_eq!(created.type_name(), "FontFormat");
    }

    #[test]
    fn test_builtins_cover_format_and_aggregation_families() {
        let formats = FormatRegistry::with_builtins();
        let aggregations = AggregationRegistry::with_builtins();
        for name in formats.type_names() {
            assert!(
                aggregations.contains(name),
                "no aggregation registered for {name}"
            );
        }
    }

    #[test]
    fn test_from_delimited_unknown_name() {
        let registry = FormatRegistry::with_builtins();
        let err = registry.format_from_delimited("NoSuchFormat,1,2").unwrap_err();
        assert!(matches!(err, FormatError::UnknownTypeName(_)));
    }
}
