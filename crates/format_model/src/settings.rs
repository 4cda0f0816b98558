//! Document-wide default settings
//!
//! A document stores a small set of named defaults (the text format, the
//! page format, the table format) as references into its format table.
//! Each setting serializes as one child element of `<DocumentSettings>`;
//! reading goes through a registry so the set of known settings stays
//! extensible without touching the container.

use crate::registry::SettingRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use xml_io::{AttrMap, AttrWriter, XmlElement, XmlIoError, XmlReader, XmlWriter};

/// Opaque reference to a format stored in the document's format table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct FormatId(u64);

impl FormatId {
    pub const UNASSIGNED: FormatId = FormatId(0);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

/// One named document default
pub trait DocumentSetting: XmlElement {
    /// Stable setting name; the registry key and the XML tag
    fn setting_name(&self) -> &'static str;

    fn format_id(&self) -> FormatId;

    fn set_format_id(&mut self, id: FormatId);
}

// =============================================================================
// Concrete settings
// =============================================================================

macro_rules! id_setting {
    ($(#[$doc:meta])* $name:ident, $tag:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
        pub struct $name {
            format_id: FormatId,
        }

        impl $name {
            pub const SETTING_NAME: &'static str = $tag;

            pub fn new(format_id: FormatId) -> Self {
                Self { format_id }
            }
        }

        impl XmlElement for $name {
            fn tag_name(&self) -> &str {
                Self::SETTING_NAME
            }

            fn contribute_attributes(&self, attrs: &mut AttrWriter) {
                attrs.push_handle("formatId", self.format_id.raw(), 0);
            }

            fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
                self.format_id = FormatId::new(attrs.take_handle("formatId", 0)?);
                Ok(())
            }
        }

        impl DocumentSetting for $name {
            fn setting_name(&self) -> &'static str {
                Self::SETTING_NAME
            }

            fn format_id(&self) -> FormatId {
                self.format_id
            }

            fn set_format_id(&mut self, id: FormatId) {
                self.format_id = id;
            }
        }
    };
}

id_setting!(
    /// Format applied to text with no explicit character format
    DefaultTextFormatSetting,
    "DefaultTextFormat"
);
id_setting!(
    /// Page layout for sections without their own page format
    DefaultPageFormatSetting,
    "DefaultPageFormat"
);
id_setting!(
    /// Frame styling for freshly inserted tables
    DefaultTableFormatSetting,
    "DefaultTableFormat"
);

/// Every builtin setting type, by XML tag
pub fn builtin_settings() -> Vec<(&'static str, fn() -> Box<dyn DocumentSetting>)> {
    vec![
        (DefaultTextFormatSetting::SETTING_NAME, || {
            Box::new(DefaultTextFormatSetting::default()) as Box<dyn DocumentSetting>
        }),
        (DefaultPageFormatSetting::SETTING_NAME, || {
            Box::new(DefaultPageFormatSetting::default()) as Box<dyn DocumentSetting>
        }),
        (DefaultTableFormatSetting::SETTING_NAME, || {
            Box::new(DefaultTableFormatSetting::default()) as Box<dyn DocumentSetting>
        }),
    ]
}

// =============================================================================
// Container
// =============================================================================

/// The document's settings, at most one per setting name
#[derive(Default)]
pub struct DocumentSettings {
    settings: BTreeMap<&'static str, Box<dyn DocumentSetting>>,
}

impl DocumentSettings {
    pub const TAG: &'static str = "DocumentSettings";

    pub fn new() -> Self {
        Self::default()
    }

    /// Store a setting, replacing any existing entry of the same name
    pub fn insert(&mut self, setting: Box<dyn DocumentSetting>) {
        self.settings.insert(setting.setting_name(), setting);
    }

    pub fn get(&self, name: &str) -> Option<&dyn DocumentSetting> {
        self.settings.get(name).map(|setting| setting.as_ref())
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn DocumentSetting>> {
        self.settings.remove(name)
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn DocumentSetting> {
        self.settings.values().map(|setting| setting.as_ref())
    }

    pub fn write_xml(&self, writer: &mut XmlWriter<'_>) -> xml_io::Result<()> {
        writer.write_element(self)
    }

    /// Read a `<DocumentSettings>` element. A tag the registry does not
    /// know and a tag read twice are both hard errors.
    pub fn read_xml(&mut self, reader: &mut XmlReader<'_>, registry: &SettingRegistry) -> xml_io::Result<()> {
        let mut adapter = DocumentSettingsReader {
            settings: self,
            registry,
            seen: BTreeSet::new(),
        };
        reader.read_element(&mut adapter)
    }
}

impl XmlElement for DocumentSettings {
    fn tag_name(&self) -> &str {
        Self::TAG
    }

    fn contribute_attributes(&self, _attrs: &mut AttrWriter) {}

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        let _ = attrs;
        Ok(())
    }

    fn has_children(&self) -> bool {
        !self.settings.is_empty()
    }

    fn write_children(&self, writer: &mut XmlWriter<'_>) -> xml_io::Result<()> {
        for setting in self.settings.values() {
            writer.write_element(setting.as_ref())?;
        }
        Ok(())
    }
}

/// Borrowed read adapter: the element protocol hands child events to one
/// object, and settings need the registry while reading.
struct DocumentSettingsReader<'a> {
    settings: &'a mut DocumentSettings,
    registry: &'a SettingRegistry,
    seen: BTreeSet<String>,
}

impl XmlElement for DocumentSettingsReader<'_> {
    fn tag_name(&self) -> &str {
        DocumentSettings::TAG
    }

    fn contribute_attributes(&self, _attrs: &mut AttrWriter) {}

    fn consume_attributes(&mut self, attrs: &mut AttrMap) -> xml_io::Result<()> {
        let _ = attrs;
        Ok(())
    }

    fn read_child(
        &mut self,
        reader: &mut XmlReader<'_>,
        attrs: AttrMap,
        is_empty: bool,
    ) -> xml_io::Result<()> {
        let tag = attrs.tag_name().to_string();
        let Some(mut setting) = self.registry.create(&tag) else {
            return Err(XmlIoError::UnknownTypeName(tag));
        };
        if !self.seen.insert(tag.clone()) {
            return Err(XmlIoError::DuplicateTag { tag });
        }
        reader.read_element_content(setting.as_mut(), attrs, is_empty)?;
        self.settings.insert(setting);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SettingRegistry {
        SettingRegistry::with_builtins()
    }

    #[test]
    fn test_insert_replaces_same_name() {
        let mut settings = DocumentSettings::new();
        settings.insert(Box::new(DefaultTextFormatSetting::new(FormatId::new(1))));
        settings.insert(Box::new(DefaultTextFormatSetting::new(FormatId::new(2))));
        assert_eq!(settings.len(), 1);
        let setting = settings.get(DefaultTextFormatSetting::SETTING_NAME).unwrap();
        assert_eq!(setting.format_id(), FormatId::new(2));
    }

    #[test]
    fn test_round_trip_through_xml() {
        let mut settings = DocumentSettings::new();
        settings.insert(Box::new(DefaultTextFormatSetting::new(FormatId::new(7))));
        settings.insert(Box::new(DefaultPageFormatSetting::new(FormatId::new(9))));

        let mut buffer: Vec<u8> = Vec::new();
        {
            let mut writer = XmlWriter::new(&mut buffer);
            settings.write_xml(&mut writer).unwrap();
        }
        let xml = String::from_utf8(buffer).unwrap();

        let mut rebuilt = DocumentSettings::new();
        let mut reader = XmlReader::from_str(&xml);
        rebuilt.read_xml(&mut reader, &registry()).unwrap();
        assert_eq!(rebuilt.len(), 2);
        assert_eq!(
            rebuilt.get(DefaultPageFormatSetting::SETTING_NAME).unwrap().format_id(),
            FormatId::new(9)
        );
    }

    #[test]
    fn test_duplicate_setting_tag_is_rejected() {
        let xml = "<DocumentSettings>\
                   <DefaultTextFormat formatId=\"1\"/>\
                   <DefaultTextFormat formatId=\"2\"/>\
                   </DocumentSettings>";
        let mut settings = DocumentSettings::new();
        let mut reader = XmlReader::from_str(xml);
        let err = settings.read_xml(&mut reader, &registry()).unwrap_err();
        assert!(matches!(err, XmlIoError::DuplicateTag { .. }));
    }

    #[test]
    fn test_unknown_setting_name_is_rejected() {
        let xml = "<DocumentSettings><DefaultInkFormat formatId=\"1\"/></DocumentSettings>";
        let mut settings = DocumentSettings::new();
        let mut reader = XmlReader::from_str(xml);
        let err = settings.read_xml(&mut reader, &registry()).unwrap_err();
        assert!(matches!(err, XmlIoError::UnknownTypeName(_)));
    }

    #[test]
    fn test_empty_settings_self_close() {
        let settings = DocumentSettings::new();
        let xml = xml_io::element_to_string(&settings).unwrap();
        assert_eq!(xml, "<DocumentSettings/>");
    }
}
