//! Format Model - Format value types, aggregation, and registries
//!
//! This crate provides the format/attribute model for the document editor:
//! the format value types (fonts, operators, data-type renderings, page and
//! table styling), the flyweight font cache behind them, the aggregation
//! machinery that summarizes formats across a multi-selection, the
//! name-keyed registries that rebuild formats from serialized documents,
//! and the document-wide default settings.

pub mod aggregation;
mod error;
pub mod fonts;
pub mod format;
pub mod formats;
pub mod registry;
pub mod settings;

pub use aggregation::{Aggregation, FloatSet, Membership, TriState};
pub use error::{FormatError, Result};
pub use fonts::{FontAggregation, FontAggregationState, FontAttributes, FontCache, FontFormat};
pub use format::{
    base_capabilities, escape_field, has_capability, share, split_fields, AttributeLayer,
    CapabilitySet, FieldReader, Format, SharedFormat, FORMAT_CAPABILITY,
};
pub use formats::*;
pub use registry::{
    AggregationCreator, AggregationRegistry, FormatCreator, FormatRegistry, SettingCreator,
    SettingRegistry,
};
pub use settings::{
    DefaultPageFormatSetting, DefaultTableFormatSetting, DefaultTextFormatSetting,
    DocumentSetting, DocumentSettings, FormatId,
};
