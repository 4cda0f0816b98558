//! Concrete format types
//!
//! Each module defines one leaf format, its attribute layering, and its
//! aggregation counterpart. The builtin tables below are the single place
//! a new format type has to be added to become constructible by name.

pub mod boolean;
pub mod brace_conditional;
pub mod character;
pub mod division;
pub mod function;
pub mod image;
pub mod list;
pub mod multiplication;
pub mod numeric;
pub mod operator;
pub mod page;
pub mod parenthesis;
pub mod table_frame;
pub mod value_field;

pub use boolean::{BooleanDataTypeAggregation, BooleanDataTypeFormat};
pub use brace_conditional::{BraceConditionalAggregation, BraceConditionalFormat};
pub use character::{CharacterAggregation, CharacterFormat};
pub use division::{DivisionOperatorAggregation, DivisionOperatorFormat, DivisionStyle};
pub use function::{FunctionAggregation, FunctionFormat};
pub use image::{ImageAggregation, ImageFormat, ScalingMode};
pub use list::{ListDataTypeAggregation, ListDataTypeFormat};
pub use multiplication::{
    MultiplicationOperatorAggregation, MultiplicationOperatorFormat, MultiplicationSymbol,
};
pub use numeric::{NumericDataTypeAggregation, NumericDataTypeFormat, PRECISION_AUTOMATIC};
pub use operator::{OperatorAggregation, OperatorFormat};
pub use page::{Orientation, PageAggregation, PageFormat};
pub use parenthesis::{ParenthesisAggregation, ParenthesisFormat, ParenthesisMode};
pub use table_frame::{
    ColumnWidth, LineSetting, LineStyle, TableFrameAggregation, TableFrameFormat,
};
pub use value_field::{ValueFieldAggregation, ValueFieldFormat};

use crate::aggregation::Aggregation;
use crate::fonts::{FontAggregation, FontFormat};
use crate::format::Format;
use crate::registry::{AggregationCreator, FormatCreator};

/// Every builtin format type, by registry name
pub fn builtin_formats() -> Vec<(&'static str, FormatCreator)> {
    vec![
        (FontFormat::TYPE_NAME, || Box::new(FontFormat::new()) as Box<dyn Format>),
        (ParenthesisFormat::TYPE_NAME, || Box::new(ParenthesisFormat::new()) as Box<dyn Format>),
        (OperatorFormat::TYPE_NAME, || Box::new(OperatorFormat::new()) as Box<dyn Format>),
        (MultiplicationOperatorFormat::TYPE_NAME, || {
            Box::new(MultiplicationOperatorFormat::new()) as Box<dyn Format>
        }),
        (DivisionOperatorFormat::TYPE_NAME, || {
            Box::new(DivisionOperatorFormat::new()) as Box<dyn Format>
        }),
        (CharacterFormat::TYPE_NAME, || Box::new(CharacterFormat::new()) as Box<dyn Format>),
        (FunctionFormat::TYPE_NAME, || Box::new(FunctionFormat::new()) as Box<dyn Format>),
        (ValueFieldFormat::TYPE_NAME, || Box::new(ValueFieldFormat::new()) as Box<dyn Format>),
        (BooleanDataTypeFormat::TYPE_NAME, || {
            Box::new(BooleanDataTypeFormat::new()) as Box<dyn Format>
        }),
        (NumericDataTypeFormat::TYPE_NAME, || {
            Box::new(NumericDataTypeFormat::new()) as Box<dyn Format>
        }),
        (ListDataTypeFormat::TYPE_NAME, || {
            Box::new(ListDataTypeFormat::new()) as Box<dyn Format>
        }),
        (ImageFormat::TYPE_NAME, || Box::new(ImageFormat::new()) as Box<dyn Format>),
        (PageFormat::TYPE_NAME, || Box::new(PageFormat::new()) as Box<dyn Format>),
        (BraceConditionalFormat::TYPE_NAME, || {
            Box::new(BraceConditionalFormat::new()) as Box<dyn Format>
        }),
        (TableFrameFormat::TYPE_NAME, || Box::new(TableFrameFormat::new()) as Box<dyn Format>),
    ]
}

/// Aggregation counterpart for every builtin format type
pub fn builtin_aggregations() -> Vec<(&'static str, AggregationCreator)> {
    vec![
        (FontFormat::TYPE_NAME, || Box::new(FontAggregation::new()) as Box<dyn Aggregation>),
        (ParenthesisFormat::TYPE_NAME, || {
            Box::new(ParenthesisAggregation::default()) as Box<dyn Aggregation>
        }),
        (OperatorFormat::TYPE_NAME, || {
            Box::new(OperatorAggregation::default()) as Box<dyn Aggregation>
        }),
        (MultiplicationOperatorFormat::TYPE_NAME, || {
            Box::new(MultiplicationOperatorAggregation::default()) as Box<dyn Aggregation>
        }),
        (DivisionOperatorFormat::TYPE_NAME, || {
            Box::new(DivisionOperatorAggregation::default()) as Box<dyn Aggregation>
        }),
        (CharacterFormat::TYPE_NAME, || {
            Box::new(CharacterAggregation::default()) as Box<dyn Aggregation>
        }),
        (FunctionFormat::TYPE_NAME, || {
            Box::new(FunctionAggregation::default()) as Box<dyn Aggregation>
        }),
        (ValueFieldFormat::TYPE_NAME, || {
            Box::new(ValueFieldAggregation::default()) as Box<dyn Aggregation>
        }),
        (BooleanDataTypeFormat::TYPE_NAME, || {
            Box::new(BooleanDataTypeAggregation::default()) as Box<dyn Aggregation>
        }),
        (NumericDataTypeFormat::TYPE_NAME, || {
            Box::new(NumericDataTypeAggregation::default()) as Box<dyn Aggregation>
        }),
        (ListDataTypeFormat::TYPE_NAME, || {
            Box::new(ListDataTypeAggregation::default()) as Box<dyn Aggregation>
        }),
        (ImageFormat::TYPE_NAME, || {
            Box::new(ImageAggregation::default()) as Box<dyn Aggregation>
        }),
        (PageFormat::TYPE_NAME, || {
            Box::new(PageAggregation::default()) as Box<dyn Aggregation>
        }),
        (BraceConditionalFormat::TYPE_NAME, || {
            Box::new(BraceConditionalAggregation::default()) as Box<dyn Aggregation>
        }),
        (TableFrameFormat::TYPE_NAME, || {
            Box::new(TableFrameAggregation::default()) as Box<dyn Aggregation>
        }),
    ]
}
