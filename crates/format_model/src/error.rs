//! Error types for format model operations

use thiserror::Error;
use xml_io::XmlIoError;

#[derive(Debug, Error)]
pub enum FormatError {
    /// The canonical delimited string form could not be parsed
    #[error("malformed format string: {0}")]
    MalformedDelimited(String),

    /// A type name with no registered constructor
    #[error("unknown format type name '{0}'")]
    UnknownTypeName(String),

    /// Failure in the XML layer
    #[error(transparent)]
    Xml(#[from] XmlIoError),
}

pub type Result<T> = std::result::Result<T, FormatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_display() {
        let err = FormatError::UnknownTypeName("NoSuchFormat".to_string());
        assert_eq!(err.to_string(), "unknown format type name 'NoSuchFormat'");
    }
}
