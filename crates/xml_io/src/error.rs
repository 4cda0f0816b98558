//! Error types for XML attribute and element I/O

use thiserror::Error;

/// Errors raised while reading or writing the structured XML form
#[derive(Debug, Error)]
pub enum XmlIoError {
    /// An attribute was present but its text could not be decoded
    #[error("malformed value {value:?} for attribute '{attribute}'")]
    MalformedValue { attribute: String, value: String },

    /// A numeric attribute decoded but fell outside the requested width
    #[error("value {value:?} for attribute '{attribute}' is out of range")]
    OutOfRange { attribute: String, value: String },

    /// An attribute the element does not define
    #[error("unexpected attribute '{attribute}' on element <{tag}>")]
    UnexpectedAttribute { tag: String, attribute: String },

    /// A required attribute was absent
    #[error("missing required attribute '{attribute}' on element <{tag}>")]
    MissingAttribute { tag: String, attribute: String },

    /// A child element where the parent allows none, or an unknown child tag
    #[error("unexpected child element <{child}> inside <{parent}>")]
    UnexpectedChild { parent: String, child: String },

    /// Non-whitespace character data where the element allows none
    #[error("unexpected text inside element <{tag}>")]
    UnexpectedText { tag: String },

    /// The same tag appeared twice where one occurrence is allowed
    #[error("duplicate element <{tag}>")]
    DuplicateTag { tag: String },

    /// A serialized type name with no registered constructor
    #[error("unknown type name '{0}'")]
    UnknownTypeName(String),

    /// The stream ended before the matching end tag
    #[error("premature end of document while reading <{tag}>")]
    UnexpectedEof { tag: String },

    /// The reader already failed earlier; the original reason is preserved
    #[error("read aborted by earlier error: {0}")]
    AlreadyFailed(String),

    /// Underlying quick-xml failure
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Attribute-level quick-xml failure
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// UTF-8 decoding error
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// I/O failure from the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for XML I/O operations
pub type Result<T> = std::result::Result<T, XmlIoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_offender() {
        let err = XmlIoError::UnexpectedChild {
            parent: "TableFrameFormat".to_string(),
            child: "Bogus".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unexpected child element <Bogus> inside <TableFrameFormat>"
        );
    }

    #[test]
    fn test_malformed_value_display() {
        let err = XmlIoError::MalformedValue {
            attribute: "fontSize".to_string(),
            value: "abc".to_string(),
        };
        assert!(err.to_string().contains("fontSize"));
        assert!(err.to_string().contains("abc"));
    }
}
