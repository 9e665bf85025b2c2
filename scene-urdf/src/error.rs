//! Error types for URDF parsing.

use thiserror::Error;

/// Errors that can occur while parsing a robot description.
#[derive(Debug, Error)]
pub enum UrdfError {
    /// XML-level parsing error.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Missing required element.
    #[error("missing required element: {element} in {context}")]
    MissingElement {
        /// The missing element name.
        element: &'static str,
        /// Where the element was expected.
        context: String,
    },

    /// Missing required attribute.
    #[error("missing required attribute: {attribute} on {element}")]
    MissingAttribute {
        /// The missing attribute name.
        attribute: &'static str,
        /// The element that should have the attribute.
        element: String,
    },

    /// An attribute was present but its value could not be coerced.
    #[error("invalid value for {attribute} on {element}: {value:?} ({message})")]
    InvalidAttribute {
        /// The attribute with the invalid value.
        attribute: String,
        /// The element containing the attribute.
        element: String,
        /// The raw value as it appeared in the document.
        value: String,
        /// Why the value was rejected.
        message: String,
    },

    /// Unknown joint type string.
    #[error("unknown joint type: {0}")]
    UnknownJointType(String),

    /// `<geometry>` contained no recognized shape child.
    #[error("geometry element in {context} has no recognized shape child")]
    UnknownGeometry {
        /// The visual or collision the geometry belongs to.
        context: String,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UrdfError {
    /// Create a missing element error.
    pub fn missing_element(element: &'static str, context: impl Into<String>) -> Self {
        Self::MissingElement {
            element,
            context: context.into(),
        }
    }

    /// Create a missing attribute error.
    pub fn missing_attribute(attribute: &'static str, element: impl Into<String>) -> Self {
        Self::MissingAttribute {
            attribute,
            element: element.into(),
        }
    }

    /// Create an invalid attribute error carrying the raw value.
    pub fn invalid_attribute(
        attribute: impl Into<String>,
        element: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            attribute: attribute.into(),
            element: element.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}

/// Result type for URDF operations.
pub type Result<T> = std::result::Result<T, UrdfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_attribute_names_the_offending_value() {
        let err = UrdfError::invalid_attribute("xyz", "origin", "1 2 banana", "expected a number");
        let msg = err.to_string();
        assert!(msg.contains("xyz"));
        assert!(msg.contains("banana"));
        assert!(msg.contains("expected a number"));
    }

    #[test]
    fn missing_element_names_the_context() {
        let err = UrdfError::missing_element("geometry", "visual of link 'base'");
        assert!(err.to_string().contains("geometry"));
        assert!(err.to_string().contains("base"));
    }
}
