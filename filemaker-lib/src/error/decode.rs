//! Decode error types

use quick_xml::events::attributes::AttrError;

/// Errors raised while decoding an `fmresultset` response.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The server reported a non-zero error code (other than 401).
    #[error("FileMaker error {code}: {}", message_for(.code))]
    Server {
        /// The numeric error code from the `<error>` element.
        code: u32,
    },

    /// The `<error>` element carried no code, or a non-numeric one.
    #[error("Badly formatted error code in the response: {0:?}")]
    BadErrorCode(Option<String>),

    /// A mandatory attribute was absent.
    #[error("Missing attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        /// Local name of the element.
        element: &'static str,
        /// Name of the missing attribute.
        attribute: &'static str,
    },

    /// The XML itself is malformed.
    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An attribute could not be parsed.
    #[error("Malformed XML attribute: {0}")]
    Attribute(#[from] AttrError),
}

impl DecodeError {
    /// Creates a server error for the given code.
    pub fn server(code: u32) -> Self {
        Self::Server { code }
    }

    /// Creates a missing attribute error.
    pub fn missing_attribute(element: &'static str, attribute: &'static str) -> Self {
        Self::MissingAttribute { element, attribute }
    }

    /// Returns the server error code, if this error came from the server.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Server { code } => Some(*code),
            _ => None,
        }
    }
}

/// Returns a short description of a well-known FileMaker error code.
pub fn describe_code(code: u32) -> Option<&'static str> {
    let message = match code {
        0 => "No error",
        1 => "User canceled action",
        9 => "Insufficient privileges",
        100 => "File is missing",
        101 => "Record is missing",
        102 => "Field is missing",
        104 => "Script is missing",
        105 => "Layout is missing",
        212 => "Invalid user account and/or password",
        301 => "Record is in use by another user",
        306 => "Record modification ID does not match",
        401 => "No records match the request",
        802 => "Unable to open file",
        _ => return None,
    };
    Some(message)
}

fn message_for(code: &u32) -> &'static str {
    describe_code(*code).unwrap_or("no message")
}
