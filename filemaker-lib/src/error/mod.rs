//! Error types

mod decode;
mod field;
mod request;
mod validation;

pub use decode::*;
pub use field::*;
pub use request::*;
pub use validation::*;

/// Any error produced by the client, the decoder or the query encoder.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request could not be sent or the server answered with a non-2xx status.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The response could not be decoded, or the server reported an error code.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The query was rejected before any network activity.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A field lookup failed.
    #[error(transparent)]
    Field(#[from] FieldError),
}

impl Error {
    /// Returns the server error code when the server reported one.
    pub fn server_code(&self) -> Option<u32> {
        match self {
            Self::Decode(e) => e.code(),
            _ => None,
        }
    }
}
