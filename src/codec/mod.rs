//! Wire codecs: the `@`-separated hex call-frame protocol and the opaque
//! marshal/unmarshal service used for stored records.

mod frame;
mod marshal;

pub use frame::*;
pub use marshal::*;

use thiserror::Error;

/// Errors of the call-frame and record codecs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("could not split the data field into segments")]
    StringSplitFailed,

    #[error("code is not available before a successful parse")]
    NilCode,

    #[error("function is not available before a successful parse")]
    NilFunction,

    #[error("arguments are not available before a successful parse")]
    NilArguments,

    #[error("the data string is invalid")]
    InvalidDataString,

    #[error("serialization failed: {0}")]
    Serialization(String),
}
