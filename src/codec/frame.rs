//! The `@`-delimited hex call-frame codec.
//!
//! Wire shape: `first@hex(arg1)@hex(arg2)@…`, all ASCII. The first segment
//! is kept verbatim; it is the deployed code (or address) on a deploy
//! frame and the function name on a call frame. Every later segment is
//! lower-case hex and decodes to one argument. Encoding and decoding are
//! exact-byte inverses of each other.

use super::CodecError;

/// One storage mutation carried inside a frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageUpdate {
    pub offset: Vec<u8>,
    pub data: Vec<u8>,
}

/// Stateful parser over `@`-separated call data.
///
/// Accessors fail with their nil error until `parse_data` has succeeded;
/// a failed parse clears any previously held state.
#[derive(Clone, Debug, Default)]
pub struct CallArgsParser {
    code: Option<Vec<u8>>,
    function: Option<String>,
    arguments: Option<Vec<Vec<u8>>>,
}

impl CallArgsParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `raw` on `@` and hex-decode the argument segments.
    ///
    /// Empty input and an empty first segment fail with
    /// [`CodecError::StringSplitFailed`]. A frame with no `@` at all has
    /// zero arguments. Odd-width argument segments decode with an implied
    /// leading zero nibble, a tolerance kept from the deployed protocol.
    pub fn parse_data(&mut self, raw: &str) -> Result<(), CodecError> {
        self.clear();

        let mut segments = raw.split('@');
        let first = segments.next().unwrap_or("");
        if first.is_empty() {
            return Err(CodecError::StringSplitFailed);
        }

        let mut arguments = Vec::new();
        for segment in segments {
            arguments.push(decode_hex_segment(segment)?);
        }

        self.code = Some(first.as_bytes().to_vec());
        self.function = Some(first.to_string());
        self.arguments = Some(arguments);
        Ok(())
    }

    /// The first segment, raw, read as deployed code bytes.
    pub fn code(&self) -> Result<&[u8], CodecError> {
        self.code.as_deref().ok_or(CodecError::NilCode)
    }

    /// The first segment, read as the called function name.
    pub fn function(&self) -> Result<&str, CodecError> {
        self.function.as_deref().ok_or(CodecError::NilFunction)
    }

    /// The decoded argument list.
    pub fn arguments(&self) -> Result<&[Vec<u8>], CodecError> {
        self.arguments.as_deref().ok_or(CodecError::NilArguments)
    }

    fn clear(&mut self) {
        self.code = None;
        self.function = None;
        self.arguments = None;
    }

    /// `hex(offset)@hex(data)@…` for every update in order; empty input
    /// encodes to the empty string.
    pub fn encode_storage_updates(updates: &[StorageUpdate]) -> String {
        let mut segments = Vec::with_capacity(updates.len() * 2);
        for update in updates {
            segments.push(hex::encode(&update.offset));
            segments.push(hex::encode(&update.data));
        }
        segments.join("@")
    }

    /// Inverse of [`Self::encode_storage_updates`].
    ///
    /// Updates are recovered in successive offset/data pairs; a trailing
    /// unpaired segment is silently dropped, matching the deployed decoder
    /// (the resulting list always has `segments / 2` entries).
    pub fn decode_storage_updates(raw: &str) -> Result<Vec<StorageUpdate>, CodecError> {
        if raw.is_empty() {
            return Err(CodecError::StringSplitFailed);
        }

        let segments: Vec<&str> = raw.split('@').collect();
        let mut updates = Vec::with_capacity(segments.len() / 2);
        for pair in segments.chunks_exact(2) {
            let offset = hex::decode(pair[0]).map_err(|_| CodecError::InvalidDataString)?;
            let data = hex::decode(pair[1]).map_err(|_| CodecError::InvalidDataString)?;
            updates.push(StorageUpdate { offset, data });
        }
        Ok(updates)
    }
}

/// Encode a call frame: function bytes verbatim, arguments lower-case hex.
pub fn encode_call_data_bytes(function: &[u8], arguments: &[Vec<u8>]) -> Vec<u8> {
    let mut data = function.to_vec();
    for argument in arguments {
        data.push(b'@');
        data.extend_from_slice(hex::encode(argument).as_bytes());
    }
    data
}

/// Encode a call frame with a string function name.
pub fn encode_call_data(function: &str, arguments: &[Vec<u8>]) -> String {
    // encode_call_data_bytes only appends ASCII hex to the name
    String::from_utf8(encode_call_data_bytes(function.as_bytes(), arguments))
        .unwrap_or_default()
}

fn decode_hex_segment(segment: &str) -> Result<Vec<u8>, CodecError> {
    if segment.len() % 2 == 0 {
        hex::decode(segment).map_err(|_| CodecError::InvalidDataString)
    } else {
        let padded = format!("0{segment}");
        hex::decode(padded).map_err(|_| CodecError::InvalidDataString)
    }
}
