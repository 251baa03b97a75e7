//! The opaque marshal/unmarshal service for stored records.
//!
//! The engine never interprets stored bytes directly; every token record
//! and role list goes through a [`Marshalizer`]. Hosts may plug in their
//! own codec as long as unmarshal is the exact inverse of marshal.

use super::CodecError;
use crate::token::{RoleSet, TokenRecord};

pub trait Marshalizer: Send + Sync {
    fn marshal_record(&self, record: &TokenRecord) -> Result<Vec<u8>, CodecError>;
    fn unmarshal_record(&self, bytes: &[u8]) -> Result<TokenRecord, CodecError>;
    fn marshal_roles(&self, roles: &RoleSet) -> Result<Vec<u8>, CodecError>;
    fn unmarshal_roles(&self, bytes: &[u8]) -> Result<RoleSet, CodecError>;
}

/// serde_json-backed marshalizer. Struct fields serialize in declaration
/// order, so the encoding is deterministic across nodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonMarshalizer;

impl Marshalizer for JsonMarshalizer {
    fn marshal_record(&self, record: &TokenRecord) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(record).map_err(|e| CodecError::Serialization(e.to_string()))
    }

    fn unmarshal_record(&self, bytes: &[u8]) -> Result<TokenRecord, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Serialization(e.to_string()))
    }

    fn marshal_roles(&self, roles: &RoleSet) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(roles).map_err(|e| CodecError::Serialization(e.to_string()))
    }

    fn unmarshal_roles(&self, bytes: &[u8]) -> Result<RoleSet, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Serialization(e.to_string()))
    }
}
