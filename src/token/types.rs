//! Core token record types.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::vm::Address;

/// Kind of a stored token record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    #[default]
    Fungible,
    NonFungible,
    SemiFungible,
}

/// Per-record property bitfield. Bit 0 of the stored byte is the frozen
/// flag; the remaining bits are reserved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub struct TokenProperties {
    pub frozen: bool,
}

impl From<TokenProperties> for u8 {
    fn from(properties: TokenProperties) -> u8 {
        u8::from(properties.frozen)
    }
}

impl From<u8> for TokenProperties {
    fn from(bits: u8) -> Self {
        Self {
            frozen: bits & 1 != 0,
        }
    }
}

/// Metadata of one non-fungible instance. Immutable after creation except
/// `attributes`, which only the update-attributes builtin may overwrite.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftMetadata {
    pub nonce: u64,
    pub name: Vec<u8>,
    pub creator: Address,
    /// Parts per 10_000 of every sale owed to the creator.
    pub royalties: u32,
    pub hash: Vec<u8>,
    pub uris: Vec<Vec<u8>>,
    pub attributes: Vec<u8>,
}

/// One token record as stored under an account key.
///
/// For a fungible record `value` is the total held balance; for an NFT
/// record it is the quantity held at that specific nonce.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub kind: TokenKind,
    pub value: BigUint,
    pub properties: TokenProperties,
    pub metadata: Option<NftMetadata>,
}

impl TokenRecord {
    pub fn fungible(value: BigUint) -> Self {
        Self {
            kind: TokenKind::Fungible,
            value,
            ..Self::default()
        }
    }

    pub fn non_fungible(value: BigUint, metadata: NftMetadata) -> Self {
        Self {
            kind: TokenKind::NonFungible,
            value,
            properties: TokenProperties::default(),
            metadata: Some(metadata),
        }
    }

    /// Nonce of the record; fungible records live at nonce zero.
    pub fn nonce(&self) -> u64 {
        self.metadata.as_ref().map(|m| m.nonce).unwrap_or(0)
    }
}

/// The set of role tags granted on one token identifier.
///
/// Set semantics over an ordered encoding: grants are idempotent and the
/// list is created on first grant, never implicitly deleted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    pub roles: Vec<Vec<u8>>,
}

impl RoleSet {
    pub fn contains(&self, role: &[u8]) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Add `role` unless already present.
    pub fn grant(&mut self, role: &[u8]) {
        if !self.contains(role) {
            self.roles.push(role.to_vec());
        }
    }

    /// Remove every occurrence of `role`.
    pub fn revoke(&mut self, role: &[u8]) {
        self.roles.retain(|r| r != role);
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
