//! The token record store: deterministic storage keys plus a thin accessor
//! over the account data handler.
//!
//! Storage Key Structure (all under the protected namespace):
//! - token record:   `LEDGER || dct || tokenID`
//! - per-nonce NFT:  `LEDGER || dct || tokenID || u64-be nonce`
//! - latest nonce:   `LEDGER || nonce || tokenID`
//! - role list:      `LEDGER || role || tokenID`
//!
//! Records are read fresh, mutated and written back within one invocation;
//! the store never retains state across calls.

use std::sync::Arc;

use log::debug;
use num_bigint::BigUint;
use num_traits::Zero;

use crate::account::Account;
use crate::codec::Marshalizer;
use crate::config::{
    DCT_KEY_IDENTIFIER, NONCE_KEY_IDENTIFIER, PROTECTED_KEY_PREFIX, ROLE_KEY_IDENTIFIER,
};
use crate::error::{DctError, DctResult};
use crate::guard::{check_frozen_and_paused, PauseHandler};
use crate::token::types::TokenRecord;
use crate::vm::{u64_from_bytes, u64_to_bytes};

// ========================================
// Key scheme
// ========================================

/// Storage key of the token record family for `token_id`.
pub fn token_key(token_id: &[u8]) -> Vec<u8> {
    let mut key =
        Vec::with_capacity(PROTECTED_KEY_PREFIX.len() + DCT_KEY_IDENTIFIER.len() + token_id.len());
    key.extend_from_slice(PROTECTED_KEY_PREFIX);
    key.extend_from_slice(DCT_KEY_IDENTIFIER);
    key.extend_from_slice(token_id);
    key
}

/// Per-nonce key of an NFT record. Nonce zero is the fungible record and
/// lives at the base token key itself.
pub fn nft_key(token_key: &[u8], nonce: u64) -> Vec<u8> {
    if nonce == 0 {
        return token_key.to_vec();
    }
    let mut key = Vec::with_capacity(token_key.len() + 8);
    key.extend_from_slice(token_key);
    key.extend_from_slice(&nonce.to_be_bytes());
    key
}

/// Key of the latest-nonce counter for `token_id`.
pub fn nonce_key(token_id: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(
        PROTECTED_KEY_PREFIX.len() + NONCE_KEY_IDENTIFIER.len() + token_id.len(),
    );
    key.extend_from_slice(PROTECTED_KEY_PREFIX);
    key.extend_from_slice(NONCE_KEY_IDENTIFIER);
    key.extend_from_slice(token_id);
    key
}

/// Key of the role list for `token_id`.
pub fn role_key(token_id: &[u8]) -> Vec<u8> {
    let mut key =
        Vec::with_capacity(PROTECTED_KEY_PREFIX.len() + ROLE_KEY_IDENTIFIER.len() + token_id.len());
    key.extend_from_slice(PROTECTED_KEY_PREFIX);
    key.extend_from_slice(ROLE_KEY_IDENTIFIER);
    key.extend_from_slice(token_id);
    key
}

// ========================================
// Latest-nonce counters
// ========================================

pub fn get_latest_nonce(account: &Account, token_id: &[u8]) -> DctResult<u64> {
    let bytes = account.retrieve_value(&nonce_key(token_id))?;
    Ok(u64_from_bytes(&bytes))
}

pub fn save_latest_nonce(account: &mut Account, token_id: &[u8], nonce: u64) -> DctResult<()> {
    account.save_key_value(&nonce_key(token_id), Some(u64_to_bytes(nonce)));
    Ok(())
}

// ========================================
// Record accessor
// ========================================

/// Thin accessor reading and writing marshaled token records.
#[derive(Clone)]
pub struct TokenStore {
    marshalizer: Arc<dyn Marshalizer>,
    pause_handler: Arc<dyn PauseHandler>,
}

impl TokenStore {
    pub fn new(marshalizer: Arc<dyn Marshalizer>, pause_handler: Arc<dyn PauseHandler>) -> Self {
        Self {
            marshalizer,
            pause_handler,
        }
    }

    pub fn pause_handler(&self) -> &dyn PauseHandler {
        self.pause_handler.as_ref()
    }

    pub fn marshal_record(&self, record: &TokenRecord) -> DctResult<Vec<u8>> {
        Ok(self.marshalizer.marshal_record(record)?)
    }

    pub fn unmarshal_record(&self, bytes: &[u8]) -> DctResult<TokenRecord> {
        Ok(self.marshalizer.unmarshal_record(bytes)?)
    }

    /// Record stored at `token_key`; an absent key reads as an empty record.
    pub fn load_record(&self, account: &Account, token_key: &[u8]) -> DctResult<TokenRecord> {
        let bytes = account.retrieve_value(token_key)?;
        if bytes.is_empty() {
            return Ok(TokenRecord::default());
        }
        self.unmarshal_record(&bytes)
    }

    /// Unguarded write of a record at `token_key`.
    pub fn save_record(
        &self,
        account: &mut Account,
        token_key: &[u8],
        record: &TokenRecord,
    ) -> DctResult<()> {
        let bytes = self.marshal_record(record)?;
        account.save_key_value(token_key, Some(bytes));
        Ok(())
    }

    /// Record the sender must hold at `(token_key, nonce)`. Missing records
    /// are an error here: you cannot move what you do not hold.
    pub fn load_nft_record_on_sender(
        &self,
        account: &Account,
        token_key: &[u8],
        nonce: u64,
    ) -> DctResult<TokenRecord> {
        let bytes = account.retrieve_value(&nft_key(token_key, nonce))?;
        if bytes.is_empty() {
            return Err(DctError::NftTokenDoesNotExist);
        }
        let record = self.unmarshal_record(&bytes)?;
        if nonce > 0 && record.metadata.is_none() {
            return Err(DctError::NftDoesNotHaveMetadata);
        }
        Ok(record)
    }

    /// Record already present on a destination, if any.
    pub fn load_nft_record_on_destination(
        &self,
        account: &Account,
        token_key: &[u8],
        nonce: u64,
    ) -> DctResult<Option<TokenRecord>> {
        let bytes = account.retrieve_value(&nft_key(token_key, nonce))?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.unmarshal_record(&bytes)?))
    }

    /// Guarded write at the record's own nonce key. A drained record
    /// (zero quantity) is deleted instead of stored.
    pub fn save_nft_record(
        &self,
        account: &mut Account,
        token_key: &[u8],
        record: &TokenRecord,
        is_return_call_after_error: bool,
    ) -> DctResult<()> {
        check_frozen_and_paused(
            account.address(),
            token_key,
            record,
            self.pause_handler.as_ref(),
            is_return_call_after_error,
        )?;

        let key = nft_key(token_key, record.nonce());
        if record.value.is_zero() {
            account.save_key_value(&key, None);
            return Ok(());
        }
        let bytes = self.marshal_record(record)?;
        account.save_key_value(&key, Some(bytes));
        Ok(())
    }

    /// Credit `value` onto the fungible record at `token_key`.
    pub fn add_to_balance(
        &self,
        account: &mut Account,
        token_key: &[u8],
        value: &BigUint,
        is_return_call_after_error: bool,
    ) -> DctResult<()> {
        let mut record = self.load_record(account, token_key)?;
        check_frozen_and_paused(
            account.address(),
            token_key,
            &record,
            self.pause_handler.as_ref(),
            is_return_call_after_error,
        )?;
        record.value += value;
        self.save_record(account, token_key, &record)
    }

    /// Debit `value` from the fungible record at `token_key`. A debit past
    /// zero is an arguments error, never a clamp.
    pub fn sub_from_balance(
        &self,
        account: &mut Account,
        token_key: &[u8],
        value: &BigUint,
        is_return_call_after_error: bool,
    ) -> DctResult<()> {
        let mut record = self.load_record(account, token_key)?;
        check_frozen_and_paused(
            account.address(),
            token_key,
            &record,
            self.pause_handler.as_ref(),
            is_return_call_after_error,
        )?;
        if record.value < *value {
            debug!(
                "balance underflow on account {}: {} < {}",
                account.address(),
                record.value,
                value
            );
            return Err(DctError::invalid_arguments(
                "insufficient quantity in balance",
            ));
        }
        record.value -= value;
        self.save_record(account, token_key, &record)
    }
}
