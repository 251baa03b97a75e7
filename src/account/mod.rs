//! Accounts as the engine sees them: an address plus a key-value data
//! handler owned by the external ledger.
//!
//! Every [`Account`] layers a pending-write overlay over its handler.
//! Builtins read through the overlay and write only into it; the writes
//! reach the underlying handler on [`Account::commit`] and evaporate on
//! [`Account::discard`]. On success, changes are preserved. On failure,
//! they are dropped. This is what makes a failed call equal zero persisted
//! mutations even when the failure hits after the first write.

mod mem;

pub use mem::*;

use std::collections::HashMap;

use thiserror::Error;

use crate::vm::Address;

/// Error surfaced by the external account storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("account storage error: {0}")]
pub struct StorageError(pub String);

impl StorageError {
    pub fn new(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Key-value storage of a single account, owned by the external ledger.
pub trait AccountDataHandler {
    /// Value stored at `key`; an absent key reads as empty bytes.
    fn retrieve_value(&self, key: &[u8]) -> Result<Vec<u8>, StorageError>;

    /// Store `value` at `key`; `None` deletes the key.
    fn save_key_value(&mut self, key: &[u8], value: Option<Vec<u8>>) -> Result<(), StorageError>;
}

/// An account handed to a builtin for the duration of one call.
pub struct Account {
    address: Address,
    handler: Box<dyn AccountDataHandler>,
    pending: HashMap<Vec<u8>, Option<Vec<u8>>>,
}

impl Account {
    pub fn new(address: Address, handler: Box<dyn AccountDataHandler>) -> Self {
        Self {
            address,
            handler,
            pending: HashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Read through the overlay: pending writes win, tombstones read empty.
    pub fn retrieve_value(&self, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        match self.pending.get(key) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Ok(Vec::new()),
            None => self.handler.retrieve_value(key),
        }
    }

    /// Buffer a write; nothing reaches the handler until [`Self::commit`].
    pub fn save_key_value(&mut self, key: &[u8], value: Option<Vec<u8>>) {
        self.pending.insert(key.to_vec(), value);
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Flush all buffered writes into the underlying handler.
    pub fn commit(&mut self) -> Result<(), StorageError> {
        for (key, value) in self.pending.drain() {
            self.handler.save_key_value(&key, value)?;
        }
        Ok(())
    }

    /// Drop all buffered writes.
    pub fn discard(&mut self) {
        self.pending.clear();
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Loads and saves accounts outside the pair the VM handed in. Only the
/// cross-shard aware builtins use it.
pub trait AccountsAdapter: Send + Sync {
    fn load_account(&self, address: &Address) -> Result<Account, StorageError>;
    fn save_account(&self, account: Account) -> Result<(), StorageError>;
}
