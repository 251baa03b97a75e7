//! In-memory account storage.
//!
//! Backs the engine's tests and works as a reference implementation for
//! hosts embedding the engine without a real trie.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use super::{Account, AccountDataHandler, AccountsAdapter, StorageError};
use crate::vm::Address;

type SharedState = Arc<Mutex<HashMap<Address, BTreeMap<Vec<u8>, Vec<u8>>>>>;

/// Shared in-memory ledger of account storages. Cloning is cheap and every
/// clone observes the same state, so one store can play both the "sender
/// shard" and the adapter behind it.
#[derive(Clone, Default)]
pub struct MemAccountsStore {
    state: SharedState,
}

impl MemAccountsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// An [`Account`] whose data handler writes through to this store.
    pub fn account(&self, address: Address) -> Account {
        Account::new(
            address,
            Box::new(MemAccountData {
                state: self.state.clone(),
                address,
            }),
        )
    }

    /// Direct read of committed state, for assertions.
    pub fn stored_value(&self, address: &Address, key: &[u8]) -> Option<Vec<u8>> {
        let state = self.state.lock().ok()?;
        state.get(address)?.get(key).cloned()
    }
}

struct MemAccountData {
    state: SharedState,
    address: Address,
}

impl AccountDataHandler for MemAccountData {
    fn retrieve_value(&self, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        let state = self
            .state
            .lock()
            .map_err(|_| StorageError::new("account store lock poisoned"))?;
        Ok(state
            .get(&self.address)
            .and_then(|entries| entries.get(key))
            .cloned()
            .unwrap_or_default())
    }

    fn save_key_value(&mut self, key: &[u8], value: Option<Vec<u8>>) -> Result<(), StorageError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StorageError::new("account store lock poisoned"))?;
        let entries = state.entry(self.address).or_default();
        match value {
            Some(value) => {
                entries.insert(key.to_vec(), value);
            }
            None => {
                entries.remove(key);
            }
        }
        Ok(())
    }
}

impl AccountsAdapter for MemAccountsStore {
    fn load_account(&self, address: &Address) -> Result<Account, StorageError> {
        Ok(self.account(*address))
    }

    fn save_account(&self, mut account: Account) -> Result<(), StorageError> {
        // Handlers write through to the shared state, so committing any
        // leftover buffered writes is all that persisting means here.
        account.commit()
    }
}
