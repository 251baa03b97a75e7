//! Gas cost tables for the built-in function catalogue.
//!
//! Each metered builtin owns a lock-guarded cell holding its effective
//! costs. Reconfiguration (an epoch boundary event) takes the exclusive
//! side of the lock, execution takes the shared side for its whole
//! duration, so a call never observes a gas model that changes mid-flight.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Base cost of each metered catalogue entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuiltInCost {
    pub local_mint: u64,
    pub local_burn: u64,
    pub nft_create: u64,
    pub nft_update_attributes: u64,
    pub multi_transfer: u64,
}

/// Data-proportional costs shared by the catalogue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BaseOperationCost {
    /// Cost per byte persisted to account storage.
    pub store_per_byte: u64,
    /// Cost per byte copied into a forwarded call frame.
    pub data_copy_per_byte: u64,
}

/// The full, hot-swappable gas configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GasCost {
    pub built_in: BuiltInCost,
    pub base_op: BaseOperationCost,
}

/// Read a gas cell, recovering the value even if a writer panicked.
pub(crate) fn read_cell<T>(cell: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    cell.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write a gas cell, recovering the value even if a writer panicked.
pub(crate) fn write_cell<T>(cell: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    cell.write().unwrap_or_else(PoisonError::into_inner)
}
