//! VM-facing types of the built-in function engine.
//!
//! These are the shapes the hosting virtual machine exchanges with the
//! catalogue: the call input it dispatches, the call output it folds back
//! into the ledger, and the forwarded transfers through which cross-shard
//! effects are expressed without direct remote mutation.

use std::fmt;

use indexmap::IndexMap;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::codec::encode_call_data_bytes;
use crate::config::NUM_SC_LEADING_ZEROS;

/// Shard identifier.
pub type ShardId = u32;

// ========================================
// Address
// ========================================

/// A 32-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl Address {
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Parse an address from raw bytes; `None` when the slice is not 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    /// Contract-shaped addresses start with a run of zero bytes.
    pub fn is_smart_contract(&self) -> bool {
        self.0[..NUM_SC_LEADING_ZEROS].iter().all(|b| *b == 0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(self.0))
    }
}

// ========================================
// Call input
// ========================================

/// How the hosting VM reached the builtin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CallType {
    #[default]
    DirectCall,
    AsynchronousCall,
    AsynchronousCallBack,
}

/// Input of one catalogue invocation, as dispatched by the VM.
#[derive(Clone, Debug)]
pub struct CallInput {
    /// Name of the invoked built-in function.
    pub function: String,
    pub caller: Address,
    pub recipient: Address,
    /// Native value attached to the call. Built-ins reject non-zero values.
    pub call_value: BigUint,
    pub arguments: Vec<Vec<u8>>,
    pub gas_provided: u64,
    pub gas_locked: u64,
    pub call_type: CallType,
    /// Set on error-recovery continuations; frozen/pause checks are
    /// bypassed so previously locked value can still settle.
    pub return_call_after_error: bool,
}

impl CallInput {
    /// A plain direct call with no value attached.
    pub fn direct(function: &str, caller: Address, recipient: Address) -> Self {
        Self {
            function: function.to_string(),
            caller,
            recipient,
            call_value: BigUint::zero(),
            arguments: Vec::new(),
            gas_provided: 0,
            gas_locked: 0,
            call_type: CallType::DirectCall,
            return_call_after_error: false,
        }
    }
}

// ========================================
// Call output
// ========================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReturnCode {
    #[default]
    Ok,
    UserError,
}

/// One event emitted by a builtin.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogEntry {
    pub identifier: Vec<u8>,
    pub address: Option<Address>,
    pub topics: Vec<Vec<u8>>,
    pub data: Vec<u8>,
}

/// A message handed back to the ledger layer for asynchronous delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputTransfer {
    pub value: BigUint,
    pub gas_limit: u64,
    pub gas_locked: u64,
    pub data: Vec<u8>,
    pub call_type: CallType,
    pub sender: Address,
}

/// Per-destination bundle of output transfers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputAccount {
    pub output_transfers: Vec<OutputTransfer>,
}

/// Result of one successful catalogue invocation.
#[derive(Clone, Debug, Default)]
pub struct CallOutput {
    pub return_code: ReturnCode,
    pub gas_remaining: u64,
    pub output_accounts: IndexMap<Address, OutputAccount>,
    pub logs: Vec<LogEntry>,
}

impl CallOutput {
    pub fn with_gas(gas_remaining: u64) -> Self {
        Self {
            gas_remaining,
            ..Self::default()
        }
    }
}

// ========================================
// Byte helpers
// ========================================

/// Big-endian bytes of an unsigned value, empty for zero.
pub fn big_to_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

/// Minimal big-endian bytes of a u64, empty for zero.
pub fn u64_to_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

/// Big-endian interpretation of arbitrary-width bytes, truncated to the
/// low 64 bits the way an oversized counter argument is read on the wire.
pub fn u64_from_bytes(bytes: &[u8]) -> u64 {
    let tail = if bytes.len() > 8 {
        &bytes[bytes.len() - 8..]
    } else {
        bytes
    };
    let mut value = 0u64;
    for b in tail {
        value = (value << 8) | u64::from(*b);
    }
    value
}

// ========================================
// Log entry and output transfer builders
// ========================================

/// Log entry for an amount-moving token operation.
pub fn token_log_entry(
    identifier: &str,
    caller: Option<Address>,
    token_id: &[u8],
    value: &BigUint,
) -> LogEntry {
    LogEntry {
        identifier: identifier.as_bytes().to_vec(),
        address: caller,
        topics: vec![token_id.to_vec(), big_to_bytes(value)],
        data: Vec::new(),
    }
}

/// Log entry for an NFT operation, keyed by nonce.
pub fn nft_log_entry(identifier: &str, caller: Address, token_id: &[u8], nonce: u64) -> LogEntry {
    LogEntry {
        identifier: identifier.as_bytes().to_vec(),
        address: Some(caller),
        topics: vec![token_id.to_vec(), u64_to_bytes(nonce)],
        data: Vec::new(),
    }
}

/// Append a forwarded built-in call frame for `recipient`, carrying
/// `gas_limit` across the shard boundary.
pub fn add_forwarded_call(
    output: &mut CallOutput,
    sender: Address,
    recipient: Address,
    function: &str,
    arguments: &[Vec<u8>],
    gas_locked: u64,
    gas_limit: u64,
    call_type: CallType,
) {
    let transfer = OutputTransfer {
        value: BigUint::zero(),
        gas_limit,
        gas_locked,
        data: encode_call_data_bytes(function.as_bytes(), arguments),
        call_type,
        sender,
    };
    output
        .output_accounts
        .entry(recipient)
        .or_default()
        .output_transfers
        .push(transfer);
}

/// Append a direct contract invocation on `recipient`. All remaining gas of
/// the output moves into the transfer; the builtin itself keeps none.
pub fn add_direct_call(
    output: &mut CallOutput,
    sender: Address,
    recipient: Address,
    function: &[u8],
    arguments: &[Vec<u8>],
    gas_locked: u64,
    call_type: CallType,
) {
    let transfer = OutputTransfer {
        value: BigUint::zero(),
        gas_limit: output.gas_remaining,
        gas_locked,
        data: encode_call_data_bytes(function, arguments),
        call_type,
        sender,
    };
    output.gas_remaining = 0;
    output
        .output_accounts
        .entry(recipient)
        .or_default()
        .output_transfers
        .push(transfer);
}

// ========================================
// Shard and epoch capabilities
// ========================================

/// Maps addresses onto shards. Provided by the hosting node.
pub trait ShardCoordinator: Send + Sync {
    fn compute_shard(&self, address: &Address) -> ShardId;
    fn self_shard(&self) -> ShardId;
}

/// Supplies the current protocol epoch for activation checks.
pub trait EpochProvider: Send + Sync {
    fn current_epoch(&self) -> u32;
}

/// Epoch provider pinned to a fixed value. Useful for hosts without epoch
/// switching and for tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedEpochProvider(pub u32);

impl EpochProvider for FixedEpochProvider {
    fn current_epoch(&self) -> u32 {
        self.0
    }
}

/// Coordinator for a single-shard deployment: every address is local.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleShardCoordinator;

impl ShardCoordinator for SingleShardCoordinator {
    fn compute_shard(&self, _address: &Address) -> ShardId {
        0
    }

    fn self_shard(&self) -> ShardId {
        0
    }
}
