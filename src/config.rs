//! Protocol constants for the DCT built-in function engine.
//!
//! Everything the engine writes into account storage lives under the
//! protected key namespace below. User contract storage keys can never start
//! with this prefix, which keeps the three record families (token records,
//! latest-nonce counters, role lists) out of reach of user bytecode.

use crate::vm::{Address, ShardId};

/// Reserved namespace prefix for all protocol-owned storage keys.
pub const PROTECTED_KEY_PREFIX: &[u8] = b"LEDGER";

/// Identifier of the token record key family.
pub const DCT_KEY_IDENTIFIER: &[u8] = b"dct";

/// Identifier of the latest-nonce counter key family.
pub const NONCE_KEY_IDENTIFIER: &[u8] = b"nonce";

/// Identifier of the role list key family.
pub const ROLE_KEY_IDENTIFIER: &[u8] = b"role";

/// Shard identifier of the metachain. Never a valid token destination.
pub const METACHAIN_SHARD_ID: ShardId = ShardId::MAX;

/// Number of leading zero bytes marking a contract-shaped address.
pub const NUM_SC_LEADING_ZEROS: usize = 8;

/// Maximum width in bytes of a mint/burn amount argument.
pub const MAX_VALUE_BYTES: usize = 100;

/// Royalties are expressed in parts per 10_000.
pub const MAX_ROYALTIES: u32 = 10_000;

/// Minimum argument count shared by every token call (tokenID + one more).
pub const MIN_TRANSFER_ARGUMENTS: usize = 2;

/// Arguments consumed by each (tokenID, nonce, quantity) transfer triple.
pub const ARGUMENTS_PER_TRANSFER: usize = 3;

/// The token management system contract. Freeze, unfreeze, wipe and the
/// create-role hand-off only accept calls originating from this address.
pub const TOKEN_SYSTEM_SC_ADDRESS: Address = Address::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, b'd', b'c', b't', 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0xff,
]);
