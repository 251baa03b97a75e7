//! Role tags and the stored role lists they live in.
//!
//! A role scopes which caller may invoke a given built-in on a given token
//! identifier. Role lists are stored per account under the role key family.

use crate::account::Account;
use crate::codec::Marshalizer;
use crate::error::DctResult;
use crate::token::storage::role_key;
use crate::token::types::RoleSet;

/// Allows local minting of a fungible token.
pub const ROLE_LOCAL_MINT: &[u8] = b"DCTRoleLocalMint";

/// Allows local burning of a fungible token.
pub const ROLE_LOCAL_BURN: &[u8] = b"DCTRoleLocalBurn";

/// Allows creating new NFT nonces for a token.
pub const ROLE_NFT_CREATE: &[u8] = b"DCTRoleNFTCreate";

/// Allows overwriting the attributes of an existing NFT.
pub const ROLE_NFT_UPDATE_ATTRIBUTES: &[u8] = b"DCTRoleNFTUpdateAttributes";

/// Role list of `token_id` on `account`; an absent list reads as empty.
pub fn load_roles(
    marshalizer: &dyn Marshalizer,
    account: &Account,
    token_id: &[u8],
) -> DctResult<RoleSet> {
    let bytes = account.retrieve_value(&role_key(token_id))?;
    if bytes.is_empty() {
        return Ok(RoleSet::default());
    }
    Ok(marshalizer.unmarshal_roles(&bytes)?)
}

pub fn save_roles(
    marshalizer: &dyn Marshalizer,
    account: &mut Account,
    token_id: &[u8],
    roles: &RoleSet,
) -> DctResult<()> {
    let bytes = marshalizer.marshal_roles(roles)?;
    account.save_key_value(&role_key(token_id), Some(bytes));
    Ok(())
}
