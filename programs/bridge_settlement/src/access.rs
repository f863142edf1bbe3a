//! Role checks over membership PDAs.
//!
//! A membership account only proves a role if it sits at the PDA derived from
//! `(role, member)`, is owned by this program and is active. Anything else
//! reads as "not a member".

use anchor_lang::prelude::*;

use crate::errors::BridgeError;
use crate::state::{BridgeConfig, Member, Role, RoleMember, ROLE_SEED};
use crate::verifier::EvmAddress;

pub fn member_of_key(key: &Pubkey) -> Member {
    key.to_bytes()
}

/// Left-pads a 20-byte EVM address into the 32-byte member form.
pub fn member_of_evm(address: &EvmAddress) -> Member {
    let mut member = [0u8; 32];
    member[12..].copy_from_slice(address);
    member
}

pub fn role_address(role: Role, member: &Member, program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[ROLE_SEED, role.seed(), &member[..]], program_id).0
}

pub fn has_role(
    info: &AccountInfo,
    role: Role,
    member: &Member,
    program_id: &Pubkey,
) -> Result<bool> {
    if *info.key != role_address(role, member, program_id)
        || info.owner != program_id
        || info.data_is_empty()
    {
        return Ok(false);
    }
    let data = info.try_borrow_data()?;
    let record = RoleMember::try_deserialize(&mut &data[..])?;
    Ok(record.role == role && record.member == *member && record.active)
}

/// Fails with `Unauthorized` unless `account` holds `role`.
pub fn require_role(
    info: &AccountInfo,
    role: Role,
    account: &Pubkey,
    program_id: &Pubkey,
) -> Result<()> {
    if !has_role(info, role, &member_of_key(account), program_id)? {
        msg!("AccessControlUnauthorizedAccount: {} lacks {}", account, role.name());
        return err!(BridgeError::Unauthorized);
    }
    Ok(())
}

/// Activates `record` as `member`'s membership of `role`. Returns false when
/// the role was already held.
pub fn grant(
    config: &mut BridgeConfig,
    record: &mut RoleMember,
    role: Role,
    member: Member,
    bump: u8,
) -> Result<bool> {
    record.role = role;
    record.member = member;
    record.bump = bump;
    if !record.activate() {
        return Ok(false);
    }
    if role == Role::Admin {
        config.admin_added()?;
    }
    Ok(true)
}

/// Deactivates `record`. Returns false when the role was not held.
pub fn revoke(
    config: &mut BridgeConfig,
    record: &mut RoleMember,
    role: Role,
    member: Member,
    bump: u8,
) -> Result<bool> {
    record.role = role;
    record.member = member;
    record.bump = bump;
    if !record.active {
        return Ok(false);
    }
    if role == Role::Admin {
        config.admin_removed()?;
    }
    Ok(record.deactivate())
}
