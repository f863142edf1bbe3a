//! Deposit authorization: canonical digest construction and signer recovery.
//!
//! A keeper approves a deposit by signing, as an EIP-191 personal message,
//!
//! ```text
//! digest = keccak256(caller || key || asset || uint256(amount) || uint256(chain_id))
//! ```
//!
//! with every field fixed at 32 bytes. `chain_id` is the deployment's domain
//! separator, so an approval for one deployment never verifies on another.
//! The signer is recovered with the `secp256k1_recover` syscall and identified
//! by its 20-byte EVM address. Privilege is checked by the caller.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::keccak;
use anchor_lang::solana_program::secp256k1_recover::secp256k1_recover;

use crate::errors::BridgeError;
use crate::state::RequestKey;

const EIP191_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Half the secp256k1 group order. Signatures with a larger `s` are the
/// malleable twin of a low-`s` signature and are rejected.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

pub type EvmAddress = [u8; 20];

/// Recoverable ECDSA signature in `(r, s, v)` form.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeeperSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Recovery id, either raw (0, 1) or Ethereum-style (27, 28).
    pub v: u8,
}

impl KeeperSignature {
    pub fn recovery_id(&self) -> Result<u8> {
        match self.v {
            0 | 1 => Ok(self.v),
            27 | 28 => Ok(self.v - 27),
            _ => err!(BridgeError::InvalidSignature),
        }
    }

    fn rs(&self) -> [u8; 64] {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        rs
    }
}

fn uint256(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn deposit_digest(
    caller: &Pubkey,
    key: &RequestKey,
    asset: &Pubkey,
    amount: u64,
    chain_id: u64,
) -> [u8; 32] {
    keccak::hashv(&[
        caller.as_ref(),
        &key[..],
        asset.as_ref(),
        &uint256(amount),
        &uint256(chain_id),
    ])
    .to_bytes()
}

pub fn eth_signed_message_hash(digest: &[u8; 32]) -> [u8; 32] {
    keccak::hashv(&[EIP191_PREFIX, &digest[..]]).to_bytes()
}

/// EVM address of an uncompressed public key (`x || y`).
pub fn evm_address(pubkey: &[u8; 64]) -> EvmAddress {
    let hash = keccak::hash(pubkey).to_bytes();
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

pub fn recover_signer(message_hash: &[u8; 32], signature: &KeeperSignature) -> Result<EvmAddress> {
    let recovery_id = signature.recovery_id()?;
    require!(
        signature.s <= SECP256K1_HALF_ORDER,
        BridgeError::InvalidSignature
    );
    let pubkey = secp256k1_recover(message_hash, recovery_id, &signature.rs())
        .map_err(|_| error!(BridgeError::InvalidSignature))?;
    Ok(evm_address(&pubkey.to_bytes()))
}

/// Recovers the account that approved `(caller, key, asset, amount)` on `chain_id`.
pub fn recover_deposit_signer(
    caller: &Pubkey,
    key: &RequestKey,
    asset: &Pubkey,
    amount: u64,
    chain_id: u64,
    signature: &KeeperSignature,
) -> Result<EvmAddress> {
    let digest = deposit_digest(caller, key, asset, amount, chain_id);
    recover_signer(&eth_signed_message_hash(&digest), signature)
}
