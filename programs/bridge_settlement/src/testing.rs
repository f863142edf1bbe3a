//! Fixtures shared by the unit tests.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_error::ProgramError;
use anchor_lang::solana_program::program_option::COption;
use anchor_lang::solana_program::program_pack::Pack;
use anchor_spl::token::spl_token;

use crate::access::role_address;
use crate::errors::BridgeError;
use crate::ledger::{new_pool, pool_address};
use crate::state::{AssetPool, Member, RequestKey, Role, RoleMember, NATIVE_ASSET};
use crate::verifier::{deposit_digest, eth_signed_message_hash, evm_address, EvmAddress, KeeperSignature};

pub const RENT_RESERVE: u64 = 1_500_000;

pub fn assert_bridge_error<T>(result: Result<T>, expected: BridgeError) {
    match result {
        Ok(_) => panic!("expected a bridge error"),
        Err(err) => assert_eq!(
            ProgramError::from(err),
            ProgramError::from(anchor_lang::error::Error::from(expected))
        ),
    }
}

pub fn request_key(last: u8) -> RequestKey {
    let mut key = [0u8; 32];
    key[31] = last;
    key
}

/// Backing storage for an `AccountInfo`.
pub struct AccountFixture {
    pub key: Pubkey,
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
}

impl AccountFixture {
    pub fn wallet(lamports: u64) -> Self {
        Self {
            key: Pubkey::new_unique(),
            owner: anchor_lang::system_program::ID,
            lamports,
            data: Vec::new(),
        }
    }

    pub fn role(role: Role, member: Member, active: bool) -> Self {
        let record = RoleMember {
            role,
            member,
            active,
            bump: 255,
        };
        let mut data = Vec::new();
        record.try_serialize(&mut data).unwrap();
        Self {
            key: role_address(role, &member, &crate::ID),
            owner: crate::ID,
            lamports: RENT_RESERVE,
            data,
        }
    }

    fn pool(key: Pubkey, pool: AssetPool, lamports: u64) -> Self {
        let mut data = Vec::new();
        pool.try_serialize(&mut data).unwrap();
        Self {
            key,
            owner: crate::ID,
            lamports,
            data,
        }
    }

    pub fn native_pool(balance: u64) -> Self {
        let key = pool_address(&NATIVE_ASSET, &crate::ID);
        let mut pool = new_pool(NATIVE_ASSET, key, 255);
        pool.balance = balance;
        Self::pool(key, pool, RENT_RESERVE + balance)
    }

    /// Pool of `mint` whose inventory is tracked in `vault`.
    pub fn token_pool(mint: Pubkey, vault: Pubkey, balance: u64) -> Self {
        let key = pool_address(&mint, &crate::ID);
        let mut pool = new_pool(mint, vault, 255);
        pool.balance = balance;
        Self::pool(key, pool, RENT_RESERVE)
    }

    pub fn token_account(mint: Pubkey, owner: Pubkey, amount: u64) -> Self {
        let account = spl_token::state::Account {
            mint,
            owner,
            amount,
            delegate: COption::None,
            state: spl_token::state::AccountState::Initialized,
            is_native: COption::None,
            delegated_amount: 0,
            close_authority: COption::None,
        };
        let mut data = vec![0u8; spl_token::state::Account::LEN];
        spl_token::state::Account::pack(account, &mut data).unwrap();
        Self {
            key: Pubkey::new_unique(),
            owner: anchor_spl::token::ID,
            lamports: RENT_RESERVE,
            data,
        }
    }

    pub fn program(id: Pubkey) -> Self {
        Self {
            key: id,
            owner: Pubkey::default(),
            lamports: 1,
            data: Vec::new(),
        }
    }

    pub fn info(&mut self) -> AccountInfo<'_> {
        AccountInfo::new(
            &self.key,
            false,
            true,
            &mut self.lamports,
            &mut self.data,
            &self.owner,
            false,
            0,
        )
    }

    /// `AccountInfo` that lives for the rest of the test, for APIs that
    /// borrow it for its own lifetime.
    pub fn leak(self) -> &'static AccountInfo<'static> {
        let fixture: &'static mut AccountFixture = Box::leak(Box::new(self));
        Box::leak(Box::new(fixture.info()))
    }
}

/// secp256k1 signing key derived from a repeated seed byte, with its address.
pub fn signer(seed: u8) -> (libsecp256k1::SecretKey, EvmAddress) {
    let secret = libsecp256k1::SecretKey::parse(&[seed; 32]).unwrap();
    let public = libsecp256k1::PublicKey::from_secret_key(&secret).serialize();
    let mut raw = [0u8; 64];
    raw.copy_from_slice(&public[1..]);
    (secret, evm_address(&raw))
}

/// Signs a deposit approval the way the off-chain keeper does.
pub fn sign_deposit(
    secret: &libsecp256k1::SecretKey,
    caller: &Pubkey,
    key: &RequestKey,
    asset: &Pubkey,
    amount: u64,
    chain_id: u64,
) -> KeeperSignature {
    let digest = deposit_digest(caller, key, asset, amount, chain_id);
    let message = libsecp256k1::Message::parse(&eth_signed_message_hash(&digest));
    let (signature, recovery_id) = libsecp256k1::sign(&message, secret);
    let bytes = signature.serialize();
    KeeperSignature {
        r: bytes[..32].try_into().unwrap(),
        s: bytes[32..].try_into().unwrap(),
        v: recovery_id.serialize() + 27,
    }
}
