//! Program errors. Each failure aborts the whole instruction; the code tells a
//! client whether to retry with a new key, ask for a role, or wait for liquidity.

use anchor_lang::prelude::*;

#[error_code]
pub enum BridgeError {
    #[msg("Invalid parameters: zero amount or unrecognized asset")]
    InvalidParams,

    #[msg("Invalid signature or signer is not a keeper")]
    InvalidSignature,

    #[msg("Request key already consumed")]
    AlreadyConsumed,

    #[msg("Unauthorized: caller lacks the required role")]
    Unauthorized,

    #[msg("Insufficient pool balance")]
    InsufficientBalance,

    #[msg("Asset transfer failed")]
    TransferFailed,

    #[msg("Cannot revoke the last admin")]
    LastAdmin,

    #[msg("Arithmetic overflow")]
    MathOverflow,
}

