//! Fixed-layout decoder for pump.fun-style trade events.
//!
//! The wire record is 250 bytes, little-endian, packed: this is a direct
//! translation of `pumpfun_parser.c`'s `#pragma pack(push,1)` struct. Fields
//! after `creator_fee` (`track_volume` through `last_update_timestamp`) are
//! present on the wire but not carried into [`P1Trade`]; trailing bytes past
//! offset 250 are ignored entirely.

use crate::core::error::DecodeError;
use crate::event::P1Trade;

pub const LAYOUT_LEN: usize = 250;

const OFF_MINT: usize = 0;
const OFF_SOL_AMOUNT: usize = 32;
const OFF_TOKEN_AMOUNT: usize = 40;
const OFF_IS_BUY: usize = 48;
const OFF_USER: usize = 49;
const OFF_TIMESTAMP: usize = 81;
const OFF_VIRTUAL_SOL_RESERVES: usize = 89;
const OFF_VIRTUAL_TOKEN_RESERVES: usize = 97;
const OFF_REAL_SOL_RESERVES: usize = 105;
const OFF_REAL_TOKEN_RESERVES: usize = 113;
// off 121: fee_recipient[32], ignored
const OFF_FEE_BASIS_POINTS: usize = 153;
const OFF_FEE: usize = 161;
const OFF_CREATOR: usize = 169;
const OFF_CREATOR_FEE_BASIS_POINTS: usize = 201;
const OFF_CREATOR_FEE: usize = 209;
// off 217..250: track_volume, total_unclaimed_tokens, total_claimed_tokens,
// current_sol_volume, last_update_timestamp — ignored.

fn pubkey_at(buf: &[u8], off: usize) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&buf[off..off + 32]);
    out
}

fn u64_at(buf: &[u8], off: usize) -> u64 {
    u64::from_le_bytes(buf[off..off + 8].try_into().unwrap())
}

fn i64_at(buf: &[u8], off: usize) -> i64 {
    i64::from_le_bytes(buf[off..off + 8].try_into().unwrap())
}

/// Decodes a 250-byte P1 trade record. `slot` and `signature` are not part
/// of the wire payload; the caller attaches them after a successful decode.
pub fn decode(buf: &[u8]) -> Result<P1Trade, DecodeError> {
    if buf.len() < LAYOUT_LEN {
        return Err(DecodeError::TooShort {
            need: LAYOUT_LEN,
            have: buf.len(),
        });
    }

    Ok(P1Trade {
        mint: pubkey_at(buf, OFF_MINT),
        trader: pubkey_at(buf, OFF_USER),
        creator: pubkey_at(buf, OFF_CREATOR),
        sol_amount: u64_at(buf, OFF_SOL_AMOUNT),
        token_amount: u64_at(buf, OFF_TOKEN_AMOUNT),
        is_buy: buf[OFF_IS_BUY] != 0,
        virtual_sol_reserves: u64_at(buf, OFF_VIRTUAL_SOL_RESERVES),
        virtual_token_reserves: u64_at(buf, OFF_VIRTUAL_TOKEN_RESERVES),
        real_sol_reserves: u64_at(buf, OFF_REAL_SOL_RESERVES),
        real_token_reserves: u64_at(buf, OFF_REAL_TOKEN_RESERVES),
        fee_basis_points: u64_at(buf, OFF_FEE_BASIS_POINTS),
        fee_lamports: u64_at(buf, OFF_FEE),
        creator_fee_basis_points: u64_at(buf, OFF_CREATOR_FEE_BASIS_POINTS),
        creator_fee_lamports: u64_at(buf, OFF_CREATOR_FEE),
        slot: 0,
        timestamp: i64_at(buf, OFF_TIMESTAMP),
        signature: String::new(),
    })
}
