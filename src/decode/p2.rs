//! Positional-stream decoder for Raydium-style swap events.
//!
//! Grounded in `raydium_parser.c`'s `raydium_parse_swap`: a fixed read
//! order over a byte cursor, discarding fields the pipeline does not carry
//! and capturing only `amm` and the final `user_owner`.

use super::cursor::ByteCursor;
use crate::core::error::DecodeError;
use crate::event::P2Swap;

const DISCARDED_PUBKEYS_AFTER_TARGET: usize = 11;

/// Decodes a positional P2 swap stream. `slot` and `signature` are attached
/// by the caller after a successful decode.
pub fn decode(buf: &[u8]) -> Result<P2Swap, DecodeError> {
    let mut c = ByteCursor::new(buf);

    let amount_in = c.read_u64()?;
    let _minimum_amount_out = c.read_u64()?;
    let _max_amount_in = c.read_u64()?;
    let amount_out = c.read_u64()?;
    let _token_program = c.read_pubkey()?;
    let amm = c.read_pubkey()?;
    let _amm_authority = c.read_pubkey()?;
    let _amm_open_orders = c.read_pubkey()?;

    let has_target = c.read_u8()?;
    if has_target != 0 {
        let _target_orders = c.read_pubkey()?;
    }

    for _ in 0..DISCARDED_PUBKEYS_AFTER_TARGET {
        let _ = c.read_pubkey()?;
    }

    let user_source_owner = c.read_pubkey()?;

    Ok(P2Swap {
        amm,
        user_source_owner,
        amount_in,
        amount_out,
        slot: 0,
        signature: String::new(),
    })
}
