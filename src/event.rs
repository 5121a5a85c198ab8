//! The decoded event types handed from the subscription worker to the
//! batching database writer through the event queue.

/// A decoded pump.fun-style trade.
///
/// Field layout mirrors the 250-byte wire record in [`crate::decode::p1`]
/// one-for-one; `trader` is the wire record's `user` field renamed to match
/// the `pumpfun_trades` column it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P1Trade {
    pub mint: [u8; 32],
    pub trader: [u8; 32],
    pub creator: [u8; 32],
    pub sol_amount: u64,
    pub token_amount: u64,
    pub is_buy: bool,
    pub virtual_sol_reserves: u64,
    pub virtual_token_reserves: u64,
    pub real_sol_reserves: u64,
    pub real_token_reserves: u64,
    pub fee_basis_points: u64,
    pub fee_lamports: u64,
    pub creator_fee_basis_points: u64,
    pub creator_fee_lamports: u64,
    pub slot: u64,
    pub timestamp: i64,
    pub signature: String,
}

/// A decoded Raydium-style swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P2Swap {
    pub amm: [u8; 32],
    pub user_source_owner: [u8; 32],
    pub amount_in: u64,
    pub amount_out: u64,
    pub slot: u64,
    pub signature: String,
}

/// Tagged union of every event the pipeline can carry. The tag always
/// matches the populated variant, so there is no separate invariant to
/// check at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    P1Trade(P1Trade),
    P2Swap(P2Swap),
}

impl Event {
    pub fn slot(&self) -> u64 {
        match self {
            Event::P1Trade(t) => t.slot,
            Event::P2Swap(s) => s.slot,
        }
    }
}
