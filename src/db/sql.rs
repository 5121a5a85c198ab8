//! Textual SQL construction for the batched multi-row inserts.
//!
//! Builds string-interpolated statements rather than bound parameters,
//! unlike `db_writer.c`'s `PQexecParams` with `$N` placeholders (see
//! `DESIGN.md`). Every value placed into a statement here is either a
//! base58-encoded 32-byte key (the alphabet contains no quote characters)
//! or a formatted integer; `quote()` still escapes single quotes since
//! neither source is otherwise validated against embedding one.

use crate::event::{P1Trade, P2Swap};

/// Base58-encodes a 32-byte key. Returns `None` only in the defensive case
/// where encoding somehow fails; rows failing this are skipped by the
/// caller rather than aborting the whole batch.
pub fn encode_pubkey(bytes: &[u8; 32]) -> Option<String> {
    let encoded = bs58::encode(bytes).into_string();
    if encoded.is_empty() {
        None
    } else {
        Some(encoded)
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Builds a single multi-row INSERT for a non-empty slice of P1 trades.
/// Rows whose pubkey fields fail to base58-encode are silently skipped.
pub fn build_pumpfun_insert(rows: &[P1Trade]) -> Option<String> {
    let mut values = Vec::with_capacity(rows.len());
    for t in rows {
        let (Some(mint), Some(trader), Some(creator)) = (
            encode_pubkey(&t.mint),
            encode_pubkey(&t.trader),
            encode_pubkey(&t.creator),
        ) else {
            continue;
        };
        let side = if t.is_buy { "BUY" } else { "SELL" };
        values.push(format!(
            "({slot},{sig},{mint},{trader},{creator},{side},{sol_amount},{token_amount},{fee_bps},{fee_lamports},{creator_fee_bps},{creator_fee_lamports},{vsr},{vtr},{rsr},{rtr})",
            slot = t.slot,
            sig = quote(&t.signature),
            mint = quote(&mint),
            trader = quote(&trader),
            creator = quote(&creator),
            side = quote(side),
            sol_amount = t.sol_amount,
            token_amount = t.token_amount,
            fee_bps = t.fee_basis_points,
            fee_lamports = t.fee_lamports,
            creator_fee_bps = t.creator_fee_basis_points,
            creator_fee_lamports = t.creator_fee_lamports,
            vsr = t.virtual_sol_reserves,
            vtr = t.virtual_token_reserves,
            rsr = t.real_sol_reserves,
            rtr = t.real_token_reserves,
        ));
    }

    if values.is_empty() {
        return None;
    }

    Some(format!(
        "INSERT INTO pumpfun_trades (slot, tx_signature, mint, trader, creator, side, sol_amount, token_amount, fee_bps, fee_lamports, creator_fee_bps, creator_fee_lamports, virtual_sol_reserves, virtual_token_reserves, real_sol_reserves, real_token_reserves) VALUES {}",
        values.join(", ")
    ))
}

/// Builds a single multi-row INSERT for a non-empty slice of P2 swaps.
pub fn build_raydium_insert(rows: &[P2Swap]) -> Option<String> {
    let mut values = Vec::with_capacity(rows.len());
    for s in rows {
        let (Some(pool), Some(user_owner)) = (
            encode_pubkey(&s.amm),
            encode_pubkey(&s.user_source_owner),
        ) else {
            continue;
        };
        values.push(format!(
            "({slot},{sig},{pool},{user_owner},{amount_in},{amount_out})",
            slot = s.slot,
            sig = quote(&s.signature),
            pool = quote(&pool),
            user_owner = quote(&user_owner),
            amount_in = s.amount_in,
            amount_out = s.amount_out,
        ));
    }

    if values.is_empty() {
        return None;
    }

    Some(format!(
        "INSERT INTO raydium_swaps (slot, tx_signature, pool, user_owner, amount_in, amount_out) VALUES {}",
        values.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade() -> P1Trade {
        P1Trade {
            mint: [0u8; 32],
            trader: [1u8; 32],
            creator: [2u8; 32],
            sol_amount: 42,
            token_amount: 1337,
            is_buy: true,
            virtual_sol_reserves: 10,
            virtual_token_reserves: 20,
            real_sol_reserves: 30,
            real_token_reserves: 40,
            fee_basis_points: 50,
            fee_lamports: 60,
            creator_fee_basis_points: 70,
            creator_fee_lamports: 80,
            slot: 555,
            timestamp: 123456789,
            signature: "sig1".to_string(),
        }
    }

    #[test]
    fn single_row_insert_contains_expected_values() {
        let sql = build_pumpfun_insert(&[sample_trade()]).unwrap();
        assert!(sql.starts_with("INSERT INTO pumpfun_trades"));
        assert!(sql.contains("555"));
        assert!(sql.contains("'BUY'"));
        assert!(sql.contains("42"));
        assert!(sql.contains("1337"));
        assert!(sql.contains("80"));
    }

    #[test]
    fn multi_row_insert_joins_all_rows() {
        let mut a = sample_trade();
        let mut b = sample_trade();
        a.slot = 1;
        b.slot = 2;
        let sql = build_pumpfun_insert(&[a, b]).unwrap();
        assert_eq!(sql.matches("VALUES").count(), 1);
        assert!(sql.contains("),("));
    }

    #[test]
    fn empty_batch_yields_none() {
        assert!(build_pumpfun_insert(&[]).is_none());
    }

    #[test]
    fn raydium_insert_uses_pool_and_user_owner_columns() {
        let swap = P2Swap {
            amm: [0xAA; 32],
            user_source_owner: [0xBB; 32],
            amount_in: 1000,
            amount_out: 900,
            slot: 777,
            signature: "sig2".to_string(),
        };
        let sql = build_raydium_insert(&[swap]).unwrap();
        assert!(sql.starts_with("INSERT INTO raydium_swaps"));
        assert!(sql.contains("777"));
        assert!(sql.contains("1000"));
        assert!(sql.contains("900"));
    }

    #[test]
    fn quoting_escapes_embedded_quotes() {
        let mut t = sample_trade();
        t.signature = "o'brien".to_string();
        let sql = build_pumpfun_insert(&[t]).unwrap();
        assert!(sql.contains("'o''brien'"));
    }
}
