//! Builds the single `SubscribeRequest` sent at the start of each session.

use std::collections::HashMap;

use yellowstone_grpc_proto::geyser::{
    CommitmentLevel, SubscribeRequest, SubscribeRequestFilterTransactions,
};

use crate::classifier::Detector;

/// Commitment PROCESSED, optional `from_slot`, and one "transactions" filter
/// entry named `"transactions"` whose `account_include` lists the base58
/// program ids of every enabled protocol. Callers are responsible for
/// warning when neither protocol is enabled; this function simply yields
/// an empty `account_include` list in that case, matching an unfiltered
/// subscription.
pub fn build_subscribe_request(detector: &Detector, from_slot: Option<u64>) -> SubscribeRequest {
    let mut account_include = Vec::new();
    if detector.p1.enabled {
        account_include.push(bs58::encode(detector.p1.program_id).into_string());
    }
    if detector.p2.enabled {
        account_include.push(bs58::encode(detector.p2.program_id).into_string());
    }

    let mut transactions = HashMap::new();
    transactions.insert(
        "transactions".to_string(),
        SubscribeRequestFilterTransactions {
            vote: Some(false),
            failed: Some(false),
            signature: None,
            account_include,
            account_exclude: Vec::new(),
            account_required: Vec::new(),
        },
    );

    SubscribeRequest {
        accounts: HashMap::new(),
        slots: HashMap::new(),
        transactions,
        transactions_status: HashMap::new(),
        blocks: HashMap::new(),
        blocks_meta: HashMap::new(),
        entry: HashMap::new(),
        commitment: Some(CommitmentLevel::Processed as i32),
        accounts_data_slice: Vec::new(),
        ping: None,
        from_slot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ProtocolPattern;

    fn pattern(byte: u8, enabled: bool) -> ProtocolPattern {
        ProtocolPattern {
            program_id: [byte; 32],
            enabled,
        }
    }

    #[test]
    fn includes_enabled_program_ids_only() {
        let detector = Detector::new(pattern(1, true), pattern(2, false));
        let req = build_subscribe_request(&detector, Some(100));
        let filter = req.transactions.get("transactions").unwrap();
        assert_eq!(filter.account_include.len(), 1);
        assert_eq!(filter.account_include[0], bs58::encode([1u8; 32]).into_string());
        assert_eq!(req.from_slot, Some(100));
    }

    #[test]
    fn includes_both_when_both_enabled() {
        let detector = Detector::new(pattern(1, true), pattern(2, true));
        let req = build_subscribe_request(&detector, None);
        let filter = req.transactions.get("transactions").unwrap();
        assert_eq!(filter.account_include.len(), 2);
        assert_eq!(req.from_slot, None);
    }

    #[test]
    fn empty_account_include_when_nothing_enabled() {
        let detector = Detector::new(pattern(0, false), pattern(0, false));
        let req = build_subscribe_request(&detector, None);
        let filter = req.transactions.get("transactions").unwrap();
        assert!(filter.account_include.is_empty());
    }
}
