//! Protocol classifier: matches a transaction's account-key list against
//! the two configured program identifiers.
//!
//! Grounded in `protocol_detector.c`: a linear scan that checks P1 before
//! P2 for each account key, capped at a worst-case account count so a
//! pathological transaction cannot force unbounded work.

/// Scanning stops after this many account keys regardless of list length.
pub const MAX_ACCOUNTS_SCANNED: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolPattern {
    pub program_id: [u8; 32],
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    P1,
    P2,
}

pub struct Detector {
    pub p1: ProtocolPattern,
    pub p2: ProtocolPattern,
}

impl Detector {
    pub fn new(p1: ProtocolPattern, p2: ProtocolPattern) -> Self {
        Self { p1, p2 }
    }

    /// Returns the first protocol whose enabled pattern matches a 32-byte
    /// account key in `accounts`, scanning at most [`MAX_ACCOUNTS_SCANNED`]
    /// keys. Keys with a length other than 32 are skipped. P1 is checked
    /// before P2 for each key.
    pub fn classify(&self, accounts: &[&[u8]]) -> Option<Protocol> {
        for key in accounts.iter().take(MAX_ACCOUNTS_SCANNED) {
            if key.len() != 32 {
                continue;
            }
            if self.p1.enabled && *key == self.p1.program_id {
                return Some(Protocol::P1);
            }
            if self.p2.enabled && *key == self.p2.program_id {
                return Some(Protocol::P2);
            }
        }
        None
    }
}

/// Returns true iff `pattern.program_id` appears as a contiguous 32-byte
/// substring of `buf`. Exposed for callers matching within concatenated
/// account blobs; not invoked by the subscription worker's hot path, which
/// works from the already-parsed account-key list instead.
pub fn match_program_in_bytes(pattern: &ProtocolPattern, buf: &[u8]) -> bool {
    pattern.enabled && buf.windows(32).any(|w| w == pattern.program_id)
}
