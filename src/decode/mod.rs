//! Binary payload decoders: fixed-layout P1 trades, positional-stream P2
//! swaps, and the `"Program data: "` log-line preamble that feeds both.

pub mod cursor;
pub mod p1;
pub mod p2;
pub mod preamble;

pub use cursor::ByteCursor;
