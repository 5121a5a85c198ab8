//! Bounds-checked positional reader over a byte slice, grounded in
//! `raydium_parser.c`'s `read_u64`/`read_pubkey` helpers.

use crate::core::error::DecodeError;

pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn need(&self, n: usize) -> Result<(), DecodeError> {
        if self.pos + n > self.buf.len() {
            Err(DecodeError::TooShort {
                need: self.pos + n,
                have: self.buf.len(),
            })
        } else {
            Ok(())
        }
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.need(8)?;
        let bytes: [u8; 8] = self.buf[self.pos..self.pos + 8].try_into().unwrap();
        self.pos += 8;
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.need(1)?;
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    pub fn read_pubkey(&mut self) -> Result<[u8; 32], DecodeError> {
        self.need(32)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.buf[self.pos..self.pos + 32]);
        self.pos += 32;
        Ok(out)
    }

    /// Discards `n` bytes, failing if the buffer underflows.
    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.need(n)?;
        self.pos += n;
        Ok(())
    }
}
