use adler::Adler32;
use digest::Digest;
use thiserror::Error;

/// Raised when an accumulator refuses a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{algorithm}: cannot absorb chunk: {reason}")]
pub struct AbsorbFault {
    pub algorithm: &'static str,
    pub reason: String,
}

/// One incremental digest fed by the fan-out sink.
///
/// Writes are split in two phases so a chunk is either applied to every
/// accumulator or to none: `admit` may refuse, `absorb` may not.
pub trait Accumulator: Send {
    /// Check that `data` can be absorbed. Accepts everything by default.
    fn admit(&self, _data: &[u8]) -> Result<(), AbsorbFault> {
        Ok(())
    }

    fn absorb(&mut self, data: &[u8]);

    /// Digest of everything absorbed so far. Does not disturb the state.
    fn finalize(&self) -> Vec<u8>;
}

/// Any RustCrypto hash (`md-5`, `sha1`, `sha2`, `sha3`, `ripemd`).
#[derive(Clone, Default)]
pub struct DigestAccumulator<D>(D);

impl<D: Digest> DigestAccumulator<D> {
    pub fn new() -> Self {
        Self(D::new())
    }
}

impl<D: Digest + Clone + Send> Accumulator for DigestAccumulator<D> {
    #[inline]
    fn absorb(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(&self) -> Vec<u8> {
        self.0.clone().finalize().to_vec()
    }
}

/// CRC-32 with the IEEE polynomial.
#[derive(Clone, Default)]
pub struct Crc32Accumulator(crc32fast::Hasher);

impl Crc32Accumulator {
    pub fn new() -> Self {
        Self(crc32fast::Hasher::new())
    }
}

impl Accumulator for Crc32Accumulator {
    #[inline]
    fn absorb(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(&self) -> Vec<u8> {
        self.0.clone().finalize().to_be_bytes().to_vec()
    }
}

#[derive(Clone, Default)]
pub struct Adler32Accumulator(Adler32);

impl Adler32Accumulator {
    pub fn new() -> Self {
        Self(Adler32::new())
    }
}

impl Accumulator for Adler32Accumulator {
    #[inline]
    fn absorb(&mut self, data: &[u8]) {
        self.0.write_slice(data);
    }

    fn finalize(&self) -> Vec<u8> {
        self.0.checksum().to_be_bytes().to_vec()
    }
}

/// Total number of bytes seen, optionally capped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteCounter {
    count: u64,
    limit: Option<u64>,
}

impl ByteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter that refuses any chunk pushing the total past `limit`.
    pub fn with_limit(limit: u64) -> Self {
        Self {
            count: 0,
            limit: Some(limit),
        }
    }

    #[cfg(test)]
    pub(crate) fn starting_at(count: u64, limit: Option<u64>) -> Self {
        Self { count, limit }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }
}

impl Accumulator for ByteCounter {
    fn admit(&self, data: &[u8]) -> Result<(), AbsorbFault> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        match self.count.checked_add(data.len() as u64) {
            Some(total) if total <= limit => Ok(()),
            _ => Err(AbsorbFault {
                algorithm: "size",
                reason: format!("input exceeds limit of {} bytes", limit),
            }),
        }
    }

    #[inline]
    fn absorb(&mut self, data: &[u8]) {
        self.count = self.count.wrapping_add(data.len() as u64);
    }

    fn finalize(&self) -> Vec<u8> {
        self.count.to_be_bytes().to_vec()
    }
}
