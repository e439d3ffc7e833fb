use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::Path;

use md5::Md5;
use ripemd::Ripemd160;
use serde::Serialize;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use sha3::Keccak256;
use thiserror::Error;

use super::accumulator::{
    AbsorbFault, Accumulator, Adler32Accumulator, ByteCounter, Crc32Accumulator,
    DigestAccumulator,
};
use crate::common::io::open_noatime;

/// Read buffer size, same as GNU checksum tools.
pub const BUF_SIZE: usize = 256 * 1024;

/// Key of the byte count in a [`Snapshot`].
pub const SIZE_KEY: &str = "size";

#[derive(Debug, Error)]
pub enum MultiDigestError {
    #[error(transparent)]
    Absorb(#[from] AbsorbFault),

    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for MultiDigestError {
    fn from(e: io::Error) -> Self {
        // Faults raised through `Sink` come back wrapped in an io::Error.
        match e.get_ref().and_then(|inner| inner.downcast_ref::<AbsorbFault>()) {
            Some(fault) => MultiDigestError::Absorb(fault.clone()),
            None => MultiDigestError::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, MultiDigestError>;

/// Algorithms computed by every [`MultiDigest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Algorithm {
    Adler32,
    Crc32,
    Md5,
    Ripemd160,
    Sha1,
    Sha256,
    Sha512,
    /// Keccak-256 (pre-standard padding), keyed as `sha3-256`.
    Sha3_256,
}

impl Algorithm {
    pub const ALL: [Algorithm; 8] = [
        Algorithm::Adler32,
        Algorithm::Crc32,
        Algorithm::Md5,
        Algorithm::Ripemd160,
        Algorithm::Sha1,
        Algorithm::Sha256,
        Algorithm::Sha512,
        Algorithm::Sha3_256,
    ];

    /// Key used in the snapshot.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Adler32 => "adler32",
            Algorithm::Crc32 => "crc32",
            Algorithm::Md5 => "md5",
            Algorithm::Ripemd160 => "ripemd160",
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha256 => "sha2-256",
            Algorithm::Sha512 => "sha2-512",
            Algorithm::Sha3_256 => "sha3-256",
        }
    }

    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            Algorithm::Adler32 | Algorithm::Crc32 => 4,
            Algorithm::Md5 => 16,
            Algorithm::Ripemd160 | Algorithm::Sha1 => 20,
            Algorithm::Sha256 | Algorithm::Sha3_256 => 32,
            Algorithm::Sha512 => 64,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

/// Computes every [`Algorithm`] plus the byte count over one stream.
pub struct MultiDigest {
    adler32: Adler32Accumulator,
    crc32: Crc32Accumulator,
    md5: DigestAccumulator<Md5>,
    ripemd160: DigestAccumulator<Ripemd160>,
    sha1: DigestAccumulator<Sha1>,
    sha256: DigestAccumulator<Sha256>,
    sha512: DigestAccumulator<Sha512>,
    sha3_256: DigestAccumulator<Keccak256>,
    size: ByteCounter,
    fault: Option<AbsorbFault>,
}

impl Default for MultiDigest {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiDigest {
    pub fn new() -> Self {
        Self::with_counter(ByteCounter::new())
    }

    /// Refuse input once more than `max_bytes` have been written.
    pub fn with_limit(max_bytes: u64) -> Self {
        Self::with_counter(ByteCounter::with_limit(max_bytes))
    }

    fn with_counter(size: ByteCounter) -> Self {
        Self {
            adler32: Adler32Accumulator::new(),
            crc32: Crc32Accumulator::new(),
            md5: DigestAccumulator::new(),
            ripemd160: DigestAccumulator::new(),
            sha1: DigestAccumulator::new(),
            sha256: DigestAccumulator::new(),
            sha512: DigestAccumulator::new(),
            sha3_256: DigestAccumulator::new(),
            size,
            fault: None,
        }
    }

    fn accumulator(&self, algo: Algorithm) -> &dyn Accumulator {
        match algo {
            Algorithm::Adler32 => &self.adler32,
            Algorithm::Crc32 => &self.crc32,
            Algorithm::Md5 => &self.md5,
            Algorithm::Ripemd160 => &self.ripemd160,
            Algorithm::Sha1 => &self.sha1,
            Algorithm::Sha256 => &self.sha256,
            Algorithm::Sha512 => &self.sha512,
            Algorithm::Sha3_256 => &self.sha3_256,
        }
    }

    fn accumulator_mut(&mut self, algo: Algorithm) -> &mut dyn Accumulator {
        match algo {
            Algorithm::Adler32 => &mut self.adler32,
            Algorithm::Crc32 => &mut self.crc32,
            Algorithm::Md5 => &mut self.md5,
            Algorithm::Ripemd160 => &mut self.ripemd160,
            Algorithm::Sha1 => &mut self.sha1,
            Algorithm::Sha256 => &mut self.sha256,
            Algorithm::Sha512 => &mut self.sha512,
            Algorithm::Sha3_256 => &mut self.sha3_256,
        }
    }

    /// Feed one chunk to every accumulator and the byte counter.
    ///
    /// Either every accumulator absorbs the chunk or none does. Once a chunk
    /// has been refused the instance keeps refusing and should be dropped.
    pub fn update(&mut self, data: &[u8]) -> std::result::Result<(), AbsorbFault> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }

        let admitted = Algorithm::ALL
            .into_iter()
            .try_for_each(|algo| self.accumulator(algo).admit(data))
            .and_then(|()| self.size.admit(data));
        if let Err(fault) = admitted {
            log::debug!("refusing {} byte chunk: {}", data.len(), fault);
            self.fault = Some(fault.clone());
            return Err(fault);
        }

        for algo in Algorithm::ALL {
            self.accumulator_mut(algo).absorb(data);
        }
        self.size.absorb(data);
        log::trace!("absorbed {} bytes ({} total)", data.len(), self.size.count());
        Ok(())
    }

    /// Writer that fans every chunk out to this instance.
    pub fn sink(&mut self) -> Sink<'_> {
        Sink { inner: self }
    }

    /// Bytes absorbed so far.
    pub fn size(&self) -> u64 {
        self.size.count()
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    /// Result for the data absorbed so far, leaving the instance usable.
    pub fn snapshot(&self) -> Snapshot {
        let mut digests = BTreeMap::new();
        for algo in Algorithm::ALL {
            let digest = self.accumulator(algo).finalize();
            digests.insert(algo.name().to_string(), hex::encode(digest));
        }
        digests.insert(SIZE_KEY.to_string(), self.size.count().to_string());
        Snapshot(digests)
    }

    pub fn finalize(self) -> Snapshot {
        let snapshot = self.snapshot();
        log::debug!("finalized {} bytes", self.size.count());
        snapshot
    }
}

/// `io::Write` view of a [`MultiDigest`].
pub struct Sink<'a> {
    inner: &'a mut MultiDigest,
}

impl Write for Sink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.update(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Algorithm name to lowercase hex digest, plus `size` in decimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, String>);

impl Snapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn digest(&self, algo: Algorithm) -> &str {
        self.get(algo.name()).unwrap_or_default()
    }

    pub fn size(&self) -> &str {
        self.get(SIZE_KEY).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }

    /// Two-space indented JSON object with sorted keys.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Stream `reader` into `multi` in [`BUF_SIZE`] chunks.
/// Returns the number of bytes read.
pub fn digest_reader_with<R: Read>(multi: &mut MultiDigest, mut reader: R) -> Result<u64> {
    let mut buf = vec![0u8; BUF_SIZE];
    let mut sink = multi.sink();
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(MultiDigestError::Io(e)),
        };
        sink.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}

pub fn digest_reader<R: Read>(reader: R) -> Result<Snapshot> {
    let mut multi = MultiDigest::new();
    digest_reader_with(&mut multi, reader)?;
    Ok(multi.finalize())
}

/// Digest a file by path.
pub fn digest_file(path: &Path) -> Result<Snapshot> {
    let mut multi = MultiDigest::new();
    digest_file_with(&mut multi, path)?;
    Ok(multi.finalize())
}

pub fn digest_file_with(multi: &mut MultiDigest, path: &Path) -> Result<u64> {
    log::debug!("digesting {}", path.display());
    let file = open_noatime(path)?;
    digest_reader_with(multi, file)
}

pub fn digest_stdin() -> Result<Snapshot> {
    digest_reader(io::stdin().lock())
}

/// Digest an in-memory buffer as a single chunk.
pub fn digest_bytes(data: &[u8]) -> Result<Snapshot> {
    let mut multi = MultiDigest::new();
    multi.update(data)?;
    Ok(multi.finalize())
}
