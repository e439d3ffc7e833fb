#![allow(clippy::len_without_is_empty)]

//! Single-pass multi-algorithm digests.
//!
//! [`multidigest::MultiDigest`] forwards every chunk written to its sink to
//! Adler-32, CRC-32, MD5, RIPEMD-160, SHA-1, SHA-256, SHA-512 and Keccak-256
//! accumulators plus a byte counter, so input is read once no matter how many
//! digests are wanted.
//!
//! ```
//! use std::io::Write;
//! use multidigest_rs::multidigest::MultiDigest;
//!
//! let mut multi = MultiDigest::new();
//! multi.sink().write_all(b"abc").unwrap();
//! let snapshot = multi.finalize();
//! assert_eq!(snapshot.get("md5"), Some("900150983cd24fb0d6963f7d28e17f72"));
//! assert_eq!(snapshot.size(), "3");
//! ```

/// Use mimalloc as the global allocator for all binaries.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod common;
pub mod multidigest;
