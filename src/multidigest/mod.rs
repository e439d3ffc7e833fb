mod accumulator;
mod core;


pub use self::accumulator::{
    AbsorbFault, Accumulator, Adler32Accumulator, ByteCounter, Crc32Accumulator,
    DigestAccumulator,
};
pub use self::core::*;
