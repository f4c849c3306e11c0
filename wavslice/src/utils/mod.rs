//! Utility functions and supporting infrastructure.
//!
//! Provides bit-level header reading, CRC validation, little-endian byte
//! serialization, error types and the WAV container writer.

pub mod bitstream_io;
pub mod byteorder;
pub mod crc;
pub mod errors;
pub mod wav;
