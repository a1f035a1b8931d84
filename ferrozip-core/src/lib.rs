//! # Ferrozip Core
//!
//! Core components for the Ferrozip DEFLATE/ZIP toolkit.
//!
//! This crate provides the fundamental building blocks the codec and
//! container layers are built from:
//!
//! - [`bitstream`]: bit-level I/O for variable-length codes
//! - [`window`]: sliding-window output buffer for LZ77 back-references
//! - [`crc`]: CRC-32 checksum
//! - [`error`]: error types
//!
//! ## Architecture
//!
//! Ferrozip is a layered stack; this crate is the bottom layer:
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ L3: Container                                      │
//! │     ZIP central directory, local headers, entries  │
//! ├────────────────────────────────────────────────────┤
//! │ L2: Codec                                          │
//! │     DEFLATE (canonical Huffman + LZ77)             │
//! ├────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                         │
//! │     BitReader/BitWriter, OutputWindow, CRC-32      │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use ferrozip_core::bitstream::BitReader;
//! use ferrozip_core::crc::Crc32;
//!
//! let data = [0xAB, 0xCD];
//! let mut reader = BitReader::new(&data);
//! let bits = reader.read_bits(12).unwrap();
//! assert_eq!(bits, 0xDAB);
//!
//! let crc = Crc32::compute(b"Hello, World!");
//! assert_eq!(crc, 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod crc;
pub mod error;
pub mod window;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use crc::Crc32;
pub use error::{FerrozipError, Result};
pub use window::OutputWindow;
