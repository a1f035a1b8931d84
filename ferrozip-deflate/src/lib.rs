//! # Ferrozip Deflate
//!
//! Pure Rust DEFLATE decoder (RFC 1951) and canonical Huffman coding.
//!
//! This crate provides the codec layer of the Ferrozip stack:
//!
//! - **Decompression**: all three DEFLATE block types
//!   - Stored (uncompressed) blocks
//!   - Fixed Huffman codes
//!   - Dynamic Huffman codes
//! - **Canonical Huffman coding**: construction from code lengths with
//!   DEFLATE wire-order (bit-reversed) packing, an encoder for emitting
//!   codes and costing symbol statistics, and a table-driven decoder
//!
//! ## Example
//!
//! ```rust
//! use ferrozip_deflate::inflate;
//!
//! // A stored DEFLATE block holding "Hello"
//! let compressed = [0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o'];
//! let decompressed = inflate(&compressed).unwrap();
//! assert_eq!(decompressed, b"Hello");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod huffman;
pub mod inflate;
pub mod tables;

// Re-exports
pub use huffman::{HuffmanCode, HuffmanEncoder, HuffmanTree, reverse_bits};
pub use inflate::{Inflater, inflate};
