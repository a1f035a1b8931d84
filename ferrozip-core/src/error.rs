//! Error types for Ferrozip operations.
//!
//! One error enum covers every failure class of the codec and container
//! layers: structural archive errors, Huffman/DEFLATE stream errors, and
//! integrity-check failures.

use thiserror::Error;

/// The main error type for Ferrozip operations.
#[derive(Debug, Error)]
pub enum FerrozipError {
    /// Ran out of bytes before a structural requirement was met.
    #[error("Truncated archive: expected {needed} more bytes")]
    TruncatedArchive {
        /// Number of bytes that were expected but not available.
        needed: usize,
    },

    /// Expected magic number not found.
    #[error("Bad signature: expected {expected:#010x}, found {found:#010x}")]
    BadSignature {
        /// Expected signature value.
        expected: u32,
        /// Signature value actually read.
        found: u32,
    },

    /// Central directory and local file header disagree.
    #[error("Local header disagrees with central directory on {field}")]
    WrongLocalHeader {
        /// Name of the mismatching field.
        field: &'static str,
    },

    /// Declared and observed sizes disagree.
    #[error("Size mismatch: declared {declared}, observed {observed}")]
    WrongSize {
        /// Size declared by the archive metadata.
        declared: u64,
        /// Size actually observed during extraction.
        observed: u64,
    },

    /// CRC-32 checksum mismatch. The decoded bytes are surfaced so callers
    /// can inspect or salvage them.
    #[error("CRC-32 mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    WrongCrc32 {
        /// CRC declared by the archive.
        expected: u32,
        /// CRC computed over the decoded bytes.
        computed: u32,
        /// The decoded bytes that failed the check.
        data: Vec<u8>,
    },

    /// Compression method id outside the implemented set.
    #[error("Compression method {method} is not supported")]
    CompressionNotSupported {
        /// The method id from the archive.
        method: u16,
    },

    /// Code lengths cannot form a canonical prefix code, a decoded prefix
    /// has no assigned symbol, or a symbol without a code was encoded.
    #[error("Malformed Huffman code: {detail}")]
    HuffmanMalformed {
        /// Description of the defect.
        detail: String,
    },

    /// Reserved block type, bad LEN/NLEN, distance out of range, or a bad
    /// run-length in a dynamic block header.
    #[error("Malformed DEFLATE stream: {detail}")]
    DeflateMalformed {
        /// Description of the defect.
        detail: String,
    },

    /// Encryption, disk spanning, or an unsupported zip64 variant.
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature {
        /// Name of the unsupported feature.
        feature: String,
    },
}

/// Result type alias for Ferrozip operations.
pub type Result<T> = std::result::Result<T, FerrozipError>;

impl FerrozipError {
    /// Create a truncated archive error.
    pub fn truncated(needed: usize) -> Self {
        Self::TruncatedArchive { needed }
    }

    /// Create a bad signature error.
    pub fn bad_signature(expected: u32, found: u32) -> Self {
        Self::BadSignature { expected, found }
    }

    /// Create a local header mismatch error.
    pub fn wrong_local_header(field: &'static str) -> Self {
        Self::WrongLocalHeader { field }
    }

    /// Create a size mismatch error.
    pub fn wrong_size(declared: u64, observed: u64) -> Self {
        Self::WrongSize { declared, observed }
    }

    /// Create a CRC mismatch error carrying the decoded bytes.
    pub fn wrong_crc32(expected: u32, computed: u32, data: Vec<u8>) -> Self {
        Self::WrongCrc32 {
            expected,
            computed,
            data,
        }
    }

    /// Create an unsupported compression method error.
    pub fn compression_not_supported(method: u16) -> Self {
        Self::CompressionNotSupported { method }
    }

    /// Create a malformed Huffman code error.
    pub fn huffman_malformed(detail: impl Into<String>) -> Self {
        Self::HuffmanMalformed {
            detail: detail.into(),
        }
    }

    /// Create a malformed DEFLATE stream error.
    pub fn deflate_malformed(detail: impl Into<String>) -> Self {
        Self::DeflateMalformed {
            detail: detail.into(),
        }
    }

    /// Create an unsupported feature error.
    pub fn unsupported_feature(feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            feature: feature.into(),
        }
    }
}
