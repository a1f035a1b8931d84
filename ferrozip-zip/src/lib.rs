//! # Ferrozip Zip
//!
//! ZIP container reading as specified by PKWARE APPNOTE 6.3.x.
//!
//! This crate is the container layer of the Ferrozip stack: it parses the
//! central directory eagerly, materializes entry data lazily through the
//! DEFLATE codec, and validates structure (local header reconciliation,
//! compressed spans) and integrity (sizes, CRC-32) on every read.
//!
//! Writing archives, encryption, and disk spanning are out of scope;
//! unsupported entries surface errors on read without poisoning the rest
//! of the archive.
//!
//! ## Example
//!
//! ```no_run
//! use ferrozip_zip::open_container;
//!
//! let bytes = std::fs::read("archive.zip").unwrap();
//! let mut archive = open_container(&bytes).unwrap();
//! for index in 0..archive.len() {
//!     let entry = &archive.entries()[index];
//!     if entry.is_directory() {
//!         continue;
//!     }
//!     let name = entry.name().to_owned();
//!     let data = archive.read(index).unwrap();
//!     println!("{}: {} bytes", name, data.len());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod cp437;
pub mod header;

// Re-exports
pub use archive::{FileAttributes, HostSystem, ZipArchive, ZipEntry};
pub use header::{CompressionMethod, DataDescriptor, EndOfCentralDirectory, LocalFileHeader};

use ferrozip_core::error::Result;

/// Parse a ZIP container from fully buffered bytes.
pub fn open_container(data: &[u8]) -> Result<ZipArchive<'_>> {
    ZipArchive::open(data)
}
