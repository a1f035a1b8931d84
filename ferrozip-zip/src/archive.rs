//! ZIP archives and entry materialization.
//!
//! [`ZipArchive::open`] parses the central directory eagerly; entry data is
//! materialized on demand by [`ZipArchive::read`], which locates the local
//! header, reconciles it against the central directory, dispatches on the
//! compression method, and validates sizes and CRC-32.

use crate::header::{
    CentralDirectoryEntry, CompressionMethod, DataDescriptor, EndOfCentralDirectory,
    FLAG_DATA_DESCRIPTOR, FLAG_ENCRYPTED, LocalFileHeader,
};
use ferrozip_core::error::{FerrozipError, Result};
use ferrozip_core::{BitReader, Crc32};
use ferrozip_deflate::Inflater;

/// Host system that produced an entry (high byte of `version_made_by`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSystem {
    /// MS-DOS and OS/2 (FAT attribute byte).
    MsDos,
    /// UNIX (mode bits in the high 16 attribute bits).
    Unix,
    /// Any other host id.
    Other(u8),
}

impl HostSystem {
    fn from_version_made_by(version_made_by: u16) -> Self {
        match (version_made_by >> 8) as u8 {
            0 => Self::MsDos,
            3 => Self::Unix,
            other => Self::Other(other),
        }
    }
}

/// Decoded external file attributes.
///
/// Both interpretations are always derivable from the raw bits; which one
/// is populated follows the entry's declared host system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileAttributes {
    /// UNIX mode bits (high 16 bits of the external attributes).
    pub unix_mode: Option<u32>,
    /// DOS attribute byte (low 8 bits of the external attributes).
    pub dos_attributes: Option<u8>,
}

/// DOS directory attribute bit.
const DOS_ATTR_DIRECTORY: u32 = 0x10;

/// One entry of a ZIP archive.
///
/// Pure accessors read the eagerly parsed central directory record; the
/// local header is parsed on first data access and cached here.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    cdir: CentralDirectoryEntry,
    local: Option<LocalFileHeader>,
}

impl ZipEntry {
    /// Entry name (path within the archive).
    pub fn name(&self) -> &str {
        &self.cdir.name
    }

    /// Entry comment; empty for most entries.
    pub fn comment(&self) -> &str {
        &self.cdir.comment
    }

    /// Uncompressed size in bytes.
    pub fn size(&self) -> u64 {
        self.cdir.uncomp_size
    }

    /// Compressed size in bytes.
    pub fn compressed_size(&self) -> u64 {
        self.cdir.comp_size
    }

    /// Declared CRC-32 of the uncompressed data.
    pub fn crc32(&self) -> u32 {
        self.cdir.crc32
    }

    /// The entry's compression method.
    pub fn compression_method(&self) -> CompressionMethod {
        CompressionMethod::from_id(self.cdir.method)
    }

    /// Host system that produced the entry.
    pub fn host_system(&self) -> HostSystem {
        HostSystem::from_version_made_by(self.cdir.version_made_by)
    }

    /// Raw external file attributes.
    pub fn external_attributes(&self) -> u32 {
        self.cdir.external_attributes
    }

    /// Last modification time in the DOS bit layout.
    pub fn last_mod_time(&self) -> u16 {
        self.cdir.last_mod_time
    }

    /// Last modification date in the DOS bit layout.
    pub fn last_mod_date(&self) -> u16 {
        self.cdir.last_mod_date
    }

    /// Whether the entry is a directory.
    ///
    /// MS-DOS and UNIX hosts store the DOS directory bit in the external
    /// attributes; for other hosts the entry is a directory when it has no
    /// data and its name ends with `/`.
    pub fn is_directory(&self) -> bool {
        match self.host_system() {
            HostSystem::MsDos | HostSystem::Unix => {
                self.cdir.external_attributes & DOS_ATTR_DIRECTORY != 0
            }
            HostSystem::Other(_) => self.cdir.uncomp_size == 0 && self.cdir.name.ends_with('/'),
        }
    }

    /// External attributes decoded per the entry's host system.
    pub fn attributes(&self) -> FileAttributes {
        let unix_mode = self.cdir.external_attributes >> 16;
        let dos_attributes = (self.cdir.external_attributes & 0xFF) as u8;
        match self.host_system() {
            HostSystem::Unix => FileAttributes {
                unix_mode: Some(unix_mode),
                dos_attributes: None,
            },
            HostSystem::MsDos => FileAttributes {
                unix_mode: None,
                dos_attributes: Some(dos_attributes),
            },
            HostSystem::Other(_) => FileAttributes::default(),
        }
    }
}

/// A read-only ZIP archive over a caller-owned byte slice.
///
/// The slice is immutable and may be shared; to extract entries in
/// parallel, open an independent `ZipArchive` per worker over the same
/// bytes. Within one archive, [`ZipArchive::read`] takes `&mut self`, so
/// only one entry materializes at a time.
#[derive(Debug)]
pub struct ZipArchive<'a> {
    data: &'a [u8],
    entries: Vec<ZipEntry>,
}

impl<'a> ZipArchive<'a> {
    /// Parse the central directory of a ZIP archive.
    ///
    /// An entry with an unsupported compression method does not fail the
    /// open; only reading that entry does.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let eocd = EndOfCentralDirectory::find(data)?;

        let mut reader = BitReader::new(data);
        reader.seek(eocd.cd_offset)?;

        let mut entries = Vec::with_capacity(eocd.total_entries.min(4096) as usize);
        for _ in 0..eocd.total_entries {
            let cdir = CentralDirectoryEntry::read(&mut reader)?;
            entries.push(ZipEntry { cdir, local: None });
        }

        Ok(Self { data, entries })
    }

    /// The parsed entries, in central directory order.
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry by name.
    pub fn entry_by_name(&self, name: &str) -> Option<(usize, &ZipEntry)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.name() == name)
    }

    /// Materialize the data of entry `index`.
    ///
    /// Locates and (once) parses the local header, verifies it against the
    /// central directory, decompresses per the entry's method, consumes a
    /// trailing data descriptor when one is declared, and validates the
    /// compressed span, the decoded length, and the CRC-32.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn read(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = &mut self.entries[index];
        let mut reader = BitReader::new(self.data);

        if entry.local.is_none() {
            reader.seek(entry.cdir.local_header_offset)?;
            let local = LocalFileHeader::read(&mut reader)?;
            reconcile(&entry.cdir, &local)?;
            entry.local = Some(local);
        }
        let local = entry.local.as_ref().expect("local header cached above");
        reader.seek(local.data_start)?;

        if entry.cdir.flags & FLAG_ENCRYPTED != 0 {
            return Err(FerrozipError::unsupported_feature("encryption"));
        }

        // With a data descriptor the local header's CRC and sizes are
        // zero; the central directory carries the real values.
        let has_descriptor = entry.cdir.flags & FLAG_DATA_DESCRIPTOR != 0;
        let (declared_comp, declared_uncomp, declared_crc) = if has_descriptor {
            (entry.cdir.comp_size, entry.cdir.uncomp_size, entry.cdir.crc32)
        } else {
            (local.comp_size, local.uncomp_size, local.crc32)
        };

        let data_start = reader.byte_position();
        let decoded = match CompressionMethod::from_id(entry.cdir.method) {
            CompressionMethod::Stored => {
                let mut buf = vec![0u8; declared_uncomp as usize];
                reader.read_bytes(&mut buf)?;
                buf
            }
            CompressionMethod::Deflate => {
                let out = Inflater::new().inflate(&mut reader)?;
                reader.align_to_byte();
                out
            }
            // BZip2 and LZMA decoding belongs to external codecs; without
            // one wired in, the method is unsupported here.
            CompressionMethod::Bzip2
            | CompressionMethod::Lzma
            | CompressionMethod::Unknown(_) => {
                return Err(FerrozipError::compression_not_supported(entry.cdir.method));
            }
        };
        let real_comp_size = reader.byte_position() - data_start;

        if has_descriptor {
            // Consumed so the cursor lands after the entry; field widths
            // per APPNOTE §4.3.9 follow the entry's zip64 form.
            let _descriptor = DataDescriptor::read(&mut reader, local.zip64)?;
        }

        if declared_comp != real_comp_size {
            return Err(FerrozipError::wrong_size(declared_comp, real_comp_size));
        }
        if declared_uncomp != decoded.len() as u64 {
            return Err(FerrozipError::wrong_size(
                declared_uncomp,
                decoded.len() as u64,
            ));
        }

        let computed = Crc32::compute(&decoded);
        if computed != declared_crc {
            return Err(FerrozipError::wrong_crc32(declared_crc, computed, decoded));
        }

        Ok(decoded)
    }
}

/// Verify that the local header echoes the central directory.
///
/// The four reconciliation fields must match exactly; a mismatch is fatal
/// to the entry.
fn reconcile(cdir: &CentralDirectoryEntry, local: &LocalFileHeader) -> Result<()> {
    if cdir.flags != local.flags {
        return Err(FerrozipError::wrong_local_header("general purpose flags"));
    }
    if cdir.method != local.method {
        return Err(FerrozipError::wrong_local_header("compression method"));
    }
    if cdir.last_mod_time != local.last_mod_time {
        return Err(FerrozipError::wrong_local_header("modification time"));
    }
    if cdir.last_mod_date != local.last_mod_date {
        return Err(FerrozipError::wrong_local_header("modification date"));
    }
    Ok(())
}
