//! ZIP wire records (PKWARE APPNOTE 6.3.x).
//!
//! Everything here is a bit-exact view of the on-disk structures: the
//! central directory file header, the local file header, the data
//! descriptor, and the end-of-central-directory records with their zip64
//! extensions. All multi-byte integers are little-endian.

use crate::cp437;
use ferrozip_core::BitReader;
use ferrozip_core::error::{FerrozipError, Result};

/// ZIP local file header signature.
pub const LOCAL_FILE_HEADER_SIG: u32 = 0x04034B50;

/// ZIP central directory header signature.
pub const CENTRAL_DIR_HEADER_SIG: u32 = 0x02014B50;

/// ZIP end of central directory signature.
pub const END_OF_CENTRAL_DIR_SIG: u32 = 0x06054B50;

/// ZIP64 end of central directory signature.
pub const ZIP64_END_OF_CENTRAL_DIR_SIG: u32 = 0x06064B50;

/// ZIP64 end of central directory locator signature.
pub const ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIG: u32 = 0x07064B50;

/// Data descriptor signature (optional, PK\x07\x08).
pub const DATA_DESCRIPTOR_SIG: u32 = 0x08074B50;

/// ZIP64 extended information extra field header ID.
pub const ZIP64_EXTRA_FIELD_ID: u16 = 0x0001;

/// Marker value escaping a 32-bit field to the zip64 extra.
pub const ZIP64_MARKER_32: u32 = 0xFFFF_FFFF;

/// Marker value escaping a 16-bit field to the zip64 record.
pub const ZIP64_MARKER_16: u16 = 0xFFFF;

/// Flag bit 0: the entry is encrypted.
pub const FLAG_ENCRYPTED: u16 = 0x0001;

/// Flag bit 3: CRC and sizes live in a trailing data descriptor.
pub const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// Flag bit 11: name and comment are UTF-8 rather than CP437.
pub const FLAG_UTF8: u16 = 0x0800;

/// ZIP compression methods this crate dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Stored (no compression).
    Stored,
    /// DEFLATE compression.
    Deflate,
    /// BZip2 compression (recognized, delegated out of this crate).
    Bzip2,
    /// LZMA compression (recognized, delegated out of this crate).
    Lzma,
    /// Any other method id.
    Unknown(u16),
}

impl CompressionMethod {
    /// Map an APPNOTE method id.
    pub fn from_id(id: u16) -> Self {
        match id {
            0 => Self::Stored,
            8 => Self::Deflate,
            12 => Self::Bzip2,
            14 => Self::Lzma,
            other => Self::Unknown(other),
        }
    }

    /// The APPNOTE method id.
    pub fn id(&self) -> u16 {
        match *self {
            Self::Stored => 0,
            Self::Deflate => 8,
            Self::Bzip2 => 12,
            Self::Lzma => 14,
            Self::Unknown(id) => id,
        }
    }
}

/// Decode an entry name or comment per the UTF-8 flag bit.
fn decode_text(bytes: &[u8], flags: u16) -> String {
    if flags & FLAG_UTF8 != 0 {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        cp437::decode(bytes)
    }
}

/// Read the expected signature or fail with `BadSignature`.
fn expect_signature(reader: &mut BitReader<'_>, expected: u32) -> Result<()> {
    let found = reader.read_u32_le()?;
    if found != expected {
        return Err(FerrozipError::bad_signature(expected, found));
    }
    Ok(())
}

/// Widened zip64 values found in an extended information extra field.
#[derive(Debug, Clone, Copy, Default)]
struct Zip64Extra {
    uncomp_size: Option<u64>,
    comp_size: Option<u64>,
    local_header_offset: Option<u64>,
}

/// Walk an extra-field blob for the zip64 record.
///
/// Each 64-bit value is present only when the corresponding 32-bit header
/// field carries the `0xFFFFFFFF` marker, in APPNOTE order: uncompressed
/// size, compressed size, local header offset.
fn parse_zip64_extra(
    extra: &[u8],
    uncomp_size: u32,
    comp_size: u32,
    local_header_offset: u32,
) -> Zip64Extra {
    let mut result = Zip64Extra::default();

    let mut offset = 0;
    while offset + 4 <= extra.len() {
        let header_id = u16::from_le_bytes([extra[offset], extra[offset + 1]]);
        let data_size = u16::from_le_bytes([extra[offset + 2], extra[offset + 3]]) as usize;
        offset += 4;

        if header_id != ZIP64_EXTRA_FIELD_ID || offset + data_size > extra.len() {
            offset += data_size;
            continue;
        }

        let mut field = offset;
        let end = offset + data_size;
        let mut take = |wanted: bool| -> Option<u64> {
            if wanted && field + 8 <= end {
                let value = u64::from_le_bytes(extra[field..field + 8].try_into().unwrap());
                field += 8;
                Some(value)
            } else {
                None
            }
        };

        result.uncomp_size = take(uncomp_size == ZIP64_MARKER_32);
        result.comp_size = take(comp_size == ZIP64_MARKER_32);
        result.local_header_offset = take(local_header_offset == ZIP64_MARKER_32);
        break;
    }

    result
}

/// A central directory file header, lifted bit-exact from disk.
#[derive(Debug, Clone)]
pub struct CentralDirectoryEntry {
    /// Version made by (host system in the high byte).
    pub version_made_by: u16,
    /// Minimum version needed to extract.
    pub version_needed: u16,
    /// General purpose bit flags.
    pub flags: u16,
    /// Compression method id.
    pub method: u16,
    /// Last modification time (DOS bit layout).
    pub last_mod_time: u16,
    /// Last modification date (DOS bit layout).
    pub last_mod_date: u16,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compressed size, widened through the zip64 extra when marked.
    pub comp_size: u64,
    /// Uncompressed size, widened through the zip64 extra when marked.
    pub uncomp_size: u64,
    /// Disk number where the entry starts.
    pub disk_number_start: u16,
    /// Internal file attributes.
    pub internal_attributes: u16,
    /// External file attributes (host-specific bit layout).
    pub external_attributes: u32,
    /// Offset of the local header, widened through the zip64 extra.
    pub local_header_offset: u64,
    /// Entry name decoded per the UTF-8 flag.
    pub name: String,
    /// Entry comment decoded per the UTF-8 flag.
    pub comment: String,
}

impl CentralDirectoryEntry {
    /// Parse one central directory record at the reader's position.
    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        expect_signature(reader, CENTRAL_DIR_HEADER_SIG)?;

        let version_made_by = reader.read_u16_le()?;
        let version_needed = reader.read_u16_le()?;
        let flags = reader.read_u16_le()?;
        let method = reader.read_u16_le()?;
        let last_mod_time = reader.read_u16_le()?;
        let last_mod_date = reader.read_u16_le()?;
        let crc32 = reader.read_u32_le()?;
        let comp_size_32 = reader.read_u32_le()?;
        let uncomp_size_32 = reader.read_u32_le()?;
        let name_len = reader.read_u16_le()? as usize;
        let extra_len = reader.read_u16_le()? as usize;
        let comment_len = reader.read_u16_le()? as usize;
        let disk_number_start = reader.read_u16_le()?;
        let internal_attributes = reader.read_u16_le()?;
        let external_attributes = reader.read_u32_le()?;
        let local_header_offset_32 = reader.read_u32_le()?;

        let mut name_bytes = vec![0u8; name_len];
        reader.read_bytes(&mut name_bytes)?;
        let mut extra = vec![0u8; extra_len];
        reader.read_bytes(&mut extra)?;
        let mut comment_bytes = vec![0u8; comment_len];
        reader.read_bytes(&mut comment_bytes)?;

        let zip64 = parse_zip64_extra(
            &extra,
            uncomp_size_32,
            comp_size_32,
            local_header_offset_32,
        );

        Ok(Self {
            version_made_by,
            version_needed,
            flags,
            method,
            last_mod_time,
            last_mod_date,
            crc32,
            comp_size: zip64.comp_size.unwrap_or(comp_size_32 as u64),
            uncomp_size: zip64.uncomp_size.unwrap_or(uncomp_size_32 as u64),
            disk_number_start,
            internal_attributes,
            external_attributes,
            local_header_offset: zip64
                .local_header_offset
                .unwrap_or(local_header_offset_32 as u64),
            name: decode_text(&name_bytes, flags),
            comment: decode_text(&comment_bytes, flags),
        })
    }
}

/// A local file header, parsed lazily at first data access.
#[derive(Debug, Clone)]
pub struct LocalFileHeader {
    /// Minimum version needed to extract.
    pub version_needed: u16,
    /// General purpose bit flags.
    pub flags: u16,
    /// Compression method id.
    pub method: u16,
    /// Last modification time (DOS bit layout).
    pub last_mod_time: u16,
    /// Last modification date (DOS bit layout).
    pub last_mod_date: u16,
    /// CRC-32; zero when a data descriptor carries the real value.
    pub crc32: u32,
    /// Compressed size, widened through the zip64 extra when marked.
    pub comp_size: u64,
    /// Uncompressed size, widened through the zip64 extra when marked.
    pub uncomp_size: u64,
    /// Whether a zip64 extended information field was present.
    pub zip64: bool,
    /// Absolute offset of the first data byte.
    pub data_start: u64,
}

impl LocalFileHeader {
    /// Parse the local file header at the reader's position, leaving the
    /// cursor at the first data byte.
    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        expect_signature(reader, LOCAL_FILE_HEADER_SIG)?;

        let version_needed = reader.read_u16_le()?;
        let flags = reader.read_u16_le()?;
        let method = reader.read_u16_le()?;
        let last_mod_time = reader.read_u16_le()?;
        let last_mod_date = reader.read_u16_le()?;
        let crc32 = reader.read_u32_le()?;
        let comp_size_32 = reader.read_u32_le()?;
        let uncomp_size_32 = reader.read_u32_le()?;
        let name_len = reader.read_u16_le()? as usize;
        let extra_len = reader.read_u16_le()? as usize;

        let mut name_bytes = vec![0u8; name_len];
        reader.read_bytes(&mut name_bytes)?;
        let mut extra = vec![0u8; extra_len];
        reader.read_bytes(&mut extra)?;

        // The local variant of the zip64 extra carries only the two sizes.
        let zip64_present = {
            let mut offset = 0;
            let mut found = false;
            while offset + 4 <= extra.len() {
                let header_id = u16::from_le_bytes([extra[offset], extra[offset + 1]]);
                let data_size =
                    u16::from_le_bytes([extra[offset + 2], extra[offset + 3]]) as usize;
                if header_id == ZIP64_EXTRA_FIELD_ID {
                    found = true;
                    break;
                }
                offset += 4 + data_size;
            }
            found
        };
        let zip64 = parse_zip64_extra(&extra, uncomp_size_32, comp_size_32, 0);

        Ok(Self {
            version_needed,
            flags,
            method,
            last_mod_time,
            last_mod_date,
            crc32,
            comp_size: zip64.comp_size.unwrap_or(comp_size_32 as u64),
            uncomp_size: zip64.uncomp_size.unwrap_or(uncomp_size_32 as u64),
            zip64: zip64_present,
            data_start: reader.byte_position(),
        })
    }

    /// Whether CRC and sizes live in a trailing data descriptor.
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }
}

/// A data descriptor trailing an entry's compressed data.
#[derive(Debug, Clone, Copy)]
pub struct DataDescriptor {
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compressed size.
    pub comp_size: u64,
    /// Uncompressed size.
    pub uncomp_size: u64,
}

impl DataDescriptor {
    /// Read a data descriptor at the reader's position.
    ///
    /// The `0x08074b50` signature is optional: when the first word is not
    /// the signature it is already the CRC (APPNOTE §4.3.9). Sizes are
    /// 8 bytes when the entry is zip64, 4 bytes otherwise.
    pub fn read(reader: &mut BitReader<'_>, zip64: bool) -> Result<Self> {
        let first_word = reader.read_u32_le()?;
        let crc32 = if first_word == DATA_DESCRIPTOR_SIG {
            reader.read_u32_le()?
        } else {
            first_word
        };

        let (comp_size, uncomp_size) = if zip64 {
            (reader.read_u64_le()?, reader.read_u64_le()?)
        } else {
            (reader.read_u32_le()? as u64, reader.read_u32_le()? as u64)
        };

        Ok(Self {
            crc32,
            comp_size,
            uncomp_size,
        })
    }
}

/// The end-of-central-directory record, after zip64 resolution.
#[derive(Debug, Clone, Copy)]
pub struct EndOfCentralDirectory {
    /// Total number of central directory records.
    pub total_entries: u64,
    /// Size of the central directory in bytes.
    pub cd_size: u64,
    /// Offset of the start of the central directory.
    pub cd_offset: u64,
}

impl EndOfCentralDirectory {
    /// Locate and read the EOCD record, consulting the zip64 locator and
    /// record when present.
    ///
    /// The EOCD is found by scanning backwards over at most 65 557 bytes
    /// (fixed record plus the maximum comment).
    pub fn find(data: &[u8]) -> Result<Self> {
        const EOCD_FIXED_LEN: usize = 22;
        const LOCATOR_LEN: usize = 20;

        if data.len() < EOCD_FIXED_LEN {
            return Err(FerrozipError::truncated(EOCD_FIXED_LEN - data.len()));
        }

        let search_start = data.len().saturating_sub(EOCD_FIXED_LEN + u16::MAX as usize);
        let sig = END_OF_CENTRAL_DIR_SIG.to_le_bytes();
        let eocd_pos = data[search_start..]
            .windows(4)
            .rposition(|window| window == sig)
            .map(|pos| search_start + pos)
            .ok_or_else(|| {
                FerrozipError::bad_signature(END_OF_CENTRAL_DIR_SIG, 0)
            })?;

        let mut reader = BitReader::new(data);
        reader.seek(eocd_pos as u64 + 4)?;
        let disk_number = reader.read_u16_le()?;
        let cd_disk = reader.read_u16_le()?;
        let _entries_this_disk = reader.read_u16_le()?;
        let total_entries_16 = reader.read_u16_le()?;
        let cd_size_32 = reader.read_u32_le()?;
        let cd_offset_32 = reader.read_u32_le()?;

        if disk_number != 0 && disk_number != ZIP64_MARKER_16 {
            return Err(FerrozipError::unsupported_feature("disk spanning"));
        }
        if cd_disk != 0 && cd_disk != ZIP64_MARKER_16 {
            return Err(FerrozipError::unsupported_feature("disk spanning"));
        }

        let needs_zip64 = total_entries_16 == ZIP64_MARKER_16
            || cd_size_32 == ZIP64_MARKER_32
            || cd_offset_32 == ZIP64_MARKER_32;

        // A zip64 archive puts a locator immediately before the EOCD.
        if eocd_pos >= LOCATOR_LEN {
            reader.seek((eocd_pos - LOCATOR_LEN) as u64)?;
            if reader.read_u32_le()? == ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIG {
                let _locator_disk = reader.read_u32_le()?;
                let zip64_eocd_offset = reader.read_u64_le()?;
                let total_disks = reader.read_u32_le()?;
                if total_disks > 1 {
                    return Err(FerrozipError::unsupported_feature("disk spanning"));
                }
                return Self::read_zip64(&mut reader, zip64_eocd_offset);
            }
        }

        if needs_zip64 {
            // Marker values with no locator to resolve them.
            return Err(FerrozipError::unsupported_feature(
                "zip64 markers without a zip64 end of central directory",
            ));
        }

        Ok(Self {
            total_entries: total_entries_16 as u64,
            cd_size: cd_size_32 as u64,
            cd_offset: cd_offset_32 as u64,
        })
    }

    /// Read the zip64 end-of-central-directory record.
    fn read_zip64(reader: &mut BitReader<'_>, offset: u64) -> Result<Self> {
        reader.seek(offset)?;
        expect_signature(reader, ZIP64_END_OF_CENTRAL_DIR_SIG)?;

        let _record_size = reader.read_u64_le()?;
        let _version_made_by = reader.read_u16_le()?;
        let _version_needed = reader.read_u16_le()?;
        let disk_number = reader.read_u32_le()?;
        let cd_disk = reader.read_u32_le()?;
        let _entries_this_disk = reader.read_u64_le()?;
        let total_entries = reader.read_u64_le()?;
        let cd_size = reader.read_u64_le()?;
        let cd_offset = reader.read_u64_le()?;

        if disk_number != 0 || cd_disk != 0 {
            return Err(FerrozipError::unsupported_feature("disk spanning"));
        }

        Ok(Self {
            total_entries,
            cd_size,
            cd_offset,
        })
    }
}
