//! End-to-end tests over synthetic in-memory ZIP archives.
//!
//! The library only reads archives, so these tests carry a minimal
//! archive builder that writes local headers, optional data descriptors,
//! the central directory, and the end-of-central-directory record.

use ferrozip_core::Crc32;
use ferrozip_core::bitstream::BitWriter;
use ferrozip_core::error::FerrozipError;
use ferrozip_deflate::huffman::{END_OF_BLOCK, HuffmanEncoder};
use ferrozip_deflate::tables::fixed_litlen_lengths;
use ferrozip_zip::header::{FLAG_DATA_DESCRIPTOR, FLAG_ENCRYPTED, FLAG_UTF8};
use ferrozip_zip::{CompressionMethod, open_container};

/// How a test entry's data descriptor is written.
#[derive(Clone, Copy, PartialEq)]
enum Descriptor {
    None,
    WithSignature,
    WithoutSignature,
}

/// One entry of a synthetic archive.
struct TestEntry {
    name: Vec<u8>,
    comment: Vec<u8>,
    method: u16,
    flags: u16,
    crc32: u32,
    payload: Vec<u8>,
    uncomp_size: u32,
    comp_size: u32,
    version_made_by: u16,
    external_attributes: u32,
    descriptor: Descriptor,
    /// Method written into the local header when it should disagree.
    local_method: Option<u16>,
    /// Declared compressed size override for corruption tests.
    comp_size_override: Option<u32>,
}

impl TestEntry {
    /// A stored entry holding `data` verbatim.
    fn stored(name: &str, data: &[u8]) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            comment: Vec::new(),
            method: 0,
            flags: 0,
            crc32: Crc32::compute(data),
            payload: data.to_vec(),
            uncomp_size: data.len() as u32,
            comp_size: data.len() as u32,
            version_made_by: 0x031E, // UNIX, version 3.0
            external_attributes: 0o100644 << 16,
            descriptor: Descriptor::None,
            local_method: None,
            comp_size_override: None,
        }
    }

    /// A deflate entry wrapping `data` in a stored DEFLATE block.
    fn deflated_stored_block(name: &str, data: &[u8]) -> Self {
        let mut payload = vec![0x01];
        let len = data.len() as u16;
        payload.extend_from_slice(&len.to_le_bytes());
        payload.extend_from_slice(&(!len).to_le_bytes());
        payload.extend_from_slice(data);

        Self {
            method: 8,
            comp_size: payload.len() as u32,
            payload,
            ..Self::stored(name, data)
        }
    }

    /// A deflate entry compressed with the fixed Huffman code.
    fn deflated_fixed(name: &str, data: &[u8]) -> Self {
        let encoder = HuffmanEncoder::from_lengths(&fixed_litlen_lengths()).unwrap();
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b01, 2);
        for &byte in data {
            encoder.encode(byte as u16, &mut writer).unwrap();
        }
        encoder.encode(END_OF_BLOCK, &mut writer).unwrap();
        let payload = writer.finish();

        Self {
            method: 8,
            comp_size: payload.len() as u32,
            payload,
            ..Self::stored(name, data)
        }
    }

    /// A directory entry as UNIX zip tools write them.
    fn directory(name: &str) -> Self {
        Self {
            external_attributes: (0o40755 << 16) | 0x10,
            ..Self::stored(name, b"")
        }
    }

    fn with_descriptor(mut self, style: Descriptor) -> Self {
        self.flags |= FLAG_DATA_DESCRIPTOR;
        self.descriptor = style;
        self
    }
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Assemble a complete single-disk archive.
fn build_archive(entries: &[TestEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut offsets = Vec::with_capacity(entries.len());

    for entry in entries {
        offsets.push(out.len() as u32);
        let has_descriptor = entry.descriptor != Descriptor::None;
        let (crc, comp, uncomp) = if has_descriptor {
            (0, 0, 0)
        } else {
            (entry.crc32, entry.comp_size, entry.uncomp_size)
        };

        push_u32(&mut out, 0x04034B50);
        push_u16(&mut out, 20); // version needed
        push_u16(&mut out, entry.flags);
        push_u16(&mut out, entry.local_method.unwrap_or(entry.method));
        push_u16(&mut out, 0x6000); // modification time
        push_u16(&mut out, 0x5A21); // modification date
        push_u32(&mut out, crc);
        push_u32(&mut out, comp);
        push_u32(&mut out, uncomp);
        push_u16(&mut out, entry.name.len() as u16);
        push_u16(&mut out, 0); // extra length
        out.extend_from_slice(&entry.name);
        out.extend_from_slice(&entry.payload);

        match entry.descriptor {
            Descriptor::None => {}
            Descriptor::WithSignature => {
                push_u32(&mut out, 0x08074B50);
                push_u32(&mut out, entry.crc32);
                push_u32(&mut out, entry.comp_size);
                push_u32(&mut out, entry.uncomp_size);
            }
            Descriptor::WithoutSignature => {
                push_u32(&mut out, entry.crc32);
                push_u32(&mut out, entry.comp_size);
                push_u32(&mut out, entry.uncomp_size);
            }
        }
    }

    let cd_offset = out.len() as u32;
    for (entry, &offset) in entries.iter().zip(&offsets) {
        push_u32(&mut out, 0x02014B50);
        push_u16(&mut out, entry.version_made_by);
        push_u16(&mut out, 20);
        push_u16(&mut out, entry.flags);
        push_u16(&mut out, entry.method);
        push_u16(&mut out, 0x6000);
        push_u16(&mut out, 0x5A21);
        push_u32(&mut out, entry.crc32);
        push_u32(&mut out, entry.comp_size_override.unwrap_or(entry.comp_size));
        push_u32(&mut out, entry.uncomp_size);
        push_u16(&mut out, entry.name.len() as u16);
        push_u16(&mut out, 0); // extra length
        push_u16(&mut out, entry.comment.len() as u16);
        push_u16(&mut out, 0); // disk number start
        push_u16(&mut out, 0); // internal attributes
        push_u32(&mut out, entry.external_attributes);
        push_u32(&mut out, offset);
        out.extend_from_slice(&entry.name);
        out.extend_from_slice(&entry.comment);
    }
    let cd_size = out.len() as u32 - cd_offset;

    push_u32(&mut out, 0x06054B50);
    push_u16(&mut out, 0); // disk number
    push_u16(&mut out, 0); // central directory disk
    push_u16(&mut out, entries.len() as u16);
    push_u16(&mut out, entries.len() as u16);
    push_u32(&mut out, cd_size);
    push_u32(&mut out, cd_offset);
    push_u16(&mut out, 0); // comment length
    out
}

#[test]
fn test_enumerate_and_extract() {
    let bytes = build_archive(&[
        TestEntry::stored("plain.txt", b"stored bytes"),
        TestEntry::deflated_stored_block("packed.bin", b"deflated via stored block"),
        TestEntry::deflated_fixed("fixed.txt", b"fixed huffman literals"),
        TestEntry::directory("sub/"),
    ]);

    let mut archive = open_container(&bytes).unwrap();
    assert_eq!(archive.len(), 4);

    let names: Vec<_> = archive.entries().iter().map(|e| e.name().to_owned()).collect();
    assert_eq!(names, ["plain.txt", "packed.bin", "fixed.txt", "sub/"]);

    assert_eq!(archive.entries()[0].size(), 12);
    assert_eq!(
        archive.entries()[1].compression_method(),
        CompressionMethod::Deflate
    );
    assert!(archive.entries()[3].is_directory());
    assert!(!archive.entries()[0].is_directory());

    assert_eq!(archive.read(0).unwrap(), b"stored bytes");
    assert_eq!(archive.read(1).unwrap(), b"deflated via stored block");
    assert_eq!(archive.read(2).unwrap(), b"fixed huffman literals");
    assert_eq!(archive.read(3).unwrap(), b"");
}

#[test]
fn test_read_is_repeatable() {
    let bytes = build_archive(&[TestEntry::deflated_fixed("a.txt", b"same result twice")]);
    let mut archive = open_container(&bytes).unwrap();

    let first = archive.read(0).unwrap();
    let second = archive.read(0).unwrap(); // local header now cached
    assert_eq!(first, second);
}

#[test]
fn test_many_entries() {
    let payloads: Vec<Vec<u8>> = (0..64)
        .map(|i| format!("entry number {} body {}", i, "x".repeat(i)).into_bytes())
        .collect();
    let entries: Vec<TestEntry> = payloads
        .iter()
        .enumerate()
        .map(|(i, payload)| {
            if i % 2 == 0 {
                TestEntry::stored(&format!("file{:03}.txt", i), payload)
            } else {
                TestEntry::deflated_stored_block(&format!("file{:03}.txt", i), payload)
            }
        })
        .collect();
    let bytes = build_archive(&entries);

    let mut archive = open_container(&bytes).unwrap();
    assert_eq!(archive.len(), 64);
    for (i, payload) in payloads.iter().enumerate() {
        assert_eq!(archive.entries()[i].size(), payload.len() as u64);
        assert_eq!(&archive.read(i).unwrap(), payload);
    }
}

#[test]
fn test_comments_and_utf8_names() {
    let mut entry = TestEntry::stored("caf\u{e9}.txt", b"utf-8 name");
    entry.name = "café.txt".as_bytes().to_vec();
    entry.flags |= FLAG_UTF8;
    entry.comment = "entry comment".as_bytes().to_vec();

    // CP437 name: 0x82 decodes to 'é'.
    let mut cp437_entry = TestEntry::stored("x", b"cp437 name");
    cp437_entry.name = vec![b'c', b'a', b'f', 0x82, b'.', b't', b'x', b't'];

    let bytes = build_archive(&[entry, cp437_entry]);
    let mut archive = open_container(&bytes).unwrap();

    assert_eq!(archive.entries()[0].name(), "café.txt");
    assert_eq!(archive.entries()[0].comment(), "entry comment");
    assert_eq!(archive.entries()[1].name(), "café.txt");

    assert_eq!(archive.read(0).unwrap(), b"utf-8 name");
    assert_eq!(archive.read(1).unwrap(), b"cp437 name");

    let (index, _) = archive.entry_by_name("café.txt").unwrap();
    assert_eq!(index, 0);
}

#[test]
fn test_data_descriptor_with_and_without_signature() {
    let bytes = build_archive(&[
        TestEntry::deflated_stored_block("sig.bin", b"descriptor with signature")
            .with_descriptor(Descriptor::WithSignature),
        TestEntry::deflated_stored_block("nosig.bin", b"descriptor, bare fields")
            .with_descriptor(Descriptor::WithoutSignature),
        TestEntry::stored("stored.bin", b"stored with descriptor")
            .with_descriptor(Descriptor::WithSignature),
    ]);

    let mut archive = open_container(&bytes).unwrap();
    assert_eq!(archive.read(0).unwrap(), b"descriptor with signature");
    assert_eq!(archive.read(1).unwrap(), b"descriptor, bare fields");
    assert_eq!(archive.read(2).unwrap(), b"stored with descriptor");
}

#[test]
fn test_tampered_crc_surfaces_decoded_bytes() {
    let mut entry = TestEntry::stored("bad.bin", b"honest content");
    entry.crc32 ^= 0xFF; // corrupt the declared CRC
    let bytes = build_archive(&[entry]);

    let mut archive = open_container(&bytes).unwrap();
    match archive.read(0) {
        Err(FerrozipError::WrongCrc32 { data, .. }) => {
            assert_eq!(data, b"honest content");
        }
        other => panic!("expected WrongCrc32, got {:?}", other),
    }
}

#[test]
fn test_local_header_mismatch() {
    let mut entry = TestEntry::stored("drift.txt", b"payload");
    entry.local_method = Some(8); // central directory says stored
    let bytes = build_archive(&[entry]);

    let mut archive = open_container(&bytes).unwrap();
    assert!(matches!(
        archive.read(0),
        Err(FerrozipError::WrongLocalHeader {
            field: "compression method"
        })
    ));
}

#[test]
fn test_size_source_is_local_header_without_descriptor() {
    // Without a data descriptor the local header carries the authoritative
    // sizes, so a corrupt central directory size goes unnoticed by read.
    let mut entry = TestEntry::stored("short.txt", b"1234");
    entry.comp_size_override = Some(5);
    let bytes = build_archive(&[entry]);

    let mut archive = open_container(&bytes).unwrap();
    assert_eq!(archive.entries()[0].compressed_size(), 5);
    assert_eq!(archive.read(0).unwrap(), b"1234");
}

#[test]
fn test_wrong_size_via_descriptor() {
    let mut entry =
        TestEntry::stored("short.txt", b"1234").with_descriptor(Descriptor::WithSignature);
    entry.comp_size_override = Some(5);
    let bytes = build_archive(&[entry]);

    let mut archive = open_container(&bytes).unwrap();
    assert!(matches!(
        archive.read(0),
        Err(FerrozipError::WrongSize {
            declared: 5,
            observed: 4
        })
    ));
}

#[test]
fn test_unsupported_method_does_not_poison_archive() {
    let mut bzip2_entry = TestEntry::stored("weird.bz2", b"pretend-bzip2");
    bzip2_entry.method = 12;
    let bytes = build_archive(&[bzip2_entry, TestEntry::stored("ok.txt", b"fine")]);

    let mut archive = open_container(&bytes).unwrap();
    assert_eq!(archive.len(), 2);
    assert!(matches!(
        archive.read(0),
        Err(FerrozipError::CompressionNotSupported { method: 12 })
    ));
    assert_eq!(archive.read(1).unwrap(), b"fine");
}

#[test]
fn test_encrypted_entry_rejected() {
    let mut entry = TestEntry::stored("secret.txt", b"sealed");
    entry.flags |= FLAG_ENCRYPTED;
    let bytes = build_archive(&[entry]);

    let mut archive = open_container(&bytes).unwrap();
    assert!(matches!(
        archive.read(0),
        Err(FerrozipError::UnsupportedFeature { .. })
    ));
}

#[test]
fn test_truncated_archive() {
    let bytes = build_archive(&[TestEntry::stored("a.txt", b"abc")]);
    assert!(open_container(&bytes[..10]).is_err());
}

#[test]
fn test_garbage_is_not_an_archive() {
    let garbage = vec![0xA5u8; 128];
    assert!(matches!(
        open_container(&garbage),
        Err(FerrozipError::BadSignature { .. })
    ));
}
