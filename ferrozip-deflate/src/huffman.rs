//! Canonical Huffman coding for DEFLATE.
//!
//! This module implements canonical Huffman code construction, encoding,
//! and decoding as specified in RFC 1951. Codes of the same length are
//! assigned consecutive values in symbol order; at each length transition
//! the running code shifts left by the length difference. The wire
//! representation is the canonical MSB-first code bit-reversed over its own
//! length, so that LSB-first transmission yields the canonical bit order.
//!
//! # Alphabets
//!
//! DEFLATE uses three Huffman alphabets:
//! - **Literal/Length**: 0-287 (0-255 literals, 256 EOB, 257-285 lengths)
//! - **Distance**: 0-29 (back-reference distances)
//! - **Code Length**: 0-18 (for encoding dynamic Huffman trees)

use ferrozip_core::BitReader;
use ferrozip_core::bitstream::BitWriter;
use ferrozip_core::error::{FerrozipError, Result};

/// Maximum code length in DEFLATE (15 bits).
pub const MAX_CODE_LENGTH: usize = 15;

/// Size of the literal/length alphabet (0-287).
pub const LITLEN_ALPHABET_SIZE: usize = 288;

/// Size of the distance alphabet (0-29).
pub const DISTANCE_ALPHABET_SIZE: usize = 30;

/// Size of the code length alphabet (0-18).
pub const CODELEN_ALPHABET_SIZE: usize = 19;

/// End of block symbol.
pub const END_OF_BLOCK: u16 = 256;

/// Reverse the low `length` bits of `code`.
///
/// Bits above `length` are discarded; the function is its own inverse over
/// values below `2^length`.
pub fn reverse_bits(mut code: u16, length: u8) -> u16 {
    let mut reversed = 0u16;
    for _ in 0..length {
        reversed = (reversed << 1) | (code & 1);
        code >>= 1;
    }
    reversed
}

/// A symbol's assigned code in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuffmanCode {
    /// Canonical code, bit-reversed over `length` (DEFLATE wire order).
    pub pattern: u16,
    /// Code length in bits (1-15).
    pub length: u8,
}

/// Per-length layout of a canonical code: how many codes of each length
/// exist and what the first canonical code of each length is.
#[derive(Debug, Clone)]
struct CanonicalLayout {
    counts: [u16; MAX_CODE_LENGTH + 1],
    first_codes: [u32; MAX_CODE_LENGTH + 1],
    max_length: u8,
}

impl CanonicalLayout {
    /// Compute the canonical layout for a dense length vector, validating
    /// that the lengths fit in the code space.
    fn from_lengths(code_lengths: &[u8]) -> Result<Self> {
        let mut counts = [0u16; MAX_CODE_LENGTH + 1];
        let mut max_length = 0u8;

        for &len in code_lengths {
            if len as usize > MAX_CODE_LENGTH {
                return Err(FerrozipError::huffman_malformed(format!(
                    "code length {} exceeds maximum {}",
                    len, MAX_CODE_LENGTH
                )));
            }
            if len > 0 {
                counts[len as usize] += 1;
                max_length = max_length.max(len);
            }
        }

        // First canonical code of each length (RFC 1951 §3.2.2): the codes
        // of length L start where the length L-1 codes end, shifted left.
        let mut first_codes = [0u32; MAX_CODE_LENGTH + 1];
        let mut code = 0u32;
        for bits in 1..=max_length as usize {
            code = (code + counts[bits - 1] as u32) << 1;
            first_codes[bits] = code;
        }

        // An oversubscribed length vector would assign codes past the end
        // of the longest-length code space.
        if max_length > 0 {
            let last = max_length as usize;
            if first_codes[last] + counts[last] as u32 > 1u32 << last {
                return Err(FerrozipError::huffman_malformed(
                    "code lengths oversubscribe the prefix code space",
                ));
            }
        }

        Ok(Self {
            counts,
            first_codes,
            max_length,
        })
    }
}

/// Canonical Huffman encoder: a per-symbol table of wire-order codes.
///
/// Three construction paths are accepted; all collapse to one dense
/// length-by-symbol vector before canonical assignment.
#[derive(Debug, Clone)]
pub struct HuffmanEncoder {
    /// Wire-order code per symbol; `None` marks an absent symbol.
    codes: Vec<Option<HuffmanCode>>,
}

impl HuffmanEncoder {
    /// Build an encoder from a dense length vector indexed by symbol.
    ///
    /// A length of 0 means the symbol is absent from the code.
    pub fn from_lengths(code_lengths: &[u8]) -> Result<Self> {
        let layout = CanonicalLayout::from_lengths(code_lengths)?;

        let mut next_code = layout.first_codes;
        let mut codes = vec![None; code_lengths.len()];
        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len > 0 {
                let code = next_code[len as usize];
                next_code[len as usize] += 1;
                codes[symbol] = Some(HuffmanCode {
                    pattern: reverse_bits(code as u16, len),
                    length: len,
                });
            }
        }

        Ok(Self { codes })
    }

    /// Build an encoder from explicit `(symbol, code_length)` records.
    ///
    /// Records may arrive in any order; duplicate symbols are rejected.
    pub fn from_records(records: &[(u16, u8)]) -> Result<Self> {
        let size = records
            .iter()
            .map(|&(symbol, _)| symbol as usize + 1)
            .max()
            .unwrap_or(0);

        let mut lengths = vec![0u8; size];
        for &(symbol, len) in records {
            if len > 0 && lengths[symbol as usize] > 0 {
                return Err(FerrozipError::huffman_malformed(format!(
                    "symbol {} assigned more than one code length",
                    symbol
                )));
            }
            lengths[symbol as usize] = len;
        }

        Self::from_lengths(&lengths)
    }

    /// Build an encoder from breakpoint ranges.
    ///
    /// Each pair `(symbol, code_length)` declares that symbols in
    /// `[pair.0, next_pair.0)` share `pair.1`; the final pair only
    /// terminates the last range, its length is not used. This is the
    /// compact form the fixed DEFLATE tables are specified in.
    ///
    /// ```
    /// use ferrozip_deflate::huffman::HuffmanEncoder;
    ///
    /// // RFC 1951 §3.2.6 fixed literal/length lengths.
    /// let encoder = HuffmanEncoder::from_bootstrap(&[
    ///     (0, 8),
    ///     (144, 9),
    ///     (256, 7),
    ///     (280, 8),
    ///     (288, 0),
    /// ])
    /// .unwrap();
    /// assert_eq!(encoder.code(255).unwrap().length, 9);
    /// ```
    pub fn from_bootstrap(ranges: &[(usize, u8)]) -> Result<Self> {
        let Some((&(_, _), rest)) = ranges.split_first() else {
            return Self::from_lengths(&[]);
        };
        if rest.is_empty() {
            return Err(FerrozipError::huffman_malformed(
                "bootstrap needs a terminating breakpoint",
            ));
        }

        let end = ranges[ranges.len() - 1].0;
        let mut lengths = vec![0u8; end];
        for pair in ranges.windows(2) {
            let (start, len) = pair[0];
            let (stop, _) = pair[1];
            if stop <= start {
                return Err(FerrozipError::huffman_malformed(
                    "bootstrap breakpoints must be strictly increasing",
                ));
            }
            for length in &mut lengths[start..stop] {
                *length = len;
            }
        }

        Self::from_lengths(&lengths)
    }

    /// The wire-order code assigned to `symbol`, if any.
    pub fn code(&self, symbol: u16) -> Option<HuffmanCode> {
        self.codes.get(symbol as usize).copied().flatten()
    }

    /// Emit the code for `symbol` through the writer.
    ///
    /// Encoding a symbol with no assigned code is caller misuse and fails
    /// with [`FerrozipError::HuffmanMalformed`].
    pub fn encode(&self, symbol: u16, writer: &mut BitWriter) -> Result<()> {
        let code = self.code(symbol).ok_or_else(|| {
            FerrozipError::huffman_malformed(format!("symbol {} has no assigned code", symbol))
        })?;
        writer.write_bits(code.pattern as u32, code.length);
        Ok(())
    }

    /// Total bit cost of emitting each `(symbol, count)` in `stats`.
    ///
    /// Fails on any symbol without an assigned code.
    pub fn bit_cost(&self, stats: &[(u16, u64)]) -> Result<u64> {
        let mut total = 0u64;
        for &(symbol, count) in stats {
            let code = self.code(symbol).ok_or_else(|| {
                FerrozipError::huffman_malformed(format!("symbol {} has no assigned code", symbol))
            })?;
            total += count * code.length as u64;
        }
        Ok(total)
    }
}

/// A canonical Huffman decoding table.
///
/// Decoding consumes LSB-first bits from [`BitReader`]. Codes no longer
/// than [`HuffmanTree::FAST_BITS`] resolve through a direct lookup table;
/// longer codes fall back to a canonical walk accumulating the MSB-first
/// code one bit at a time.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    /// Direct lookup table indexed by the next `fast_bits` wire bits.
    /// Entry format: (symbol, code_length); length 0 marks "not a short
    /// code here".
    fast_table: Vec<(u16, u8)>,
    /// Number of bits for fast lookup.
    fast_bits: u8,
    /// Maximum code length in this tree; 0 for an empty tree.
    max_code_length: u8,
    /// Symbols ordered by (length, symbol), the canonical order.
    symbols: Vec<u16>,
    /// Number of codes of each length.
    counts: [u16; MAX_CODE_LENGTH + 1],
    /// First canonical code of each length.
    first_codes: [u32; MAX_CODE_LENGTH + 1],
    /// Index into `symbols` where each length's run begins.
    symbol_offsets: [u16; MAX_CODE_LENGTH + 1],
}

impl HuffmanTree {
    /// Width of the fast lookup table.
    const FAST_BITS: u8 = 9;

    /// Build a decoding table from a dense code-length vector.
    ///
    /// Zero lengths mark absent symbols and are accepted anywhere,
    /// including an all-zero vector: the resulting empty tree fails on
    /// every decode.
    pub fn from_code_lengths(code_lengths: &[u8]) -> Result<Self> {
        let layout = CanonicalLayout::from_lengths(code_lengths)?;

        if layout.max_length == 0 {
            return Ok(Self {
                fast_table: Vec::new(),
                fast_bits: 0,
                max_code_length: 0,
                symbols: Vec::new(),
                counts: layout.counts,
                first_codes: layout.first_codes,
                symbol_offsets: [0; MAX_CODE_LENGTH + 1],
            });
        }

        let mut symbol_offsets = [0u16; MAX_CODE_LENGTH + 1];
        let mut offset = 0u16;
        for bits in 1..=layout.max_length as usize {
            symbol_offsets[bits] = offset;
            offset += layout.counts[bits];
        }

        let fast_bits = Self::FAST_BITS.min(layout.max_length);
        let mut fast_table = vec![(0u16, 0u8); 1usize << fast_bits];
        let mut symbols = vec![0u16; offset as usize];

        // Walking symbols in index order within each length reproduces the
        // canonical (length asc, symbol asc) assignment.
        let mut next_code = layout.first_codes;
        let mut next_slot = symbol_offsets;
        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len == 0 {
                continue;
            }
            let len_idx = len as usize;
            let code = next_code[len_idx];
            next_code[len_idx] += 1;

            symbols[next_slot[len_idx] as usize] = symbol as u16;
            next_slot[len_idx] += 1;

            if len <= fast_bits {
                // Every wire suffix behind this code maps to the same
                // symbol; fill all of them.
                let wire = reverse_bits(code as u16, len) as usize;
                for suffix in 0..1usize << (fast_bits - len) {
                    fast_table[wire | (suffix << len)] = (symbol as u16, len);
                }
            }
        }

        Ok(Self {
            fast_table,
            fast_bits,
            max_code_length: layout.max_length,
            symbols,
            counts: layout.counts,
            first_codes: layout.first_codes,
            symbol_offsets,
        })
    }

    /// Decode one symbol from the bit stream.
    #[inline]
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16> {
        if self.max_code_length == 0 {
            return Err(FerrozipError::huffman_malformed(
                "decode from an empty code",
            ));
        }

        let bits = reader.peek_bits(self.fast_bits);
        let (symbol, len) = self.fast_table[bits as usize];
        if len > 0 {
            reader.skip_bits(len)?;
            return Ok(symbol);
        }

        self.decode_slow(reader)
    }

    /// Canonical walk for codes longer than the fast table.
    fn decode_slow(&self, reader: &mut BitReader<'_>) -> Result<u16> {
        let mut code = 0u32;
        for len in 1..=self.max_code_length as usize {
            code = (code << 1) | reader.read_bits(1)?;

            let count = self.counts[len] as u32;
            if count > 0 && code >= self.first_codes[len] {
                let index = code - self.first_codes[len];
                if index < count {
                    return Ok(self.symbols[self.symbol_offsets[len] as usize + index as usize]);
                }
            }
        }

        Err(FerrozipError::huffman_malformed(format!(
            "prefix with no assigned symbol near byte {}",
            reader.byte_position()
        )))
    }
}
