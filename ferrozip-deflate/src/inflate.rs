//! DEFLATE decompression (inflate).
//!
//! Implements the RFC 1951 block loop over all three block types:
//! stored, fixed Huffman, and dynamic Huffman.
//!
//! The decoder operates on a caller-owned [`BitReader`] so that container
//! layers can decode mid-archive and measure the consumed span afterwards:
//! the cursor is left at the bit following the final block's end-of-block
//! code, and the caller byte-aligns it.

use crate::huffman::{END_OF_BLOCK, HuffmanTree};
use crate::tables::{
    CODE_LENGTH_ORDER, DISTANCE_EXTRA_BITS, LENGTH_EXTRA_BITS, decode_distance, decode_length,
    fixed_distance_tree, fixed_litlen_tree,
};
use ferrozip_core::error::{FerrozipError, Result};
use ferrozip_core::{BitReader, OutputWindow};

/// DEFLATE decompressor for one stream.
#[derive(Debug)]
pub struct Inflater {
    /// Output buffer with the 32 KiB back-reference window.
    window: OutputWindow,
    /// Whether the final block has been decoded.
    final_block: bool,
}

impl Inflater {
    /// Create a new DEFLATE decompressor.
    pub fn new() -> Self {
        Self {
            window: OutputWindow::deflate(),
            final_block: false,
        }
    }

    /// Decode blocks until the final one and return the output.
    ///
    /// The reader is left un-aligned, positioned after the last block's
    /// end-of-block code.
    pub fn inflate(mut self, reader: &mut BitReader<'_>) -> Result<Vec<u8>> {
        while !self.final_block {
            self.inflate_block(reader)?;
        }
        Ok(self.window.into_output())
    }

    /// Decode a single block.
    fn inflate_block(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        let bfinal = reader.read_bit()?;
        let btype = reader.read_bits(2)?;

        self.final_block = bfinal;

        match btype {
            0 => self.inflate_stored(reader),
            1 => self.inflate_fixed(reader),
            2 => self.inflate_dynamic(reader),
            3 => Err(FerrozipError::deflate_malformed("reserved block type 3")),
            _ => unreachable!(),
        }
    }

    /// Decode a stored (uncompressed) block.
    fn inflate_stored(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        reader.align_to_byte();

        let len = reader.read_u16_le()?;
        let nlen = reader.read_u16_le()?;
        if len != !nlen {
            return Err(FerrozipError::deflate_malformed(format!(
                "stored block LEN {:#06x} does not match NLEN complement {:#06x}",
                len, !nlen
            )));
        }

        // LEN == 0 is a valid empty block.
        let mut buf = vec![0u8; len as usize];
        reader.read_bytes(&mut buf)?;
        self.window.write_literals(&buf);

        Ok(())
    }

    /// Decode a block with the fixed Huffman codes of RFC 1951 §3.2.6.
    fn inflate_fixed(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        self.inflate_huffman(reader, fixed_litlen_tree(), fixed_distance_tree())
    }

    /// Decode a block with dynamic Huffman codes.
    fn inflate_dynamic(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        let hlit = reader.read_bits(5)? as usize + 257; // literal/length codes
        let hdist = reader.read_bits(5)? as usize + 1; // distance codes
        let hclen = reader.read_bits(4)? as usize + 4; // code length codes

        // Code length code lengths arrive in the permuted order.
        let mut codelen_lengths = [0u8; 19];
        for &index in CODE_LENGTH_ORDER.iter().take(hclen) {
            codelen_lengths[index] = reader.read_bits(3)? as u8;
        }
        let codelen_tree = HuffmanTree::from_code_lengths(&codelen_lengths)?;

        // Literal/length and distance lengths share one run-length encoded
        // sequence.
        let mut all_lengths = vec![0u8; hlit + hdist];
        let mut i = 0;
        while i < all_lengths.len() {
            let code = codelen_tree.decode(reader)?;
            match code {
                0..=15 => {
                    all_lengths[i] = code as u8;
                    i += 1;
                }
                16 => {
                    // Repeat the previous length 3-6 times.
                    if i == 0 {
                        return Err(FerrozipError::deflate_malformed(
                            "repeat code 16 with no previous length",
                        ));
                    }
                    let repeat = reader.read_bits(2)? as usize + 3;
                    let prev = all_lengths[i - 1];
                    if i + repeat > all_lengths.len() {
                        return Err(FerrozipError::deflate_malformed(
                            "code length run overflows the header",
                        ));
                    }
                    all_lengths[i..i + repeat].fill(prev);
                    i += repeat;
                }
                17 | 18 => {
                    // Runs of zeros: 3-10 (code 17) or 11-138 (code 18).
                    let repeat = if code == 17 {
                        reader.read_bits(3)? as usize + 3
                    } else {
                        reader.read_bits(7)? as usize + 11
                    };
                    if i + repeat > all_lengths.len() {
                        return Err(FerrozipError::deflate_malformed(
                            "code length run overflows the header",
                        ));
                    }
                    i += repeat;
                }
                _ => {
                    return Err(FerrozipError::deflate_malformed(format!(
                        "invalid code length symbol {}",
                        code
                    )));
                }
            }
        }

        let litlen_tree = HuffmanTree::from_code_lengths(&all_lengths[..hlit])?;
        let dist_tree = HuffmanTree::from_code_lengths(&all_lengths[hlit..])?;

        self.inflate_huffman(reader, &litlen_tree, &dist_tree)
    }

    /// Decode the literal/match stream of a compressed block.
    fn inflate_huffman(
        &mut self,
        reader: &mut BitReader<'_>,
        litlen_tree: &HuffmanTree,
        dist_tree: &HuffmanTree,
    ) -> Result<()> {
        loop {
            let code = litlen_tree.decode(reader)?;

            if code < END_OF_BLOCK {
                self.window.write_literal(code as u8);
            } else if code == END_OF_BLOCK {
                break;
            } else if code <= 285 {
                let extra_bits = LENGTH_EXTRA_BITS[(code - 257) as usize];
                let extra = reader.read_bits(extra_bits)? as u16;
                let length = decode_length(code, extra);

                let dist_code = dist_tree.decode(reader)?;
                if dist_code >= 30 {
                    return Err(FerrozipError::deflate_malformed(format!(
                        "invalid distance code {}",
                        dist_code
                    )));
                }
                let dist_extra_bits = DISTANCE_EXTRA_BITS[dist_code as usize];
                let dist_extra = reader.read_bits(dist_extra_bits)? as u16;
                let distance = decode_distance(dist_code, dist_extra);

                self.window.copy_match(distance as usize, length as usize)?;
            } else {
                return Err(FerrozipError::deflate_malformed(format!(
                    "invalid literal/length code {}",
                    code
                )));
            }
        }

        Ok(())
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

/// Decompress a complete DEFLATE stream.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut reader = BitReader::new(data);
    Inflater::new().inflate(&mut reader)
}
