//! IBM code page 437 decoding for ZIP names and comments.
//!
//! APPNOTE appendix D: entry names and comments are CP437 unless
//! general-purpose flag bit 11 declares them UTF-8. The low half of CP437
//! is ASCII; the high half maps through this table.

/// CP437 code points 0x80-0xFF.
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', // 0x80
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', // 0x90
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', // 0xA0
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', // 0xB0
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', // 0xC0
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', // 0xD0
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', // 0xE0
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■',
    '\u{a0}', // 0xF0
];

/// Decode CP437 bytes to a string.
pub fn decode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                CP437_HIGH[(b - 0x80) as usize]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(decode(b"readme.txt"), "readme.txt");
    }

    #[test]
    fn test_high_half() {
        // 0x82 0x85 0x8A: é à è
        assert_eq!(decode(&[0x82, 0x85, 0x8A]), "éàè");
        // Box drawing at 0xC9 0xCD 0xBB
        assert_eq!(decode(&[0xC9, 0xCD, 0xBB]), "╔═╗");
    }

    #[test]
    fn test_not_latin1() {
        // CP437 0xE1 is the sharp s, not Latin-1 'á'.
        assert_eq!(decode(&[0xE1]), "ß");
    }
}
