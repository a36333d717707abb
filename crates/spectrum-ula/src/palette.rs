//! ZX Spectrum 16-colour palette.
//!
//! The ULA outputs 15 unique colours (black appears twice) from a 3-bit
//! GRB scheme with a BRIGHT modifier. Non-bright colours use the lower
//! 0xD7 intensity, bright colours full 0xFF.

/// RGB palette: 16 entries (8 normal + 8 bright).
///
/// Index layout: `bright_bit << 3 | colour_3bit`
///
/// Colours: black, blue, red, magenta, green, cyan, yellow, white.
pub const PALETTE: [[u8; 3]; 16] = [
    // Normal (bright = 0)
    [0x00, 0x00, 0x00], // 0: Black
    [0x00, 0x00, 0xD7], // 1: Blue
    [0xD7, 0x00, 0x00], // 2: Red
    [0xD7, 0x00, 0xD7], // 3: Magenta
    [0x00, 0xD7, 0x00], // 4: Green
    [0x00, 0xD7, 0xD7], // 5: Cyan
    [0xD7, 0xD7, 0x00], // 6: Yellow
    [0xD7, 0xD7, 0xD7], // 7: White
    // Bright (bright = 1)
    [0x00, 0x00, 0x00], // 8: Black (same as normal)
    [0x00, 0x00, 0xFF], // 9: Bright Blue
    [0xFF, 0x00, 0x00], // 10: Bright Red
    [0xFF, 0x00, 0xFF], // 11: Bright Magenta
    [0x00, 0xFF, 0x00], // 12: Bright Green
    [0x00, 0xFF, 0xFF], // 13: Bright Cyan
    [0xFF, 0xFF, 0x00], // 14: Bright Yellow
    [0xFF, 0xFF, 0xFF], // 15: Bright White
];
