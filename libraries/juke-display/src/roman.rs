//! Roman numerals as colored LEDs
//!
//! The playlist-length view encodes the count in non-subtraction roman
//! notation (4 is IIII, not IV) with one LED per numeral letter. The
//! color code is the modified zelda rubee color-value standard; yes,
//! that's a thing.

use juke_core::Color;

/// Numeral values with their LED colors, descending
const NUMERALS: [(u32, Color); 7] = [
    (1000, Color::CYAN),
    (500, Color::YELLOW),
    (100, Color::CYAN),
    (50, Color::PURPLE),
    (10, Color::RED),
    (5, Color::BLUE),
    (1, Color::GREEN),
];

/// Encode `number` as roman-numeral LED colors, one entry per letter.
///
/// Returns an empty vector for 0. Callers clamp to what their strip can
/// show (48 is the largest value that fits on 8 LEDs: XXXXVIII).
pub fn roman_leds(mut number: u32) -> Vec<Color> {
    let mut leds = Vec::new();
    for (value, color) in NUMERALS {
        while number >= value {
            leds.push(color);
            number -= value;
        }
    }
    leds
}
