// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::colors;
use crate::stream::{ByteExt, Stream};

/// An RGBA color.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    /// Constructs a new opaque color.
    #[inline]
    pub fn new_rgb(red: u8, green: u8, blue: u8) -> Color {
        Color {
            red,
            green,
            blue,
            alpha: 255,
        }
    }

    /// Constructs a new color.
    #[inline]
    pub fn new_rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Color {
        Color {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// A fully transparent black.
    #[inline]
    pub fn transparent() -> Color {
        Color::new_rgba(0, 0, 0, 0)
    }

    #[inline]
    pub fn black() -> Color {
        Color::new_rgb(0, 0, 0)
    }

    #[inline]
    pub fn white() -> Color {
        Color::new_rgb(255, 255, 255)
    }
}

/// Parses a color value.
///
/// Supported formats:
///
/// - `#RGB` and `#RRGGBB` hex notation;
/// - `rgb(r g b)` with integer or percentage channels;
/// - recognized color keywords, case-insensitively.
///
/// The produced color is always opaque; opacity is applied separately.
///
/// Returns `None` for everything else so callers can pick their fallback.
pub(crate) fn parse_color(text: &str) -> Option<Color> {
    let mut s = Stream::from(text.trim());

    if s.is_curr_byte_eq(b'#') {
        s.advance(1);
        let color_str = s.consume_bytes(|_, c| c.is_hex_digit()).as_bytes();
        if !s.at_end() {
            return None;
        }

        match color_str.len() {
            6 => Some(Color::new_rgb(
                hex_pair(color_str[0], color_str[1]),
                hex_pair(color_str[2], color_str[3]),
                hex_pair(color_str[4], color_str[5]),
            )),
            3 => Some(Color::new_rgb(
                short_hex(color_str[0]),
                short_hex(color_str[1]),
                short_hex(color_str[2]),
            )),
            _ => None,
        }
    } else if s.starts_with(b"rgb(") || s.starts_with(b"RGB(") {
        s.advance(4);
        let red = parse_channel(&mut s)?;
        let green = parse_channel(&mut s)?;
        let blue = parse_channel(&mut s)?;
        s.skip_spaces();
        s.consume_byte(b')').ok()?;
        Some(Color::new_rgb(red, green, blue))
    } else {
        colors::from_str(&text.trim().to_ascii_lowercase())
    }
}

fn parse_channel(s: &mut Stream) -> Option<u8> {
    s.skip_spaces();
    let n = s.parse_number().ok()?;
    let n = if s.is_curr_byte_eq(b'%') {
        s.advance(1);
        (n / 100.0 * 255.0).round()
    } else {
        n.round()
    };
    s.skip_spaces();
    s.parse_list_separator();
    Some(crate::f32_bound(0.0, n, 255.0) as u8)
}

#[inline]
fn from_hex(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => b'0',
    }
}

#[inline]
fn short_hex(c: u8) -> u8 {
    let h = from_hex(c);
    (h << 4) | h
}

#[inline]
fn hex_pair(c1: u8, c2: u8) -> u8 {
    (from_hex(c1) << 4) | from_hex(c2)
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test {
        ($name:ident, $text:expr, $color:expr) => {
            #[test]
            fn $name() {
                assert_eq!(parse_color($text), Some($color));
            }
        };
    }

    test!(hex_rrggbb, "#ff0000", Color::new_rgb(255, 0, 0));
    test!(hex_rgb, "#fb0", Color::new_rgb(255, 187, 0));
    test!(hex_short_expands, "#abc", Color::new_rgb(0xaa, 0xbb, 0xcc));
    test!(hex_uppercase, "#FF00Aa", Color::new_rgb(255, 0, 170));
    test!(rgb_ints, "rgb(50, 100, 150)", Color::new_rgb(50, 100, 150));
    test!(rgb_percent, "rgb(50%, 100%, 0%)", Color::new_rgb(128, 255, 0));
    test!(rgb_clamped, "rgb(300, -10, 0)", Color::new_rgb(255, 0, 0));
    test!(named, "red", Color::new_rgb(255, 0, 0));
    test!(named_mixed_case, "CornFlowerBlue", Color::new_rgb(100, 149, 237));
    test!(trimmed, " red ", Color::new_rgb(255, 0, 0));

    macro_rules! test_err {
        ($name:ident, $text:expr) => {
            #[test]
            fn $name() {
                assert_eq!(parse_color($text), None);
            }
        };
    }

    test_err!(err_empty, "");
    test_err!(err_hex_len, "#ff00");
    test_err!(err_hex_garbage, "#ff0000z");
    test_err!(err_unknown_name, "zzz");
    test_err!(err_rgb_unclosed, "rgb(0, 0, 0");
}
