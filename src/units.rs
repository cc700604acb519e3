// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::stream::Stream;
use crate::Error;

/// Recognized length-literal units.
///
/// A value with any other suffix fails to parse as a plain number and
/// falls back at its call site.
#[derive(Clone, Copy, PartialEq, Debug)]
enum Unit {
    Percent,
    Pt,
    Px,
    Mm,
}

impl Unit {
    fn detect(value: &str) -> Option<Unit> {
        if value.ends_with('%') {
            Some(Unit::Percent)
        } else if value.ends_with("pt") {
            Some(Unit::Pt)
        } else if value.ends_with("px") {
            Some(Unit::Px)
        } else if value.ends_with("mm") {
            Some(Unit::Mm)
        } else {
            None
        }
    }

    fn abbreviation(self) -> &'static str {
        match self {
            Unit::Percent => "%",
            Unit::Pt => "pt",
            Unit::Px => "px",
            Unit::Mm => "mm",
        }
    }

    /// Post-conversion scale applied to the whole coordinate space.
    fn scale_factor(self) -> f32 {
        match self {
            Unit::Mm => 100.0,
            _ => 1.0,
        }
    }
}

/// The unit assumed for the whole document.
///
/// Mixing units cannot be represented in a single scalar coordinate
/// space, so the first unit seen wins and any other is a hard error.
#[derive(Clone, Copy, Default, Debug)]
pub(crate) struct AssumedUnits(Option<&'static str>);

impl AssumedUnits {
    fn check(&mut self, unit: Unit) -> Result<(), Error> {
        let found = unit.abbreviation();
        match self.0 {
            None => {
                self.0 = Some(found);
                Ok(())
            }
            Some(assumed) if assumed == found => Ok(()),
            Some(assumed) => Err(Error::MixedUnits { assumed, found }),
        }
    }
}

/// Parses a length literal like `12`, `14pt`, `50%`, `0.5mm`.
///
/// - `%` divides by 100;
/// - `pt` converts via `v * density + 0.5`;
/// - `mm` scales the value by 100;
/// - a bare number and `px` pass through.
///
/// Returns `Ok(None)` when the numeric part is malformed; the caller
/// decides the fallback. Mixed units across the document are fatal.
pub(crate) fn parse_length(
    text: &str,
    units: &mut AssumedUnits,
    density: f32,
) -> Result<Option<f32>, Error> {
    let text = text.trim();

    let unit = Unit::detect(text);
    let number = match unit {
        Some(Unit::Percent) => &text[..text.len() - 1],
        Some(_) => &text[..text.len() - 2],
        None => text,
    };

    let mut s = Stream::from(number);
    let n = match s.parse_number() {
        Ok(n) => n,
        Err(_) => return Ok(None),
    };

    // An unrecognized suffix is not a length.
    if !s.at_end() {
        return Ok(None);
    }

    let n = match unit {
        Some(unit) => {
            units.check(unit)?;

            let n = match unit {
                Unit::Percent => n / 100.0,
                Unit::Pt => n * density + 0.5,
                _ => n,
            };

            n * unit.scale_factor()
        }
        None => n,
    };

    Ok(Some(n))
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test {
        ($name:ident, $text:expr, $result:expr) => (
            #[test]
            fn $name() {
                let mut units = AssumedUnits::default();
                assert_eq!(parse_length($text, &mut units, 1.0).unwrap(), $result);
            }
        )
    }

    test!(parse_1, "10", Some(10.0));
    test!(parse_2, "10px", Some(10.0));
    test!(parse_3, "50%", Some(0.5));
    test!(parse_4, "10pt", Some(10.5));
    test!(parse_5, "2mm", Some(200.0));
    test!(parse_6, " 10 ", Some(10.0));
    test!(parse_7, "abc", None);
    test!(parse_8, "10zz", None);

    #[test]
    fn density_scales_pt() {
        let mut units = AssumedUnits::default();
        assert_eq!(parse_length("10pt", &mut units, 2.0).unwrap(), Some(20.5));
    }

    #[test]
    fn same_unit_twice() {
        let mut units = AssumedUnits::default();
        assert_eq!(parse_length("10px", &mut units, 1.0).unwrap(), Some(10.0));
        assert_eq!(parse_length("20px", &mut units, 1.0).unwrap(), Some(20.0));
    }

    #[test]
    fn mixed_units_fatal() {
        let mut units = AssumedUnits::default();
        parse_length("10px", &mut units, 1.0).unwrap();
        let err = parse_length("10pt", &mut units, 1.0).unwrap_err();
        assert_eq!(err.to_string(),
                   "mixed units: assumed 'px', found 'pt'");
    }

    #[test]
    fn bare_numbers_do_not_lock_units() {
        let mut units = AssumedUnits::default();
        parse_length("10", &mut units, 1.0).unwrap();
        assert_eq!(parse_length("10pt", &mut units, 1.0).unwrap(), Some(10.5));
    }
}
