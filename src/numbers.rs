// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::stream::Stream;

/// A pull-based `<list-of-numbers>` parser.
///
/// Numbers can be separated by spaces, commas, or nothing at all when
/// the sign of the next number makes the split unambiguous:
/// `1.5-2.3e-1,4` lexes as three numbers.
///
/// Stops on a first invalid character without consuming it, so trailing
/// garbage only truncates the list.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct NumberListParser<'a>(Stream<'a>);

impl<'a> From<&'a str> for NumberListParser<'a> {
    #[inline]
    fn from(v: &'a str) -> Self {
        NumberListParser(Stream::from(v))
    }
}

impl<'a> Iterator for NumberListParser<'a> {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.at_end() {
            None
        } else {
            self.0.parse_list_number().ok()
        }
    }
}

/// A pull-based `<list-of-points>` parser.
///
/// Use it for the `points` attribute of the `polygon` and `polyline` elements.
///
/// An odd trailing coordinate is ignored.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct PointsParser<'a>(Stream<'a>);

impl<'a> From<&'a str> for PointsParser<'a> {
    #[inline]
    fn from(v: &'a str) -> Self {
        PointsParser(Stream::from(v))
    }
}

impl<'a> Iterator for PointsParser<'a> {
    type Item = (f32, f32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.at_end() {
            None
        } else {
            let x = match self.0.parse_list_number() {
                Ok(x) => x,
                Err(_) => return None,
            };

            let y = match self.0.parse_list_number() {
                Ok(y) => y,
                Err(_) => return None,
            };

            Some((x, y))
        }
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_list_1() {
        let list: Vec<f32> = NumberListParser::from("1.5-2.3e-1,4").collect();
        assert_eq!(list, vec![1.5, -0.23, 4.0]);
    }

    #[test]
    fn number_list_2() {
        let list: Vec<f32> = NumberListParser::from("10, 20 30").collect();
        assert_eq!(list, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn number_list_3() {
        // stops at the first invalid character
        let list: Vec<f32> = NumberListParser::from("1 2 L 3").collect();
        assert_eq!(list, vec![1.0, 2.0]);
    }

    #[test]
    fn number_list_4() {
        let list: Vec<f32> = NumberListParser::from("").collect();
        assert_eq!(list, Vec::<f32>::new());
    }

    #[test]
    fn points_1() {
        let mut parser = PointsParser::from("10 20 30 40");
        assert_eq!(parser.next().unwrap(), (10.0, 20.0));
        assert_eq!(parser.next().unwrap(), (30.0, 40.0));
        assert!(parser.next().is_none());
    }

    #[test]
    fn points_2() {
        let mut parser = PointsParser::from("10 20 30 40 50");
        assert_eq!(parser.next().unwrap(), (10.0, 20.0));
        assert_eq!(parser.next().unwrap(), (30.0, 40.0));
        assert!(parser.next().is_none());
    }
}
