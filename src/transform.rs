// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::geom::Transform;
use crate::numbers::NumberListParser;

/// Parses a `transform` attribute value.
///
/// Unlike a general `<transform-list>` parser, functions compose in a fixed
/// precedence regardless of their textual order:
///
/// 1. `matrix` - recognized only as the value's prefix, sets the base matrix;
/// 2. `scale` - composed after the current matrix;
/// 3. `skewX`/`skewY` - composed before the current matrix;
/// 4. `rotate` - composed before the current matrix, optional pivot;
/// 5. `translate` - composed after the current matrix.
///
/// Each function contributes at most once. Unknown functions are ignored.
///
/// Skew angles are degrees and are converted to radians before the
/// tangent is taken. Interpreters that feed the raw degree value to
/// `tan` produce a different shear for the same input.
///
/// Returns `None` when no recognized function was found, so callers can skip
/// the save/restore bookkeeping entirely.
pub(crate) fn parse_transform(text: &str) -> Option<Transform> {
    let mut ts = Transform::default();
    let mut transformed = false;

    if let Some(tail) = text.strip_prefix("matrix(") {
        let args: Vec<f32> = NumberListParser::from(tail).collect();
        if args.len() == 6 {
            ts = Transform::new(args[0], args[1], args[2], args[3], args[4], args[5]);
            transformed = true;
        }
    }

    if let Some(args) = read_args(text, "scale") {
        let sx = args[0];
        let sy = if args.len() > 1 { args[1] } else { sx };
        ts = ts.post_concat(&Transform::new_scale(sx, sy));
        transformed = true;
    }

    if let Some(args) = read_args(text, "skewX") {
        let c = args[0].to_radians().tan();
        ts = ts.pre_concat(&Transform::new(1.0, 0.0, c, 1.0, 0.0, 0.0));
        transformed = true;
    }

    if let Some(args) = read_args(text, "skewY") {
        let b = args[0].to_radians().tan();
        ts = ts.pre_concat(&Transform::new(1.0, b, 0.0, 1.0, 0.0, 0.0));
        transformed = true;
    }

    if let Some(args) = read_args(text, "rotate") {
        let angle = args[0];
        let rotate = if args.len() > 2 {
            Transform::new_rotate_at(angle, args[1], args[2])
        } else {
            Transform::new_rotate(angle)
        };
        ts = ts.pre_concat(&rotate);
        transformed = true;
    }

    if let Some(args) = read_args(text, "translate") {
        let tx = args[0];
        let ty = if args.len() > 1 { args[1] } else { 0.0 };
        ts = ts.post_concat(&Transform::new_translate(tx, ty));
        transformed = true;
    }

    if transformed {
        Some(ts)
    } else {
        None
    }
}

/// Locates `name(args)` anywhere in the value and parses its arguments.
fn read_args(text: &str, name: &str) -> Option<Vec<f32>> {
    let start = find_function(text, name)?;
    let tail = &text[start + name.len() + 1..];
    let end = tail.find(')')?;

    let args: Vec<f32> = NumberListParser::from(&tail[..end]).collect();
    if args.is_empty() {
        None
    } else {
        Some(args)
    }
}

fn find_function(text: &str, name: &str) -> Option<usize> {
    let mut search = 0;
    while let Some(i) = text[search..].find(name) {
        let i = search + i;
        if text[i + name.len()..].starts_with('(') {
            return Some(i);
        }
        search = i + name.len();
    }
    None
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test {
        ($name:ident, $text:expr, $result:expr) => (
            #[test]
            fn $name() {
                let ts = parse_transform($text).unwrap();
                let s = format!("matrix({} {} {} {} {} {})", ts.a, ts.b, ts.c, ts.d, ts.e, ts.f);
                assert_eq!(s, $result);
            }
        )
    }

    test!(parse_1,
        "matrix(1 0 0 1 10 20)",
        "matrix(1 0 0 1 10 20)"
    );

    test!(parse_2,
        "translate(10 20)",
        "matrix(1 0 0 1 10 20)"
    );

    test!(parse_3,
        "translate(10)",
        "matrix(1 0 0 1 10 0)"
    );

    test!(parse_4,
        "scale(2)",
        "matrix(2 0 0 2 0 0)"
    );

    test!(parse_5,
        "scale(2 3)",
        "matrix(2 0 0 3 0 0)"
    );

    #[test]
    fn parse_6() {
        let ts = parse_transform("rotate(90)").unwrap();
        let (x, y) = ts.map_point(1.0, 0.0);
        assert!(x.abs() < 1e-4);
        assert!((y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn parse_rotate_pivot() {
        let ts = parse_transform("rotate(90 10 10)").unwrap();
        let (x, y) = ts.map_point(10.0, 10.0);
        assert!((x - 10.0).abs() < 1e-4);
        assert!((y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn parse_fixed_precedence() {
        // translate composes last no matter where it appears
        let a = parse_transform("translate(10 20) scale(2)").unwrap();
        let b = parse_transform("scale(2) translate(10 20)").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.map_point(1.0, 1.0), (12.0, 22.0));
    }

    #[test]
    fn parse_matrix_prefix_only() {
        // matrix not at the start of the value is ignored
        assert_eq!(parse_transform(" matrix(2 0 0 2 0 0)"), None);
    }

    #[test]
    fn parse_none() {
        assert_eq!(parse_transform(""), None);
        assert_eq!(parse_transform("frobnicate(1 2)"), None);
    }

    #[test]
    fn parse_unknown_ignored() {
        let ts = parse_transform("frobnicate(3) translate(10 0)").unwrap();
        assert_eq!(ts, Transform::new_translate(10.0, 0.0));
    }
}
