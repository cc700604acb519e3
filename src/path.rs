// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::arc;
use crate::stream::{Error, Stream};
use crate::tree::Path;

/// The interpreter's pen state.
#[derive(Clone, Copy, Default, Debug)]
struct State {
    last_x: f32,
    last_y: f32,
    // the last control point, for smooth-curve reflection
    last_x1: f32,
    last_y1: f32,
    sub_x: f32,
    sub_y: f32,
}

/// Interprets path data into absolute segments.
///
/// Commands repeat implicitly when coordinates follow them; a number
/// after `M`/`m` continues as `L`/`l`. Malformed input truncates the
/// path at the last complete command instead of failing the document.
pub(crate) fn convert_path(text: &str) -> Path {
    let mut p = Path::default();
    let mut st = State::default();
    let mut s = Stream::from(text);
    let mut prev_cmd = 0u8;

    s.skip_spaces();
    while !s.at_end() {
        let mut cmd = s.curr_byte_unchecked();
        match cmd {
            b'-' | b'+' | b'.' | b'0'..=b'9' => {
                if prev_cmd == b'M' || prev_cmd == b'm' {
                    // subsequent coordinate pairs are implicit line-tos
                    cmd = prev_cmd - 1;
                } else if matches!(
                    prev_cmd.to_ascii_lowercase(),
                    b'l' | b'h' | b'v' | b'c' | b's' | b'q' | b't' | b'a'
                ) {
                    cmd = prev_cmd;
                } else {
                    s.advance(1);
                    prev_cmd = cmd;
                }
            }
            _ => {
                s.advance(1);
                prev_cmd = cmd;
            }
        }

        if parse_segment(&mut s, cmd, &mut st, &mut p).is_err() {
            // keep everything up to the last complete command
            break;
        }

        s.skip_spaces();
    }

    p
}

fn parse_segment(s: &mut Stream, cmd: u8, st: &mut State, p: &mut Path) -> Result<(), Error> {
    let mut was_curve = false;

    match cmd {
        b'M' | b'm' => {
            let x = s.parse_list_number()?;
            let y = s.parse_list_number()?;
            if cmd == b'm' {
                st.sub_x += x;
                st.sub_y += y;
                st.last_x += x;
                st.last_y += y;
            } else {
                st.sub_x = x;
                st.sub_y = y;
                st.last_x = x;
                st.last_y = y;
            }
            p.move_to(st.last_x, st.last_y);
        }
        b'Z' | b'z' => {
            p.close();
            p.move_to(st.sub_x, st.sub_y);
            st.last_x = st.sub_x;
            st.last_y = st.sub_y;
            st.last_x1 = st.sub_x;
            st.last_y1 = st.sub_y;
            was_curve = true;
        }
        b'L' | b'l' => {
            let mut x = s.parse_list_number()?;
            let mut y = s.parse_list_number()?;
            if cmd == b'l' {
                x += st.last_x;
                y += st.last_y;
            }
            p.line_to(x, y);
            st.last_x = x;
            st.last_y = y;
        }
        b'H' | b'h' => {
            let mut x = s.parse_list_number()?;
            if cmd == b'h' {
                x += st.last_x;
            }
            p.line_to(x, st.last_y);
            st.last_x = x;
        }
        b'V' | b'v' => {
            let mut y = s.parse_list_number()?;
            if cmd == b'v' {
                y += st.last_y;
            }
            p.line_to(st.last_x, y);
            st.last_y = y;
        }
        b'C' | b'c' => {
            was_curve = true;
            let mut x1 = s.parse_list_number()?;
            let mut y1 = s.parse_list_number()?;
            let mut x2 = s.parse_list_number()?;
            let mut y2 = s.parse_list_number()?;
            let mut x = s.parse_list_number()?;
            let mut y = s.parse_list_number()?;
            if cmd == b'c' {
                x1 += st.last_x;
                y1 += st.last_y;
                x2 += st.last_x;
                y2 += st.last_y;
                x += st.last_x;
                y += st.last_y;
            }
            p.cubic_to(x1, y1, x2, y2, x, y);
            st.last_x1 = x2;
            st.last_y1 = y2;
            st.last_x = x;
            st.last_y = y;
        }
        b'S' | b's' => {
            was_curve = true;
            let mut x2 = s.parse_list_number()?;
            let mut y2 = s.parse_list_number()?;
            let mut x = s.parse_list_number()?;
            let mut y = s.parse_list_number()?;
            if cmd == b's' {
                x2 += st.last_x;
                y2 += st.last_y;
                x += st.last_x;
                y += st.last_y;
            }
            // reflect the previous control point over the pen
            let x1 = 2.0 * st.last_x - st.last_x1;
            let y1 = 2.0 * st.last_y - st.last_y1;
            p.cubic_to(x1, y1, x2, y2, x, y);
            st.last_x1 = x2;
            st.last_y1 = y2;
            st.last_x = x;
            st.last_y = y;
        }
        b'Q' | b'q' => {
            was_curve = true;
            let mut x1 = s.parse_list_number()?;
            let mut y1 = s.parse_list_number()?;
            let mut x = s.parse_list_number()?;
            let mut y = s.parse_list_number()?;
            if cmd == b'q' {
                x1 += st.last_x;
                y1 += st.last_y;
                x += st.last_x;
                y += st.last_y;
            }
            p.quad_to(x1, y1, x, y);
            st.last_x1 = x1;
            st.last_y1 = y1;
            st.last_x = x;
            st.last_y = y;
        }
        b'T' | b't' => {
            // Smooth quadratic continuation is not implemented. Its
            // coordinates are still consumed so that interpretation
            // can go on; the pen does not move.
            let _ = s.parse_list_number()?;
            let _ = s.parse_list_number()?;
            log::warn!("smooth quadratic path segments are not supported, skipped");
        }
        b'A' | b'a' => {
            let rx = s.parse_list_number()?;
            let ry = s.parse_list_number()?;
            let theta = s.parse_list_number()?;
            let large_arc = parse_flag(s)?;
            let sweep_arc = parse_flag(s)?;
            let mut x = s.parse_list_number()?;
            let mut y = s.parse_list_number()?;
            if cmd == b'a' {
                x += st.last_x;
                y += st.last_y;
            }
            arc::append_arc(
                p, st.last_x, st.last_y, x, y, rx, ry, theta, large_arc, sweep_arc,
            );
            st.last_x = x;
            st.last_y = y;
        }
        _ => {
            log::warn!("invalid path command: {}", cmd as char);
        }
    }

    if !was_curve {
        st.last_x1 = st.last_x;
        st.last_y1 = st.last_y;
    }

    Ok(())
}

fn parse_flag(s: &mut Stream) -> Result<bool, Error> {
    s.skip_spaces();

    let c = s.curr_byte()?;
    match c {
        b'0' | b'1' => {
            s.advance(1);
            if s.is_curr_byte_eq(b',') {
                s.advance(1);
            }
            s.skip_spaces();
            Ok(c == b'1')
        }
        _ => Err(Error::UnexpectedEndOfStream),
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::PathSegment;

    fn seg_move(x: f32, y: f32) -> PathSegment { PathSegment::MoveTo { x, y } }
    fn seg_line(x: f32, y: f32) -> PathSegment { PathSegment::LineTo { x, y } }

    macro_rules! test {
        ($name:ident, $text:expr, $( $seg:expr ),*) => (
            #[test]
            fn $name() {
                let p = convert_path($text);
                let expected = vec![$( $seg ),*];
                assert_eq!(p.segments, expected);
            }
        )
    }

    test!(move_and_line, "M10,10L20,20",
        seg_move(10.0, 10.0),
        seg_line(20.0, 20.0)
    );

    test!(implicit_line_after_move, "M10 10 20 20 30 30",
        seg_move(10.0, 10.0),
        seg_line(20.0, 20.0),
        seg_line(30.0, 30.0)
    );

    test!(relative_move_degrades_to_relative_line, "m10 10 10 0",
        seg_move(10.0, 10.0),
        seg_line(20.0, 10.0)
    );

    test!(implicit_command_repetition, "M0 0L10 0 10 10",
        seg_move(0.0, 0.0),
        seg_line(10.0, 0.0),
        seg_line(10.0, 10.0)
    );

    test!(run_together_numbers, "M10-20l5.5.5",
        seg_move(10.0, -20.0),
        seg_line(15.5, -19.5)
    );

    test!(hv_and_close, "M0 0H10V10Z",
        seg_move(0.0, 0.0),
        seg_line(10.0, 0.0),
        seg_line(10.0, 10.0),
        PathSegment::ClosePath,
        seg_move(0.0, 0.0)
    );

    test!(cubic_and_smooth_reflection, "M0 0C0 10 10 10 10 0S20 -10 20 0",
        seg_move(0.0, 0.0),
        PathSegment::CubicTo { x1: 0.0, y1: 10.0, x2: 10.0, y2: 10.0, x: 10.0, y: 0.0 },
        PathSegment::CubicTo { x1: 10.0, y1: -10.0, x2: 20.0, y2: -10.0, x: 20.0, y: 0.0 }
    );

    test!(smooth_after_non_curve_degenerates, "M0 0L10 0S20 10 30 0",
        seg_move(0.0, 0.0),
        seg_line(10.0, 0.0),
        // no control point to reflect: it collapses onto the pen
        PathSegment::CubicTo { x1: 10.0, y1: 0.0, x2: 20.0, y2: 10.0, x: 30.0, y: 0.0 }
    );

    test!(quadratic, "M0 0Q5 10 10 0",
        seg_move(0.0, 0.0),
        PathSegment::QuadTo { x1: 5.0, y1: 10.0, x: 10.0, y: 0.0 }
    );

    test!(smooth_quadratic_is_skipped, "M0 0t10 10l5 5",
        seg_move(0.0, 0.0),
        // t consumed its pair but moved nothing
        seg_line(5.0, 5.0)
    );

    test!(close_resets_reflection_base, "M0 0C0 10 10 10 10 0ZS20 10 30 0",
        seg_move(0.0, 0.0),
        PathSegment::CubicTo { x1: 0.0, y1: 10.0, x2: 10.0, y2: 10.0, x: 10.0, y: 0.0 },
        PathSegment::ClosePath,
        seg_move(0.0, 0.0),
        PathSegment::CubicTo { x1: 0.0, y1: 0.0, x2: 20.0, y2: 10.0, x: 30.0, y: 0.0 }
    );

    test!(truncates_at_last_complete_command, "M10 20L30 40L50",
        seg_move(10.0, 20.0),
        seg_line(30.0, 40.0)
    );

    test!(empty, "",);

    #[test]
    fn arc_command_delegates() {
        let p = convert_path("M0 0A5 5 0 0 1 10 0");
        assert_eq!(p.segments.len(), 2);
        assert!(matches!(p.segments[1], PathSegment::Arc { .. }));
    }

    #[test]
    fn arc_flags_without_separators() {
        let p = convert_path("M0 0a5,5 0 0,1 10,0");
        assert_eq!(p.segments.len(), 2);
    }
}
