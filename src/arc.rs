// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::geom::{Rect, Transform};
use crate::tree::{Path, PathSegment};

/// Converts an endpoint-parameterized elliptical arc into a center-
/// parameterized sweep and appends it to the path.
///
/// Follows the W3C endpoint-to-center conversion with two twists:
///
/// - the radii-too-small check scales `lambda` by `1.001` so that
///   floating-point noise on exact semicircles does not shrink the arc;
/// - a rotated arc is emitted as an origin-centered axis-aligned sweep
///   carrying a `translate * rotate` wrapper transform, because the
///   target primitive draws only axis-aligned arcs.
#[allow(clippy::too_many_arguments)]
pub(crate) fn append_arc(
    p: &mut Path,
    last_x: f32,
    last_y: f32,
    x: f32,
    y: f32,
    mut rx: f32,
    mut ry: f32,
    theta: f32,
    large_arc: bool,
    sweep_arc: bool,
) {
    // A degenerate radius draws a plain line.
    if rx == 0.0 || ry == 0.0 {
        p.line_to(x, y);
        return;
    }

    // Coincident endpoints draw nothing.
    if x == last_x && y == last_y {
        return;
    }

    rx = rx.abs();
    ry = ry.abs();

    let thrad = theta.to_radians();
    let st = thrad.sin();
    let ct = thrad.cos();

    let xc = (last_x - x) / 2.0;
    let yc = (last_y - y) / 2.0;
    let x1t = ct * xc + st * yc;
    let y1t = -st * xc + ct * yc;

    let x1ts = x1t * x1t;
    let y1ts = y1t * y1t;
    let mut rxs = rx * rx;
    let mut rys = ry * ry;

    // Radii scale-up, with slack against rounding on exact semicircles.
    let lambda = (x1ts / rxs + y1ts / rys) * 1.001;
    if lambda > 1.0 {
        let lambdasr = lambda.sqrt();
        rx *= lambdasr;
        ry *= lambdasr;
        rxs = rx * rx;
        rys = ry * ry;
    }

    let r = ((rxs * rys - rxs * y1ts - rys * x1ts) / (rxs * y1ts + rys * x1ts)).sqrt()
        * if large_arc == sweep_arc { -1.0 } else { 1.0 };

    let cxt = r * rx * y1t / ry;
    let cyt = -r * ry * x1t / rx;
    let cx = ct * cxt - st * cyt + (last_x + x) / 2.0;
    let cy = st * cxt + ct * cyt + (last_y + y) / 2.0;

    let th1 = angle(1.0, 0.0, (x1t - cxt) / rx, (y1t - cyt) / ry);
    let mut dth = angle(
        (x1t - cxt) / rx,
        (y1t - cyt) / ry,
        (-x1t - cxt) / rx,
        (-y1t - cyt) / ry,
    );

    if sweep_arc && dth < 0.0 {
        dth += 360.0;
    } else if !sweep_arc && dth > 0.0 {
        dth -= 360.0;
    }

    if theta % 360.0 == 0.0 {
        p.segments.push(PathSegment::Arc {
            rect: Rect::new(cx - rx, cy - ry, cx + rx, cy + ry),
            start_angle: th1,
            sweep_angle: dth,
            transform: None,
        });
    } else {
        let ts = Transform::new_translate(cx, cy).pre_concat(&Transform::new_rotate(theta));
        p.segments.push(PathSegment::Arc {
            rect: Rect::new(-rx, -ry, rx, ry),
            start_angle: th1,
            sweep_angle: dth,
            transform: Some(ts),
        });
    }
}

/// The signed angle between the vectors `(x1, y1)` and `(x2, y2)`,
/// measured clockwise from the positive x axis, in `(-360, 360)` degrees.
fn angle(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    (x1.atan2(y1) - x2.atan2(y2)).to_degrees() % 360.0
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;

    fn arc(
        from: (f32, f32), to: (f32, f32),
        rx: f32, ry: f32, theta: f32,
        large_arc: bool, sweep_arc: bool,
    ) -> Vec<PathSegment> {
        let mut p = Path::default();
        append_arc(&mut p, from.0, from.1, to.0, to.1, rx, ry, theta, large_arc, sweep_arc);
        p.segments
    }

    #[test]
    fn zero_radius_is_a_line() {
        let segs = arc((0.0, 0.0), (10.0, 0.0), 0.0, 5.0, 0.0, false, false);
        assert_eq!(segs, vec![PathSegment::LineTo { x: 10.0, y: 0.0 }]);
    }

    #[test]
    fn coincident_endpoints_draw_nothing() {
        let segs = arc((10.0, 20.0), (10.0, 20.0), 5.0, 5.0, 0.0, false, false);
        assert!(segs.is_empty());
    }

    #[test]
    fn semicircle() {
        // A half circle from (0, 0) to (10, 0) with r=5: centered between
        // the endpoints, not shrunk by the radii check.
        let segs = arc((0.0, 0.0), (10.0, 0.0), 5.0, 5.0, 0.0, false, true);
        match segs[0] {
            PathSegment::Arc { rect, start_angle, sweep_angle, transform } => {
                // the 1.001 slack moves things a touch, hence the loose bounds
                assert!((rect.left - 0.0).abs() < 0.25);
                assert!((rect.top - -5.0).abs() < 0.25);
                assert!((rect.right - 10.0).abs() < 0.25);
                assert!((rect.bottom - 5.0).abs() < 0.25);
                assert!((start_angle.abs() - 180.0).abs() < 5.0);
                assert!((sweep_angle - 180.0).abs() < 5.0);
                assert_eq!(transform, None);
            }
            ref other => panic!("expected an arc, got {:?}", other),
        }
    }

    #[test]
    fn sweep_flag_flips_direction() {
        let pos = arc((0.0, 0.0), (10.0, 0.0), 5.0, 5.0, 0.0, false, true);
        let neg = arc((0.0, 0.0), (10.0, 0.0), 5.0, 5.0, 0.0, false, false);
        match (&pos[0], &neg[0]) {
            (
                PathSegment::Arc { sweep_angle: a, .. },
                PathSegment::Arc { sweep_angle: b, .. },
            ) => {
                assert!(*a > 0.0);
                assert!(*b < 0.0);
            }
            _ => panic!("expected arcs"),
        }
    }

    #[test]
    fn rotated_arc_carries_a_transform() {
        let segs = arc((0.0, 0.0), (10.0, 10.0), 8.0, 4.0, 30.0, false, true);
        match segs[0] {
            PathSegment::Arc { rect, transform, .. } => {
                // origin-centered rect, placement in the wrapper
                assert_eq!(rect.left, -rect.right);
                assert_eq!(rect.top, -rect.bottom);
                assert!(transform.is_some());
            }
            ref other => panic!("expected an arc, got {:?}", other),
        }
    }
}
