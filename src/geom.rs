// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// A 2D point.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Constructs a new point.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

/// A rectangle defined by its edges.
///
/// Can have a zero or negative size, just like the canvas rectangles
/// it is mapped to. Stored in local coordinates unless stated otherwise.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// Constructs a new rectangle from edges.
    #[inline]
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Rect {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Constructs a new rectangle from position and size.
    #[inline]
    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect::new(x, y, x + w, y + h)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// A 2D affine transform:
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    #[inline]
    fn default() -> Transform {
        Transform::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }
}

impl Transform {
    /// Constructs a new transform.
    #[inline]
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Transform { a, b, c, d, e, f }
    }

    /// Constructs a new translating transform.
    #[inline]
    pub fn new_translate(tx: f32, ty: f32) -> Self {
        Transform::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Constructs a new scaling transform.
    #[inline]
    pub fn new_scale(sx: f32, sy: f32) -> Self {
        Transform::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Constructs a new rotating transform. The angle is in degrees.
    pub fn new_rotate(angle: f32) -> Self {
        let v = angle.to_radians();
        let a = v.cos();
        let b = v.sin();
        Transform::new(a, b, -b, a, 0.0, 0.0)
    }

    /// Constructs a new rotating transform about the `(cx, cy)` pivot.
    pub fn new_rotate_at(angle: f32, cx: f32, cy: f32) -> Self {
        let mut ts = Transform::new_translate(cx, cy);
        ts = multiply(&ts, &Transform::new_rotate(angle));
        multiply(&ts, &Transform::new_translate(-cx, -cy))
    }

    /// Returns `self * other`, so that `other` is applied first.
    #[inline]
    pub fn pre_concat(&self, other: &Transform) -> Transform {
        multiply(self, other)
    }

    /// Returns `other * self`, so that `self` is applied first.
    #[inline]
    pub fn post_concat(&self, other: &Transform) -> Transform {
        multiply(other, self)
    }

    /// Maps a point through the transform.
    #[inline]
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Maps a rectangle through the transform.
    ///
    /// Returns the bounding box of the four mapped corners.
    pub fn map_rect(&self, r: Rect) -> Rect {
        let mut bbox = BBox::default();
        for &(x, y) in &[
            (r.left, r.top),
            (r.right, r.top),
            (r.right, r.bottom),
            (r.left, r.bottom),
        ] {
            let (x, y) = self.map_point(x, y);
            bbox.add_point(x, y);
        }

        Rect::new(bbox.left, bbox.top, bbox.right, bbox.bottom)
    }

    /// Returns an inverted transform, when invertible.
    pub fn invert(&self) -> Option<Transform> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f32::EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        Some(Transform::new(
            self.d * inv_det,
            -self.b * inv_det,
            -self.c * inv_det,
            self.a * inv_det,
            (self.c * self.f - self.d * self.e) * inv_det,
            (self.b * self.e - self.a * self.f) * inv_det,
        ))
    }
}

#[inline(never)]
pub(crate) fn multiply(ts1: &Transform, ts2: &Transform) -> Transform {
    Transform {
        a: ts1.a * ts2.a + ts1.c * ts2.b,
        b: ts1.b * ts2.a + ts1.d * ts2.b,
        c: ts1.a * ts2.c + ts1.c * ts2.d,
        d: ts1.b * ts2.c + ts1.d * ts2.d,
        e: ts1.a * ts2.e + ts1.c * ts2.f + ts1.e,
        f: ts1.b * ts2.e + ts1.d * ts2.f + ts1.f,
    }
}

/// A bounding box accumulator.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Default for BBox {
    fn default() -> Self {
        BBox {
            left: f32::MAX,
            top: f32::MAX,
            right: f32::MIN,
            bottom: f32::MIN,
        }
    }
}

impl BBox {
    pub fn add_point(&mut self, x: f32, y: f32) {
        self.left = self.left.min(x);
        self.top = self.top.min(y);
        self.right = self.right.max(x);
        self.bottom = self.bottom.max(y);
    }

    /// Converts into a `Rect`. Returns `None` when no points were added.
    pub fn to_rect(&self) -> Option<Rect> {
        if self.left > self.right || self.top > self.bottom {
            None
        } else {
            Some(Rect::new(self.left, self.top, self.right, self.bottom))
        }
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_order() {
        let t = Transform::new_translate(10.0, 0.0);
        let s = Transform::new_scale(2.0, 2.0);

        // scale first, then translate
        let ts = t.pre_concat(&s);
        assert_eq!(ts.map_point(1.0, 1.0), (12.0, 2.0));

        // translate first, then scale
        let ts = t.post_concat(&s);
        assert_eq!(ts.map_point(1.0, 1.0), (22.0, 2.0));
    }

    #[test]
    fn rotate_at_pivot() {
        let ts = Transform::new_rotate_at(90.0, 10.0, 10.0);
        let (x, y) = ts.map_point(10.0, 10.0);
        assert!((x - 10.0).abs() < 1e-4);
        assert!((y - 10.0).abs() < 1e-4);

        let (x, y) = ts.map_point(20.0, 10.0);
        assert!((x - 10.0).abs() < 1e-4);
        assert!((y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn invert_round_trip() {
        let ts = Transform::new(2.0, 0.0, 0.0, 4.0, 10.0, 20.0);
        let inv = ts.invert().unwrap();
        let (x, y) = inv.map_point(14.0, 28.0);
        assert_eq!((x, y), (2.0, 2.0));

        assert_eq!(Transform::new_scale(0.0, 1.0).invert(), None);
    }

    #[test]
    fn map_rect_rotated() {
        let ts = Transform::new_rotate(90.0);
        let r = ts.map_rect(Rect::new(0.0, 0.0, 10.0, 20.0));
        assert!((r.left - -20.0).abs() < 1e-4);
        assert!((r.top - 0.0).abs() < 1e-4);
        assert!((r.right - 0.0).abs() < 1e-4);
        assert!((r.bottom - 10.0).abs() < 1e-4);
    }
}
