// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use crate::color::Color;
use crate::geom::{BBox, Point, Rect, Transform};

/// A parsed, fully resolved document.
///
/// All cascading is already applied: every draw operation carries its own
/// paints and the accumulated transform. A backend replays `ops` in order
/// without keeping any interpreter state of its own.
#[derive(Debug)]
pub struct Scene {
    /// The declared canvas width, ceiled.
    pub width: u32,
    /// The declared canvas height, ceiled.
    pub height: u32,
    /// Draw operations in document order.
    pub ops: Vec<DrawOp>,
    /// The rectangle captured from the conventional `bounds` layer, if any.
    pub bounds: Option<Rect>,
    /// The tight bounding box of everything drawn, in canvas coordinates.
    ///
    /// `None` when nothing was drawn.
    pub limits: Option<Rect>,
    /// Resolved gradients, addressed by `ShaderRef::id`.
    pub gradients: HashMap<String, Gradient>,
}

/// A single draw operation.
#[derive(Clone, Debug)]
pub enum DrawOp {
    Rect(RectElement),
    Line(LineElement),
    Ellipse(EllipseElement),
    Polygon(PolygonElement),
    Path(PathElement),
    Text(TextElement),
    GroupBegin(GroupElement),
    GroupEnd,
}

/// A rectangle, optionally with rounded corners.
#[derive(Clone, Debug)]
pub struct RectElement {
    pub id: Option<String>,
    pub transform: Transform,
    pub rect: Rect,
    /// Corner radii. `(0, 0)` for a sharp rectangle.
    pub radii: (f32, f32),
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
}

#[derive(Clone, Debug)]
pub struct LineElement {
    pub id: Option<String>,
    pub transform: Transform,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub stroke: Paint,
}

/// A circle or an ellipse, defined by its enclosing rectangle.
#[derive(Clone, Debug)]
pub struct EllipseElement {
    pub id: Option<String>,
    pub transform: Transform,
    pub rect: Rect,
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
}

/// A polygon or a polyline.
#[derive(Clone, Debug)]
pub struct PolygonElement {
    pub id: Option<String>,
    pub transform: Transform,
    pub points: Vec<Point>,
    /// `true` for `polygon`, `false` for `polyline`.
    pub closed: bool,
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
}

#[derive(Clone, Debug)]
pub struct PathElement {
    pub id: Option<String>,
    pub transform: Transform,
    pub path: Path,
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
}

/// A run of text anchored at a point.
#[derive(Clone, Debug)]
pub struct TextElement {
    pub id: Option<String>,
    pub transform: Transform,
    /// The anchor point, after any alignment correction.
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub font: Font,
    pub anchor: Option<TextAnchor>,
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
}

/// Opens a group scope. Always paired with a later `DrawOp::GroupEnd`.
#[derive(Clone, Debug)]
pub struct GroupElement {
    pub id: Option<String>,
    /// When set, the whole group composites through an offscreen layer
    /// with this alpha. The rectangle is the full canvas mapped back
    /// through the group's matrix.
    pub opacity_layer: Option<(Rect, u8)>,
}

/// A resolved paint, used for both filling and stroking.
///
/// Stroke-only fields are meaningless on fill paints.
#[derive(Clone, PartialEq, Debug)]
pub struct Paint {
    pub color: Color,
    pub shader: Option<ShaderRef>,
    pub stroke_width: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub dash: Option<Dash>,
}

impl Default for Paint {
    fn default() -> Self {
        Paint {
            color: Color::black(),
            shader: None,
            stroke_width: 0.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            dash: None,
        }
    }
}

/// A reference to a gradient in `Scene::gradients`.
#[derive(Clone, PartialEq, Debug)]
pub struct ShaderRef {
    pub id: String,
    /// The gradient's matrix, already combined with the element's
    /// bounding box for `objectBoundingBox` gradients.
    pub matrix: Transform,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

/// A stroke dash pattern.
#[derive(Clone, PartialEq, Debug)]
pub struct Dash {
    /// Alternating on/off interval lengths. Always an even count.
    pub intervals: Vec<f32>,
    pub offset: f32,
}

/// A resolved gradient definition.
#[derive(Clone, Debug)]
pub struct Gradient {
    pub kind: GradientKind,
    pub stops: Vec<Stop>,
    pub spread: SpreadMethod,
    /// `true` when coordinates are fractions of the element's bounding box.
    pub bounding_box: bool,
    pub matrix: Option<Transform>,
}

#[derive(Clone, Copy, Debug)]
pub enum GradientKind {
    Linear { x1: f32, y1: f32, x2: f32, y2: f32 },
    Radial { cx: f32, cy: f32, r: f32 },
}

/// A gradient stop. `stop-opacity` is folded into the color's alpha.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Stop {
    pub offset: f32,
    pub color: Color,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpreadMethod {
    Pad,
    Reflect,
    Repeat,
}

impl Default for SpreadMethod {
    fn default() -> Self {
        SpreadMethod::Pad
    }
}

/// A font request. Resolution against actual font files is the backend's job.
#[derive(Clone, PartialEq, Debug)]
pub struct Font {
    pub family: Option<String>,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            family: None,
            size: 12.0,
            bold: false,
            italic: false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

/// A path segment. All coordinates are absolute.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PathSegment {
    MoveTo {
        x: f32,
        y: f32,
    },
    LineTo {
        x: f32,
        y: f32,
    },
    QuadTo {
        x1: f32,
        y1: f32,
        x: f32,
        y: f32,
    },
    CubicTo {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x: f32,
        y: f32,
    },
    /// An axis-aligned ellipse arc over `rect`, in degrees.
    ///
    /// A rotated arc carries the `translate * rotate` wrapper transform
    /// and its `rect` is centered on the origin.
    Arc {
        rect: Rect,
        start_angle: f32,
        sweep_angle: f32,
        transform: Option<Transform>,
    },
    ClosePath,
}

/// An interpreted path.
#[derive(Clone, Default, Debug)]
pub struct Path {
    pub segments: Vec<PathSegment>,
}

impl Path {
    #[inline]
    pub(crate) fn move_to(&mut self, x: f32, y: f32) {
        self.segments.push(PathSegment::MoveTo { x, y });
    }

    #[inline]
    pub(crate) fn line_to(&mut self, x: f32, y: f32) {
        self.segments.push(PathSegment::LineTo { x, y });
    }

    #[inline]
    pub(crate) fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.segments.push(PathSegment::QuadTo { x1, y1, x, y });
    }

    #[inline]
    pub(crate) fn cubic_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.segments
            .push(PathSegment::CubicTo { x1, y1, x2, y2, x, y });
    }

    #[inline]
    pub(crate) fn close(&mut self) {
        self.segments.push(PathSegment::ClosePath);
    }

    /// The control-point bounding box in local coordinates.
    ///
    /// An empty path has a zero rectangle at the origin, matching the
    /// canvas API this model is drawn with.
    pub fn bounds(&self) -> Rect {
        let mut bbox = BBox::default();

        for seg in &self.segments {
            match *seg {
                PathSegment::MoveTo { x, y } | PathSegment::LineTo { x, y } => {
                    bbox.add_point(x, y);
                }
                PathSegment::QuadTo { x1, y1, x, y } => {
                    bbox.add_point(x1, y1);
                    bbox.add_point(x, y);
                }
                PathSegment::CubicTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    bbox.add_point(x1, y1);
                    bbox.add_point(x2, y2);
                    bbox.add_point(x, y);
                }
                PathSegment::Arc {
                    rect, transform, ..
                } => {
                    let rect = match transform {
                        Some(ts) => ts.map_rect(rect),
                        None => rect,
                    };
                    bbox.add_point(rect.left, rect.top);
                    bbox.add_point(rect.right, rect.bottom);
                }
                PathSegment::ClosePath => {}
            }
        }

        bbox.to_rect()
            .unwrap_or_else(|| Rect::new(0.0, 0.0, 0.0, 0.0))
    }
}
