// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use crate::geom::{BBox, Point, Rect, Transform};
use crate::numbers::{NumberListParser, PointsParser};
use crate::paint_server::{self, GradientBuilder};
use crate::path;
use crate::style::{self, Properties};
use crate::transform::parse_transform;
use crate::tree::{
    DrawOp, EllipseElement, Font, GroupElement, LineElement, Paint, PathElement, PolygonElement,
    RectElement, Scene, TextAnchor, TextElement,
};
use crate::units::{self, AssumedUnits};
use crate::{Error, Options, OptionLog};

/// The interpreter state threaded through the document walk.
///
/// Paint state follows the copy-on-push rule: a group saves clones of
/// the current paints and restores them when it closes, so elements
/// mutate their own scope only.
pub(crate) struct Context<'a> {
    pub(crate) opt: &'a Options,
    pub(crate) fill: Paint,
    pub(crate) stroke: Paint,
    pub(crate) fill_set: bool,
    pub(crate) stroke_set: bool,
    pub(crate) units: AssumedUnits,
    pub(crate) gradients: HashMap<String, GradientBuilder>,

    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
    bounds: Option<Rect>,
    limits: BBox,
    matrix: Vec<Transform>,
    defs: HashMap<String, String>,
    in_defs: bool,
    hidden: bool,
    hidden_level: u32,
    bounds_mode: bool,
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum HAlign {
    Center,
    Right,
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum VAlign {
    Top,
    Middle,
}

/// The style and position a `tspan` inherits from its enclosing text.
struct TextContext {
    x: f32,
    y: f32,
    fill: Option<Paint>,
    stroke: Option<Paint>,
    font: Font,
    anchor: Option<TextAnchor>,
    halign: Option<HAlign>,
    valign: Option<VAlign>,
}

pub(crate) fn convert_doc(doc: &roxmltree::Document, opt: &Options) -> Result<Scene, Error> {
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        log::warn!("the root element is not svg: {}", root.tag_name().name());
    }

    let mut ctx = Context {
        opt,
        fill: Paint::default(),
        stroke: Paint::default(),
        fill_set: false,
        stroke_set: false,
        units: AssumedUnits::default(),
        gradients: HashMap::new(),
        width: 0,
        height: 0,
        ops: Vec::new(),
        bounds: None,
        limits: BBox::default(),
        matrix: vec![Transform::default()],
        defs: HashMap::new(),
        in_defs: false,
        hidden: false,
        hidden_level: 0,
        bounds_mode: false,
    };

    ctx.convert_element(root)?;

    let gradients = ctx
        .gradients
        .iter()
        .filter(|(_, g)| g.resolved)
        .map(|(id, g)| (id.clone(), g.to_gradient()))
        .collect();

    Ok(Scene {
        width: ctx.width,
        height: ctx.height,
        ops: ctx.ops,
        bounds: ctx.bounds,
        limits: ctx.limits.to_rect(),
        gradients,
    })
}

impl<'a> Context<'a> {
    fn convert_element(&mut self, node: roxmltree::Node) -> Result<(), Error> {
        if !node.is_element() {
            return Ok(());
        }

        if self.bounds_mode {
            return self.convert_bounds_element(node);
        }

        // every element starts fully opaque; opacity attributes re-apply
        self.fill.color.alpha = 255;
        self.stroke.color.alpha = 255;

        let forced_hidden = node
            .attribute("id")
            .and_then(|id| self.opt.id_colors.get(id))
            .map(|c| c.alpha == 0)
            .unwrap_or(false);
        let hidden = self.hidden || forced_hidden;

        let mut tag = node.tag_name().name();
        if !hidden && tag == "use" {
            // a use element is interpreted as a path with an href
            tag = "path";
        }

        match tag {
            "svg" => self.convert_svg(node)?,
            "defs" => {
                self.in_defs = true;
                for child in node.children() {
                    self.convert_element(child)?;
                }
                // stops are known now; resolve forward references
                paint_server::resolve(&mut self.gradients);
                self.in_defs = false;
            }
            "linearGradient" | "radialGradient" => {
                if let Some(id) = node.attribute("id") {
                    let g =
                        paint_server::convert_gradient(node, &mut self.units, self.opt.density)?;
                    self.gradients.insert(id.to_string(), g);
                }
            }
            // parsed by its enclosing gradient
            "stop" => {}
            // skipped entirely, children included
            "metadata" => {}
            "g" => self.convert_group(node, forced_hidden)?,
            "rect" if !hidden => self.convert_rect(node)?,
            "line" if !hidden => self.convert_line(node)?,
            "circle" | "ellipse" if !hidden => self.convert_ellipse(node, tag == "circle")?,
            "polygon" | "polyline" if !hidden => self.convert_poly(node, tag == "polygon")?,
            "path" if !hidden => self.convert_path_element(node)?,
            "text" if !hidden => self.convert_text(node, None)?,
            _ => {
                if !hidden {
                    log::debug!("unrecognized element: {}", tag);
                }
                for child in node.children() {
                    self.convert_element(child)?;
                }
            }
        }

        Ok(())
    }

    /// Inside the `bounds` layer nothing is drawn; rects set the bounds.
    fn convert_bounds_element(&mut self, node: roxmltree::Node) -> Result<(), Error> {
        if node.tag_name().name() == "rect" {
            let x = self.attr_length(node, "x")?.unwrap_or(0.0);
            let y = self.attr_length(node, "y")?.unwrap_or(0.0);
            let w = self.attr_length(node, "width")?;
            let h = self.attr_length(node, "height")?;
            if let (Some(w), Some(h)) = (w, h) {
                self.bounds = Some(Rect::from_xywh(x, y, w, h));
            }
        } else {
            for child in node.children() {
                self.convert_element(child)?;
            }
        }

        Ok(())
    }

    fn convert_svg(&mut self, node: roxmltree::Node) -> Result<(), Error> {
        // viewBox wins over width/height
        let mut size = None;
        if let Some(vb) = attr(node, "viewBox") {
            let coords: Vec<f32> = NumberListParser::from(vb).collect();
            if coords.len() == 4 {
                size = Some((coords[2], coords[3]));
            }
        }

        if size.is_none() {
            let w = self.attr_length(node, "width")?;
            let h = self.attr_length(node, "height")?;
            if let (Some(w), Some(h)) = (w, h) {
                size = Some((w, h));
            }
        }

        let (w, h) = size
            .log_none(|| log::warn!("svg without a usable size, assuming 100x100"))
            .unwrap_or((100.0, 100.0));
        self.width = w.ceil() as u32;
        self.height = h.ceil() as u32;

        for child in node.children() {
            self.convert_element(child)?;
        }

        // gradients can legally be declared outside defs
        paint_server::resolve(&mut self.gradients);

        Ok(())
    }

    fn convert_group(&mut self, node: roxmltree::Node, forced_hidden: bool) -> Result<(), Error> {
        // the conventional "bounds" layer carries metadata, not artwork
        let bounds_layer = node
            .attribute("id")
            .map(|id| id.eq_ignore_ascii_case("bounds"))
            .unwrap_or(false);
        if bounds_layer {
            self.bounds_mode = true;
            let mut res = Ok(());
            for child in node.children() {
                res = self.convert_element(child);
                if res.is_err() {
                    break;
                }
            }
            self.bounds_mode = false;
            return res;
        }

        let props = Properties::new(node);

        if self.hidden {
            self.hidden_level += 1;
        }
        if !self.hidden && (props.attr("display") == Some("none") || forced_hidden) {
            self.hidden = true;
            self.hidden_level = 1;
        }
        let hidden = self.hidden;

        if !hidden {
            let opacity_layer = self.group_opacity_layer(node, &props)?;
            self.ops.push(DrawOp::GroupBegin(GroupElement {
                id: node.attribute("id").map(|s| s.to_string()),
                opacity_layer,
            }));
        }

        let pushed = self.push_transform(node);

        // copy-on-push: children mutate copies, never the parent's paints
        let saved_fill = self.fill.clone();
        let saved_stroke = self.stroke.clone();
        let saved_fill_set = self.fill_set;
        let saved_stroke_set = self.stroke_set;

        let res = self.convert_group_children(node, &props);

        self.fill = saved_fill;
        self.stroke = saved_stroke;
        self.fill_set = saved_fill_set;
        self.stroke_set = saved_stroke_set;
        if pushed {
            self.matrix.pop();
        }

        if self.hidden {
            self.hidden_level -= 1;
            if self.hidden_level == 0 {
                self.hidden = false;
            }
        }

        if !hidden {
            self.ops.push(DrawOp::GroupEnd);
        }

        res
    }

    fn convert_group_children(
        &mut self,
        node: roxmltree::Node,
        props: &Properties,
    ) -> Result<(), Error> {
        style::resolve_fill(self, props, None)?;
        style::resolve_stroke(self, props)?;
        self.fill_set |= props.attr("fill").is_some();
        self.stroke_set |= props.attr("stroke").is_some();

        for child in node.children() {
            self.convert_element(child)?;
        }

        Ok(())
    }

    /// A translucent group composites through an offscreen layer covering
    /// the full canvas, mapped back through the group's matrix. An
    /// approximation of the group's extent, kept for output parity.
    fn group_opacity_layer(
        &mut self,
        node: roxmltree::Node,
        props: &Properties,
    ) -> Result<Option<(Rect, u8)>, Error> {
        // the attribute wins over the inline style here
        let opacity = match attr(node, "opacity") {
            Some(text) => units::parse_length(text, &mut self.units, self.opt.density)?,
            None => props.float("opacity", &mut self.units, self.opt.density)?,
        };

        let opacity = match opacity {
            Some(o) if o < 1.0 => o,
            _ => return Ok(None),
        };

        let canvas = Rect::from_xywh(0.0, 0.0, self.width as f32, self.height as f32);
        let rect = match self.total_transform().invert() {
            Some(inv) => inv.map_rect(canvas),
            None => canvas,
        };
        let alpha = (255.0 * crate::f32_bound(0.0, opacity, 1.0)) as u8;

        Ok(Some((rect, alpha)))
    }

    fn convert_rect(&mut self, node: roxmltree::Node) -> Result<(), Error> {
        let props = Properties::new(node);

        let x = self.attr_length(node, "x")?.unwrap_or(0.0);
        let y = self.attr_length(node, "y")?.unwrap_or(0.0);
        let w = match self.attr_length(node, "width")? {
            Some(w) => w,
            None => {
                log::warn!("rect without a width, skipped");
                return Ok(());
            }
        };
        let h = match self.attr_length(node, "height")? {
            Some(h) => h,
            None => {
                log::warn!("rect without a height, skipped");
                return Ok(());
            }
        };

        // corner radii default to each other and are clamped to half size
        let mut rx = self.attr_length(node, "rx")?;
        let mut ry = self.attr_length(node, "ry")?;
        if rx.is_none() {
            rx = ry;
        }
        if ry.is_none() {
            ry = rx;
        }
        let rx = rx.unwrap_or(0.0).min(w / 2.0).max(0.0);
        let ry = ry.unwrap_or(0.0).min(h / 2.0).max(0.0);

        let rect = Rect::from_xywh(x, y, w, h);

        let pushed = self.push_transform(node);
        let res = self.shape_paints(&props, Some(rect));
        if let Ok((fill, stroke)) = &res {
            if fill.is_some() || stroke.is_some() {
                if fill.is_some() {
                    self.add_limits(rect, None);
                }
                if let Some(stroke) = stroke {
                    self.add_limits(rect, Some(stroke.stroke_width));
                }

                self.ops.push(DrawOp::Rect(RectElement {
                    id: node.attribute("id").map(|s| s.to_string()),
                    transform: self.total_transform(),
                    rect,
                    radii: (rx, ry),
                    fill: fill.clone(),
                    stroke: stroke.clone(),
                }));
            }
        }
        if pushed {
            self.matrix.pop();
        }

        res.map(|_| ())
    }

    fn convert_line(&mut self, node: roxmltree::Node) -> Result<(), Error> {
        let props = Properties::new(node);

        let x1 = self.attr_length(node, "x1")?.unwrap_or(0.0);
        let y1 = self.attr_length(node, "y1")?.unwrap_or(0.0);
        let x2 = self.attr_length(node, "x2")?.unwrap_or(0.0);
        let y2 = self.attr_length(node, "y2")?.unwrap_or(0.0);

        // lines are stroke-only
        if !style::resolve_stroke(self, &props)? {
            return Ok(());
        }

        let pushed = self.push_transform(node);

        let stroke = self.stroke.clone();
        let rect = Rect::new(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2));
        self.add_limits(rect, Some(stroke.stroke_width));

        self.ops.push(DrawOp::Line(LineElement {
            id: node.attribute("id").map(|s| s.to_string()),
            transform: self.total_transform(),
            x1,
            y1,
            x2,
            y2,
            stroke,
        }));

        if pushed {
            self.matrix.pop();
        }

        Ok(())
    }

    fn convert_ellipse(&mut self, node: roxmltree::Node, is_circle: bool) -> Result<(), Error> {
        let props = Properties::new(node);

        let cx = self.attr_length(node, "cx")?;
        let cy = self.attr_length(node, "cy")?;
        let (rx, ry) = if is_circle {
            let r = self.attr_length(node, "r")?;
            (r, r)
        } else {
            (
                self.attr_length(node, "rx")?,
                self.attr_length(node, "ry")?,
            )
        };

        let (cx, cy, rx, ry) = match (cx, cy, rx, ry) {
            (Some(cx), Some(cy), Some(rx), Some(ry)) => (cx, cy, rx, ry),
            _ => return Ok(()),
        };

        let rect = Rect::new(cx - rx, cy - ry, cx + rx, cy + ry);

        let pushed = self.push_transform(node);
        let res = self.shape_paints(&props, Some(rect));
        if let Ok((fill, stroke)) = &res {
            if fill.is_some() || stroke.is_some() {
                if fill.is_some() {
                    self.add_limits(rect, None);
                }
                if let Some(stroke) = stroke {
                    self.add_limits(rect, Some(stroke.stroke_width));
                }

                self.ops.push(DrawOp::Ellipse(EllipseElement {
                    id: node.attribute("id").map(|s| s.to_string()),
                    transform: self.total_transform(),
                    rect,
                    fill: fill.clone(),
                    stroke: stroke.clone(),
                }));
            }
        }
        if pushed {
            self.matrix.pop();
        }

        res.map(|_| ())
    }

    fn convert_poly(&mut self, node: roxmltree::Node, closed: bool) -> Result<(), Error> {
        let points = match attr(node, "points") {
            Some(points) => points,
            None => return Ok(()),
        };

        let points: Vec<Point> = PointsParser::from(points)
            .map(|(x, y)| Point::new(x, y))
            .collect();
        if points.len() < 2 {
            return Ok(());
        }

        let props = Properties::new(node);

        let mut bbox = BBox::default();
        for p in &points {
            bbox.add_point(p.x, p.y);
        }
        let rect = bbox
            .to_rect()
            .unwrap_or_else(|| Rect::new(0.0, 0.0, 0.0, 0.0));

        let pushed = self.push_transform(node);
        let res = self.shape_paints(&props, Some(rect));
        if let Ok((fill, stroke)) = &res {
            if fill.is_some() || stroke.is_some() {
                if fill.is_some() {
                    self.add_limits(rect, None);
                }
                if let Some(stroke) = stroke {
                    self.add_limits(rect, Some(stroke.stroke_width));
                }

                self.ops.push(DrawOp::Polygon(PolygonElement {
                    id: node.attribute("id").map(|s| s.to_string()),
                    transform: self.total_transform(),
                    points: points.clone(),
                    closed,
                    fill: fill.clone(),
                    stroke: stroke.clone(),
                }));
            }
        }
        if pushed {
            self.matrix.pop();
        }

        res.map(|_| ())
    }

    fn convert_path_element(&mut self, node: roxmltree::Node) -> Result<(), Error> {
        // inside defs only the outline text is captured, for use elements
        if self.in_defs {
            if let (Some(id), Some(d)) = (node.attribute("id"), attr(node, "d")) {
                self.defs.insert(id.to_string(), d.to_string());
            }
            return Ok(());
        }

        let d: String = match attr(node, "d") {
            Some(d) => d.to_string(),
            None => {
                let href = attr(node, "href").map(|h| h.trim_start_matches('#'));
                match href.and_then(|h| self.defs.get(h)) {
                    Some(d) => d.clone(),
                    None => return Ok(()),
                }
            }
        };

        let props = Properties::new(node);
        let p = path::convert_path(&d);
        let rect = p.bounds();

        let pushed = self.push_transform(node);
        let res = self.shape_paints(&props, Some(rect));
        if let Ok((fill, stroke)) = &res {
            if fill.is_some() || stroke.is_some() {
                if fill.is_some() {
                    self.add_limits(rect, None);
                }
                if let Some(stroke) = stroke {
                    self.add_limits(rect, Some(stroke.stroke_width));
                }

                self.ops.push(DrawOp::Path(PathElement {
                    id: node.attribute("id").map(|s| s.to_string()),
                    transform: self.total_transform(),
                    path: p,
                    fill: fill.clone(),
                    stroke: stroke.clone(),
                }));
            }
        }
        if pushed {
            self.matrix.pop();
        }

        res.map(|_| ())
    }

    fn convert_text(
        &mut self,
        node: roxmltree::Node,
        parent: Option<&TextContext>,
    ) -> Result<(), Error> {
        // only the outermost text element carries a transform
        let pushed = if parent.is_none() {
            self.push_transform(node)
        } else {
            false
        };

        let res = self.convert_text_inner(node, parent);

        if pushed {
            self.matrix.pop();
        }

        res
    }

    fn convert_text_inner(
        &mut self,
        node: roxmltree::Node,
        parent: Option<&TextContext>,
    ) -> Result<(), Error> {
        let props = Properties::new(node);

        let x = self.attr_length(node, "x")?.unwrap_or(0.0);
        let y = self.attr_length(node, "y")?.unwrap_or(0.0);

        let mut font = parent.map(|p| p.font.clone()).unwrap_or_default();
        if let Some(size) = props.float("font-size", &mut self.units, self.opt.density)? {
            font.size = size;
        }
        if let Some(family) = props.attr("font-family") {
            font.family = Some(family.to_string());
        }
        if let Some(weight) = props.attr("font-weight") {
            font.bold = weight == "bold";
        }
        if let Some(fstyle) = props.attr("font-style") {
            font.italic = fstyle == "italic";
        }

        let anchor = match props.attr("text-anchor") {
            Some("start") => Some(TextAnchor::Start),
            Some("middle") => Some(TextAnchor::Middle),
            Some("end") => Some(TextAnchor::End),
            _ => parent.and_then(|p| p.anchor),
        };

        let halign = match props.attr("text-align") {
            Some("center") => Some(HAlign::Center),
            Some("right") => Some(HAlign::Right),
            Some("left") => None,
            _ => parent.and_then(|p| p.halign),
        };

        let valign = match props.attr("alignment-baseline") {
            Some("top") => Some(VAlign::Top),
            Some("middle") => Some(VAlign::Middle),
            Some("bottom") => None,
            _ => parent.and_then(|p| p.valign),
        };

        // a tspan draws with its parent's paint objects
        let fill = if style::resolve_fill(self, &props, None)? {
            Some(
                parent
                    .and_then(|p| p.fill.clone())
                    .unwrap_or_else(|| self.fill.clone()),
            )
        } else {
            None
        };
        let stroke = if style::resolve_stroke(self, &props)? {
            Some(
                parent
                    .and_then(|p| p.stroke.clone())
                    .unwrap_or_else(|| self.stroke.clone()),
            )
        } else {
            None
        };

        let tctx = TextContext {
            x,
            y,
            fill,
            stroke,
            font,
            anchor,
            halign,
            valign,
        };

        let mut text = String::new();
        for child in node.children() {
            if child.is_text() {
                if let Some(t) = child.text() {
                    text.push_str(t);
                }
            }
        }

        // nested runs emit before this one, in document order
        for child in node.children().filter(|n| n.is_element()) {
            if child.tag_name().name() == "tspan" {
                self.convert_text(child, Some(&tctx))?;
            }
        }

        if let Some(replacement) = self.opt.text_replacements.get(&text) {
            text = replacement.clone();
        }

        if text.trim().is_empty() || (tctx.fill.is_none() && tctx.stroke.is_none()) {
            return Ok(());
        }

        // alignment correction needs actual metrics
        let (mut x, mut y) = (tctx.x, tctx.y);
        if let Some(measure) = &self.opt.text_measurer {
            if tctx.halign.is_some() || tctx.valign.is_some() {
                let bounds = measure(&text, &tctx.font);
                match tctx.valign {
                    Some(VAlign::Top) => y += bounds.height(),
                    Some(VAlign::Middle) => y += -bounds.center_y(),
                    None => {}
                }
                match tctx.halign {
                    Some(HAlign::Center) => x -= bounds.width / 2.0,
                    Some(HAlign::Right) => x -= bounds.width,
                    None => {}
                }
            }
        }

        self.ops.push(DrawOp::Text(TextElement {
            id: node.attribute("id").map(|s| s.to_string()),
            transform: self.total_transform(),
            x,
            y,
            text,
            font: tctx.font,
            anchor: tctx.anchor,
            fill: tctx.fill,
            stroke: tctx.stroke,
        }));

        Ok(())
    }

    fn shape_paints(
        &mut self,
        props: &Properties,
        bbox: Option<Rect>,
    ) -> Result<(Option<Paint>, Option<Paint>), Error> {
        let fill = if style::resolve_fill(self, props, bbox)? {
            Some(self.fill.clone())
        } else {
            None
        };
        let stroke = if style::resolve_stroke(self, props)? {
            Some(self.stroke.clone())
        } else {
            None
        };

        Ok((fill, stroke))
    }

    fn push_transform(&mut self, node: roxmltree::Node) -> bool {
        if let Some(text) = attr(node, "transform") {
            if let Some(ts) = parse_transform(text) {
                let total = self.total_transform().pre_concat(&ts);
                self.matrix.push(total);
                return true;
            }
        }

        false
    }

    fn total_transform(&self) -> Transform {
        self.matrix.last().copied().unwrap_or_default()
    }

    /// Grows the drawn-geometry box by `rect` mapped to canvas space,
    /// expanded by half the stroke width when stroked.
    fn add_limits(&mut self, rect: Rect, stroke_width: Option<f32>) {
        let mapped = self.total_transform().map_rect(rect);
        let w2 = stroke_width.map(|w| w / 2.0).unwrap_or(0.0);
        self.limits.add_point(mapped.left - w2, mapped.top - w2);
        self.limits.add_point(mapped.right + w2, mapped.bottom + w2);
    }

    fn attr_length(&mut self, node: roxmltree::Node, name: &str) -> Result<Option<f32>, Error> {
        match attr(node, name) {
            Some(text) => units::parse_length(text, &mut self.units, self.opt.density),
            None => Ok(None),
        }
    }
}

/// Attribute lookup by local name, so `xlink:href` matches `href`.
fn attr<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|a| a.name() == name)
        .map(|a| a.value())
}
