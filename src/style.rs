// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::color::{parse_color, Color};
use crate::converter::Context;
use crate::geom::{Rect, Transform};
use crate::stream::Stream;
use crate::tree::{Dash, LineCap, LineJoin, ShaderRef};
use crate::units::{self, AssumedUnits};
use crate::Error;

/// Style-aware attribute access for a single element.
///
/// Inline `style` declarations take precedence over presentation
/// attributes. Attributes are matched by local name, so `xlink:href`
/// is reachable as `href`.
pub(crate) struct Properties<'a, 'input: 'a> {
    node: roxmltree::Node<'a, 'input>,
    styles: Vec<(&'a str, &'a str)>,
}

impl<'a, 'input: 'a> Properties<'a, 'input> {
    pub fn new(node: roxmltree::Node<'a, 'input>) -> Self {
        let mut styles = Vec::new();
        if let Some(style) = node.attributes().find(|a| a.name() == "style") {
            for pair in style.value().split(';') {
                if let Some(i) = pair.find(':') {
                    styles.push((pair[..i].trim(), pair[i + 1..].trim()));
                }
            }
        }

        Properties { node, styles }
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        for &(k, v) in &self.styles {
            if k == name {
                return Some(v);
            }
        }

        self.node
            .attributes()
            .find(|a| a.name() == name)
            .map(|a| a.value())
    }

    pub fn id(&self) -> Option<&'a str> {
        self.node.attribute("id")
    }

    pub fn color(&self, name: &str) -> Option<Color> {
        self.attr(name).and_then(parse_color)
    }

    pub fn float(
        &self,
        name: &str,
        units: &mut AssumedUnits,
        density: f32,
    ) -> Result<Option<f32>, Error> {
        match self.attr(name) {
            Some(text) => units::parse_length(text, units, density),
            None => Ok(None),
        }
    }
}

/// Resolves the current fill paint from an element's attributes,
/// mutating the interpreter's fill state in place.
///
/// Returns `true` when the element should be filled. The paint itself
/// stays on `ctx.fill`; callers clone it onto the emitted operation.
///
/// `bbox` is the element's bounding box, used to place
/// `objectBoundingBox` gradients; groups pass `None`.
pub(crate) fn resolve_fill(
    ctx: &mut Context,
    props: &Properties,
    bbox: Option<Rect>,
) -> Result<bool, Error> {
    if props.attr("display") == Some("none") {
        return Ok(false);
    }

    if ctx.opt.white_mode {
        ctx.fill.shader = None;
        ctx.fill.color = Color::white();
        return Ok(true);
    }

    let value = match props.attr("fill") {
        Some(value) => value,
        None => {
            return if ctx.fill_set {
                // inherited from an enclosing group, as-is
                Ok(ctx.fill.color != Color::transparent())
            } else {
                ctx.fill.shader = None;
                ctx.fill.color = Color::black();
                Ok(true)
            };
        }
    };

    if let Some(id) = value
        .strip_prefix("url(#")
        .and_then(|v| v.strip_suffix(')'))
    {
        let shader = ctx.gradients.get(id).filter(|g| g.resolved).map(|g| {
            let mut matrix = g.matrix.unwrap_or_default();
            if g.bounding_box {
                if let Some(bb) = bbox {
                    matrix = matrix.pre_concat(&Transform::new_translate(bb.left, bb.top));
                    matrix = matrix.pre_concat(&Transform::new_scale(bb.width(), bb.height()));
                }
            }

            ShaderRef {
                id: id.to_string(),
                matrix,
            }
        });

        match shader {
            Some(shader) => {
                ctx.fill.shader = Some(shader);
            }
            None => {
                log::warn!("didn't find shader, using black: {}", id);
                ctx.fill.shader = None;
                apply_color(ctx, props, Color::black(), true)?;
            }
        }

        Ok(true)
    } else if value.eq_ignore_ascii_case("none") {
        ctx.fill.shader = None;
        ctx.fill.color = Color::transparent();
        Ok(true)
    } else {
        ctx.fill.shader = None;
        let color = parse_color(value).unwrap_or_else(|| {
            log::warn!("unrecognized fill color, using black: {}", value);
            Color::black()
        });
        apply_color(ctx, props, color, true)?;
        Ok(true)
    }
}

/// Resolves the current stroke paint, mutating the interpreter's stroke
/// state in place. Returns `true` when the element should be stroked.
pub(crate) fn resolve_stroke(ctx: &mut Context, props: &Properties) -> Result<bool, Error> {
    // outlines are never drawn in white mode
    if ctx.opt.white_mode {
        return Ok(false);
    }

    if props.attr("display") == Some("none") {
        return Ok(false);
    }

    if let Some(width) = props.float("stroke-width", &mut ctx.units, ctx.opt.density)? {
        ctx.stroke.stroke_width = width;
    }

    match props.attr("stroke-linecap") {
        Some("round") => ctx.stroke.line_cap = LineCap::Round,
        Some("square") => ctx.stroke.line_cap = LineCap::Square,
        Some("butt") => ctx.stroke.line_cap = LineCap::Butt,
        _ => {}
    }

    match props.attr("stroke-linejoin") {
        Some("miter") => ctx.stroke.line_join = LineJoin::Miter,
        Some("round") => ctx.stroke.line_join = LineJoin::Round,
        Some("bevel") => ctx.stroke.line_join = LineJoin::Bevel,
        _ => {}
    }

    if let Some(array) = props.attr("stroke-dasharray") {
        ctx.stroke.dash = parse_dash(array, props.attr("stroke-dashoffset"));
    }

    let value = match props.attr("stroke") {
        Some(value) => value,
        None => {
            return if ctx.stroke_set {
                Ok(ctx.stroke.color != Color::transparent())
            } else {
                Ok(false)
            };
        }
    };

    if value.eq_ignore_ascii_case("none") {
        ctx.stroke.color = Color::transparent();
        Ok(false)
    } else {
        match parse_color(value) {
            Some(color) => {
                apply_color(ctx, props, color, false)?;
                Ok(true)
            }
            None => {
                log::warn!("unrecognized stroke color, skipping: {}", value);
                Ok(false)
            }
        }
    }
}

/// Applies a parsed color to the current fill or stroke paint:
/// per-parse swaps first, then per-id overrides, then opacity.
fn apply_color(
    ctx: &mut Context,
    props: &Properties,
    color: Color,
    fill_mode: bool,
) -> Result<(), Error> {
    // the incoming color is always opaque
    let mut color = Color::new_rgb(color.red, color.green, color.blue);

    if let Some((search, replace)) = ctx.opt.color_swap {
        if color == search {
            color = replace;
        }
    }

    if let Some(id) = props.id() {
        if let Some(over) = ctx.opt.id_colors.get(id) {
            color = *over;
        }
    }

    let opacity = props.float("opacity", &mut ctx.units, ctx.opt.density)?;
    let opacity2 = props.float(
        if fill_mode {
            "fill-opacity"
        } else {
            "stroke-opacity"
        },
        &mut ctx.units,
        ctx.opt.density,
    )?;

    let opacity = match (opacity, opacity2) {
        (Some(a), Some(b)) => Some(a * b),
        (Some(a), None) => Some(a),
        (None, b) => b,
    };

    if let Some(opacity) = opacity {
        color.alpha = (255.0 * crate::f32_bound(0.0, opacity, 1.0)) as u8;
    }

    let paint = if fill_mode {
        &mut ctx.fill
    } else {
        &mut ctx.stroke
    };
    paint.color = color;

    Ok(())
}

/// Parses `stroke-dasharray`/`stroke-dashoffset` into a dash pattern.
///
/// An odd number of intervals is doubled. A token that fails to parse
/// repeats the previous interval. The offset wraps around the pattern
/// length.
pub(crate) fn parse_dash(array: &str, offset: Option<&str>) -> Option<Dash> {
    if array == "none" {
        return None;
    }

    let mut intervals = Vec::new();
    let mut total = 0.0;
    let mut current = 1.0;
    for token in array
        .split(|c| c == ' ' || c == ',')
        .filter(|t| !t.is_empty())
    {
        current = parse_float_strict(token).unwrap_or(current);
        intervals.push(current);
        total += current;
    }

    if intervals.is_empty() {
        return None;
    }

    if intervals.len() % 2 == 1 {
        let doubled = intervals.clone();
        intervals.extend(doubled);
    }

    let offset = offset.and_then(parse_float_strict).unwrap_or(0.0);
    let offset = if total > 0.0 { offset % total } else { 0.0 };

    Some(Dash { intervals, offset })
}

/// Parses a float the strict way: the whole token must be a number.
fn parse_float_strict(text: &str) -> Option<f32> {
    let mut s = Stream::from(text.trim());
    let n = s.parse_number().ok()?;
    if s.at_end() {
        Some(n)
    } else {
        None
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_plain() {
        let dash = parse_dash("4 2", None).unwrap();
        assert_eq!(dash.intervals, vec![4.0, 2.0]);
        assert_eq!(dash.offset, 0.0);
    }

    #[test]
    fn dash_odd_count_doubles() {
        let dash = parse_dash("4,2,1", None).unwrap();
        assert_eq!(dash.intervals, vec![4.0, 2.0, 1.0, 4.0, 2.0, 1.0]);
    }

    #[test]
    fn dash_offset_wraps() {
        let dash = parse_dash("4 2", Some("13")).unwrap();
        assert_eq!(dash.offset, 1.0);
    }

    #[test]
    fn dash_bad_token_repeats_previous() {
        let dash = parse_dash("4 oops 2", None).unwrap();
        assert_eq!(dash.intervals, vec![4.0, 4.0, 2.0, 4.0, 4.0, 2.0]);
    }

    #[test]
    fn dash_none() {
        assert_eq!(parse_dash("none", None), None);
        assert_eq!(parse_dash("", None), None);
    }
}
