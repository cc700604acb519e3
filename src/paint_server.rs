// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use crate::color::Color;
use crate::geom::Transform;
use crate::style::Properties;
use crate::transform::parse_transform;
use crate::tree::{Gradient, GradientKind, SpreadMethod, Stop};
use crate::units::{self, AssumedUnits};
use crate::{Error, OptionLog};

/// A gradient collected during traversal.
///
/// `xlink` references are only recorded here; they are resolved later,
/// in [`resolve`], so a gradient may reference one declared after it.
#[derive(Clone, Debug)]
pub(crate) struct GradientBuilder {
    pub kind: GradientKind,
    pub href: Option<String>,
    pub positions: Vec<f32>,
    pub colors: Vec<Color>,
    pub matrix: Option<Transform>,
    pub bounding_box: bool,
    pub spread: SpreadMethod,
    /// Set by [`resolve`]; unresolved gradients fall back to black at
    /// fill time.
    pub resolved: bool,
}

impl GradientBuilder {
    pub fn to_gradient(&self) -> Gradient {
        let stops = self
            .positions
            .iter()
            .zip(self.colors.iter())
            .map(|(&offset, &color)| Stop { offset, color })
            .collect();

        Gradient {
            kind: self.kind,
            stops,
            spread: self.spread,
            bounding_box: self.bounding_box,
            matrix: self.matrix,
        }
    }
}

/// Parses a `linearGradient`/`radialGradient` element, stops included.
pub(crate) fn convert_gradient(
    node: roxmltree::Node,
    units: &mut AssumedUnits,
    density: f32,
) -> Result<GradientBuilder, Error> {
    let kind = if node.tag_name().name() == "linearGradient" {
        GradientKind::Linear {
            x1: attr_length(node, "x1", 0.0, units, density)?,
            y1: attr_length(node, "y1", 0.0, units, density)?,
            x2: attr_length(node, "x2", 1.0, units, density)?,
            y2: attr_length(node, "y2", 0.0, units, density)?,
        }
    } else {
        GradientKind::Radial {
            cx: attr_length(node, "cx", 0.0, units, density)?,
            cy: attr_length(node, "cy", 0.0, units, density)?,
            r: attr_length(node, "r", 0.0, units, density)?,
        }
    };

    let href = attr(node, "href")
        .map(|v| v.trim_start_matches('#').to_string());

    let matrix = attr(node, "gradientTransform").and_then(parse_transform);

    // objectBoundingBox is the default coordinate space
    let bounding_box = attr(node, "gradientUnits") != Some("userSpaceOnUse");

    let spread = match attr(node, "spreadMethod") {
        Some("reflect") => SpreadMethod::Reflect,
        Some("repeat") => SpreadMethod::Repeat,
        _ => SpreadMethod::Pad,
    };

    let mut builder = GradientBuilder {
        kind,
        href,
        positions: Vec::new(),
        colors: Vec::new(),
        matrix,
        bounding_box,
        spread,
        resolved: false,
    };

    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().name() != "stop" {
            continue;
        }

        let props = Properties::new(child);
        let offset = props.float("offset", units, density)?.unwrap_or(0.0);

        let mut color = props
            .color("stop-color")
            .log_none(|| log::warn!("a gradient stop without a valid stop-color, using black"))
            .unwrap_or_else(Color::black);

        let opacity = props.float("stop-opacity", units, density)?.unwrap_or(1.0);
        color.alpha = (255.0 * crate::f32_bound(0.0, opacity, 1.0)) as u8;

        builder.positions.push(offset);
        builder.colors.push(color);
    }

    Ok(builder)
}

/// Resolves `xlink` inheritance and marks usable gradients.
///
/// Runs at the end of `defs` and again at the end of the document, so
/// both forward references and gradients declared outside `defs` work.
/// Reference chains resolve transitively; cycles are dropped.
pub(crate) fn resolve(gradients: &mut HashMap<String, GradientBuilder>) {
    let ids: Vec<String> = gradients.keys().cloned().collect();
    for id in ids {
        let mut visited = Vec::new();
        resolve_one(gradients, &id, &mut visited);
    }
}

fn resolve_one(
    gradients: &mut HashMap<String, GradientBuilder>,
    id: &str,
    visited: &mut Vec<String>,
) {
    // A pending href is retried on every pass, so a parent declared
    // after the referencing defs block still gets inherited.
    let href = match gradients.get(id) {
        Some(g) => g.href.clone(),
        None => return,
    };

    if let Some(parent_id) = href {
        if visited.iter().any(|v| v == &parent_id) || parent_id == id {
            log::warn!("circular gradient reference: {}", id);
        } else {
            visited.push(id.to_string());
            resolve_one(gradients, &parent_id, visited);

            match gradients.get(&parent_id).cloned() {
                Some(parent) => {
                    if let Some(g) = gradients.get_mut(id) {
                        g.positions = parent.positions.clone();
                        g.colors = parent.colors.clone();
                        g.matrix = match (parent.matrix, g.matrix) {
                            (Some(p), Some(c)) => Some(p.pre_concat(&c)),
                            (Some(p), None) => Some(p),
                            (None, c) => c,
                        };
                        // inheritance happens once
                        g.href = None;
                    }
                }
                None => {
                    log::warn!("didn't find referenced gradient: {}", parent_id);
                }
            }
        }
    }

    if let Some(g) = gradients.get_mut(id) {
        if g.positions.is_empty() {
            log::warn!("gradient without stops: {}", id);
            g.resolved = false;
        } else {
            g.resolved = true;
        }
    }
}

fn attr<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes().find(|a| a.name() == name).map(|a| a.value())
}

fn attr_length(
    node: roxmltree::Node,
    name: &str,
    def: f32,
    units: &mut AssumedUnits,
    density: f32,
) -> Result<f32, Error> {
    match attr(node, name) {
        Some(text) => Ok(units::parse_length(text, units, density)?.unwrap_or(def)),
        None => Ok(def),
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;

    fn builder(href: Option<&str>, stops: &[(f32, Color)], matrix: Option<Transform>) -> GradientBuilder {
        GradientBuilder {
            kind: GradientKind::Linear { x1: 0.0, y1: 0.0, x2: 1.0, y2: 0.0 },
            href: href.map(|s| s.to_string()),
            positions: stops.iter().map(|s| s.0).collect(),
            colors: stops.iter().map(|s| s.1).collect(),
            matrix,
            bounding_box: true,
            spread: SpreadMethod::Pad,
            resolved: false,
        }
    }

    #[test]
    fn inherits_stops_transitively() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), builder(Some("b"), &[], None));
        map.insert("b".to_string(), builder(Some("c"), &[], None));
        map.insert("c".to_string(), builder(None, &[(0.0, Color::black()), (1.0, Color::white())], None));

        resolve(&mut map);

        let a = &map["a"];
        assert!(a.resolved);
        assert_eq!(a.positions, vec![0.0, 1.0]);
        assert_eq!(a.colors, vec![Color::black(), Color::white()]);
    }

    #[test]
    fn composes_matrices() {
        let parent_m = Transform::new_translate(10.0, 0.0);
        let child_m = Transform::new_scale(2.0, 2.0);

        let mut map = HashMap::new();
        map.insert("p".to_string(), builder(None, &[(0.0, Color::black())], Some(parent_m)));
        map.insert("c".to_string(), builder(Some("p"), &[], Some(child_m)));

        resolve(&mut map);

        // parent first, child's own transform innermost
        assert_eq!(map["c"].matrix, Some(parent_m.pre_concat(&child_m)));
    }

    #[test]
    fn cycles_do_not_hang() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), builder(Some("b"), &[], None));
        map.insert("b".to_string(), builder(Some("a"), &[], None));

        resolve(&mut map);

        assert!(!map["a"].resolved);
        assert!(!map["b"].resolved);
    }

    #[test]
    fn parent_declared_after_defs_still_inherits() {
        // the child has its own stops, so the first pass marks it
        // resolved while its href is still dangling
        let mut map = HashMap::new();
        map.insert("c".to_string(), builder(Some("p"), &[(0.0, Color::black())], None));
        resolve(&mut map);
        assert!(map["c"].resolved);

        let parent_m = Transform::new_translate(10.0, 0.0);
        map.insert("p".to_string(), builder(None, &[(0.0, Color::white()), (1.0, Color::black())], Some(parent_m)));
        resolve(&mut map);

        let c = &map["c"];
        assert!(c.resolved);
        assert_eq!(c.colors, vec![Color::white(), Color::black()]);
        assert_eq!(c.matrix, Some(parent_m));
    }

    #[test]
    fn stopless_gradients_stay_unresolved() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), builder(None, &[], None));

        resolve(&mut map);

        assert!(!map["a"].resolved);
    }
}
