// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use crate::color::Color;
use crate::tree::Font;

/// Measured extents of a rendered text run, in the font's coordinates.
///
/// `top` is negative for text above the baseline, mirroring the canvas
/// text-bounds convention.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TextBounds {
    pub width: f32,
    pub top: f32,
    pub bottom: f32,
}

impl TextBounds {
    #[inline]
    pub(crate) fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub(crate) fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// A text measuring function.
///
/// Font resolution is the embedder's concern, so alignment correction
/// for `text-align`/`alignment-baseline` only happens when one is
/// supplied.
pub type MeasureTextFn = Box<dyn Fn(&str, &Font) -> TextBounds + Send + Sync>;

/// Per-parse options.
pub struct Options {
    /// Display density. Scales `pt` lengths as `v * density + 0.5`.
    ///
    /// Default: 1.0
    pub density: f32,

    /// Renders every fill white and drops all strokes.
    ///
    /// Intended for rendering icon silhouettes.
    ///
    /// Default: false
    pub white_mode: bool,

    /// Replaces one fill/stroke color with another over the whole
    /// document, compared after forcing full opacity.
    ///
    /// Default: None
    pub color_swap: Option<(Color, Color)>,

    /// Overrides the color of elements with matching `id` attributes.
    ///
    /// A fully transparent override hides the element; on a group it
    /// hides the whole subtree.
    ///
    /// Default: empty
    pub id_colors: HashMap<String, Color>,

    /// Replaces accumulated text content, keyed by the original text.
    ///
    /// Default: empty
    pub text_replacements: HashMap<String, String>,

    /// Measures text for alignment correction.
    ///
    /// Default: None, meaning anchors are kept as written.
    pub text_measurer: Option<MeasureTextFn>,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            density: 1.0,
            white_mode: false,
            color_swap: None,
            id_colors: HashMap::new(),
            text_replacements: HashMap::new(),
            text_measurer: None,
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("density", &self.density)
            .field("white_mode", &self.white_mode)
            .field("color_swap", &self.color_swap)
            .field("id_colors", &self.id_colors)
            .field("text_replacements", &self.text_replacements)
            .field(
                "text_measurer",
                &self.text_measurer.as_ref().map(|_| ".."),
            )
            .finish()
    }
}
