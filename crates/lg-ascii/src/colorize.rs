use lg_core::color::{Palette, Rgb, saturate};
use lg_core::config::{ColorMode, ConvertConfig};
use lg_core::frame::{CellStyle, FrameBuffer, LuminanceGrid};
use rayon::prelude::*;

/// Réglages du coloriage, extraits de [`ConvertConfig`].
///
/// # Example
/// ```
/// use lg_ascii::colorize::ColorSettings;
/// use lg_core::config::ConvertConfig;
/// let s = ColorSettings::from(&ConvertConfig::default());
/// assert_eq!(s.brightness_blend, 0.5);
/// ```
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorSettings {
    /// Color mode.
    pub mode: ColorMode,
    /// Saturation [0, ∞).
    pub saturation: f32,
    /// Brightness blend [0, 1], 0.5 neutral.
    pub brightness_blend: f32,
    /// Base opacity.
    pub base_opacity: f32,
    /// Derive opacity from luminance.
    pub brightness_as_opacity: bool,
    /// Inverted rendering.
    pub invert: bool,
    /// Glyph color in monochrome mode.
    pub foreground: Rgb,
}

impl From<&ConvertConfig> for ColorSettings {
    fn from(c: &ConvertConfig) -> Self {
        Self {
            mode: c.color_mode,
            saturation: c.saturation,
            brightness_blend: c.brightness_blend,
            base_opacity: c.base_opacity,
            brightness_as_opacity: c.brightness_as_opacity,
            invert: c.invert,
            foreground: c.foreground,
        }
    }
}

/// Facteur multiplicatif du mélange de luminosité pour une luminance `l`.
///
/// `adj = (blend − 0.5) × 2` ; `adj ≥ 0` assombrit les cellules sombres,
/// `adj < 0` les éclaircit. `blend = 0.5` donne 1.
///
/// # Example
/// ```
/// use lg_ascii::colorize::blend_factor;
/// assert_eq!(blend_factor(0.5, 0.2), 1.0);
/// assert_eq!(blend_factor(1.0, 0.0), 0.0);
/// assert_eq!(blend_factor(0.0, 0.0), 2.0);
/// assert_eq!(blend_factor(1.0, 1.0), 1.0);
/// ```
#[inline(always)]
#[must_use]
pub fn blend_factor(blend: f32, l: f32) -> f32 {
    let adj = (blend - 0.5) * 2.0;
    if adj >= 0.0 {
        1.0 - adj * (1.0 - l)
    } else {
        1.0 + adj.abs() * (1.0 - l)
    }
}

/// Computes the final style of one cell.
///
/// Order: palette snap (fixed/adaptive modes), saturation, brightness blend,
/// clamp, then opacity. Monochrome cells take the foreground color and only
/// carry opacity.
///
/// # Example
/// ```
/// use lg_ascii::colorize::{colorize_cell, ColorSettings};
/// use lg_core::config::{ColorMode, ConvertConfig};
/// let mut s = ColorSettings::from(&ConvertConfig::default());
/// s.mode = ColorMode::Truecolor;
/// let style = colorize_cell((12, 34, 56), 0.3, &s, None);
/// assert_eq!(style.rgb, (12, 34, 56));
/// assert_eq!(style.opacity, 1.0);
/// ```
#[must_use]
pub fn colorize_cell(rgb: Rgb, l: f32, settings: &ColorSettings, palette: Option<&Palette>) -> CellStyle {
    let rgb = match settings.mode {
        ColorMode::Monochrome => settings.foreground,
        ColorMode::Truecolor => adjust(rgb, l, settings),
        ColorMode::FixedPalette | ColorMode::Adaptive => {
            let snapped = palette.map_or(rgb, |p| p.nearest(rgb));
            adjust(snapped, l, settings)
        }
    };

    let mut opacity = settings.base_opacity;
    if settings.brightness_as_opacity {
        let l = if settings.invert { 1.0 - l } else { l };
        opacity *= 1.0 - l;
    }

    CellStyle {
        rgb,
        opacity: opacity.clamp(0.0, 1.0),
    }
}

/// Saturation puis mélange de luminosité, bornés à [0, 255].
#[inline(always)]
fn adjust(rgb: Rgb, l: f32, settings: &ColorSettings) -> Rgb {
    let rgb = saturate(rgb, settings.saturation);
    if (settings.brightness_blend - 0.5).abs() < f32::EPSILON {
        return rgb;
    }
    let factor = blend_factor(settings.brightness_blend, l);
    let ch = |c: u8| -> u8 { (f32::from(c) * factor).round().clamp(0.0, 255.0) as u8 };
    (ch(rgb.0), ch(rgb.1), ch(rgb.2))
}

/// Styles of every cell, row-major. `pixels` and `luminance` share dimensions.
///
/// # Example
/// ```
/// use lg_ascii::colorize::{colorize, ColorSettings};
/// use lg_core::config::{ColorMode, ConvertConfig};
/// use lg_core::frame::{FrameBuffer, LuminanceGrid};
/// let pixels = FrameBuffer::filled(2, 1, (200, 10, 10));
/// let lum = LuminanceGrid { values: vec![0.5, 0.5], width: 2, height: 1 };
/// let mut s = ColorSettings::from(&ConvertConfig::default());
/// s.mode = ColorMode::Truecolor;
/// assert_eq!(colorize(&pixels, &lum, &s, None).len(), 2);
/// ```
#[must_use]
pub fn colorize(
    pixels: &FrameBuffer,
    luminance: &LuminanceGrid,
    settings: &ColorSettings,
    palette: Option<&Palette>,
) -> Vec<CellStyle> {
    debug_assert_eq!(pixels.data.len() / 4, luminance.values.len());
    let mut out = Vec::with_capacity(luminance.values.len());
    pixels
        .data
        .par_chunks_exact(4)
        .zip(luminance.values.par_iter())
        .map(|(px, &l)| colorize_cell((px[0], px[1], px[2]), l, settings, palette))
        .collect_into_vec(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(mode: ColorMode) -> ColorSettings {
        ColorSettings {
            mode,
            ..ColorSettings::from(&ConvertConfig::default())
        }
    }

    #[test]
    fn palette_snap_picks_nearest() {
        let palette = Palette::from_colors([(0, 0, 0), (255, 255, 255)]);
        let s = settings(ColorMode::Adaptive);
        let style = colorize_cell((10, 10, 10), 0.04, &s, Some(&palette));
        assert_eq!(style.rgb, (0, 0, 0));
    }

    #[test]
    fn fixed_palette_snaps_to_terminal_table() {
        let palette = Palette::ansi256();
        let s = settings(ColorMode::FixedPalette);
        let style = colorize_cell((250, 3, 2), 0.3, &s, Some(&palette));
        assert_eq!(style.rgb, (255, 0, 0));
    }

    #[test]
    fn zero_saturation_is_gray() {
        let mut s = settings(ColorMode::Truecolor);
        s.saturation = 0.0;
        let style = colorize_cell((255, 0, 0), 0.3, &s, None);
        assert_eq!(style.rgb, (76, 76, 76));
    }

    #[test]
    fn adaptive_snap_is_saturated_again() {
        // La palette vient d'échantillons déjà ajustés ; la couleur retenue repasse par saturate.
        let palette = Palette::from_colors([(255, 0, 0), (0, 0, 0)]);
        let mut s = settings(ColorMode::Adaptive);
        s.saturation = 0.0;
        let style = colorize_cell((250, 10, 10), 0.3, &s, Some(&palette));
        assert_eq!(style.rgb, (76, 76, 76));
    }

    #[test]
    fn blend_darkens_dark_cells() {
        let mut s = settings(ColorMode::Truecolor);
        s.brightness_blend = 1.0;
        // L = 0.5 → factor = 1 − 1 × 0.5 = 0.5
        let style = colorize_cell((200, 100, 50), 0.5, &s, None);
        assert_eq!(style.rgb, (100, 50, 25));
    }

    #[test]
    fn negative_blend_brightens_and_clamps() {
        let mut s = settings(ColorMode::Truecolor);
        s.brightness_blend = 0.0;
        // L = 0 → factor 2
        let style = colorize_cell((200, 100, 0), 0.0, &s, None);
        assert_eq!(style.rgb, (255, 200, 0));
    }

    #[test]
    fn brightness_as_opacity_follows_invert() {
        let mut s = settings(ColorMode::Monochrome);
        s.brightness_as_opacity = true;
        s.base_opacity = 0.8;
        let bright = colorize_cell((0, 0, 0), 1.0, &s, None);
        assert_eq!(bright.opacity, 0.0);
        assert_eq!(bright.rgb, (255, 255, 255));
        s.invert = true;
        let inverted = colorize_cell((0, 0, 0), 1.0, &s, None);
        assert!((inverted.opacity - 0.8).abs() < 1e-6);
    }

    #[test]
    fn opacity_is_base_without_brightness_mode() {
        let mut s = settings(ColorMode::Truecolor);
        s.base_opacity = 0.4;
        let style = colorize_cell((1, 2, 3), 0.9, &s, None);
        assert!((style.opacity - 0.4).abs() < 1e-6);
    }
}
