use lg_core::charset::DensityRamp;
use lg_core::color::{MID_GRAY, Palette};
use lg_core::config::{ColorMode, ConvertConfig};
use lg_core::error::CoreError;
use lg_core::frame::{CellStyle, ConversionResult, FrameBuffer};

use crate::colorize::{ColorSettings, colorize};
use crate::contrast;
use crate::glyph::map_glyphs;
use crate::quantize::{PaletteCache, PaletteKey, median_cut};
use crate::sampler::{Sampler, grid_size, luminance_grid};

/// Pipeline de conversion frame → grille de caractères.
///
/// Possède ses buffers de travail et le cache de palette ; un `Converter`
/// par flux de sortie. Chaque appel à [`Converter::convert`] est
/// indépendant, à la palette en cache près.
///
/// # Example
/// ```
/// use lg_ascii::Converter;
/// use lg_core::config::ConvertConfig;
/// use lg_core::frame::FrameBuffer;
///
/// let mut converter = Converter::new();
/// let frame = FrameBuffer::filled(40, 20, (0, 0, 0));
/// let config = ConvertConfig { density_ramp: "#. ".into(), ..ConvertConfig::default() };
/// let result = converter.convert(&frame, 20, &config).unwrap();
/// assert_eq!(result.dimensions(), (20, 5));
/// assert!(result.chars.iter().all(|&c| c == '#'));
/// assert!(result.styles.is_none());
/// ```
pub struct Converter {
    sampler: Sampler,
    palette_cache: PaletteCache,
    fixed_palette: Palette,
}

impl Converter {
    /// Create a converter with empty scratch buffers and an empty palette cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sampler: Sampler::new(),
            palette_cache: PaletteCache::new(),
            fixed_palette: Palette::ansi256(),
        }
    }

    /// Convert `frame` into a grid of `columns` characters per row.
    ///
    /// # Errors
    /// - [`CoreError::EmptyDensityRamp`] if the configured ramp is empty.
    /// - [`CoreError::BufferSizeMismatch`] if `frame.data` does not match its dimensions.
    /// - [`CoreError::InvalidDimensions`] if the resampler rejects the buffers.
    ///
    /// A zero-area frame is not an error: it yields a 1×1 grid holding the
    /// ramp's empty glyph.
    pub fn convert(
        &mut self,
        frame: &FrameBuffer,
        columns: u32,
        config: &ConvertConfig,
    ) -> Result<ConversionResult, CoreError> {
        let ramp = config.effective_ramp()?;
        let expected = frame.width as usize * frame.height as usize * 4;
        if frame.data.len() != expected {
            return Err(CoreError::BufferSizeMismatch {
                expected,
                actual: frame.data.len(),
            });
        }
        if frame.is_empty() {
            log::debug!(
                "Source vide ({}×{}), sortie minimale 1×1",
                frame.width,
                frame.height
            );
            return degenerate_result(config);
        }

        // 1. Échantillonnage à la résolution de la grille
        let (width, height) = grid_size(frame.width, frame.height, columns, config.aspect_ratio);
        let pixels = self
            .sampler
            .sample(frame, width, height, config.resample, config.mirror)?;

        // 2. Luminance + contraste
        let mut luminance = luminance_grid(pixels);
        if !config.contrast_is_identity() {
            contrast::normalize(&mut luminance, config.contrast, config.histogram_eq);
        }

        // 3. Glyphes
        let chars = map_glyphs(&luminance, &ramp);

        // 4. Couleur
        let styles = if config.wants_styles() {
            let palette = match config.color_mode {
                ColorMode::FixedPalette => Some(&self.fixed_palette),
                ColorMode::Adaptive => {
                    let key = PaletteKey::new(config.palette_size, config.saturation);
                    let k = usize::from(config.palette_size);
                    // Palette vide : `Palette::nearest` retombe sur le gris moyen.
                    Some(
                        self.palette_cache
                            .get_or_build(key, || median_cut(pixels, k, config.saturation)),
                    )
                }
                ColorMode::Monochrome | ColorMode::Truecolor => None,
            };
            let settings = ColorSettings::from(config);
            Some(colorize(pixels, &luminance, &settings, palette))
        } else {
            None
        };

        Ok(ConversionResult::new(chars, styles, width, height))
    }

    /// Drop the cached adaptive palette. Call when the source content changes.
    pub fn invalidate_palette(&mut self) {
        self.palette_cache.invalidate();
    }

    /// Cache de palette (lecture seule).
    #[must_use]
    pub fn palette_cache(&self) -> &PaletteCache {
        &self.palette_cache
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// Sortie 1×1 pour une source sans pixels : glyphe « vide » de la rampe non inversée.
fn degenerate_result(config: &ConvertConfig) -> Result<ConversionResult, CoreError> {
    let ramp = DensityRamp::new(&config.density_ramp)?;
    let styles = config.wants_styles().then(|| {
        vec![CellStyle {
            rgb: MID_GRAY,
            opacity: config.base_opacity,
        }]
    });
    Ok(ConversionResult::new(vec![ramp.empty_glyph()], styles, 1, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::render_html;

    fn mono(ramp: &str) -> ConvertConfig {
        ConvertConfig {
            density_ramp: ramp.into(),
            aspect_ratio: 1.0,
            ..ConvertConfig::default()
        }
    }

    fn half_red_half_blue(w: u32, h: u32) -> FrameBuffer {
        let mut fb = FrameBuffer::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let rgba = if x < w / 2 {
                    (255, 0, 0, 255)
                } else {
                    (0, 0, 255, 255)
                };
                fb.set_pixel(x, y, rgba);
            }
        }
        fb
    }

    #[test]
    fn all_black_maps_to_first_glyph() {
        let mut c = Converter::new();
        let r = c
            .convert(&FrameBuffer::filled(10, 10, (0, 0, 0)), 10, &mono("#. "))
            .unwrap();
        assert_eq!(r.dimensions(), (10, 10));
        assert!(r.chars.iter().all(|&ch| ch == '#'));
        assert!(r.styles.is_none());
        assert_eq!(r.to_text(), "##########\n".repeat(10));
    }

    #[test]
    fn all_white_maps_to_last_glyph() {
        let mut c = Converter::new();
        let r = c
            .convert(&FrameBuffer::filled(8, 8, (255, 255, 255)), 4, &mono("#. "))
            .unwrap();
        assert!(r.chars.iter().all(|&ch| ch == ' '));
    }

    #[test]
    fn transparent_source_maps_the_same_at_every_width() {
        let mut frame = FrameBuffer::filled(8, 8, (255, 255, 255));
        for px in frame.data.chunks_exact_mut(4) {
            px[3] = 0;
        }
        let mut c = Converter::new();
        for columns in [8, 4] {
            let r = c.convert(&frame, columns, &mono("#. ")).unwrap();
            assert!(r.chars.iter().all(|&ch| ch == ' '), "{columns} colonnes");
        }
    }

    #[test]
    fn invert_swaps_extremes() {
        let mut c = Converter::new();
        let config = ConvertConfig {
            invert: true,
            ..mono("#. ")
        };
        let r = c
            .convert(&FrameBuffer::filled(4, 4, (0, 0, 0)), 4, &config)
            .unwrap();
        assert!(r.chars.iter().all(|&ch| ch == ' '));
    }

    #[test]
    fn conversion_is_deterministic() {
        let frame = half_red_half_blue(37, 23);
        let config = ConvertConfig {
            color_mode: ColorMode::Adaptive,
            palette_size: 4,
            histogram_eq: true,
            contrast: 1.3,
            saturation: 0.8,
            brightness_blend: 0.7,
            brightness_as_opacity: true,
            ..ConvertConfig::default()
        };
        let a = Converter::new().convert(&frame, 19, &config).unwrap();
        let b = Converter::new().convert(&frame, 19, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(render_html(&a), render_html(&b));
    }

    #[test]
    fn adaptive_two_colors_snaps_every_cell() {
        let mut c = Converter::new();
        let config = ConvertConfig {
            color_mode: ColorMode::Adaptive,
            palette_size: 2,
            aspect_ratio: 1.0,
            resample: lg_core::config::Resample::Nearest,
            ..ConvertConfig::default()
        };
        let r = c.convert(&half_red_half_blue(20, 10), 10, &config).unwrap();
        let styles = r.styles.as_ref().unwrap();
        assert_eq!(styles.len(), 50);
        assert!(
            styles
                .iter()
                .all(|s| s.rgb == (255, 0, 0) || s.rgb == (0, 0, 255))
        );
        assert!(styles.iter().any(|s| s.rgb == (255, 0, 0)));
        assert!(styles.iter().any(|s| s.rgb == (0, 0, 255)));
    }

    #[test]
    fn palette_is_cached_until_invalidated() {
        let mut c = Converter::new();
        let config = ConvertConfig {
            color_mode: ColorMode::Adaptive,
            palette_size: 8,
            ..ConvertConfig::default()
        };
        let frame = half_red_half_blue(16, 16);
        c.convert(&frame, 8, &config).unwrap();
        c.convert(&frame, 8, &config).unwrap();
        assert_eq!(c.palette_cache().rebuilds(), 1);

        let desaturated = ConvertConfig {
            saturation: 0.5,
            ..config.clone()
        };
        c.convert(&frame, 8, &desaturated).unwrap();
        assert_eq!(c.palette_cache().rebuilds(), 2);

        c.invalidate_palette();
        c.convert(&frame, 8, &desaturated).unwrap();
        assert_eq!(c.palette_cache().rebuilds(), 3);
    }

    #[test]
    fn empty_ramp_is_refused() {
        let mut c = Converter::new();
        let err = c
            .convert(&FrameBuffer::filled(2, 2, (0, 0, 0)), 2, &mono(""))
            .unwrap_err();
        assert_eq!(err, CoreError::EmptyDensityRamp);
    }

    #[test]
    fn mismatched_buffer_is_refused() {
        let mut c = Converter::new();
        let frame = FrameBuffer {
            data: vec![0; 7],
            width: 2,
            height: 1,
        };
        assert!(matches!(
            c.convert(&frame, 2, &mono("#")),
            Err(CoreError::BufferSizeMismatch { expected: 8, actual: 7 })
        ));
    }

    #[test]
    fn zero_area_source_gives_single_empty_glyph() {
        let mut c = Converter::new();
        let r = c.convert(&FrameBuffer::new(0, 5), 40, &mono("#. ")).unwrap();
        assert_eq!(r.dimensions(), (1, 1));
        assert_eq!(r.chars, vec![' ']);
        assert!(r.styles.is_none());

        let colored = ConvertConfig {
            color_mode: ColorMode::Truecolor,
            ..mono("#. ")
        };
        let r = c.convert(&FrameBuffer::new(3, 0), 40, &colored).unwrap();
        assert_eq!(r.styles.unwrap()[0].rgb, MID_GRAY);
    }

    #[test]
    fn uniform_image_with_histogram_eq_keeps_value() {
        let mut c = Converter::new();
        let config = ConvertConfig {
            histogram_eq: true,
            ..mono("#. ")
        };
        let r = c
            .convert(&FrameBuffer::filled(6, 6, (255, 255, 255)), 6, &config)
            .unwrap();
        assert!(r.chars.iter().all(|&ch| ch == ' '));
    }

    #[test]
    fn monochrome_with_opacity_produces_styles() {
        let mut c = Converter::new();
        let config = ConvertConfig {
            brightness_as_opacity: true,
            ..mono("#. ")
        };
        let r = c
            .convert(&FrameBuffer::filled(4, 4, (0, 0, 0)), 4, &config)
            .unwrap();
        let styles = r.styles.unwrap();
        assert!(styles.iter().all(|s| s.rgb == (255, 255, 255) && s.opacity == 1.0));
    }

    #[test]
    fn aspect_ratio_drives_height() {
        let mut c = Converter::new();
        let config = ConvertConfig {
            aspect_ratio: 0.5,
            ..mono("#. ")
        };
        let r = c
            .convert(&FrameBuffer::filled(10, 10, (0, 0, 0)), 10, &config)
            .unwrap();
        assert_eq!(r.dimensions(), (10, 5));
        assert!(r.chars.iter().all(|&ch| ch == '#'));
    }
}
