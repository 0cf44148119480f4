use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};
use lg_core::color::luminance;
use lg_core::config::Resample;
use lg_core::error::CoreError;
use lg_core::frame::{FrameBuffer, LuminanceGrid};
use rayon::prelude::*;

/// Dimensions de la grille de caractères pour une source `(src_w, src_h)`.
///
/// `H = round(W × (src_h / src_w) × aspect)`, au minimum 1.
/// Une source vide donne une grille 1×1.
///
/// # Example
/// ```
/// use lg_ascii::sampler::grid_size;
/// assert_eq!(grid_size(200, 100, 80, 0.5), (80, 20));
/// assert_eq!(grid_size(10, 10, 10, 1.0), (10, 10));
/// assert_eq!(grid_size(0, 10, 10, 1.0), (1, 1));
/// ```
#[must_use]
pub fn grid_size(src_w: u32, src_h: u32, columns: u32, aspect: f32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (1, 1);
    }
    let w = columns.max(1);
    let h = (f64::from(w) * (f64::from(src_h) / f64::from(src_w)) * f64::from(aspect)).round();
    let h = if h.is_finite() { h.clamp(1.0, f64::from(u32::MAX)) as u32 } else { 1 };
    (w, h)
}

/// Plus grand nombre de colonnes dont la grille tient dans `max_cols × max_rows`.
///
/// Utilisé par l'auto-fit du terminal. Retourne au moins 1.
///
/// # Example
/// ```
/// use lg_ascii::sampler::{fit_columns, grid_size};
/// let cols = fit_columns(1920, 1080, 0.5, 200, 40);
/// assert!(grid_size(1920, 1080, cols, 0.5).1 <= 40);
/// assert!(grid_size(1920, 1080, cols + 1, 0.5).1 > 40 || cols == 200);
/// ```
#[must_use]
pub fn fit_columns(src_w: u32, src_h: u32, aspect: f32, max_cols: u32, max_rows: u32) -> u32 {
    let max_cols = max_cols.max(1);
    let fits = |w: u32| grid_size(src_w, src_h, w, aspect).1 <= max_rows.max(1);
    if fits(max_cols) {
        return max_cols;
    }
    // H est monotone en W : recherche dichotomique.
    let (mut lo, mut hi) = (1u32, max_cols);
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Rééchantillonneur réutilisable wrappant fast_image_resize.
///
/// Garde ses buffers de travail d'un appel à l'autre : zéro allocation
/// tant que les dimensions ne changent pas.
///
/// # Example
/// ```
/// use lg_ascii::sampler::Sampler;
/// use lg_core::config::Resample;
/// use lg_core::frame::FrameBuffer;
/// let mut s = Sampler::new();
/// let src = FrameBuffer::filled(40, 20, (255, 255, 255));
/// let out = s.sample(&src, 10, 5, Resample::Bilinear, false).unwrap();
/// assert_eq!((out.width, out.height), (10, 5));
/// ```
pub struct Sampler {
    inner: FirResizer,
    /// Scratch copy of the source (fast_image_resize wants `&mut` on the source).
    src_buf: Vec<u8>,
    /// Cell-resolution output, reused across calls.
    dst: FrameBuffer,
}

impl Sampler {
    /// Create a new sampler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            src_buf: Vec::new(),
            dst: FrameBuffer::new(0, 0),
        }
    }

    /// Rescale `src` to `width × height`, one RGBA sample per output cell.
    ///
    /// With `mirror` the X axis is reversed. Alpha is carried but never
    /// applied to RGB, whether or not the source is rescaled.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if the source or target is empty or
    /// the resampler rejects the buffers.
    pub fn sample(
        &mut self,
        src: &FrameBuffer,
        width: u32,
        height: u32,
        resample: Resample,
        mirror: bool,
    ) -> Result<&FrameBuffer, CoreError> {
        if src.is_empty() {
            return Err(CoreError::InvalidDimensions {
                width: src.width,
                height: src.height,
            });
        }
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        if self.dst.width != width || self.dst.height != height {
            self.dst = FrameBuffer::new(width, height);
        }

        if src.width == width && src.height == height {
            self.dst.data.copy_from_slice(&src.data);
        } else {
            self.resize(src, resample)?;
        }

        if mirror {
            mirror_rows(&mut self.dst);
        }
        Ok(&self.dst)
    }

    fn resize(&mut self, src: &FrameBuffer, resample: Resample) -> Result<(), CoreError> {
        let invalid = |e: &dyn std::fmt::Display, w: u32, h: u32| {
            log::warn!("Rééchantillonnage refusé ({w}×{h}) : {e}");
            CoreError::InvalidDimensions {
                width: w,
                height: h,
            }
        };

        self.src_buf.clear();
        self.src_buf.extend_from_slice(&src.data);

        let src_image =
            Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8x4)
                .map_err(|e| invalid(&e, src.width, src.height))?;

        let (dw, dh) = (self.dst.width, self.dst.height);
        let mut dst_image = Image::from_slice_u8(dw, dh, &mut self.dst.data, PixelType::U8x4)
            .map_err(|e| invalid(&e, dw, dh))?;

        // Alpha ignoré : le RGB stocké compte, comme pour la copie directe.
        let options = ResizeOptions::new()
            .resize_alg(match resample {
                Resample::Nearest => ResizeAlg::Nearest,
                Resample::Box => ResizeAlg::Convolution(FilterType::Box),
                Resample::Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
            })
            .use_alpha(false);

        self.inner
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| invalid(&e, dw, dh))
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Inverse l'ordre des pixels de chaque ligne, en place.
fn mirror_rows(fb: &mut FrameBuffer) {
    let stride = fb.width as usize * 4;
    for row in fb.data.chunks_exact_mut(stride) {
        row.reverse();
        for px in row.chunks_exact_mut(4) {
            px.reverse();
        }
    }
}

/// Luminance BT.601 normalisée de chaque cellule.
///
/// # Example
/// ```
/// use lg_ascii::sampler::luminance_grid;
/// use lg_core::frame::FrameBuffer;
/// let grid = luminance_grid(&FrameBuffer::filled(3, 2, (255, 255, 255)));
/// assert!(grid.values.iter().all(|v| (v - 1.0).abs() < 1e-6));
/// ```
#[must_use]
pub fn luminance_grid(pixels: &FrameBuffer) -> LuminanceGrid {
    let mut grid = LuminanceGrid::new(pixels.width, pixels.height);
    pixels
        .data
        .par_chunks_exact(4)
        .map(|p| luminance(p[0], p[1], p[2]))
        .collect_into_vec(&mut grid.values);
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_rounds_and_clamps() {
        assert_eq!(grid_size(1000, 10, 10, 0.5), (10, 1));
        assert_eq!(grid_size(100, 100, 0, 0.5), (1, 1));
        assert_eq!(grid_size(300, 200, 90, 0.55), (90, 33));
    }

    #[test]
    fn fit_columns_respects_rows() {
        assert_eq!(fit_columns(100, 100, 1.0, 80, 24), 24);
        assert_eq!(fit_columns(100, 10, 0.5, 80, 24), 80);
        assert_eq!(fit_columns(10, 1000, 1.0, 80, 0), 1);
    }

    #[test]
    fn mirror_reverses_x() {
        let mut src = FrameBuffer::new(3, 1);
        src.set_pixel(0, 0, (10, 0, 0, 255));
        src.set_pixel(1, 0, (20, 0, 0, 255));
        src.set_pixel(2, 0, (30, 0, 0, 255));
        let mut s = Sampler::new();
        let out = s.sample(&src, 3, 1, Resample::Nearest, true).unwrap();
        assert_eq!(out.pixel(0, 0), (30, 0, 0, 255));
        assert_eq!(out.pixel(2, 0), (10, 0, 0, 255));
    }

    #[test]
    fn uniform_source_stays_uniform() {
        let src = FrameBuffer::filled(64, 48, (0, 0, 0));
        let mut s = Sampler::new();
        for resample in [Resample::Nearest, Resample::Box, Resample::Bilinear] {
            let out = s.sample(&src, 7, 3, resample, false).unwrap();
            assert!(out.data.chunks_exact(4).all(|p| p[..3] == [0, 0, 0]));
        }
    }

    #[test]
    fn transparent_pixels_keep_their_rgb_at_any_scale() {
        let mut src = FrameBuffer::filled(8, 8, (255, 255, 255));
        for px in src.data.chunks_exact_mut(4) {
            px[3] = 0;
        }
        let mut s = Sampler::new();
        for resample in [Resample::Nearest, Resample::Box, Resample::Bilinear] {
            for (w, h) in [(8, 8), (4, 4), (3, 2)] {
                let out = s.sample(&src, w, h, resample, false).unwrap();
                assert!(
                    out.data.chunks_exact(4).all(|p| p[..3].iter().all(|&c| c >= 250)),
                    "{resample:?} {w}×{h}"
                );
            }
        }
    }

    #[test]
    fn empty_source_is_rejected() {
        let mut s = Sampler::new();
        assert!(s.sample(&FrameBuffer::new(0, 4), 2, 2, Resample::Box, false).is_err());
    }

    #[test]
    fn luminance_uses_bt601() {
        let grid = luminance_grid(&FrameBuffer::filled(1, 1, (255, 0, 0)));
        assert!((grid.values[0] - 0.299).abs() < 1e-4);
    }
}
