use lg_core::charset::DensityRamp;
use lg_core::frame::LuminanceGrid;
use rayon::prelude::*;

/// Index du glyphe pour une luminance `v` et une rampe de `n` caractères.
///
/// `min(n − 1, floor(v × n))` : `v = 1.0` tombe sur le dernier index.
///
/// # Example
/// ```
/// use lg_ascii::glyph::glyph_index;
/// assert_eq!(glyph_index(0.0, 3), 0);
/// assert_eq!(glyph_index(0.5, 3), 1);
/// assert_eq!(glyph_index(1.0, 3), 2);
/// ```
#[inline(always)]
#[must_use]
pub fn glyph_index(v: f32, n: usize) -> usize {
    let n = n.max(1);
    ((v.clamp(0.0, 1.0) * n as f32) as usize).min(n - 1)
}

/// Maps every luminance value of `grid` to a glyph of `ramp`.
///
/// `ramp` is expected already reversed when inversion is requested. The
/// output is row-major, `grid.height` rows of `grid.width` characters.
///
/// # Example
/// ```
/// use lg_ascii::glyph::map_glyphs;
/// use lg_core::charset::DensityRamp;
/// use lg_core::frame::LuminanceGrid;
/// let ramp = DensityRamp::new("#. ").unwrap();
/// let grid = LuminanceGrid { values: vec![0.0, 0.5, 1.0], width: 3, height: 1 };
/// assert_eq!(map_glyphs(&grid, &ramp), vec!['#', '.', ' ']);
/// ```
#[must_use]
pub fn map_glyphs(grid: &LuminanceGrid, ramp: &DensityRamp) -> Vec<char> {
    let n = ramp.len();
    let mut out = Vec::with_capacity(grid.values.len());
    grid.values
        .par_iter()
        .map(|&v| ramp.glyph(glyph_index(v, n)))
        .collect_into_vec(&mut out);
    out
}
