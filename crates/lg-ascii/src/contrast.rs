//! Normalisation de la luminance : égalisation d'histogramme puis contraste linéaire.

use lg_core::frame::LuminanceGrid;

/// Number of histogram bins.
const BINS: usize = 256;

/// Applique les étages de contraste en place.
///
/// Ordre : égalisation d'histogramme (si demandée) puis contraste linéaire
/// (si `contrast ≠ 1`). Avec les valeurs neutres la grille n'est pas touchée.
///
/// # Example
/// ```
/// use lg_ascii::contrast::normalize;
/// use lg_core::frame::LuminanceGrid;
/// let mut grid = LuminanceGrid { values: vec![0.25, 0.75], width: 2, height: 1 };
/// normalize(&mut grid, 2.0, false);
/// assert_eq!(grid.values, vec![0.0, 1.0]);
/// ```
pub fn normalize(grid: &mut LuminanceGrid, contrast: f32, histogram_eq: bool) {
    if histogram_eq {
        equalize_histogram(&mut grid.values);
    }
    if (contrast - 1.0).abs() > f32::EPSILON {
        apply_contrast(&mut grid.values, contrast);
    }
}

#[inline(always)]
fn bin_of(v: f32) -> usize {
    // `as usize` sature les négatifs et NaN à 0.
    ((v * 255.0) as usize).min(BINS - 1)
}

/// Histogram equalization over 256 bins of `floor(v × 255)`.
///
/// Each value becomes `(cdf[bin] − cdf_min) / (N − cdf_min)`. When every
/// sample lands in a single bin the remap would divide by zero; the values
/// are then left untouched and `false` is returned.
///
/// # Example
/// ```
/// use lg_ascii::contrast::equalize_histogram;
/// let mut flat = vec![0.4; 16];
/// assert!(!equalize_histogram(&mut flat));
/// assert!(flat.iter().all(|&v| v == 0.4));
/// ```
pub fn equalize_histogram(values: &mut [f32]) -> bool {
    let total = values.len();
    if total == 0 {
        return false;
    }

    let mut histogram = [0u32; BINS];
    for &v in values.iter() {
        histogram[bin_of(v)] += 1;
    }

    let mut cdf = [0u32; BINS];
    let mut acc = 0u32;
    for (slot, &count) in cdf.iter_mut().zip(histogram.iter()) {
        acc += count;
        *slot = acc;
    }

    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
    if cdf_min as usize >= total {
        log::debug!("Histogramme dégénéré ({total} échantillons dans un seul bin), égalisation ignorée");
        return false;
    }

    let denom = (total as u32 - cdf_min) as f32;
    for v in values.iter_mut() {
        *v = (cdf[bin_of(*v)] - cdf_min) as f32 / denom;
    }
    true
}

/// Linear contrast around mid-gray: `v → clamp01((v − 0.5) × factor + 0.5)`.
///
/// # Example
/// ```
/// use lg_ascii::contrast::apply_contrast;
/// let mut v = vec![0.5, 0.6];
/// apply_contrast(&mut v, 3.0);
/// assert_eq!(v[0], 0.5);
/// assert!((v[1] - 0.8).abs() < 1e-6);
/// ```
pub fn apply_contrast(values: &mut [f32], factor: f32) {
    for v in values.iter_mut() {
        *v = ((*v - 0.5) * factor + 0.5).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(values: Vec<f32>) -> LuminanceGrid {
        let width = values.len() as u32;
        LuminanceGrid {
            values,
            width,
            height: 1,
        }
    }

    #[test]
    fn neutral_settings_leave_grid_untouched() {
        let original = vec![0.1, 0.33, 0.9];
        let mut g = grid(original.clone());
        normalize(&mut g, 1.0, false);
        assert_eq!(g.values, original);
    }

    #[test]
    fn uniform_grid_survives_equalization() {
        let mut g = grid(vec![1.0; 9]);
        normalize(&mut g, 1.0, true);
        assert!(g.values.iter().all(|&v| v == 1.0));

        let mut black = grid(vec![0.0; 9]);
        normalize(&mut black, 1.0, true);
        assert!(black.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn close_values_in_one_bin_are_left_untouched() {
        // 0.400, 0.401 et 0.402 tombent tous dans le bin 102.
        let mut v = vec![0.400, 0.401, 0.402];
        assert!(!equalize_histogram(&mut v));
        assert_eq!(v, vec![0.400, 0.401, 0.402]);
    }

    #[test]
    fn equalization_spreads_two_levels() {
        // Deux niveaux proches : après égalisation le plus sombre passe à 0, l'autre à 1.
        let mut v = vec![0.40, 0.40, 0.42, 0.42];
        assert!(equalize_histogram(&mut v));
        assert_eq!(v, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn equalization_is_monotonic() {
        let mut v: Vec<f32> = (0..50).map(|i| (i as f32 / 49.0).powi(2)).collect();
        equalize_histogram(&mut v);
        assert!(v.windows(2).all(|w| w[0] <= w[1]));
        assert!(v.iter().all(|x| (0.0..=1.0).contains(x)));
    }

    #[test]
    fn equalization_runs_before_contrast() {
        let mut a = grid(vec![0.40, 0.40, 0.42, 0.42]);
        normalize(&mut a, 0.5, true);
        // Égalisation → {0, 1}, puis contraste 0.5 → {0.25, 0.75}.
        assert_eq!(a.values, vec![0.25, 0.25, 0.75, 0.75]);
    }

    #[test]
    fn contrast_clamps_to_unit_range() {
        let mut v = vec![0.0, 1.0];
        apply_contrast(&mut v, 10.0);
        assert_eq!(v, vec![0.0, 1.0]);
    }
}
