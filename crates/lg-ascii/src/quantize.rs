//! Réduction de palette par median cut, avec cache explicite.

use std::collections::HashMap;

use lg_core::color::{Palette, Rgb, saturate};
use lg_core::frame::FrameBuffer;

/// Nombre maximal de pixels échantillonnés pour construire la palette.
pub const MAX_SAMPLES: usize = 10_000;

/// Couleur distincte et son nombre d'occurrences.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeightedColor {
    /// Canaux R, G, B.
    pub rgb: [u8; 3],
    /// Occurrences dans l'échantillon.
    pub weight: u32,
}

/// Échantillonne au plus [`MAX_SAMPLES`] pixels (pas constant) et les regroupe
/// par couleur exacte, dans l'ordre de première apparition.
///
/// Avec `saturation ≠ 1`, chaque couleur est d'abord rapprochée de sa propre
/// luminance pour que le regroupement reflète le rendu désaturé.
///
/// # Example
/// ```
/// use lg_ascii::quantize::collect_colors;
/// use lg_core::frame::FrameBuffer;
/// let colors = collect_colors(&FrameBuffer::filled(4, 4, (9, 9, 9)), 1.0);
/// assert_eq!(colors.len(), 1);
/// assert_eq!(colors[0].weight, 16);
/// ```
#[must_use]
pub fn collect_colors(pixels: &FrameBuffer, saturation: f32) -> Vec<WeightedColor> {
    let count = pixels.data.len() / 4;
    let step = count.div_ceil(MAX_SAMPLES).max(1);

    let mut index: HashMap<[u8; 3], usize> = HashMap::new();
    let mut colors: Vec<WeightedColor> = Vec::new();

    for px in pixels.data.chunks_exact(4).step_by(step) {
        let (r, g, b) = saturate((px[0], px[1], px[2]), saturation);
        let key = [r, g, b];
        if let Some(&i) = index.get(&key) {
            colors[i].weight += 1;
        } else {
            index.insert(key, colors.len());
            colors.push(WeightedColor {
                rgb: key,
                weight: 1,
            });
        }
    }
    colors
}

/// Median-cut palette of at most `k` colors built from the sampled cells.
///
/// When the sample holds `k` or fewer distinct colors they are returned as is,
/// in order of first appearance. Otherwise buckets are split at the median of
/// their widest channel down to depth `ceil(log2 k)`; each leaf yields its
/// weighted mean. An empty sample yields an empty palette.
///
/// # Example
/// ```
/// use lg_ascii::quantize::median_cut;
/// use lg_core::frame::FrameBuffer;
/// let mut fb = FrameBuffer::filled(4, 1, (255, 0, 0));
/// fb.set_pixel(3, 0, (0, 0, 255, 255));
/// let palette = median_cut(&fb, 2, 1.0);
/// assert_eq!(palette.colors(), &[(255, 0, 0), (0, 0, 255)]);
/// ```
#[must_use]
pub fn median_cut(pixels: &FrameBuffer, k: usize, saturation: f32) -> Palette {
    let k = k.clamp(1, 256);
    let mut colors = collect_colors(pixels, saturation);

    if colors.len() <= k {
        if colors.len() < k {
            log::debug!(
                "Palette : {} couleurs distinctes pour {k} demandées",
                colors.len()
            );
        }
        return Palette::from_colors(colors.iter().map(|c| (c.rgb[0], c.rgb[1], c.rgb[2])));
    }

    let depth = usize::BITS - (k - 1).leading_zeros();
    let mut leaves = Vec::with_capacity(1 << depth);
    cut(&mut colors, depth, &mut leaves);

    let unique = Palette::from_colors(leaves);
    Palette::from_colors(unique.colors().iter().copied().take(k))
}

/// Canal de plus grande étendue ; égalité → R, puis G, puis B.
fn widest_channel(colors: &[WeightedColor]) -> usize {
    let mut best = 0;
    let mut best_range = 0u8;
    for ch in 0..3 {
        let (lo, hi) = colors
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), c| (lo.min(c.rgb[ch]), hi.max(c.rgb[ch])));
        let range = hi.saturating_sub(lo);
        if range > best_range {
            best = ch;
            best_range = range;
        }
    }
    best
}

fn cut(colors: &mut [WeightedColor], depth: u32, out: &mut Vec<Rgb>) {
    if colors.is_empty() {
        return;
    }
    if depth == 0 || colors.len() == 1 {
        out.push(weighted_mean(colors));
        return;
    }
    let ch = widest_channel(colors);
    // Tri stable : l'ordre d'apparition départage les égalités.
    colors.sort_by_key(|c| c.rgb[ch]);
    let (low, high) = colors.split_at_mut(colors.len() / 2);
    cut(low, depth - 1, out);
    cut(high, depth - 1, out);
}

fn weighted_mean(colors: &[WeightedColor]) -> Rgb {
    let mut sum = [0u64; 3];
    let mut total = 0u64;
    for c in colors {
        let w = u64::from(c.weight);
        for (s, &v) in sum.iter_mut().zip(c.rgb.iter()) {
            *s += u64::from(v) * w;
        }
        total += w;
    }
    if total == 0 {
        return (0, 0, 0);
    }
    let avg = |s: u64| -> u8 { ((s + total / 2) / total).min(255) as u8 };
    (avg(sum[0]), avg(sum[1]), avg(sum[2]))
}

/// Cache key: requested color count and pre-adjustment saturation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteKey {
    /// Nombre de couleurs demandé.
    pub colors: u16,
    /// Saturation, bit à bit.
    pub saturation_bits: u32,
}

impl PaletteKey {
    /// Build a key.
    #[must_use]
    pub fn new(colors: u16, saturation: f32) -> Self {
        Self {
            colors,
            saturation_bits: saturation.to_bits(),
        }
    }
}

/// Single-entry palette cache, keyed by `(colors, saturation)`.
///
/// A different key rebuilds the palette. The owner must call
/// [`PaletteCache::invalidate`] when the source content changes.
///
/// # Example
/// ```
/// use lg_ascii::quantize::{PaletteCache, PaletteKey};
/// use lg_core::color::Palette;
/// let mut cache = PaletteCache::new();
/// let key = PaletteKey::new(8, 1.0);
/// cache.get_or_build(key, || Palette::from_colors([(1, 2, 3)]));
/// assert!(cache.is_cached(key));
/// cache.invalidate();
/// assert!(!cache.is_cached(key));
/// ```
#[derive(Debug, Default)]
pub struct PaletteCache {
    entry: Option<(PaletteKey, Palette)>,
    rebuilds: u64,
}

impl PaletteCache {
    /// Cache vide.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Palette en cache pour `key`, construite par `build` si absente ou périmée.
    pub fn get_or_build(&mut self, key: PaletteKey, build: impl FnOnce() -> Palette) -> &Palette {
        if !self.is_cached(key) {
            self.entry = None;
        }
        let (_, palette) = self.entry.get_or_insert_with(|| {
            let palette = build();
            self.rebuilds += 1;
            log::debug!(
                "Palette reconstruite : {} couleurs (demandé {}, rebuild #{})",
                palette.len(),
                key.colors,
                self.rebuilds
            );
            (key, palette)
        });
        palette
    }

    /// `true` if a palette for `key` is cached.
    #[must_use]
    pub fn is_cached(&self, key: PaletteKey) -> bool {
        self.entry.as_ref().is_some_and(|(k, _)| *k == key)
    }

    /// Oublie la palette (nouvelle image, changement de mode).
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Nombre de constructions depuis la création.
    #[must_use]
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_of(colors: &[Rgb]) -> FrameBuffer {
        let mut fb = FrameBuffer::new(colors.len() as u32, 1);
        for (x, &(r, g, b)) in colors.iter().enumerate() {
            fb.set_pixel(x as u32, 0, (r, g, b, 255));
        }
        fb
    }

    #[test]
    fn few_colors_are_returned_exactly() {
        let fb = frame_of(&[(1, 2, 3), (4, 5, 6), (1, 2, 3), (7, 8, 9)]);
        let p = median_cut(&fb, 16, 1.0);
        assert_eq!(p.colors(), &[(1, 2, 3), (4, 5, 6), (7, 8, 9)]);
    }

    #[test]
    fn two_colors_three_to_one() {
        let fb = frame_of(&[(10, 200, 30), (10, 200, 30), (10, 200, 30), (250, 5, 5)]);
        let p = median_cut(&fb, 2, 1.0);
        assert_eq!(p.len(), 2);
        assert!(p.colors().contains(&(10, 200, 30)));
        assert!(p.colors().contains(&(250, 5, 5)));
    }

    #[test]
    fn palette_never_exceeds_k_and_has_no_duplicates() {
        let colors: Vec<Rgb> = (0..200u32)
            .map(|i| ((i * 7 % 256) as u8, (i * 13 % 256) as u8, (i * 29 % 256) as u8))
            .collect();
        let fb = frame_of(&colors);
        for k in [2usize, 3, 5, 8, 16, 100] {
            let p = median_cut(&fb, k, 1.0);
            assert!(p.len() <= k, "k={k} len={}", p.len());
            assert!(!p.is_empty());
            for (i, a) in p.colors().iter().enumerate() {
                assert!(!p.colors()[i + 1..].contains(a));
            }
        }
    }

    #[test]
    fn median_cut_separates_clusters() {
        let mut colors = Vec::new();
        for i in 0..20u8 {
            colors.push((240 + i % 10, 0, 0));
            colors.push((0, 0, 240 + i % 10));
        }
        let p = median_cut(&frame_of(&colors), 2, 1.0);
        assert_eq!(p.len(), 2);
        assert!(p.colors().iter().any(|c| c.0 > 200 && c.2 == 0));
        assert!(p.colors().iter().any(|c| c.2 > 200 && c.0 == 0));
    }

    #[test]
    fn sampling_is_capped() {
        let fb = FrameBuffer::filled(200, 120, (3, 3, 3));
        let colors = collect_colors(&fb, 1.0);
        assert!(colors[0].weight as usize <= MAX_SAMPLES);
    }

    #[test]
    fn desaturation_applies_before_bucketing() {
        let fb = frame_of(&[(255, 0, 0), (0, 255, 0)]);
        let colors = collect_colors(&fb, 0.0);
        assert!(colors.iter().all(|c| c.rgb[0] == c.rgb[1] && c.rgb[1] == c.rgb[2]));
    }

    #[test]
    fn widest_channel_ties_prefer_red() {
        let colors = [
            WeightedColor { rgb: [0, 0, 0], weight: 1 },
            WeightedColor { rgb: [10, 10, 10], weight: 1 },
        ];
        assert_eq!(widest_channel(&colors), 0);
        let colors = [
            WeightedColor { rgb: [0, 0, 0], weight: 1 },
            WeightedColor { rgb: [0, 10, 10], weight: 1 },
        ];
        assert_eq!(widest_channel(&colors), 1);
    }

    #[test]
    fn cache_rebuilds_on_key_change_only() {
        let mut cache = PaletteCache::new();
        let a = PaletteKey::new(8, 1.0);
        let b = PaletteKey::new(8, 0.5);
        cache.get_or_build(a, || Palette::from_colors([(0, 0, 0)]));
        cache.get_or_build(a, || Palette::from_colors([(9, 9, 9)]));
        assert_eq!(cache.rebuilds(), 1);
        let p = cache.get_or_build(b, || Palette::from_colors([(9, 9, 9)]));
        assert_eq!(p.colors(), &[(9, 9, 9)]);
        assert_eq!(cache.rebuilds(), 2);
    }
}
