use ab_glyph::{Font, FontRef, PxScale, point};
use lg_core::color::Rgb;
use lg_core::frame::{ConversionResult, FrameBuffer};
use rayon::prelude::*;
use std::collections::HashMap;

/// Convertit un `ConversionResult` en pixels RGBA.
///
/// Atlas logiciel : chaque glyphe est rasterisé une fois en masque alpha
/// `char_width × char_height`, puis composité par cellule.
pub struct Rasterizer {
    char_width: u32,
    char_height: u32,
    /// Masque alpha par caractère (taille = char_width × char_height).
    glyph_cache: HashMap<char, Vec<u8>>,
    /// Repli pour un caractère absent de la police.
    empty_glyph: Vec<u8>,
}

impl Rasterizer {
    /// Charge la police et pré-calcule l'atlas (ASCII imprimable, Latin-1,
    /// blocs) plus les caractères de `extra` (rampe personnalisée).
    ///
    /// La cellule fait la largeur d'avance de `M` sur la hauteur de ligne.
    ///
    /// # Errors
    /// Retourne une erreur si la police fournie est invalide.
    pub fn new(font_data: &[u8], scale_px: f32, extra: &[char]) -> anyhow::Result<Self> {
        let font = FontRef::try_from_slice(font_data)?;
        let scale = PxScale::from(scale_px.max(1.0));

        let v_advance = font.ascent_unscaled() - font.descent_unscaled() + font.line_gap_unscaled();
        let height = (v_advance * scale.y / font.height_unscaled()).ceil() as u32;
        let h_advance = font.h_advance_unscaled(font.glyph_id('M'));
        let width = (h_advance * scale.x / font.height_unscaled()).ceil() as u32;

        let mut rasterizer = Self::with_cell_size(width, height);
        for range in [32..=126u32, 0x00A0..=0x00FF, 0x2580..=0x259F] {
            rasterizer.cache_chars(&font, scale, range.filter_map(char::from_u32));
        }
        rasterizer.cache_chars(&font, scale, extra.iter().copied());
        log::debug!(
            "Atlas : {} glyphes, cellule {}×{}",
            rasterizer.glyph_cache.len(),
            rasterizer.char_width,
            rasterizer.char_height
        );
        Ok(rasterizer)
    }

    fn with_cell_size(width: u32, height: u32) -> Self {
        let char_width = width.max(1);
        let char_height = height.max(1);
        Self {
            char_width,
            char_height,
            glyph_cache: HashMap::new(),
            empty_glyph: vec![0u8; (char_width * char_height) as usize],
        }
    }

    fn cache_chars(&mut self, font: &FontRef, scale: PxScale, chars: impl Iterator<Item = char>) {
        let ascent_px = font.ascent_unscaled() * scale.y / font.height_unscaled();
        for ch in chars {
            if self.glyph_cache.contains_key(&ch) {
                continue;
            }
            // glyph_id 0 = .notdef : pas de boîte « ? » dans l'export.
            let gid = font.glyph_id(ch);
            if gid.0 == 0 {
                continue;
            }

            let mut buffer = vec![0u8; (self.char_width * self.char_height) as usize];
            let glyph = gid.with_scale_and_position(scale, point(0.0, ascent_px));
            if let Some(outline) = font.outline_glyph(glyph) {
                let bounds = outline.px_bounds();
                #[allow(clippy::cast_possible_wrap)]
                outline.draw(|x, y, v| {
                    let px = (x as i32 + bounds.min.x as i32).max(0) as u32;
                    let py = (y as i32 + bounds.min.y as i32).max(0) as u32;
                    if px < self.char_width && py < self.char_height {
                        let idx = (py * self.char_width + px) as usize;
                        buffer[idx] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                    }
                });
            }
            self.glyph_cache.insert(ch, buffer);
        }
    }

    /// Taille d'une cellule en pixels.
    #[must_use]
    pub fn cell_size(&self) -> (u32, u32) {
        (self.char_width, self.char_height)
    }

    /// Dimensions du FrameBuffer pour une grille `grid_w × grid_h`.
    #[must_use]
    pub fn target_dimensions(&self, grid_w: u32, grid_h: u32) -> (u32, u32) {
        (grid_w * self.char_width, grid_h * self.char_height)
    }

    /// Rendu du résultat sur `fb`, cellule `(col, row)` à
    /// `(col × cellW, row × cellH)`.
    ///
    /// Couleur de la cellule = son style (opacité incluse) ou `foreground`
    /// sans styles ; mélangée sur `background` selon le masque du glyphe.
    /// Un `fb` aux mauvaises dimensions est laissé intact (log::error).
    pub fn render(
        &self,
        result: &ConversionResult,
        fb: &mut FrameBuffer,
        background: Rgb,
        foreground: Rgb,
    ) {
        let (expected_w, expected_h) = self.target_dimensions(result.width, result.height);
        let expected_len = expected_w as usize * expected_h as usize * 4;
        if fb.width != expected_w || fb.height != expected_h || fb.data.len() != expected_len {
            log::error!(
                "Rasterizer dimension mismatch: fb={}x{} expected={}x{}",
                fb.width,
                fb.height,
                expected_w,
                expected_h
            );
            return;
        }
        if fb.data.is_empty() {
            return;
        }

        let stride = (expected_w * 4) as usize;
        let band_size = stride * self.char_height as usize;
        let cw = self.char_width as usize;

        fb.data
            .par_chunks_exact_mut(band_size)
            .enumerate()
            .for_each(|(gy, band)| {
                for gx in 0..result.width {
                    let ch = result.char_at(gx, gy as u32);
                    let mask = self.glyph_cache.get(&ch).unwrap_or(&self.empty_glyph);
                    let (fg, opacity) = result
                        .style_at(gx, gy as u32)
                        .map_or((foreground, 1.0), |s| (s.rgb, s.opacity.clamp(0.0, 1.0)));

                    let x0 = gx as usize * cw;
                    for (cy, mask_row) in mask.chunks_exact(cw).enumerate() {
                        let row = &mut band[cy * stride + x0 * 4..cy * stride + (x0 + cw) * 4];
                        for (px, &alpha) in row.chunks_exact_mut(4).zip(mask_row) {
                            let a = f32::from(alpha) / 255.0 * opacity;
                            let mix = |f: u8, b: u8| -> u8 {
                                (f32::from(f) * a + f32::from(b) * (1.0 - a)).round() as u8
                            };
                            px[0] = mix(fg.0, background.0);
                            px[1] = mix(fg.1, background.1);
                            px[2] = mix(fg.2, background.2);
                            px[3] = 255;
                        }
                    }
                }
            });
    }

    /// Alloue un FrameBuffer à la bonne taille et y dessine le résultat.
    #[must_use]
    pub fn render_to_frame(
        &self,
        result: &ConversionResult,
        background: Rgb,
        foreground: Rgb,
    ) -> FrameBuffer {
        let (w, h) = self.target_dimensions(result.width, result.height);
        let mut fb = FrameBuffer::new(w, h);
        self.render(result, &mut fb, background, foreground);
        fb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_core::frame::CellStyle;

    /// Atlas 2×2 : '#' plein, ' ' vide.
    fn tiny() -> Rasterizer {
        let mut r = Rasterizer::with_cell_size(2, 2);
        r.glyph_cache.insert('#', vec![255; 4]);
        r.glyph_cache.insert(' ', vec![0; 4]);
        r
    }

    #[test]
    fn cells_land_at_their_grid_position() {
        let r = tiny();
        let result = ConversionResult::new(vec!['#', ' ', ' ', '#'], None, 2, 2);
        let fb = r.render_to_frame(&result, (0, 0, 0), (255, 255, 255));
        assert_eq!((fb.width, fb.height), (4, 4));
        assert_eq!(fb.pixel(0, 0), (255, 255, 255, 255));
        assert_eq!(fb.pixel(1, 1), (255, 255, 255, 255));
        assert_eq!(fb.pixel(2, 0), (0, 0, 0, 255));
        assert_eq!(fb.pixel(1, 2), (0, 0, 0, 255));
        assert_eq!(fb.pixel(3, 3), (255, 255, 255, 255));
    }

    #[test]
    fn opacity_blends_over_background() {
        let r = tiny();
        let styles = vec![CellStyle {
            rgb: (200, 100, 0),
            opacity: 0.5,
        }];
        let result = ConversionResult::new(vec!['#'], Some(styles), 1, 1);
        let fb = r.render_to_frame(&result, (0, 0, 100), (255, 255, 255));
        assert_eq!(fb.pixel(1, 1), (100, 50, 50, 255));
    }

    #[test]
    fn unknown_glyph_draws_background() {
        let r = tiny();
        let result = ConversionResult::new(vec!['é'], None, 1, 1);
        let fb = r.render_to_frame(&result, (7, 8, 9), (255, 255, 255));
        assert!(fb.data.chunks_exact(4).all(|px| px == [7, 8, 9, 255]));
    }

    #[test]
    fn target_is_grid_times_cell() {
        let r = tiny();
        assert_eq!(r.cell_size(), (2, 2));
        assert_eq!(r.target_dimensions(5, 3), (10, 6));
    }

    #[test]
    fn wrong_target_size_is_left_untouched() {
        let r = tiny();
        let result = ConversionResult::new(vec!['#'], None, 1, 1);
        let mut fb = FrameBuffer::new(3, 3);
        r.render(&result, &mut fb, (0, 0, 0), (255, 255, 255));
        assert!(fb.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn invalid_font_is_rejected() {
        assert!(Rasterizer::new(b"not a font", 16.0, &[]).is_err());
    }
}
