use lg_core::color::Rgb;
use lg_core::frame::ConversionResult;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

/// Écrit directement un `ConversionResult` dans un `ratatui::Buffer`.
///
/// Pas de widget : écriture cellule par cellule, tronquée à `area`.
/// L'opacité est pré-mélangée sur `background` ; un fond noir laisse le fond
/// du terminal intact.
///
/// # Example
/// ```
/// use lg_core::frame::ConversionResult;
/// use lg_render::canvas::render_result;
/// use ratatui::buffer::Buffer;
/// use ratatui::layout::Rect;
///
/// let result = ConversionResult::new(vec!['#', '.'], None, 2, 1);
/// let mut buf = Buffer::empty(Rect::new(0, 0, 4, 1));
/// render_result(&mut buf, Rect::new(0, 0, 4, 1), &result, (0, 0, 0));
/// assert_eq!(buf[(0, 0)].symbol(), "#");
/// assert_eq!(buf[(1, 0)].symbol(), ".");
/// ```
pub fn render_result(buf: &mut Buffer, area: Rect, result: &ConversionResult, background: Rgb) {
    let rows = result.height.min(u32::from(area.height));
    let cols = result.width.min(u32::from(area.width));
    let bg = (background != (0, 0, 0)).then(|| to_color(background));
    if rows < result.height || cols < result.width {
        log::trace!(
            "Grille {}×{} tronquée à {}×{}",
            result.width,
            result.height,
            cols,
            rows
        );
    }

    for cy in 0..rows {
        for cx in 0..cols {
            // cx < area.width, cy < area.height : conversions sans perte
            let pos = (area.x + cx as u16, area.y + cy as u16);
            let Some(cell) = buf.cell_mut(pos) else {
                continue;
            };
            cell.set_char(result.char_at(cx, cy));
            if let Some(style) = result.style_at(cx, cy) {
                cell.set_fg(to_color(style.blend_over(background)));
            }
            if let Some(bg) = bg {
                cell.set_bg(bg);
            }
        }
    }
}

/// Zone centrée de la taille du résultat (tronquée à `area`).
///
/// # Example
/// ```
/// use lg_render::canvas::centered;
/// use ratatui::layout::Rect;
/// assert_eq!(centered(Rect::new(0, 0, 10, 4), 6, 2), Rect::new(2, 1, 6, 2));
/// ```
#[must_use]
pub fn centered(area: Rect, width: u32, height: u32) -> Rect {
    let w = width.min(u32::from(area.width)) as u16;
    let h = height.min(u32::from(area.height)) as u16;
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

#[inline]
fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_core::frame::CellStyle;

    #[test]
    fn styles_are_blended_over_background() {
        let styles = vec![CellStyle {
            rgb: (200, 100, 0),
            opacity: 0.5,
        }];
        let result = ConversionResult::new(vec!['@'], Some(styles), 1, 1);
        let area = Rect::new(0, 0, 1, 1);
        let mut buf = Buffer::empty(area);
        render_result(&mut buf, area, &result, (0, 0, 0));
        assert_eq!(buf[(0, 0)].fg, Color::Rgb(100, 50, 0));
        assert_eq!(buf[(0, 0)].bg, Color::Reset);
    }

    #[test]
    fn non_black_background_is_painted() {
        let result = ConversionResult::new(vec!['x'], None, 1, 1);
        let area = Rect::new(0, 0, 1, 1);
        let mut buf = Buffer::empty(area);
        render_result(&mut buf, area, &result, (10, 20, 30));
        assert_eq!(buf[(0, 0)].bg, Color::Rgb(10, 20, 30));
        assert_eq!(buf[(0, 0)].fg, Color::Reset);
    }

    #[test]
    fn oversized_result_is_clipped() {
        let result = ConversionResult::new(vec!['a'; 12], None, 4, 3);
        let area = Rect::new(1, 1, 2, 2);
        let mut buf = Buffer::empty(Rect::new(0, 0, 4, 4));
        render_result(&mut buf, area, &result, (0, 0, 0));
        assert_eq!(buf[(1, 1)].symbol(), "a");
        assert_eq!(buf[(2, 2)].symbol(), "a");
        assert_eq!(buf[(3, 3)].symbol(), " ");
        assert_eq!(buf[(0, 0)].symbol(), " ");
    }
}
