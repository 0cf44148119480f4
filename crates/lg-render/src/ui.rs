use lg_core::config::{ColorMode, ConvertConfig};
use lg_core::frame::ConversionResult;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::canvas;
use crate::fps::FpsCounter;

/// Infos affichées dans la barre d'état.
#[derive(Clone, Debug, Default)]
pub struct StatusInfo {
    /// Nom de la rampe active.
    pub ramp_name: String,
    /// Source en pause.
    pub paused: bool,
    /// Dernier message (erreur de conversion, rechargement…).
    pub message: Option<String>,
}

/// Zone de la grille : tout l'écran moins la ligne d'état.
///
/// # Example
/// ```
/// use lg_render::ui::canvas_area;
/// use ratatui::layout::Rect;
/// assert_eq!(canvas_area(Rect::new(0, 0, 80, 24)), Rect::new(0, 0, 80, 23));
/// ```
#[must_use]
pub fn canvas_area(area: Rect) -> Rect {
    split(area)[0]
}

fn split(area: Rect) -> [Rect; 2] {
    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);
    [chunks[0], chunks[1]]
}

/// Draw the grid centered in the canvas area plus the status line.
pub fn draw(
    frame: &mut Frame,
    result: Option<&ConversionResult>,
    config: &ConvertConfig,
    background: (u8, u8, u8),
    fps: &FpsCounter,
    status: &StatusInfo,
) {
    let [canvas_rect, status_rect] = split(frame.area());

    if let Some(result) = result {
        let target = canvas::centered(canvas_rect, result.width, result.height);
        canvas::render_result(frame.buffer_mut(), target, result, background);
    }

    let line = status_line(result, config, fps, status);
    frame.render_widget(Paragraph::new(line), status_rect);
}

fn color_mode_str(mode: ColorMode) -> &'static str {
    match mode {
        ColorMode::Monochrome => "Mono",
        ColorMode::Truecolor => "True",
        ColorMode::FixedPalette => "Ansi256",
        ColorMode::Adaptive => "Adapt",
    }
}

fn flag(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

/// Ligne d'état : grille, FPS, réglages, aide clavier.
fn status_line<'a>(
    result: Option<&ConversionResult>,
    config: &ConvertConfig,
    fps: &FpsCounter,
    status: &'a StatusInfo,
) -> Line<'a> {
    let (w, h) = result.map_or((0, 0), ConversionResult::dimensions);
    let mut spans = vec![
        Span::styled(
            if status.paused { " ⏸ " } else { " ▶ " },
            Style::default().fg(Color::Green),
        ),
        Span::raw(format!(
            "{w}×{h} | {:.0} FPS | {} | {} | inv {} | eq {} | mir {} ",
            fps.fps(),
            color_mode_str(config.color_mode),
            status.ramp_name,
            flag(config.invert),
            flag(config.histogram_eq),
            flag(config.mirror),
        )),
        Span::styled(
            "+/- cols  i c h r m  ␣ ←/→  q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if let Some(msg) = &status.message {
        spans.push(Span::styled(
            format!("  {msg}"),
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn grid_and_status_are_drawn() {
        let mut terminal = Terminal::new(TestBackend::new(40, 5)).unwrap();
        let result = ConversionResult::new(vec!['#'; 4], None, 2, 2);
        let config = ConvertConfig::default();
        let status = StatusInfo {
            ramp_name: "Compact".into(),
            ..StatusInfo::default()
        };
        let fps = FpsCounter::new(4);
        terminal
            .draw(|f| draw(f, Some(&result), &config, (0, 0, 0), &fps, &status))
            .unwrap();

        let buf = terminal.backend().buffer();
        // Canvas 40×4, grille 2×2 centrée en (19, 1).
        assert_eq!(buf[(19, 1)].symbol(), "#");
        assert_eq!(buf[(20, 2)].symbol(), "#");
        let last_row: String = (0..40).map(|x| buf[(x, 4)].symbol().to_string()).collect();
        assert!(last_row.contains("2×2"));
        assert!(last_row.contains("Compact"));
    }
}
