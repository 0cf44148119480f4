//! Conversion vidéo en flux : chaque frame décodée est imprimée en ANSI/texte.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use lg_ascii::Converter;
use lg_core::config::{ConvertConfig, OutputConfig};
use lg_export::writer::{TextFormat, format_result};
use lg_source::video::VideoSource;

/// Retour curseur en haut à gauche entre deux frames.
const HOME: &str = "\x1b[H";

/// Decode `path` frame by frame until end of stream or Ctrl+C.
///
/// # Errors
/// Returns an error if the video cannot be opened or stdout fails.
pub fn run_stream(
    path: &Path,
    config: &ConvertConfig,
    output: &OutputConfig,
    format: TextFormat,
) -> Result<u64> {
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("Impossible d'installer le handler Ctrl+C")?;
    }

    let mut source = VideoSource::open(path, false)?;
    let info = source.info();
    log::info!("Flux {}×{} @ {:.2} fps", info.width, info.height, info.fps);

    let mut converter = Converter::new();
    let mut stdout = std::io::stdout().lock();
    let mut frames = 0_u64;
    write!(stdout, "\x1b[2J").context("Écriture stdout")?;

    while running.load(Ordering::SeqCst) {
        let Some(frame) = source.wait_frame() else {
            break;
        };
        converter.invalidate_palette();
        let result = match converter.convert(&frame, output.columns, config) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Frame {frames} ignorée : {e}");
                continue;
            }
        };
        let text = format_result(&result, format, output.background);
        stdout.write_all(HOME.as_bytes()).context("Écriture stdout")?;
        stdout.write_all(text.as_bytes()).context("Écriture stdout")?;
        stdout.flush().context("Écriture stdout")?;
        frames += 1;
    }

    log::info!("{frames} frame(s) converties.");
    Ok(frames)
}
