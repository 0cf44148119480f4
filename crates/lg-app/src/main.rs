use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use clap::Parser;
use lg_core::config::{ConvertConfig, OutputConfig};
use lg_core::traits::Source;
use lg_source::image::ImageSource;

pub mod cli;
pub mod export;
pub mod hotreload;
pub mod preview;
#[cfg(feature = "video")]
pub mod stream;
pub mod worker;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider source et sorties
    cli.validate_source()?;
    cli.validate_output()?;

    // 4. Charger la config puis appliquer les surcharges CLI
    let overrides = cli.overrides();
    let (mut convert, mut output) = resolve_config(&cli.config)?;
    overrides.apply(&mut convert);
    overrides.apply_output(&mut output);

    if cli.preview {
        return run_preview(&cli, convert, output, overrides);
    }

    if let Some(path) = cli.video.as_deref() {
        return run_video(path, &convert, &output, cli.format.into());
    }

    let Some(path) = cli.image.as_deref() else {
        anyhow::bail!("Aucune source spécifiée. Utilisez --image ou --video.");
    };
    let frame = lg_source::image::load_image(path)?;
    let target = export::ExportTarget {
        format: cli.format.into(),
        output: cli.output.as_deref(),
        standalone: cli.standalone,
        png: cli.png.as_deref(),
        font: cli.font.as_deref(),
    };
    export::run_oneshot(&frame, &convert, &output, &target)?;
    Ok(())
}

/// Config absente : défauts + avertissement.
fn resolve_config(path: &Path) -> Result<(ConvertConfig, OutputConfig)> {
    if path.exists() {
        lg_core::config::load_config(path)
    } else {
        log::warn!("Config introuvable : {}. Utilisation des défauts.", path.display());
        Ok((ConvertConfig::default(), OutputConfig::default()))
    }
}

fn run_preview(
    cli: &cli::Cli,
    convert: ConvertConfig,
    output: OutputConfig,
    overrides: cli::Overrides,
) -> Result<()> {
    let source = open_source(cli)?;
    let config = Arc::new(ArcSwap::from_pointee(convert));

    // Le watcher doit vivre jusqu'à la fin de la boucle.
    let _watcher = if cli.config.exists() {
        Some(hotreload::spawn_config_watcher(&cli.config, &config, overrides)?)
    } else {
        None
    };

    let mut preview = preview::Preview::new(config, output, source)?;
    let terminal = ratatui::init();
    let result = preview.run(terminal);
    // Restaurer le terminal (TOUJOURS, même en cas d'erreur)
    ratatui::restore();
    result
}

fn open_source(cli: &cli::Cli) -> Result<Box<dyn Source>> {
    if let Some(path) = cli.image.as_deref() {
        return Ok(Box::new(ImageSource::new(path)?));
    }
    let Some(path) = cli.video.as_deref() else {
        anyhow::bail!("Aucune source spécifiée. Utilisez --image ou --video.");
    };
    open_video(path)
}

#[cfg(feature = "video")]
fn open_video(path: &Path) -> Result<Box<dyn Source>> {
    Ok(Box::new(lg_source::video::VideoSource::open(path, true)?))
}

#[cfg(not(feature = "video"))]
fn open_video(path: &Path) -> Result<Box<dyn Source>> {
    anyhow::bail!(
        "{} : la source vidéo requiert --features video",
        path.display()
    )
}

#[cfg(feature = "video")]
fn run_video(
    path: &Path,
    convert: &ConvertConfig,
    output: &OutputConfig,
    format: lg_export::writer::TextFormat,
) -> Result<()> {
    stream::run_stream(path, convert, output, format).map(|_| ())
}

#[cfg(not(feature = "video"))]
fn run_video(
    path: &Path,
    _convert: &ConvertConfig,
    _output: &OutputConfig,
    _format: lg_export::writer::TextFormat,
) -> Result<()> {
    anyhow::bail!(
        "{} : la source vidéo requiert --features video",
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let (c, o) = resolve_config(Path::new("/nonexistent/lumiglyph.toml")).unwrap();
        assert_eq!(c, ConvertConfig::default());
        assert_eq!(o, OutputConfig::default());
    }

    #[test]
    fn shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        let (c, o) = resolve_config(&path).unwrap();
        assert_eq!(c, ConvertConfig::default());
        assert_eq!(o, OutputConfig::default());
    }
}
