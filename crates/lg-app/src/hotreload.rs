use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use lg_core::config::{ConvertConfig, load_config};
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::cli::Overrides;

/// Recharge la config depuis `path`, réapplique les surcharges CLI et
/// publie le résultat. Une config invalide laisse l'ancienne en place.
///
/// Retourne `true` si une nouvelle config a été publiée.
pub fn reload_into(path: &Path, overrides: &Overrides, config: &ArcSwap<ConvertConfig>) -> bool {
    match load_config(path) {
        Ok((mut convert, _)) => {
            overrides.apply(&mut convert);
            config.store(Arc::new(convert));
            log::info!("Config rechargée depuis {}", path.display());
            true
        }
        Err(e) => {
            log::warn!("Erreur de rechargement config : {e:#}");
            false
        }
    }
}

/// Surveille le fichier config et met à jour l'ArcSwap à chaque modification.
///
/// Retourne le Watcher (doit rester vivant tant que l'app tourne).
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot be watched.
pub fn spawn_config_watcher(
    config_path: &Path,
    config: &Arc<ArcSwap<ConvertConfig>>,
    overrides: Overrides,
) -> Result<impl Watcher + use<>> {
    let config = Arc::clone(config);
    let path = config_path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res
            && matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        {
            reload_into(&path, &overrides, &config);
        }
    })?;

    watcher.watch(config_path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
