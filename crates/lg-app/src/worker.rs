//! Thread de conversion : une requête en vol, les suivantes fusionnées.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use lg_ascii::Converter;
use lg_core::config::ConvertConfig;
use lg_core::error::CoreError;
use lg_core::frame::{ConversionResult, FrameBuffer};

/// Demande de conversion, numérotée par génération.
#[derive(Clone, Debug)]
pub struct ConvertRequest {
    /// Génération (strictement croissante côté émetteur).
    pub generation: u64,
    /// Frame source.
    pub frame: Arc<FrameBuffer>,
    /// Colonnes demandées.
    pub columns: u32,
    /// Config figée pour cette requête.
    pub config: Arc<ConvertConfig>,
}

/// Message vers le thread de conversion.
#[derive(Clone, Debug)]
pub enum Job {
    /// Convertir une frame.
    Convert(ConvertRequest),
    /// Oublier la palette adaptative en cache.
    InvalidatePalette,
}

/// Résultat publié par le worker.
#[derive(Debug)]
pub struct ConvertOutput {
    /// Génération de la requête traitée.
    pub generation: u64,
    /// Conversion (ou erreur de config/buffer).
    pub result: Result<ConversionResult, CoreError>,
    /// Reconstructions de palette cumulées.
    pub palette_rebuilds: u64,
    /// Durée de la conversion.
    pub elapsed: Duration,
}

/// Lot de messages réduit à ce qui doit être exécuté.
#[derive(Debug, Default)]
pub struct Coalesced {
    /// Requête la plus récente, seule exécutée.
    pub latest: Option<ConvertRequest>,
    /// Une invalidation de palette était présente.
    pub invalidate: bool,
    /// Requêtes abandonnées au profit de `latest`.
    pub superseded: usize,
}

/// Réduit un lot de messages : la dernière requête l'emporte, les
/// invalidations se cumulent.
#[must_use]
pub fn coalesce(jobs: impl IntoIterator<Item = Job>) -> Coalesced {
    let mut out = Coalesced::default();
    for job in jobs {
        match job {
            Job::Convert(req) => {
                if out.latest.replace(req).is_some() {
                    out.superseded += 1;
                }
            }
            Job::InvalidatePalette => out.invalidate = true,
        }
    }
    out
}

/// Convertisseur sur thread dédié.
///
/// `submit` ne bloque jamais. Le consommateur écarte les résultats périmés
/// avec [`ConversionWorker::is_current`].
pub struct ConversionWorker {
    job_tx: Sender<Job>,
    result_rx: Receiver<ConvertOutput>,
    generation: u64,
    handle: Option<thread::JoinHandle<()>>,
}

impl ConversionWorker {
    /// Spawn the conversion thread.
    ///
    /// # Errors
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn() -> Result<Self> {
        let (job_tx, job_rx) = flume::unbounded();
        let (result_tx, result_rx) = flume::unbounded();
        let handle = thread::Builder::new()
            .name("lg-convert".to_string())
            .spawn(move || worker_loop(&job_rx, &result_tx))
            .context("Impossible de spawner le thread de conversion")?;
        Ok(Self {
            job_tx,
            result_rx,
            generation: 0,
            handle: Some(handle),
        })
    }

    /// Enqueue a conversion; returns its generation.
    pub fn submit(
        &mut self,
        frame: Arc<FrameBuffer>,
        columns: u32,
        config: Arc<ConvertConfig>,
    ) -> u64 {
        self.generation += 1;
        let request = ConvertRequest {
            generation: self.generation,
            frame,
            columns,
            config,
        };
        if self.job_tx.send(Job::Convert(request)).is_err() {
            log::warn!("Thread de conversion arrêté, requête {} perdue", self.generation);
        }
        self.generation
    }

    /// Invalide la palette avant la prochaine conversion.
    pub fn invalidate_palette(&self) {
        let _ = self.job_tx.send(Job::InvalidatePalette);
    }

    /// `true` si `generation` est la dernière soumise.
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Dernière génération soumise.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Draine les résultats disponibles, rend le plus récent.
    pub fn try_latest(&self) -> Option<ConvertOutput> {
        self.result_rx.try_iter().last()
    }
}

impl Drop for ConversionWorker {
    fn drop(&mut self) {
        // Fermer le canal termine la boucle du worker.
        let (closed, _) = flume::unbounded();
        drop(std::mem::replace(&mut self.job_tx, closed));
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop(job_rx: &Receiver<Job>, result_tx: &Sender<ConvertOutput>) {
    let mut converter = Converter::new();
    while let Ok(first) = job_rx.recv() {
        let batch = coalesce(std::iter::once(first).chain(job_rx.try_iter()));
        if batch.invalidate {
            converter.invalidate_palette();
        }
        if batch.superseded > 0 {
            log::debug!("Worker : {} requête(s) remplacée(s)", batch.superseded);
        }
        let Some(req) = batch.latest else {
            continue;
        };

        let start = Instant::now();
        let result = converter.convert(&req.frame, req.columns, &req.config);
        if let Err(e) = &result {
            log::warn!("Conversion {} échouée : {e}", req.generation);
        }
        let output = ConvertOutput {
            generation: req.generation,
            result,
            palette_rebuilds: converter.palette_cache().rebuilds(),
            elapsed: start.elapsed(),
        };
        if result_tx.send(output).is_err() {
            break;
        }
    }
    log::debug!("Thread de conversion terminé.");
}
