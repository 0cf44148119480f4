use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use arc_swap::ArcSwap;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use lg_ascii::sampler::fit_columns;
use lg_core::charset::PRESETS;
use lg_core::config::{ConvertConfig, OutputConfig};
use lg_core::frame::{ConversionResult, FrameBuffer};
use lg_core::traits::Source;
use lg_render::fps::FpsCounter;
use lg_render::ui::{self, StatusInfo};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;

use crate::worker::ConversionWorker;

const PRESET_NAMES: [&str; 4] = ["Compact", "Standard", "Blocks", "Minimal"];

/// Pas de déplacement (←/→) dans une source vidéo.
const SEEK_STEP_SECS: f64 = 5.0;

/// Prévisualisation interactive : source → worker → terminal.
pub struct Preview {
    config: Arc<ArcSwap<ConvertConfig>>,
    output: OutputConfig,
    worker: ConversionWorker,
    source: Box<dyn Source>,
    frame: Option<Arc<FrameBuffer>>,
    current: Option<ConversionResult>,
    /// Colonnes fixées au clavier ; `None` = auto-fit.
    columns: Option<u32>,
    /// Config de la dernière soumission (détecte un rechargement).
    submitted_config: Option<Arc<ConvertConfig>>,
    ramp_index: Option<usize>,
    canvas: Rect,
    fps: FpsCounter,
    status: StatusInfo,
    dirty: bool,
    quit: bool,
}

impl Preview {
    /// Build the preview around a source.
    ///
    /// # Errors
    /// Returns an error if the conversion thread cannot be spawned.
    pub fn new(
        config: Arc<ArcSwap<ConvertConfig>>,
        output: OutputConfig,
        source: Box<dyn Source>,
    ) -> Result<Self> {
        let ramp_index = PRESETS
            .iter()
            .position(|p| *p == config.load().density_ramp);
        let status = StatusInfo {
            ramp_name: ramp_name(ramp_index),
            ..StatusInfo::default()
        };
        let (w, h) = source.native_size();
        log::info!(
            "Prévisualisation : source {w}×{h}{}",
            if source.is_live() { " (flux)" } else { "" }
        );
        Ok(Self {
            config,
            output,
            worker: ConversionWorker::spawn()?,
            source,
            frame: None,
            current: None,
            columns: None,
            submitted_config: None,
            ramp_index,
            canvas: Rect::new(0, 0, 80, 23),
            fps: FpsCounter::new(30),
            status,
            dirty: true,
            quit: false,
        })
    }

    /// Main loop, paced at `target_fps`.
    ///
    /// # Errors
    /// Returns an error if terminal operations fail.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / f64::from(self.output.target_fps.max(1)));
        let mut last_tick = Instant::now();

        while !self.quit {
            let elapsed = last_tick.elapsed();
            if elapsed < frame_duration {
                if event::poll(frame_duration - elapsed)? {
                    self.handle_event(&event::read()?);
                }
                continue;
            }
            last_tick = Instant::now();

            while event::poll(Duration::ZERO)? {
                self.handle_event(&event::read()?);
            }

            let size = terminal.size()?;
            self.set_canvas(ui::canvas_area(Rect::new(0, 0, size.width, size.height)));
            self.pull_frame();
            self.submit_if_needed();
            self.collect_result();

            let config = self.config.load();
            let background = self.output.background;
            terminal.draw(|f| {
                ui::draw(
                    f,
                    self.current.as_ref(),
                    &config,
                    background,
                    &self.fps,
                    &self.status,
                );
            })?;
        }
        Ok(())
    }

    fn set_canvas(&mut self, canvas: Rect) {
        if canvas != self.canvas {
            log::debug!("Canvas : {}×{}", canvas.width, canvas.height);
            self.canvas = canvas;
            self.dirty = true;
        }
    }

    /// Nouvelle frame de la source : invalide la palette et redemande une conversion.
    fn pull_frame(&mut self) {
        if self.status.paused && self.frame.is_some() {
            return;
        }
        let Some(frame) = self.source.next_frame() else {
            return;
        };
        let is_new = self.frame.as_ref().is_none_or(|f| !Arc::ptr_eq(f, &frame));
        if is_new {
            self.frame = Some(frame);
            self.worker.invalidate_palette();
            self.dirty = true;
        }
    }

    /// Colonnes effectives : manuelles ou auto-fit sur le canvas.
    fn effective_columns(&self, frame: &FrameBuffer, aspect: f32) -> u32 {
        let max_cols = u32::from(self.canvas.width).max(1);
        let max_rows = u32::from(self.canvas.height).max(1);
        self.columns.unwrap_or_else(|| {
            fit_columns(frame.width, frame.height, aspect, max_cols, max_rows)
        })
    }

    fn submit_if_needed(&mut self) {
        let config = self.config.load_full();
        let reloaded = self
            .submitted_config
            .as_ref()
            .is_none_or(|c| !Arc::ptr_eq(c, &config));
        if !self.dirty && !reloaded {
            return;
        }
        let Some(frame) = self.frame.clone() else {
            return;
        };
        let columns = self.effective_columns(&frame, config.aspect_ratio);
        self.worker.submit(frame, columns, Arc::clone(&config));
        self.submitted_config = Some(config);
        self.dirty = false;
    }

    fn collect_result(&mut self) {
        let Some(out) = self.worker.try_latest() else {
            return;
        };
        // Périmé : garder l'affichage courant, la génération attendue arrive.
        if !self.worker.is_current(out.generation) && self.current.is_some() {
            log::debug!(
                "Résultat {} périmé (courant {})",
                out.generation,
                self.worker.generation()
            );
            return;
        }
        match out.result {
            Ok(result) => {
                self.current = Some(result);
                self.status.message = None;
                self.fps.tick();
                log::trace!(
                    "Conversion en {:.1} ms ({} palette(s) construites)",
                    out.elapsed.as_secs_f64() * 1000.0,
                    out.palette_rebuilds
                );
            }
            Err(e) => self.status.message = Some(e.to_string()),
        }
    }

    fn handle_event(&mut self, event: &Event) {
        if let Event::Key(key) = event
            && key.kind == KeyEventKind::Press
        {
            self.handle_key(key.code);
        } else if let Event::Resize(..) = event {
            self.dirty = true;
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char(' ') => {
                self.status.paused = !self.status.paused;
                self.source.set_paused(self.status.paused);
            }
            KeyCode::Left if self.source.is_live() => self.source.seek(-SEEK_STEP_SECS),
            KeyCode::Right if self.source.is_live() => self.source.seek(SEEK_STEP_SECS),
            KeyCode::Char('+' | '=') => self.step_columns(4),
            KeyCode::Char('-') => self.step_columns(-4),
            KeyCode::Char('0') => {
                self.columns = None;
                self.dirty = true;
            }
            KeyCode::Char('i') => self.toggle_config(|c| c.invert = !c.invert),
            KeyCode::Char('h') => self.toggle_config(|c| c.histogram_eq = !c.histogram_eq),
            KeyCode::Char('m') => self.toggle_config(|c| c.mirror = !c.mirror),
            KeyCode::Char('c') => {
                self.worker.invalidate_palette();
                self.toggle_config(|c| c.color_mode = c.color_mode.next());
            }
            KeyCode::Char('r') => {
                let next = self.ramp_index.map_or(0, |i| (i + 1) % PRESETS.len());
                self.ramp_index = Some(next);
                self.status.ramp_name = ramp_name(Some(next));
                self.toggle_config(|c| c.density_ramp = PRESETS[next].to_string());
            }
            _ => {}
        }
    }

    fn step_columns(&mut self, delta: i32) {
        let aspect = self.config.load().aspect_ratio;
        let current = match (&self.frame, self.columns) {
            (_, Some(cols)) => cols,
            (Some(frame), None) => self.effective_columns(frame, aspect),
            (None, None) => self.output.columns,
        };
        let next = current.saturating_add_signed(delta).clamp(1, 2000);
        self.columns = Some(next);
        self.dirty = true;
    }

    fn toggle_config(&mut self, mutate: impl FnOnce(&mut ConvertConfig)) {
        let config = self.config.load();
        let mut new = (**config).clone();
        mutate(&mut new);
        self.config.store(Arc::new(new));
        self.dirty = true;
    }
}

fn ramp_name(index: Option<usize>) -> String {
    index
        .and_then(|i| PRESET_NAMES.get(i))
        .map_or_else(|| "Custom".to_string(), |s| (*s).to_string())
}
