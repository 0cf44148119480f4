// Décodage vidéo via subprocess ffmpeg (pas de binding natif).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
// Architecture :
//   - `probe_video`       : interroge ffprobe (width/height/fps)
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw RGBA sur stdout
//   - `spawn_video_thread`: thread dédié, lit les frames, gère les commandes
//   - `VideoSource`       : côté consommateur, implémente `Source`

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lg_core::frame::FrameBuffer;
use lg_core::traits::Source;

/// Taille du pool de frames pré-allouées.
/// Doit être > capacité du canal pour garantir un slot libre sans allocation.
const POOL_SIZE: usize = 6;

/// Capacité du canal de frames.
const FRAME_CHANNEL_CAP: usize = 3;

/// Plafond de résolution du pipe ffmpeg. Le convertisseur échantillonne
/// de toute façon à la taille de la grille.
const MAX_PIPE_SIZE: (u32, u32) = (640, 360);

/// Commandes pour le thread vidéo.
///
/// # Example
/// ```
/// use lg_source::video::VideoCommand;
/// let cmd = VideoCommand::Seek(5.0);
/// assert!(matches!(cmd, VideoCommand::Seek(_)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoCommand {
    /// Reprendre la lecture.
    Play,
    /// Mettre en pause.
    Pause,
    /// Sauter de `delta` secondes (positif = avance).
    Seek(f64),
    /// Arrêter le thread proprement.
    Quit,
}

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    /// Largeur native.
    pub width: u32,
    /// Hauteur native.
    pub height: u32,
    /// Images par seconde (ex: 23.976, 30.0).
    pub fps: f64,
}

/// Parse la sortie `default=noprint_wrappers=1` de ffprobe.
///
/// Valeurs absentes : 1920×1080 @ 30 fps. `r_frame_rate` est une fraction.
///
/// # Errors
/// Returns an error if a dimension parses as zero.
///
/// # Example
/// ```
/// use lg_source::video::parse_probe_output;
/// let info = parse_probe_output("width=1280\nheight=720\nr_frame_rate=30000/1001\n").unwrap();
/// assert_eq!((info.width, info.height), (1280, 720));
/// assert!((info.fps - 29.97).abs() < 0.01);
/// ```
pub fn parse_probe_output(text: &str) -> Result<VideoInfo> {
    let mut width: u32 = 1920;
    let mut height: u32 = 1080;
    let mut fps: f64 = 30.0;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().unwrap_or(1920);
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().unwrap_or(1080);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                fps = num / den;
            }
        }
    }

    if width == 0 || height == 0 {
        anyhow::bail!("Aucun flux vidéo décodable ({width}×{height})");
    }
    Ok(VideoInfo { width, height, fps })
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier
/// ne contient aucun flux vidéo décodable.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context("Impossible de lancer ffprobe. Vérifiez qu'il est installé et dans le PATH.")?;

    if !output.status.success() {
        anyhow::bail!("ffprobe a échoué sur {}", path.display());
    }

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("ffprobe : {}", path.display()))?;
    log::info!(
        "probe_video: {}x{} @ {:.3}fps — {}",
        info.width,
        info.height,
        info.fps,
        path.display()
    );
    Ok(info)
}

/// Taille du pipe : native, réduite pour tenir dans `max` en gardant le ratio.
/// Dimensions paires (contrainte du filtre scale).
///
/// # Example
/// ```
/// use lg_source::video::pipe_size;
/// assert_eq!(pipe_size(1920, 1080, (640, 360)), (640, 360));
/// assert_eq!(pipe_size(320, 240, (640, 360)), (320, 240));
/// assert_eq!(pipe_size(1080, 1920, (640, 360)), (202, 360));
/// ```
#[must_use]
pub fn pipe_size(width: u32, height: u32, max: (u32, u32)) -> (u32, u32) {
    let scale = (f64::from(max.0) / f64::from(width.max(1)))
        .min(f64::from(max.1) / f64::from(height.max(1)))
        .min(1.0);
    let even = |v: f64| ((v.round() as u32) & !1).max(2);
    (even(f64::from(width) * scale), even(f64::from(height) * scale))
}

/// Lance un processus `ffmpeg` qui écrit des frames RGBA brutes sur stdout.
///
/// Chaque frame = `w × h × 4` bytes (RGBA row-major, sans padding).
/// `-ss` avant `-i` = seek rapide sur keyframe. Retourne `None` si le spawn
/// échoue (log::warn émis).
#[must_use]
pub fn spawn_ffmpeg_pipe(path: &Path, w: u32, h: u32, pos_secs: f64, fps: u32) -> Option<Child> {
    let Some(path_str) = path.to_str() else {
        log::warn!("spawn_ffmpeg_pipe: chemin non-UTF8");
        return None;
    };

    let scale_filter = format!("scale={w}:{h}:flags=bilinear");
    let fps_str = fps.to_string();
    let pos_str = format!("{pos_secs:.3}");

    match Command::new("ffmpeg")
        .args([
            "-ss",
            &pos_str,
            "-i",
            path_str,
            "-vf",
            &scale_filter,
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-r",
            &fps_str,
            "-an",
            "-hide_banner",
            "-loglevel",
            "error",
            "pipe:1",
        ])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => {
            log::debug!("ffmpeg spawné: {w}x{h} @ {fps}fps depuis {pos_secs:.1}s");
            Some(child)
        }
        Err(e) => {
            log::warn!("spawn_ffmpeg_pipe: impossible de lancer ffmpeg: {e}");
            None
        }
    }
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// # Errors
/// `Ok(true)` si lu en entier, `Ok(false)` sur EOF avant complétion,
/// `Err` sur erreur I/O fatale.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false),
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Trouve ou crée un slot libre dans le pool.
///
/// Invariant : retourne `i` tel que `Arc::strong_count(&pool[i]) == 1`.
/// Pool saturé : alloue plutôt que bloquer.
fn find_or_create_slot(pool: &mut Vec<Arc<FrameBuffer>>, w: u32, h: u32) -> usize {
    if let Some(i) = pool.iter().position(|a| Arc::strong_count(a) == 1) {
        if pool[i].width != w || pool[i].height != h {
            pool[i] = Arc::new(FrameBuffer::new(w, h));
        }
        i
    } else {
        pool.push(Arc::new(FrameBuffer::new(w, h)));
        pool.len() - 1
    }
}

/// État du thread vidéo.
struct VideoState {
    w: u32,
    h: u32,
    pos_secs: f64,
    is_paused: bool,
    fps: u32,
    pool: Vec<Arc<FrameBuffer>>,
}

impl VideoState {
    fn new(info: &VideoInfo) -> Self {
        let (w, h) = pipe_size(info.width, info.height, MAX_PIPE_SIZE);
        Self {
            w,
            h,
            pos_secs: 0.0,
            is_paused: false,
            fps: info.fps.clamp(1.0, 60.0).round() as u32,
            pool: (0..POOL_SIZE)
                .map(|_| Arc::new(FrameBuffer::new(w, h)))
                .collect(),
        }
    }
}

/// `true` si le thread doit quitter (Quit reçu ou canal déconnecté).
/// Redémarre ffmpeg sur Seek.
fn process_commands(
    cmd_rx: &Receiver<VideoCommand>,
    state: &mut VideoState,
    child: &mut Option<Child>,
    path: &Path,
) -> bool {
    let mut need_restart = false;
    let quit = loop {
        match cmd_rx.try_recv() {
            Ok(VideoCommand::Quit) | Err(flume::TryRecvError::Disconnected) => break true,
            Ok(VideoCommand::Pause) => state.is_paused = true,
            Ok(VideoCommand::Play) => state.is_paused = false,
            Ok(VideoCommand::Seek(delta)) => {
                state.pos_secs = (state.pos_secs + delta).max(0.0);
                need_restart = true;
                log::debug!("Thread vidéo: Seek -> {:.1}s", state.pos_secs);
            }
            Err(flume::TryRecvError::Empty) => break false,
        }
    };
    if quit {
        kill(child);
        log::info!("Thread vidéo: arrêt demandé.");
        return true;
    }
    if need_restart {
        kill(child);
        *child = spawn_ffmpeg_pipe(path, state.w, state.h, state.pos_secs, state.fps);
    }
    false
}

fn kill(child: &mut Option<Child>) {
    if let Some(mut c) = child.take() {
        let _ = c.kill();
        let _ = c.wait();
    }
}

/// Spawne le thread de décodage vidéo.
///
/// Le thread lit les frames RGBA depuis stdout de ffmpeg et les envoie via
/// `frame_tx` au rythme du flux. Retourne le handle du thread et les
/// métadonnées natives.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou le fichier invalide.
pub fn spawn_video_thread(
    path: PathBuf,
    frame_tx: Sender<Arc<FrameBuffer>>,
    cmd_rx: Receiver<VideoCommand>,
    realtime: bool,
) -> Result<(thread::JoinHandle<()>, VideoInfo)> {
    let info = probe_video(&path)?;
    let handle = thread::Builder::new()
        .name("lg-video".to_string())
        .spawn(move || video_loop(&path, &frame_tx, &cmd_rx, info, realtime))
        .context("Impossible de spawner le thread vidéo")?;
    Ok((handle, info))
}

fn video_loop(
    path: &Path,
    frame_tx: &Sender<Arc<FrameBuffer>>,
    cmd_rx: &Receiver<VideoCommand>,
    info: VideoInfo,
    realtime: bool,
) {
    let mut state = VideoState::new(&info);
    let frame_period = Duration::from_secs_f64(1.0 / f64::from(state.fps));
    let mut child = spawn_ffmpeg_pipe(path, state.w, state.h, 0.0, state.fps);
    let mut last_frame = Instant::now();

    loop {
        if process_commands(cmd_rx, &mut state, &mut child, path) {
            return;
        }
        if state.is_paused {
            thread::sleep(Duration::from_millis(10));
            continue;
        }
        if realtime {
            if let Some(remaining) = frame_period.checked_sub(last_frame.elapsed()) {
                thread::sleep(remaining);
                continue;
            }
            last_frame = Instant::now();
        }

        let idx = find_or_create_slot(&mut state.pool, state.w, state.h);
        let Some(fb) = Arc::get_mut(&mut state.pool[idx]) else {
            continue;
        };

        let read_result = child
            .as_mut()
            .and_then(|c| c.stdout.as_mut())
            .map_or(Ok(false), |stdout| read_exact_or_eof(stdout, &mut fb.data));

        match read_result {
            Ok(true) => {
                // Non temps réel : `send` bloque, aucune frame perdue.
                if frame_tx.send(Arc::clone(&state.pool[idx])).is_err() {
                    break;
                }
                state.pos_secs += 1.0 / f64::from(state.fps);
            }
            Ok(false) => {
                log::info!("Thread vidéo: EOF à {:.1}s.", state.pos_secs);
                break;
            }
            Err(e) => {
                log::warn!("Thread vidéo: erreur lecture pipe: {e}");
                break;
            }
        }
    }
    kill(&mut child);
    log::info!("Thread vidéo terminé.");
}

/// Source vidéo : consommateur du thread de décodage.
///
/// `next_frame` ne bloque pas et rend la frame la plus récente ;
/// [`VideoSource::wait_frame`] bloque et rend chaque frame dans l'ordre.
pub struct VideoSource {
    frame_rx: Receiver<Arc<FrameBuffer>>,
    cmd_tx: Sender<VideoCommand>,
    last: Option<Arc<FrameBuffer>>,
    info: VideoInfo,
    handle: Option<thread::JoinHandle<()>>,
}

impl VideoSource {
    /// Probe `path` and start decoding.
    ///
    /// With `realtime` frames are paced at the stream rate; otherwise the
    /// decoder runs as fast as the consumer reads.
    ///
    /// # Errors
    /// Returns an error if ffprobe fails or the thread cannot be spawned.
    pub fn open(path: &Path, realtime: bool) -> Result<Self> {
        let (frame_tx, frame_rx) = flume::bounded(FRAME_CHANNEL_CAP);
        let (cmd_tx, cmd_rx) = flume::bounded(16);
        let (handle, info) = spawn_video_thread(path.to_path_buf(), frame_tx, cmd_rx, realtime)?;
        Ok(Self {
            frame_rx,
            cmd_tx,
            last: None,
            info,
            handle: Some(handle),
        })
    }

    /// Métadonnées ffprobe.
    #[must_use]
    pub fn info(&self) -> VideoInfo {
        self.info
    }

    /// Envoie une commande au thread (ignorée s'il est terminé).
    pub fn command(&self, cmd: VideoCommand) {
        let _ = self.cmd_tx.try_send(cmd);
    }

    /// Prochaine frame dans l'ordre, bloquant. `None` en fin de flux.
    pub fn wait_frame(&mut self) -> Option<Arc<FrameBuffer>> {
        let frame = self.frame_rx.recv().ok()?;
        self.last = Some(Arc::clone(&frame));
        Some(frame)
    }
}

impl Source for VideoSource {
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> {
        let mut disconnected = false;
        loop {
            match self.frame_rx.try_recv() {
                Ok(frame) => self.last = Some(frame),
                Err(flume::TryRecvError::Empty) => break,
                Err(flume::TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }
        if disconnected && self.last.is_none() {
            return None;
        }
        self.last.clone()
    }

    fn native_size(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn is_live(&self) -> bool {
        true
    }

    fn set_paused(&mut self, paused: bool) {
        self.command(if paused {
            VideoCommand::Pause
        } else {
            VideoCommand::Play
        });
    }

    fn seek(&mut self, delta_secs: f64) {
        self.command(VideoCommand::Seek(delta_secs));
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(VideoCommand::Quit);
        // Fermer le canal débloque un `send` en attente côté thread.
        let (_, closed) = flume::bounded(0);
        drop(std::mem::replace(&mut self.frame_rx, closed));
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
