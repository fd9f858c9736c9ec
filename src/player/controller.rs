//! Playback state machine
//!
//! One [`PlayerController`] owns at most one live session. Starting a new
//! channel tears the previous session down first (engine destroyed, sink
//! cleared, timers cancelled) before the next engine is built. All engine
//! and sink events go through [`PlayerController::handle`], which drops
//! anything addressed to a session that is no longer live.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::PlayerError;
use crate::models::Channel;

use super::engine::{
    EngineConfig, EngineErrorType, MediaSink, PlayerEvent, PlayerNotice, QualityLevel,
    QualitySelection, SessionId, SinkErrorCode, StreamingBackend, StreamingEngine,
};
use super::scheduler::{RetryScheduler, RetryTicket};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSettings {
    /// Retries allowed per failure class before giving up
    pub max_retries: u32,
    /// Network retry `n` waits `n * retry_delay`
    pub retry_delay: Duration,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Recoverable failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Network,
    Media,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    /// Engine (or native source) set up, waiting for the sink binding
    Attaching,
    WaitingManifest,
    Playing,
    /// Recoverable error, retry `attempt` in progress
    Recovering { class: ErrorClass, attempt: u32 },
}

struct Session<E> {
    id: SessionId,
    channel: Channel,
    /// `None` when the sink plays the source natively
    engine: Option<E>,
    levels: Vec<QualityLevel>,
    selected_quality: QualitySelection,
    network_retries: u32,
    media_retries: u32,
    /// A network retry timer is pending
    retry_pending: bool,
}

pub struct PlayerController<B: StreamingBackend, S: MediaSink, R: RetryScheduler> {
    backend: B,
    sink: S,
    scheduler: R,
    settings: PlayerSettings,
    state: PlayerState,
    session: Option<Session<B::Engine>>,
    last_session: SessionId,
    notices: Vec<PlayerNotice>,
}

impl<B: StreamingBackend, S: MediaSink, R: RetryScheduler> PlayerController<B, S, R> {
    pub fn new(backend: B, sink: S, scheduler: R, settings: PlayerSettings) -> Self {
        Self {
            backend,
            sink,
            scheduler,
            settings,
            state: PlayerState::Idle,
            session: None,
            last_session: 0,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn current_channel(&self) -> Option<&Channel> {
        self.session.as_ref().map(|s| &s.channel)
    }

    /// Retries spent on `class` since playback last resumed
    pub fn retry_count(&self, class: ErrorClass) -> u32 {
        self.session.as_ref().map_or(0, |s| match class {
            ErrorClass::Network => s.network_retries,
            ErrorClass::Media => s.media_retries,
        })
    }

    pub fn quality_levels(&self) -> &[QualityLevel] {
        self.session.as_ref().map(|s| s.levels.as_slice()).unwrap_or(&[])
    }

    pub fn selected_quality(&self) -> QualitySelection {
        self.session.as_ref().map_or(QualitySelection::Auto, |s| s.selected_quality)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Take the notices raised since the last call
    pub fn drain_notices(&mut self) -> Vec<PlayerNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Start playing `channel`, replacing any live session.
    ///
    /// Fails with [`PlayerError::Unsupported`] when neither the engine nor
    /// the sink can play HLS; the controller then stays idle.
    pub fn play_channel(&mut self, channel: &Channel) -> Result<SessionId, PlayerError> {
        let engine_supported = self.backend.is_supported();
        if !engine_supported && !self.sink.can_play_native_hls() {
            error!("HLS is not supported on this client");
            self.close();
            return Err(PlayerError::Unsupported);
        }

        self.teardown();

        self.last_session += 1;
        let id = self.last_session;

        let engine = if engine_supported {
            let config = EngineConfig { headers: channel.request_headers() };
            let mut engine = self.backend.create(id, config);
            engine.attach_media();
            engine.load_source(&channel.link);
            Some(engine)
        } else {
            if !channel.request_headers().is_empty() {
                warn!("Native playback cannot send custom headers for {}", channel.name);
            }
            self.sink.set_source(&channel.link);
            None
        };

        info!(session = id, "Playing {} ({})", channel.name, channel.link);
        self.session = Some(Session {
            id,
            channel: channel.clone(),
            engine,
            levels: Vec::new(),
            selected_quality: QualitySelection::Auto,
            network_retries: 0,
            media_retries: 0,
            retry_pending: false,
        });
        self.transition(PlayerState::Attaching);
        self.notices.push(PlayerNotice::NowPlaying(channel.name.clone()));
        self.notices.push(PlayerNotice::Loading(true));

        Ok(id)
    }

    /// Stop playback and release the engine. No-op when idle.
    pub fn close(&mut self) {
        if self.teardown() {
            self.notices.push(PlayerNotice::Closed);
        }
    }

    /// Pin playback to a quality level, or go back to adaptive selection.
    ///
    /// Only takes effect once the manifest has been handled (`Playing` or
    /// `Recovering`); earlier requests are ignored.
    pub fn set_quality(&mut self, selection: QualitySelection) -> Result<(), PlayerError> {
        if !matches!(self.state, PlayerState::Playing | PlayerState::Recovering { .. }) {
            debug!("Ignoring quality change in state {:?}", self.state);
            return Ok(());
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        let level = match selection {
            QualitySelection::Auto => None,
            QualitySelection::Level(index) if index < session.levels.len() => Some(index),
            QualitySelection::Level(index) => {
                return Err(PlayerError::InvalidQualityLevel {
                    index,
                    available: session.levels.len(),
                });
            }
        };

        if let Some(engine) = session.engine.as_mut() {
            engine.set_current_level(level);
            session.selected_quality = selection;
            debug!(session = session.id, "Quality set to {:?}", selection);
            self.notices.push(PlayerNotice::QualityChanged(selection));
        }
        Ok(())
    }

    /// Feed one engine, sink or timer event into the state machine
    pub fn handle(&mut self, session: SessionId, event: PlayerEvent) {
        if self.session_id() != Some(session) {
            debug!(session, "Ignoring {:?} from a closed session", event);
            return;
        }

        match event {
            PlayerEvent::MediaAttached => {
                if self.state == PlayerState::Attaching {
                    self.transition(PlayerState::WaitingManifest);
                }
            }
            PlayerEvent::ManifestParsed { levels } => self.on_manifest_parsed(levels),
            PlayerEvent::LoadedMetadata => {
                let native = self.session.as_ref().is_some_and(|s| s.engine.is_none());
                if native && self.state == PlayerState::Attaching {
                    self.start_playback();
                }
            }
            PlayerEvent::LevelSwitched { level } => {
                debug!(session, "Switched to quality level {}", level);
            }
            PlayerEvent::Waiting => self.notices.push(PlayerNotice::Loading(true)),
            PlayerEvent::CanPlay => self.notices.push(PlayerNotice::Loading(false)),
            PlayerEvent::Playing => self.on_playing(),
            PlayerEvent::EngineError { kind, fatal, details } => {
                if !fatal {
                    debug!(session, "Non-fatal engine error ({:?}): {}", kind, details);
                    return;
                }
                match kind {
                    EngineErrorType::Network => self.on_recoverable(ErrorClass::Network, &details),
                    EngineErrorType::Media => self.on_recoverable(ErrorClass::Media, &details),
                    EngineErrorType::Other => self.fail(PlayerError::Fatal { details }),
                }
            }
            PlayerEvent::SinkError { code, message } => match code {
                SinkErrorCode::Network => self.on_recoverable(ErrorClass::Network, &message),
                SinkErrorCode::Decode => self.on_recoverable(ErrorClass::Media, &message),
                SinkErrorCode::Aborted | SinkErrorCode::SourceNotSupported => {
                    self.fail(PlayerError::Fatal { details: message })
                }
            },
            PlayerEvent::RetryElapsed { attempt } => self.on_retry_elapsed(attempt),
        }
    }

    fn on_manifest_parsed(&mut self, levels: Vec<QualityLevel>) {
        if matches!(self.state, PlayerState::Idle | PlayerState::Playing) {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            let labels: Vec<String> = levels.iter().map(QualityLevel::label).collect();
            debug!(session = session.id, "Manifest parsed, levels: {:?}", labels);
            session.levels = levels.clone();
            session.selected_quality = QualitySelection::Auto;
        }
        if !levels.is_empty() {
            self.notices.push(PlayerNotice::QualityLevels(levels));
        }
        self.start_playback();
    }

    fn start_playback(&mut self) {
        match self.sink.play() {
            Ok(()) => {
                self.leave_recovery();
                self.transition(PlayerState::Playing);
            }
            Err(reason) => self.fail(PlayerError::PlaybackRejected { reason }),
        }
    }

    fn clear_pending_retry(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.retry_pending {
                session.retry_pending = false;
                self.scheduler.cancel(session.id);
            }
        }
    }

    /// Playback is flowing again: drop any pending retry, reset both retry
    /// budgets and clear the error banner if one was up
    fn leave_recovery(&mut self) {
        // Sink may resume on its own while a retry is still pending
        self.clear_pending_retry();
        if let Some(session) = self.session.as_mut() {
            session.network_retries = 0;
            session.media_retries = 0;
        }
        if matches!(self.state, PlayerState::Recovering { .. }) {
            self.notices.push(PlayerNotice::ErrorCleared);
        }
    }

    fn on_playing(&mut self) {
        self.notices.push(PlayerNotice::Loading(false));
        self.leave_recovery();
        self.transition(PlayerState::Playing);
    }

    fn on_recoverable(&mut self, class: ErrorClass, details: &str) {
        let max = self.settings.max_retries;
        let delay_base = self.settings.retry_delay;
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if session.retry_pending {
            debug!(session = session.id, "Retry already scheduled, ignoring: {}", details);
            return;
        }
        if session.engine.is_none() {
            // Native playback has no recovery hooks
            self.fail(PlayerError::Fatal { details: details.to_string() });
            return;
        }
        let retries = match class {
            ErrorClass::Network => &mut session.network_retries,
            ErrorClass::Media => &mut session.media_retries,
        };
        if *retries >= max {
            let attempts = *retries;
            let error = match class {
                ErrorClass::Network => PlayerError::Network { attempts },
                ErrorClass::Media => PlayerError::Media { attempts },
            };
            self.fail(error);
            return;
        }

        *retries += 1;
        let attempt = *retries;
        let delay = match class {
            ErrorClass::Network => {
                let delay = delay_base * attempt;
                warn!(session = session.id, "Network error ({}), retry {}/{} in {:?}", details, attempt, max, delay);
                session.retry_pending = true;
                self.scheduler.schedule(delay, RetryTicket { session: session.id, attempt });
                Some(delay)
            }
            ErrorClass::Media => {
                warn!(session = session.id, "Media error ({}), recovery {}/{}", details, attempt, max);
                if let Some(engine) = session.engine.as_mut() {
                    engine.recover_media_error();
                }
                None
            }
        };

        self.notices.push(PlayerNotice::Retrying { attempt, max_attempts: max, delay });
        self.transition(PlayerState::Recovering { class, attempt });
    }

    fn on_retry_elapsed(&mut self, attempt: u32) {
        let expected = PlayerState::Recovering { class: ErrorClass::Network, attempt };
        if self.state != expected {
            debug!("Ignoring stale retry {}", attempt);
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.retry_pending {
            return;
        }
        session.retry_pending = false;
        if let Some(engine) = session.engine.as_mut() {
            info!(session = session.id, "Reloading stream, attempt {}", attempt);
            engine.start_load();
        }
    }

    /// Report a terminal failure once and end the session
    fn fail(&mut self, error: PlayerError) {
        error!(kind = ?error.kind(), "Playback failed: {}", error);
        self.notices.push(PlayerNotice::Error(error));
        self.close();
    }

    /// Destroy the live session, if any. Returns whether there was one.
    fn teardown(&mut self) -> bool {
        let Some(mut session) = self.session.take() else {
            return false;
        };

        self.scheduler.cancel(session.id);
        if let Some(mut engine) = session.engine.take() {
            engine.destroy();
        }
        self.sink.pause();
        self.sink.clear_source();
        debug!(session = session.id, "Session torn down");
        self.transition(PlayerState::Idle);
        true
    }

    fn transition(&mut self, next: PlayerState) {
        if self.state != next {
            debug!("Player state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
