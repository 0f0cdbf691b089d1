//! Audio-only mode state machine
//!
//! ```text
//!            activate (menu / resumed after reload)
//!  Inactive ──────────────────────────────────────▶ Active
//!     │  marker already present  → reload                │ in-page navigation
//!     │  preview already loading → set flag + reload     │ → re-apply view
//!     ▼                                                  ▼
//!  (next document load starts Inactive again)          Active
//! ```
//!
//! There is no way back to `Inactive` inside one document: leaving the mode
//! means reloading the page.

use crate::error::Result;
use crate::host::{AudioModeBanner, FlagStore, NetworkHook, Page, PENDING_RELOAD_KEY};
use crate::interceptor::{RequestGate, SeekPreviewFilter};
use crate::source::{AudioResolver, AudioSourceHandle};
use crate::view::{SourceBinding, ViewMutator, DEFAULT_BACKDROP_OPACITY};
use pmobilibili::{LocatorError, MediaLocator, SEEK_PREVIEW_PATTERN};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default banner title
pub const DEFAULT_BANNER_TITLE: &str = "Audio mode";

/// Default banner hint
pub const DEFAULT_BANNER_HINT: &str = "Use the script menu to switch back";

/// Mode of the current document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeState {
    #[default]
    Inactive,
    Active,
}

/// Why an activation ended in a reload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadReason {
    /// The page already shows the audio-only banner
    MarkerPresent,
    /// A seek-preview image started loading before the gate was installed
    PreviewInFlight,
}

/// Result of an activation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Activated,
    /// A reload was requested; nothing else happens in this document
    ReloadRequested(ReloadReason),
    /// The location holds no media id; nothing was changed
    Aborted(LocatorError),
}

/// Result of an in-page navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Mode inactive or no media id in the new location
    Ignored,
    /// View re-applied; `restarted` tells whether a new resolution was started
    Reapplied { restarted: bool },
}

/// Tunables of the audio-only mode
#[derive(Debug, Clone, PartialEq)]
pub struct AudioOnlySettings {
    /// Substring identifying seek-preview requests
    pub seek_preview_pattern: String,
    pub backdrop_opacity: f32,
    pub banner: AudioModeBanner,
}

impl Default for AudioOnlySettings {
    fn default() -> Self {
        Self {
            seek_preview_pattern: SEEK_PREVIEW_PATTERN.to_string(),
            backdrop_opacity: DEFAULT_BACKDROP_OPACITY,
            banner: AudioModeBanner {
                title: DEFAULT_BANNER_TITLE.to_string(),
                hint: DEFAULT_BANNER_HINT.to_string(),
            },
        }
    }
}

/// Drives audio-only mode for one document
pub struct AudioOnlyController {
    page: Arc<dyn Page>,
    store: Arc<dyn FlagStore>,
    network: Arc<dyn NetworkHook>,
    resolver: Arc<dyn AudioResolver>,
    settings: AudioOnlySettings,
    view: ViewMutator,
    state: ModeState,
    gate: Option<Arc<RequestGate>>,
    source: Option<AudioSourceHandle>,
    binding: Option<JoinHandle<SourceBinding>>,
}

impl AudioOnlyController {
    /// Set up the controller for a freshly loaded document
    ///
    /// Resolution of the page's audio source starts right away so that it is
    /// ready by the time the mode is activated.
    pub fn load(
        page: Arc<dyn Page>,
        store: Arc<dyn FlagStore>,
        network: Arc<dyn NetworkHook>,
        resolver: Arc<dyn AudioResolver>,
        settings: AudioOnlySettings,
    ) -> Self {
        let source = match MediaLocator::from_url(&page.location()) {
            Ok(locator) => Some(AudioSourceHandle::spawn(Arc::clone(&resolver), locator)),
            Err(e) => {
                debug!("Not a video page, no resolution started: {}", e);
                None
            }
        };

        Self {
            page,
            store,
            network,
            resolver,
            view: ViewMutator::new(settings.backdrop_opacity),
            settings,
            state: ModeState::Inactive,
            gate: None,
            source,
            binding: None,
        }
    }

    pub fn state(&self) -> ModeState {
        self.state
    }

    pub fn source(&self) -> Option<&AudioSourceHandle> {
        self.source.as_ref()
    }

    /// Gate installed by this controller, if any
    pub fn gate(&self) -> Option<&Arc<RequestGate>> {
        self.gate.as_ref()
    }

    /// Take the handle of the latest source binding
    pub fn take_binding(&mut self) -> Option<JoinHandle<SourceBinding>> {
        self.binding.take()
    }

    /// Consume the pending-reload flag and activate if it was set
    ///
    /// Call once per document load, before any user interaction.
    pub fn resume_pending(&mut self) -> Result<Option<Activation>> {
        if !self.store.take_flag(PENDING_RELOAD_KEY)? {
            return Ok(None);
        }
        info!("Resuming audio-only mode after reload");
        self.activate().map(Some)
    }

    /// Switch the page to audio-only mode
    pub fn activate(&mut self) -> Result<Activation> {
        let locator = match MediaLocator::from_url(&self.page.location()) {
            Ok(locator) => locator,
            Err(e) => {
                debug!("Activation aborted: {}", e);
                return Ok(Activation::Aborted(e));
            }
        };

        if self.page.has_audio_marker() {
            info!("Audio-only banner already present, reloading");
            self.page.reload();
            return Ok(Activation::ReloadRequested(ReloadReason::MarkerPresent));
        }

        self.install_gate();

        if self
            .page
            .preview_image_source()
            .is_some_and(|src| !src.is_empty())
        {
            info!("Seek preview already loading, reloading into audio-only mode");
            self.store.set_flag(PENDING_RELOAD_KEY)?;
            self.page.reload();
            return Ok(Activation::ReloadRequested(ReloadReason::PreviewInFlight));
        }

        self.page.insert_audio_marker(&self.settings.banner);
        self.apply_view(locator)?;
        self.state = ModeState::Active;

        info!("Audio-only mode active");
        Ok(Activation::Activated)
    }

    /// React to an in-page URL change
    pub fn on_navigation(&mut self) -> Result<Navigation> {
        if self.state != ModeState::Active {
            return Ok(Navigation::Ignored);
        }

        let locator = match MediaLocator::from_url(&self.page.location()) {
            Ok(locator) => locator,
            Err(e) => {
                debug!("Navigation to a non-video location: {}", e);
                return Ok(Navigation::Ignored);
            }
        };

        let restarted = self.apply_view(locator)?;
        Ok(Navigation::Reapplied { restarted })
    }

    fn install_gate(&mut self) {
        if self.gate.is_some() {
            return;
        }

        let gate = Arc::new(RequestGate::new(SeekPreviewFilter::new(
            self.settings.seek_preview_pattern.clone(),
        )));
        if !self.network.install(Arc::clone(&gate)) {
            warn!("Network hook refused the seek-preview gate; previews may still load");
        }
        self.gate = Some(gate);
    }

    // Returns whether a new resolution had to be started for `locator`.
    fn apply_view(&mut self, locator: MediaLocator) -> Result<bool> {
        let (source, restarted) = match self.source.take() {
            Some(source) if *source.locator() == locator => (source, false),
            _ => {
                info!(locator = %locator, "Starting audio source resolution");
                (
                    AudioSourceHandle::spawn(Arc::clone(&self.resolver), locator),
                    true,
                )
            }
        };

        let binding = self.view.apply(&self.page, &source);
        self.source = Some(source);
        self.binding = Some(binding?);
        Ok(restarted)
    }
}

impl std::fmt::Debug for AudioOnlyController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioOnlyController")
            .field("state", &self.state)
            .field("gate", &self.gate)
            .field("source", &self.source)
            .finish()
    }
}
