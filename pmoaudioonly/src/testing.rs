//! In-memory collaborators
//!
//! Used by the unit and integration tests, and handy for driving a session
//! without a browser.

use crate::error::Result;
use crate::host::{AudioModeBanner, FlagStore, MetaEntry, NetworkHook, Page};
use crate::interceptor::RequestGate;
use crate::source::AudioResolver;
use async_trait::async_trait;
use pmobilibili::MediaLocator;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

// ============================================================================
// Page
// ============================================================================

#[derive(Debug, Default)]
struct PageState {
    location: String,
    marker: Option<AudioModeBanner>,
    preview_image: Option<String>,
    meta: Vec<MetaEntry>,
    media_element: bool,
    media_style: Option<String>,
    media_source: Option<String>,
    reloads: usize,
}

/// Page double recording every mutation
#[derive(Debug, Default)]
pub struct FakePage {
    state: Mutex<PageState>,
}

impl FakePage {
    /// Page at `location` with a media element and nothing else
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(PageState {
                location: location.into(),
                media_element: true,
                ..PageState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seek-preview image element with the given source (may be empty)
    pub fn with_preview_image(self, src: impl Into<String>) -> Self {
        self.state().preview_image = Some(src.into());
        self
    }

    pub fn with_meta(self, entry: MetaEntry) -> Self {
        self.state().meta.push(entry);
        self
    }

    pub fn with_marker(self, banner: AudioModeBanner) -> Self {
        self.state().marker = Some(banner);
        self
    }

    pub fn without_media_element(self) -> Self {
        self.state().media_element = false;
        self
    }

    /// Simulate an in-page navigation
    pub fn navigate(&self, location: impl Into<String>) {
        self.state().location = location.into();
    }

    pub fn set_preview_image(&self, src: impl Into<String>) {
        self.state().preview_image = Some(src.into());
    }

    pub fn marker(&self) -> Option<AudioModeBanner> {
        self.state().marker.clone()
    }

    pub fn has_preview_image(&self) -> bool {
        self.state().preview_image.is_some()
    }

    pub fn media_style(&self) -> Option<String> {
        self.state().media_style.clone()
    }

    pub fn media_source(&self) -> Option<String> {
        self.state().media_source.clone()
    }

    pub fn reloads(&self) -> usize {
        self.state().reloads
    }
}

impl Page for FakePage {
    fn location(&self) -> String {
        self.state().location.clone()
    }

    fn has_audio_marker(&self) -> bool {
        self.state().marker.is_some()
    }

    fn insert_audio_marker(&self, banner: &AudioModeBanner) {
        self.state().marker = Some(banner.clone());
    }

    fn preview_image_source(&self) -> Option<String> {
        self.state().preview_image.clone()
    }

    fn remove_preview_image(&self) -> bool {
        self.state().preview_image.take().is_some()
    }

    fn meta_entries(&self) -> Vec<MetaEntry> {
        self.state().meta.clone()
    }

    fn has_media_element(&self) -> bool {
        self.state().media_element
    }

    fn set_media_style(&self, css: &str) {
        let mut state = self.state();
        if state.media_element {
            state.media_style = Some(css.to_string());
        }
    }

    fn set_media_source(&self, url: &str) {
        let mut state = self.state();
        if state.media_element {
            state.media_source = Some(url.to_string());
        }
    }

    fn reload(&self) {
        self.state().reloads += 1;
    }
}

// ============================================================================
// Flag store
// ============================================================================

/// Flag store living in memory
///
/// Share one instance between two controllers to simulate a reload.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flags: Mutex<HashSet<String>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look at a flag without clearing it
    pub fn is_set(&self, key: &str) -> bool {
        self.flags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

impl FlagStore for MemoryFlagStore {
    fn set_flag(&self, key: &str) -> Result<()> {
        self.flags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string());
        Ok(())
    }

    fn take_flag(&self, key: &str) -> Result<bool> {
        Ok(self
            .flags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key))
    }
}

// ============================================================================
// Network hook
// ============================================================================

/// Network hook remembering the gates it was given
#[derive(Debug, Default)]
pub struct RecordingNetwork {
    gates: Mutex<Vec<Arc<RequestGate>>>,
}

impl RecordingNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install_count(&self) -> usize {
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Gate installed first, if any
    pub fn gate(&self) -> Option<Arc<RequestGate>> {
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .first()
            .cloned()
    }
}

impl NetworkHook for RecordingNetwork {
    fn install(&self, gate: Arc<RequestGate>) -> bool {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        gates.push(gate);
        gates.len() == 1
    }
}

// ============================================================================
// Resolver
// ============================================================================

#[derive(Debug, Clone)]
enum Scripted {
    Audio(String),
    ApiFailure(i64),
}

/// Resolver answering from a fixed table, keyed by media id
///
/// A media id can be held back until [`release`](Self::release) is called,
/// to let a test navigate while its resolution is in flight.
#[derive(Debug, Default)]
pub struct ScriptedResolver {
    answers: HashMap<String, Scripted>,
    gates: HashMap<String, Arc<Notify>>,
    calls: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_audio(mut self, media_id: &str, url: &str) -> Self {
        self.answers
            .insert(media_id.to_string(), Scripted::Audio(url.to_string()));
        self
    }

    pub fn with_api_failure(mut self, media_id: &str, code: i64) -> Self {
        self.answers
            .insert(media_id.to_string(), Scripted::ApiFailure(code));
        self
    }

    /// Hold the answer for `media_id` until released
    pub fn held(mut self, media_id: &str) -> Self {
        self.gates
            .insert(media_id.to_string(), Arc::new(Notify::new()));
        self
    }

    pub fn release(&self, media_id: &str) {
        if let Some(gate) = self.gates.get(media_id) {
            gate.notify_one();
        }
    }

    /// Number of resolutions started
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioResolver for ScriptedResolver {
    async fn resolve(&self, locator: &MediaLocator) -> pmobilibili::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = self.gates.get(&locator.media_id) {
            gate.notified().await;
        }

        match self.answers.get(&locator.media_id) {
            Some(Scripted::Audio(url)) => Ok(url.clone()),
            Some(Scripted::ApiFailure(code)) => Err(pmobilibili::Error::ApiError {
                code: *code,
                message: "scripted failure".to_string(),
            }),
            None => Err(pmobilibili::Error::missing_data(format!(
                "no scripted answer for {}",
                locator.media_id
            ))),
        }
    }
}
