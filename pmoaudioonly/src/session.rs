//! Event loop of one page session
//!
//! The host forwards what happens in the page (menu command, URL change,
//! unload) over a channel; the session feeds it to the controller one event
//! at a time, so the controller never sees two events concurrently.

use crate::controller::{Activation, AudioOnlyController, Navigation};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Something that happened in the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// The user picked the audio-only command in the script menu
    MenuCommand,
    /// The document URL changed without a reload
    UrlChanged(String),
    /// The page is going away
    Shutdown,
}

pub struct AudioOnlySession {
    controller: AudioOnlyController,
    rx: mpsc::Receiver<PageEvent>,
}

impl AudioOnlySession {
    /// Wrap a freshly loaded controller; returns the sender for page events
    pub fn new(
        controller: AudioOnlyController,
        channel_size: usize,
    ) -> (Self, mpsc::Sender<PageEvent>) {
        let (tx, rx) = mpsc::channel(channel_size);
        (Self { controller, rx }, tx)
    }

    /// Run until [`PageEvent::Shutdown`] or until every sender is dropped
    ///
    /// A pending-reload flag left by the previous document is honoured before
    /// the first event. Errors are logged and never end the loop.
    pub async fn run(mut self) -> AudioOnlyController {
        match self.controller.resume_pending() {
            Ok(Some(activation)) => log_activation(&activation),
            Ok(None) => {}
            Err(e) => warn!("Could not read pending reload flag: {}", e),
        }

        while let Some(event) = self.rx.recv().await {
            debug!(?event, "Page event");
            match event {
                PageEvent::MenuCommand => match self.controller.activate() {
                    Ok(activation) => log_activation(&activation),
                    Err(e) => warn!("Audio-only activation failed: {}", e),
                },
                PageEvent::UrlChanged(url) => match self.controller.on_navigation() {
                    Ok(Navigation::Reapplied { restarted }) => {
                        info!(url = %url, restarted, "Audio-only view re-applied")
                    }
                    Ok(Navigation::Ignored) => {}
                    Err(e) => warn!(url = %url, "Could not re-apply audio-only view: {}", e),
                },
                PageEvent::Shutdown => break,
            }
        }

        debug!("Page session ended");
        self.controller
    }
}

fn log_activation(activation: &Activation) {
    match activation {
        Activation::Activated => {}
        Activation::ReloadRequested(reason) => info!(?reason, "Page reload requested"),
        Activation::Aborted(e) => debug!("Not a video page: {}", e),
    }
}
