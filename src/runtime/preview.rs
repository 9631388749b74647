//! Preview handles for uploaded files, and a player for them.
//!
//! A preview keeps the raw upload addressable by a short href so a
//! [`PreviewPlayer`] can open it on its own output stream, independently of
//! the analysis session. The entry lives exactly as long as its
//! [`PreviewUrl`]; a player notices the revocation on its next
//! [`sync`](PreviewPlayer::sync) and goes quiet.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, info};

use crate::{
    config::PipelineConfig,
    error::TransportError,
    io::decode_with_hint,
    runtime::{
        graph::{PlaybackGraph, SourceStatus},
        output::{AudioOutput, StreamHandle},
    },
};

type Entries = Mutex<HashMap<String, Arc<[u8]>>>;

/// Registry of live previews. Clones share the registry.
#[derive(Clone, Default)]
pub struct PreviewStore {
    entries: Arc<Entries>,
    next_id: Arc<AtomicU64>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` and return the handle that keeps them reachable.
    pub fn create(&self, name: &str, bytes: Arc<[u8]>) -> PreviewUrl {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let href = format!("preview:{id}/{name}");
        debug!(%href, bytes = bytes.len(), "preview created");

        lock(&self.entries).insert(href.clone(), bytes);
        PreviewUrl {
            href,
            entries: Arc::downgrade(&self.entries),
        }
    }

    /// Bytes behind `href`, if the preview has not been revoked.
    pub fn resolve(&self, href: &str) -> Option<Arc<[u8]>> {
        lock(&self.entries).get(href).cloned()
    }

    pub fn live_count(&self) -> usize {
        lock(&self.entries).len()
    }
}

/// Handle to one preview. Revoked when dropped.
pub struct PreviewUrl {
    href: String,
    entries: Weak<Entries>,
}

impl PreviewUrl {
    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn revoke(self) {}
}

impl Drop for PreviewUrl {
    fn drop(&mut self) {
        if let Some(entries) = self.entries.upgrade() {
            lock(&entries).remove(&self.href);
            debug!(href = %self.href, "preview revoked");
        }
    }
}

impl std::fmt::Debug for PreviewUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PreviewUrl").field(&self.href).finish()
    }
}

/// Plays previews straight from the store on a separate output.
///
/// Only the source is played: no analysis runs and no voice is ever started,
/// so a transport session is unaffected by anything the player does.
pub struct PreviewPlayer<O: AudioOutput> {
    output: O,
    config: PipelineConfig,
    playback: Option<PreviewPlayback>,
}

struct PreviewPlayback {
    href: String,
    status: SourceStatus,
    stream: Box<dyn StreamHandle>,
}

impl<O: AudioOutput> PreviewPlayer<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            config: PipelineConfig::default(),
            playback: None,
        }
    }

    /// Decode the preview behind `href` and play it from the start.
    ///
    /// Whatever was playing before is stopped first, even if this fails.
    pub fn play(&mut self, store: &PreviewStore, href: &str) -> Result<(), TransportError> {
        self.stop();

        let bytes = store
            .resolve(href)
            .ok_or_else(|| TransportError::PreviewRevoked(href.to_owned()))?;
        let source = decode_with_hint(&bytes, extension(href).as_deref())?;

        let output_rate = self.output.sample_rate();
        let playable = source.resampled(output_rate);
        // The voice and sampler ends are dropped: nothing listens to a preview
        let (graph, ends) = PlaybackGraph::new(&playable, output_rate, &self.config);
        let stream = self.output.open(graph)?;
        info!(%href, output_rate, "preview playing");

        self.playback = Some(PreviewPlayback {
            href: href.to_owned(),
            status: ends.status,
            stream,
        });
        Ok(())
    }

    /// Stop `href` if it is playing, otherwise play it. Returns whether it
    /// is playing afterwards.
    pub fn toggle(&mut self, store: &PreviewStore, href: &str) -> Result<bool, TransportError> {
        if self.playing_href() == Some(href) {
            self.stop();
            return Ok(false);
        }
        self.play(store, href)?;
        Ok(true)
    }

    /// Release the output stream. Safe to call when nothing is playing.
    pub fn stop(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            playback.stream.halt();
            debug!(href = %playback.href, "preview stopped");
        }
    }

    /// Stop if the preview was revoked or has played to the end.
    ///
    /// Call once per display frame. Returns true when playback stopped.
    pub fn sync(&mut self, store: &PreviewStore) -> bool {
        let finished = match &self.playback {
            Some(playback) => {
                !playback.status.is_playing() || store.resolve(&playback.href).is_none()
            }
            None => false,
        };
        if finished {
            self.stop();
        }
        finished
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    pub fn playing_href(&self) -> Option<&str> {
        self.playback.as_ref().map(|p| p.href.as_str())
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}

impl<O: AudioOutput> Drop for PreviewPlayer<O> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Container hint from the file name at the end of an href.
fn extension(href: &str) -> Option<String> {
    let name = href.split_once('/').map_or(href, |(_, name)| name);
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<String, Arc<[u8]>>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}
