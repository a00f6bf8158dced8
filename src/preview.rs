//! Debounced preview rendering.
//!
//! DESIGN
//! ======
//! Each call to [`PreviewScheduler::schedule`] aborts the pending task and
//! spawns a new one that sleeps for the debounce period, generates overlay
//! instructions, and renders them on the blocking pool. Every request takes a
//! sequence number; a result is published only if its number is still the
//! latest when it completes, so an older render can never overwrite a newer
//! one. Sequence bumps and the publish check both run under the watch lock.
//!
//! Results go out on a `watch` channel. Publishing replaces the previous
//! value, which drops the last reference to the superseded output buffer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use engine::overlay::{GenerateOptions, generate_with};
use engine::record::GenerationRecord;
use engine::registry::Field;
use engine::render::{DocumentRenderer, RenderError};
use engine::transform::PageDimensions;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Everything needed to produce one preview, captured by value.
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    pub fields: Vec<Field>,
    pub page_dims: HashMap<u32, PageDimensions>,
    pub record: GenerationRecord,
    pub options: GenerateOptions,
    pub file_name: String,
}

/// A finished preview.
#[derive(Debug)]
pub struct PreviewOutput {
    /// Sequence number of the request that produced it.
    pub sequence: u64,
    pub file_name: String,
    pub instruction_count: usize,
    pub bytes: Vec<u8>,
}

/// Latest published preview state.
#[derive(Debug, Clone, Default)]
pub enum PreviewState {
    #[default]
    Empty,
    Ready(Arc<PreviewOutput>),
    /// The latest request failed to render.
    Failed(String),
}

impl PreviewState {
    #[must_use]
    pub fn output(&self) -> Option<&Arc<PreviewOutput>> {
        match self {
            Self::Ready(output) => Some(output),
            _ => None,
        }
    }
}

pub struct PreviewScheduler {
    debounce: Duration,
    renderer: Arc<dyn DocumentRenderer>,
    sequence: Arc<AtomicU64>,
    state: Arc<watch::Sender<PreviewState>>,
    pending: Option<JoinHandle<()>>,
}

impl PreviewScheduler {
    #[must_use]
    pub fn new(debounce: Duration, renderer: Arc<dyn DocumentRenderer>) -> Self {
        let (state, _) = watch::channel(PreviewState::Empty);
        Self { debounce, renderer, sequence: Arc::new(AtomicU64::new(0)), state: Arc::new(state), pending: None }
    }

    /// Receiver that observes every published state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.state.subscribe()
    }

    /// Current published state.
    #[must_use]
    pub fn latest(&self) -> PreviewState {
        self.state.borrow().clone()
    }

    /// Whether a debounced render is waiting or running.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Replace any pending request with `request`, rendered after the debounce period.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, request: PreviewRequest) {
        self.cancel();
        let seq = advance(&self.sequence, &self.state);
        debug!(seq, debounce = ?self.debounce, "preview scheduled");

        let debounce = self.debounce;
        let renderer = Arc::clone(&self.renderer);
        let sequence = Arc::clone(&self.sequence);
        let state = Arc::clone(&self.state);
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if sequence.load(Ordering::SeqCst) != seq {
                return;
            }
            match produce(seq, renderer, request).await {
                Ok(output) => {
                    publish(&sequence, &state, seq, PreviewState::Ready(Arc::new(output)));
                }
                Err(e) => {
                    warn!(seq, error = %e, "preview render failed");
                    publish(&sequence, &state, seq, PreviewState::Failed(e.to_string()));
                }
            }
        }));
    }

    /// Render `request` immediately, superseding anything pending.
    ///
    /// # Errors
    ///
    /// Returns a [`PreviewError`] if rendering fails; the failure is also
    /// published.
    pub async fn render_now(&mut self, request: PreviewRequest) -> Result<Arc<PreviewOutput>, PreviewError> {
        self.cancel();
        let seq = advance(&self.sequence, &self.state);
        match produce(seq, Arc::clone(&self.renderer), request).await {
            Ok(output) => {
                let output = Arc::new(output);
                publish(&self.sequence, &self.state, seq, PreviewState::Ready(Arc::clone(&output)));
                Ok(output)
            }
            Err(e) => {
                publish(&self.sequence, &self.state, seq, PreviewState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Abort the pending render, if any. Published state is kept.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
            // Invalidate a render that already left its sleep.
            advance(&self.sequence, &self.state);
        }
    }

    /// Abort pending work and release the last output.
    pub fn close(&mut self) {
        self.cancel();
        self.state.send_replace(PreviewState::Empty);
        debug!("preview scheduler closed");
    }
}

impl Drop for PreviewScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

/// Background task that writes every ready preview to one file.
pub struct PreviewWriter {
    handle: JoinHandle<()>,
}

impl PreviewWriter {
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(mut rx: watch::Receiver<PreviewState>, path: PathBuf) -> Self {
        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                match state {
                    PreviewState::Ready(out) => match std::fs::write(&path, &out.bytes) {
                        Ok(()) => info!(path = %path.display(), instructions = out.instruction_count, "preview written"),
                        Err(e) => warn!(path = %path.display(), error = %e, "preview write failed"),
                    },
                    PreviewState::Failed(message) => warn!(%message, "preview failed"),
                    PreviewState::Empty => {}
                }
            }
        });
        Self { handle }
    }

    /// Stop the task. Once this returns it no longer touches the file.
    pub async fn stop(self) {
        self.handle.abort();
        if let Err(e) = self.handle.await
            && !e.is_cancelled()
        {
            warn!(error = %e, "preview writer ended abnormally");
        }
    }
}

async fn produce(
    seq: u64,
    renderer: Arc<dyn DocumentRenderer>,
    request: PreviewRequest,
) -> Result<PreviewOutput, PreviewError> {
    let instructions = generate_with(&request.fields, &request.page_dims, &request.record, request.options);
    let instruction_count = instructions.len();
    let bytes = tokio::task::spawn_blocking(move || renderer.render(&instructions)).await??;
    Ok(PreviewOutput { sequence: seq, file_name: request.file_name, instruction_count, bytes })
}

/// Bump the sequence under the watch lock so no publish can interleave.
fn advance(sequence: &AtomicU64, state: &watch::Sender<PreviewState>) -> u64 {
    let mut seq = 0;
    state.send_if_modified(|_| {
        seq = sequence.fetch_add(1, Ordering::SeqCst) + 1;
        false
    });
    seq
}

/// Publish `next` only if `seq` is still the latest request.
fn publish(sequence: &AtomicU64, state: &watch::Sender<PreviewState>, seq: u64, next: PreviewState) -> bool {
    let published = state.send_if_modified(|current| {
        if sequence.load(Ordering::SeqCst) != seq {
            return false;
        }
        *current = next;
        true
    });
    if published {
        debug!(seq, "preview published");
    } else {
        debug!(seq, "stale preview discarded");
    }
    published
}

#[cfg(test)]
#[path = "preview_test.rs"]
mod tests;
