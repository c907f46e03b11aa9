//! # Compilation Pipeline
//!
//! Debounced source → preview compiler.
//!
//! ```text
//! schedule(s1) ─┐
//! schedule(s2) ─┼─ quiescence window ─→ compile(s3) ─→ publish if still current
//! schedule(s3) ─┘
//! ```
//!
//! Every `schedule` call takes a new generation number. A result is published
//! only when its generation is still the current one at the moment it
//! resolves, so results are applied in submission order and a slow compile of
//! an older source can never overwrite a newer one. Calls arriving during the
//! quiescence window cancel the waiting task outright; a compile already
//! running is left to finish and its result is dropped.

use crate::service::{CompilerService, Preprocessed};
use crate::CompilationResult;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::debug;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);

/// Latest preview published by the pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewOutput {
    /// Generation the result was compiled for
    pub generation: u64,
    /// `None` until a compile for the current buffer has resolved
    pub result: Option<CompilationResult>,
}

#[derive(Debug)]
struct Shared {
    generation: AtomicU64,
    pending: Mutex<Option<PendingCompile>>,
    output: watch::Sender<PreviewOutput>,
}

impl Shared {
    fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Retire every outstanding generation
    fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish(&self, generation: u64, result: CompilationResult) {
        let applied = self.output.send_if_modified(|output| {
            if generation != self.current() {
                return false;
            }
            output.generation = generation;
            output.result = Some(result);
            true
        });

        if applied {
            debug!(generation, "preview updated");
        } else {
            debug!(generation, current = self.current(), "discarding stale compile result");
        }
    }
}

/// Handle to one scheduled compile
#[derive(Clone)]
pub struct PendingCompile {
    generation: u64,
    started: Arc<AtomicBool>,
    task: AbortHandle,
    shared: Arc<Shared>,
}

impl fmt::Debug for PendingCompile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCompile")
            .field("generation", &self.generation)
            .field("started", &self.has_started())
            .finish()
    }
}

impl PendingCompile {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the quiescence window elapsed and compilation began
    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Whether this compile can still publish a result
    pub fn is_current(&self) -> bool {
        self.shared.current() == self.generation
    }

    /// Cancel this compile. A no-op once a newer compile superseded it.
    pub fn cancel(&self) {
        if self
            .shared
            .generation
            .compare_exchange(self.generation, self.generation + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            debug!(generation = self.generation, "compile canceled");
            self.abort_if_waiting();
        }
    }

    fn abort_if_waiting(&self) {
        if !self.has_started() {
            self.task.abort();
        }
    }
}

/// Debounced, cancellation-safe compile loop for one preview surface
#[derive(Debug)]
pub struct CompilationPipeline {
    service: Arc<CompilerService>,
    debounce: Duration,
    shared: Arc<Shared>,
}

impl CompilationPipeline {
    pub fn new(service: Arc<CompilerService>) -> Self {
        Self::with_debounce(service, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(service: Arc<CompilerService>, debounce: Duration) -> Self {
        let (output, _) = watch::channel(PreviewOutput::default());
        Self {
            service,
            debounce,
            shared: Arc::new(Shared {
                generation: AtomicU64::new(0),
                pending: Mutex::new(None),
                output,
            }),
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Schedule a compile of `source` after the quiescence window.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, source: impl Into<String>) -> PendingCompile {
        let source = source.into();
        let generation = self.shared.advance();
        let started = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn({
            let shared = self.shared.clone();
            let service = self.service.clone();
            let started = started.clone();
            let debounce = self.debounce;

            async move {
                tokio::time::sleep(debounce).await;
                if shared.current() != generation {
                    return;
                }

                started.store(true, Ordering::SeqCst);
                debug!(generation, bytes = source.len(), "compiling preview");

                let input = Preprocessed::new(&source);
                let compiler = service.compiler().await;
                let outcome = compiler.compile(&input).await;
                shared.publish(generation, input.assemble(outcome));
            }
        });

        let pending = PendingCompile {
            generation,
            started,
            task: task.abort_handle(),
            shared: self.shared.clone(),
        };

        let previous = self.pending_slot().replace(pending.clone());
        if let Some(previous) = previous {
            previous.abort_if_waiting();
        }

        pending
    }

    /// Drop every pending and in-flight compile and clear the published
    /// preview. Called when the edited buffer changes.
    pub fn invalidate(&self) {
        let generation = self.shared.advance();
        if let Some(previous) = self.pending_slot().take() {
            previous.abort_if_waiting();
        }

        self.shared.output.send_replace(PreviewOutput {
            generation,
            result: None,
        });
        debug!(generation, "preview invalidated");
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewOutput> {
        self.shared.output.subscribe()
    }

    /// Most recently published result for the current buffer
    pub fn latest(&self) -> Option<CompilationResult> {
        self.shared.output.borrow().result.clone()
    }

    pub fn current_generation(&self) -> u64 {
        self.shared.current()
    }

    fn pending_slot(&self) -> std::sync::MutexGuard<'_, Option<PendingCompile>> {
        self.shared
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for CompilationPipeline {
    fn drop(&mut self) {
        if let Some(pending) = self.pending_slot().take() {
            pending.task.abort();
        }
    }
}
