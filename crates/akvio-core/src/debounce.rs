// ── Debounced search pipe ──
//
// Converts keystroke-level search text into rate-limited fetch
// triggers. One pipe per searchable level, fully independent.

use std::time::Duration;

use futures_core::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Silence required after the last keystroke before a fetch fires.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Timer-based coalescer for one search input.
///
/// Each pushed string resets the delay timer; when the timer expires the
/// handler runs with the most recent text — unless it equals the text
/// the pipe last fired with (duplicate suppression, which also covers
/// the input re-delivering its confirmed text on blur). The handler is
/// awaited inside the pipe task, so fires from one pipe never overlap.
pub(crate) struct SearchPipe {
    tx: mpsc::UnboundedSender<String>,
}

impl SearchPipe {
    pub(crate) fn spawn<F>(
        label: &'static str,
        delay: Duration,
        cancel: CancellationToken,
        mut on_fire: F,
    ) -> Self
    where
        F: FnMut(String) -> BoxFuture<'static, ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            let mut pending: Option<String> = None;
            let mut deadline = Instant::now();
            let mut last_fired: Option<String> = None;

            loop {
                tokio::select! {
                    biased;

                    () = cancel.cancelled() => break,

                    text = rx.recv() => {
                        let Some(text) = text else { break };
                        pending = Some(text);
                        deadline = Instant::now() + delay;
                    }

                    () = sleep_until(deadline), if pending.is_some() => {
                        let Some(text) = pending.take() else { continue };
                        if last_fired.as_deref() == Some(text.as_str()) {
                            debug!(pipe = label, "unchanged search text, fetch suppressed");
                            continue;
                        }
                        debug!(pipe = label, search = %text, "debounced search fired");
                        last_fired = Some(text.clone());
                        on_fire(text).await;
                    }
                }
            }

            debug!(pipe = label, "search pipe shut down");
        });

        Self { tx }
    }

    /// Feed raw search text into the pipe.
    pub(crate) fn push(&self, text: impl Into<String>) {
        // Send only fails when the pipe task is gone (shutdown); keystrokes
        // arriving after that are safe to drop.
        let _ = self.tx.send(text.into());
    }
}
