// Input debouncer: delays a rapidly changing value until it has settled.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// Cancellable settle timer fed through a channel.
///
/// Every [`push`](Debouncer::push) restarts the timer; a superseded value is
/// dropped and never emitted. Once a value stays unchanged for `delay`, it is
/// sent exactly once on the receiver returned by [`Debouncer::new`]. A settled
/// value equal to the previously emitted one is not sent again.
///
/// Dropping the debouncer cancels any pending value.
pub struct Debouncer<T> {
    input_tx: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Spawns the timer task on the current tokio runtime.
    pub fn new(delay: Duration) -> (Self, mpsc::Receiver<T>) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::channel(1);
        let task = tokio::spawn(run(delay, input_rx, output_tx));
        (Self { input_tx, task }, output_rx)
    }

    /// Records a new value. Returns `false` if the debouncer has shut down.
    pub fn push(&self, value: T) -> bool {
        self.input_tx.send(value).is_ok()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T>(
    delay: Duration,
    mut input_rx: mpsc::UnboundedReceiver<T>,
    output_tx: mpsc::Sender<T>,
) where
    T: Clone + PartialEq + Send + 'static,
{
    let mut pending: Option<T> = None;
    let mut last_emitted: Option<T> = None;

    let timer = sleep(delay);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            biased;

            maybe_value = input_rx.recv() => {
                let Some(value) = maybe_value else {
                    debug!("Debouncer input closed, dropping pending value");
                    break;
                };
                // Unchanged value, the running timer stays armed.
                if pending.as_ref() == Some(&value) {
                    continue;
                }
                pending = Some(value);
                timer.as_mut().reset(Instant::now() + delay);
                trace!(delay_ms = delay.as_millis() as u64, "Debounce timer restarted");
            }

            () = &mut timer, if pending.is_some() => {
                let Some(value) = pending.take() else {
                    continue;
                };
                if last_emitted.as_ref() == Some(&value) {
                    trace!("Settled value unchanged, not emitting");
                    continue;
                }
                if output_tx.send(value.clone()).await.is_err() {
                    debug!("Debouncer output closed");
                    break;
                }
                last_emitted = Some(value);
            }
        }
    }
}
