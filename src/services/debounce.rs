use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

/// Forwards a value from `input` to `settled` once no newer value has arrived
/// for `quiet`. Intermediate values are dropped. When `input` closes, a
/// pending value is flushed before the task ends.
pub async fn debounce<T: Send>(
    mut input: mpsc::Receiver<T>,
    settled: mpsc::Sender<T>,
    quiet: Duration,
) {
    let mut pending: Option<T> = None;

    loop {
        let Some(value) = pending.take() else {
            match input.recv().await {
                Some(value) => pending = Some(value),
                None => break,
            }
            continue;
        };

        match tokio::time::timeout(quiet, input.recv()).await {
            Ok(Some(newer)) => pending = Some(newer),
            Ok(None) => {
                let _ = settled.send(value).await;
                break;
            }
            Err(_) => {
                if settled.send(value).await.is_err() {
                    break;
                }
            }
        }
    }

    debug!("Debouncer stopped");
}
