// Deferred loop start.
// Waits out the start delay on the tokio timer, then rewinds and loops the line.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::clip::{ClipLine, LoopCount};
use crate::error::{ClipError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    Started,
    Cancelled,
}

/// Handle to a scheduled loop start
pub struct LoopTask {
    token: CancellationToken,
    join: JoinHandle<Result<LoopOutcome>>,
}

impl LoopTask {
    /// Schedule on the current runtime. Fails outside one.
    pub fn spawn(line: Arc<ClipLine>, delay: Duration, looping: bool) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| ClipError::NoRuntime)?;
        let token = CancellationToken::new();
        let task_token = token.clone();

        let join = runtime.spawn(async move {
            if !delay.is_zero() {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        debug!("Loop start cancelled during delay");
                        return Ok(LoopOutcome::Cancelled);
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            if task_token.is_cancelled() {
                return Ok(LoopOutcome::Cancelled);
            }

            let count = if looping {
                LoopCount::Continuous
            } else {
                LoopCount::Times(0)
            };
            let started = line
                .set_frame_position(0)
                .and_then(|_| line.loop_playback(count));

            match started {
                Ok(()) => {
                    debug!("Loop playback started ({:?})", count);
                    Ok(LoopOutcome::Started)
                }
                Err(e) => {
                    warn!("Error during playback: {}", e);
                    Err(e)
                }
            }
        });

        Ok(Self { token, join })
    }

    /// Abandon the start if it has not fired yet
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn wait(self) -> Result<LoopOutcome> {
        match self.join.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(LoopOutcome::Cancelled),
            Err(e) => Err(ClipError::Device(format!("Loop task panicked: {}", e))),
        }
    }
}
