//! Background execution of a pipeline.

use super::CancellationToken;
use crate::error::{DupfreeError, Result};
use std::thread::JoinHandle;

/// A pipeline running on its own thread
pub struct ScanHandle<T> {
    cancel: CancellationToken,
    thread: JoinHandle<T>,
}

impl<T: Send + 'static> ScanHandle<T> {
    /// Run `job` on a new thread, handing it the token this handle cancels
    pub fn spawn<F>(cancel: CancellationToken, job: F) -> Self
    where
        F: FnOnce(CancellationToken) -> T + Send + 'static,
    {
        let token = cancel.clone();
        Self {
            cancel,
            thread: std::thread::spawn(move || job(token)),
        }
    }

    /// Ask the pipeline to stop at its next checkpoint
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The token shared with the running pipeline
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the thread has returned
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the result
    pub fn join(self) -> Result<T> {
        self.thread.join().map_err(|_| DupfreeError::WorkerPanicked)
    }
}
