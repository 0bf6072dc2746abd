// SPDX-License-Identifier: GPL-3.0-only

//! Error flag shared between the application and streaming threads

use crate::sync::fatal;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::error;

/// Error flag plus the most recent message.
///
/// This is a leaf: it is safe to record into while holding either pipeline
/// lock, because nothing else is ever acquired under it.
#[derive(Debug, Default)]
pub struct ErrorStatus {
    occurred: AtomicBool,
    message: Mutex<Option<String>>,
}

impl ErrorStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag and remember `message` as the latest error
    pub fn record(&self, message: impl Into<String>) {
        let message = message.into();
        error!(error = %message, "Pipeline error");
        match self.message.lock() {
            Ok(mut slot) => *slot = Some(message),
            Err(_) => fatal("Couldn't acquire the error status lock: poisoned"),
        }
        self.occurred.store(true, Ordering::Release);
    }

    pub fn occurred(&self) -> bool {
        self.occurred.load(Ordering::Acquire)
    }

    pub fn last(&self) -> Option<String> {
        match self.message.lock() {
            Ok(slot) => slot.clone(),
            Err(_) => fatal("Couldn't acquire the error status lock: poisoned"),
        }
    }
}
