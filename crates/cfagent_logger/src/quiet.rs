// SPDX-License-Identifier: Apache-2.0

//! Logger in quiet mode: only warnings and errors reach the console.

use cfagent_common::Logger;
use std::sync::{Arc, Mutex};

/// A logger that suppresses everything except warnings and errors.
/// Thread-safe and cheap to clone.
#[derive(Default, Clone)]
pub struct QuietLogger {
    logger: Arc<Mutex<paris::Logger<'static>>>,
}

impl QuietLogger {
    /// Creates a new quiet logger.
    pub fn new() -> Self {
        Self {
            logger: Arc::new(Mutex::new(paris::Logger::new())),
        }
    }
}

impl Logger for QuietLogger {
    fn trace(&self, _message: &str) {}

    fn info(&self, _message: &str) {}

    fn warn(&self, message: &str) {
        let _ = self.logger.lock().expect("logger mutex poisoned").warn(message);
    }

    fn error(&self, message: &str) {
        let _ = self.logger.lock().expect("logger mutex poisoned").error(message);
    }

    fn success(&self, _message: &str) {}

    fn log(&self, _message: &str) {}
}
