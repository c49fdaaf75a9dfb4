// SPDX-License-Identifier: Apache-2.0

//! Console loggers used by the `cfagent` CLI and, through
//! [`cfagent_common::Logger`], by every actuator in the engine.

#![deny(missing_docs)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

pub mod quiet;

pub use quiet::QuietLogger;

use cfagent_common::Logger;
use std::sync::{Arc, Mutex};

/// A logger that prints every level to the console via `paris`.
/// Thread-safe and cheap to clone.
#[derive(Default, Clone)]
pub struct ConsoleLogger {
    logger: Arc<Mutex<paris::Logger<'static>>>,
    debug: bool,
}

impl ConsoleLogger {
    /// Creates a new console logger. `debug` enables trace-level output.
    pub fn new(debug: bool) -> Self {
        Self {
            logger: Arc::new(Mutex::new(paris::Logger::new())),
            debug,
        }
    }
}

impl Logger for ConsoleLogger {
    fn trace(&self, message: &str) {
        if self.debug {
            let _ = self.logger.lock().expect("logger mutex poisoned").log(message);
        }
    }

    fn info(&self, message: &str) {
        let _ = self.logger.lock().expect("logger mutex poisoned").info(message);
    }

    fn warn(&self, message: &str) {
        let _ = self.logger.lock().expect("logger mutex poisoned").warn(message);
    }

    fn error(&self, message: &str) {
        let _ = self.logger.lock().expect("logger mutex poisoned").error(message);
    }

    fn success(&self, message: &str) {
        let _ = self.logger.lock().expect("logger mutex poisoned").success(message);
    }

    fn log(&self, message: &str) {
        let _ = self.logger.lock().expect("logger mutex poisoned").log(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfagent_common::outcome::PromiseOutcome;
    use cfagent_common::PromisePath;

    #[test]
    fn console_logger_does_not_panic_on_any_level() {
        let logger = ConsoleLogger::new(true);
        let path = PromisePath {
            namespace: "default".into(),
            bundle: "main".into(),
            section: "files".into(),
            promiser: "/etc/hosts".into(),
        };
        logger.promise(PromiseOutcome::Change, &path, "updated");
        logger.promise(PromiseOutcome::Noop, &path, "already compliant");
    }
}
