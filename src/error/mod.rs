use std::sync::atomic::{AtomicBool, Ordering};

use log::error as log_error;

/// Set once any diagnostic has been reported through this module, so the CLI shell can
/// decide on an exit code without threading a result back through every call site.
pub static HAD_ERROR: AtomicBool = AtomicBool::new(false);

/// Report a diagnostic tied to a source line, in the style the scanners and parsers across
/// this family of interpreters use: `[line N] Error<location>: message`.
pub fn report(line: usize, location: &str, message: &str) {
    log_error!("[line {line}] Error{location}: {message}");
    eprintln!("[line {line}] Error{location}: {message}");
    HAD_ERROR.store(true, Ordering::Relaxed);
}

/// Report a diagnostic with no specific token location, just a line number.
pub fn error(line: usize, message: &str) {
    report(line, "", message);
}

pub fn reset() {
    HAD_ERROR.store(false, Ordering::Relaxed);
}

pub fn had_error() -> bool {
    HAD_ERROR.load(Ordering::Relaxed)
}
