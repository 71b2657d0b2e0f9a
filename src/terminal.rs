use crossterm::{ExecutableCommand, terminal};
use std::io;
use std::io::Write;

/// Restores the terminal mode on drop.
pub struct RawLock {}

impl Drop for RawLock {
    fn drop(&mut self) {
        // terminal stays in raw mode but no means to repair
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!("Error resetting terminal {e}");
        }
    }
}

fn handle_set_raw_error(e: &io::Error) {
    tracing::warn!("Could not set terminal to raw mode: {e}");
}

/// Set terminal to raw in best-effort mode, only log on failure, since it does not work when
/// stdin is no terminal, for example in cargo doc tests.
pub fn set_terminal_raw(stdout: &mut impl Write) -> RawLock {
    if let Err(e) =
        terminal::enable_raw_mode().and_then(|()| stdout.execute(terminal::EnableLineWrap).map(|_| ()))
    {
        handle_set_raw_error(&e);
    }
    RawLock {}
}
