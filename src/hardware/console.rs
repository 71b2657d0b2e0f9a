use crate::terminal::{self, RawLock};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll, read};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::io::{Stdout, Write, stdout};
use std::rc::Rc;
use std::time::Duration;

/// Character console independent of an implementation.
///
/// Characters are LC-3 words, only the low byte is meaningful.
pub trait Console {
    /// Checks if input is available, does not block.
    fn poll_char(&mut self) -> io::Result<Option<u16>>;
    /// Blocks until one character is available.
    fn read_char(&mut self) -> io::Result<u16>;
    fn write_char(&mut self, c: u16) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
    /// True if CTRL-C was triggered, checks pending input without blocking.
    fn is_interrupted(&mut self) -> bool {
        false
    }
}

/// Console shared by the memory mapped device registers and the trap routines.
pub type SharedConsole = Rc<RefCell<dyn Console>>;

fn interrupted_error() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "interrupted by CTRL-C")
}

/// What a key press means to the LC-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyInput {
    Char(u16),
    Interrupt,
    Ignored,
}

/// Translates a key press, keys without an ASCII counterpart are ignored.
fn key_to_input(event: KeyEvent) -> KeyInput {
    if event.kind != KeyEventKind::Press {
        return KeyInput::Ignored;
    }
    match event.code {
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyInput::Interrupt
        }
        KeyCode::Char(c) if c.is_ascii() => KeyInput::Char(c as u16),
        KeyCode::Enter => KeyInput::Char(u16::from(b'\n')),
        KeyCode::Tab => KeyInput::Char(u16::from(b'\t')),
        KeyCode::Backspace => KeyInput::Char(0x08),
        KeyCode::Esc => KeyInput::Char(0x1B),
        _ => KeyInput::Ignored,
    }
}

/// Console backed by the terminal in raw mode.
///
/// Raw mode swallows SIGINT, so CTRL-C arrives as a key event. Key presses seen while
/// looking for it are kept in `pending` for the next read.
pub struct TerminalConsole {
    stdout: Stdout,
    pending: VecDeque<u16>,
    is_interrupted: bool,
    _raw: RawLock,
}
impl TerminalConsole {
    #[must_use]
    pub fn new() -> Self {
        let mut stdout = stdout();
        let raw = terminal::set_terminal_raw(&mut stdout);
        Self {
            stdout,
            pending: VecDeque::new(),
            is_interrupted: false,
            _raw: raw,
        }
    }
    #[must_use]
    pub fn shared() -> SharedConsole {
        Rc::new(RefCell::new(Self::new()))
    }

    fn accept(&mut self, event: Event) {
        if let Event::Key(key) = event {
            match key_to_input(key) {
                KeyInput::Char(c) => self.pending.push_back(c),
                KeyInput::Interrupt => self.is_interrupted = true,
                KeyInput::Ignored => {}
            }
        }
    }
    /// Moves every queued terminal event into `pending`, does not block.
    fn drain_events(&mut self) -> io::Result<()> {
        while poll(Duration::ZERO)? {
            let event = read()?;
            self.accept(event);
        }
        Ok(())
    }
}
impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}
impl Console for TerminalConsole {
    fn poll_char(&mut self) -> io::Result<Option<u16>> {
        self.drain_events()?;
        if self.is_interrupted {
            return Err(interrupted_error());
        }
        Ok(self.pending.pop_front())
    }
    fn read_char(&mut self) -> io::Result<u16> {
        loop {
            if self.is_interrupted {
                return Err(interrupted_error());
            }
            if let Some(c) = self.pending.pop_front() {
                return Ok(c);
            }
            let event = read()?;
            self.accept(event);
        }
    }
    fn write_char(&mut self, c: u16) -> io::Result<()> {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "only the low byte holds the character"
        )]
        let b = c as u8;
        // raw mode does not return the carriage on line feed
        if b == b'\n' {
            self.stdout.write_all(b"\r\n")
        } else {
            self.stdout.write_all(&[b])
        }
    }
    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
    fn is_interrupted(&mut self) -> bool {
        if let Err(e) = self.drain_events() {
            tracing::warn!("could not check the terminal for CTRL-C: {e}");
        }
        self.is_interrupted
    }
}

/// Console with scripted input and captured output.
#[derive(Debug, Default, Clone)]
pub struct MemoryConsole {
    input: VecDeque<u16>,
    output: Vec<u8>,
    is_interrupted: bool,
}
impl MemoryConsole {
    #[must_use]
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.iter().map(|b| u16::from(*b)).collect(),
            output: Vec::with_capacity(120),
            is_interrupted: false,
        }
    }
    #[must_use]
    pub fn shared(input: &[u8]) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new(input)))
    }
    pub fn add_input(&mut self, input: &[u8]) {
        self.input.extend(input.iter().map(|b| u16::from(*b)));
    }
    /// Acts like CTRL-C pressed on a terminal.
    pub const fn interrupt(&mut self) {
        self.is_interrupted = true;
    }
    #[must_use]
    pub fn get_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}
impl Console for MemoryConsole {
    fn poll_char(&mut self) -> io::Result<Option<u16>> {
        if self.is_interrupted {
            return Err(interrupted_error());
        }
        Ok(self.input.pop_front())
    }
    fn read_char(&mut self) -> io::Result<u16> {
        if self.is_interrupted {
            return Err(interrupted_error());
        }
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "No input available"))
    }
    fn write_char(&mut self, c: u16) -> io::Result<()> {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "only the low byte holds the character"
        )]
        self.output.push(c as u8);
        Ok(())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
    fn is_interrupted(&mut self) -> bool {
        self.is_interrupted
    }
}
