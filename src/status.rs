//! Human-readable status styling.
//!
//! Whether output is colored is decided once at startup and passed as a
//! [`StatusStyle`] value to everything that renders status lines.

const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_RED: &str = "\x1b[31m";
const ANSI_RESET: &str = "\x1b[0m";

/// How status words are painted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusStyle {
    color: bool,
}

impl StatusStyle {
    /// Colored output.
    #[must_use]
    pub const fn colored() -> Self {
        Self { color: true }
    }

    /// Plain output.
    #[must_use]
    pub const fn plain() -> Self {
        Self { color: false }
    }

    /// Pick by flag.
    #[must_use]
    pub const fn new(color: bool) -> Self {
        Self { color }
    }

    /// Whether escapes are emitted.
    #[must_use]
    pub const fn is_colored(self) -> bool {
        self.color
    }

    /// Success (green).
    #[must_use]
    pub fn info(self, text: &str) -> String {
        self.paint(ANSI_GREEN, text)
    }

    /// Something changed (yellow).
    #[must_use]
    pub fn warning(self, text: &str) -> String {
        self.paint(ANSI_YELLOW, text)
    }

    /// Failure (red).
    #[must_use]
    pub fn critical(self, text: &str) -> String {
        self.paint(ANSI_RED, text)
    }

    fn paint(self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{ANSI_RESET}")
        } else {
            text.to_owned()
        }
    }
}
