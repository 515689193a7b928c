//! Colored terminal output for CLI feedback.

use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Writes prefixed, colored status lines.
///
/// Informational lines go to stdout; warnings and errors go to stderr.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    color: ColorChoice,
}

impl OutputManager {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            color: ColorChoice::Auto,
        }
    }

    /// Disables colors, e.g. when `NO_COLOR` is set.
    pub fn without_color(mut self) -> Self {
        self.color = ColorChoice::Never;
        self
    }

    fn line(mut stream: StandardStream, prefix: &str, color: Color, message: &str) -> io::Result<()> {
        stream.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(stream, "{prefix}")?;
        stream.reset()?;
        writeln!(stream, " {message}")
    }

    fn stdout(&self) -> StandardStream {
        StandardStream::stdout(self.color)
    }

    fn stderr(&self) -> StandardStream {
        StandardStream::stderr(self.color)
    }

    /// `[INFO]` line, shown only in verbose mode.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.verbose || self.quiet {
            return Ok(());
        }
        self.info(message)
    }

    /// `[INFO]` line.
    pub fn info(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        Self::line(self.stdout(), "[INFO]", Color::Blue, message)
    }

    /// Alias of [`OutputManager::info`] for step announcements.
    pub fn progress(&self, message: &str) -> io::Result<()> {
        self.info(message)
    }

    /// `[SUCCESS]` line.
    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        Self::line(self.stdout(), "[SUCCESS]", Color::Green, message)
    }

    /// `[WARNING]` line on stderr.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        Self::line(self.stderr(), "[WARNING]", Color::Yellow, message)
    }

    /// `[ERROR]` line on stderr. Printed even in quiet mode.
    pub fn error(&self, message: &str) -> io::Result<()> {
        Self::line(self.stderr(), "[ERROR]", Color::Red, message)
    }

    /// Blank line followed by a bold title.
    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut stream = self.stdout();
        writeln!(stream)?;
        stream.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(stream, "{title}")?;
        stream.reset()
    }

    /// Indented plain line.
    pub fn indent(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(self.stdout(), "   {message}")
    }
}
