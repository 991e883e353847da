//! Terminal output for command feedback.
//!
//! Command results always go to stdout. Progress, success and verbose lines
//! are suppressed by `--quiet`; warnings and errors go to stderr.

use std::io::{self, Write};

/// Verbosity-aware printer shared by all commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Whether verbose output is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Whether quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Print a command result line
    pub fn println(&self, message: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{message}")
    }

    /// Print message only in verbose mode
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if self.is_verbose() {
            writeln!(io::stdout().lock(), "  {message}")?;
        }
        Ok(())
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> io::Result<()> {
        if !self.quiet {
            writeln!(io::stdout().lock(), "→ {message}")?;
        }
        Ok(())
    }

    /// Print success message
    pub fn success(&self, message: &str) -> io::Result<()> {
        if !self.quiet {
            writeln!(io::stdout().lock(), "✓ {message}")?;
        }
        Ok(())
    }

    /// Print warning message
    pub fn warn(&self, message: &str) -> io::Result<()> {
        if !self.quiet {
            writeln!(io::stderr().lock(), "⚠ {message}")?;
        }
        Ok(())
    }

    /// Print section header
    pub fn section(&self, title: &str) -> io::Result<()> {
        if !self.quiet {
            writeln!(io::stdout().lock(), "\n{title}")?;
            writeln!(io::stdout().lock(), "{}", "─".repeat(title.chars().count()))?;
        }
        Ok(())
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> io::Result<()> {
        if !self.quiet {
            writeln!(io::stdout().lock(), "    {message}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_overrides_verbose() {
        let output = OutputManager::new(true, true);
        assert!(output.is_quiet());
        assert!(!output.is_verbose());
        assert!(OutputManager::new(true, false).is_verbose());
    }
}
