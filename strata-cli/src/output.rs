//! Styled terminal output utilities.

use std::env;
use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use strata_migrate::{MigrationState, MigrationStatus};

use crate::error::CliResult;

/// Output sink for command results.
///
/// Commands write through this instead of printing directly so tests can
/// capture what a command reported.
pub struct Output {
    sink: Box<dyn Write + Send>,
    styled: bool,
}

impl Output {
    /// Write to `sink`, optionally with ANSI styling.
    pub fn new(sink: impl Write + Send + 'static, styled: bool) -> Self {
        Self {
            sink: Box::new(sink),
            styled,
        }
    }

    /// Write to stdout, styled when it is a terminal and `NO_COLOR` is unset.
    pub fn stdout() -> Self {
        let styled = io::stdout().is_terminal() && env::var_os("NO_COLOR").is_none();
        Self::new(io::stdout(), styled)
    }

    fn paint(&self, text: &str, style: impl FnOnce(&str) -> String) -> String {
        if self.styled {
            style(text)
        } else {
            text.to_string()
        }
    }

    /// Print a header/title
    pub fn header(&mut self, text: &str) -> CliResult<()> {
        let title = self.paint(text, |t| t.bold().cyan().to_string());
        let rule = self.paint(&"─".repeat(text.chars().count()), |t| t.dimmed().to_string());
        writeln!(self.sink)?;
        writeln!(self.sink, "{}", title)?;
        writeln!(self.sink, "{}", rule)?;
        writeln!(self.sink)?;
        Ok(())
    }

    /// Print a key-value pair
    pub fn kv(&mut self, key: &str, value: &str) -> CliResult<()> {
        let key = self.paint(key, |t| t.dimmed().to_string());
        writeln!(self.sink, "  {}: {}", key, value)?;
        Ok(())
    }

    /// Print a success message
    pub fn success(&mut self, text: &str) -> CliResult<()> {
        let mark = self.paint("✔", |t| t.green().bold().to_string());
        let text = self.paint(text, |t| t.green().to_string());
        writeln!(self.sink, "{} {}", mark, text)?;
        Ok(())
    }

    /// Print an info message
    pub fn info(&mut self, text: &str) -> CliResult<()> {
        let mark = self.paint("ℹ", |t| t.blue().bold().to_string());
        writeln!(self.sink, "{} {}", mark, text)?;
        Ok(())
    }

    /// Print a list item
    pub fn list_item(&mut self, text: &str) -> CliResult<()> {
        let bullet = self.paint("•", |t| t.dimmed().to_string());
        writeln!(self.sink, "  {} {}", bullet, text)?;
        Ok(())
    }

    /// Print one row of the status table
    pub fn status_row(&mut self, status: &MigrationStatus) -> CliResult<()> {
        let state = format!("{:<5}", status.state.to_string());
        let state = match status.state {
            MigrationState::Up => self.paint(&state, |t| t.green().to_string()),
            MigrationState::Down => self.paint(&state, |t| t.yellow().to_string()),
        };
        let label = if status.source_label == status.identifier.as_str() {
            String::new()
        } else {
            self.paint(&format!("  ({})", status.source_label), |t| t.dimmed().to_string())
        };
        writeln!(self.sink, "  {}{}{}", state, status.identifier, label)?;
        Ok(())
    }

    /// Print raw text unchanged
    pub fn raw(&mut self, text: &str) -> CliResult<()> {
        self.sink.write_all(text.as_bytes())?;
        self.sink.flush()?;
        Ok(())
    }

    /// Print a newline
    pub fn newline(&mut self) -> CliResult<()> {
        writeln!(self.sink)?;
        Ok(())
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output").field("styled", &self.styled).finish()
    }
}

/// Print an error message to stderr
pub fn error(text: &str) {
    if io::stderr().is_terminal() && env::var_os("NO_COLOR").is_none() {
        eprintln!("{} {}", "✖".red().bold(), text.red());
    } else {
        eprintln!("✖ {}", text);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Captured;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_output() {
        let captured = Captured::default();
        let mut out = Output::new(captured.clone(), false);

        out.header("Status").unwrap();
        out.success("done").unwrap();
        out.kv("Database", "app.db").unwrap();

        assert_eq!(
            captured.contents(),
            "\nStatus\n──────\n\n✔ done\n  Database: app.db\n"
        );
    }

    #[test]
    fn test_status_rows() {
        let captured = Captured::default();
        let mut out = Output::new(captured.clone(), false);

        out.status_row(&MigrationStatus {
            identifier: "0001_create_items".into(),
            source_label: "0001_create_items".into(),
            state: MigrationState::Up,
        })
        .unwrap();
        out.status_row(&MigrationStatus {
            identifier: "0002_create_tags".into(),
            source_label: "migrations/0002_create_tags".into(),
            state: MigrationState::Down,
        })
        .unwrap();

        assert_eq!(
            captured.contents(),
            "  up   0001_create_items\n  down 0002_create_tags  (migrations/0002_create_tags)\n"
        );
    }

    #[test]
    fn test_styled_output_has_ansi() {
        let captured = Captured::default();
        let mut out = Output::new(captured.clone(), true);
        out.success("done").unwrap();
        assert!(captured.contents().contains("\u{1b}["));
    }
}
