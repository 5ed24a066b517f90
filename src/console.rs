use std::io::IsTerminal;

use colored::{ColoredString, Colorize};

/// Human-readable progress and result messages, written to stderr.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    color: bool,
}

impl Console {
    pub fn stderr() -> Self {
        let color = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self { color }
    }

    fn styled(&self, msg: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(msg).to_string()
        } else {
            msg.to_string()
        }
    }

    pub fn plain(&self, msg: &str) {
        eprintln!("{msg}");
    }

    pub fn progress(&self, msg: &str) {
        eprintln!("{}", self.styled(msg, |m| m.bold().cyan()));
    }

    pub fn success(&self, msg: &str) {
        eprintln!("{}", self.styled(msg, |m| m.bold().green()));
    }

    pub fn warn(&self, msg: &str) {
        eprintln!("{}", self.styled(msg, |m| m.bold().yellow()));
    }

    pub fn error(&self, msg: &str) {
        eprintln!("{}", self.styled(msg, |m| m.bold().red()));
    }
}
