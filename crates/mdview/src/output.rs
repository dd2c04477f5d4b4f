//! Colored terminal output on stderr.
//!
//! Stdout is reserved for rendered HTML.

use console::{Style, Term};

pub(crate) struct Output {
    term: Term,
    label: Style,
    warn: Style,
    fail: Style,
    title: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            label: Style::new().dim(),
            warn: Style::new().yellow(),
            fail: Style::new().red().bold(),
            title: Style::new().cyan().bold(),
        }
    }

    fn line(&self, text: &str) {
        // Nothing useful to do when stderr is gone.
        let _ = self.term.write_line(text);
    }

    pub(crate) fn heading(&self, text: &str) {
        self.line(&self.title.apply_to(text).to_string());
    }

    /// `label: value`, label dimmed.
    pub(crate) fn field(&self, label: &str, value: impl std::fmt::Display) {
        self.line(&format!("{} {value}", self.label.apply_to(format!("{label}:"))));
    }

    pub(crate) fn info(&self, text: &str) {
        self.line(text);
    }

    pub(crate) fn warning(&self, text: &str) {
        self.line(&self.warn.apply_to(text).to_string());
    }

    pub(crate) fn error(&self, text: &str) {
        self.line(&self.fail.apply_to(text).to_string());
    }
}
