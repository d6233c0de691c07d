//! Terminal output.
//!
//! Status messages go to stderr so stdout carries only machine-readable
//! payloads such as `docxport config --json`.

use console::{Style, Term};

pub(crate) struct Output {
    status: Term,
    payload: Term,
    ok: Style,
    warn: Style,
    fail: Style,
    heading: Style,
    key: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            status: Term::stderr(),
            payload: Term::stdout(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            fail: Style::new().red().bold(),
            heading: Style::new().cyan().bold(),
            key: Style::new().dim(),
        }
    }

    pub(crate) fn info(&self, msg: &str) {
        let _ = self.status.write_line(msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.styled(&self.ok, msg);
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.styled(&self.warn, msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.styled(&self.fail, msg);
    }

    /// Section title of a listing.
    pub(crate) fn section(&self, title: &str) {
        self.styled(&self.heading, title);
    }

    /// Indented `key: value` line of a listing.
    pub(crate) fn entry(&self, key: &str, value: &str) {
        let _ = self
            .status
            .write_line(&format!("  {} {value}", self.key.apply_to(format!("{key}:"))));
    }

    /// Write a payload to stdout, unstyled.
    pub(crate) fn payload(&self, text: &str) -> std::io::Result<()> {
        self.payload.write_line(text)
    }

    fn styled(&self, style: &Style, msg: &str) {
        let _ = self.status.write_line(&style.apply_to(msg).to_string());
    }
}
