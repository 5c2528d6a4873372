//! Rendered status of a component, independent of any terminal library.

/// Severity of a callout, mapped to colors by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutKind {
    Neutral,
    Success,
    Warn,
    Danger,
}

/// A titled block of message lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callout {
    pub kind: CalloutKind,
    pub title: String,
    pub lines: Vec<String>,
}

impl Callout {
    pub fn new(kind: CalloutKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn neutral(message: impl Into<String>) -> Self {
        Self::new(CalloutKind::Neutral, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(CalloutKind::Danger, message)
    }

    /// Plain text rendering, used by the headless mode
    pub fn to_text(&self) -> String {
        let mut out = self.title.clone();
        for line in &self.lines {
            out.push_str("\n  * ");
            out.push_str(line);
        }
        out
    }
}
