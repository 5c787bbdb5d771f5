#[cfg(test)]
#[path = "output_test.rs"]
mod tests;

use serde::Deserialize;
use serde::Serialize;

pub const ERROR_TAG: &str = "❌ ";
pub const WARNING_TAG: &str = "⚠️  ";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    Status,
    Stdout,
    Stderr,
    Prompt,
    Echo,
    Warning,
    Error,
}

impl OutputKind {
    pub fn tag(&self) -> &'static str {
        match self {
            OutputKind::Stderr | OutputKind::Error => ERROR_TAG,
            OutputKind::Warning => WARNING_TAG,
            _ => "",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFragment {
    pub kind: OutputKind,
    pub text: String,
}

impl OutputFragment {
    pub fn new(kind: OutputKind, text: &str) -> OutputFragment {
        return OutputFragment {
            kind,
            text: text.to_string(),
        };
    }

    pub fn render(&self) -> String {
        return format!("{}{}", self.kind.tag(), self.text);
    }
}

/// Append-only transcript of everything the console shows.
///
/// `append` is the only way text gets in, so fragments keep the order their
/// events were handled in. Tags are applied when rendering; the stored text is
/// exactly what the producer wrote.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputLog {
    fragments: Vec<OutputFragment>,
}

impl OutputLog {
    pub fn new() -> OutputLog {
        return OutputLog::default();
    }

    pub fn append(&mut self, kind: OutputKind, text: &str) {
        if text.is_empty() {
            return;
        }
        self.fragments.push(OutputFragment::new(kind, text));
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    pub fn fragments(&self) -> &[OutputFragment] {
        return &self.fragments;
    }

    pub fn len(&self) -> usize {
        return self.fragments.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.fragments.is_empty();
    }

    pub fn text(&self) -> String {
        return self.since(0);
    }

    /// Renders the fragments appended at or after `mark`.
    pub fn since(&self, mark: usize) -> String {
        return self
            .fragments
            .iter()
            .skip(mark)
            .map(|fragment| fragment.render())
            .collect::<Vec<String>>()
            .join("");
    }

    /// Raw text of the program's own streams after `mark`, without console framing.
    pub fn program_output_since(&self, mark: usize) -> String {
        return self
            .fragments
            .iter()
            .skip(mark)
            .filter(|fragment| {
                matches!(
                    fragment.kind,
                    OutputKind::Stdout | OutputKind::Stderr | OutputKind::Prompt | OutputKind::Echo
                )
            })
            .map(|fragment| fragment.render())
            .collect::<Vec<String>>()
            .join("");
    }
}
