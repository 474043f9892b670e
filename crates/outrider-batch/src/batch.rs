//! Command batch value type

use serde::Serialize;

/// An ordered, deterministic shell program generated for one dispatch call.
///
/// The remote side is a shell interpreter, so the program is kept as an
/// explicit list of lines rather than a structured RPC payload. A batch is
/// built once, handed to the dispatch gateway, and discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommandBatch {
    lines: Vec<String>,
}

impl CommandBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a batch from prepared lines
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Append a program line
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Program lines in execution order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of program lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The whole program as one newline-joined string
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }

    /// Serialized payload size in bytes, as the channel will see it
    pub fn serialized_len(&self) -> usize {
        if self.lines.is_empty() {
            return 0;
        }
        let separators = self.lines.len() - 1;
        self.lines.iter().map(|l| l.len()).sum::<usize>() + separators
    }

    /// Truncated preview of the program for response summaries
    pub fn preview(&self, max_chars: usize) -> String {
        let joined = self.joined();
        if joined.len() <= max_chars {
            return joined;
        }
        let mut cut = max_chars;
        while !joined.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &joined[..cut])
    }
}
