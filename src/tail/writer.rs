use std::io::Write;

use tracing::warn;

use crate::tail::{LogSnapshot, SnapshotSink};

/// Writes only the part of each snapshot not written yet.
///
/// Used by the headless `run` command to stream a run's log to stdout. If the
/// log shrinks (truncated by a new run) the whole snapshot is written again.
pub struct StreamSink<W> {
    out: W,
    /// Text already written, compared against each new snapshot
    emitted: String,
}

impl<W: Write + Send> StreamSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            emitted: String::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> SnapshotSink for StreamSink<W> {
    fn push(&mut self, snapshot: LogSnapshot) {
        let mut content = snapshot.content.as_str();
        // A trailing replacement char is usually a character still being
        // written; hold it back until the next read or the final snapshot.
        if !snapshot.is_final {
            content = content.trim_end_matches(char::REPLACEMENT_CHARACTER);
        }

        let start = if content.len() < self.emitted.len() {
            0
        } else {
            common_prefix_len(&self.emitted, content)
        };
        if start == content.len() && start == self.emitted.len() {
            return;
        }

        let result = self
            .out
            .write_all(content[start..].as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            warn!(error = %e, "failed to write log output");
        }
        self.emitted = content.to_string();
    }
}

/// Byte length of the longest common prefix, on a char boundary of both
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(c, _)| c.len_utf8())
        .sum()
}
