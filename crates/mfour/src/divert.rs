//! Numbered output diversions and sync-line bookkeeping.

use std::collections::BTreeMap;
use std::io::Write;

use crate::error::Result;

/// Owns the numbered output buffers and routes shipped text.
///
/// Diversion 0 is the real output sink and is never buffered; negative
/// diversions discard; positive diversions accumulate until undiverted.
/// Exactly one diversion is current at any time.
#[derive(Debug)]
pub struct Diversions {
    current: i32,
    buffers: BTreeMap<i32, String>,
    /// Source line the next sink write is expected to start on; `None`
    /// after raw text of unknown origin (an undivert) until the next
    /// start-of-line ship re-synchronizes.
    output_line: Option<usize>,
    at_line_start: bool,
    last_file: Option<String>,
}

impl Default for Diversions {
    fn default() -> Self {
        Diversions {
            current: 0,
            buffers: BTreeMap::new(),
            output_line: Some(1),
            at_line_start: true,
            last_file: None,
        }
    }
}

impl Diversions {
    pub fn new() -> Self {
        Diversions::default()
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    /// Switches the current diversion, lazily allocating a buffer for a
    /// new positive id.
    pub fn make_diversion(&mut self, id: i32) {
        self.current = id;
        if id > 0 {
            self.buffers.entry(id).or_default();
        }
    }

    /// Routes scanned text. `file`/`line` describe where the text came
    /// from; `sync` enables `#line` directives on the real sink.
    pub fn ship(
        &mut self,
        text: &str,
        file: Option<&str>,
        line: usize,
        sync: bool,
        sink: &mut dyn Write,
    ) -> Result<()> {
        if text.is_empty() || self.current < 0 {
            return Ok(());
        }
        if self.current > 0 {
            self.buffers.entry(self.current).or_default().push_str(text);
            return Ok(());
        }

        if sync && self.at_line_start {
            if let Some(name) = file {
                let file_changed = self.last_file.as_deref() != Some(name);
                if file_changed {
                    writeln!(sink, "#line {} \"{}\"", line, name)?;
                    self.last_file = Some(name.to_string());
                    self.output_line = Some(line);
                } else if self.output_line != Some(line) {
                    writeln!(sink, "#line {}", line)?;
                    self.output_line = Some(line);
                }
            }
        }

        sink.write_all(text.as_bytes())?;
        for ch in text.chars() {
            if ch == '\n' {
                self.at_line_start = true;
                self.output_line = self.output_line.map(|n| n + 1);
            } else {
                self.at_line_start = false;
            }
        }
        sink.flush()?;
        Ok(())
    }

    /// Moves buffer `id` into the current output and deletes it; the
    /// current diversion and unknown ids are left alone.
    pub fn undivert(&mut self, id: i32, sink: &mut dyn Write) -> Result<()> {
        if id == self.current {
            return Ok(());
        }
        let Some(text) = self.buffers.remove(&id) else {
            return Ok(());
        };
        self.emit_raw(&text, sink)
    }

    /// Flushes every buffer except the current one, in ascending id
    /// order.
    pub fn undivert_all(&mut self, sink: &mut dyn Write) -> Result<()> {
        let ids: Vec<i32> = self
            .buffers
            .keys()
            .copied()
            .filter(|id| *id != self.current)
            .collect();
        for id in ids {
            self.undivert(id, sink)?;
        }
        Ok(())
    }

    /// Emits already-scanned text whose source lines are unknown.
    fn emit_raw(&mut self, text: &str, sink: &mut dyn Write) -> Result<()> {
        if text.is_empty() || self.current < 0 {
            return Ok(());
        }
        if self.current > 0 {
            self.buffers.entry(self.current).or_default().push_str(text);
            return Ok(());
        }
        sink.write_all(text.as_bytes())?;
        sink.flush()?;
        // the line map no longer tracks the source; force a resync at the
        // next start-of-line ship
        self.output_line = None;
        self.at_line_start = text.ends_with('\n');
        Ok(())
    }
}
