// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.


//! The location model: which files a [SourceLoc] can point into,
//! and where their lines start.
//!
//! Every registered file occupies a range of the global location
//! space, starting right after the previous file. A file registered
//! with unknown length (streaming input) must be finalized before the
//! next one can be registered; once all files are registered with
//! known lengths, they can be parsed concurrently against the same
//! context.

use crate::pos::{SourceLoc, SourceLocEx};
use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

#[derive(Debug, Clone, Copy)]
struct SourceLine {
    offset: usize, // relative to the beginning of the file
    num: u32,
}

/// One registered input stream. The parser calls
/// [add_line](SourceFile::add_line) for every newline and
/// [encode](SourceFile::encode) for every location it records.
#[derive(Debug)]
pub struct SourceFile {
    name: String,
    offset: SourceLoc,
    length: OnceLock<usize>,
    lines: RwLock<Vec<SourceLine>>,
}

impl SourceFile {
    fn new(name: &str, offset: SourceLoc, length: Option<usize>) -> SourceFile {
        let known = OnceLock::new();
        if let Some(len) = length {
            let _ = known.set(len);
        }
        SourceFile {
            name: name.to_string(),
            offset,
            length: known,
            lines: RwLock::new(vec![SourceLine { offset: 0, num: 1 }]),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` until known.
    pub fn length(&self) -> Option<usize> {
        self.length.get().copied()
    }

    /// Record that a new line starts at `offset` (the byte after the
    /// newline character). Offsets must be passed in increasing
    /// order.
    pub fn add_line(&self, offset: usize) {
        let mut lines = self.lines.write().unwrap_or_else(PoisonError::into_inner);
        let last = lines[lines.len() - 1];
        debug_assert!(offset > last.offset,
                      "line offsets must increase: {} after {}",
                      offset, last.offset);
        lines.push(SourceLine { offset, num: last.num + 1 });
    }

    /// Number of lines seen so far (at least 1).
    pub fn num_lines(&self) -> usize {
        self.lines.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// File-relative byte offset to global location.
    pub fn encode(&self, offset: usize) -> SourceLoc {
        let rel = u32::try_from(offset).unwrap_or(u32::MAX);
        SourceLoc(self.offset.0.saturating_add(rel))
    }

    /// Set the length once the end of the stream has been reached. A
    /// length given at registration stays in place, since later files
    /// may already have been laid out after it.
    pub fn finalize(&self, length: usize) {
        let _ = self.length.set(length);
    }

    fn find_line(&self, offset: usize) -> SourceLine {
        let lines = self.lines.read().unwrap_or_else(PoisonError::into_inner);
        // the first line starts at 0, so the index is at least 1
        let i = lines.partition_point(|l| l.offset <= offset);
        lines[i.max(1) - 1]
    }

    /// Decode a file-relative byte offset.
    pub fn decode_offset(&self, offset: usize) -> SourceLocEx {
        let line = self.find_line(offset);
        SourceLocEx {
            filename: self.name.clone(),
            line: line.num,
            column: u32::try_from(offset - line.offset).unwrap_or(u32::MAX),
            offset,
        }
    }
}

/// Holds the information needed to decode [SourceLoc] values.
#[derive(Debug, Default)]
pub struct SourceContext {
    files: RwLock<Vec<Arc<SourceFile>>>,
}

impl SourceContext {
    pub fn new() -> SourceContext {
        SourceContext::default()
    }

    /// Register a file at the next free global offset; `None` as
    /// length means unknown (to be finalized by the parser).
    ///
    /// Panics if the previously registered file has unknown length
    /// and was never finalized.
    pub fn add_file(&self, name: &str, length: Option<usize>) -> Arc<SourceFile> {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        let offset = match files.last() {
            None => SourceLoc(0),
            Some(last) => {
                let len = last.length().unwrap_or_else(|| {
                    panic!("last file {:?} in the SourceContext was not finalized",
                           last.name())
                });
                // One position past the end stays with the previous
                // file, so that end-of-file locations are unambiguous.
                last.encode(len.saturating_add(1))
            }
        };
        tracing::debug!(file = name, offset = offset.0, ?length,
                        "registered source file");
        let file = Arc::new(SourceFile::new(name, offset, length));
        files.push(file.clone());
        file
    }

    pub fn num_files(&self) -> usize {
        self.files.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `None` if no file in this context can contain `loc`
    /// (i.e. it was issued by some other context).
    pub fn decode(&self, loc: SourceLoc) -> Option<SourceLocEx> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        let i = files.partition_point(|f| f.offset <= loc);
        if i == 0 {
            return None;
        }
        let file = &files[i - 1];
        Some(file.decode_offset((loc.0 - file.offset.0) as usize))
    }

    /// Render a located error together with its decoded location.
    pub fn locate<'t, E: Located + Display>(&'t self, err: &'t E) -> WithContext<'t, E> {
        WithContext { err, ctx: self }
    }
}

/// Errors (and anything else) that point into the source.
pub trait Located {
    fn loc(&self) -> SourceLoc;
}

/// Display helper from [SourceContext::locate]: the message, then
/// `in "file"@line.col`, or the raw offset if the context does not
/// know the location.
pub struct WithContext<'t, E> {
    err: &'t E,
    ctx: &'t SourceContext,
}

impl<'t, E: Located + Display> Display for WithContext<'t, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        let loc = self.err.loc();
        match self.ctx.decode(loc) {
            Some(ex) => f.write_fmt(format_args!("{} in {}", self.err, ex)),
            None => f.write_fmt(format_args!("{} {}", self.err, loc)),
        }
    }
}

impl<'t, E: Located + Display> Debug for WithContext<'t, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        Display::fmt(self, f)
    }
}
