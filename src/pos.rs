// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.


//! Source locations: the compact form stamped on every node and
//! error, and the decoded form for humans.

use std::fmt::{Display, Formatter};

/// A byte position within the union of all files registered in one
/// [SourceContext](crate::context::SourceContext). Only meaningful
/// relative to the context that issued it; without a context it is
/// simply the byte offset into the parsed stream.

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLoc(pub u32);

impl SourceLoc {
    pub fn offset(self) -> usize {
        self.0 as usize
    }
}

impl Display for SourceLoc {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_fmt(format_args!("@{}", self.0))
    }
}

/// Line is 1-based; column and offset are in bytes (column counted
/// from the start of the line, offset from the start of the file),
/// which keeps them independent of the character encoding. The
/// column in characters can be recovered by counting characters in
/// the source between `offset - column` and `offset`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocEx {
    pub filename: String,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Display for SourceLocEx {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        // Following the Emacs convention for location information,
        // same as a Debug style path string prefix.
        f.write_fmt(format_args!("{:?}@{}.{}",
                                 self.filename,
                                 self.line,
                                 self.column))
    }
}
