// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.


//! Reading and decoding whole files.

use crate::context::SourceContext;
use crate::decode::{Decode, DecodeError};
use crate::node::Ast;
use crate::parse::{parse, ParseErrorWithLoc};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Parse and decode errors are kept as is, together with their
/// message including the decoded location.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{}: {err}", .path.display())]
    IO { path: PathBuf, err: io::Error },
    #[error("{rendered}")]
    Parse { err: ParseErrorWithLoc, rendered: String },
    #[error("{rendered}")]
    Decode { err: DecodeError, rendered: String },
}

/// Parse the file at `path`, registering it with `ctx`.
pub fn read_file(path: &Path, ctx: &SourceContext) -> Result<Ast, LoadError> {
    let fh = File::open(path).map_err(
        |err| LoadError::IO { path: path.to_path_buf(), err })?;
    parse(fh, &path.to_string_lossy(), None, Some(ctx)).map_err(
        |err| LoadError::Parse { rendered: ctx.locate(&err).to_string(), err })
}

/// Parse the file at `path` and decode all of it (the root list) into
/// `out`.
pub fn load<T: Decode + ?Sized>(path: &Path, out: &mut T) -> Result<(), LoadError> {
    let ctx = SourceContext::new();
    let ast = read_file(path, &ctx)?;
    ast.root().decode(out).map_err(
        |err| LoadError::Decode { rendered: ctx.locate(&err).to_string(), err })
}
