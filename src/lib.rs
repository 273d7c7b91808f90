// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.


//! This is an S-Expression reader and decoder, for configuration
//! files and similar data:
//!
//! * [parse](parse::parse) reads a stream into an [Ast](node::Ast), a
//!   tree of lists and scalars, each stamped with its
//!   [SourceLoc](pos::SourceLoc). Syntax errors point at the right
//!   place, in particular unterminated lists and strings point at
//!   their opening delimiter.
//!
//! * Locations are compact integers; a
//!   [SourceContext](context::SourceContext) shared between several
//!   parses turns them back into file name, line and column.
//!
//! * [Decode](decode::Decode) fills typed values from a tree,
//!   guided by the shape of the target type: numbers, strings,
//!   sequences, maps, structs (via
//!   [decode_record!](decode_record)), and types with their own
//!   rules.
//!
//! ```
//! use std::collections::HashMap;
//!
//! let ast = sexpnode::parse::parse(
//!     &b"(countries (Spain Japan)) ; comment\n(ports (80 443))"[..],
//!     "example.sexp", None, None).unwrap();
//! let mut m: HashMap<String, Vec<String>> = HashMap::new();
//! ast.root().decode(&mut m).unwrap();
//! assert_eq!(m["ports"], ["80", "443"]);
//! ```
//!
//! There is no writer for typed values; [Value](value::Value) and
//! [Node](node::Node) can be shown as S-expressions though.

pub mod buffered_chars;
pub mod context;
pub mod decode;
pub mod node;
pub mod parse;
pub mod pos;
pub mod read;
pub mod settings;
pub mod value;

pub use context::SourceContext;
pub use decode::{Decode, DecodeError};
pub use node::{Ast, Node};
pub use parse::{parse, ParseErrorWithLoc};
