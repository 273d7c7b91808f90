// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.


//! Untyped data: what a node tree decodes to when the target type
//! says nothing about its shape.

//! [Value] renders as an S-expression (lists in parentheses, every
//! scalar as a quoted string) that parses back into the same tree.

use crate::node::Node;
use std::fmt::{Debug, Display, Formatter, Write};
use std::ops::Deref;

fn fmt_escaped(f: &mut Formatter<'_>, s: &str) -> Result<(), std::fmt::Error> {
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c < ' ' || c == '\x7F' => {
                f.write_fmt(format_args!("\\x{:02X}", c as u32))?
            }
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

fn fmt_bytes(f: &mut Formatter<'_>, bs: &[u8]) -> Result<(), std::fmt::Error> {
    for b in bs {
        f.write_fmt(format_args!("\\x{:02X}", b))?;
    }
    Ok(())
}

/// Write `s` as a quoted string; bytes that are not part of valid
/// UTF-8 are written as `\xHH` escapes.
pub fn fmt_scalar(f: &mut Formatter<'_>, s: &[u8]) -> Result<(), std::fmt::Error> {
    f.write_char('"')?;
    let mut input = s;
    loop {
        match utf8::decode(input) {
            Ok(s) => {
                fmt_escaped(f, s)?;
                break;
            }
            Err(utf8::DecodeError::Invalid { valid_prefix, invalid_sequence,
                                             remaining_input }) => {
                fmt_escaped(f, valid_prefix)?;
                fmt_bytes(f, invalid_sequence)?;
                input = remaining_input;
            }
            Err(utf8::DecodeError::Incomplete { valid_prefix, incomplete_suffix }) => {
                fmt_escaped(f, valid_prefix)?;
                let len = incomplete_suffix.buffer_len as usize;
                fmt_bytes(f, &incomplete_suffix.buffer[..len])?;
                break;
            }
        }
    }
    f.write_char('"')
}

/// The text of a scalar, which is not necessarily UTF-8.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteString(pub Vec<u8>);

impl ByteString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl Deref for ByteString {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for ByteString {
    fn from(s: &str) -> ByteString {
        ByteString(s.as_bytes().to_vec())
    }
}

impl From<&[u8]> for ByteString {
    fn from(s: &[u8]) -> ByteString {
        ByteString(s.to_vec())
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(v: Vec<u8>) -> ByteString {
        ByteString(v)
    }
}

impl Display for ByteString {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        fmt_scalar(f, &self.0)
    }
}

impl Debug for ByteString {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        fmt_scalar(f, &self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Scalar(ByteString),
    List(Vec<Value>),
}

impl Default for Value {
    fn default() -> Value {
        Value::List(Vec::new())
    }
}

impl Value {
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(vs) => Some(vs.as_slice()),
            Value::Scalar(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Scalar(s) => Some(s.as_bytes()),
            Value::List(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => s.as_str(),
            Value::List(_) => None,
        }
    }
}

/// Easily create a scalar
pub fn scalar(s: &str) -> Value {
    Value::Scalar(ByteString::from(s))
}

impl<'a> From<Node<'a>> for Value {
    fn from(n: Node<'a>) -> Value {
        if n.is_list() {
            Value::List(n.children().map(Value::from).collect())
        } else {
            Value::Scalar(ByteString::from(n.value()))
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Value::Scalar(s) => fmt_scalar(f, s),
            Value::List(vs) => {
                f.write_char('(')?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    Display::fmt(v, f)?;
                }
                f.write_char(')')
            }
        }
    }
}
