// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.


//! Translating a character stream into an [Ast].
//!
//! ```text
//! stream   := ws* (node ws*)*
//! node     := list | qstring | rstring | atom
//! list     := '(' ws* (node ws*)* ')'
//! qstring  := '"' (escape | any but '"' or newline)* '"'
//! rstring  := '`' (any but '`')* '`'
//! atom     := any but ws, ')', ';' or NUL, repeated
//! comment  := ';' any but newline* (newline | EOF)
//! ```
//!
//! An atom only ends at whitespace, `)`, `;` or EOF: `a(b` is the
//! single atom `a(b`, while in `abc;note` the comment directly
//! follows the atom `abc`. Comments are skipped wherever a node may
//! appear.
//!
//! Quoted strings know the escapes `\a \b \f \n \r \t \v \\ \"`,
//! `\xHH` (one byte), `\uHHHH` and `\UHHHHHHHH` (one code point,
//! UTF-8 encoded; U+FFFD if it is not a valid code point). Raw
//! strings take everything up to the closing backtick literally,
//! newlines included.

use crate::buffered_chars::{buffered_chars, SourceChar};
use crate::context::{Located, SourceContext, SourceFile};
use crate::node::{Ast, NodeId};
use crate::pos::SourceLoc;
use crate::settings::{Settings, DEFAULT_SETTINGS};
use std::io::{self, Read};
use std::iter::Fuse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unexpected read error: {0}")]
    IOError(io::Error),
    #[error("missing matching sequence delimiter '{0}'")]
    MissingDelimiter(char),
    #[error("unexpected ')' at the top level")]
    UnexpectedClose,
    #[error("newline is not allowed within '\"' strings")]
    NewlineInString,
    #[error("unrecognized escape sequence within '\"' string")]
    UnrecognizedEscape,
    #[error("'{0}' is not a hex digit")]
    NonHexDigit(char),
    #[error("unexpected NUL character")]
    UnexpectedNul,
    #[error("nesting too deep")]
    NestingTooDeep,
}

/// A syntax error and where it happened. For unterminated lists and
/// strings, the location is that of the opening delimiter.
#[derive(Error, Debug)]
#[error("{err}")]
pub struct ParseErrorWithLoc {
    pub err: ParseError,
    pub loc: SourceLoc,
}

impl ParseError {
    pub fn at(self, loc: SourceLoc) -> ParseErrorWithLoc {
        ParseErrorWithLoc {
            err: self,
            loc
        }
    }
}

impl Located for ParseErrorWithLoc {
    fn loc(&self) -> SourceLoc {
        self.loc
    }
}

/// The innermost open construct: where it started, which character
/// closes it, and whether EOF is acceptable right now (only at the
/// top level). Passed down by value; a construct that closes
/// continues reading under the state its caller handed it.
#[derive(Debug, Clone, Copy)]
struct Delim {
    loc: SourceLoc,
    closer: char,
    eof_ok: bool,
}

enum Parsed {
    Node(NodeId),
    Close,
    Eof,
}

fn is_space(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\n' || c == '\r'
}

fn is_atom_delimiter(c: char) -> bool {
    is_space(c) || c == ')' || c == ';' || c == '\0'
}

struct Parser<'s, I: Iterator> {
    cs: Fuse<I>,
    file: &'s SourceFile,
    settings: &'s Settings,
    ast: Ast,
    buf: Vec<u8>,
    // None at EOF
    cur: Option<char>,
    // offset of cur, and of the byte after it
    offset: usize,
    end: usize,
}

impl<'s, I> Parser<'s, I>
    where I: Iterator<Item = io::Result<SourceChar>>
{
    fn here(&self) -> SourceLoc {
        self.file.encode(self.offset)
    }

    fn next(&mut self, delim: Delim) -> Result<(), ParseErrorWithLoc> {
        match self.cs.next() {
            Some(Ok(sc)) => {
                self.cur = Some(sc.c);
                self.offset = sc.offset;
                self.end = sc.end();
                if sc.c == '\n' {
                    self.file.add_line(sc.end());
                }
                Ok(())
            }
            Some(Err(e)) => {
                Err(ParseError::IOError(e).at(self.file.encode(self.end)))
            }
            None => {
                self.cur = None;
                self.offset = self.end;
                if delim.eof_ok {
                    Ok(())
                } else {
                    Err(ParseError::MissingDelimiter(delim.closer).at(delim.loc))
                }
            }
        }
    }

    fn push_char(&mut self, c: char) {
        let mut tmp = [0; 4];
        self.buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
    }

    fn finish_scalar(&mut self, loc: SourceLoc) -> NodeId {
        let id = self.ast.push_scalar(loc, &self.buf);
        self.buf.clear();
        id
    }

    fn skip_spaces(&mut self, delim: Delim) -> Result<(), ParseErrorWithLoc> {
        while let Some(c) = self.cur {
            if !is_space(c) {
                break;
            }
            self.next(delim)?;
        }
        Ok(())
    }

    fn skip_comment(&mut self, delim: Delim) -> Result<(), ParseErrorWithLoc> {
        loop {
            match self.cur {
                None => return Ok(()),
                Some('\n') => return self.next(delim),
                Some(_) => self.next(delim)?,
            }
        }
    }

    // Called on a non-space `cur`.
    fn parse_node(&mut self, delim: Delim, depth: u32) -> Result<Parsed, ParseErrorWithLoc> {
        loop {
            return match self.cur {
                None => Ok(Parsed::Eof),
                Some(')') => Ok(Parsed::Close),
                Some('(') => self.parse_list(delim, depth).map(Parsed::Node),
                Some('"') => self.parse_string(delim).map(Parsed::Node),
                Some('`') => self.parse_raw_string(delim).map(Parsed::Node),
                Some(';') => {
                    self.skip_comment(delim)?;
                    self.skip_spaces(delim)?;
                    continue;
                }
                Some('\0') => Err(ParseError::UnexpectedNul.at(self.here())),
                Some(_) => self.parse_atom(delim).map(Parsed::Node),
            }
        }
    }

    fn parse_list(&mut self, outer: Delim, depth: u32) -> Result<NodeId, ParseErrorWithLoc> {
        let loc = self.here();
        if depth >= self.settings.max_depth {
            return Err(ParseError::NestingTooDeep.at(loc))
        }
        let inner = Delim { loc, closer: ')', eof_ok: false };
        let list = self.ast.push_list(loc);
        self.next(inner)?; // skip '('

        let mut last = None;
        loop {
            self.skip_spaces(inner)?;
            match self.parse_node(inner, depth + 1)? {
                Parsed::Node(id) => {
                    self.ast.append(list, last, id);
                    last = Some(id);
                }
                Parsed::Close => {
                    // the ')' may be followed by EOF if outer allows it
                    self.next(outer)?;
                    return Ok(list)
                }
                Parsed::Eof => {
                    return Err(ParseError::MissingDelimiter(')').at(loc))
                }
            }
        }
    }

    fn read_hex(&mut self, inner: Delim, numdigits: u32) -> Result<u32, ParseErrorWithLoc> {
        let mut n = 0;
        for _ in 0..numdigits {
            match self.cur {
                Some(c) => {
                    let d = c.to_digit(16).ok_or_else(
                        || ParseError::NonHexDigit(c).at(self.here()))?;
                    n = n * 16 + d;
                    self.next(inner)?;
                }
                None => {
                    return Err(ParseError::MissingDelimiter(inner.closer).at(inner.loc))
                }
            }
        }
        Ok(n)
    }

    fn parse_escape(&mut self, inner: Delim) -> Result<(), ParseErrorWithLoc> {
        let loc = self.here();
        self.next(inner)?; // skip '\\'
        let b = match self.cur {
            Some('a') => b'\x07',
            Some('b') => b'\x08',
            Some('f') => b'\x0C',
            Some('n') => b'\n',
            Some('r') => b'\r',
            Some('t') => b'\t',
            Some('v') => b'\x0B',
            Some('\\') => b'\\',
            Some('"') => b'"',
            Some(x @ ('x' | 'u' | 'U')) => {
                self.next(inner)?;
                let numdigits = match x {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let code = self.read_hex(inner, numdigits)?;
                if numdigits == 2 {
                    self.buf.push(code as u8);
                } else {
                    // surrogates and values beyond U+10FFFF
                    let c = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
                    self.push_char(c);
                }
                return Ok(())
            }
            _ => return Err(ParseError::UnrecognizedEscape.at(loc))
        };
        self.buf.push(b);
        self.next(inner)
    }

    fn parse_string(&mut self, outer: Delim) -> Result<NodeId, ParseErrorWithLoc> {
        let loc = self.here();
        let inner = Delim { loc, closer: '"', eof_ok: false };
        self.next(inner)?; // skip opening '"'
        loop {
            match self.cur {
                Some('\n') => {
                    return Err(ParseError::NewlineInString.at(loc))
                }
                Some('\\') => self.parse_escape(inner)?,
                Some('"') => {
                    let id = self.finish_scalar(loc);
                    self.next(outer)?;
                    return Ok(id)
                }
                Some(c) => {
                    self.push_char(c);
                    self.next(inner)?;
                }
                None => {
                    return Err(ParseError::MissingDelimiter('"').at(loc))
                }
            }
        }
    }

    fn parse_raw_string(&mut self, outer: Delim) -> Result<NodeId, ParseErrorWithLoc> {
        let loc = self.here();
        let inner = Delim { loc, closer: '`', eof_ok: false };
        self.next(inner)?; // skip opening '`'
        loop {
            match self.cur {
                Some('`') => {
                    let id = self.finish_scalar(loc);
                    self.next(outer)?;
                    return Ok(id)
                }
                Some(c) => {
                    self.push_char(c);
                    self.next(inner)?;
                }
                None => {
                    return Err(ParseError::MissingDelimiter('`').at(loc))
                }
            }
        }
    }

    fn parse_atom(&mut self, delim: Delim) -> Result<NodeId, ParseErrorWithLoc> {
        let loc = self.here();
        while let Some(c) = self.cur {
            if is_atom_delimiter(c) {
                break;
            }
            self.push_char(c);
            self.next(delim)?;
        }
        Ok(self.finish_scalar(loc))
    }

    fn parse_top(&mut self) -> Result<(), ParseErrorWithLoc> {
        let top = Delim { loc: self.file.encode(0), closer: ')', eof_ok: true };
        let root = self.ast.root().id();
        self.next(top)?;
        let mut last = None;
        loop {
            self.skip_spaces(top)?;
            match self.parse_node(top, 0)? {
                Parsed::Node(id) => {
                    self.ast.append(root, last, id);
                    last = Some(id);
                }
                Parsed::Close => {
                    return Err(ParseError::UnexpectedClose.at(self.here()))
                }
                Parsed::Eof => return Ok(())
            }
        }
    }
}

/// Parse an S-expression stream.
///
/// `filename` is only used for locations in messages. `length` is
/// the length of the stream in bytes if known. Locations in the
/// result and in errors can be decoded with `ctx`; if no context is
/// given, a private one is used and locations are plain byte offsets
/// into the stream. Returns the root node, a list of all top-level
/// nodes.
pub fn parse(
    r: impl Read,
    filename: &str,
    length: Option<usize>,
    ctx: Option<&SourceContext>,
) -> Result<Ast, ParseErrorWithLoc> {
    let private;
    let ctx = match ctx {
        Some(ctx) => ctx,
        None => {
            private = SourceContext::new();
            &private
        }
    };
    let file = ctx.add_file(filename, length);
    parse_file(r, &file)
}

/// Parse into a file already registered with
/// [SourceContext::add_file]. Files registered with known lengths
/// can be parsed on separate threads concurrently.
pub fn parse_file(r: impl Read, file: &SourceFile) -> Result<Ast, ParseErrorWithLoc> {
    parse_file_with_settings(r, file, &DEFAULT_SETTINGS)
}

pub fn parse_file_with_settings(
    r: impl Read,
    file: &SourceFile,
    settings: &Settings,
) -> Result<Ast, ParseErrorWithLoc> {
    let mut p = Parser {
        cs: buffered_chars(r).fuse(),
        file,
        settings,
        ast: Ast::new(file.encode(0)),
        buf: Vec::new(),
        cur: None,
        offset: 0,
        end: 0,
    };
    let result = p.parse_top();
    file.finalize(p.end);
    match result {
        Ok(()) => {
            tracing::debug!(file = file.name(), bytes = p.end,
                            nodes = p.ast.num_nodes(), "parsed");
            Ok(p.ast)
        }
        Err(e) => {
            tracing::debug!(file = file.name(), loc = e.loc.0,
                            error = %e, "parse failed");
            Err(e)
        }
    }
}
