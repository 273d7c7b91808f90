// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.


//! Get characters and their byte offsets from anything implementing
//! `Read`.

//! Invalid UTF-8 sequences are reported as U+FFFD, but still count
//! with their original length, so that offsets keep matching the
//! input bytes.

use std::io::{self, Read};
use utf8::{BufReadDecoder, BufReadDecoderError};
use genawaiter::rc::Gen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceChar {
    pub c: char,
    /// Byte offset from the start of the stream
    pub offset: usize,
    /// Number of input bytes the character was decoded from
    pub len: usize,
}

impl SourceChar {
    /// Offset of the byte following this character.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

pub fn buffered_chars<R>(
    fh: R
) -> impl Iterator<Item=io::Result<SourceChar>>
    where R: Read
{
    Gen::new(|co| async move {
        let mut inp = BufReadDecoder::new(io::BufReader::new(fh));
        let mut offset = 0;
        loop {
            match inp.next_strict() {
                Some(Ok(s)) => {
                    for c in s.chars() {
                        let len = c.len_utf8();
                        co.yield_(Ok(SourceChar { c, offset, len })).await;
                        offset += len;
                    }
                }
                Some(Err(BufReadDecoderError::InvalidByteSequence(bytes))) => {
                    let len = bytes.len();
                    co.yield_(Ok(SourceChar {
                        c: char::REPLACEMENT_CHARACTER,
                        offset,
                        len
                    })).await;
                    offset += len;
                }
                Some(Err(BufReadDecoderError::Io(e))) => {
                    co.yield_(Err(e)).await;
                    return;
                }
                None => return,
            }
        }
    }).into_iter()
}
