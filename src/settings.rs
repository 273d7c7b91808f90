// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.


//! Settings for parsing.

#[derive(Debug, Clone)]
pub struct Settings {
    /// Maximum list nesting; deeper input fails with "nesting too
    /// deep" instead of exhausting the stack. The parser recurses
    /// once per level, the limit with default thread stacks on Linux
    /// is a few thousand levels.
    pub max_depth: u32,
}

pub const DEFAULT_SETTINGS : Settings = Settings {
    max_depth: 500,
};

impl Default for Settings {
    fn default() -> Settings {
        DEFAULT_SETTINGS
    }
}
