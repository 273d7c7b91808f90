// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.


use sexpnode::context::SourceContext;
use sexpnode::node::Node;
use sexpnode::read::read_file;
use sexpnode::value::Value;
use clap::Parser as ClapParser;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use anyhow::Result;


fn indentstr(i: usize) -> Option<&'static str> {
    "                                                                  ".get(0..i)
}

#[derive(clap::Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Print the tree one node per line (default: as S-expressions)
    #[clap(short, long, value_parser)]
    tree: bool,
    /// Show the location of each node (only with --tree)
    #[clap(long, value_parser)]
    pos: bool,
    /// Paths to the input files
    #[clap(value_parser, required(true))]
    input_paths: Vec<PathBuf>,
}

fn print_tree(
    out: &mut impl Write,
    ctx: &SourceContext,
    n: Node<'_>,
    indent: usize,
    pos: bool,
) -> Result<()> {
    out.write_all(indentstr(indent).unwrap_or("").as_bytes())?;
    if n.is_list() {
        write!(out, "(")?;
    } else {
        write!(out, "{}", n)?;
    }
    if pos {
        if let Some(at) = ctx.decode(n.loc()) {
            write!(out, "  {}", at)?;
        }
    }
    writeln!(out)?;
    for c in n.children() {
        print_tree(out, ctx, c, indent + 1, pos)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // All files share one context, so that locations from any of
    // them can be decoded.
    let ctx = SourceContext::new();
    let mut out = BufWriter::new(stdout());
    for path in &args.input_paths {
        let ast = read_file(path, &ctx)?;
        if args.tree {
            for n in ast.root().children() {
                print_tree(&mut out, &ctx, n, 0, args.pos)?;
            }
        } else {
            for n in ast.root().children() {
                writeln!(out, "{}", Value::from(n))?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
