use anyhow::Result;
use sexpnode::context::SourceContext;
use sexpnode::parse::{parse, parse_file_with_settings, ParseError, ParseErrorWithLoc};
use sexpnode::settings::Settings;
use sexpnode::node::Ast;
use std::io::{self, Read};

const PALINDROME: &str = include_str!("palindrome.scm");
const GTK: &str = include_str!("gtk.sexp");
const EMPTY: &str = include_str!("empty.sexp");

fn parse_str(s: &str) -> Result<Ast, ParseErrorWithLoc> {
    parse(s.as_bytes(), "", None, None)
}

// The top-level nodes, shown as S-expressions
fn tree(s: &str) -> String {
    let ast = parse_str(s).unwrap_or_else(|e| panic!("{:?}: {}", s, e));
    let nodes: Vec<String> = ast.root().children().map(|n| n.to_string()).collect();
    nodes.join(" ")
}

fn scalar(s: &str) -> Vec<u8> {
    let ast = parse_str(s).unwrap();
    let root = ast.root();
    assert_eq!(root.num_children(), 1);
    root.nth(0).unwrap().value().to_vec()
}

fn err(s: &str) -> ParseErrorWithLoc {
    match parse_str(s) {
        Ok(_) => panic!("expected a parse error for {:?}", s),
        Err(e) => e,
    }
}

#[test]
fn files() -> Result<()> {
    let ctx = SourceContext::new();
    let pal = parse(PALINDROME.as_bytes(), "palindrome.scm", None, Some(&ctx))?;
    let gtk = parse(GTK.as_bytes(), "gtk.sexp", Some(GTK.len()), Some(&ctx))?;
    let empty = parse(EMPTY.as_bytes(), "empty.sexp", None, Some(&ctx))?;
    assert_eq!(ctx.num_files(), 3);
    assert_eq!(pal.root().num_children(), 2);
    assert_eq!(gtk.root().num_children(), 3);
    assert_eq!(empty.root().num_children(), 0);
    assert!(empty.root().is_list());

    let define = pal.root().nth(0)?;
    assert_eq!(define.nth(0)?.value(), b"define");
    let functions = gtk.root().nth(2)?.nth(2)?.nth(1)?;
    assert_eq!(functions.num_children(), 7);
    assert_eq!(functions.nth(3)?.value(), b"stock_add");
    Ok(())
}

#[test]
fn escapes() {
    assert_eq!(scalar(r#""\a\b\f\n\r\t\v\\\"""#),
               b"\x07\x08\x0C\n\r\t\x0B\\\"");
    assert_eq!(scalar(r#""\xFF""#), [0xFF]);
    assert_eq!(scalar(r#""\x41\x62""#), b"Ab");
    assert_eq!(scalar(r#""\u0436\r""#), "ж\r".as_bytes());
    assert_eq!(scalar(r#""\U00101234\t\t""#), "\u{101234}\t\t".as_bytes());
    assert_eq!(scalar(r#""\"""#), b"\"");
    assert_eq!(scalar(r#""жаба""#), "жаба".as_bytes());
}

#[test]
fn invalid_code_points_become_replacement_characters() {
    assert_eq!(scalar(r#""\uD800""#), [0xEF, 0xBF, 0xBD]);
    assert_eq!(tree(r#""\uD800" "\U00110000""#), "\"\u{FFFD}\" \"\u{FFFD}\"");
    assert_eq!(scalar(r#""a\UFFFFFFFFb""#), "a\u{FFFD}b".as_bytes());
}

#[test]
fn raw_strings() {
    assert_eq!(scalar("`a\\nb`"), b"a\\nb");
    assert_eq!(scalar("`line 1\nline 2`"), b"line 1\nline 2");
    assert_eq!(scalar("`(\"x\")`"), b"(\"x\")");
}

#[test]
fn general() {
    assert_eq!(tree("()"), "()");
    assert_eq!(tree("(;comment\n)"), "()");
    assert_eq!(tree("123 ;comment\n123"), r#""123" "123""#);
    assert_eq!(tree("(() ())"), "(() ())");
    assert_eq!(tree("(123 456)"), r#"("123" "456")"#);
    assert_eq!(tree("123 ()  456; comment"), r#""123" () "456""#);
    assert_eq!(tree(r#"123 ()  "456; comment""#), r#""123" () "456; comment""#);
    assert_eq!(tree("1 (2 (3 (4 (5))))"), r#""1" ("2" ("3" ("4" ("5"))))"#);
    assert_eq!(tree("`123` `456`"), r#""123" "456""#);
    assert_eq!(tree("(a\"b\" c)"), r#"("a\"b\"" "c")"#);
    assert_eq!(tree(" \t\r\n"), "");
    assert_eq!(tree(""), "");
    assert_eq!(tree("; just a comment"), "");
    assert_eq!(tree("(a) ; trailing\n; more\n"), r#"("a")"#);
}

#[test]
fn atom_delimiters() {
    // a comment may directly follow an atom
    assert_eq!(tree("abc;comment\ndef"), r#""abc" "def""#);
    assert_eq!(tree("(abc)def"), r#"("abc") "def""#);
    // '(', '"' and '`' do not end an atom
    assert_eq!(scalar("a(b\"c`d"), b"a(b\"c`d");
    assert_eq!(tree("(a(b c)"), r#"("a(b" "c")"#);
}

#[test]
fn node_locations() -> Result<()> {
    let ctx = SourceContext::new();
    let ast = parse("(a\n  (b \"c\"))\n`d`".as_bytes(), "locs.sexp", None, Some(&ctx))?;
    let l = ast.root().nth(0)?;
    let b = l.nth(1)?;
    let c = b.nth(1)?;
    let d = ast.root().nth(1)?;
    let at = |n: sexpnode::Node<'_>| {
        let ex = ctx.decode(n.loc()).unwrap();
        (ex.line, ex.column, ex.offset)
    };
    assert_eq!(at(l), (1, 0, 0));
    assert_eq!(at(b), (2, 2, 5));
    assert_eq!(at(c), (2, 5, 8));
    assert_eq!(at(d), (3, 0, 14));
    Ok(())
}

struct FailReader;

impl Read for FailReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "fail reader always fails"))
    }
}

#[test]
fn read_failure() {
    let e = parse(FailReader, "", None, None).err().unwrap();
    assert!(matches!(e.err, ParseError::IOError(_)));
    assert!(e.to_string().contains("fail reader always fails"), "{}", e);
}

#[test]
fn errors() {
    let e = err("(1 2 3");
    assert!(matches!(e.err, ParseError::MissingDelimiter(')')));
    assert_eq!(e.loc.0, 0);
    assert_eq!(e.to_string(), "missing matching sequence delimiter ')'");

    let e = err(r#""1 2 3"#);
    assert!(matches!(e.err, ParseError::MissingDelimiter('"')));
    let e = err("`1 2 3");
    assert!(matches!(e.err, ParseError::MissingDelimiter('`')));
    let e = err("(`1 2 3`");
    assert!(matches!(e.err, ParseError::MissingDelimiter(')')));
    let e = err("(a ; comment");
    assert!(matches!(e.err, ParseError::MissingDelimiter(')')));

    let e = err("x (y \"z\\");
    assert!(matches!(e.err, ParseError::MissingDelimiter('"')));
    assert_eq!(e.loc.0, 5);

    let e = err("\"1 2 3\n\"");
    assert!(matches!(e.err, ParseError::NewlineInString));
    assert!(e.to_string().contains("newline is not allowed"));

    let e = err(r#""\z""#);
    assert!(matches!(e.err, ParseError::UnrecognizedEscape));
    assert!(e.to_string().contains("unrecognized escape sequence"));
    assert_eq!(e.loc.0, 1);

    let e = err(r#""\x5J""#);
    assert!(matches!(e.err, ParseError::NonHexDigit('J')));
    assert_eq!(e.to_string(), "'J' is not a hex digit");
    assert_eq!(e.loc.0, 4);


    let e = err(")");
    assert!(matches!(e.err, ParseError::UnexpectedClose));
    assert!(e.to_string().contains("unexpected ')'"));
    let e = err("(a) b)");
    assert!(matches!(e.err, ParseError::UnexpectedClose));
    assert_eq!(e.loc.0, 5);

    let e = err("a \0");
    assert!(matches!(e.err, ParseError::UnexpectedNul));
}

#[test]
fn innermost_delimiter_is_reported() {
    // the innermost open construct wins, and closing one restores
    // the enclosing one
    let e = err("(a (b c) \"d\" `e` (f");
    assert!(matches!(e.err, ParseError::MissingDelimiter(')')));
    assert_eq!(e.loc.0, 17);
    let e = err("(a (b c) \"d\" `e`");
    assert!(matches!(e.err, ParseError::MissingDelimiter(')')));
    assert_eq!(e.loc.0, 0);
    let e = err("(a `b\nc");
    assert!(matches!(e.err, ParseError::MissingDelimiter('`')));
    assert_eq!(e.loc.0, 3);
}

#[test]
fn error_locations_in_context() {
    let ctx = SourceContext::new();
    let e = parse("(a\n  (b".as_bytes(), "t.sexp", None, Some(&ctx)).err().unwrap();
    assert_eq!(ctx.locate(&e).to_string(),
               r#"missing matching sequence delimiter ')' in "t.sexp"@2.2"#);
    // the failed file got finalized, more files can be added
    let ast = parse("x".as_bytes(), "u.sexp", None, Some(&ctx)).unwrap();
    let ex = ctx.decode(ast.root().nth(0).unwrap().loc()).unwrap();
    assert_eq!(ex.filename, "u.sexp");
    assert_eq!((ex.line, ex.column), (1, 0));
}

#[test]
fn nesting_limit() {
    let ctx = SourceContext::new();
    let settings = Settings { max_depth: 3 };
    let file = ctx.add_file("deep", Some(9));
    let e = parse_file_with_settings("((((a))))".as_bytes(), &file, &settings)
        .err().unwrap();
    assert!(matches!(e.err, ParseError::NestingTooDeep));
    assert_eq!(e.loc.0, 3);

    let file = ctx.add_file("ok", Some(7));
    let ast = parse_file_with_settings("(((a)))".as_bytes(), &file, &settings).unwrap();
    assert_eq!(ast.root().nth(0).unwrap().to_string(), r#"((("a")))"#);
}

#[test]
fn deep_nesting_within_default_limit() {
    let depth = 400;
    let src = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
    let ast = parse_str(&src).unwrap();
    let mut n = ast.root().nth(0).unwrap();
    for _ in 1..depth {
        n = n.nth(0).unwrap();
    }
    assert_eq!(n.nth(0).unwrap().value(), b"x");
}

#[test]
fn invalid_utf8_input() {
    // read as U+FFFD, offsets still count the input bytes
    let ctx = SourceContext::new();
    let ast = parse(&b"a\xFFb c"[..], "bin", None, Some(&ctx)).unwrap();
    assert_eq!(ast.root().nth(0).unwrap().value(), "a\u{FFFD}b".as_bytes());
    assert_eq!(ctx.decode(ast.root().nth(1).unwrap().loc()).unwrap().column, 4);
}
