// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.


//! Decoding node trees into typed values.
//!
//! The target type picks the rule, via its [Decode] impl:
//!
//! * integers, floats, `bool`, `char`, `String`, [ByteString] and
//!   `num::BigInt`/`BigUint` require a scalar. Integers are base 10
//!   and fail on overflow for their width, booleans are `true` or
//!   `false`.
//! * `[T; N]` and `Vec<T>` require a list and decode positionally.
//!   Arrays ignore excess children and reset slots without a child
//!   to `T::default()`; vectors get exactly one element per child.
//! * `HashMap` and `BTreeMap` require a list of `(key value)` lists;
//!   later duplicate keys overwrite earlier ones.
//! * Records (structs set up with [decode_record!](crate::decode_record))
//!   also take `(key value)` lists. A key picks the field whose
//!   rename matches it, else the field of exactly that name, else the
//!   field whose name matches ignoring case. Unknown keys are
//!   ignored, fields without a key keep their value.
//! * [Value] takes anything.
//! * `Option<T>` decodes into the contained value, creating it with
//!   `T::default()` first if it is `None`; `Box<T>` decodes into the
//!   boxed value.
//!
//! Types with their own representation implement [Decode] directly.
//!
//! Decoding stops at the first error. Whatever was decoded before it
//! stays in the output.

use crate::context::Located;
use crate::node::{ordinal, Node, NodeError, NodeId};
use crate::pos::SourceLoc;
use crate::value::{ByteString, Value};
use num::{BigInt, BigUint};
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::num::IntErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeErrorKind {
    #[error("scalar value required")]
    ScalarExpected,
    #[error("list value required")]
    ListExpected,
    #[error("value {0:?} is out of range")]
    Overflow(String),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("undefined boolean value {0:?}, expected true or false")]
    UndefinedBool(String),
    #[error("expected a single character, got {0:?}")]
    NotAChar(String),
    #[error("value is not valid UTF-8")]
    InvalidUtf8,
    /// `index` is 1-based
    #[error("cannot decode {} value, only {count} nodes available",
            ordinal(.index))]
    NotEnoughNodes { index: usize, count: usize },
    #[error("{0}")]
    Node(NodeError),
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Custom(anyhow::Error),
}

fn into_target(target: &Option<&'static str>) -> String {
    match target {
        Some(t) => format!(" (decoding into {})", t),
        None => String::new(),
    }
}

/// A decoding failure: what went wrong, at which node, and (where
/// known) the type that was being decoded into.
#[derive(Error, Debug)]
#[error("{kind}{}", into_target(.target))]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub loc: SourceLoc,
    pub node: NodeId,
    pub target: Option<&'static str>,
}

impl DecodeError {
    fn of<T: ?Sized>(node: Node<'_>, kind: DecodeErrorKind) -> DecodeError {
        DecodeError {
            kind,
            loc: node.loc(),
            node: node.id(),
            target: Some(std::any::type_name::<T>()),
        }
    }

    /// For use by [Decode] implementations.
    pub fn new(node: Node<'_>, target: &'static str, message: impl Into<String>)
               -> DecodeError {
        DecodeError {
            kind: DecodeErrorKind::Message(message.into()),
            loc: node.loc(),
            node: node.id(),
            target: Some(target),
        }
    }

    /// Wrap an arbitrary error; it is shown as is.
    pub fn custom(node: Node<'_>, err: impl Into<anyhow::Error>) -> DecodeError {
        DecodeError {
            kind: DecodeErrorKind::Custom(err.into()),
            loc: node.loc(),
            node: node.id(),
            target: None,
        }
    }

    // Node errors come without a target
    fn with_target<T: ?Sized>(mut self) -> DecodeError {
        if self.target.is_none() && matches!(self.kind, DecodeErrorKind::Node(_)) {
            self.target = Some(std::any::type_name::<T>());
        }
        self
    }
}

impl From<NodeError> for DecodeError {
    fn from(e: NodeError) -> DecodeError {
        DecodeError {
            loc: e.loc(),
            node: e.node(),
            target: None,
            kind: DecodeErrorKind::Node(e),
        }
    }
}

impl Located for DecodeError {
    fn loc(&self) -> SourceLoc {
        self.loc
    }
}

/// A type that can be filled from a node.
pub trait Decode {
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError>;
}

/// Decode `node` into `out`.
pub fn decode<T: Decode + ?Sized>(node: Node<'_>, out: &mut T) -> Result<(), DecodeError> {
    out.decode_from(node)
}

/// Decode the children of a list, or a scalar and its following
/// siblings, into `outs` by position. Nodes beyond the number of
/// outputs are ignored, outputs beyond the number of nodes are an
/// error. Pass [Skip] to leave a position out.
pub fn decode_each(node: Node<'_>, outs: &mut [&mut dyn Decode]) -> Result<(), DecodeError> {
    let mut nodes = node.iter_nodes();
    for (i, out) in outs.iter_mut().enumerate() {
        match nodes.next() {
            Some(n) => out.decode_from(n)?,
            None => {
                return Err(DecodeError {
                    kind: DecodeErrorKind::NotEnoughNodes {
                        index: i + 1,
                        count: node.iter_nodes().count(),
                    },
                    loc: node.loc(),
                    node: node.id(),
                    target: None,
                })
            }
        }
    }
    Ok(())
}

/// Placeholder for [decode_each] positions to leave alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Skip;

impl Decode for Skip {
    fn decode_from(&mut self, _node: Node<'_>) -> Result<(), DecodeError> {
        Ok(())
    }
}

fn scalar_bytes<'a, T: ?Sized>(node: Node<'a>) -> Result<&'a [u8], DecodeError> {
    if node.is_scalar() {
        Ok(node.value())
    } else {
        Err(DecodeError::of::<T>(node, DecodeErrorKind::ScalarExpected))
    }
}

fn scalar_str<'a, T: ?Sized>(node: Node<'a>) -> Result<&'a str, DecodeError> {
    std::str::from_utf8(scalar_bytes::<T>(node)?)
        .map_err(|_| DecodeError::of::<T>(node, DecodeErrorKind::InvalidUtf8))
}

fn require_list<T: ?Sized>(node: Node<'_>) -> Result<(), DecodeError> {
    if node.is_list() {
        Ok(())
    } else {
        Err(DecodeError::of::<T>(node, DecodeErrorKind::ListExpected))
    }
}

macro_rules! decode_integer {
    ($($t:ty)*) => {
        $(
            impl Decode for $t {
                fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
                    let s = scalar_str::<$t>(node)?;
                    *self = s.parse::<$t>().map_err(|e| {
                        let kind = match e.kind() {
                            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow =>
                                DecodeErrorKind::Overflow(s.to_string()),
                            _ => DecodeErrorKind::InvalidNumber(s.to_string()),
                        };
                        DecodeError::of::<$t>(node, kind)
                    })?;
                    Ok(())
                }
            }
        )*
    }
}

decode_integer!(i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize);

macro_rules! decode_float {
    ($($t:ty)*) => {
        $(
            impl Decode for $t {
                fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
                    let s = scalar_str::<$t>(node)?;
                    *self = s.parse::<$t>().map_err(|_| {
                        DecodeError::of::<$t>(node, DecodeErrorKind::InvalidNumber(
                            s.to_string()))
                    })?;
                    Ok(())
                }
            }
        )*
    }
}

decode_float!(f32 f64);

impl Decode for BigInt {
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
        let s = scalar_bytes::<Self>(node)?;
        *self = BigInt::parse_bytes(s, 10).ok_or_else(|| {
            DecodeError::of::<Self>(node, DecodeErrorKind::InvalidNumber(
                String::from_utf8_lossy(s).into_owned()))
        })?;
        Ok(())
    }
}

impl Decode for BigUint {
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
        let s = scalar_bytes::<Self>(node)?;
        *self = BigUint::parse_bytes(s, 10).ok_or_else(|| {
            DecodeError::of::<Self>(node, DecodeErrorKind::InvalidNumber(
                String::from_utf8_lossy(s).into_owned()))
        })?;
        Ok(())
    }
}

impl Decode for bool {
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
        *self = match scalar_bytes::<Self>(node)? {
            b"true" => true,
            b"false" => false,
            s => return Err(DecodeError::of::<Self>(
                node,
                DecodeErrorKind::UndefinedBool(String::from_utf8_lossy(s).into_owned())))
        };
        Ok(())
    }
}

impl Decode for char {
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
        let s = scalar_str::<Self>(node)?;
        let mut cs = s.chars();
        match (cs.next(), cs.next()) {
            (Some(c), None) => {
                *self = c;
                Ok(())
            }
            _ => Err(DecodeError::of::<Self>(node, DecodeErrorKind::NotAChar(s.to_string())))
        }
    }
}

impl Decode for String {
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
        let s = scalar_str::<Self>(node)?;
        self.clear();
        self.push_str(s);
        Ok(())
    }
}

impl Decode for ByteString {
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
        let s = scalar_bytes::<Self>(node)?;
        self.0.clear();
        self.0.extend_from_slice(s);
        Ok(())
    }
}

impl Decode for Value {
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
        *self = Value::from(node);
        Ok(())
    }
}

impl<T: Decode + Default> Decode for Option<T> {
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
        self.get_or_insert_with(T::default).decode_from(node)
    }
}

impl<T: Decode + ?Sized> Decode for Box<T> {
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
        (**self).decode_from(node)
    }
}

impl<T: Decode + Default, const N: usize> Decode for [T; N] {
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
        require_list::<Self>(node)?;
        let mut children = node.children();
        for slot in self.iter_mut() {
            match children.next() {
                Some(c) => slot.decode_from(c)?,
                None => *slot = T::default(),
            }
        }
        Ok(())
    }
}

impl<T: Decode + Default> Decode for Vec<T> {
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
        require_list::<Self>(node)?;
        self.clear();
        for c in node.children() {
            let mut v = T::default();
            v.decode_from(c)?;
            self.push(v);
        }
        Ok(())
    }
}

fn decode_pair<K, V>(k: Node<'_>, v: Node<'_>) -> Result<(K, V), DecodeError>
    where K: Decode + Default, V: Decode + Default
{
    let mut key = K::default();
    key.decode_from(k)?;
    let mut val = V::default();
    val.decode_from(v)?;
    Ok((key, val))
}

impl<K, V, S> Decode for HashMap<K, V, S>
    where K: Decode + Default + Eq + Hash,
          V: Decode + Default,
          S: BuildHasher
{
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
        node.iter_key_values(|k, v| -> Result<(), DecodeError> {
            let (key, val) = decode_pair(k, v)?;
            self.insert(key, val);
            Ok(())
        }).map_err(DecodeError::with_target::<Self>)
    }
}

impl<K, V> Decode for BTreeMap<K, V>
    where K: Decode + Default + Ord,
          V: Decode + Default
{
    fn decode_from(&mut self, node: Node<'_>) -> Result<(), DecodeError> {
        node.iter_key_values(|k, v| -> Result<(), DecodeError> {
            let (key, val) = decode_pair(k, v)?;
            self.insert(key, val);
            Ok(())
        }).map_err(DecodeError::with_target::<Self>)
    }
}

/// Describes one field of a [Record].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    /// Key text to match before any field name
    pub rename: Option<&'static str>,
}

/// A struct decoded from `(key value)` pairs, usually set up with
/// [decode_record!](crate::decode_record).
pub trait Record {
    const FIELDS: &'static [Field];

    /// Decode `node` into the field called `name` (as in
    /// [Field::name]).
    fn decode_field(&mut self, name: &str, node: Node<'_>) -> Result<(), DecodeError>;
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars().flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// The field a key selects: by rename, then by exact name, then by
/// name ignoring case. Renamed fields still match by their name.
pub fn match_field<'f>(fields: &'f [Field], key: &str) -> Option<&'f Field> {
    fields.iter().find(|f| f.rename == Some(key))
        .or_else(|| fields.iter().find(|f| f.name == key))
        .or_else(|| fields.iter().find(|f| eq_ignore_case(f.name, key)))
}

/// The [Decode] rule for records.
pub fn decode_record<R: Record + ?Sized>(out: &mut R, node: Node<'_>) -> Result<(), DecodeError> {
    node.iter_key_values(|k, v| -> Result<(), DecodeError> {
        let field = k.value_str().and_then(|key| match_field(R::FIELDS, key));
        match field {
            Some(field) => out.decode_field(field.name, v),
            None => {
                tracing::trace!(key = %k, record = std::any::type_name::<R>(),
                                "ignoring unmatched key");
                Ok(())
            }
        }
    }).map_err(DecodeError::with_target::<R>)
}

/// Implement [Record] and [Decode] for a struct whose fields all
/// implement [Decode]. A rename adds a key for its field, it does not
/// hide the field's own name: below, both `max-connections` and
/// `max_conns` set `max_conns`.
///
/// ```
/// use sexpnode::decode_record;
///
/// #[derive(Default)]
/// struct Server {
///     host: String,
///     port: u16,
///     max_conns: Option<u32>,
/// }
///
/// decode_record!(Server {
///     host,
///     port,
///     max_conns = "max-connections",
/// });
///
/// let ast = sexpnode::parse::parse(
///     &b"(host example.org) (PORT 8080) (max-connections 64)"[..],
///     "server.sexp", None, None).unwrap();
/// let mut server = Server::default();
/// ast.root().decode(&mut server).unwrap();
/// assert_eq!(server.port, 8080);
/// assert_eq!(server.max_conns, Some(64));
///
/// let ast = sexpnode::parse::parse(&b"(max_conns 5)"[..], "", None, None).unwrap();
/// ast.root().decode(&mut server).unwrap();
/// assert_eq!(server.max_conns, Some(5));
/// ```
#[macro_export]
macro_rules! decode_record {
    (@rename) => { None };
    (@rename $rename:literal) => { Some($rename) };
    ($t:ty { $( $field:ident $(= $rename:literal)? ),* $(,)? }) => {
        impl $crate::decode::Record for $t {
            const FIELDS: &'static [$crate::decode::Field] = &[
                $(
                    $crate::decode::Field {
                        name: stringify!($field),
                        rename: $crate::decode_record!(@rename $($rename)?),
                    },
                )*
            ];

            #[allow(unused_variables)]
            fn decode_field(
                &mut self,
                name: &str,
                node: $crate::node::Node<'_>
            ) -> Result<(), $crate::decode::DecodeError> {
                $(
                    if name == stringify!($field) {
                        return $crate::decode::Decode::decode_from(&mut self.$field, node);
                    }
                )*
                Ok(())
            }
        }

        impl $crate::decode::Decode for $t {
            fn decode_from(
                &mut self,
                node: $crate::node::Node<'_>
            ) -> Result<(), $crate::decode::DecodeError> {
                $crate::decode::decode_record(self, node)
            }
        }
    };
}
