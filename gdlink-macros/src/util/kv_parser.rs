/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;

use proc_macro2::{Delimiter, Ident, Span, TokenStream, TokenTree};

use crate::util::{bail, error, ident, is_punct, path_is_single};
use crate::ParseResult;

/// Value of one key: `key = tokens...` or `key(tokens...)`.
#[derive(Clone, Debug)]
pub(crate) enum KvValue {
    Assigned(Vec<TokenTree>),
    Group(TokenStream),
}

pub(crate) type KvMap = HashMap<Ident, Option<KvValue>>;

/// Struct to parse attributes like `#[attr(key, key2 = Ident, key3(NAME = 1, OTHER = 2))]`.
pub(crate) struct KvParser {
    map: KvMap,
    span: Span,
}

impl KvParser {
    /// Create a new parser which checks for presence of an `#[expected]` attribute.
    ///
    /// Returns `Ok(None)` if the attribute is not present.
    pub fn parse(attributes: &[venial::Attribute], expected: &str) -> ParseResult<Option<Self>> {
        let mut found_attr: Option<Self> = None;

        for attr in attributes.iter() {
            if !path_is_single(&attr.path, expected) {
                continue;
            }

            if found_attr.is_some() {
                return bail!(attr, "only a single #[{expected}] attribute allowed");
            }

            found_attr = Some(Self {
                span: attr.tk_brackets.span,
                map: parse_map(expected, attr.value.get_value_tokens())?,
            });
        }

        Ok(found_attr)
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Handles a key that can only occur without a value, e.g. `#[attr(toggle)]`. Returns whether the key is present.
    pub fn handle_alone(&mut self, key: &str) -> ParseResult<bool> {
        match self.map.remove_entry(&ident(key)) {
            None => Ok(false),
            Some((_, None)) => Ok(true),
            Some((key, Some(_))) => bail!(key, "key `{key}` should not have a value"),
        }
    }

    /// Handles an optional key that can only occur with an identifier as the value.
    pub fn handle_ident(&mut self, key: &str) -> ParseResult<Option<Ident>> {
        match self.map.remove_entry(&ident(key)) {
            None => Ok(None),
            Some((key, Some(KvValue::Assigned(tokens)))) => match tokens.as_slice() {
                [TokenTree::Ident(value)] => Ok(Some(value.clone())),
                _ => bail!(key, "expected `{key}` to be followed by `= identifier`"),
            },
            Some((key, _)) => bail!(key, "expected `{key}` to be followed by `= identifier`"),
        }
    }

    /// Handles an optional key with an arbitrary expression as the value.
    pub fn handle_expr(&mut self, key: &str) -> ParseResult<Option<TokenStream>> {
        match self.map.remove_entry(&ident(key)) {
            None => Ok(None),
            Some((_, Some(KvValue::Assigned(tokens)))) => Ok(Some(tokens.into_iter().collect())),
            Some((key, _)) => bail!(key, "expected `{key}` to be followed by `= expression`"),
        }
    }

    /// Handles a list of assignments in parentheses, e.g. `constants(A = 1, B = -2)`.
    ///
    /// Returns the entries in declaration order.
    pub fn handle_assignments(&mut self, key: &str) -> ParseResult<Option<Vec<(Ident, TokenStream)>>> {
        let group = match self.map.remove_entry(&ident(key)) {
            None => return Ok(None),
            Some((_, Some(KvValue::Group(group)))) => group,
            Some((key, _)) => bail!(key, "expected `{key}(NAME = value, ...)`")?,
        };

        let tokens: Vec<TokenTree> = group.into_iter().collect();
        let mut entries = Vec::new();

        for entry in tokens.split(|tt| is_punct(tt, ',')).filter(|e| !e.is_empty()) {
            match entry {
                [TokenTree::Ident(name), eq, value @ ..] if is_punct(eq, '=') && !value.is_empty() => {
                    if entries.iter().any(|(existing, _)| existing == name) {
                        return bail!(name, "duplicate entry `{name}` in `{key}(...)`");
                    }

                    entries.push((name.clone(), value.iter().cloned().collect()));
                }
                _ => return bail!(entry[0], "expected `NAME = value` in `{key}(...)`"),
            }
        }

        Ok(Some(entries))
    }

    /// Fails on keys that no `handle_*` call consumed.
    pub fn finish(self) -> ParseResult<()> {
        let mut errors = self
            .map
            .into_keys()
            .map(|key| error!(key, "unrecognized key `{key}`"));

        match errors.next() {
            None => Ok(()),
            Some(first) => Err(errors.fold(first, |mut acc, e| {
                acc.combine(e);
                acc
            })),
        }
    }
}

fn parse_map(attr_name: &str, tokens: &[TokenTree]) -> ParseResult<KvMap> {
    let mut map = KvMap::new();
    let mut tokens = tokens.iter().peekable();

    while let Some(tt) = tokens.next() {
        let TokenTree::Ident(key) = tt else {
            return bail!(tt, "expected identifier in #[{attr_name}]");
        };

        let value = match tokens.peek() {
            None => None,
            Some(next) if is_punct(next, ',') => {
                tokens.next();
                None
            }
            Some(next) if is_punct(next, '=') => {
                tokens.next();

                let mut value = Vec::new();
                while let Some(tt) = tokens.next_if(|tt| !is_punct(tt, ',')) {
                    value.push(tt.clone());
                }
                tokens.next(); // trailing comma

                if value.is_empty() {
                    return bail!(key, "expected value after `{key} =`");
                }
                Some(KvValue::Assigned(value))
            }
            Some(TokenTree::Group(group)) if group.delimiter() == Delimiter::Parenthesis => {
                let inner = group.stream();
                tokens.next();
                if let Some(next) = tokens.next() {
                    if !is_punct(next, ',') {
                        return bail!(next, "expected `,` after `{key}(...)`");
                    }
                }
                Some(KvValue::Group(inner))
            }
            Some(next) => return bail!(next, "expected `,` or `= value` following `{key}`"),
        };

        if map.contains_key(key) {
            return bail!(key, "duplicate key `{key}`");
        }
        map.insert(key.clone(), value);
    }

    Ok(map)
}
