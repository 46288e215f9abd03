/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

mod kv_parser;

pub(crate) use kv_parser::KvParser;

use proc_macro2::{Ident, TokenTree};
use quote::format_ident;

pub fn ident(s: &str) -> Ident {
    format_ident!("{}", s)
}

/// Returns `Err(venial::Error)` spanning `$span`, with a formatted message.
///
/// `$span` is anything implementing `ToTokens`; use `bail!(@span span, ...)` for a plain `Span`.
macro_rules! bail {
    (@span $span:expr, $($fmt:tt)*) => {
        Err(venial::Error::new_at_span($span, format!($($fmt)*)))
    };
    ($span:expr, $($fmt:tt)*) => {
        Err(crate::util::error!($span, $($fmt)*))
    };
}

macro_rules! error {
    ($span:expr, $($fmt:tt)*) => {
        venial::Error::new_at_span(crate::util::span_of(&$span), format!($($fmt)*))
    };
}

pub(crate) use bail;
pub(crate) use error;

/// Span of the first token of anything that can be turned into tokens.
pub(crate) fn span_of<T: quote::ToTokens>(tokens: &T) -> proc_macro2::Span {
    tokens
        .to_token_stream()
        .into_iter()
        .next()
        .map_or_else(proc_macro2::Span::call_site, |tt| tt.span())
}

pub(crate) fn path_is_single(path: &[TokenTree], expected: &str) -> bool {
    path.len() == 1 && path[0].to_string() == expected
}

pub(crate) fn is_punct(tt: &TokenTree, c: char) -> bool {
    match tt {
        TokenTree::Punct(punct) => punct.as_char() == c,
        _ => false,
    }
}

/// Whether the type is spelled `Base<...>`, possibly qualified (`gdlink::obj::Base<...>`).
pub(crate) fn is_base_type(ty: &venial::TypeExpr) -> bool {
    let tokens = &ty.tokens;

    let generic_start = tokens.iter().position(|tt| is_punct(tt, '<'));
    let path = match generic_start {
        Some(index) => &tokens[..index],
        None => return false,
    };

    path.last().is_some_and(|last| last.to_string() == "Base")
}

/// Last identifier of a path such as `gdlink::classes::INode`.
pub(crate) fn last_path_ident(ty: &venial::TypeExpr) -> Option<Ident> {
    ty.tokens.iter().rev().find_map(|tt| match tt {
        TokenTree::Ident(ident) => Some(ident.clone()),
        _ => None,
    })
}
