/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Functions for generating engine-provided enums and bitfields.
//!
//! Both are newtype structs around their ordinal with one associated constant per enumerator. Ordinals the bindings do
//! not know (e.g. error codes of a newer engine) are carried unchanged.

use proc_macro2::{Literal, TokenStream};
use quote::quote;

use crate::conv;
use crate::models::json::JsonEnum;

pub fn make_enums(enums: &[JsonEnum]) -> Result<TokenStream, String> {
    let definitions = enums
        .iter()
        .map(make_enum_definition)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(quote! {
        #( #definitions )*
    })
}

/// Creates a definition for the given enum, with constants for each enumerator and all relevant trait impls.
pub fn make_enum_definition(enum_: &JsonEnum) -> Result<TokenStream, String> {
    if enum_.is_bitfield {
        Ok(make_bitfield_definition(enum_))
    } else {
        make_plain_enum_definition(enum_)
    }
}

fn make_plain_enum_definition(enum_: &JsonEnum) -> Result<TokenStream, String> {
    let name = conv::make_enum_name(&enum_.name);
    let name_str = name.to_string();

    let mut enumerators = Vec::with_capacity(enum_.values.len());
    let mut unique_ords: Vec<i32> = Vec::new();
    let mut ord_names: Vec<(i32, &str)> = Vec::new();

    for value in &enum_.values {
        let ord = value.to_enum_ord()?;
        let ident = conv::make_enumerator_name(&value.name);
        let ord_lit = Literal::i32_unsuffixed(ord);

        enumerators.push(quote! {
            pub const #ident: #name = #name { ord: #ord_lit };
        });

        // Duplicate ordinals map to the first enumerator.
        if !unique_ords.contains(&ord) {
            unique_ords.push(ord);
            ord_names.push((ord, value.name.as_str()));
        }
    }

    // Enums without enumerators have no valid ordinal at all.
    let known_arm = (!unique_ords.is_empty()).then(|| {
        let ords = unique_ords.into_iter().map(Literal::i32_unsuffixed);
        quote! { #( #ords )|* => Some(Self { ord }), }
    });
    let name_arms = ord_names.into_iter().map(|(ord, enumerator)| {
        let ord = Literal::i32_unsuffixed(ord);
        quote! { #ord => #enumerator, }
    });

    let enum_doc = format!("Engine enum `{}`.", enum_.name);

    Ok(quote! {
        #[doc = #enum_doc]
        #[repr(transparent)]
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct #name {
            ord: i32
        }

        impl #name {
            #( #enumerators )*

            /// Wraps any ordinal, including ones unknown to these bindings.
            pub const fn from_ord_unchecked(ord: i32) -> Self {
                Self { ord }
            }
        }

        impl std::fmt::Debug for #name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match <Self as crate::obj::EngineEnum>::as_str(self) {
                    "" => f.debug_tuple(#name_str).field(&self.ord).finish(),
                    enumerator => f.write_str(enumerator),
                }
            }
        }

        impl crate::obj::EngineEnum for #name {
            fn try_from_ord(ord: i32) -> Option<Self> {
                match ord {
                    #known_arm
                    _ => None,
                }
            }

            fn ord(self) -> i32 {
                self.ord
            }

            fn as_str(&self) -> &'static str {
                match self.ord {
                    #( #name_arms )*
                    _ => "",
                }
            }
        }

        crate::impl_ffi_enum!(#name, i32);
    })
}

fn make_bitfield_definition(enum_: &JsonEnum) -> TokenStream {
    let name = conv::make_enum_name(&enum_.name);
    let name_str = name.to_string();

    let enumerators = enum_.values.iter().map(|value| {
        let ident = conv::make_enumerator_name(&value.name);
        let ord = Literal::u64_unsuffixed(value.value as u64);

        quote! {
            pub const #ident: #name = #name { ord: #ord };
        }
    });

    let mut seen = Vec::new();
    let name_arms = enum_.values.iter().filter_map(|value| {
        let ord = value.value as u64;
        if seen.contains(&ord) {
            return None;
        }
        seen.push(ord);

        let ord = Literal::u64_unsuffixed(ord);
        let enumerator = value.name.as_str();
        Some(quote! { #ord => #enumerator, })
    });

    let enum_doc = format!("Engine bitfield `{}`.", enum_.name);

    quote! {
        #[doc = #enum_doc]
        #[repr(transparent)]
        #[derive(Copy, Clone, Eq, PartialEq, Hash)]
        pub struct #name {
            ord: u64
        }

        impl #name {
            #( #enumerators )*

            /// Wraps any combination of bits.
            pub const fn from_ord_unchecked(ord: u64) -> Self {
                Self { ord }
            }
        }

        impl std::fmt::Debug for #name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                // Single flags print their name; combinations print the bits.
                let enumerator = match self.ord {
                    #( #name_arms )*
                    _ => return f.debug_tuple(#name_str).field(&self.ord).finish(),
                };

                f.write_str(enumerator)
            }
        }

        impl crate::obj::EngineBitfield for #name {
            fn try_from_ord(ord: u64) -> Option<Self> {
                Some(Self { ord })
            }

            fn ord(self) -> u64 {
                self.ord
            }
        }

        impl std::ops::BitOr for #name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self::Output {
                Self { ord: self.ord | rhs.ord }
            }
        }

        impl std::ops::BitOrAssign for #name {
            fn bitor_assign(&mut self, rhs: Self) {
                *self = *self | rhs;
            }
        }

        crate::impl_ffi_enum!(#name, u64);
    }
}
