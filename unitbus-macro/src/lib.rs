/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Procedural macros for unitbus message types.
//!
//! The [`bus_message`] attribute turns a plain struct into a message body the bus
//! can compose, dispatch and carry over the network:
//!
//! ```ignore
//! use unitbus::prelude::*;
//!
//! #[bus_message(command = "command/ping")]
//! pub struct PingCommand;
//!
//! #[bus_message(reply = "command/ping/reply")]
//! pub struct PingReply;
//!
//! #[bus_message(event = "event/project/created")]
//! pub struct ProjectCreated {
//!     pub project: String,
//! }
//! ```

use proc_macro::TokenStream;

use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, LitStr};

fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta
                    .path
                    .segments
                    .last()
                    .is_some_and(|segment| segment.ident == trait_name)
                {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

#[derive(Clone, Copy)]
enum Category {
    Command,
    Reply,
    Event,
}

/// Options parsed from `#[bus_message(...)]`.
#[derive(Default)]
struct MessageConfig {
    category: Option<(Category, LitStr)>,
}

impl MessageConfig {
    fn parse(&mut self, meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<()> {
        let category = if meta.path.is_ident("command") {
            Category::Command
        } else if meta.path.is_ident("reply") {
            Category::Reply
        } else if meta.path.is_ident("event") {
            Category::Event
        } else {
            return Err(meta.error("expected `command`, `reply` or `event`"));
        };
        if self.category.is_some() {
            return Err(meta.error("a message type has exactly one category"));
        }
        let name: LitStr = meta.value()?.parse()?;
        if name.value().trim().is_empty() {
            return Err(syn::Error::new(name.span(), "message name must not be empty"));
        }
        self.category = Some((category, name));
        Ok(())
    }
}

/// Declares a message type.
///
/// Takes exactly one of `command = "..."`, `reply = "..."` or `event = "..."`,
/// naming the type on the wire. The attribute:
///
/// - derives `Clone`, `Debug`, `Serialize` and `Deserialize` (skipping derives
///   already present)
/// - implements `unitbus::traits::BusMessage` with the given name and category
/// - implements the matching marker (`Command`, `CommandReply` or `Event`)
/// - asserts at compile time that the type is `Send + Sync + 'static`
///
/// Registration with a `MessageTypeRegistry` is still explicit.
#[proc_macro_attribute]
pub fn bus_message(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut config = MessageConfig::default();
    let parser = syn::meta::parser(|meta| config.parse(&meta));
    parse_macro_input!(attr with parser);

    let input = parse_macro_input!(item as DeriveInput);

    let Some((category, message_name)) = config.category else {
        return syn::Error::new(
            Span::call_site(),
            "missing message name, e.g. #[bus_message(event = \"event/domain/action\")]",
        )
        .to_compile_error()
        .into();
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let derives = {
        let mut traits = Vec::new();
        if !has_derive(&input, "Clone") {
            traits.push(quote!(Clone));
        }
        if !has_derive(&input, "Debug") {
            traits.push(quote!(Debug));
        }
        if !has_derive(&input, "Serialize") {
            traits.push(quote!(::unitbus::__private::serde::Serialize));
        }
        if !has_derive(&input, "Deserialize") {
            traits.push(quote!(::unitbus::__private::serde::Deserialize));
        }
        if traits.is_empty() {
            quote!()
        } else {
            quote! {
                #[derive(#(#traits),*)]
                #[serde(crate = "::unitbus::__private::serde")]
            }
        }
    };

    let (category_variant, marker) = match category {
        Category::Command => (quote!(Command), quote!(Command)),
        Category::Reply => (quote!(CommandReply), quote!(CommandReply)),
        Category::Event => (quote!(Event), quote!(Event)),
    };

    let assert_ident = quote::format_ident!("_AssertBusMessage_{}", name);

    let expanded = quote! {
        #derives
        #input

        impl #impl_generics ::unitbus::traits::BusMessage for #name #ty_generics #where_clause {
            const NAME: &'static str = #message_name;
            const CATEGORY: ::unitbus::message::MessageCategory =
                ::unitbus::message::MessageCategory::#category_variant;
        }

        impl #impl_generics ::unitbus::traits::#marker for #name #ty_generics #where_clause {}

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}
