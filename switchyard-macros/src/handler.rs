//! `#[message_handler(...)]`.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{
    Ident, ItemStruct, LitBool, LitInt, LitStr, Token, Type,
    parse::{Parse, ParseStream},
    parse_macro_input,
    punctuated::Punctuated,
    token,
};

/// Arguments for the `#[message_handler]` macro.
pub(crate) struct HandlerArgs {
    pub modules: Vec<LitStr>,
    pub sinks: Vec<LitStr>,
    pub messages: Vec<Type>,
    pub keywords: Vec<LitStr>,
    pub priority: Option<u8>,
    pub augmentable: Option<bool>,
    pub global: Option<Ident>,
    pub name: Option<LitStr>,
}

/// Parses either `"value"` or `["a", "b"]`.
fn parse_one_or_many<T>(
    input: ParseStream,
    parse: fn(ParseStream) -> syn::Result<T>,
) -> syn::Result<Vec<T>> {
    if input.peek(token::Bracket) {
        let content;
        syn::bracketed!(content in input);
        let items = Punctuated::<T, Token![,]>::parse_terminated_with(&content, parse)?;
        Ok(items.into_iter().collect())
    } else {
        Ok(vec![parse(input)?])
    }
}

impl Parse for HandlerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = HandlerArgs {
            modules: Vec::new(),
            sinks: Vec::new(),
            messages: Vec::new(),
            keywords: Vec::new(),
            priority: None,
            augmentable: None,
            global: None,
            name: None,
        };

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "module" | "modules" => {
                    args.modules
                        .extend(parse_one_or_many(input, <LitStr as Parse>::parse)?);
                }
                "sink" | "sinks" => {
                    args.sinks
                        .extend(parse_one_or_many(input, <LitStr as Parse>::parse)?);
                }
                "message" | "messages" => {
                    args.messages
                        .extend(parse_one_or_many(input, <Type as Parse>::parse)?);
                }
                "keyword" | "keywords" => {
                    args.keywords
                        .extend(parse_one_or_many(input, <LitStr as Parse>::parse)?);
                }
                "priority" => {
                    let lit: LitInt = input.parse()?;
                    let value: u8 = lit.base10_parse()?;
                    if !(1..=10).contains(&value) {
                        return Err(syn::Error::new(
                            lit.span(),
                            "priority must be between 1 and 10",
                        ));
                    }
                    args.priority = Some(value);
                }
                "augmentable" => {
                    let lit: LitBool = input.parse()?;
                    args.augmentable = Some(lit.value);
                }
                "global" => {
                    let role: Ident = input.parse()?;
                    let normalized = role.to_string().to_ascii_lowercase();
                    if !matches!(normalized.as_str(), "pre" | "post" | "both") {
                        return Err(syn::Error::new(
                            role.span(),
                            "global must be one of `pre`, `post` or `both`",
                        ));
                    }
                    args.global = Some(role);
                }
                "name" => {
                    args.name = Some(input.parse()?);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

/// Implementation of the `#[message_handler]` attribute macro.
pub fn message_handler_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as HandlerArgs);
    let input = parse_macro_input!(item as ItemStruct);

    match expand(&args, &input) {
        Ok(declared) => TokenStream::from(quote! {
            #input
            #declared
        }),
        Err(err) => {
            let err = err.to_compile_error();
            TokenStream::from(quote! {
                #input
                #err
            })
        }
    }
}

fn expand(args: &HandlerArgs, input: &ItemStruct) -> syn::Result<TokenStream2> {
    let span = input.ident.span();
    if args.modules.is_empty() {
        return Err(syn::Error::new(
            span,
            "message handler must declare at least one `module`",
        ));
    }
    if args.sinks.is_empty() {
        return Err(syn::Error::new(
            span,
            "message handler must declare at least one `sink`",
        ));
    }
    if args.messages.is_empty() && args.global.is_none() {
        return Err(syn::Error::new(
            span,
            "message handler must declare `messages` or a `global` role",
        ));
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let modules = &args.modules;
    let sinks = &args.sinks;
    let messages = &args.messages;
    let keywords = &args.keywords;

    let priority = args.priority.map(|p| quote! { .priority(#p) });
    let augmentable = args.augmentable.map(|a| quote! { .augmentable(#a) });
    let named = args.name.as_ref().map(|n| quote! { .named(#n) });
    let global = args.global.as_ref().map(|role| {
        let flag = Ident::new(&role.to_string().to_ascii_uppercase(), Span::call_site());
        quote! { .global(::switchyard::GlobalRole::#flag) }
    });

    Ok(quote! {
        impl #impl_generics ::switchyard::Declared for #name #ty_generics #where_clause {
            fn blueprint() -> ::switchyard::Blueprint {
                ::switchyard::Blueprint::of::<Self>()
                    #(.module(#modules))*
                    #(.sink(#sinks))*
                    #(.message::<#messages>())*
                    #(.keyword(#keywords))*
                    #priority
                    #augmentable
                    #global
                    #named
            }
        }
    })
}
