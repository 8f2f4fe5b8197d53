//! Procedural macros for Switchyard.
//!
//! - `#[derive(Message)]` - implements `switchyard::Message`
//! - `#[message_handler(...)]` - declares where a handler type is deployed

use proc_macro::TokenStream;

mod handler;
mod message;

/// Derive macro for implementing the `Message` trait.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Message)]
/// struct ReflectAttributes {
///     object: u32,
/// }
/// ```
#[proc_macro_derive(Message)]
pub fn derive_message(input: TokenStream) -> TokenStream {
    message::derive_message_impl(input)
}

/// Attribute macro declaring the deployment blueprint of a handler type.
///
/// The annotated type must implement `Handler` and `Default`. The macro
/// implements `Declared`, so the type can be registered with
/// `RegistryBuilder::declare`.
///
/// # Arguments
///
/// - `module` / `modules` - module name, or a list of them (required)
/// - `sink` / `sinks` - target sink name, or a list of them (required)
/// - `message` / `messages` - handled message type, or a list of them
/// - `keyword` / `keywords` - deployment keyword, or a list of them
/// - `priority` - integer in `1..=10` (default 5)
/// - `augmentable` - `true` or `false` (default `true`)
/// - `global` - `pre`, `post` or `both`, instead of messages
/// - `name` - handler name (defaults to the type name)
///
/// # Example
///
/// ```rust,ignore
/// #[message_handler(
///     module = "object",
///     sinks = ["incoming"],
///     messages = [ReflectAttributes, RemoveObject],
///     keywords = ["lrc1516e"],
///     priority = 7,
/// )]
/// #[derive(Default)]
/// struct ReflectHandler;
/// ```
#[proc_macro_attribute]
pub fn message_handler(attr: TokenStream, item: TokenStream) -> TokenStream {
    handler::message_handler_impl(attr, item)
}
