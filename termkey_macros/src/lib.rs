mod syntax;
mod tree;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syntax::Input;

/// Generates a decision-tree recognizer for a fixed table of byte-string -> value rules.
///
/// ```ignore
/// byte_seq_parser! {
///     parse_ss3 -> Key,
///     [27, 79, 65] => Key::Up,
///     [27, 79, 66] => Key::Down,
/// }
/// ```
///
/// expands to two functions:
///
/// - `fn parse_ss3(buf: &[u8]) -> Option<(Key, usize)>` — `Some((value, len))` when `buf` starts
///   with one of the rules' byte strings, `None` otherwise (including when `buf` is merely a
///   prefix of one).
/// - `fn parse_ss3_is_prefix(buf: &[u8]) -> bool` — true when `buf` could still grow into a match
///   of some rule given more bytes. Only meaningful to call once the first function has returned
///   `None`; used by callers to distinguish "no match, ever" from "no match yet".
#[proc_macro]
pub fn byte_seq_parser(input: TokenStream) -> TokenStream {
    let Input {
        fn_name,
        fn_return_type,
        rules,
    } = syn::parse_macro_input!(input as syntax::Input);

    let prefix_fn_name = format_ident!("{}_is_prefix", fn_name);

    let (decision_body, prefix_body) = tree::build_decision_and_prefix_trees(rules);

    quote!(
        fn #fn_name(buf: &[u8]) -> Option<(#fn_return_type, usize)> {
            #decision_body
        }

        fn #prefix_fn_name(buf: &[u8]) -> bool {
            #prefix_body
        }
    )
    .into()
}
