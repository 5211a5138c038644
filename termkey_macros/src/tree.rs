use crate::syntax::*;

use proc_macro2::TokenStream;
use quote::quote;
use quote::TokenStreamExt;
use std::collections::HashMap;

struct Node {
    idx: usize,
    value: Option<syn::Expr>,
    next: HashMap<u8, Node>,
}

impl Node {
    fn new(idx: usize) -> Self {
        Node {
            idx,
            value: None,
            next: HashMap::new(),
        }
    }

    fn to_token_stream(&self) -> TokenStream {
        let Node { idx, value, next } = self;

        let node_value = match value {
            None => quote!(None),
            Some(expr) => quote!(Some((#expr, #idx))),
        };

        // Optimize the case when the node is a leaf. Not necessary for correctness, but makes the
        // generated code smaller.
        if next.is_empty() {
            return quote!(#node_value);
        }

        let mut match_arms = vec![];
        for (byte, next) in next.iter() {
            let next_tokens = next.to_token_stream();
            match_arms.push(quote!(
                #byte => {
                    #next_tokens
                }
            ));
        }
        match_arms.push(quote!(_ => #node_value));

        quote!(
            match buf.get(#idx) {
                None => #node_value,
                Some(byte) => {
                    match byte {
                        #(#match_arms,)*
                    }
                }
            }
        )
    }

    // Companion to `to_token_stream`: answers "could more bytes still turn `buf` into a complete
    // match?" for a `buf` that has already failed the exact-match tree. Walks the same trie;
    // running out of buffer while the node still has children means `buf` is a genuine (possibly
    // completable) prefix. An unrecognized next byte, or running out of trie at a leaf while bytes
    // remain, means it never will be.
    fn to_prefix_token_stream(&self) -> TokenStream {
        let Node { idx, next, .. } = self;

        if next.is_empty() {
            return quote!(false);
        }

        let mut match_arms = vec![];
        for (byte, next) in next.iter() {
            let next_tokens = next.to_prefix_token_stream();
            match_arms.push(quote!(
                #byte => {
                    #next_tokens
                }
            ));
        }

        quote!(
            match buf.get(#idx) {
                None => true,
                Some(byte) => {
                    match byte {
                        #(#match_arms,)*
                        _ => false,
                    }
                }
            }
        )
    }

    fn add_rule(&mut self, rule: Rule) {
        let Rule { pattern, value } = rule;
        let pattern: Vec<u8> = pattern.0;
        let value: syn::Expr = value.0;

        let byte = pattern[0];
        let rest = &pattern[1..];

        match self.next.get_mut(&byte) {
            None => {
                let mut node = Node::new(1);
                node.add_rule_(rest, value);
                self.next.insert(byte, node);
            }
            Some(node) => {
                node.add_rule_(rest, value);
            }
        }
    }

    fn add_rule_(&mut self, bytes: &[u8], value: syn::Expr) {
        if bytes.is_empty() {
            assert!(self.value.is_none()); // TODO: improve the err msg
            self.value = Some(value);
        } else {
            let byte = bytes[0];
            let rest = &bytes[1..];

            match self.next.get_mut(&byte) {
                None => {
                    let mut node = Node::new(self.idx + 1);
                    node.add_rule_(rest, value);
                    self.next.insert(byte, node);
                }
                Some(node) => {
                    node.add_rule_(rest, value);
                }
            }
        }
    }
}

fn build_tree(rules: Vec<Rule>) -> Node {
    let mut tree = Node::new(0);
    for rule in rules {
        tree.add_rule(rule);
    }
    tree
}

/// Builds the trie once from `rules` and renders both the exact-match decision tree (same shape
/// as the original macro) and its prefix-recognizer companion (see `to_prefix_token_stream`).
pub(crate) fn build_decision_and_prefix_trees(rules: Vec<Rule>) -> (TokenStream, TokenStream) {
    let tree = build_tree(rules);

    let mut decision = TokenStream::new();
    decision.append_all(tree.to_token_stream());

    let mut prefix = TokenStream::new();
    prefix.append_all(tree.to_prefix_token_stream());

    (decision, prefix)
}
