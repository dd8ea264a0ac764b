//! The injection-site transformer.
//!
//! `#[failpoints]` walks the annotated function's body once, top-down,
//! and rewrites every statement of the shape
//!
//! ```ignore
//! failpoints::inject("name", || { ... });
//! failpoints::inject("name", |v| { ... });
//! ```
//!
//! into a guard that runs the body only while the failpoint is active:
//!
//! ```ignore
//! if ::failpoints::__evaluate_active("name").is_some() { ... }
//! ```
//!
//! A one-parameter body is guarded by an `if let` that binds the
//! activation value exactly once; every occurrence of the parameter —
//! bare expression references and identifiers inside macro invocation
//! token streams alike — is replaced by a clone of that binding:
//!
//! ```ignore
//! if let Some(__failpoints_value) = ::failpoints::__evaluate_active("name") {
//!     consume(__failpoints_value.clone());
//! }
//! ```
//!
//! Matching is lexical: the callee must be the literal two-segment path
//! `<alias>::inject` (alias defaults to `failpoints`, configurable via
//! `#[failpoints(alias = "fp")]`). No symbol resolution happens, so a
//! local item that shadows the alias will still match. Parameter
//! substitution is likewise textual and not scope-aware: a nested
//! closure that re-declares the parameter name has its references
//! substituted too. The walk never re-enters a generated guard, so an
//! `inject` written inside another `inject`'s body stays an inert
//! marker call.

use proc_macro::TokenStream;
use proc_macro2::{Group, Span, TokenStream as TokenStream2, TokenTree};
use quote::{quote, quote_spanned};
use syn::parse::{Parse, ParseStream};
use syn::visit_mut::{self, VisitMut};
use syn::{parse_quote, Block, Expr, ExprCall, Ident, ItemFn, LitStr, Macro, Pat, Stmt, Token};

const DEFAULT_ALIAS: &str = "failpoints";

/// Name of the binding a one-parameter guard introduces. The leading
/// underscore keeps a body that never reads its parameter warning-free.
const VALUE_BINDING: &str = "__failpoints_value";

struct TransformArgs {
    alias: String,
}

impl Parse for TransformArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut alias = DEFAULT_ALIAS.to_string();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "alias" => {
                    let lit: LitStr = input.parse()?;
                    alias = lit.value();
                }
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown parameter: {}", ident),
                    ))
                }
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(TransformArgs { alias })
    }
}

/// Rewrites `inject` marker calls in the annotated function into
/// activation guards.
#[proc_macro_attribute]
pub fn failpoints(args: TokenStream, input: TokenStream) -> TokenStream {
    match expand(args.into(), input.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(args: TokenStream2, input: TokenStream2) -> syn::Result<TokenStream2> {
    let args: TransformArgs = syn::parse2(args)?;
    let mut item: ItemFn = syn::parse2(input)?;

    let mut rewriter = InjectRewriter {
        alias: args.alias,
        errors: Vec::new(),
    };
    rewriter.visit_block_mut(&mut item.block);

    if let Some(err) = rewriter.errors.into_iter().reduce(|mut acc, e| {
        acc.combine(e);
        acc
    }) {
        return Err(err);
    }

    Ok(quote!(#item))
}

struct InjectRewriter {
    alias: String,
    errors: Vec<syn::Error>,
}

impl InjectRewriter {
    /// An injection site is an expression statement calling the bare
    /// two-segment path `<alias>::inject`. Purely textual: no leading
    /// `::`, no generic arguments, no qualified self.
    fn match_site(&self, stmt: &Stmt) -> Option<ExprCall> {
        let Stmt::Expr(Expr::Call(call), _) = stmt else {
            return None;
        };
        let Expr::Path(callee) = call.func.as_ref() else {
            return None;
        };
        if callee.qself.is_some() || callee.path.leading_colon.is_some() {
            return None;
        }
        let segments = &callee.path.segments;
        if segments.len() != 2
            || !segments.iter().all(|s| s.arguments.is_none())
            || segments[0].ident != self.alias.as_str()
            || segments[1].ident != "inject"
        {
            return None;
        }
        Some(call.clone())
    }

    fn rewrite_site(&mut self, call: &ExprCall) -> Option<Stmt> {
        if call.args.len() != 2 {
            self.errors.push(syn::Error::new_spanned(
                call,
                "inject expects exactly two arguments: a failpoint name and a body closure",
            ));
            return None;
        }

        // the name expression passes through verbatim
        let name = &call.args[0];

        let Expr::Closure(body) = &call.args[1] else {
            self.errors.push(syn::Error::new_spanned(
                &call.args[1],
                "inject body must be a closure literal",
            ));
            return None;
        };

        match body.inputs.len() {
            0 => {
                let block = body_block(&body.body);
                Some(parse_quote! {
                    if ::failpoints::__evaluate_active(#name).is_some() #block
                })
            }
            1 => {
                let Some(param) = param_name(&body.inputs[0]) else {
                    self.errors.push(syn::Error::new_spanned(
                        &body.inputs[0],
                        "inject body parameter must be a plain identifier",
                    ));
                    return None;
                };
                let binding = Ident::new(VALUE_BINDING, Span::call_site());
                let mut block = body_block(&body.body);
                let mut subst = ParamSubst {
                    param,
                    binding: binding.clone(),
                };
                subst.visit_block_mut(&mut block);
                // the value is evaluated once, when the guard opens
                Some(parse_quote! {
                    if let ::core::option::Option::Some(#binding) =
                        ::failpoints::__evaluate_active(#name) #block
                })
            }
            _ => {
                self.errors.push(syn::Error::new_spanned(
                    &body.inputs,
                    "inject body closure takes at most one parameter",
                ));
                None
            }
        }
    }
}

impl VisitMut for InjectRewriter {
    fn visit_block_mut(&mut self, block: &mut Block) {
        for stmt in &mut block.stmts {
            if let Some(call) = self.match_site(stmt) {
                // a generated guard is never re-entered, so markers
                // nested inside the body stay unexpanded
                if let Some(guard) = self.rewrite_site(&call) {
                    *stmt = guard;
                }
            } else {
                visit_mut::visit_stmt_mut(self, stmt);
            }
        }
    }
}

/// Replaces every occurrence of the body parameter with a clone of the
/// guard's value binding. Textual, not scope-aware. `syn` leaves macro
/// invocation contents as raw tokens, so those are rewritten at the
/// token level, recursing through nested groups.
struct ParamSubst {
    param: String,
    binding: Ident,
}

impl ParamSubst {
    fn substitute_tokens(&self, tokens: TokenStream2) -> TokenStream2 {
        tokens
            .into_iter()
            .flat_map(|tt| match tt {
                TokenTree::Ident(ident) if ident == self.param.as_str() => {
                    let binding = &self.binding;
                    let replacement = quote_spanned!(ident.span()=> #binding.clone());
                    replacement.into_iter().collect::<Vec<_>>()
                }
                TokenTree::Group(group) => {
                    let mut inner =
                        Group::new(group.delimiter(), self.substitute_tokens(group.stream()));
                    inner.set_span(group.span());
                    vec![TokenTree::Group(inner)]
                }
                other => vec![other],
            })
            .collect()
    }
}

impl VisitMut for ParamSubst {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if let Expr::Path(path) = expr {
            if path.qself.is_none()
                && path.path.leading_colon.is_none()
                && path.path.segments.len() == 1
                && path.path.segments[0].arguments.is_none()
                && path.path.segments[0].ident == self.param.as_str()
            {
                let binding = &self.binding;
                *expr = parse_quote!(#binding.clone());
                return;
            }
        }
        visit_mut::visit_expr_mut(self, expr);
    }

    fn visit_macro_mut(&mut self, mac: &mut Macro) {
        mac.tokens = self.substitute_tokens(mac.tokens.clone());
    }
}

fn body_block(body: &Expr) -> Block {
    match body {
        Expr::Block(b) => b.block.clone(),
        expr => parse_quote!({ #expr; }),
    }
}

fn param_name(pat: &Pat) -> Option<String> {
    match pat {
        Pat::Ident(p) => Some(p.ident.to_string()),
        Pat::Type(t) => param_name(&t.pat),
        // `_` can never be referenced, so substitution is a no-op
        Pat::Wild(_) => Some(String::new()),
        _ => None,
    }
}
