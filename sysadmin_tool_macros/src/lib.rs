//! Procedural macros for automatic tool declaration generation

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, punctuated::Punctuated, token::Comma, Expr, ExprLit, FnArg, ItemFn, Lit,
    Meta, Type,
};

/// Attribute macro that turns a function into a registrable agent tool
///
/// # Example
///
/// ```ignore
/// #[tool(description = "Search the web for IT knowledge")]
/// async fn external_search(args: SearchArgs) -> Result<SearchReport, String> {
///     // Implementation
/// }
///
/// #[tool(description = "Query indexed system snapshots")]
/// async fn rag_query(ctx: Arc<ToolContext>, args: RagArgs) -> Result<String, String> {
///     // Implementation
/// }
/// ```
///
/// Each function gets a sibling module `<fn>_tool` containing:
/// - `NAME`: the tool name
/// - `declaration()`: the `ToolDeclaration` built from the argument type's JSON schema
/// - `execute`: re-export of the original function
/// - `registration(..)`: a complete `ToolRegistration`
///
/// When the function takes two parameters, the first one is shared state. It must be
/// `Clone` (usually an `Arc`) and `registration(state)` captures it for every call.
///
/// # Attributes
///
/// - `description`: (required) Description of what the tool does
/// - `name`: (optional) Override the tool name (defaults to function name)
#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_args = parse_macro_input!(attr with Punctuated::<Meta, Comma>::parse_terminated);
    let input_fn = parse_macro_input!(item as ItemFn);

    let mut description = None;
    let mut tool_name = None;

    for arg in attr_args {
        if let Meta::NameValue(nv) = arg {
            if let Expr::Lit(ExprLit {
                lit: Lit::Str(lit), ..
            }) = &nv.value
            {
                if nv.path.is_ident("description") {
                    description = Some(lit.value());
                } else if nv.path.is_ident("name") {
                    tool_name = Some(lit.value());
                }
            }
        }
    }

    let description = match description {
        Some(d) => d,
        None => {
            return syn::Error::new_spanned(
                &input_fn.sig,
                "tool attribute requires a 'description' parameter",
            )
            .to_compile_error()
            .into();
        }
    };

    let fn_name = &input_fn.sig.ident;
    let tool_name = tool_name.unwrap_or_else(|| fn_name.to_string());

    let typed_params: Vec<&Type> = input_fn
        .sig
        .inputs
        .iter()
        .filter_map(|input| match input {
            FnArg::Typed(pat_type) => Some(pat_type.ty.as_ref()),
            FnArg::Receiver(_) => None,
        })
        .collect();

    let (state_type, arg_type) = match typed_params.as_slice() {
        [args] => (None, *args),
        [state, args] => (Some(*state), *args),
        _ => {
            return syn::Error::new_spanned(
                &input_fn.sig,
                "tool function must take `args` or `(state, args)`",
            )
            .to_compile_error()
            .into();
        }
    };

    let module_name = syn::Ident::new(&format!("{}_tool", fn_name), fn_name.span());
    let base_type = strip_type_modifiers(arg_type);

    let mut pub_input_fn = input_fn.clone();
    pub_input_fn.vis = syn::parse_quote!(pub);

    let is_async = input_fn.sig.asyncness.is_some();

    let call = match state_type {
        Some(_) => quote! { execute(state.clone(), args) },
        None => quote! { execute(args) },
    };

    let invoke = if is_async {
        quote! {
            let future = #call;
            Box::pin(async move {
                future
                    .await
                    .and_then(|result| sysadmin_agent::llm::tools::registry::encode_result(&result))
            }) as BoxFuture<'static, _>
        }
    } else {
        quote! {
            let result = #call;
            Box::pin(async move {
                result.and_then(|result| sysadmin_agent::llm::tools::registry::encode_result(&result))
            }) as BoxFuture<'static, _>
        }
    };

    let wrapper_logic = quote! {
        let wrapper = move |args_json: serde_json::Value| {
            use futures::future::BoxFuture;

            let args = match serde_json::from_value::<#base_type>(args_json) {
                Ok(args) => args,
                Err(e) => {
                    let err_msg = format!("Failed to deserialize arguments: {}", e);
                    return Box::pin(async move { Err(err_msg) }) as BoxFuture<'static, _>;
                }
            };

            #invoke
        };
    };

    let registration_sig = match state_type {
        Some(state_ty) => quote! {
            pub fn registration(state: #state_ty) -> sysadmin_agent::llm::tools::ToolRegistration
        },
        None => quote! {
            pub fn registration() -> sysadmin_agent::llm::tools::ToolRegistration
        },
    };

    let output = quote! {
        #pub_input_fn

        #[allow(dead_code)]
        pub mod #module_name {
            use super::*;

            /// The name of this tool (use when registering)
            pub const NAME: &str = #tool_name;

            /// Get the ToolDeclaration for this tool
            pub fn declaration() -> sysadmin_agent::llm::ToolDeclaration {
                sysadmin_agent::llm::tools::create_tool_declaration::<#base_type>(
                    #tool_name,
                    #description
                )
            }

            /// The executable function for this tool (re-exported from parent)
            pub use super::#fn_name as execute;

            /// Get a complete ToolRegistration for one-step registration
            #registration_sig {
                #wrapper_logic

                sysadmin_agent::llm::tools::ToolRegistration {
                    name: NAME,
                    function: std::sync::Arc::new(wrapper),
                    declaration: declaration(),
                }
            }
        }
    };

    TokenStream::from(output)
}

/// Strip reference and other modifiers from a type to get the base type
fn strip_type_modifiers(ty: &Type) -> &Type {
    match ty {
        Type::Reference(type_ref) => strip_type_modifiers(&type_ref.elem),
        _ => ty,
    }
}
