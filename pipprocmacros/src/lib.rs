//! Procedural macros used in the definition and implementation of getters and setters for PipSettings

use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::ParseStream;
use syn::parse::{Parse, Result};
use syn::{Expr, Ident, Token};

type ValueName = Ident;
type ValueType = Ident;
type DefaultValue = Expr;

/// Signature contains the results of parsing a pps_gets_and_sets definition, i.e., the
/// name of a value stored in a PipSettings map and the corresponding type.
struct Signature {
    value_name: ValueName,
    value_type: ValueType,
}

impl Parse for Signature {
    fn parse(stream: ParseStream<'_>) -> Result<Self> {
        let value_name = stream.parse()?;
        let _comma: Token!(,) = stream.parse()?;
        let value_type = stream.parse()?;
        Ok(Signature {
            value_name,
            value_type,
        })
    }
}

/// SignatureWithDefault contains the results of parsing a pps_gets_and_sets_with_default definition,
/// i.e., the name of a value stored in a PipSettings map, the corresponding type and the default value.
/// For example:
///     ```text
///     pps_gets_and_sets_with_default!(PS_REQUIRE_PROXY, bool, false);
///     ```
struct SignatureWithDefault {
    value_name: ValueName,
    value_type: ValueType,
    default_value: DefaultValue,
}

impl Parse for SignatureWithDefault {
    fn parse(stream: ParseStream<'_>) -> Result<Self> {
        let value_name = stream.parse()?;
        let _comma: Token!(,) = stream.parse()?;
        let value_type = stream.parse()?;
        let _comma2: Token!(,) = stream.parse()?;
        let default_value = stream.parse()?;
        Ok(SignatureWithDefault {
            value_name,
            value_type,
            default_value,
        })
    }
}

/// is_string_numeric is used to determine if a string value contains only numeric characters.
/// It is used to process a slice that omits the first character, i.e., in order to identify
/// types like u8, u32, etc.
fn is_string_numeric(str: &str) -> bool {
    str.chars().all(|c| c.is_numeric())
}

/// Names shared by both macros: getter, setter, PipSettingTypes variant and doc comments
struct Names {
    getter: Ident,
    setter: Ident,
    variant: Ident,
    getter_comment: String,
    setter_comment: String,
}

fn names(flag: &Ident, value_type: &Ident) -> Names {
    // PS_REQUIRE_PROXY yields get_require_proxy and set_require_proxy
    let flag_str = format!("{}", flag)[3..].to_lowercase();
    let getter_str = format!("get_{}", flag_str);
    let setter_str = format!("set_{}", flag_str);
    let type_str = format!("{}", value_type);
    let variant_str = if type_str == "bool" {
        "Bool".to_string()
    } else if type_str.len() > 1 && is_string_numeric(&type_str[1..]) {
        type_str.to_uppercase()
    } else {
        type_str
    };
    Names {
        getter: Ident::new(&getter_str, flag.span()),
        setter: Ident::new(&setter_str, flag.span()),
        variant: Ident::new(&variant_str, value_type.span()),
        getter_comment: format!(
            "`{}` is used to retrieve `{}` items from a [`PipSettings`] instance",
            getter_str, flag
        ),
        setter_comment: format!(
            "`{}` is used to set `{}` items in a [`PipSettings`] instance",
            setter_str, flag
        ),
    }
}

fn setter_tokens(flag: &Ident, value_type: &Ident, n: &Names) -> TokenStream {
    let setter = &n.setter;
    let variant = &n.variant;
    let setter_comment = &n.setter_comment;
    quote! {
        #[doc = #setter_comment]
        pub fn #setter(&mut self, v: #value_type) {
            self.0.insert(#flag.to_string(), PipSettingTypes::#variant(v));
        }
    }
}

/// `pps_gets_and_sets` generates `get_` and `set_` methods on `PipSettings` for an optional value.
/// The getter returns None when the value is absent or has an unexpected type.
#[proc_macro]
pub fn pps_gets_and_sets(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as Signature);
    let flag = signature.value_name;
    let value_type = signature.value_type;
    let n = names(&flag, &value_type);
    let getter = &n.getter;
    let variant = &n.variant;
    let getter_comment = &n.getter_comment;
    let setter = setter_tokens(&flag, &value_type, &n);

    let tokens = quote! {
        impl PipSettings {
            #[doc = #getter_comment]
            pub fn #getter(&self) -> Option<#value_type> {
                match self.0.get(#flag) {
                    Some(PipSettingTypes::#variant(v)) => Some(v.clone()),
                    _ => None,
                }
            }
            #setter
        }
    };
    tokens.into()
}

/// `pps_gets_and_sets_with_default` generates `get_` and `set_` methods on `PipSettings` for a
/// value with a default. The getter returns the default when the value is absent or has an
/// unexpected type.
#[proc_macro]
pub fn pps_gets_and_sets_with_default(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as SignatureWithDefault);
    let flag = signature.value_name;
    let value_type = signature.value_type;
    let default_value = signature.default_value;
    let n = names(&flag, &value_type);
    let getter = &n.getter;
    let variant = &n.variant;
    let getter_comment = &n.getter_comment;
    let setter = setter_tokens(&flag, &value_type, &n);

    let tokens = quote! {
        impl PipSettings {
            #[doc = #getter_comment]
            pub fn #getter(&self) -> #value_type {
                match self.0.get(#flag) {
                    Some(PipSettingTypes::#variant(v)) => v.clone(),
                    _ => #default_value,
                }
            }
            #setter
        }
    };
    tokens.into()
}
