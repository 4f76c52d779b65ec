//! Derive macro implementation for automatic `Reflect` derivation
//!
//! Structs get either a memberwise constructor (the default) or a
//! `Default`-based constructor with auto-populated fields
//! (`#[specimen(default)]`). Fieldless enums register their variants in
//! declaration order.

use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::{
    Attribute, Data, DeriveInput, Error, Expr, ExprLit, Fields, GenericParam, Lit, LitStr, Meta,
    MetaList, MetaNameValue, Result, Type, parse_macro_input, parse_quote,
};

/// Largest number of constructor arguments the engine can resolve
const MAX_CONSTRUCTOR_ARITY: usize = 8;

/// Main entry point for the Specimen derive macro
pub fn derive_specimen_impl(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_reflect_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// How the derived type is converted into the types it can stand in for
#[derive(Debug)]
enum ConversionKind {
    Interface,
    BaseType,
}

#[derive(Debug, Default)]
struct TypeOptions {
    use_default: bool,
    conversions: Vec<(ConversionKind, Type)>,
}

/// A struct field as seen by the generated model
struct FieldSpec {
    /// Member name used by composers and as the resolution seed
    name: String,
    /// `a` or `0`
    access: TokenStream,
    ty: Type,
    skip: bool,
}

/// Generate the Reflect implementation for the given input
fn generate_reflect_impl(input: &DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(Error::new_spanned(
            lifetime,
            "Specimen derive requires 'static types; lifetime parameters are not supported",
        ));
    }

    let options = parse_type_options(&input.attrs)?;

    let mut bounded_generics = input.generics.clone();
    add_trait_bounds(&mut bounded_generics);
    let (impl_generics, ty_generics, where_clause) = bounded_generics.split_for_impl();

    let model_body = match &input.data {
        Data::Struct(data_struct) => {
            let fields = collect_fields(&data_struct.fields)?;
            if options.use_default {
                generate_default_body(&fields)
            } else {
                generate_memberwise_body(name, &data_struct.fields, &fields)?
            }
        }
        Data::Enum(data_enum) => {
            if options.use_default {
                return Err(Error::new_spanned(
                    name,
                    "#[specimen(default)] is only supported on structs",
                ));
            }
            generate_enum_body(name, data_enum)?
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Specimen derive is not supported for unions",
            ));
        }
    };

    let conversions = options
        .conversions
        .iter()
        .map(|(kind, target)| generate_conversion(kind, target));

    Ok(quote! {
        impl #impl_generics ::autofixture::Reflect for #name #ty_generics #where_clause {
            fn reflect(model: &mut ::autofixture::ModelBuilder<Self>) {
                #model_body
                #(#conversions)*
            }
        }
    })
}

/// Add the `Reflect` bound to every type parameter
fn add_trait_bounds(generics: &mut syn::Generics) {
    for param in &mut generics.params {
        if let GenericParam::Type(ref mut type_param) = *param {
            type_param.bounds.push(parse_quote!(::autofixture::Reflect));
        }
    }
}

/// Parse the `#[specimen(...)]` attributes on the type
fn parse_type_options(attrs: &[Attribute]) -> Result<TypeOptions> {
    let mut options = TypeOptions::default();

    for meta in specimen_metas(attrs)? {
        match meta {
            Meta::Path(path) if path.is_ident("default") => options.use_default = true,
            Meta::NameValue(MetaNameValue { path, value, .. }) if path.is_ident("implements") => {
                let target = parse_type_literal(&value)?;
                options.conversions.push((ConversionKind::Interface, target));
            }
            Meta::NameValue(MetaNameValue { path, value, .. }) if path.is_ident("base_type") => {
                let target = parse_type_literal(&value)?;
                options.conversions.push((ConversionKind::BaseType, target));
            }
            other => {
                return Err(Error::new_spanned(
                    other,
                    "Unsupported specimen attribute, expected `default`, `implements = \"...\"` or `base_type = \"...\"`",
                ));
            }
        }
    }
    Ok(options)
}

/// Whether a field carries `#[specimen(skip)]`
fn is_skipped(attrs: &[Attribute]) -> Result<bool> {
    let mut skip = false;
    for meta in specimen_metas(attrs)? {
        match meta {
            Meta::Path(path) if path.is_ident("skip") => skip = true,
            other => {
                return Err(Error::new_spanned(
                    other,
                    "Unsupported field attribute, expected `skip`",
                ));
            }
        }
    }
    Ok(skip)
}

/// Every item inside the `#[specimen(...)]` attributes
fn specimen_metas(attrs: &[Attribute]) -> Result<Vec<Meta>> {
    let mut metas = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("specimen") {
            continue;
        }
        match &attr.meta {
            Meta::List(MetaList { tokens, .. }) => {
                let parser = syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated;
                metas.extend(parser.parse2(tokens.clone())?);
            }
            _ => {
                return Err(Error::new_spanned(
                    attr,
                    "Specimen attribute must be a list",
                ));
            }
        }
    }
    Ok(metas)
}

/// Parse a string literal holding a type, e.g. `"Box<dyn Clock>"`
fn parse_type_literal(value: &Expr) -> Result<Type> {
    if let Expr::Lit(ExprLit {
        lit: Lit::Str(lit_str),
        ..
    }) = value
    {
        return parse_lit_type(lit_str);
    }
    Err(Error::new_spanned(
        value,
        "Expected a string literal naming a type",
    ))
}

fn parse_lit_type(lit_str: &LitStr) -> Result<Type> {
    lit_str.parse::<Type>()
}

fn collect_fields(fields: &Fields) -> Result<Vec<FieldSpec>> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let (name, access) = match &field.ident {
                Some(ident) => (ident.to_string(), quote! { #ident }),
                None => {
                    let member = syn::Index::from(index);
                    (index.to_string(), quote! { #member })
                }
            };
            Ok(FieldSpec {
                name,
                access,
                ty: field.ty.clone(),
                skip: is_skipped(&field.attrs)?,
            })
        })
        .collect()
}

/// `Default` constructor plus one auto-populated field member per field
fn generate_default_body(fields: &[FieldSpec]) -> TokenStream {
    let members = fields.iter().filter(|field| !field.skip).map(|field| {
        let FieldSpec {
            name, access, ty, ..
        } = field;
        quote! {
            model.field(#name, |target: &mut Self, value: #ty| target.#access = value);
        }
    });

    quote! {
        model.constructor(&[], |(): ()| <Self as ::core::default::Default>::default());
        #(#members)*
    }
}

/// Memberwise constructor plus one constructor-bound member per field
fn generate_memberwise_body(
    name: &syn::Ident,
    shape: &Fields,
    fields: &[FieldSpec],
) -> Result<TokenStream> {
    let resolved: Vec<&FieldSpec> = fields.iter().filter(|field| !field.skip).collect();
    if resolved.len() > MAX_CONSTRUCTOR_ARITY {
        return Err(Error::new_spanned(
            name,
            format!(
                "Specimen derive supports at most {} constructor fields; use #[specimen(default)] or skip fields",
                MAX_CONSTRUCTOR_ARITY
            ),
        ));
    }

    let names = resolved.iter().map(|field| &field.name);
    let bindings: Vec<_> = resolved
        .iter()
        .enumerate()
        .map(|(index, _)| quote::format_ident!("arg{}", index))
        .collect();
    let types = resolved.iter().map(|field| &field.ty);

    let mut next_binding = bindings.iter();
    let values: Vec<TokenStream> = fields
        .iter()
        .map(|field| {
            if field.skip {
                return quote! { ::core::default::Default::default() };
            }
            match next_binding.next() {
                Some(binding) => quote! { #binding },
                None => quote! { ::core::default::Default::default() },
            }
        })
        .collect();

    let construct = match shape {
        Fields::Named(_) => {
            let accesses = fields.iter().map(|field| &field.access);
            quote! { Self { #(#accesses: #values,)* } }
        }
        Fields::Unnamed(_) => quote! { Self(#(#values,)*) },
        Fields::Unit => quote! { Self },
    };

    let members = resolved.iter().map(|field| {
        let FieldSpec {
            name, access, ty, ..
        } = field;
        quote! {
            model.bound_field(#name, |target: &mut Self, value: #ty| target.#access = value);
        }
    });

    Ok(quote! {
        model.constructor(
            &[#(#names),*],
            |(#(#bindings,)*): (#(#types,)*)| #construct,
        );
        #(#members)*
    })
}

/// One registered variant per fieldless enum variant
fn generate_enum_body(name: &syn::Ident, data_enum: &syn::DataEnum) -> Result<TokenStream> {
    if data_enum.variants.is_empty() {
        return Err(Error::new_spanned(
            name,
            "Cannot derive Specimen for empty enum",
        ));
    }

    let variants = data_enum
        .variants
        .iter()
        .map(|variant| {
            if !matches!(variant.fields, Fields::Unit) {
                return Err(Error::new_spanned(
                    variant,
                    "Specimen derive only supports fieldless enums; implement Reflect by hand",
                ));
            }
            let variant_name = &variant.ident;
            Ok(quote! {
                model.variant(|| Self::#variant_name);
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! { #(#variants)* })
}

/// Expression converting `value: Self` into `target`
fn conversion_expr(target: &Type) -> TokenStream {
    let pointer = match target {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    };
    match pointer.as_deref() {
        Some("Box") => quote! { ::std::boxed::Box::new(value) },
        Some("Rc") => quote! { ::std::rc::Rc::new(value) },
        Some("Arc") => quote! { ::std::sync::Arc::new(value) },
        _ => quote! { ::core::convert::Into::into(value) },
    }
}

fn generate_conversion(kind: &ConversionKind, target: &Type) -> TokenStream {
    let convert = conversion_expr(target);
    let register = match kind {
        ConversionKind::Interface => quote! { implements },
        ConversionKind::BaseType => quote! { base_type },
    };
    quote! {
        model.#register(|value: Self| -> #target { #convert });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_add_trait_bounds() {
        let mut generics: syn::Generics = parse_quote! { <T, U> };
        add_trait_bounds(&mut generics);

        if let GenericParam::Type(type_param) = &generics.params[0] {
            assert_eq!(type_param.bounds.len(), 1);
        }
    }

    #[test]
    fn test_parse_type_options() {
        let input: DeriveInput = parse_quote! {
            #[derive(Specimen)]
            #[specimen(default, implements = "Box<dyn Clock>")]
            #[specimen(base_type = "Shape")]
            struct Square {
                side: u32,
            }
        };
        let options = parse_type_options(&input.attrs).unwrap();
        assert!(options.use_default);
        assert_eq!(options.conversions.len(), 2);
        assert!(matches!(options.conversions[0].0, ConversionKind::Interface));
        assert!(matches!(options.conversions[1].0, ConversionKind::BaseType));
    }

    #[test]
    fn test_unknown_attribute_is_rejected() {
        let input: DeriveInput = parse_quote! {
            #[specimen(frozen)]
            struct Square;
        };
        assert!(parse_type_options(&input.attrs).is_err());
    }

    #[test]
    fn test_collect_fields_names_tuple_members_by_index() {
        let input: DeriveInput = parse_quote! {
            struct Pair(u8, #[specimen(skip)] String);
        };
        let Data::Struct(data) = &input.data else {
            panic!("expected a struct");
        };
        let fields = collect_fields(&data.fields).unwrap();
        assert_eq!(fields[0].name, "0");
        assert_eq!(fields[1].name, "1");
        assert!(!fields[0].skip);
        assert!(fields[1].skip);
    }

    #[test]
    fn test_conversion_expr_picks_pointer() {
        let boxed: Type = parse_quote! { Box<dyn Clock> };
        let shared: Type = parse_quote! { std::rc::Rc<dyn Clock> };
        let plain: Type = parse_quote! { Shape };

        assert!(conversion_expr(&boxed).to_string().contains("Box :: new"));
        assert!(conversion_expr(&shared).to_string().contains("Rc :: new"));
        assert!(conversion_expr(&plain).to_string().contains("Into :: into"));
    }

    #[test]
    fn test_data_enum_is_rejected() {
        let input: DeriveInput = parse_quote! {
            enum Event {
                Started,
                Stopped(u32),
            }
        };
        let error = generate_reflect_impl(&input).unwrap_err();
        assert!(error.to_string().contains("fieldless enums"));
    }

    #[test]
    fn test_too_many_constructor_fields() {
        let input: DeriveInput = parse_quote! {
            struct Wide(u8, u8, u8, u8, u8, u8, u8, u8, u8);
        };
        assert!(generate_reflect_impl(&input).is_err());

        let input: DeriveInput = parse_quote! {
            struct Wide(u8, u8, u8, u8, u8, u8, u8, u8, #[specimen(skip)] u8);
        };
        assert!(generate_reflect_impl(&input).is_ok());
    }

    #[test]
    fn test_memberwise_body_for_unit_struct() {
        let input: DeriveInput = parse_quote! {
            struct Marker;
        };
        let tokens = generate_reflect_impl(&input).unwrap().to_string();
        assert!(tokens.contains("model . constructor"));
        assert!(!tokens.contains("bound_field"));
    }
}
