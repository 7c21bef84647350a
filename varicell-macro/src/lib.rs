use proc_macro::TokenStream;
use proc_macro2::Literal;
use proc_macro_error::{abort, proc_macro_error};
use quote::{quote, ToTokens};
use std::collections::HashMap;
use syn::{parse_macro_input, DeriveInput, Fields, FieldsUnnamed, Ident, Type, Variant};

const NOTE: &str = "can only derive Alternatives on enums whose variants each wrap exactly one value";

#[proc_macro_derive(Alternatives)]
#[proc_macro_error]
pub fn alternatives(input: TokenStream) -> TokenStream {
    let DeriveInput {
        ident,
        generics,
        data,
        ..
    } = parse_macro_input!(input as DeriveInput);

    // Verify we have an enum
    let data = match data {
        syn::Data::Enum(e) => e,
        syn::Data::Struct(data) => {
            abort!(data.struct_token, "struct `{}` is not an enum", ident; note=NOTE)
        }
        syn::Data::Union(data) => {
            abort!(data.union_token, "union `{}` is not an enum", ident; note=NOTE)
        }
    };

    if data.variants.is_empty() {
        abort!(ident, "enum `{}` has no variants", ident; note=NOTE)
    }

    let arms: Vec<Arm> = data.variants.iter().map(Arm::new).collect();
    reject_duplicates(&arms);

    // Build the catalog from the back, so the first variant ends up at the head
    let catalog = arms.iter().rev().fold(
        quote! { ::varicell::Nil },
        |tail, Arm { ty, .. }| quote! { ::varicell::Cons<#ty, #tail> },
    );

    let cleave_arms = arms.iter().enumerate().map(|(position, Arm { ident, ty })| {
        let at = position_marker(position);
        quote! {
            Self::#ident(value) => ::varicell::Variant::new::<#ty, #at>(value),
        }
    });

    let reknit_arms = arms.iter().enumerate().map(|(position, Arm { ident, ty })| {
        let at = position_marker(position);
        let index = Literal::usize_unsuffixed(position);
        quote! {
            ::core::option::Option::Some(#index) => {
                variant.into_inner::<#ty, #at>().map(Self::#ident)
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    quote! {
        impl #impl_generics ::varicell::Alternatives for #ident #ty_generics #where_clause {
            type Catalog = #catalog;

            fn cleave(self) -> ::varicell::Variant<Self::Catalog> {
                match self {
                    #(#cleave_arms)*
                }
            }

            fn reknit(
                variant: ::varicell::Variant<Self::Catalog>,
            ) -> ::core::result::Result<Self, ::varicell::AccessError> {
                match variant.index() {
                    #(#reknit_arms)*
                    _ => ::core::result::Result::Err(::varicell::AccessError::Empty),
                }
            }
        }

        impl #impl_generics ::core::convert::From<#ident #ty_generics>
            for ::varicell::Variant<#catalog> #where_clause
        {
            fn from(value: #ident #ty_generics) -> Self {
                ::varicell::Alternatives::cleave(value)
            }
        }
    }
    .into()
}

/// One enum variant and the single type it wraps
struct Arm {
    ident: Ident,
    ty: Type,
}

impl Arm {
    fn new(variant: &Variant) -> Self {
        let ident = variant.ident.clone();
        match &variant.fields {
            Fields::Unnamed(FieldsUnnamed { unnamed, .. }) if unnamed.len() == 1 => Arm {
                ident,
                ty: unnamed[0].ty.clone(),
            },
            Fields::Unnamed(FieldsUnnamed { unnamed, .. }) => {
                abort!(unnamed, "variant `{}` wraps {} values", ident, unnamed.len(); note=NOTE)
            }
            Fields::Named(named) => {
                abort!(named, "variant `{}` has named fields", ident; note=NOTE)
            }
            Fields::Unit => abort!(ident, "variant `{}` wraps no value", ident; note=NOTE),
        }
    }
}

/// Two variants wrapping the same type would make that type's position ambiguous
fn reject_duplicates(arms: &[Arm]) {
    let mut seen = HashMap::with_capacity(arms.len());
    for Arm { ident, ty } in arms {
        let key = ty.to_token_stream().to_string();
        if let Some(first) = seen.insert(key.clone(), ident) {
            abort!(
                ty,
                "variants `{}` and `{}` both wrap `{}`", first, ident, key;
                note = "every alternative type may appear only once"
            )
        }
    }
}

/// `Here` wrapped in `There` once per step down the catalog
fn position_marker(position: usize) -> proc_macro2::TokenStream {
    (0..position).fold(quote! { ::varicell::Here }, |inner, _| {
        quote! { ::varicell::There<#inner> }
    })
}
