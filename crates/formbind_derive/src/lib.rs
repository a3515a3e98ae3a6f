use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, parse_macro_input};

#[proc_macro_derive(FormRecord)]
pub fn derive_form_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormRecord derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let record_ident = input.ident;
    let fields_struct_ident = format_ident!("{record_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormRecord derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormRecord derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let formbind = formbind_path();
    let mut fields_methods = Vec::new();
    let mut keys = Vec::new();
    let mut inserts = Vec::new();
    let mut reads = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let field_ty = field.ty;
        let field_name = field_ident.to_string();

        fields_methods.push(quote! {
            pub const fn #field_ident(&self) -> &'static str {
                #field_name
            }
        });
        keys.push(quote! {
            #formbind::form::FieldKey::new(#field_name)
        });
        inserts.push(quote! {
            values.insert(
                #field_name,
                #formbind::form::ToFieldValue::to_field_value(&self.#field_ident),
            );
        });
        reads.push(quote! {
            #field_ident: #formbind::form::read_field::<#field_ty>(values, #field_name)?
        });
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#fields_methods)*
        }

        impl #formbind::form::FormRecord for #record_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn field_keys() -> ::std::vec::Vec<#formbind::form::FieldKey> {
                ::std::vec![#(#keys),*]
            }

            fn to_values(&self) -> #formbind::form::FormValues {
                let mut values = #formbind::form::FormValues::new();
                #(#inserts)*
                values
            }

            fn from_values(
                values: &#formbind::form::FormValues,
            ) -> #formbind::form::FormResult<Self> {
                ::std::result::Result::Ok(Self {
                    #(#reads),*
                })
            }
        }
    }
    .into()
}

fn formbind_path() -> TokenStream2 {
    match crate_name("formbind") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) | Err(_) => quote!(::formbind),
    }
}
