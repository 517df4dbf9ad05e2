use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input, spanned::Spanned};

/// Ignore marker understood by the annotation parser.
const IGNORE: &str = "-";

/* ────────────────────────── the derive macro ───────────────────── */
#[proc_macro_derive(Record, attributes(xlsx))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    /* -------- 1 · shape checks -------- */
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "#[derive(Record)] does not support generic types",
        ));
    }
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new(
                    input.span(),
                    "#[derive(Record)] requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "#[derive(Record)] can only be used on structs",
            ));
        }
    };

    /* -------- 2 · per-field annotations -------- */
    let mut descriptors = Vec::with_capacity(fields.len());
    let mut getters = Vec::with_capacity(fields.len());
    let mut setters = Vec::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        let ident = field.ident.as_ref().expect("named field");
        let ty = &field.ty;
        let name = ident.to_string();
        let text = field_annotation(field)?;
        let annotation = match &text {
            Some(text) => quote! { ::core::option::Option::Some(#text) },
            None => quote! { ::core::option::Option::None },
        };
        if is_ignored(text.as_deref()) {
            // Never bound to a cell, so the field type is not constrained.
            let target = quote!(#ty).to_string();
            descriptors.push(quote! {
                ::sheetbind::FieldDescriptor::new(
                    #name,
                    ::sheetbind::FieldKind::Unsupported,
                    #annotation,
                )
            });
            getters.push(quote! {
                #index => ::sheetbind::CellValue::Empty
            });
            setters.push(quote! {
                #index => ::core::result::Result::Err(::sheetbind::FieldValueError {
                    target: #target,
                    value,
                }),
            });
            continue;
        }
        descriptors.push(quote! {
            ::sheetbind::FieldDescriptor::new(
                #name,
                <#ty as ::sheetbind::FieldType>::KIND,
                #annotation,
            )
        });
        getters.push(quote! {
            #index => ::sheetbind::FieldType::to_cell(&self.#ident)
        });
        setters.push(quote! {
            #index => {
                self.#ident = <#ty as ::sheetbind::FieldType>::from_field(value)?;
                ::core::result::Result::Ok(())
            }
        });
    }

    /* -------- 3 · assemble expanded code -------- */
    let ident = &input.ident;
    let type_name = ident.to_string();
    Ok(quote! {
        impl ::sheetbind::Record for #ident {
            fn descriptor() -> &'static ::sheetbind::Schema
            where
                Self: Sized,
            {
                static SCHEMA: ::sheetbind::Schema =
                    ::sheetbind::Schema::new(#type_name, &[ #(#descriptors),* ]);
                &SCHEMA
            }

            fn schema(&self) -> &'static ::sheetbind::Schema {
                <Self as ::sheetbind::Record>::descriptor()
            }

            fn cell_value(&self, index: usize) -> ::sheetbind::CellValue {
                match index {
                    #(#getters,)*
                    _ => ::sheetbind::CellValue::Empty,
                }
            }

            fn set_field(
                &mut self,
                index: usize,
                value: ::sheetbind::FieldValue,
            ) -> ::core::result::Result<(), ::sheetbind::FieldValueError> {
                match index {
                    #(#setters)*
                    _ => ::core::result::Result::Ok(()),
                }
            }
        }
    })
}

/// Missing, empty and `-` annotations exclude the field from binding.
fn is_ignored(annotation: Option<&str>) -> bool {
    matches!(annotation, None | Some("") | Some(IGNORE))
}

/// `#[xlsx("axis:A2;colWidth:20")]` yields the string, `#[xlsx(skip)]` the ignore marker.
fn field_annotation(field: &syn::Field) -> syn::Result<Option<String>> {
    let mut found = None;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("xlsx")) {
        if found.is_some() {
            return Err(syn::Error::new(
                attr.span(),
                "only one #[xlsx(...)] attribute is allowed per field",
            ));
        }
        if let Ok(text) = attr.parse_args::<LitStr>() {
            found = Some(text.value());
            continue;
        }
        let path: syn::Path = attr.parse_args()?;
        if path.is_ident("skip") {
            found = Some(IGNORE.to_string());
        } else {
            return Err(syn::Error::new(
                path.span(),
                "expected #[xlsx(\"key:value;...\")] or #[xlsx(skip)]",
            ));
        }
    }
    Ok(found)
}
