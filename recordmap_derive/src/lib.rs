use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{
    Data, DeriveInput, Expr, Fields, Ident, Lit, Type, parse_macro_input, spanned::Spanned,
};

#[proc_macro_derive(Mapped, attributes(mapped))]
pub fn derive_mapped(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_mapped(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[proc_macro_derive(ValueEnum, attributes(value))]
pub fn derive_value_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_value_enum(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_mapped(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "Mapped does not support generic structs",
        ));
    }

    let type_options = parse_mapped_type_options(&input.attrs)?;

    let data_struct = match input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Mapped can only be derived for structs",
            ));
        }
    };

    let named_fields = match data_struct.fields {
        Fields::Named(fields) => fields,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Mapped requires named fields",
            ));
        }
    };

    let mut fields = Vec::<MappedField>::new();
    for field in named_fields.named {
        let ident = field.ident.clone().ok_or_else(|| {
            syn::Error::new(field.span(), "Mapped requires named fields")
        })?;
        let options = parse_mapped_field_options(&field.attrs)?;
        fields.push(MappedField {
            name: ident.unraw().to_string(),
            ident,
            ty: field.ty,
            options,
        });
    }

    for excluded in type_options.exclusion_idents() {
        let name = excluded.unraw().to_string();
        if !fields.iter().any(|field| field.name == name) {
            return Err(syn::Error::new(
                excluded.span(),
                format!("Unknown field '{}' in #[mapped(...)] exclusion list", name),
            ));
        }
    }

    let type_name = struct_name.unraw().to_string();

    let descriptor_fields = fields.iter().map(|field| {
        let name = &field.name;
        let ty = &field.ty;
        let element = field.options.nested.as_ref().map(|element_ty| {
            quote! { .with_element_type(::recordmap::core::TypeRef::of::<#element_ty>()) }
        });
        let setter = field
            .options
            .setter
            .is_some()
            .then(|| quote! { .with_setter(true) });
        quote! {
            ::recordmap::core::FieldDescriptor::of::<#ty>(#name) #element #setter
        }
    });

    let exclusion_calls = [
        ("shared", &type_options.exclude),
        ("merge", &type_options.exclude_merge),
        ("serialize", &type_options.exclude_serialize),
        ("deserialize", &type_options.exclude_deserialize),
    ]
    .into_iter()
    .filter_map(|(slot, idents)| {
        let idents = idents.as_ref()?;
        let method = format_ident!("{}", slot);
        let names = idents.iter().map(|ident| ident.unraw().to_string());
        Some(quote! { .#method(&[#(#names),*]) })
    });

    let ref_arms = fields.iter().map(|field| {
        let name = &field.name;
        let ident = &field.ident;
        let ty = &field.ty;
        quote! {
            #name => ::std::option::Option::Some(<#ty as ::recordmap::model::MapField>::field_ref(&self.#ident)),
        }
    });

    let mut_arms = fields.iter().map(|field| {
        let name = &field.name;
        let ident = &field.ident;
        let ty = &field.ty;
        quote! {
            #name => ::std::option::Option::Some(<#ty as ::recordmap::model::MapField>::field_mut(&mut self.#ident)),
        }
    });

    let assign_arms = fields.iter().map(|field| {
        let name = &field.name;
        let ident = &field.ident;
        let ty = &field.ty;
        let write_back = match &field.options.setter {
            Some(setter) => {
                let method = setter
                    .clone()
                    .unwrap_or_else(|| format_ident!("set_{}", field.name));
                quote! {
                    ::recordmap::model::SetterOutput::into_result(self.#method(converted))
                }
            }
            None => quote! {
                self.#ident = converted;
                ::std::result::Result::Ok(())
            },
        };
        quote! {
            #name => {
                let converted = ::recordmap::model::convert_field::<#ty>(#name, value)?;
                #write_back
            }
        }
    });

    let take_arms = fields.iter().map(|field| {
        let name = &field.name;
        let ident = &field.ident;
        let ty = &field.ty;
        quote! {
            #name => <#ty as ::recordmap::model::MapField>::take_object(&mut self.#ident),
        }
    });

    let factory = type_options.factory.as_ref().map(|factory| {
        quote! {
            fn create() -> ::recordmap::core::Result<Self> {
                #factory()
            }
        }
    });

    let temporal_codec = type_options.temporal_codec.as_ref().map(|codec| {
        quote! {
            fn temporal_codec(&self) -> ::std::option::Option<&'static dyn ::recordmap::temporal::TemporalCodec> {
                ::std::option::Option::Some(&#codec)
            }
        }
    });

    Ok(quote! {
        impl ::recordmap::model::Mapped for #struct_name {
            fn descriptor(&self) -> &'static ::recordmap::core::TypeDescriptor {
                <Self as ::recordmap::model::MappedType>::type_descriptor()
            }

            fn field_ref(&self, field: &str) -> ::std::option::Option<::recordmap::model::FieldRef<'_>> {
                match field {
                    #(#ref_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn field_mut(&mut self, field: &str) -> ::std::option::Option<::recordmap::model::FieldMut<'_>> {
                match field {
                    #(#mut_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn assign_field(
                &mut self,
                field: &str,
                value: ::recordmap::model::FieldValue,
            ) -> ::recordmap::core::Result<()> {
                match field {
                    #(#assign_arms)*
                    _ => ::std::result::Result::Err(::recordmap::core::MapError::FieldNotFound {
                        type_name: #type_name,
                        field: field.to_string(),
                    }),
                }
            }

            #temporal_codec

            fn take_object(
                &mut self,
                field: &str,
            ) -> ::std::option::Option<::std::boxed::Box<dyn ::recordmap::model::Mapped>> {
                match field {
                    #(#take_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }

        impl ::recordmap::model::MappedType for #struct_name {
            fn type_descriptor() -> &'static ::recordmap::core::TypeDescriptor {
                static DESCRIPTOR: ::std::sync::OnceLock<::recordmap::core::TypeDescriptor> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| {
                    ::recordmap::core::TypeDescriptor::new(
                        #type_name,
                        vec![#(#descriptor_fields),*],
                    )
                    .with_exclusions(::recordmap::exclusion::ExclusionTable::new() #(#exclusion_calls)*)
                })
            }

            fn type_name_static() -> &'static str {
                #type_name
            }

            #factory
        }

        impl ::recordmap::model::MapField for #struct_name {
            fn semantic_type() -> ::recordmap::core::SemanticType {
                ::recordmap::core::SemanticType::Nested(::recordmap::core::TypeRef::of::<Self>())
            }

            fn field_ref(&self) -> ::recordmap::model::FieldRef<'_> {
                ::recordmap::model::FieldRef::Object(self)
            }

            fn field_mut(&mut self) -> ::recordmap::model::FieldMut<'_> {
                ::recordmap::model::FieldMut::Object(self)
            }

            fn take_object(
                &mut self,
            ) -> ::std::option::Option<::std::boxed::Box<dyn ::recordmap::model::Mapped>> {
                ::std::option::Option::Some(::std::boxed::Box::new(::std::mem::take(self)))
            }

            fn from_field_value(value: ::recordmap::model::FieldValue) -> ::std::option::Option<Self> {
                match value {
                    ::recordmap::model::FieldValue::Object(object) => {
                        ::recordmap::model::Mapped::into_any(object)
                            .downcast::<Self>()
                            .ok()
                            .map(|boxed| *boxed)
                    }
                    _ => ::std::option::Option::None,
                }
            }
        }
    })
}

fn expand_value_enum(input: DeriveInput) -> syn::Result<TokenStream2> {
    let enum_name = input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "ValueEnum does not support generic enums",
        ));
    }

    let data_enum = match input.data {
        Data::Enum(data) => data,
        _ => {
            return Err(syn::Error::new(
                enum_name.span(),
                "ValueEnum can only be derived for enums",
            ));
        }
    };

    let mut variants = Vec::<(Ident, BackingValue)>::new();
    for variant in data_enum.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(
                variant.span(),
                "ValueEnum variants cannot carry fields",
            ));
        }
        let backing = parse_backing_value(&variant.attrs, &variant.ident)?;
        variants.push((variant.ident, backing));
    }

    let Some((_, first)) = variants.first() else {
        return Err(syn::Error::new(
            enum_name.span(),
            "ValueEnum requires at least one variant",
        ));
    };
    let integer_backed = matches!(first, BackingValue::Int(_));

    for (ident, backing) in &variants {
        if matches!(backing, BackingValue::Int(_)) != integer_backed {
            return Err(syn::Error::new(
                ident.span(),
                "ValueEnum variants must all be backed by strings or all by integers",
            ));
        }
    }

    for (idx, (ident, backing)) in variants.iter().enumerate() {
        if variants[..idx].iter().any(|(_, other)| other == backing) {
            return Err(syn::Error::new(
                ident.span(),
                "Duplicate #[value = ...] backing value",
            ));
        }
    }

    let backing_arms = variants.iter().map(|(ident, backing)| {
        let value = match backing {
            BackingValue::Str(text) => quote! {
                ::recordmap::core::Value::Text(::std::string::String::from(#text))
            },
            BackingValue::Int(number) => quote! { ::recordmap::core::Value::Integer(#number) },
        };
        quote! { Self::#ident => #value, }
    });

    let lookup_arms = variants.iter().map(|(ident, backing)| match backing {
        BackingValue::Str(text) => quote! { #text => ::std::option::Option::Some(Self::#ident), },
        BackingValue::Int(number) => quote! { #number => ::std::option::Option::Some(Self::#ident), },
    });

    let from_backing = if integer_backed {
        quote! {
            match raw {
                ::recordmap::core::Value::Integer(number) => match *number {
                    #(#lookup_arms)*
                    _ => ::std::option::Option::None,
                },
                _ => ::std::option::Option::None,
            }
        }
    } else {
        quote! {
            match raw {
                ::recordmap::core::Value::Text(text) => match text.as_str() {
                    #(#lookup_arms)*
                    _ => ::std::option::Option::None,
                },
                _ => ::std::option::Option::None,
            }
        }
    };

    Ok(quote! {
        impl ::recordmap::model::ValueEnum for #enum_name {
            fn backing(&self) -> ::recordmap::core::Value {
                match self {
                    #(#backing_arms)*
                }
            }

            fn from_backing(raw: &::recordmap::core::Value) -> ::std::option::Option<Self> {
                #from_backing
            }
        }

        impl ::recordmap::model::Prepare for #enum_name {
            fn prepare(
                &self,
                raw: &::recordmap::core::Value,
            ) -> ::std::result::Result<Self, ::recordmap::model::PrepareError> {
                ::recordmap::model::prepare_value_enum::<Self>(raw)
            }
        }

        impl ::recordmap::model::ProduceValue for #enum_name {
            fn produce(&self) -> ::recordmap::core::Value {
                ::recordmap::model::ValueEnum::backing(self)
            }
        }

        ::recordmap::impl_map_field!(prepare + produce #enum_name);
    })
}

struct MappedField {
    ident: Ident,
    name: String,
    ty: Type,
    options: MappedFieldOptions,
}

#[derive(Default)]
struct MappedTypeOptions {
    exclude: Option<Vec<Ident>>,
    exclude_merge: Option<Vec<Ident>>,
    exclude_serialize: Option<Vec<Ident>>,
    exclude_deserialize: Option<Vec<Ident>>,
    temporal_codec: Option<syn::Path>,
    factory: Option<syn::Path>,
}

impl MappedTypeOptions {
    fn exclusion_idents(&self) -> impl Iterator<Item = &Ident> {
        [
            &self.exclude,
            &self.exclude_merge,
            &self.exclude_serialize,
            &self.exclude_deserialize,
        ]
        .into_iter()
        .flatten()
        .flatten()
    }
}

#[derive(Default)]
struct MappedFieldOptions {
    nested: Option<Type>,
    /// `Some(None)` for the conventional `set_<field>` name.
    setter: Option<Option<Ident>>,
}

#[derive(PartialEq)]
enum BackingValue {
    Str(String),
    Int(i64),
}

fn parse_mapped_type_options(attrs: &[syn::Attribute]) -> syn::Result<MappedTypeOptions> {
    let mut options = MappedTypeOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("mapped") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let slot = if meta.path.is_ident("exclude") {
                &mut options.exclude
            } else if meta.path.is_ident("exclude_merge") {
                &mut options.exclude_merge
            } else if meta.path.is_ident("exclude_serialize") {
                &mut options.exclude_serialize
            } else if meta.path.is_ident("exclude_deserialize") {
                &mut options.exclude_deserialize
            } else if meta.path.is_ident("temporal_codec") {
                if options.temporal_codec.is_some() {
                    return Err(meta.error("Duplicate temporal_codec option"));
                }
                let value = meta.value()?;
                options.temporal_codec = Some(value.parse()?);
                return Ok(());
            } else if meta.path.is_ident("factory") {
                if options.factory.is_some() {
                    return Err(meta.error("Duplicate factory option"));
                }
                let value = meta.value()?;
                options.factory = Some(value.parse()?);
                return Ok(());
            } else {
                return Err(meta.error(
                    "Unsupported #[mapped(...)] option. Supported: exclude(..), exclude_merge(..), exclude_serialize(..), exclude_deserialize(..), temporal_codec = Path, factory = path",
                ));
            };

            if slot.is_some() {
                return Err(meta.error("Duplicate exclusion list"));
            }

            let mut names = Vec::new();
            meta.parse_nested_meta(|inner| {
                names.push(inner.path.require_ident()?.clone());
                Ok(())
            })?;
            *slot = Some(names);
            Ok(())
        })?;
    }

    Ok(options)
}

fn parse_mapped_field_options(attrs: &[syn::Attribute]) -> syn::Result<MappedFieldOptions> {
    let mut options = MappedFieldOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("mapped") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("nested") {
                if options.nested.is_some() {
                    return Err(meta.error("Duplicate nested option"));
                }
                let value = meta.value()?;
                options.nested = Some(value.parse()?);
                return Ok(());
            }

            if meta.path.is_ident("setter") {
                if options.setter.is_some() {
                    return Err(meta.error("Duplicate setter option"));
                }
                let method = if meta.input.peek(syn::Token![=]) {
                    let value = meta.value()?;
                    Some(value.parse::<Ident>()?)
                } else {
                    None
                };
                options.setter = Some(method);
                return Ok(());
            }

            Err(meta.error(
                "Unsupported #[mapped(...)] field option. Supported: nested = Type, setter, setter = method",
            ))
        })?;
    }

    Ok(options)
}

fn parse_backing_value(attrs: &[syn::Attribute], variant: &Ident) -> syn::Result<BackingValue> {
    let mut backing = None;

    for attr in attrs {
        if !attr.path().is_ident("value") {
            continue;
        }

        if backing.is_some() {
            return Err(syn::Error::new(
                attr.span(),
                "Duplicate #[value = ...] attribute on variant",
            ));
        }

        let syn::Meta::NameValue(name_value) = &attr.meta else {
            return Err(syn::Error::new(
                attr.span(),
                "Unsupported #[value] syntax. Use #[value = \"...\"] or #[value = 3]",
            ));
        };

        backing = Some(match &name_value.value {
            Expr::Lit(expr) => match &expr.lit {
                Lit::Str(lit) => BackingValue::Str(lit.value()),
                Lit::Int(lit) => BackingValue::Int(lit.base10_parse::<i64>()?),
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        "#[value = ...] must be a string or integer literal",
                    ));
                }
            },
            Expr::Unary(syn::ExprUnary {
                op: syn::UnOp::Neg(_),
                expr,
                ..
            }) => match expr.as_ref() {
                Expr::Lit(syn::ExprLit {
                    lit: Lit::Int(lit), ..
                }) => BackingValue::Int(-lit.base10_parse::<i64>()?),
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        "#[value = ...] must be a string or integer literal",
                    ));
                }
            },
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "#[value = ...] must be a string or integer literal",
                ));
            }
        });
    }

    backing.ok_or_else(|| {
        syn::Error::new(
            variant.span(),
            "ValueEnum variants require a #[value = ...] attribute",
        )
    })
}
