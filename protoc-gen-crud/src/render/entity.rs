//! Per-entity handler file: enum codecs, the `Record` impl and one inherent
//! method per declared CRUD operation

use std::collections::BTreeMap;

use heck::{ToSnakeCase, ToUpperCamelCase};
use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote};

use super::{format_code, message_path, rust_ident, scalar_tokens};
use crate::classify::{Classification, ClassifiedField, ColumnShape, FieldState, ScanTarget};
use crate::error::GeneratorError;
use crate::model::{CrudMethod, Entity, Field, FieldType, MethodKind};
use crate::options::Options;

/// Render `{package}/handler/{entity}.rs`
pub fn render(
    entity: &Entity,
    classification: &Classification,
    options: &Options,
) -> Result<String, GeneratorError> {
    let proto_module = options.proto_module(&entity.package)?;
    let entity_ty = entity_type(entity);

    let codecs = render_codecs(entity, classification);
    let record = render_record(entity, classification, &entity_ty);

    let mut operations = Vec::new();
    for (kind, method) in &entity.methods {
        let request_ty = message_path(options, &method.method.input, &entity.package)?;
        let op = match kind {
            MethodKind::Create => render_create(entity, classification, method, &request_ty, &entity_ty),
            MethodKind::Get => render_get(method, &request_ty, &entity_ty),
            MethodKind::Update => render_update(entity, classification, method, &request_ty, &entity_ty),
            MethodKind::Delete => render_delete(method, &request_ty, &entity_ty),
            MethodKind::List => render_list(method, &request_ty, &entity_ty),
        };
        operations.push(op);
    }

    let title = format!(" CRUD handlers for `{}`", entity.name);
    let tokens = quote! {
        #![doc = #title]
        #![doc = ""]
        #![doc = " @generated by protoc-gen-crud. Do not edit."]
        #![allow(unused_imports)]
        #![allow(clippy::all)]

        use crud_runtime::crud::{self, Changes, NewRow, Record, TableSpec};
        use crud_runtime::{
            ColumnKind, EnumCodec, HandlerError, ListQuery, Page, Row, RowError, SqlValue, Store,
        };

        use super::Handler;
        use #proto_module as proto;

        #(#codecs)*

        #record

        impl<S: Store> Handler<S> {
            #(#operations)*
        }
    };

    Ok(format_code(tokens))
}

fn entity_type(entity: &Entity) -> TokenStream {
    let ident = format_ident!("{}", entity.name.to_upper_camel_case());
    quote!(proto::#ident)
}

/// Lower-case entity name used in error messages
fn entity_label(entity: &Entity) -> String {
    entity.name.to_snake_case().replace('_', " ")
}

fn codec_ident(entity: &Entity, field: &ClassifiedField) -> Option<Ident> {
    field.codec(entity).map(|name| format_ident!("{}", name))
}

/// Rust type of a field as it appears on the prost message, ignoring presence
fn field_type_tokens(field: &Field) -> TokenStream {
    match &field.field_type {
        FieldType::Scalar(scalar) => scalar_tokens(*scalar),
        FieldType::Enum(_) => quote!(i32),
        FieldType::Timestamp => quote!(crud_runtime::prost_types::Timestamp),
    }
}

fn shape_tokens(shape: ColumnShape) -> TokenStream {
    match shape {
        ColumnShape::Bool => quote!(ColumnKind::Bool),
        ColumnShape::Int => quote!(ColumnKind::Int),
        ColumnShape::UInt => quote!(ColumnKind::UInt),
        ColumnShape::Float => quote!(ColumnKind::Float),
        ColumnShape::Text => quote!(ColumnKind::Text),
        ColumnShape::Bytes => quote!(ColumnKind::Bytes),
        ColumnShape::Timestamp => quote!(ColumnKind::Timestamp),
    }
}

fn render_codecs(entity: &Entity, classification: &Classification) -> Vec<TokenStream> {
    let mut codecs = BTreeMap::new();
    for field in &classification.fields {
        let (Some(name), Some(def)) = (
            field.codec(entity),
            field.field.enum_type_name().and_then(|n| entity.enums.get(n)),
        ) else {
            continue;
        };
        codecs.entry(name).or_insert(def);
    }

    codecs
        .into_iter()
        .map(|(name, def)| {
            let ident = format_ident!("{}", name);
            let type_name = def.rust_path.rsplit("::").next().unwrap_or(&def.rust_path);
            let numbers = def.variants.iter().map(|v| Literal::i32_unsuffixed(v.number));
            let storage = def.variants.iter().map(|v| v.storage.as_str());
            let doc = format!(" Storage strings of `{}`", def.rust_path);
            quote! {
                #[doc = #doc]
                pub const #ident: EnumCodec = EnumCodec::new(#type_name, &[#((#numbers, #storage)),*]);
            }
        })
        .collect()
}

fn render_record(
    entity: &Entity,
    classification: &Classification,
    entity_ty: &TokenStream,
) -> TokenStream {
    let label = entity_label(entity);
    let table = &entity.table;
    let create_columns = &classification.create_fields_sql;
    let create_placeholders = &classification.create_placeholders;
    let select_columns = &classification.select_fields_sql;
    let shapes = classification.row_shape().into_iter().map(shape_tokens);
    let filterable = &classification.filterable;

    // Locals are named after the fields, so the cursor must not collide
    let cursor = if entity.fields.iter().any(|f| f.name == "columns") {
        format_ident!("row_columns")
    } else {
        format_ident!("columns")
    };

    let mut reads = Vec::new();
    let mut assignments = Vec::new();
    for target in &classification.scan_targets {
        match target {
            ScanTarget::Slot { field } => {
                let ident = rust_ident(&field.name);
                let ty = field_type_tokens(field);
                let ty = if field.is_optional { quote!(Option<#ty>) } else { ty };
                reads.push(quote!(let #ident: #ty = #cursor.take()?;));
                assignments.push(quote!(#ident));
            }
            ScanTarget::EnumHolder {
                field,
                holder,
                codec,
            } => {
                let ident = rust_ident(&field.name);
                let holder = format_ident!("{}", holder);
                let codec = format_ident!("{}", codec);
                if field.is_optional {
                    reads.push(quote!(let #holder: Option<String> = #cursor.take()?;));
                    assignments.push(quote!(#ident: #holder.map(|s| #codec.decode(&s))));
                } else {
                    reads.push(quote!(let #holder: String = #cursor.take()?;));
                    assignments.push(quote!(#ident: #codec.decode(&#holder)));
                }
            }
            ScanTarget::Audit {
                column,
                shape,
                declared,
            } => {
                let ty = match shape {
                    ColumnShape::Timestamp => quote!(crud_runtime::prost_types::Timestamp),
                    _ => quote!(String),
                };
                let ident = rust_ident(column);
                match declared {
                    None => {
                        let unused = format_ident!("_{}", column);
                        reads.push(quote!(let #unused: Option<#ty> = #cursor.take()?;));
                    }
                    Some(_) if *column == "id" => {
                        reads.push(quote!(let #ident: #ty = #cursor.take()?;));
                        assignments.push(quote!(#ident));
                    }
                    // prost wraps message fields in Option regardless of presence
                    Some(optional) if *optional || *shape == ColumnShape::Timestamp => {
                        reads.push(quote!(let #ident: Option<#ty> = #cursor.take()?;));
                        assignments.push(quote!(#ident));
                    }
                    Some(_) => {
                        reads.push(quote!(let #ident: Option<#ty> = #cursor.take()?;));
                        assignments.push(quote!(#ident: #ident.unwrap_or_default()));
                    }
                }
            }
        }
    }
    let rest = if classification.skipped.is_empty() {
        quote!()
    } else {
        quote!(..Default::default())
    };

    quote! {
        impl Record for #entity_ty {
            const TABLE: TableSpec = TableSpec {
                entity: #label,
                table: #table,
                create_columns: #create_columns,
                create_placeholders: #create_placeholders,
                select_columns: #select_columns,
                row_shape: &[#(#shapes),*],
                filterable: &[#(#filterable),*],
            };

            fn from_row(row: Row) -> Result<Self, RowError> {
                let mut #cursor = row.columns();
                #(#reads)*
                Ok(Self {
                    #(#assignments,)*
                    #rest
                })
            }
        }
    }
}

fn fn_name(method: &CrudMethod) -> Ident {
    rust_ident(&method.method.name)
}

fn method_doc(method: &CrudMethod, summary: &str) -> String {
    format!(" `{}`: {}", method.method.name, summary)
}

/// Value written for one create column
fn create_value(entity: &Entity, field: &ClassifiedField, request: &CrudMethod) -> TokenStream {
    let ident = rust_ident(&field.field.name);
    let codec = codec_ident(entity, field);
    let in_request = request.request.field(&field.field.name);

    match (in_request, codec) {
        (None, _) if field.field.is_optional => quote!(SqlValue::Null),
        (None, Some(codec)) => quote!(SqlValue::from(#codec.default_storage())),
        (None, None) => {
            let ty = field_type_tokens(&field.field);
            quote!(SqlValue::from(<#ty as Default>::default()))
        }
        (Some(r), Some(codec)) if r.is_optional => {
            quote!(SqlValue::from(#codec.encode_or_default(request.#ident)))
        }
        (Some(_), Some(codec)) => quote!(SqlValue::from(#codec.encode(request.#ident))),
        (Some(_), None) => quote!(SqlValue::from(request.#ident)),
    }
}

fn by_value(method: &CrudMethod, column: &str) -> TokenStream {
    match method.request.audit_by {
        Some(_) => {
            let ident = rust_ident(column);
            quote!(SqlValue::from(request.#ident))
        }
        None => quote!(SqlValue::Null),
    }
}

fn request_param(uses_request: bool) -> Ident {
    if uses_request {
        format_ident!("request")
    } else {
        format_ident!("_request")
    }
}

fn render_create(
    entity: &Entity,
    classification: &Classification,
    method: &CrudMethod,
    request_ty: &TokenStream,
    entity_ty: &TokenStream,
) -> TokenStream {
    let name = fn_name(method);
    let doc = method_doc(method, "validate, insert and return the stored row");

    let required = classification.validated().map(|f| {
        let column = &f.field.name;
        let ident = rust_ident(column);
        quote!((#column, !request.#ident.is_empty()))
    });
    let values: Vec<TokenStream> = classification
        .fields
        .iter()
        .map(|f| create_value(entity, f, method))
        .collect();
    let created_by = by_value(method, "created_by");

    let uses_request = method.request.audit_by.is_some()
        || classification
            .fields
            .iter()
            .any(|f| method.request.field(&f.field.name).is_some());
    let param = request_param(uses_request);

    quote! {
        #[doc = #doc]
        pub async fn #name(&self, #param: #request_ty) -> Result<#entity_ty, HandlerError> {
            let required = vec![#(#required),*];
            let row = NewRow {
                required,
                values: vec![#(#values),*],
                created_by: #created_by,
            };
            crud::create::<#entity_ty>(&self.store, self.ids.as_ref(), row).await
        }
    }
}

fn render_update(
    entity: &Entity,
    classification: &Classification,
    method: &CrudMethod,
    request_ty: &TokenStream,
    entity_ty: &TokenStream,
) -> TokenStream {
    let name = fn_name(method);
    let doc = method_doc(method, "apply the supplied fields and return the stored row");
    let updated_by = by_value(method, "updated_by");

    let mut sets = Vec::new();
    for field in &classification.fields {
        let column = &field.field.db_column;
        let ident = rust_ident(&field.field.name);
        let set = match (field.update, codec_ident(entity, field)) {
            (FieldState::Excluded, _) => continue,
            (_, Some(codec)) if field.update_optional => {
                quote!(changes.set(#column, #codec.encode(request.#ident.unwrap_or_default()));)
            }
            (_, Some(codec)) => quote!(changes.set(#column, #codec.encode(request.#ident));),
            (FieldState::Optional, None) => quote! {
                if let Some(value) = request.#ident {
                    changes.set(#column, value);
                }
            },
            (_, None) => quote!(changes.set(#column, request.#ident);),
        };
        sets.push(set);
    }
    let binding = if sets.is_empty() {
        quote!(let changes)
    } else {
        quote!(let mut changes)
    };

    quote! {
        #[doc = #doc]
        pub async fn #name(&self, request: #request_ty) -> Result<#entity_ty, HandlerError> {
            #binding = Changes {
                updated_by: #updated_by,
                ..Default::default()
            };
            #(#sets)*
            crud::update::<#entity_ty>(&self.store, &request.id, changes).await
        }
    }
}

fn render_get(method: &CrudMethod, request_ty: &TokenStream, entity_ty: &TokenStream) -> TokenStream {
    let name = fn_name(method);
    let doc = method_doc(method, "fetch one row by id");
    quote! {
        #[doc = #doc]
        pub async fn #name(&self, request: #request_ty) -> Result<#entity_ty, HandlerError> {
            crud::get::<#entity_ty>(&self.store, &request.id).await
        }
    }
}

fn render_delete(method: &CrudMethod, request_ty: &TokenStream, entity_ty: &TokenStream) -> TokenStream {
    let name = fn_name(method);
    let doc = method_doc(method, "delete one row by id");
    quote! {
        #[doc = #doc]
        pub async fn #name(&self, request: #request_ty) -> Result<(), HandlerError> {
            crud::delete::<#entity_ty>(&self.store, &request.id).await
        }
    }
}

fn render_list(method: &CrudMethod, request_ty: &TokenStream, entity_ty: &TokenStream) -> TokenStream {
    let name = fn_name(method);
    let doc = method_doc(method, "filter, sort and paginate");
    let (param, query) = match &method.request.search_field {
        Some(search) => {
            let search = rust_ident(search);
            (
                request_param(true),
                quote!(ListQuery::from_search(request.#search)),
            )
        }
        None => (request_param(false), quote!(ListQuery::default())),
    };
    quote! {
        #[doc = #doc]
        pub async fn #name(&self, #param: #request_ty) -> Result<Page<#entity_ty>, HandlerError> {
            let query = #query;
            crud::list::<#entity_ty>(&self.store, &query).await
        }
    }
}
