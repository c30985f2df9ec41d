//! Package root file: the `Handler` type and the tonic service impls that
//! delegate to the per-entity methods

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use super::{format_code, message_path, rust_ident, scalar_tokens};
use crate::error::GeneratorError;
use crate::model::{Entity, Method, MethodKind, ResponseShape, ScalarType, Service};
use crate::options::Options;

/// Render `{package}/handler/mod.rs`
pub fn render(
    package: &str,
    entities: &[&Entity],
    services: &[&Service],
    options: &Options,
) -> Result<String, GeneratorError> {
    let proto_module = options.proto_module(package)?;
    let modules = entities
        .iter()
        .map(|e| format_ident!("{}", e.name.to_snake_case()));

    let mut impls = Vec::new();
    for service in services {
        if service.has_streaming() {
            tracing::warn!(
                service = %service.name,
                "service has streaming methods, no tonic impl generated"
            );
            continue;
        }
        impls.push(render_service(service, entities, options)?);
    }

    let title = format!(" gRPC handlers for package `{package}`");
    let tokens = quote! {
        #![doc = #title]
        #![doc = ""]
        #![doc = " @generated by protoc-gen-crud. Do not edit."]
        #![allow(unused_imports)]
        #![allow(clippy::all)]

        #(pub mod #modules;)*

        use std::sync::Arc;

        use crud_runtime::tonic::{self, Request, Response, Status};
        use crud_runtime::{IdGenerator, Store, UuidGenerator};

        use #proto_module as proto;

        /// Serves the CRUD methods of this package over a [`Store`]
        pub struct Handler<S> {
            store: S,
            ids: Arc<dyn IdGenerator>,
        }

        impl<S: Store> Handler<S> {
            /// Handler minting UUID v4 ids
            pub fn new(store: S) -> Self {
                Self::with_id_generator(store, UuidGenerator)
            }

            /// Handler minting ids with `ids`
            pub fn with_id_generator(store: S, ids: impl IdGenerator + 'static) -> Self {
                Self {
                    store,
                    ids: Arc::new(ids),
                }
            }

            /// The backing store
            pub fn store(&self) -> &S {
                &self.store
            }
        }

        #(#impls)*
    };

    Ok(format_code(tokens))
}

fn render_service(
    service: &Service,
    entities: &[&Entity],
    options: &Options,
) -> Result<TokenStream, GeneratorError> {
    let server_module = format_ident!("{}_server", service.name.to_snake_case());
    let service_trait = format_ident!("{}", service.name);

    let mut methods = Vec::new();
    for method in &service.methods {
        let name = rust_ident(&method.name);
        let input = message_path(options, &method.input, &service.package)?;
        let output = message_path(options, &method.output, &service.package)?;

        let bound = service
            .bindings
            .get(&method.name)
            .and_then(|entity| entities.iter().find(|e| &e.name == entity))
            .zip(method.kind)
            .and_then(|(entity, kind)| entity.method(kind).map(|m| (kind, &m.response)));

        let body = match bound {
            Some((kind, shape)) => delegate(method, kind, shape, &output),
            None => {
                let message = format!("{} is not implemented", method.name);
                quote! {
                    let _ = request;
                    Err(Status::unimplemented(#message))
                }
            }
        };

        methods.push(quote! {
            async fn #name(
                &self,
                request: Request<#input>,
            ) -> Result<Response<#output>, Status> {
                #body
            }
        });
    }

    Ok(quote! {
        #[tonic::async_trait]
        impl<S: Store + 'static> proto::#server_module::#service_trait for Handler<S> {
            #(#methods)*
        }
    })
}

/// Response fields other than the ones the operation fills in
fn needs_default(kind: MethodKind, shape: &ResponseShape) -> bool {
    let has_paging = shape.total.is_some() || shape.page.is_some() || shape.page_size.is_some();
    shape.has_other_fields
        || (kind != MethodKind::List && has_paging)
        || (kind != MethodKind::Delete && shape.success)
        || (kind == MethodKind::Delete && shape.entity_field.is_some())
}

/// Convert a page counter into the integer type of its response field
fn counter(value: TokenStream, from: ScalarType, to: ScalarType) -> TokenStream {
    if from == to {
        value
    } else {
        let ty = scalar_tokens(to);
        quote!(<#ty>::try_from(#value).unwrap_or_default())
    }
}

fn delegate(
    method: &Method,
    kind: MethodKind,
    shape: &ResponseShape,
    output: &TokenStream,
) -> TokenStream {
    let handler = rust_ident(&method.name);
    let rest = if needs_default(kind, shape) {
        quote!(..Default::default())
    } else {
        quote!()
    };

    match kind {
        MethodKind::Create | MethodKind::Get | MethodKind::Update => {
            let response = match &shape.entity_field {
                Some(field) => {
                    let field = rust_ident(field);
                    quote!(#output { #field: Some(record), #rest })
                }
                None => quote!(record),
            };
            quote! {
                let record = self.#handler(request.into_inner()).await?;
                Ok(Response::new(#response))
            }
        }
        MethodKind::Delete => {
            let response = if method.output.full_name == ".google.protobuf.Empty" {
                quote!(())
            } else if shape.success {
                quote!(#output { success: true, #rest })
            } else {
                quote!(#output::default())
            };
            quote! {
                self.#handler(request.into_inner()).await?;
                Ok(Response::new(#response))
            }
        }
        MethodKind::List => {
            let mut fields = Vec::new();
            if let Some(field) = &shape.entity_field {
                let field = rust_ident(field);
                fields.push(quote!(#field: page.items));
            }
            if let Some(ty) = shape.total {
                let total = counter(quote!(page.total), ScalarType::Int64, ty);
                fields.push(quote!(total: #total));
            }
            if let Some(ty) = shape.page {
                let number = counter(quote!(page.page), ScalarType::Int32, ty);
                fields.push(quote!(page: #number));
            }
            if let Some(ty) = shape.page_size {
                let size = counter(quote!(page.page_size), ScalarType::Int32, ty);
                fields.push(quote!(page_size: #size));
            }
            quote! {
                let page = self.#handler(request.into_inner()).await?;
                Ok(Response::new(#output { #(#fields,)* #rest }))
            }
        }
    }
}
