//! Schema parser
//!
//! Walks the descriptors of a generation request and builds one [`Entity`] per
//! message that a CRUD method refers to. Methods are bound to entities by name
//! prefix (`Create*`, `Get*`, `Update*`, `Delete*`, `List*`); the create and
//! update request shapes are read per entity from the method inputs.
//!
//! An entity that cannot be resolved becomes a [`GenerationFailure`] and is
//! left out; the other entities are unaffected.

use std::collections::{BTreeMap, HashMap};

use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    MethodDescriptorProto,
};

use crate::error::{GenerationFailure, GeneratorError};
use crate::model::{
    AuditFields, CrudMethod, Entity, EnumDef, EnumVariant, Field, FieldType, ID_COLUMN, Method,
    MethodKind, RequestShape, ResponseShape, ScalarType, Service, TypeRef, is_audit_column,
};

const TIMESTAMP: &str = ".google.protobuf.Timestamp";
const SEARCH_REQUEST: &str = ".SearchRequest";
const EMPTY: &str = ".google.protobuf.Empty";

/// Everything the parser resolved from one request
#[derive(Debug, Default)]
pub struct Schema {
    /// Entities that resolved, in the order their methods were found
    pub entities: Vec<Entity>,
    /// Services of the requested files
    pub services: Vec<Service>,
    /// Entities that did not resolve
    pub failures: Vec<GenerationFailure>,
}

/// Every message and enum visible to the request, keyed by full name
struct TypeIndex<'a> {
    messages: HashMap<String, (&'a DescriptorProto, TypeRef)>,
    enums: HashMap<String, EnumDef>,
}

impl<'a> TypeIndex<'a> {
    fn new(files: &'a [FileDescriptorProto]) -> Self {
        let mut index = Self {
            messages: HashMap::new(),
            enums: HashMap::new(),
        };
        for file in files {
            let package = file.package();
            let scope = if package.is_empty() {
                String::new()
            } else {
                format!(".{package}")
            };
            for message in &file.message_type {
                index.add_message(package, &scope, "", message);
            }
            for enum_desc in &file.enum_type {
                index.add_enum(&scope, "", enum_desc);
            }
        }
        index
    }

    // `rust_scope` is the module prefix prost gives nested types, e.g. `outer::`
    fn add_message(
        &mut self,
        package: &str,
        scope: &str,
        rust_scope: &str,
        message: &'a DescriptorProto,
    ) {
        let name = message.name();
        let full_name = format!("{scope}.{name}");
        let nested_scope = format!("{rust_scope}{}::", name.to_snake_case());

        for nested in &message.nested_type {
            self.add_message(package, &full_name, &nested_scope, nested);
        }
        for enum_desc in &message.enum_type {
            self.add_enum(&full_name, &nested_scope, enum_desc);
        }

        let type_ref = TypeRef {
            full_name: full_name.clone(),
            package: package.to_string(),
            rust_path: format!("{rust_scope}{}", name.to_upper_camel_case()),
        };
        self.messages.insert(full_name, (message, type_ref));
    }

    fn add_enum(&mut self, scope: &str, rust_scope: &str, enum_desc: &EnumDescriptorProto) {
        let name = enum_desc.name();
        let full_name = format!("{scope}.{name}");
        let prefix = format!("{}_", name.to_shouty_snake_case());

        let variants = enum_desc
            .value
            .iter()
            .map(|value| EnumVariant {
                name: value.name().to_string(),
                number: value.number(),
                storage: storage_name(value.name(), &prefix),
            })
            .collect();

        self.enums.insert(
            full_name.clone(),
            EnumDef {
                full_name,
                rust_path: format!("{rust_scope}{}", name.to_upper_camel_case()),
                variants,
            },
        );
    }

    fn message(&self, full_name: &str) -> Option<&'a DescriptorProto> {
        self.messages.get(full_name).map(|(message, _)| *message)
    }

    /// Rust naming for a message, guessing from the name for unknown types
    fn type_ref(&self, full_name: &str) -> TypeRef {
        if let Some((_, type_ref)) = self.messages.get(full_name) {
            return type_ref.clone();
        }
        let trimmed = full_name.trim_start_matches('.');
        let (package, name) = trimmed.rsplit_once('.').unwrap_or(("", trimmed));
        TypeRef {
            full_name: full_name.to_string(),
            package: package.to_string(),
            rust_path: name.to_upper_camel_case(),
        }
    }
}

/// Storage string for an enum value: the type-name prefix stripped, lower-cased
///
/// `USER_STATUS_ACTIVE` in `UserStatus` stores as `active`.
pub fn storage_name(value_name: &str, prefix: &str) -> String {
    value_name
        .strip_prefix(prefix)
        .filter(|rest| !rest.is_empty())
        .unwrap_or(value_name)
        .to_lowercase()
}

/// Singular form of a plural entity name
///
/// `Faculties` → `Faculty`, `Classes` → `Class`, `Users` → `User`.
pub fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies").filter(|s| !s.is_empty()) {
        format!("{stem}y")
    } else if let Some(stem) = name.strip_suffix("ses").filter(|s| !s.is_empty()) {
        format!("{stem}s")
    } else if let Some(stem) = name.strip_suffix('s').filter(|s| !s.is_empty()) {
        stem.to_string()
    } else {
        name.to_string()
    }
}

/// Strip a trailing `By…` qualifier, e.g. `UsersByStatus` → `Users`
pub fn strip_by_suffix(name: &str) -> &str {
    name.match_indices("By")
        .find(|(idx, _)| {
            *idx > 0
                && name[idx + 2..]
                    .chars()
                    .next()
                    .is_some_and(char::is_uppercase)
        })
        .map_or(name, |(idx, _)| &name[..idx])
}

fn scalar_type(ty: Type) -> Option<ScalarType> {
    match ty {
        Type::Bool => Some(ScalarType::Bool),
        Type::Int32 | Type::Sint32 | Type::Sfixed32 => Some(ScalarType::Int32),
        Type::Int64 | Type::Sint64 | Type::Sfixed64 => Some(ScalarType::Int64),
        Type::Uint32 | Type::Fixed32 => Some(ScalarType::UInt32),
        Type::Uint64 | Type::Fixed64 => Some(ScalarType::UInt64),
        Type::Float => Some(ScalarType::Float),
        Type::Double => Some(ScalarType::Double),
        Type::String => Some(ScalarType::String),
        Type::Bytes => Some(ScalarType::Bytes),
        Type::Enum | Type::Message | Type::Group => None,
    }
}

fn integer_type(field: &FieldDescriptorProto) -> Option<ScalarType> {
    if field.label() == Label::Repeated || field.proto3_optional() {
        return None;
    }
    scalar_type(field.r#type()).filter(|s| {
        matches!(
            s,
            ScalarType::Int32 | ScalarType::Int64 | ScalarType::UInt32 | ScalarType::UInt64
        )
    })
}

/// Convert a field descriptor, rejecting shapes that do not map onto one column
fn convert_field(field: &FieldDescriptorProto) -> Result<Field, String> {
    let name = field.name();
    if field.label() == Label::Repeated {
        return Err(format!("repeated field `{name}` is not supported"));
    }
    if field.oneof_index.is_some() && !field.proto3_optional() {
        return Err(format!("oneof member `{name}` is not supported"));
    }

    let field_type = match field.r#type() {
        Type::Enum => FieldType::Enum(field.type_name().to_string()),
        Type::Message if field.type_name() == TIMESTAMP => FieldType::Timestamp,
        Type::Message => {
            return Err(format!(
                "message field `{name}` of type `{}` is not supported",
                field.type_name()
            ));
        }
        Type::Group => return Err(format!("group field `{name}` is not supported")),
        other => match scalar_type(other) {
            Some(scalar) => FieldType::Scalar(scalar),
            None => return Err(format!("field `{name}` has an unsupported type")),
        },
    };

    let is_optional = field.proto3_optional() || field_type == FieldType::Timestamp;
    Ok(Field {
        name: name.to_string(),
        db_column: name.to_string(),
        field_type,
        is_optional,
    })
}

/// Methods bound to one entity while services are being walked
struct Pending {
    package: String,
    name: String,
    methods: BTreeMap<MethodKind, Method>,
}

/// Parse the files named in `file_to_generate`, resolving types against all
/// of `proto_file`
pub fn parse(
    proto_file: &[FileDescriptorProto],
    file_to_generate: &[String],
) -> Result<Schema, GeneratorError> {
    let index = TypeIndex::new(proto_file);
    let mut schema = Schema::default();
    let mut pending: Vec<Pending> = Vec::new();

    for file_name in file_to_generate {
        let file = proto_file
            .iter()
            .find(|f| f.name() == file_name)
            .ok_or_else(|| GeneratorError::MissingFile(file_name.clone()))?;
        let package = file.package();
        tracing::debug!(file = %file_name, package, "parsing");

        for service_desc in &file.service {
            let mut service = Service {
                name: service_desc.name().to_string(),
                package: package.to_string(),
                methods: Vec::new(),
                bindings: BTreeMap::new(),
            };

            for method_desc in &service_desc.method {
                let mut method = Method {
                    name: method_desc.name().to_string(),
                    kind: None,
                    input: index.type_ref(method_desc.input_type()),
                    output: index.type_ref(method_desc.output_type()),
                    client_streaming: method_desc.client_streaming(),
                    server_streaming: method_desc.server_streaming(),
                };

                match bind_method(&index, package, method_desc) {
                    Some((kind, Ok(entity))) => {
                        let slot = match pending
                            .iter()
                            .position(|p| p.package == package && p.name == entity)
                        {
                            Some(i) => &mut pending[i],
                            None => {
                                pending.push(Pending {
                                    package: package.to_string(),
                                    name: entity.clone(),
                                    methods: BTreeMap::new(),
                                });
                                let last = pending.len() - 1;
                                &mut pending[last]
                            }
                        };
                        if let Some(existing) = slot.methods.get(&kind) {
                            tracing::warn!(
                                method = %method.name,
                                existing = %existing.name,
                                entity = %entity,
                                "duplicate {:?} method, generating it as unimplemented",
                                kind
                            );
                        } else {
                            method.kind = Some(kind);
                            slot.methods.insert(kind, method.clone());
                            service.bindings.insert(method.name.clone(), entity);
                        }
                    }
                    Some((_, Err(entity))) => {
                        if !schema.failures.iter().any(|f| f.entity == entity) {
                            schema.failures.push(GenerationFailure::new(
                                &entity,
                                format!(
                                    "referenced by `{}` but has no message definition",
                                    method.name
                                ),
                            ));
                        }
                    }
                    None => {}
                }

                service.methods.push(method);
            }

            schema.services.push(service);
        }
    }

    for p in pending {
        match build_entity(&index, &p) {
            Ok(entity) => {
                tracing::debug!(entity = %entity.name, fields = entity.fields.len(), "resolved entity");
                schema.entities.push(entity);
            }
            Err(reason) => schema.failures.push(GenerationFailure::new(&p.name, reason)),
        }
    }

    // Failed entities keep their methods, answered as unimplemented
    let resolved: Vec<&str> = schema.entities.iter().map(|e| e.name.as_str()).collect();
    for service in &mut schema.services {
        service
            .bindings
            .retain(|_, entity| resolved.contains(&entity.as_str()));
    }

    Ok(schema)
}

/// Find the operation and entity a method stands for
///
/// `Err` carries the entity name when no message of that name exists.
fn bind_method(
    index: &TypeIndex<'_>,
    package: &str,
    method: &MethodDescriptorProto,
) -> Option<(MethodKind, Result<String, String>)> {
    let name = method.name();
    let kind = MethodKind::from_method_name(name)?;
    let rest = &name[kind.prefix().len()..];
    let scope = if package.is_empty() {
        String::new()
    } else {
        format!(".{package}")
    };
    let exists = |entity: &str| index.message(&format!("{scope}.{entity}")).is_some();

    if kind != MethodKind::List {
        // `GetUserByEmail` and friends are lookups, not CRUD
        if strip_by_suffix(rest) != rest {
            return None;
        }
        let entity = rest.to_string();
        return Some((kind, if exists(rest) { Ok(entity) } else { Err(entity) }));
    }

    let plural = strip_by_suffix(rest);
    let singular = singularize(plural);
    if exists(&singular) {
        return Some((kind, Ok(singular)));
    }
    if exists(plural) {
        return Some((kind, Ok(plural.to_string())));
    }

    // Fall back to the element type of the response's repeated message field
    let element = index
        .message(method.output_type())
        .and_then(|output| {
            output
                .field
                .iter()
                .find(|f| f.label() == Label::Repeated && f.r#type() == Type::Message)
        })
        .and_then(|f| f.type_name().rsplit_once('.'))
        .filter(|(type_scope, _)| *type_scope == scope)
        .map(|(_, element)| element.to_string())
        .filter(|element| exists(element));
    Some((kind, element.ok_or(singular)))
}

fn build_entity(index: &TypeIndex<'_>, pending: &Pending) -> Result<Entity, String> {
    let full_name = if pending.package.is_empty() {
        format!(".{}", pending.name)
    } else {
        format!(".{}.{}", pending.package, pending.name)
    };
    let message = index
        .message(&full_name)
        .ok_or_else(|| "has no message definition".to_string())?;

    let mut entity = Entity {
        name: pending.name.clone(),
        package: pending.package.clone(),
        table: pending.name.clone(),
        fields: Vec::new(),
        audit: AuditFields::default(),
        methods: BTreeMap::new(),
        enums: BTreeMap::new(),
    };
    let mut has_id = false;

    for descriptor in &message.field {
        let field = convert_field(descriptor)?;
        match field.name.as_str() {
            ID_COLUMN => {
                if field.field_type != FieldType::Scalar(ScalarType::String) || field.is_optional {
                    return Err("`id` must be a plain string".to_string());
                }
                has_id = true;
            }
            "created_at" | "updated_at" => {
                if !field.is_timestamp() {
                    return Err(format!("`{}` must be a google.protobuf.Timestamp", field.name));
                }
                let slot = if field.name == "created_at" {
                    &mut entity.audit.created_at
                } else {
                    &mut entity.audit.updated_at
                };
                *slot = Some(field.is_optional);
            }
            "created_by" | "updated_by" => {
                if field.field_type != FieldType::Scalar(ScalarType::String) {
                    return Err(format!("`{}` must be a string", field.name));
                }
                let slot = if field.name == "created_by" {
                    &mut entity.audit.created_by
                } else {
                    &mut entity.audit.updated_by
                };
                *slot = Some(field.is_optional);
            }
            _ => {
                if let Some(enum_name) = field.enum_type_name() {
                    let def = index
                        .enums
                        .get(enum_name)
                        .ok_or_else(|| format!("enum `{enum_name}` of `{}` not found", field.name))?;
                    if def.variants.is_empty() {
                        return Err(format!("enum `{enum_name}` has no values"));
                    }
                    entity.enums.insert(enum_name.to_string(), def.clone());
                }
                entity.fields.push(field);
            }
        }
    }

    if !has_id {
        return Err("has no `id` field".to_string());
    }

    // `google.protobuf.Empty` is usually not part of the request
    let empty = DescriptorProto {
        name: Some("Empty".to_string()),
        ..Default::default()
    };

    for (kind, method) in &pending.methods {
        let input = index
            .message(&method.input.full_name)
            .ok_or_else(|| format!("request `{}` not found", method.input.full_name))?;
        let output = match index.message(&method.output.full_name) {
            Some(output) => output,
            None if method.output.full_name == EMPTY => &empty,
            None => return Err(format!("response `{}` not found", method.output.full_name)),
        };

        let request = request_shape(*kind, input, &entity)?;
        let response = response_shape(*kind, output, &method.output.full_name, &full_name)?;
        entity.methods.insert(
            *kind,
            CrudMethod {
                method: method.clone(),
                request,
                response,
            },
        );
    }

    Ok(entity)
}

fn request_shape(
    kind: MethodKind,
    input: &DescriptorProto,
    entity: &Entity,
) -> Result<RequestShape, String> {
    let mut shape = RequestShape::default();

    for descriptor in &input.field {
        let name = descriptor.name();
        let is_string = descriptor.r#type() == Type::String && descriptor.label() != Label::Repeated;
        match name {
            ID_COLUMN => shape.has_id = is_string,
            "created_by" if kind == MethodKind::Create && is_string => {
                shape.audit_by = Some(descriptor.proto3_optional());
            }
            "updated_by" if kind == MethodKind::Update && is_string => {
                shape.audit_by = Some(descriptor.proto3_optional());
            }
            _ if descriptor.r#type() == Type::Message
                && descriptor.label() != Label::Repeated
                && descriptor.type_name().ends_with(SEARCH_REQUEST) =>
            {
                shape.search_field = Some(name.to_string());
            }
            _ if is_audit_column(name) => {}
            _ => match convert_field(descriptor) {
                Ok(field) => shape.fields.push(field),
                Err(reason) => {
                    tracing::debug!(request = input.name(), %reason, "ignoring request field");
                }
            },
        }
    }

    if matches!(kind, MethodKind::Get | MethodKind::Update | MethodKind::Delete) && !shape.has_id {
        return Err(format!("`{}` has no string `id` field", input.name()));
    }

    if matches!(kind, MethodKind::Create | MethodKind::Update) {
        for field in &shape.fields {
            if let Some(target) = entity.fields.iter().find(|f| f.name == field.name) {
                if target.field_type != field.field_type {
                    return Err(format!(
                        "`{}.{}` does not match the type of `{}.{}`",
                        input.name(),
                        field.name,
                        entity.name,
                        field.name
                    ));
                }
            }
        }
    }

    Ok(shape)
}

fn response_shape(
    kind: MethodKind,
    output: &DescriptorProto,
    output_name: &str,
    entity_name: &str,
) -> Result<ResponseShape, String> {
    let mut shape = ResponseShape::default();

    // `rpc GetUser(GetUserRequest) returns (User)`
    if output_name == entity_name
        && matches!(kind, MethodKind::Create | MethodKind::Get | MethodKind::Update)
    {
        return Ok(shape);
    }

    let wants_repeated = kind == MethodKind::List;
    for descriptor in &output.field {
        let name = descriptor.name();
        let is_entity = descriptor.r#type() == Type::Message
            && descriptor.type_name() == entity_name
            && (descriptor.label() == Label::Repeated) == wants_repeated;

        if is_entity && shape.entity_field.is_none() {
            shape.entity_field = Some(name.to_string());
            continue;
        }
        match (name, integer_type(descriptor)) {
            ("total", Some(ty)) => shape.total = Some(ty),
            ("page", Some(ty)) => shape.page = Some(ty),
            ("page_size", Some(ty)) => shape.page_size = Some(ty),
            ("success", _)
                if descriptor.r#type() == Type::Bool && descriptor.label() != Label::Repeated =>
            {
                shape.success = true;
            }
            _ => shape.has_other_fields = true,
        }
    }

    if shape.entity_field.is_none() && kind != MethodKind::Delete {
        return Err(format!(
            "response `{}` carries no `{}` field",
            output.name(),
            entity_name.rsplit('.').next().unwrap_or(entity_name)
        ));
    }

    Ok(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use prost_types::{
        EnumValueDescriptorProto, MethodDescriptorProto, ServiceDescriptorProto,
    };

    fn field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            label: Some(Label::Optional as i32),
            r#type: Some(ty as i32),
            ..Default::default()
        }
    }

    fn typed(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
        FieldDescriptorProto {
            type_name: Some(type_name.to_string()),
            ..field(name, number, ty)
        }
    }

    fn optional(mut f: FieldDescriptorProto) -> FieldDescriptorProto {
        f.proto3_optional = Some(true);
        f
    }

    fn repeated(mut f: FieldDescriptorProto) -> FieldDescriptorProto {
        f.label = Some(Label::Repeated as i32);
        f
    }

    fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
        DescriptorProto {
            name: Some(name.to_string()),
            field: fields,
            ..Default::default()
        }
    }

    fn rpc(name: &str, input: &str, output: &str) -> MethodDescriptorProto {
        MethodDescriptorProto {
            name: Some(name.to_string()),
            input_type: Some(format!(".shop.{input}")),
            output_type: Some(format!(".shop.{output}")),
            ..Default::default()
        }
    }

    fn product_file(methods: Vec<MethodDescriptorProto>) -> FileDescriptorProto {
        let status = EnumDescriptorProto {
            name: Some("ProductStatus".to_string()),
            value: vec![
                EnumValueDescriptorProto {
                    name: Some("PRODUCT_STATUS_DRAFT".to_string()),
                    number: Some(0),
                    ..Default::default()
                },
                EnumValueDescriptorProto {
                    name: Some("PRODUCT_STATUS_PUBLISHED".to_string()),
                    number: Some(1),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        FileDescriptorProto {
            name: Some("shop.proto".to_string()),
            package: Some("shop".to_string()),
            message_type: vec![
                message(
                    "Product",
                    vec![
                        field("id", 1, Type::String),
                        field("title", 2, Type::String),
                        optional(field("note", 3, Type::String)),
                        typed("status", 4, Type::Enum, ".shop.ProductStatus"),
                        typed("created_at", 5, Type::Message, TIMESTAMP),
                        field("created_by", 6, Type::String),
                    ],
                ),
                message(
                    "CreateProductRequest",
                    vec![
                        field("title", 1, Type::String),
                        optional(field("note", 2, Type::String)),
                        typed("status", 3, Type::Enum, ".shop.ProductStatus"),
                        field("created_by", 4, Type::String),
                    ],
                ),
                message(
                    "CreateProductResponse",
                    vec![typed("product", 1, Type::Message, ".shop.Product")],
                ),
                message("GetProductRequest", vec![field("id", 1, Type::String)]),
                message(
                    "ListProductsRequest",
                    vec![typed("search", 1, Type::Message, ".common.SearchRequest")],
                ),
                message(
                    "ListProductsResponse",
                    vec![
                        repeated(typed("products", 1, Type::Message, ".shop.Product")),
                        field("total", 2, Type::Int32),
                        field("page", 3, Type::Int32),
                        field("page_size", 4, Type::Int32),
                    ],
                ),
                message("DeleteProductRequest", vec![field("id", 1, Type::String)]),
                message("DeleteProductResponse", vec![field("success", 1, Type::Bool)]),
            ],
            enum_type: vec![status],
            service: vec![ServiceDescriptorProto {
                name: Some("ShopService".to_string()),
                method: methods,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn parse_one(file: FileDescriptorProto) -> Schema {
        parse(&[file], &["shop.proto".to_string()]).unwrap()
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("Faculties"), "Faculty");
        assert_eq!(singularize("Classes"), "Class");
        assert_eq!(singularize("Users"), "User");
        assert_eq!(singularize("Staff"), "Staff");
        assert_eq!(singularize("s"), "s");
    }

    #[test]
    fn test_strip_by_suffix() {
        assert_eq!(strip_by_suffix("UsersByStatus"), "Users");
        assert_eq!(strip_by_suffix("Bylaws"), "Bylaws");
        assert_eq!(strip_by_suffix("Users"), "Users");
        assert_eq!(strip_by_suffix("Nearby"), "Nearby");
    }

    #[test]
    fn test_storage_name() {
        assert_eq!(storage_name("USER_STATUS_ACTIVE", "USER_STATUS_"), "active");
        assert_eq!(storage_name("IN_PROGRESS", "TASK_STATE_"), "in_progress");
        assert_eq!(storage_name("USER_STATUS_", "USER_STATUS_"), "user_status_");
    }

    #[test]
    fn test_parses_entity_fields_and_audit() {
        let schema = parse_one(product_file(vec![rpc(
            "GetProduct",
            "GetProductRequest",
            "Product",
        )]));
        assert!(schema.failures.is_empty(), "{:?}", schema.failures);

        let product = &schema.entities[0];
        assert_eq!(product.name, "Product");
        assert_eq!(product.table, "Product");
        let names: Vec<&str> = product.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["title", "note", "status"]);
        assert!(product.fields[1].is_optional);
        assert_eq!(product.audit.created_at, Some(true));
        assert_eq!(product.audit.created_by, Some(false));
        assert_eq!(product.audit.updated_by, None);

        let status = &product.enums[".shop.ProductStatus"];
        assert_eq!(status.rust_path, "ProductStatus");
        assert_eq!(status.variants[1].storage, "published");
    }

    #[test]
    fn test_binds_methods_and_shapes() {
        let schema = parse_one(product_file(vec![
            rpc("CreateProduct", "CreateProductRequest", "CreateProductResponse"),
            rpc("ListProducts", "ListProductsRequest", "ListProductsResponse"),
            rpc("DeleteProduct", "DeleteProductRequest", "DeleteProductResponse"),
        ]));
        let product = &schema.entities[0];
        assert!(!product.is_crud_complete());
        assert_eq!(product.missing_methods(), vec![MethodKind::Get, MethodKind::Update]);

        let create = product.method(MethodKind::Create).unwrap();
        assert_eq!(create.request.audit_by, Some(false));
        assert_eq!(create.request.fields.len(), 3);
        assert_eq!(create.response.entity_field.as_deref(), Some("product"));

        let list = product.method(MethodKind::List).unwrap();
        assert_eq!(list.request.search_field.as_deref(), Some("search"));
        assert_eq!(list.response.entity_field.as_deref(), Some("products"));
        assert_eq!(list.response.total, Some(ScalarType::Int32));

        let delete = product.method(MethodKind::Delete).unwrap();
        assert!(delete.response.success);
        assert!(delete.response.entity_field.is_none());

        let service = &schema.services[0];
        assert_eq!(service.bindings["ListProducts"], "Product");
        assert_eq!(service.methods.len(), 3);
    }

    #[test]
    fn test_missing_entity_is_a_failure() {
        let schema = parse_one(product_file(vec![
            rpc("GetProduct", "GetProductRequest", "Product"),
            rpc("GetWidget", "GetProductRequest", "Product"),
        ]));
        assert_eq!(schema.entities.len(), 1);
        assert_eq!(schema.failures.len(), 1);
        assert_eq!(schema.failures[0].entity, "Widget");
        assert!(!schema.services[0].bindings.contains_key("GetWidget"));
    }

    #[test]
    fn test_unsupported_field_fails_only_that_entity() {
        let mut file = product_file(vec![
            rpc("GetProduct", "GetProductRequest", "Product"),
            rpc("GetTag", "GetProductRequest", "Tag"),
        ]);
        file.message_type.push(message(
            "Tag",
            vec![
                field("id", 1, Type::String),
                repeated(field("labels", 2, Type::String)),
            ],
        ));

        let schema = parse_one(file);
        assert_eq!(schema.entities.len(), 1);
        assert_eq!(
            schema.failures,
            vec![GenerationFailure::new("Tag", "repeated field `labels` is not supported")]
        );
    }

    #[test]
    fn test_lookup_methods_are_not_crud() {
        let schema = parse_one(product_file(vec![
            rpc("GetProduct", "GetProductRequest", "Product"),
            rpc("GetProductByTitle", "GetProductRequest", "Product"),
            rpc("Archive", "GetProductRequest", "Product"),
        ]));
        let service = &schema.services[0];
        assert_eq!(service.methods[1].kind, None);
        assert_eq!(service.methods[2].kind, None);
        assert_eq!(service.bindings.len(), 1);
    }

    #[test]
    fn test_request_type_mismatch_is_a_failure() {
        let mut file = product_file(vec![rpc(
            "CreateProduct",
            "CreateProductRequest",
            "CreateProductResponse",
        )]);
        file.message_type[1].field[0] = field("title", 1, Type::Int32);

        let schema = parse_one(file);
        assert!(schema.entities.is_empty());
        assert_eq!(schema.failures[0].entity, "Product");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = parse(&[], &["nope.proto".to_string()]).unwrap_err();
        assert!(matches!(err, GeneratorError::MissingFile(_)));
    }
}
