//! Metadata model
//!
//! Plain data describing the entities found in a set of proto files. The
//! parser builds it once per run, the classifier and renderer only read it.

use std::collections::BTreeMap;

/// Audit columns every generated table carries, in select-list order after
/// the writable columns
pub const AUDIT_TAIL: [&str; 4] = ["created_at", "updated_at", "created_by", "updated_by"];

/// Name of the identity column
pub const ID_COLUMN: &str = "id";

/// Whether a field name is one of the audit columns
pub fn is_audit_column(name: &str) -> bool {
    name == ID_COLUMN || AUDIT_TAIL.contains(&name)
}

/// Scalar proto types that map onto a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// `bool`
    Bool,
    /// `int32`, `sint32` and `sfixed32`
    Int32,
    /// `int64`, `sint64` and `sfixed64`
    Int64,
    /// `uint32` and `fixed32`
    UInt32,
    /// `uint64` and `fixed64`
    UInt64,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `string`
    String,
    /// `bytes`
    Bytes,
}

impl ScalarType {
    /// Whether "present" means "non-empty" for this type
    pub fn is_textual(self) -> bool {
        matches!(self, ScalarType::String | ScalarType::Bytes)
    }
}

/// Semantic type of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// A single-column scalar
    Scalar(ScalarType),
    /// Fully-qualified enum type name, e.g. `.user.UserStatus`
    Enum(String),
    /// `google.protobuf.Timestamp`
    Timestamp,
}

/// One field of an entity or request message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Proto field name
    pub name: String,
    /// Storage column; the proto field name
    pub db_column: String,
    /// What the field holds
    pub field_type: FieldType,
    /// Declared `optional` (proto3 presence)
    pub is_optional: bool,
}

impl Field {
    /// Whether the field holds a proto enum
    pub fn is_enum(&self) -> bool {
        matches!(self.field_type, FieldType::Enum(_))
    }

    /// Whether the field is a `google.protobuf.Timestamp`
    pub fn is_timestamp(&self) -> bool {
        self.field_type == FieldType::Timestamp
    }

    /// Fully-qualified enum name of an enum field
    pub fn enum_type_name(&self) -> Option<&str> {
        match &self.field_type {
            FieldType::Enum(name) => Some(name),
            _ => None,
        }
    }

    /// Scalar type of a plain field
    pub fn scalar(&self) -> Option<ScalarType> {
        match self.field_type {
            FieldType::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

/// A proto enum with its storage strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    /// Fully-qualified name, e.g. `.user.UserStatus`
    pub full_name: String,
    /// Rust type path relative to the package module, e.g. `UserStatus`
    /// or `user::Status` for nested enums
    pub rust_path: String,
    /// Declaration order; the first is the default
    pub variants: Vec<EnumVariant>,
}

/// One value of a proto enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    /// Proto value name, e.g. `USER_STATUS_ACTIVE`
    pub name: String,
    /// Wire number
    pub number: i32,
    /// Lower-case storage string
    pub storage: String,
}

/// The five CRUD operations, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MethodKind {
    /// `Create<X>`
    Create,
    /// `Get<X>`
    Get,
    /// `Update<X>`
    Update,
    /// `Delete<X>`
    Delete,
    /// `List<X>s`
    List,
}

impl MethodKind {
    /// Every kind, in canonical order
    pub const ALL: [MethodKind; 5] = [
        MethodKind::Create,
        MethodKind::Get,
        MethodKind::Update,
        MethodKind::Delete,
        MethodKind::List,
    ];

    /// Method name prefix, e.g. `Create`
    pub fn prefix(self) -> &'static str {
        match self {
            MethodKind::Create => "Create",
            MethodKind::Get => "Get",
            MethodKind::Update => "Update",
            MethodKind::Delete => "Delete",
            MethodKind::List => "List",
        }
    }

    /// Infer the operation from a method name prefix
    ///
    /// The prefix must be followed by an upper-case letter, so `Getaway` is
    /// not a `Get`.
    pub fn from_method_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| {
            name.strip_prefix(kind.prefix())
                .and_then(|rest| rest.chars().next())
                .is_some_and(char::is_uppercase)
        })
    }
}

/// Fields of the response message the handler fills in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseShape {
    /// Field carrying the entity (repeated for list)
    pub entity_field: Option<String>,
    /// `total`, with its scalar type
    pub total: Option<ScalarType>,
    /// `page`, with its scalar type
    pub page: Option<ScalarType>,
    /// `page_size`, with its scalar type
    pub page_size: Option<ScalarType>,
    /// Boolean `success` field of delete responses
    pub success: bool,
    /// Whether the message has fields beyond the ones above
    pub has_other_fields: bool,
}

/// Fields of the request message the handler reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestShape {
    /// Non-audit fields, in declaration order
    pub fields: Vec<Field>,
    /// Has a string `id`
    pub has_id: bool,
    /// Name of the `common.SearchRequest` field, for list requests
    pub search_field: Option<String>,
    /// `created_by` / `updated_by`, and whether it is optional
    pub audit_by: Option<bool>,
}

impl RequestShape {
    /// Look a field up by proto name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A message type as prost names it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Fully-qualified proto name, e.g. `.user.CreateUserRequest`
    pub full_name: String,
    /// Proto package the type is declared in
    pub package: String,
    /// Path inside the package module, e.g. `CreateUserRequest` or `outer::Inner`
    pub rust_path: String,
}

/// One rpc method, CRUD or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// rpc name, e.g. `CreateUser`
    pub name: String,
    /// CRUD operation inferred from the name
    pub kind: Option<MethodKind>,
    /// Request message
    pub input: TypeRef,
    /// Response message
    pub output: TypeRef,
    /// `stream` on the request
    pub client_streaming: bool,
    /// `stream` on the response
    pub server_streaming: bool,
}

/// A CRUD method bound to its entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrudMethod {
    /// The rpc as declared
    pub method: Method,
    /// What the handler reads from the request
    pub request: RequestShape,
    /// What the handler fills in on the response
    pub response: ResponseShape,
}

/// Which audit fields the entity message declares, with their optionality
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFields {
    /// `created_at`
    pub created_at: Option<bool>,
    /// `updated_at`
    pub updated_at: Option<bool>,
    /// `created_by`
    pub created_by: Option<bool>,
    /// `updated_by`
    pub updated_by: Option<bool>,
}

impl AuditFields {
    /// Lookup by column name; `None` for undeclared or non-audit columns
    pub fn get(&self, column: &str) -> Option<bool> {
        match column {
            "created_at" => self.created_at,
            "updated_at" => self.updated_at,
            "created_by" => self.created_by,
            "updated_by" => self.updated_by,
            _ => None,
        }
    }
}

/// A domain object with CRUD semantics, backed by one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Message name, e.g. `User`
    pub name: String,
    /// Proto package, e.g. `user`
    pub package: String,
    /// Storage table; the message name
    pub table: String,
    /// Non-audit fields, in declaration order
    pub fields: Vec<Field>,
    /// Audit columns the message declares
    pub audit: AuditFields,
    /// Declared CRUD operations
    pub methods: BTreeMap<MethodKind, CrudMethod>,
    /// Enums referenced by the fields, keyed by full name
    pub enums: BTreeMap<String, EnumDef>,
}

impl Entity {
    /// All five operations are declared
    pub fn is_crud_complete(&self) -> bool {
        MethodKind::ALL.iter().all(|k| self.methods.contains_key(k))
    }

    /// The declared method for an operation
    pub fn method(&self, kind: MethodKind) -> Option<&CrudMethod> {
        self.methods.get(&kind)
    }

    /// Kinds that are not declared, for diagnostics
    pub fn missing_methods(&self) -> Vec<MethodKind> {
        MethodKind::ALL
            .into_iter()
            .filter(|k| !self.methods.contains_key(k))
            .collect()
    }
}

/// A service and the methods it declares, used to render the tonic impl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Service name, e.g. `UserService`
    pub name: String,
    /// Proto package
    pub package: String,
    /// In declaration order
    pub methods: Vec<Method>,
    /// Entity name per CRUD method name
    pub bindings: BTreeMap<String, String>,
}

impl Service {
    /// Whether any method streams; tonic impls are generated for unary services only
    pub fn has_streaming(&self) -> bool {
        self.methods
            .iter()
            .any(|m| m.client_streaming || m.server_streaming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_kind_from_name() {
        assert_eq!(MethodKind::from_method_name("CreateUser"), Some(MethodKind::Create));
        assert_eq!(MethodKind::from_method_name("GetUser"), Some(MethodKind::Get));
        assert_eq!(MethodKind::from_method_name("ListUsers"), Some(MethodKind::List));
        assert_eq!(MethodKind::from_method_name("DeleteUser"), Some(MethodKind::Delete));
        assert_eq!(MethodKind::from_method_name("Archive"), None);
        assert_eq!(MethodKind::from_method_name("Get"), None);
        assert_eq!(MethodKind::from_method_name("Getaway"), None);
    }

    #[test]
    fn test_audit_columns() {
        assert!(is_audit_column("id"));
        assert!(is_audit_column("updated_by"));
        assert!(!is_audit_column("name"));
    }

    #[test]
    fn test_field_type_flags() {
        let status = Field {
            name: "status".to_string(),
            db_column: "status".to_string(),
            field_type: FieldType::Enum(".user.UserStatus".to_string()),
            is_optional: false,
        };
        assert!(status.is_enum());
        assert!(!status.is_timestamp());
        assert_eq!(status.enum_type_name(), Some(".user.UserStatus"));
        assert_eq!(status.scalar(), None);
    }
}
