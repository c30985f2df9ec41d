//! Field classifier
//!
//! Assigns every writable field of an entity a [`FieldState`] for create and
//! for update, and derives the SQL fragments and scan targets the renderer
//! needs. Audit columns never appear here; they form the fixed tail of the
//! select list. Timestamp fields are stored only through `NOW()` and are
//! skipped entirely.

use std::collections::BTreeSet;

use heck::{ToShoutySnakeCase, ToSnakeCase};

use crate::model::{AUDIT_TAIL, Entity, Field, FieldType, ID_COLUMN, MethodKind, ScalarType};

/// How one field takes part in an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// Must be present; textual values are checked for emptiness
    Required,
    /// Written only when the request carries it
    Optional,
    /// Written on every call, with the type's default when absent
    AlwaysIncluded,
    /// Not in the request message
    Excluded,
}

/// Storage shape of a selected column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnShape {
    /// Boolean
    Bool,
    /// Signed integer
    Int,
    /// Unsigned integer
    UInt,
    /// Floating point
    Float,
    /// Text; also enum storage strings
    Text,
    /// Binary
    Bytes,
    /// Date and time
    Timestamp,
}

impl ColumnShape {
    fn of(field_type: &FieldType) -> Self {
        match field_type {
            FieldType::Enum(_) => ColumnShape::Text,
            FieldType::Timestamp => ColumnShape::Timestamp,
            FieldType::Scalar(scalar) => match scalar {
                ScalarType::Bool => ColumnShape::Bool,
                ScalarType::Int32 | ScalarType::Int64 => ColumnShape::Int,
                ScalarType::UInt32 | ScalarType::UInt64 => ColumnShape::UInt,
                ScalarType::Float | ScalarType::Double => ColumnShape::Float,
                ScalarType::String => ColumnShape::Text,
                ScalarType::Bytes => ColumnShape::Bytes,
            },
        }
    }
}

/// A writable field with its per-operation states
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedField {
    /// The entity field
    pub field: Field,
    /// Role in create
    pub create: FieldState,
    /// Role in update
    pub update: FieldState,
    /// The update request declares the field `optional`
    pub update_optional: bool,
}

impl ClassifiedField {
    /// Name of the codec constant for enum fields, e.g. `USER_STATUS`
    pub fn codec(&self, entity: &Entity) -> Option<String> {
        codec_name(entity, self.field.enum_type_name()?)
    }
}

fn path_constant(rust_path: &str) -> String {
    rust_path.replace("::", "_").to_shouty_snake_case()
}

/// Codec constant for one of the entity's enums
///
/// Nested enums carry their parent's name (`ORDER_STATUS`). Two enums whose
/// Rust paths still collide, as in different packages, are named after their
/// full proto name instead.
pub fn codec_name(entity: &Entity, enum_name: &str) -> Option<String> {
    let def = entity.enums.get(enum_name)?;
    let name = path_constant(&def.rust_path);
    let collides = entity
        .enums
        .iter()
        .any(|(other, d)| other != enum_name && path_constant(&d.rust_path) == name);
    if collides {
        Some(enum_name.trim_start_matches('.').replace('.', "_").to_shouty_snake_case())
    } else {
        Some(name)
    }
}

/// Local name for an enum's raw column that no entity field or earlier holder uses
fn holder_name(field: &Field, taken: &mut BTreeSet<String>) -> String {
    let base = format!("{}_str", field.name.to_snake_case());
    let mut holder = base.clone();
    let mut n = 2;
    while taken.contains(&holder) {
        holder = format!("{base}_{n}");
        n += 1;
    }
    taken.insert(holder.clone());
    holder
}

/// Where one selected column lands when a row is decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    /// Bound straight into the entity slot
    Slot {
        /// Entity field receiving the column
        field: Field,
    },
    /// Bound to a transient string, then decoded through the enum codec;
    /// `holder` is already a snake case identifier
    EnumHolder {
        /// Entity field receiving the decoded number
        field: Field,
        /// Local holding the storage string
        holder: String,
        /// Codec constant used to decode it
        codec: String,
    },
    /// An audit column; `declared` is the entity field's optionality, `None`
    /// when the entity does not declare it
    Audit {
        /// Column name
        column: &'static str,
        /// Storage shape
        shape: ColumnShape,
        /// Optionality of the entity field, if declared
        declared: Option<bool>,
    },
}

impl ScanTarget {
    /// Storage shape of the selected column
    pub fn shape(&self) -> ColumnShape {
        match self {
            ScanTarget::Slot { field } => ColumnShape::of(&field.field_type),
            ScanTarget::EnumHolder { .. } => ColumnShape::Text,
            ScanTarget::Audit { shape, .. } => *shape,
        }
    }
}

/// Classifier output for one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Writable fields, in declaration order
    pub fields: Vec<ClassifiedField>,
    /// Non-audit timestamp fields; left at their defaults on read
    pub skipped: Vec<String>,
    /// Comma-separated writable columns
    pub create_fields_sql: String,
    /// One `?` per writable column
    pub create_placeholders: String,
    /// `id`, the writable columns, then the audit tail
    pub select_fields_sql: String,
    /// `id` first, then the writable fields, then the audit tail
    pub scan_targets: Vec<ScanTarget>,
    /// Fields a create request must carry
    pub required_fields: Vec<String>,
    /// Fields a create request may omit
    pub optional_fields: Vec<String>,
    /// Columns a list request may filter or sort on
    pub filterable: Vec<String>,
}

impl Classification {
    /// Shape of every selected column, in select order
    pub fn row_shape(&self) -> Vec<ColumnShape> {
        self.scan_targets.iter().map(ScanTarget::shape).collect()
    }

    /// Required fields that are validated as non-empty
    pub fn validated<'a>(&'a self) -> impl Iterator<Item = &'a ClassifiedField> + 'a {
        self.fields.iter().filter(|f| {
            f.create == FieldState::Required && f.field.scalar().is_some_and(ScalarType::is_textual)
        })
    }
}

fn create_state(field: &Field, request: Option<&Field>) -> FieldState {
    match request {
        None => FieldState::Excluded,
        Some(r) if r.is_optional => FieldState::Optional,
        Some(_) if field.is_enum() => FieldState::AlwaysIncluded,
        Some(_) => FieldState::Required,
    }
}

fn update_state(field: &Field, request: Option<&Field>) -> FieldState {
    match request {
        None => FieldState::Excluded,
        Some(_) if field.is_enum() => FieldState::AlwaysIncluded,
        Some(r) if r.is_optional => FieldState::Optional,
        Some(_) => FieldState::AlwaysIncluded,
    }
}

/// Classify an entity's fields against its create and update requests
pub fn classify(entity: &Entity) -> Classification {
    let create_request = entity.method(MethodKind::Create).map(|m| &m.request);
    let update_request = entity.method(MethodKind::Update).map(|m| &m.request);

    let mut fields = Vec::new();
    let mut skipped = Vec::new();
    for field in &entity.fields {
        if field.is_timestamp() {
            skipped.push(field.name.clone());
            continue;
        }
        let in_create = create_request.and_then(|r| r.field(&field.name));
        let in_update = update_request.and_then(|r| r.field(&field.name));
        fields.push(ClassifiedField {
            field: field.clone(),
            create: create_state(field, in_create),
            update: update_state(field, in_update),
            update_optional: in_update.is_some_and(|f| f.is_optional),
        });
    }

    let columns: Vec<&str> = fields.iter().map(|f| f.field.db_column.as_str()).collect();
    let create_fields_sql = columns.join(", ");
    let create_placeholders = vec!["?"; columns.len()].join(", ");

    let mut select = vec![ID_COLUMN];
    select.extend(&columns);
    select.extend(AUDIT_TAIL);
    let select_fields_sql = select.join(", ");

    let mut taken: BTreeSet<String> = entity.fields.iter().map(|f| f.name.to_snake_case()).collect();
    let mut scan_targets = vec![ScanTarget::Audit {
        column: ID_COLUMN,
        shape: ColumnShape::Text,
        declared: Some(false),
    }];
    for classified in &fields {
        let field = classified.field.clone();
        let target = match classified.codec(entity) {
            Some(codec) => ScanTarget::EnumHolder {
                holder: holder_name(&field, &mut taken),
                field,
                codec,
            },
            None => ScanTarget::Slot { field },
        };
        scan_targets.push(target);
    }
    for column in AUDIT_TAIL {
        let shape = if column.ends_with("_at") {
            ColumnShape::Timestamp
        } else {
            ColumnShape::Text
        };
        scan_targets.push(ScanTarget::Audit {
            column,
            shape,
            declared: entity.audit.get(column),
        });
    }

    let names_in = |state: FieldState| -> Vec<String> {
        fields
            .iter()
            .filter(|f| f.create == state)
            .map(|f| f.field.name.clone())
            .collect()
    };
    let required_fields = names_in(FieldState::Required);
    let optional_fields = names_in(FieldState::Optional);

    // Every stored non-timestamp column
    let mut filterable = vec![ID_COLUMN.to_string()];
    filterable.extend(columns.iter().map(|c| c.to_string()));
    filterable.extend(
        AUDIT_TAIL
            .iter()
            .filter(|c| c.ends_with("_by"))
            .map(|c| c.to_string()),
    );

    Classification {
        create_fields_sql,
        create_placeholders,
        select_fields_sql,
        scan_targets,
        required_fields,
        optional_fields,
        filterable,
        skipped,
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AuditFields, CrudMethod, EnumDef, EnumVariant, Method, RequestShape, ResponseShape, TypeRef,
    };
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn plain(name: &str, scalar: ScalarType, is_optional: bool) -> Field {
        Field {
            name: name.to_string(),
            db_column: name.to_string(),
            field_type: FieldType::Scalar(scalar),
            is_optional,
        }
    }

    fn status(is_optional: bool) -> Field {
        Field {
            name: "status".to_string(),
            db_column: "status".to_string(),
            field_type: FieldType::Enum(".user.UserStatus".to_string()),
            is_optional,
        }
    }

    fn crud_method(kind: MethodKind, fields: Vec<Field>) -> CrudMethod {
        let type_ref = TypeRef {
            full_name: String::new(),
            package: "user".to_string(),
            rust_path: String::new(),
        };
        CrudMethod {
            method: Method {
                name: format!("{}User", kind.prefix()),
                kind: Some(kind),
                input: type_ref.clone(),
                output: type_ref,
                client_streaming: false,
                server_streaming: false,
            },
            request: RequestShape {
                fields,
                has_id: kind != MethodKind::Create,
                ..Default::default()
            },
            response: ResponseShape::default(),
        }
    }

    fn user() -> Entity {
        let mut methods = BTreeMap::new();
        methods.insert(
            MethodKind::Create,
            crud_method(
                MethodKind::Create,
                vec![
                    plain("name", ScalarType::String, false),
                    plain("email", ScalarType::String, true),
                    status(false),
                    plain("age", ScalarType::Int32, false),
                ],
            ),
        );
        methods.insert(
            MethodKind::Update,
            crud_method(
                MethodKind::Update,
                vec![
                    plain("name", ScalarType::String, true),
                    status(true),
                    plain("age", ScalarType::Int32, false),
                ],
            ),
        );

        let mut enums = BTreeMap::new();
        enums.insert(
            ".user.UserStatus".to_string(),
            EnumDef {
                full_name: ".user.UserStatus".to_string(),
                rust_path: "UserStatus".to_string(),
                variants: vec![EnumVariant {
                    name: "USER_STATUS_ACTIVE".to_string(),
                    number: 0,
                    storage: "active".to_string(),
                }],
            },
        );

        Entity {
            name: "User".to_string(),
            package: "user".to_string(),
            table: "User".to_string(),
            fields: vec![
                plain("name", ScalarType::String, false),
                plain("email", ScalarType::String, true),
                status(false),
                plain("age", ScalarType::Int32, false),
                Field {
                    name: "birthday".to_string(),
                    db_column: "birthday".to_string(),
                    field_type: FieldType::Timestamp,
                    is_optional: true,
                },
                plain("nickname", ScalarType::String, true),
            ],
            audit: AuditFields {
                created_at: Some(true),
                updated_at: Some(true),
                created_by: Some(false),
                updated_by: None,
            },
            methods,
            enums,
        }
    }

    fn states(c: &Classification) -> Vec<(&str, FieldState, FieldState)> {
        c.fields
            .iter()
            .map(|f| (f.field.name.as_str(), f.create, f.update))
            .collect()
    }

    #[test]
    fn test_field_states() {
        let c = classify(&user());
        assert_eq!(
            states(&c),
            vec![
                ("name", FieldState::Required, FieldState::Optional),
                ("email", FieldState::Optional, FieldState::Excluded),
                ("status", FieldState::AlwaysIncluded, FieldState::AlwaysIncluded),
                ("age", FieldState::Required, FieldState::AlwaysIncluded),
                ("nickname", FieldState::Excluded, FieldState::Excluded),
            ]
        );
        assert_eq!(c.skipped, vec!["birthday"]);
        assert!(c.fields[2].update_optional);
    }

    #[test]
    fn test_sql_fragments() {
        let c = classify(&user());
        assert_eq!(c.create_fields_sql, "name, email, status, age, nickname");
        assert_eq!(c.create_placeholders, "?, ?, ?, ?, ?");
        assert_eq!(
            c.select_fields_sql,
            "id, name, email, status, age, nickname, created_at, updated_at, created_by, updated_by"
        );
        assert_eq!(
            c.filterable,
            vec!["id", "name", "email", "status", "age", "nickname", "created_by", "updated_by"]
        );
    }

    #[test]
    fn test_required_and_optional_partition() {
        let c = classify(&user());
        assert_eq!(c.required_fields, vec!["name", "age"]);
        assert_eq!(c.optional_fields, vec!["email"]);
        assert!(c.required_fields.iter().all(|r| !c.optional_fields.contains(r)));
        assert!(!c.required_fields.contains(&"status".to_string()));

        let validated: Vec<&str> = c.validated().map(|f| f.field.name.as_str()).collect();
        assert_eq!(validated, vec!["name"]);
    }

    #[test]
    fn test_scan_targets() {
        let c = classify(&user());
        assert_eq!(c.scan_targets.len(), 10);
        assert!(matches!(
            &c.scan_targets[0],
            ScanTarget::Audit { column: "id", .. }
        ));
        match &c.scan_targets[3] {
            ScanTarget::EnumHolder { holder, codec, .. } => {
                assert_eq!(holder, "status_str");
                assert_eq!(codec, "USER_STATUS");
            }
            other => panic!("expected enum holder, got {other:?}"),
        }
        assert!(matches!(
            &c.scan_targets[9],
            ScanTarget::Audit {
                column: "updated_by",
                declared: None,
                ..
            }
        ));
        assert_eq!(
            c.row_shape(),
            vec![
                ColumnShape::Text,
                ColumnShape::Text,
                ColumnShape::Text,
                ColumnShape::Text,
                ColumnShape::Int,
                ColumnShape::Text,
                ColumnShape::Timestamp,
                ColumnShape::Timestamp,
                ColumnShape::Text,
                ColumnShape::Text,
            ]
        );
    }

    fn enum_def(full_name: &str, rust_path: &str) -> EnumDef {
        EnumDef {
            full_name: full_name.to_string(),
            rust_path: rust_path.to_string(),
            variants: vec![],
        }
    }

    fn enum_field(name: &str, type_name: &str) -> Field {
        Field {
            name: name.to_string(),
            db_column: name.to_string(),
            field_type: FieldType::Enum(type_name.to_string()),
            is_optional: false,
        }
    }

    fn holders(c: &Classification) -> Vec<(&str, &str)> {
        c.scan_targets
            .iter()
            .filter_map(|t| match t {
                ScanTarget::EnumHolder { field, holder, .. } => {
                    Some((field.name.as_str(), holder.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_enum_holder_avoids_field_names() {
        let mut entity = user();
        entity.fields.push(plain("status_str", ScalarType::String, false));
        entity.fields.push(plain("status_str_2", ScalarType::String, false));
        let c = classify(&entity);

        assert_eq!(holders(&c), vec![("status", "status_str_3")]);
        assert!(c.scan_targets.iter().any(|t| matches!(
            t,
            ScanTarget::Slot { field } if field.name == "status_str"
        )));
    }

    #[test]
    fn test_enum_holders_are_distinct() {
        let mut entity = user();
        entity.fields = vec![
            enum_field("kind", ".shop.Kind"),
            enum_field("kindStr", ".shop.Kind"),
        ];
        entity.enums.insert(".shop.Kind".to_string(), enum_def(".shop.Kind", "Kind"));
        let c = classify(&entity);
        assert_eq!(
            holders(&c),
            vec![("kind", "kind_str_2"), ("kindStr", "kind_str_str")]
        );
    }

    #[test]
    fn test_codec_names_follow_the_rust_path() {
        let mut entity = user();
        entity.fields = vec![
            enum_field("status", ".shop.Status"),
            enum_field("order_status", ".shop.Order.Status"),
        ];
        entity.enums.clear();
        entity.enums.insert(".shop.Status".to_string(), enum_def(".shop.Status", "Status"));
        entity.enums.insert(
            ".shop.Order.Status".to_string(),
            enum_def(".shop.Order.Status", "order::Status"),
        );
        let c = classify(&entity);
        let codecs: Vec<Option<String>> = c.fields.iter().map(|f| f.codec(&entity)).collect();
        assert_eq!(
            codecs,
            vec![Some("STATUS".to_string()), Some("ORDER_STATUS".to_string())]
        );
    }

    #[test]
    fn test_codec_names_for_same_path_in_other_packages() {
        let mut entity = user();
        entity.enums.clear();
        entity.enums.insert(".a.Status".to_string(), enum_def(".a.Status", "Status"));
        entity.enums.insert(".b.Status".to_string(), enum_def(".b.Status", "Status"));
        assert_eq!(codec_name(&entity, ".a.Status").as_deref(), Some("A_STATUS"));
        assert_eq!(codec_name(&entity, ".b.Status").as_deref(), Some("B_STATUS"));
        assert_eq!(codec_name(&entity, ".c.Status"), None);
    }

    #[test]
    fn test_entity_without_requests() {
        let mut entity = user();
        entity.methods.clear();
        let c = classify(&entity);
        assert!(c.fields.iter().all(|f| f.create == FieldState::Excluded));
        assert!(c.required_fields.is_empty());
        assert!(c.optional_fields.is_empty());
    }
}
