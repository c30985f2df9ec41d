//! Filter tree compilation
//!
//! Turns a nested tree of filter conditions into a parameterized SQL fragment
//! with positional `?` placeholders. Conditions on fields outside the supplied
//! whitelist are dropped, which keeps user input out of identifier positions.
//!
//! A fragment that places no constraint on the result ("always true") is
//! dropped from the groups that contain it, so the compiled clause never
//! carries `1=1` noise unless the caller compiles a lone trivial criterion.

use crate::proto;

/// Fragment produced by criteria that constrain nothing
pub const ALWAYS_TRUE: &str = "1=1";

/// Fragment produced by an `IN` over an empty value list
pub const NEVER_TRUE: &str = "1=0";

/// Comparison applied by a [`FilterCondition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanEqual,
    /// Substring match, `LIKE %value%`
    Like,
    /// Membership in the value list
    In,
    /// Absence from the value list
    NotIn,
    /// `IS NULL`, takes no value
    IsNull,
    /// `IS NOT NULL`, takes no value
    IsNotNull,
    /// Inclusive range over the first two values
    Between,
}

/// Boolean connective joining the children of a [`FilterGroup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Logic {
    /// Every child must hold
    #[default]
    And,
    /// Any child may hold
    Or,
}

impl Logic {
    fn keyword(self) -> &'static str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
        }
    }
}

/// A single comparison on one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCondition {
    /// Column name, checked against the whitelist
    pub field: String,
    /// Comparison
    pub operator: FilterOperator,
    /// Operands, in the order they are consumed
    pub values: Vec<String>,
}

impl FilterCondition {
    /// Create a condition
    pub fn new<I, S>(field: impl Into<String>, operator: FilterOperator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A group of criteria joined by one logical connective
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterGroup {
    /// Connective, `AND` unless set
    pub logic: Logic,
    /// Children, compiled left to right
    pub filters: Vec<FilterCriteria>,
}

/// One node of a filter tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterCriteria {
    /// A leaf comparison
    Condition(FilterCondition),
    /// A nested group
    Group(FilterGroup),
}

impl FilterCriteria {
    /// Shorthand for a condition node
    pub fn condition<I, S>(field: impl Into<String>, operator: FilterOperator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterCriteria::Condition(FilterCondition::new(field, operator, values))
    }

    /// Shorthand for a group node
    pub fn group(logic: Logic, filters: Vec<FilterCriteria>) -> Self {
        FilterCriteria::Group(FilterGroup { logic, filters })
    }

    /// Convert a wire criterion, dropping empty oneofs and unknown operators
    pub fn from_proto(criteria: proto::FilterCriteria) -> Option<Self> {
        match criteria.criteria? {
            proto::filter_criteria::Criteria::Condition(condition) => {
                let operator = FilterOperator::from_proto(condition.operator)?;
                Some(FilterCriteria::Condition(FilterCondition {
                    field: condition.field,
                    operator,
                    values: condition.values,
                }))
            }
            proto::filter_criteria::Criteria::Group(group) => {
                let logic = match proto::LogicalCondition::try_from(group.logic) {
                    Ok(proto::LogicalCondition::Or) => Logic::Or,
                    _ => Logic::And,
                };
                Some(FilterCriteria::Group(FilterGroup {
                    logic,
                    filters: group.filters.into_iter().filter_map(Self::from_proto).collect(),
                }))
            }
        }
    }
}

impl FilterOperator {
    fn from_proto(value: i32) -> Option<Self> {
        use proto::FilterOperator as Wire;

        let operator = match Wire::try_from(value).ok()? {
            Wire::Equal => FilterOperator::Equal,
            Wire::NotEqual => FilterOperator::NotEqual,
            Wire::GreaterThan => FilterOperator::GreaterThan,
            Wire::GreaterThanEqual => FilterOperator::GreaterThanEqual,
            Wire::LessThan => FilterOperator::LessThan,
            Wire::LessThanEqual => FilterOperator::LessThanEqual,
            Wire::Like => FilterOperator::Like,
            Wire::In => FilterOperator::In,
            Wire::NotIn => FilterOperator::NotIn,
            Wire::IsNull => FilterOperator::IsNull,
            Wire::IsNotNull => FilterOperator::IsNotNull,
            Wire::Between => FilterOperator::Between,
        };
        Some(operator)
    }
}

/// Output of the compiler: a clause without the `WHERE` keyword and its arguments
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompiledFilter {
    /// SQL fragment with `?` placeholders, without `WHERE`
    pub clause: String,
    /// One argument per placeholder, in order
    pub args: Vec<String>,
}

impl CompiledFilter {
    /// Whether the clause constrains nothing
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }

    /// The clause prefixed with `WHERE `, or an empty string
    pub fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clause)
        }
    }
}

/// Compile a top-level list of criteria
///
/// Surviving fragments are joined with `AND`. The clause is empty when nothing
/// survives, so callers prepend `WHERE` only for a non-empty result.
pub fn compile(criteria: &[FilterCriteria], whitelist: Option<&[&str]>) -> CompiledFilter {
    let mut args = Vec::new();
    let fragments: Vec<String> = criteria
        .iter()
        .filter_map(|c| compile_criteria(c, whitelist, &mut args))
        .collect();

    CompiledFilter {
        clause: fragments.join(" AND "),
        args,
    }
}

/// Compile a single criterion, yielding [`ALWAYS_TRUE`] when it constrains nothing
pub fn compile_one(criteria: &FilterCriteria, whitelist: Option<&[&str]>) -> CompiledFilter {
    let mut args = Vec::new();
    let clause = compile_criteria(criteria, whitelist, &mut args)
        .unwrap_or_else(|| ALWAYS_TRUE.to_string());
    CompiledFilter { clause, args }
}

// `None` stands for the always-true fragment.
fn compile_criteria(
    criteria: &FilterCriteria,
    whitelist: Option<&[&str]>,
    args: &mut Vec<String>,
) -> Option<String> {
    match criteria {
        FilterCriteria::Condition(condition) => {
            if let Some(allowed) = whitelist {
                if !allowed.contains(&condition.field.as_str()) {
                    return None;
                }
            }
            compile_condition(condition, args)
        }
        FilterCriteria::Group(group) => compile_group(group, whitelist, args),
    }
}

fn compile_group(
    group: &FilterGroup,
    whitelist: Option<&[&str]>,
    args: &mut Vec<String>,
) -> Option<String> {
    let mut fragments: Vec<String> = group
        .filters
        .iter()
        .filter_map(|c| compile_criteria(c, whitelist, args))
        .collect();

    match fragments.len() {
        0 => None,
        1 => fragments.pop(),
        _ => {
            let separator = format!(" {} ", group.logic.keyword());
            Some(format!("({})", fragments.join(&separator)))
        }
    }
}

fn compile_condition(condition: &FilterCondition, args: &mut Vec<String>) -> Option<String> {
    let field = &condition.field;
    let values = &condition.values;

    let comparison = |op: &str, args: &mut Vec<String>| {
        let value = values.first()?;
        args.push(value.clone());
        Some(format!("{field} {op} ?"))
    };

    match condition.operator {
        FilterOperator::Equal => comparison("=", args),
        FilterOperator::NotEqual => comparison("!=", args),
        FilterOperator::GreaterThan => comparison(">", args),
        FilterOperator::GreaterThanEqual => comparison(">=", args),
        FilterOperator::LessThan => comparison("<", args),
        FilterOperator::LessThanEqual => comparison("<=", args),
        FilterOperator::Like => {
            let value = values.first()?;
            args.push(format!("%{value}%"));
            Some(format!("{field} LIKE ?"))
        }
        // An empty selection matches nothing; excluding nothing matches everything
        FilterOperator::In if values.is_empty() => Some(NEVER_TRUE.to_string()),
        FilterOperator::NotIn if values.is_empty() => None,
        FilterOperator::In | FilterOperator::NotIn => {
            args.extend(values.iter().cloned());
            let placeholders = vec!["?"; values.len()].join(", ");
            let keyword = if condition.operator == FilterOperator::In {
                "IN"
            } else {
                "NOT IN"
            };
            Some(format!("{field} {keyword} ({placeholders})"))
        }
        FilterOperator::IsNull => Some(format!("{field} IS NULL")),
        FilterOperator::IsNotNull => Some(format!("{field} IS NOT NULL")),
        FilterOperator::Between => match values.as_slice() {
            [low, high, ..] => {
                args.push(low.clone());
                args.push(high.clone());
                Some(format!("{field} BETWEEN ? AND ?"))
            }
            _ => None,
        },
    }
}
