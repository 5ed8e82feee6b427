//! Recognized filter-operator vocabulary, shared by the filters traversal
//! driver and the query param converter.

/// Operators combining sub-filters.
pub const LOGICAL_OPERATORS: &[&str] = &["$and", "$or", "$not"];

/// Operators comparing an attribute against one or more values.
pub const COMPARISON_OPERATORS: &[&str] = &[
    "$eq",
    "$eqi",
    "$ne",
    "$nei",
    "$in",
    "$notIn",
    "$lt",
    "$lte",
    "$gt",
    "$gte",
    "$between",
    "$contains",
    "$notContains",
    "$containsi",
    "$notContainsi",
    "$startsWith",
    "$endsWith",
    "$null",
    "$notNull",
];

/// Whether `key` combines sub-filters.
#[must_use]
pub fn is_logical_operator(key: &str) -> bool {
    LOGICAL_OPERATORS.contains(&key)
}

/// Whether `key` is any recognized filter operator.
#[must_use]
pub fn is_operator(key: &str) -> bool {
    LOGICAL_OPERATORS.contains(&key) || COMPARISON_OPERATORS.contains(&key)
}
