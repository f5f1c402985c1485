//! Comparison operator execution

use runboard_core::{FilterOperator, Value};

/// Apply a comparison operator to a resolved field and a filter literal.
///
/// `field` is `None` when the run does not have the field. Regex matching is
/// handled by the compiled filter, so `=~` here always returns false.
pub fn compare(field: Option<&Value>, op: FilterOperator, literal: &Value) -> bool {
    let field = field.unwrap_or(&Value::Null);

    // Null comparisons: only equality is meaningful against missing data
    if field.is_null() || literal.is_null() {
        let both_null = field.is_null() && literal.is_null();
        return match op {
            FilterOperator::Eq => both_null,
            FilterOperator::Ne => !both_null,
            _ => false,
        };
    }

    match op {
        FilterOperator::Eq => values_equal(field, literal),
        FilterOperator::Ne => !values_equal(field, literal),
        FilterOperator::Lt | FilterOperator::Le | FilterOperator::Gt | FilterOperator::Ge => {
            let (Some(l), Some(r)) = (field.coerce_number(), literal.coerce_number()) else {
                return false;
            };
            match op {
                FilterOperator::Lt => l < r,
                FilterOperator::Le => l <= r,
                FilterOperator::Gt => l > r,
                FilterOperator::Ge => l >= r,
                _ => false,
            }
        }
        FilterOperator::Regex => false,
    }
}

/// Equality used by `=` and `!=`: identical values, numerically equal values,
/// or values with the same string form (`false` equals `"false"`).
pub fn values_equal(left: &Value, right: &Value) -> bool {
    if left == right {
        return true;
    }
    if let (Some(l), Some(r)) = (left.coerce_number(), right.coerce_number()) {
        return l == r;
    }
    left.to_string() == right.to_string()
}
