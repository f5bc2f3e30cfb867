//! Typed filter builder for document queries.
//!
//! # Responsibility
//! - Express the predicate shapes the repository needs (equality,
//!   strictly-greater-than, set membership, conjunction) as tagged variants.
//! - Render a compact summary for error context.
//!
//! # Invariants
//! - Filters are data only; each backend owns its own translation.
//! - `Filter::and` never nests a single-element conjunction.

use std::fmt::{Display, Formatter};

/// Query predicate over document fields.
///
/// Field names refer to top-level document attributes (`id`, `owner_id`,
/// `name`, ...). Values are compared with the store's native string
/// collation, which for ids means lexicographic byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// `field == value`.
    Equals { field: String, value: String },
    /// `field > value`, strict.
    GreaterThan { field: String, value: String },
    /// `field` is a member of `values`. Empty `values` matches nothing.
    In { field: String, values: Vec<String> },
    /// Conjunction of sub-filters.
    And(Vec<Filter>),
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn greater_than(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::GreaterThan {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::In {
            field: field.into(),
            values,
        }
    }

    /// Builds a conjunction, flattening the degenerate cases: no clauses
    /// means match-all, one clause means that clause itself.
    pub fn and(mut clauses: Vec<Filter>) -> Self {
        match clauses.len() {
            0 => Self::All,
            1 => clauses.remove(0),
            _ => Self::And(clauses),
        }
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "(all)"),
            Self::Equals { field, value } => write!(f, "{field} == {value:?}"),
            Self::GreaterThan { field, value } => write!(f, "{field} > {value:?}"),
            Self::In { field, values } => write!(f, "{field} in {values:?}"),
            Self::And(clauses) => {
                let mut first = true;
                for clause in clauses {
                    if !first {
                        write!(f, " and ")?;
                    }
                    write!(f, "{clause}")?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}
