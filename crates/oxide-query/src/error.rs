//! Error types for expression and query compilation.

/// Errors that can occur while building or compiling a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// A field was rendered before being bound to a table.
    #[error("Unbound field '{0}': bind it to a table before using it in a query")]
    UnboundField(String),

    /// A positional `values` argument was not a field.
    #[error("Positional argument must be a field, got {0}")]
    InvalidPositional(String),

    /// The query references no table that is not explicitly joined.
    #[error("Query has no table to select from")]
    EmptyFrom,

    /// The query projects nothing.
    #[error("Query selects no values")]
    NoProjection,

    /// A template's slot count does not match its argument count.
    #[error("Template has {slots} slot(s) but {args} argument(s) were given")]
    ArgumentMismatch {
        /// Number of `{}` slots in the template.
        slots: usize,
        /// Number of arguments supplied.
        args: usize,
    },

    /// A field lookup on a table failed.
    #[error("Table '{table}' has no field '{field}'")]
    UnknownField {
        /// Table name.
        table: String,
        /// Requested field name.
        field: String,
    },
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
