//! Table declarations loaded from a JSON model file.
//!
//! The CLI has no access to tables declared in Rust code, so `make` reads
//! them from a file shaped like:
//!
//! ```json
//! [
//!   {
//!     "table": "users",
//!     "fields": [
//!       {"name": "email", "column_type": "text", "nullable": false, "unique": true},
//!       {"name": "created_at", "column_type": "timestamptz", "default": "now()"}
//!     ]
//!   }
//! ]
//! ```

use std::fs;
use std::path::Path;

use oxide_query::{Field, Table};
use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelField {
    /// Column name.
    pub name: String,
    /// SQL type.
    pub column_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary: bool,
    /// Default as a SQL expression, rendered verbatim.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub check: Option<String>,
}

const fn default_nullable() -> bool {
    true
}

impl ModelField {
    fn to_field(&self) -> Field {
        let mut field = Field::new(self.column_type.as_str()).nullable(self.nullable);
        if self.unique {
            field = field.unique();
        }
        if self.primary {
            field = field.primary();
        }
        if let Some(default) = &self.default {
            field = field.default_expr(default.as_str());
        }
        if let Some(check) = &self.check {
            field = field.check(check.as_str());
        }
        field
    }
}

/// One declared table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTable {
    /// Table name.
    pub table: String,
    /// Fields in declaration order. An `id` primary key is implied.
    #[serde(default)]
    pub fields: Vec<ModelField>,
}

impl ModelTable {
    /// Builds the declared table.
    #[must_use]
    pub fn to_table(&self) -> Table {
        self.fields
            .iter()
            .fold(Table::builder(self.table.as_str()), |builder, field| {
                builder.field(field.name.as_str(), field.to_field())
            })
            .build()
    }
}

/// Parses a model file's content.
pub fn parse_models(content: &str) -> serde_json::Result<Vec<Table>> {
    let models: Vec<ModelTable> = serde_json::from_str(content)?;
    Ok(models.iter().map(ModelTable::to_table).collect())
}

/// Reads table declarations from a model file.
///
/// # Errors
///
/// [`MigrateError::Io`] if the file cannot be read and
/// [`MigrateError::Parse`] if it is not a valid model file.
pub fn load_models(path: &Path) -> Result<Vec<Table>> {
    let content = fs::read_to_string(path)?;
    parse_models(&content).map_err(|e| MigrateError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
