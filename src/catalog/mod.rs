// Schema collaborator.
//
// The full catalog (views, constraints, foreign keys, data types) is an
// out-of-scope external collaborator; what the rewriter needs is a single
// lookup, `schema(table) -> ordered attribute names`, exposed here as the
// `SchemaCatalog` trait so tests can supply fakes without depending on the
// in-memory `Catalog` below.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A column definition, trimmed to what schema lookups need.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DataType {
    Integer,
    BigInt,
    Float,
    Varchar(usize),
    Text,
    Boolean,
}

/// A table schema: an ordered list of columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// The schema-lookup collaborator the projection rewriter depends on.
///
/// `schema(table)` returns `None` when the table is unknown; the rewriter
/// surfaces this as `RewriteError::UnknownSchema` rather than treating an
/// empty attribute list and an unknown table the same way.
pub trait SchemaCatalog: Send + Sync {
    fn schema(&self, table: &str) -> Option<Vec<String>>;
}

/// In-memory catalog of table schemas.
#[derive(Clone)]
pub struct Catalog {
    schemas: Arc<RwLock<HashMap<String, Schema>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            schemas: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn create_table(&self, schema: Schema) {
        self.schemas.write().insert(schema.name.clone(), schema);
    }

    pub fn get_table(&self, name: &str) -> Option<Schema> {
        self.schemas.read().get(name).cloned()
    }

    pub fn drop_table(&self, name: &str) -> Option<Schema> {
        self.schemas.write().remove(name)
    }

    pub fn list_tables(&self) -> Vec<String> {
        self.schemas.read().keys().cloned().collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCatalog for Catalog {
    fn schema(&self, table: &str) -> Option<Vec<String>> {
        self.get_table(table).map(|s| s.attribute_names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_look_up_schema() {
        let catalog = Catalog::new();
        catalog.create_table(Schema::new(
            "users",
            vec![
                Column {
                    name: "id".to_string(),
                    data_type: DataType::Integer,
                    nullable: false,
                },
                Column {
                    name: "name".to_string(),
                    data_type: DataType::Varchar(255),
                    nullable: false,
                },
            ],
        ));

        assert_eq!(
            SchemaCatalog::schema(&catalog, "users"),
            Some(vec!["id".to_string(), "name".to_string()])
        );
        assert_eq!(SchemaCatalog::schema(&catalog, "missing"), None);
    }
}
