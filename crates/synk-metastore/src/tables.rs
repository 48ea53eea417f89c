//! Redb table definitions for persistent metadata storage.

use redb::TableDefinition;

// Key: (namespace, id), Value: encoded timestampMeta data string
pub const META_ROWS: TableDefinition<(&str, &str), &str> = TableDefinition::new("meta_rows");
