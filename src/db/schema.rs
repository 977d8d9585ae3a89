pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    pretty_name TEXT NOT NULL,
    color       TEXT NOT NULL DEFAULT '',
    position    INTEGER NOT NULL
);

-- Payee representative name -> category id. Deliberately no foreign key:
-- an assignment may outlive its category and resolves to "other" until
-- a category with that id exists again.
CREATE TABLE IF NOT EXISTS assignments (
    payee       TEXT PRIMARY KEY,
    category_id TEXT NOT NULL
);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];
