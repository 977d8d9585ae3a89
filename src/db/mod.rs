mod schema;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::models::Category;

/// The default category set, seeded on first run. Order is the display
/// order; ids of the built-ins are fixed because the default inference
/// table points at them.
const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("food", "Food", "#FF9933"),
    ("travel", "Travel", "#3399FF"),
    ("ATM", "ATM", "#FF3333"),
    ("living", "Living", "#FF6666"),
    ("income", "Income", "#33CC33"),
    ("freetime", "Free Time", "#9933FF"),
    ("other", "Other", "#999999"),
    ("transfer", "Transfers", "#666666"),
];

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_categories()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn seed_default_categories(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        for (position, (id, pretty_name, color)) in DEFAULT_CATEGORIES.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO categories (id, name, pretty_name, color, position)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, id, pretty_name, color, position as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, pretty_name, color FROM categories ORDER BY position",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                pretty_name: row.get(2)?,
                color: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_category(&self, id: &str) -> Result<Option<Category>> {
        let result = self.conn.query_row(
            "SELECT id, name, pretty_name, color FROM categories WHERE id = ?1",
            params![id],
            |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    pretty_name: row.get(2)?,
                    color: row.get(3)?,
                })
            },
        );
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a category. The id is derived from the name; creation fails
    /// on an empty name or when the derived id is already taken.
    pub(crate) fn add_category(
        &self,
        name: &str,
        pretty_name: &str,
        color: &str,
    ) -> Result<Category> {
        let category = Category::new(name, pretty_name, color);
        if category.id.is_empty() {
            anyhow::bail!("Category name cannot be empty");
        }
        if self.get_category(&category.id)?.is_some() {
            anyhow::bail!("Category '{}' already exists", category.id);
        }

        let position: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM categories",
            [],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO categories (id, name, pretty_name, color, position)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                category.id,
                category.name,
                category.pretty_name,
                category.color,
                position
            ],
        )?;
        Ok(category)
    }

    /// Remove a category. Rejected when it would leave the set empty;
    /// the store is left unchanged on any failure. Assignments pointing
    /// at the removed id are kept (they resolve to "other" until the id
    /// comes back).
    pub(crate) fn remove_category(&self, id: &str) -> Result<()> {
        if self.get_category(id)?.is_none() {
            anyhow::bail!("No such category: {id}");
        }
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count <= 1 {
            anyhow::bail!("You must have at least one category");
        }
        self.conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Change a category's display name. The id (and so every stored
    /// assignment) is untouched.
    pub(crate) fn rename_category(&self, id: &str, pretty_name: &str) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE categories SET pretty_name = ?1 WHERE id = ?2",
            params![pretty_name.trim(), id],
        )?;
        if updated == 0 {
            anyhow::bail!("No such category: {id}");
        }
        Ok(())
    }

    pub(crate) fn recolor_category(&self, id: &str, color: &str) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE categories SET color = ?1 WHERE id = ?2",
            params![color, id],
        )?;
        if updated == 0 {
            anyhow::bail!("No such category: {id}");
        }
        Ok(())
    }

    // ── Payee assignments ─────────────────────────────────────

    /// Upsert the category for a payee's representative name.
    /// Last writer wins; the write is a single atomic key update.
    pub(crate) fn set_assignment(&self, payee: &str, category_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO assignments (payee, category_id) VALUES (?1, ?2)
             ON CONFLICT(payee) DO UPDATE SET category_id = ?2",
            params![payee, category_id],
        )?;
        Ok(())
    }

    pub(crate) fn get_assignment(&self, payee: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT category_id FROM assignments WHERE payee = ?1",
            params![payee],
            |row| row.get(0),
        );
        match result {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Snapshot of every stored assignment, for categorization runs.
    pub(crate) fn get_assignments(&self) -> Result<HashMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payee, category_id FROM assignments")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<std::result::Result<HashMap<_, _>, _>>()?)
    }
}
