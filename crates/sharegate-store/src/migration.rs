//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use sharegate_core::now_millis;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::info!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: roles, catalog, groups, shares and direct grants.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One role per principal
        CREATE TABLE role_assignments (
            user_id TEXT PRIMARY KEY,
            role TEXT NOT NULL,               -- guest | user | moderator | admin | super_admin
            expires_at INTEGER                -- Unix ms, NULL = never
        );

        -- Permission catalog
        CREATE TABLE permissions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,        -- "resource:action"
            description TEXT
        );

        -- Role -> permission edges
        CREATE TABLE role_permissions (
            role TEXT NOT NULL,
            permission_id INTEGER NOT NULL REFERENCES permissions(id),
            PRIMARY KEY (role, permission_id)
        );

        CREATE TABLE groups (
            group_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            owner_id TEXT NOT NULL
        );

        CREATE TABLE group_members (
            group_id TEXT NOT NULL REFERENCES groups(group_id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            role TEXT NOT NULL,               -- admin | member
            PRIMARY KEY (group_id, user_id)
        );

        -- Coarse shares, one per (resource, grantee)
        CREATE TABLE resource_shares (
            resource_id TEXT NOT NULL,
            grantee_kind TEXT NOT NULL,       -- user | group
            grantee_id TEXT NOT NULL,
            permission TEXT NOT NULL,         -- read | write
            expires_at INTEGER,
            PRIMARY KEY (resource_id, grantee_kind, grantee_id)
        );

        -- Direct per-action grants
        CREATE TABLE resource_permissions (
            resource_id TEXT NOT NULL,
            grantee_kind TEXT NOT NULL,
            grantee_id TEXT NOT NULL,
            permission TEXT NOT NULL,         -- action name
            expires_at INTEGER,
            PRIMARY KEY (resource_id, grantee_kind, grantee_id, permission)
        );

        CREATE INDEX idx_role_assignments_role ON role_assignments(role);
        CREATE INDEX idx_role_permissions_permission ON role_permissions(permission_id);
        CREATE INDEX idx_group_members_user ON group_members(user_id);
        "#,
    )?;

    Ok(())
}
