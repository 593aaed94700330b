//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend for Sharegate. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use sharegate_core::{
    Action, Grantee, Group, GroupId, GroupMembership, GroupRole, Permission, PermissionId,
    PermissionName, ResourceId, ResourcePermission, ResourceShare, Role, RoleAssignment,
    SharePermission, UserId, ValidationError,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{
    CatalogLookup, GrantStore, GroupIndex, InsertResult, PermissionCatalog, RoleStore,
};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

// Row decoding helpers

fn decode<T>(raw: &str) -> Result<T>
where
    T: FromStr<Err = ValidationError>,
{
    raw.parse()
        .map_err(|e: ValidationError| StoreError::InvalidData(e.to_string()))
}

fn grantee_parts(grantee: &Grantee) -> (&'static str, String) {
    match grantee {
        Grantee::User(id) => ("user", id.as_str().to_string()),
        Grantee::Group(id) => ("group", id.as_str().to_string()),
    }
}

fn grantee_from(kind: &str, id: String) -> Result<Grantee> {
    match kind {
        "user" => Ok(Grantee::User(UserId::new(id))),
        "group" => Ok(Grantee::Group(GroupId::new(id))),
        other => Err(StoreError::InvalidData(format!(
            "unknown grantee kind: {}",
            other
        ))),
    }
}

fn permission_from(id: i64, name: &str, description: Option<String>) -> Result<Permission> {
    Ok(Permission {
        id: PermissionId(id),
        name: PermissionName::parse(name)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?,
        description,
    })
}

fn permission_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM permissions WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?)
}

#[async_trait]
impl RoleStore for SqliteStore {
    async fn get_role_assignment(&self, user: &UserId) -> Result<Option<RoleAssignment>> {
        let user = user.clone();

        self.blocking(move |conn| {
            let row: Option<(String, Option<i64>)> = conn
                .query_row(
                    "SELECT role, expires_at FROM role_assignments WHERE user_id = ?1",
                    params![user.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            row.map(|(role, expires_at)| {
                Ok(RoleAssignment {
                    user_id: user,
                    role: decode::<Role>(&role)?,
                    expires_at,
                })
            })
            .transpose()
        })
        .await
    }

    async fn set_role(&self, assignment: &RoleAssignment) -> Result<()> {
        assignment.user_id.validate()?;
        let assignment = assignment.clone();

        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO role_assignments (user_id, role, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                    role = excluded.role,
                    expires_at = excluded.expires_at",
                params![
                    assignment.user_id.as_str(),
                    assignment.role.as_str(),
                    assignment.expires_at
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove_role(&self, user: &UserId) -> Result<bool> {
        let user = user.clone();

        self.blocking(move |conn| {
            let changed = conn.execute(
                "DELETE FROM role_assignments WHERE user_id = ?1",
                params![user.as_str()],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn users_with_role(&self, role: Role) -> Result<Vec<UserId>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id FROM role_assignments WHERE role = ?1 ORDER BY user_id",
            )?;
            let users = stmt
                .query_map(params![role.as_str()], |row| row.get::<_, String>(0))?
                .map(|r| r.map(UserId::new))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
        .await
    }
}

#[async_trait]
impl PermissionCatalog for SqliteStore {
    async fn create_permission(
        &self,
        name: &PermissionName,
        description: Option<&str>,
    ) -> Result<Permission> {
        let name = name.clone();
        let description = description.map(String::from);

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            if permission_id(&tx, name.as_str())?.is_some() {
                return Err(StoreError::Duplicate(format!("permission {}", name)));
            }

            tx.execute(
                "INSERT INTO permissions (name, description) VALUES (?1, ?2)",
                params![name.as_str(), description],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            Ok(Permission {
                id: PermissionId(id),
                name,
                description,
            })
        })
        .await
    }

    async fn get_permission(&self, name: &PermissionName) -> Result<Option<Permission>> {
        let name = name.clone();

        self.blocking(move |conn| {
            let row: Option<(i64, String, Option<String>)> = conn
                .query_row(
                    "SELECT id, name, description FROM permissions WHERE name = ?1",
                    params![name.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            row.map(|(id, name, description)| permission_from(id, &name, description))
                .transpose()
        })
        .await
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>> {
        self.blocking(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, description FROM permissions ORDER BY name")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(id, name, description)| permission_from(id, &name, description))
                .collect()
        })
        .await
    }

    async fn delete_permission(&self, name: &PermissionName) -> Result<()> {
        let name = name.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let id = permission_id(&tx, name.as_str())?
                .ok_or_else(|| StoreError::NotFound(format!("permission {}", name)))?;

            let roles: i64 = tx.query_row(
                "SELECT COUNT(*) FROM role_permissions WHERE permission_id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            if roles > 0 {
                return Err(StoreError::PermissionInUse {
                    name: name.to_string(),
                    roles: roles as usize,
                });
            }

            tx.execute("DELETE FROM permissions WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn assign_permission(&self, role: Role, name: &PermissionName) -> Result<InsertResult> {
        let name = name.clone();

        self.blocking(move |conn| {
            let id = permission_id(conn, name.as_str())?
                .ok_or_else(|| StoreError::NotFound(format!("permission {}", name)))?;

            let changed = conn.execute(
                "INSERT OR IGNORE INTO role_permissions (role, permission_id) VALUES (?1, ?2)",
                params![role.as_str(), id],
            )?;

            if changed > 0 {
                Ok(InsertResult::Inserted)
            } else {
                Ok(InsertResult::AlreadyExists)
            }
        })
        .await
    }

    async fn revoke_permission(&self, role: Role, name: &PermissionName) -> Result<bool> {
        let name = name.clone();

        self.blocking(move |conn| {
            let changed = conn.execute(
                "DELETE FROM role_permissions
                 WHERE role = ?1
                   AND permission_id = (SELECT id FROM permissions WHERE name = ?2)",
                params![role.as_str(), name.as_str()],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn lookup(&self, role: Role, name: &PermissionName) -> Result<CatalogLookup> {
        let name = name.clone();

        self.blocking(move |conn| {
            let Some(id) = permission_id(conn, name.as_str())? else {
                return Ok(CatalogLookup::UnknownPermission);
            };

            let granted: bool = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM role_permissions WHERE role = ?1 AND permission_id = ?2
                 )",
                params![role.as_str(), id],
                |row| row.get(0),
            )?;

            if granted {
                Ok(CatalogLookup::Granted)
            } else {
                Ok(CatalogLookup::NotGranted)
            }
        })
        .await
    }

    async fn permissions_for_role(&self, role: Role) -> Result<Vec<Permission>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.name, p.description
                 FROM permissions p
                 JOIN role_permissions rp ON rp.permission_id = p.id
                 WHERE rp.role = ?1
                 ORDER BY p.name",
            )?;
            let rows = stmt
                .query_map(params![role.as_str()], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(id, name, description)| permission_from(id, &name, description))
                .collect()
        })
        .await
    }
}

#[async_trait]
impl GroupIndex for SqliteStore {
    async fn create_group(&self, group: &Group) -> Result<()> {
        group.id.validate()?;
        group.owner_id.validate()?;
        let group = group.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM groups WHERE group_id = ?1)",
                params![group.id.as_str()],
                |row| row.get(0),
            )?;
            if exists {
                return Err(StoreError::Duplicate(format!("group {}", group.id)));
            }

            tx.execute(
                "INSERT INTO groups (group_id, name, owner_id) VALUES (?1, ?2, ?3)",
                params![group.id.as_str(), group.name, group.owner_id.as_str()],
            )?;
            tx.execute(
                "INSERT INTO group_members (group_id, user_id, role) VALUES (?1, ?2, ?3)",
                params![
                    group.id.as_str(),
                    group.owner_id.as_str(),
                    GroupRole::Admin.as_str()
                ],
            )?;

            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_group(&self, id: &GroupId) -> Result<Option<Group>> {
        let id = id.clone();

        self.blocking(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT name, owner_id FROM groups WHERE group_id = ?1",
                    params![id.as_str()],
                    |row| {
                        Ok(Group {
                            id: id.clone(),
                            name: row.get(0)?,
                            owner_id: UserId::new(row.get::<_, String>(1)?),
                        })
                    },
                )
                .optional()?)
        })
        .await
    }

    async fn add_member(
        &self,
        group: &GroupId,
        user: &UserId,
        role: GroupRole,
    ) -> Result<InsertResult> {
        user.validate()?;
        let group = group.clone();
        let user = user.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM groups WHERE group_id = ?1)",
                params![group.as_str()],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(StoreError::NotFound(format!("group {}", group)));
            }

            let already: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM group_members WHERE group_id = ?1 AND user_id = ?2)",
                params![group.as_str(), user.as_str()],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO group_members (group_id, user_id, role) VALUES (?1, ?2, ?3)
                 ON CONFLICT(group_id, user_id) DO UPDATE SET role = excluded.role",
                params![group.as_str(), user.as_str(), role.as_str()],
            )?;
            tx.commit()?;

            if already {
                Ok(InsertResult::AlreadyExists)
            } else {
                Ok(InsertResult::Inserted)
            }
        })
        .await
    }

    async fn remove_member(&self, group: &GroupId, user: &UserId) -> Result<bool> {
        let group = group.clone();
        let user = user.clone();

        self.blocking(move |conn| {
            let changed = conn.execute(
                "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
                params![group.as_str(), user.as_str()],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn members(&self, group: &GroupId) -> Result<Vec<GroupMembership>> {
        let group = group.clone();

        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, role FROM group_members WHERE group_id = ?1 ORDER BY user_id",
            )?;
            let rows = stmt
                .query_map(params![group.as_str()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(user_id, role)| {
                    Ok(GroupMembership {
                        group_id: group.clone(),
                        user_id: UserId::new(user_id),
                        role: decode::<GroupRole>(&role)?,
                    })
                })
                .collect()
        })
        .await
    }

    async fn groups_for_user(&self, user: &UserId) -> Result<Vec<GroupId>> {
        let user = user.clone();

        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT group_id FROM group_members WHERE user_id = ?1 ORDER BY group_id",
            )?;
            let groups = stmt
                .query_map(params![user.as_str()], |row| row.get::<_, String>(0))?
                .map(|r| r.map(GroupId::new))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(groups)
        })
        .await
    }
}

fn load_shares(conn: &Connection, resource: &ResourceId) -> Result<Vec<ResourceShare>> {
    let mut stmt = conn.prepare(
        "SELECT grantee_kind, grantee_id, permission, expires_at
         FROM resource_shares WHERE resource_id = ?1
         ORDER BY grantee_kind, grantee_id",
    )?;
    let rows = stmt
        .query_map(params![resource.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<i64>>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(kind, id, permission, expires_at)| {
            Ok(ResourceShare {
                resource_id: resource.clone(),
                grantee: grantee_from(&kind, id)?,
                permission: decode::<SharePermission>(&permission)?,
                expires_at,
            })
        })
        .collect()
}

#[async_trait]
impl GrantStore for SqliteStore {
    async fn put_share(&self, share: &ResourceShare) -> Result<()> {
        share.resource_id.validate()?;
        share.grantee.validate()?;
        let share = share.clone();

        self.blocking(move |conn| {
            let (kind, id) = grantee_parts(&share.grantee);
            conn.execute(
                "INSERT INTO resource_shares
                    (resource_id, grantee_kind, grantee_id, permission, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(resource_id, grantee_kind, grantee_id) DO UPDATE SET
                    permission = excluded.permission,
                    expires_at = excluded.expires_at",
                params![
                    share.resource_id.as_str(),
                    kind,
                    id,
                    share.permission.as_str(),
                    share.expires_at
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove_share(&self, resource: &ResourceId, grantee: &Grantee) -> Result<bool> {
        let resource = resource.clone();
        let (kind, id) = grantee_parts(grantee);

        self.blocking(move |conn| {
            let changed = conn.execute(
                "DELETE FROM resource_shares
                 WHERE resource_id = ?1 AND grantee_kind = ?2 AND grantee_id = ?3",
                params![resource.as_str(), kind, id],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn shares_for(
        &self,
        resource: &ResourceId,
        user: &UserId,
        groups: &[GroupId],
    ) -> Result<Vec<ResourceShare>> {
        let resource = resource.clone();
        let user = user.clone();
        let groups = groups.to_vec();

        self.blocking(move |conn| {
            Ok(load_shares(conn, &resource)?
                .into_iter()
                .filter(|s| s.grantee.covers(&user, &groups))
                .collect())
        })
        .await
    }

    async fn list_shares(&self, resource: &ResourceId) -> Result<Vec<ResourceShare>> {
        let resource = resource.clone();
        self.blocking(move |conn| load_shares(conn, &resource)).await
    }

    async fn put_resource_permission(&self, grant: &ResourcePermission) -> Result<()> {
        grant.resource_id.validate()?;
        grant.grantee.validate()?;
        grant.permission.validate()?;
        let grant = grant.clone();

        self.blocking(move |conn| {
            let (kind, id) = grantee_parts(&grant.grantee);
            conn.execute(
                "INSERT INTO resource_permissions
                    (resource_id, grantee_kind, grantee_id, permission, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(resource_id, grantee_kind, grantee_id, permission) DO UPDATE SET
                    expires_at = excluded.expires_at",
                params![
                    grant.resource_id.as_str(),
                    kind,
                    id,
                    grant.permission.as_str(),
                    grant.expires_at
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove_resource_permission(
        &self,
        resource: &ResourceId,
        grantee: &Grantee,
        permission: &Action,
    ) -> Result<bool> {
        let resource = resource.clone();
        let (kind, id) = grantee_parts(grantee);
        let permission = permission.clone();

        self.blocking(move |conn| {
            let changed = conn.execute(
                "DELETE FROM resource_permissions
                 WHERE resource_id = ?1 AND grantee_kind = ?2 AND grantee_id = ?3
                   AND permission = ?4",
                params![resource.as_str(), kind, id, permission.as_str()],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn resource_permissions_for(
        &self,
        resource: &ResourceId,
        user: &UserId,
        groups: &[GroupId],
    ) -> Result<Vec<ResourcePermission>> {
        let resource = resource.clone();
        let user = user.clone();
        let groups = groups.to_vec();

        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT grantee_kind, grantee_id, permission, expires_at
                 FROM resource_permissions WHERE resource_id = ?1
                 ORDER BY grantee_kind, grantee_id, permission",
            )?;
            let rows = stmt
                .query_map(params![resource.as_str()], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut grants = Vec::with_capacity(rows.len());
            for (kind, id, permission, expires_at) in rows {
                let grantee = grantee_from(&kind, id)?;
                if grantee.covers(&user, &groups) {
                    grants.push(ResourcePermission {
                        resource_id: resource.clone(),
                        grantee,
                        permission: Action::from(permission),
                        expires_at,
                    });
                }
            }
            Ok(grants)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> PermissionName {
        PermissionName::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_role_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let alice = UserId::new("alice");

        store
            .set_role(&RoleAssignment::new(alice.clone(), Role::SuperAdmin).expiring_at(5000))
            .await
            .unwrap();

        let assignment = store.get_role_assignment(&alice).await.unwrap().unwrap();
        assert_eq!(assignment.role, Role::SuperAdmin);
        assert_eq!(assignment.expires_at, Some(5000));

        assert_eq!(store.get_role(&alice, 4999).await.unwrap(), Some(Role::SuperAdmin));
        assert_eq!(store.get_role(&alice, 5000).await.unwrap(), None);

        assert!(store.remove_role(&alice).await.unwrap());
        assert!(store.get_role_assignment(&alice).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_role_rejects_empty_user() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store
            .set_role(&RoleAssignment::new(UserId::new(""), Role::User))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_catalog_lifecycle() {
        let store = SqliteStore::open_memory().unwrap();
        let read = name("resource:read");

        let created = store
            .create_permission(&read, Some("Read resources"))
            .await
            .unwrap();
        assert_eq!(created.description.as_deref(), Some("Read resources"));

        assert_eq!(
            store.assign_permission(Role::User, &read).await.unwrap(),
            InsertResult::Inserted
        );
        assert_eq!(
            store.assign_permission(Role::User, &read).await.unwrap(),
            InsertResult::AlreadyExists
        );
        assert_eq!(
            store.lookup(Role::User, &read).await.unwrap(),
            CatalogLookup::Granted
        );
        assert_eq!(
            store.lookup(Role::Guest, &read).await.unwrap(),
            CatalogLookup::NotGranted
        );

        let err = store.delete_permission(&read).await.unwrap_err();
        assert!(matches!(err, StoreError::PermissionInUse { roles: 1, .. }));

        assert!(store.revoke_permission(Role::User, &read).await.unwrap());
        store.delete_permission(&read).await.unwrap();
        assert_eq!(
            store.lookup(Role::User, &read).await.unwrap(),
            CatalogLookup::UnknownPermission
        );
    }

    #[tokio::test]
    async fn test_assign_unknown_permission() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store
            .assign_permission(Role::Admin, &name("resource:nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_permissions_ordered() {
        let store = SqliteStore::open_memory().unwrap();
        for raw in ["resource:write", "resource:delete", "comment:read"] {
            store.create_permission(&name(raw), None).await.unwrap();
        }

        let names: Vec<String> = store
            .list_permissions()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name.to_string())
            .collect();
        assert_eq!(names, vec!["comment:read", "resource:delete", "resource:write"]);
    }

    #[tokio::test]
    async fn test_groups() {
        let store = SqliteStore::open_memory().unwrap();
        let group = Group {
            id: GroupId::new("editors"),
            name: "Editors".into(),
            owner_id: UserId::new("alice"),
        };
        store.create_group(&group).await.unwrap();
        assert!(matches!(
            store.create_group(&group).await,
            Err(StoreError::Duplicate(_))
        ));

        let bob = UserId::new("bob");
        assert_eq!(
            store
                .add_member(&group.id, &bob, GroupRole::Member)
                .await
                .unwrap(),
            InsertResult::Inserted
        );
        assert_eq!(
            store
                .add_member(&group.id, &bob, GroupRole::Admin)
                .await
                .unwrap(),
            InsertResult::AlreadyExists
        );

        let members = store.members(&group.id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert!(members.iter().all(|m| m.role == GroupRole::Admin));

        assert_eq!(store.groups_for_user(&bob).await.unwrap(), vec![group.id.clone()]);
        assert!(store.remove_member(&group.id, &bob).await.unwrap());
        assert!(store.groups_for_user(&bob).await.unwrap().is_empty());

        assert_eq!(store.get_group(&group.id).await.unwrap(), Some(group));
    }

    #[tokio::test]
    async fn test_shares_and_grants() {
        let store = SqliteStore::open_memory().unwrap();
        let doc = ResourceId::new("doc");
        let alice = UserId::new("alice");
        let editors = GroupId::new("editors");

        store
            .put_share(
                &ResourceShare::new(
                    doc.clone(),
                    Grantee::Group(editors.clone()),
                    SharePermission::Read,
                )
                .expiring_at(9000),
            )
            .await
            .unwrap();
        store
            .put_share(&ResourceShare::new(
                doc.clone(),
                Grantee::Group(editors.clone()),
                SharePermission::Write,
            ))
            .await
            .unwrap();

        let shares = store
            .shares_for(&doc, &alice, &[editors.clone()])
            .await
            .unwrap();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].permission, SharePermission::Write);
        assert_eq!(shares[0].expires_at, None);
        assert!(store.shares_for(&doc, &alice, &[]).await.unwrap().is_empty());

        store
            .put_resource_permission(
                &ResourcePermission::new(
                    doc.clone(),
                    Grantee::User(alice.clone()),
                    Action::from("export"),
                )
                .expiring_at(100),
            )
            .await
            .unwrap();

        let grants = store
            .resource_permissions_for(&doc, &alice, &[])
            .await
            .unwrap();
        assert_eq!(grants.len(), 1);
        assert!(grants[0].names(&Action::from("export")));
        assert!(!grants[0].is_live(100));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sharegate.db");
        let perm = name("resource:read");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.create_permission(&perm, None).await.unwrap();
            store.assign_permission(Role::User, &perm).await.unwrap();
            store
                .set_role(&RoleAssignment::new(UserId::new("alice"), Role::User))
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.get_role(&UserId::new("alice"), 0).await.unwrap(),
            Some(Role::User)
        );
        assert!(store.lookup(Role::User, &perm).await.unwrap().is_granted());
    }
}
