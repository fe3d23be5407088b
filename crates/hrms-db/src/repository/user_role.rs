//! # User Role Repository
//!
//! Maps identity users to their application role. A user may end up with
//! several rows; the earliest assignment wins.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use hrms_core::{UserRole, UserRoleAssignment};

#[derive(Debug, Clone)]
pub struct UserRoleRepository {
    pool: SqlitePool,
}

impl UserRoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRoleRepository { pool }
    }

    pub async fn assign(&self, assignment: &UserRoleAssignment) -> DbResult<()> {
        debug!(user_id = %assignment.user_id, role = assignment.role.as_str(), "Assigning role");

        sqlx::query("INSERT INTO user_roles (id, user_id, role, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&assignment.id)
            .bind(&assignment.user_id)
            .bind(assignment.role)
            .bind(assignment.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// The user's effective role, or `None` when nothing is assigned.
    pub async fn role_for_user(&self, user_id: &str) -> DbResult<Option<UserRole>> {
        let role = sqlx::query_scalar::<_, UserRole>(
            "SELECT role FROM user_roles WHERE user_id = ?1 ORDER BY created_at, id LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<UserRoleAssignment>> {
        let rows = sqlx::query_as::<_, UserRoleAssignment>(
            "SELECT id, user_id, role, created_at FROM user_roles WHERE user_id = ?1 ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{database, ts};

    fn assignment(id: &str, user_id: &str, role: UserRole, secs: i64) -> UserRoleAssignment {
        UserRoleAssignment {
            id: id.to_string(),
            user_id: user_id.to_string(),
            role,
            created_at: ts(secs),
        }
    }

    #[tokio::test]
    async fn test_earliest_assignment_wins() {
        let db = database().await;
        let repo = db.user_roles();

        repo.assign(&assignment("r2", "u1", UserRole::Admin, 20)).await.unwrap();
        repo.assign(&assignment("r1", "u1", UserRole::Hr, 10)).await.unwrap();

        assert_eq!(repo.role_for_user("u1").await.unwrap(), Some(UserRole::Hr));
        assert_eq!(repo.list_for_user("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unassigned_user() {
        let db = database().await;
        assert_eq!(db.user_roles().role_for_user("nobody").await.unwrap(), None);
    }
}
