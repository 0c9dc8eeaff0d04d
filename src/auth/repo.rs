use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{FreelancerProfile, Role, User, UserStatus};
use crate::db::with_retry;

impl User {
    /// Find a user by case-folded email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        with_retry(|| async {
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email, password_hash, role, status, avatar_url, created_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(db)
            .await
        })
        .await
    }

    /// Find a user by id; used by the guard to re-verify sessions.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        with_retry(|| async {
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email, password_hash, role, status, avatar_url, created_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(db)
            .await
        })
        .await
    }

    /// Create a new active user with an already-hashed password.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, sqlx::Error> {
        with_retry(|| async {
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (name, email, password_hash, role, status)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, name, email, password_hash, role, status, avatar_url, created_at
                "#,
            )
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .bind(role)
            .bind(UserStatus::Active)
            .fetch_one(db)
            .await
        })
        .await
    }
}

impl FreelancerProfile {
    /// Create the empty companion profile for a freshly registered freelancer.
    pub async fn create(db: &PgPool, user_id: Uuid) -> Result<FreelancerProfile, sqlx::Error> {
        with_retry(|| async {
            sqlx::query_as::<_, FreelancerProfile>(
                r#"
                INSERT INTO freelancer_profiles (user_id, bio, skills, portfolio_links)
                VALUES ($1, '', '[]'::jsonb, '[]'::jsonb)
                RETURNING id, user_id, bio, skills, portfolio_links, created_at
                "#,
            )
            .bind(user_id)
            .fetch_one(db)
            .await
        })
        .await
    }
}
