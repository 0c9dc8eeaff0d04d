use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account role, fixed at registration (admins are created out of band).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Freelancer,
    Client,
}

impl Role {
    /// Default landing page after login.
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Freelancer => "/dashboard/freelancer",
            Role::Client => "/dashboard/client",
        }
    }
}

/// Account lifecycle flag gating login and session validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Suspended,
    Deactivated,
}

/// User record in the database. Emails are stored case-folded.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub avatar_url: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Companion profile row, 1:1 with a user of role freelancer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FreelancerProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: String,
    pub skills: serde_json::Value,
    pub portfolio_links: serde_json::Value,
    pub created_at: OffsetDateTime,
}
