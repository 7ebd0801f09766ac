//! User profile database model

use sqlx::FromRow;

/// Public projection of the users table
#[derive(Debug, Clone, FromRow)]
pub struct UserProfileModel {
    pub id: i64,
    pub name: String,
    pub profile_picture: Option<String>,
}
