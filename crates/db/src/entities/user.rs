//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Stored lowercase; uniqueness is case-insensitive by construction
    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    pub full_name: String,

    /// Argon2 hash; never serialized into API payloads
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub avatar_url: String,

    #[sea_orm(nullable)]
    pub cover_image_url: Option<String>,

    /// Currently valid refresh token; NULL = logged out everywhere
    #[serde(skip_serializing)]
    #[sea_orm(nullable)]
    pub refresh_token: Option<String>,

    /// Set once the verification mail link is followed
    #[sea_orm(default_value = false)]
    pub is_verified: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::video::Entity")]
    Videos,

    #[sea_orm(has_many = "super::tweet::Entity")]
    Tweets,

    #[sea_orm(has_many = "super::playlist::Entity")]
    Playlists,
}

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Videos.def()
    }
}

impl Related<super::tweet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tweets.def()
    }
}

impl Related<super::playlist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Playlists.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
