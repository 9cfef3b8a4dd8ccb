//! Subscription entity (subscriber follows a channel; both are users).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user who subscribed
    pub subscriber_id: String,

    /// The channel (user) being subscribed to
    pub channel_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SubscriberId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Subscriber,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ChannelId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Channel,
}

impl ActiveModelBehavior for ActiveModel {}
