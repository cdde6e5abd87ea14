use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "upload_link")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Account that owns anything deposited through this link.
    #[sea_orm(indexed)]
    pub user_id: i32,

    #[sea_orm(unique)]
    pub token: String,

    /// Fixed document title. When `None` the uploader must supply one.
    pub title: Option<String>,

    pub expires_at: DateTimeUtc,

    /// Set exactly once, by the first successful upload.
    pub used_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

impl Model {
    /// A link is usable while unused and strictly before `expires_at`.
    pub fn is_usable_at(&self, now: DateTimeUtc) -> bool {
        self.used_at.is_none() && now < self.expires_at
    }

    pub fn requires_title(&self) -> bool {
        self.title.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
