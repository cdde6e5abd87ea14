use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    pub expiration_date: Option<Date>,

    /// Free-form metadata supplied by the uploader.
    pub metadata: Option<Json>,

    #[sea_orm(indexed)]
    pub user_id: i32,

    /// The one file this document describes. Deleting either side deletes both.
    #[sea_orm(unique)]
    pub file_id: i32,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::file_record::Entity",
        from = "Column::FileId",
        to = "super::file_record::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    FileRecord,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    User,
}

impl Related<super::file_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FileRecord.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
