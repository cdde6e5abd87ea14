use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of domain entity a file belongs to.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "article")]
    Article,
    #[sea_orm(string_value = "event")]
    Event,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file_record")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owner entity kind. `None` together with `owner_id` for orphan files.
    #[sea_orm(indexed)]
    pub owner_kind: Option<OwnerKind>,

    /// Owner entity ID. Not a foreign key; resolved within the owning domain.
    #[sea_orm(indexed)]
    pub owner_id: Option<i32>,

    /// Logical filename without extension.
    pub name: String,

    /// Lowercase extension without the dot.
    pub extension: String,

    pub mimetype: Option<String>,

    pub size: Option<i64>,

    /// Lowercase hex SHA-256 of the full content.
    #[sea_orm(indexed)]
    pub hash: String,

    /// Disk-relative key.
    pub path: String,

    /// Name of the disk holding the bytes.
    pub disk: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::document::Entity")]
    Document,
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
