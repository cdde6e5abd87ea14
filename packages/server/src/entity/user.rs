use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Local view of an account. Profile data lives in the user domain; the file
/// subsystem only needs the id to resolve owners and cascade deletions.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::document::Entity")]
    Document,
    #[sea_orm(has_many = "super::upload_link::Entity")]
    UploadLink,
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl Related<super::upload_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UploadLink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
