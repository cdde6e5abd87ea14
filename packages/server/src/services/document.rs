use chrono::{NaiveDate, Utc};
use common::DiskRegistry;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::entity::{document, file_record};
use crate::error::AppError;
use crate::services::file_record::{FileRecordService, PendingPurge};

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub expiration_date: Option<NaiveDate>,
    pub metadata: Option<serde_json::Value>,
    pub file_id: i32,
    pub user_id: i32,
}

pub struct DocumentService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> DocumentService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn create(&self, new: NewDocument) -> Result<document::Model, DbErr> {
        let model = document::ActiveModel {
            title: Set(new.title),
            expiration_date: Set(new.expiration_date),
            metadata: Set(new.metadata),
            user_id: Set(new.user_id),
            file_id: Set(new.file_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        model.insert(self.conn).await
    }

    pub async fn find(&self, id: i32) -> Result<Option<document::Model>, DbErr> {
        document::Entity::find_by_id(id).one(self.conn).await
    }

    /// A user's documents with their files, newest first.
    pub async fn list_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<(document::Model, Option<file_record::Model>)>, DbErr> {
        document::Entity::find()
            .filter(document::Column::UserId.eq(user_id))
            .find_also_related(file_record::Entity)
            .order_by_desc(document::Column::CreatedAt)
            .order_by_desc(document::Column::Id)
            .all(self.conn)
            .await
    }

    /// Delete a document together with its file record.
    ///
    /// Returns the bytes to purge, or `None` when the file record was
    /// already missing.
    pub async fn delete(&self, doc: &document::Model) -> Result<Option<PendingPurge>, DbErr> {
        let files = FileRecordService::new(self.conn);
        match files.find(doc.file_id).await? {
            Some(record) => files.delete(&record).await.map(Some),
            None => {
                tracing::error!(
                    document_id = doc.id,
                    file_id = doc.file_id,
                    "document references a missing file record"
                );
                document::Entity::delete_by_id(doc.id)
                    .exec(self.conn)
                    .await?;
                Ok(None)
            }
        }
    }
}

/// Delete a document and its file in one transaction, then purge the bytes.
pub async fn delete_document(
    db: &DatabaseConnection,
    disks: &DiskRegistry,
    doc: &document::Model,
) -> Result<(), AppError> {
    let txn = db.begin().await?;
    let purge = DocumentService::new(&txn).delete(doc).await?;
    txn.commit().await?;

    if let Some(purge) = purge {
        purge.run(disks).await;
    }
    tracing::info!(document_id = doc.id, file_id = doc.file_id, "document deleted");
    Ok(())
}
