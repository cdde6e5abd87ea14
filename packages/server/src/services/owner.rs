use chrono::Utc;
use common::DiskRegistry;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};

use crate::entity::{document, upload_link, user};
use crate::error::AppError;
use crate::ownership::OwnerRef;
use crate::services::document::DocumentService;
use crate::services::file_record::{FileRecordService, PendingPurge};

pub struct OwnerService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> OwnerService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Remove every file, document and upload link belonging to `owner`.
    ///
    /// Returns the bytes to purge once the caller's transaction commits.
    pub async fn purge(&self, owner: OwnerRef) -> Result<Vec<PendingPurge>, DbErr> {
        let files = FileRecordService::new(self.conn);
        let mut purges = Vec::new();

        for record in files.list_for_owner(owner).await? {
            purges.push(files.delete(&record).await?);
        }

        if let OwnerRef::User(user_id) = owner {
            // Documents whose file is owned by someone else still belong to the user.
            let documents = DocumentService::new(self.conn);
            let remaining = document::Entity::find()
                .filter(document::Column::UserId.eq(user_id))
                .all(self.conn)
                .await?;
            for doc in &remaining {
                purges.extend(documents.delete(doc).await?);
            }

            upload_link::Entity::delete_many()
                .filter(upload_link::Column::UserId.eq(user_id))
                .exec(self.conn)
                .await?;
        }

        tracing::debug!(?owner, files = purges.len(), "owner contents removed");
        Ok(purges)
    }
}

/// Create the local row for an account known from its bearer token.
///
/// Accounts are issued by the auth service; the first authenticated write
/// mirrors the id here so files, documents and links can reference it.
pub async fn provision_user(db: &DatabaseConnection, user_id: i32, name: &str) -> Result<(), DbErr> {
    if user::Entity::find_by_id(user_id).one(db).await?.is_some() {
        return Ok(());
    }

    let inserted = user::ActiveModel {
        id: Set(user_id),
        name: Set(name.to_owned()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await;

    match inserted {
        Ok(_) => {
            tracing::info!(user_id, "local user provisioned");
            Ok(())
        }
        // Another request for the same account may have won the insert.
        Err(e) => match user::Entity::find_by_id(user_id).one(db).await? {
            Some(_) => Ok(()),
            None => Err(e),
        },
    }
}

/// Delete a user account and everything it owns.
pub async fn delete_user(
    db: &DatabaseConnection,
    disks: &DiskRegistry,
    user_id: i32,
) -> Result<(), AppError> {
    let txn = db.begin().await?;

    if user::Entity::find_by_id(user_id).one(&txn).await?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    let purges = OwnerService::new(&txn)
        .purge(OwnerRef::User(user_id))
        .await?;
    user::Entity::delete_by_id(user_id).exec(&txn).await?;
    txn.commit().await?;

    let count = purges.len();
    PendingPurge::run_all(purges, disks).await;
    tracing::info!(user_id, files = count, "user deleted");
    Ok(())
}
