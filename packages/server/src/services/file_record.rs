use chrono::Utc;
use common::certificate::gateway_parts;
use common::{ContentHash, DiskRegistry, StorageError};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Select, Set,
};

use crate::entity::{document, file_record};
use crate::error::AppError;
use crate::ownership::OwnerRef;

/// Everything needed to register bytes that are already stored.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub owner: OwnerRef,
    pub name: String,
    pub extension: String,
    pub mimetype: Option<String>,
    pub size: Option<i64>,
    pub path: String,
    pub disk: String,
    pub hash: ContentHash,
}

/// Bytes left behind by a deleted [`file_record::Model`].
///
/// Run it once the transaction that deleted the row has committed.
#[must_use = "the stored bytes stay on disk unless the purge is run"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPurge {
    pub file_id: i32,
    pub disk: String,
    pub path: String,
}

impl PendingPurge {
    fn of(record: &file_record::Model) -> Self {
        Self {
            file_id: record.id,
            disk: record.disk.clone(),
            path: record.path.clone(),
        }
    }

    pub fn targets(&self, disk: &str, path: &str) -> bool {
        self.disk == disk && self.path == path
    }

    /// Remove the bytes. Failures are logged and never propagated: the row
    /// is already gone, so the bytes are orphaned either way.
    pub async fn run(self, disks: &DiskRegistry) {
        let result = match disks.disk(&self.disk) {
            Ok(disk) => disk.delete(&self.path).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(true) => {
                tracing::debug!(file_id = self.file_id, disk = %self.disk, path = %self.path, "purged file bytes");
            }
            Ok(false) => {
                tracing::warn!(
                    file_id = self.file_id,
                    disk = %self.disk,
                    path = %self.path,
                    "file bytes were already missing"
                );
            }
            Err(e) => {
                tracing::warn!(
                    file_id = self.file_id,
                    disk = %self.disk,
                    path = %self.path,
                    error = %e,
                    "failed to delete file bytes, leaving orphaned object"
                );
            }
        }
    }

    pub async fn run_all(purges: Vec<Self>, disks: &DiskRegistry) {
        for purge in purges {
            purge.run(disks).await;
        }
    }
}

pub struct FileRecordService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> FileRecordService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Insert a record. Uniqueness is not checked here; see
    /// [`Self::ensure_not_duplicate`].
    pub async fn create(&self, new: NewFileRecord) -> Result<file_record::Model, DbErr> {
        let model = file_record::ActiveModel {
            owner_kind: Set(new.owner.kind()),
            owner_id: Set(new.owner.id()),
            name: Set(new.name),
            extension: Set(new.extension),
            mimetype: Set(new.mimetype),
            size: Set(new.size),
            hash: Set(new.hash.to_hex()),
            path: Set(new.path),
            disk: Set(new.disk),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let record = model.insert(self.conn).await?;
        tracing::debug!(file_id = record.id, disk = %record.disk, path = %record.path, "file record created");
        Ok(record)
    }

    pub async fn find(&self, id: i32) -> Result<Option<file_record::Model>, DbErr> {
        file_record::Entity::find_by_id(id).one(self.conn).await
    }

    pub async fn find_by_owner_and_hash(
        &self,
        owner: OwnerRef,
        hash: &ContentHash,
    ) -> Result<Option<file_record::Model>, DbErr> {
        owned_by(owner)
            .filter(file_record::Column::Hash.eq(hash.to_hex()))
            .one(self.conn)
            .await
    }

    /// Reject content the owner has already uploaded.
    pub async fn ensure_not_duplicate(
        &self,
        owner: OwnerRef,
        hash: &ContentHash,
    ) -> Result<(), AppError> {
        if let Some(existing) = self.find_by_owner_and_hash(owner, hash).await? {
            tracing::debug!(file_id = existing.id, ?owner, "duplicate upload rejected");
            return Err(AppError::Validation(
                "This file has already been uploaded".into(),
            ));
        }
        Ok(())
    }

    pub async fn list_for_owner(&self, owner: OwnerRef) -> Result<Vec<file_record::Model>, DbErr> {
        owned_by(owner)
            .order_by_asc(file_record::Column::CreatedAt)
            .order_by_asc(file_record::Column::Id)
            .all(self.conn)
            .await
    }

    /// Delete the row along with any document describing it.
    pub async fn delete(&self, record: &file_record::Model) -> Result<PendingPurge, DbErr> {
        let documents = document::Entity::delete_many()
            .filter(document::Column::FileId.eq(record.id))
            .exec(self.conn)
            .await?;
        if documents.rows_affected > 0 {
            tracing::debug!(file_id = record.id, count = documents.rows_affected, "deleted documents of file");
        }

        file_record::Entity::delete_by_id(record.id)
            .exec(self.conn)
            .await?;

        Ok(PendingPurge::of(record))
    }
}

fn owned_by(owner: OwnerRef) -> Select<file_record::Entity> {
    let query = file_record::Entity::find();
    match (owner.kind(), owner.id()) {
        (Some(kind), Some(id)) => query
            .filter(file_record::Column::OwnerKind.eq(kind))
            .filter(file_record::Column::OwnerId.eq(id)),
        _ => query
            .filter(file_record::Column::OwnerKind.is_null())
            .filter(file_record::Column::OwnerId.is_null()),
    }
}

/// Public URL of a file.
///
/// Certificates on the remote disk are only reachable through the gateway,
/// so their raw object-store URL is never handed out.
pub fn resolve_url(
    record: &file_record::Model,
    disks: &DiskRegistry,
    app_url: &str,
) -> Result<String, StorageError> {
    if record.disk == disks.remote_name() {
        if let Some((owner_id, filename)) = gateway_parts(&record.path) {
            return Ok(format!(
                "{}/certificate/{owner_id}/{filename}",
                app_url.trim_end_matches('/')
            ));
        }
        return Ok(disks.remote_disk()?.public_url(&record.path));
    }

    Ok(disks.default_disk()?.public_url(&record.path))
}
