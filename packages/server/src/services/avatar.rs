use common::{ContentHash, DiskRegistry, PutOptions};
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};

use crate::config::UploadConfig;
use crate::entity::file_record;
use crate::error::AppError;
use crate::ownership::OwnerRef;
use crate::services::file_record::{FileRecordService, NewFileRecord, PendingPurge};
use crate::services::upload::UploadRules;
use crate::utils::multipart::UploadedFile;

pub const AVATAR_DIR: &str = "user_profile_pictures";

pub fn avatar_path(user_id: i32, extension: &str) -> String {
    format!("{AVATAR_DIR}/{user_id}.{extension}")
}

fn is_avatar(record: &file_record::Model) -> bool {
    record
        .path
        .strip_prefix(AVATAR_DIR)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Store a new profile picture for `user_id`, replacing the previous one.
pub async fn replace_avatar(
    db: &DatabaseConnection,
    disks: &DiskRegistry,
    config: &UploadConfig,
    user_id: i32,
    file: UploadedFile,
) -> Result<file_record::Model, AppError> {
    UploadRules::image(config).validate(&file)?;

    let owner = OwnerRef::User(user_id);
    let hash = ContentHash::compute(&file.data);
    let files = FileRecordService::new(db);
    files.ensure_not_duplicate(owner, &hash).await?;

    let disk = disks.remote_disk()?;
    let path = avatar_path(user_id, &file.name.extension);
    let overwrites_existing = files
        .list_for_owner(owner)
        .await?
        .iter()
        .any(|r| is_avatar(r) && r.disk == disk.name() && r.path == path);

    disk.put(&path, &file.data, PutOptions::public(file.mimetype()))
        .await?;

    let result = async {
        let txn = db.begin().await?;
        let files = FileRecordService::new(&txn);

        let mut purges = Vec::new();
        for old in files.list_for_owner(owner).await? {
            if is_avatar(&old) {
                purges.push(files.delete(&old).await?);
            }
        }

        let record = files
            .create(NewFileRecord {
                owner,
                name: user_id.to_string(),
                extension: file.name.extension.clone(),
                mimetype: file.mimetype(),
                size: i64::try_from(file.size()).ok(),
                path: path.clone(),
                disk: disk.name().to_string(),
                hash,
            })
            .await?;
        txn.commit().await?;
        Ok::<_, DbErr>((record, purges))
    }
    .await;

    let (record, purges) = match result {
        Ok(created) => created,
        Err(e) => {
            // The previous avatar row still points at an overwritten key.
            if !overwrites_existing && let Err(del) = disk.delete(&path).await {
                tracing::warn!(disk = disk.name(), %path, error = %del, "failed to discard avatar bytes");
            }
            return Err(e.into());
        }
    };

    // The new bytes already replaced anything stored at the same key.
    let purges = purges
        .into_iter()
        .filter(|p| !p.targets(&record.disk, &record.path))
        .collect();
    PendingPurge::run_all(purges, disks).await;

    tracing::info!(user_id, file_id = record.id, "avatar replaced");
    Ok(record)
}
