use chrono::{Days, NaiveDate};
use common::{CertificateName, ContentHash, DiskRegistry, PutOptions};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};

use crate::config::UploadConfig;
use crate::entity::{document, file_record};
use crate::error::AppError;
use crate::ownership::OwnerRef;
use crate::services::document::{DocumentService, NewDocument};
use crate::services::file_record::{FileRecordService, NewFileRecord};
use crate::services::upload::UploadRules;
use crate::utils::multipart::UploadedFile;

/// Certificate bytes written to the remote disk but not yet registered.
#[derive(Debug, Clone)]
pub struct StoredCertificate {
    pub name: CertificateName,
    pub disk: String,
    pub path: String,
    pub hash: ContentHash,
}

/// Document details recorded alongside a stored certificate.
#[derive(Debug, Clone)]
pub struct CertificateDocument {
    pub title: String,
    pub expiration_date: Option<NaiveDate>,
    pub metadata: Option<serde_json::Value>,
}

/// Last day before which a certificate issued `today` stays readable.
pub fn default_expiry(today: NaiveDate, config: &UploadConfig) -> Result<NaiveDate, AppError> {
    let days = u64::try_from(config.certificate_validity_days)
        .map_err(|_| AppError::Internal("certificate validity must not be negative".into()))?;
    today
        .checked_add_days(Days::new(days))
        .ok_or_else(|| AppError::Internal("certificate expiry overflow".into()))
}

/// Write certificate bytes under a fresh `certificate/{owner}/{token}_{expiry}` key.
pub async fn put_certificate(
    disks: &DiskRegistry,
    owner_id: i32,
    file: &UploadedFile,
    hash: ContentHash,
    expires_on: NaiveDate,
) -> Result<StoredCertificate, AppError> {
    let disk = disks.remote_disk()?;
    let name = CertificateName::generate(expires_on, &file.name.extension);
    let path = name.path(owner_id);

    disk.put(&path, &file.data, PutOptions::private(file.mimetype()))
        .await?;
    tracing::debug!(disk = disk.name(), %path, %expires_on, "certificate bytes stored");

    Ok(StoredCertificate {
        name,
        disk: disk.name().to_string(),
        path,
        hash,
    })
}

/// Best-effort removal of bytes whose metadata never got committed.
pub async fn discard(disks: &DiskRegistry, stored: &StoredCertificate) {
    let result = match disks.disk(&stored.disk) {
        Ok(disk) => disk.delete(&stored.path).await.map(|_| ()),
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::warn!(
            disk = %stored.disk,
            path = %stored.path,
            error = %e,
            "failed to discard uncommitted certificate, leaving orphaned object"
        );
    }
}

/// Register a stored certificate as a user-owned file plus its document.
pub async fn record_certificate<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    file: &UploadedFile,
    stored: &StoredCertificate,
    details: CertificateDocument,
) -> Result<(document::Model, file_record::Model), DbErr> {
    let record = FileRecordService::new(conn)
        .create(NewFileRecord {
            owner: OwnerRef::User(user_id),
            name: file.name.stem.clone(),
            extension: file.name.extension.clone(),
            mimetype: file.mimetype(),
            size: i64::try_from(file.size()).ok(),
            path: stored.path.clone(),
            disk: stored.disk.clone(),
            hash: stored.hash,
        })
        .await?;

    let doc = DocumentService::new(conn)
        .create(NewDocument {
            title: details.title,
            expiration_date: details.expiration_date,
            metadata: details.metadata,
            file_id: record.id,
            user_id,
        })
        .await?;

    Ok((doc, record))
}

/// Store a certificate uploaded by its owner.
///
/// The filename expiry is `expires_at` when given, otherwise the default
/// validity window from `today`.
pub async fn store_certificate(
    db: &DatabaseConnection,
    disks: &DiskRegistry,
    config: &UploadConfig,
    user_id: i32,
    file: UploadedFile,
    mut details: CertificateDocument,
    today: NaiveDate,
) -> Result<(document::Model, file_record::Model), AppError> {
    UploadRules::certificate(config).validate(&file)?;

    let expires_on = match details.expiration_date {
        Some(date) if date <= today => {
            return Err(AppError::Validation(
                "Expiration date must be in the future".into(),
            ));
        }
        Some(date) => date,
        None => default_expiry(today, config)?,
    };
    details.expiration_date = Some(expires_on);

    let hash = ContentHash::compute(&file.data);
    FileRecordService::new(db)
        .ensure_not_duplicate(OwnerRef::User(user_id), &hash)
        .await?;

    let stored = put_certificate(disks, user_id, &file, hash, expires_on).await?;

    let result = async {
        let txn = db.begin().await?;
        let created = record_certificate(&txn, user_id, &file, &stored, details).await?;
        txn.commit().await?;
        Ok::<_, DbErr>(created)
    }
    .await;

    match result {
        Ok(created) => {
            tracing::info!(user_id, file_id = created.1.id, document_id = created.0.id, "certificate stored");
            Ok(created)
        }
        Err(e) => {
            discard(disks, &stored).await;
            Err(e.into())
        }
    }
}
