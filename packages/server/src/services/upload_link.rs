use chrono::{DateTime, Duration, Utc};
use common::token::random_token;
use common::{ContentHash, DiskRegistry};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::config::UploadConfig;
use crate::entity::{document, file_record, upload_link};
use crate::error::AppError;
use crate::ownership::OwnerRef;
use crate::services::certificate::{
    CertificateDocument, default_expiry, discard, put_certificate, record_certificate,
};
use crate::services::file_record::FileRecordService;
use crate::services::upload::{UploadRules, validate_title};
use crate::utils::multipart::UploadedFile;

pub struct UploadLinkService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> UploadLinkService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Issue a link valid for `duration_days` from `now`.
    pub async fn issue(
        &self,
        user_id: i32,
        title: Option<String>,
        duration_days: i64,
        config: &UploadConfig,
        now: DateTime<Utc>,
    ) -> Result<upload_link::Model, AppError> {
        if !(1..=config.max_link_duration_days).contains(&duration_days) {
            return Err(AppError::Validation(format!(
                "Duration must be between 1 and {} days",
                config.max_link_duration_days
            )));
        }
        let title = title
            .filter(|t| !t.trim().is_empty())
            .map(|t| validate_title(&t))
            .transpose()?;

        let model = upload_link::ActiveModel {
            user_id: Set(user_id),
            token: Set(random_token(config.link_token_length)),
            title: Set(title),
            expires_at: Set(now + Duration::days(duration_days)),
            used_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        };
        let link = model.insert(self.conn).await?;
        tracing::info!(link_id = link.id, user_id, expires_at = %link.expires_at, "upload link issued");
        Ok(link)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<upload_link::Model>, DbErr> {
        upload_link::Entity::find()
            .filter(upload_link::Column::Token.eq(token))
            .one(self.conn)
            .await
    }

    pub async fn latest_for_user(&self, user_id: i32) -> Result<Option<upload_link::Model>, DbErr> {
        upload_link::Entity::find()
            .filter(upload_link::Column::UserId.eq(user_id))
            .order_by_desc(upload_link::Column::CreatedAt)
            .order_by_desc(upload_link::Column::Id)
            .one(self.conn)
            .await
    }

    /// Mark the link used if nobody did so first.
    ///
    /// Returns `false` when another request already claimed it.
    pub async fn claim(&self, link_id: i32, now: DateTime<Utc>) -> Result<bool, DbErr> {
        let result = upload_link::Entity::update_many()
            .col_expr(upload_link::Column::UsedAt, Expr::value(now))
            .filter(upload_link::Column::Id.eq(link_id))
            .filter(upload_link::Column::UsedAt.is_null())
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected == 1)
    }
}

/// Address at which the uploader reaches the link.
pub fn link_url(app_url: &str, token: &str) -> String {
    format!(
        "{}/api/v1/public/upload-links/{token}",
        app_url.trim_end_matches('/')
    )
}

/// A link that exists and can still be used, or the reason it cannot.
pub async fn usable_link<C: ConnectionTrait>(
    conn: &C,
    token: &str,
    now: DateTime<Utc>,
) -> Result<upload_link::Model, AppError> {
    let link = UploadLinkService::new(conn)
        .find_by_token(token)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload link not found".into()))?;

    if link.used_at.is_some() {
        return Err(AppError::Gone("This upload link has already been used".into()));
    }
    if !link.is_usable_at(now) {
        return Err(AppError::Gone("This upload link has expired".into()));
    }
    Ok(link)
}

/// Deposit one certificate through a link and use the link up.
///
/// Bytes are written before the transaction; if claiming the link or
/// inserting metadata fails the transaction rolls back, the link stays
/// usable and the bytes are discarded.
pub async fn consume(
    db: &DatabaseConnection,
    disks: &DiskRegistry,
    config: &UploadConfig,
    token: &str,
    file: UploadedFile,
    supplied_title: Option<String>,
    now: DateTime<Utc>,
) -> Result<(document::Model, file_record::Model), AppError> {
    let link = usable_link(db, token, now).await?;

    UploadRules::certificate(config).validate(&file)?;
    let title = match &link.title {
        Some(title) => title.clone(),
        None => {
            let supplied = supplied_title
                .ok_or_else(|| AppError::Validation("A title is required".into()))?;
            validate_title(&supplied)?
        }
    };

    let hash = ContentHash::compute(&file.data);
    FileRecordService::new(db)
        .ensure_not_duplicate(OwnerRef::User(link.user_id), &hash)
        .await?;

    let today = now.date_naive();
    let expires_on = default_expiry(today, config)?;
    let stored = put_certificate(disks, link.user_id, &file, hash, expires_on).await?;

    let result = async {
        let txn = db.begin().await?;
        if !UploadLinkService::new(&txn).claim(link.id, now).await? {
            return Err(AppError::Gone(
                "This upload link has already been used".into(),
            ));
        }
        let created = record_certificate(
            &txn,
            link.user_id,
            &file,
            &stored,
            CertificateDocument {
                title,
                expiration_date: Some(expires_on),
                metadata: None,
            },
        )
        .await?;
        txn.commit().await?;
        Ok(created)
    }
    .await;

    match result {
        Ok(created) => {
            tracing::info!(
                link_id = link.id,
                user_id = link.user_id,
                document_id = created.0.id,
                "upload link consumed"
            );
            Ok(created)
        }
        Err(e) => {
            discard(disks, &stored).await;
            Err(e)
        }
    }
}
