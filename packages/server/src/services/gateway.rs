use chrono::NaiveDate;
use common::certificate::owner_prefix;
use common::{CertificateName, DiskRegistry};

use crate::error::AppError;

/// A certificate the gateway is willing to serve.
#[derive(Debug)]
pub struct CertificateContent {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Look up a certificate purely from storage: the key itself carries the
/// expiry, so no database row is consulted.
pub async fn show_public(
    disks: &DiskRegistry,
    owner_id: i32,
    filename: &str,
    today: NaiveDate,
) -> Result<CertificateContent, AppError> {
    let disk = disks.remote_disk()?;
    let keys = disk.list(&owner_prefix(owner_id)).await?;

    let matched = keys.into_iter().find_map(|key| {
        let name = key.rsplit('/').next()?;
        if name != filename {
            return None;
        }
        match CertificateName::parse(name) {
            Ok(parsed) => Some((key.clone(), parsed)),
            Err(e) => {
                tracing::debug!(%key, error = %e, "skipping unparseable certificate key");
                None
            }
        }
    });

    let Some((key, name)) = matched else {
        return Err(AppError::NotFound("Certificate not found".into()));
    };

    if !name.is_accessible_on(today) {
        tracing::debug!(owner_id, expires_on = %name.expires_on(), %today, "certificate expired");
        return Err(AppError::Gone("This certificate has expired".into()));
    }

    let data = disk.get(&key).await?;
    let content_type = mime_guess::from_ext(name.extension())
        .first_or_octet_stream()
        .to_string();

    Ok(CertificateContent {
        filename: name.filename(),
        content_type,
        data,
    })
}
