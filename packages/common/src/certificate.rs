//! Certificate storage naming.
//!
//! Certificates live at `certificate/{owner_id}/{token}_{YYYYMMDD}.{ext}`.
//! The date is the expiry: the public gateway serves the file only while
//! today is strictly before it, so access checks need nothing but the key.

use chrono::NaiveDate;
use thiserror::Error;

use crate::token::{CERTIFICATE_TOKEN_LEN, random_token};

pub const CERTIFICATE_DIR: &str = "certificate";

const EXPIRY_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CertificateNameError {
    #[error("filename has no '_' separator")]
    MissingSeparator,
    #[error("filename has an empty token")]
    EmptyToken,
    #[error("filename has no extension")]
    MissingExtension,
    #[error("invalid expiry {0:?}, expected YYYYMMDD")]
    InvalidExpiry(String),
}

/// Parsed form of a certificate filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateName {
    token: String,
    expires_on: NaiveDate,
    extension: String,
}

impl CertificateName {
    /// New name with a fresh random token.
    pub fn generate(expires_on: NaiveDate, extension: &str) -> Self {
        Self {
            token: random_token(CERTIFICATE_TOKEN_LEN),
            expires_on,
            extension: extension.to_ascii_lowercase(),
        }
    }

    pub fn parse(filename: &str) -> Result<Self, CertificateNameError> {
        let (token, rest) = filename
            .split_once('_')
            .ok_or(CertificateNameError::MissingSeparator)?;
        if token.is_empty() {
            return Err(CertificateNameError::EmptyToken);
        }

        let (expiry, extension) = rest
            .rsplit_once('.')
            .ok_or(CertificateNameError::MissingExtension)?;
        if extension.is_empty() {
            return Err(CertificateNameError::MissingExtension);
        }

        if expiry.len() != 8 || !expiry.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CertificateNameError::InvalidExpiry(expiry.to_string()));
        }
        let expires_on = NaiveDate::parse_from_str(expiry, EXPIRY_FORMAT)
            .map_err(|_| CertificateNameError::InvalidExpiry(expiry.to_string()))?;

        Ok(Self {
            token: token.to_string(),
            expires_on,
            extension: extension.to_string(),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_on(&self) -> NaiveDate {
        self.expires_on
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn filename(&self) -> String {
        format!(
            "{}_{}.{}",
            self.token,
            self.expires_on.format(EXPIRY_FORMAT),
            self.extension
        )
    }

    /// Storage key of this certificate for `owner_id`.
    pub fn path(&self, owner_id: i32) -> String {
        format!("{}{}", owner_prefix(owner_id), self.filename())
    }

    /// A certificate expiring today is already inaccessible.
    pub fn is_accessible_on(&self, today: NaiveDate) -> bool {
        today < self.expires_on
    }
}

/// Directory holding every certificate of `owner_id`, with trailing slash.
pub fn owner_prefix(owner_id: i32) -> String {
    format!("{CERTIFICATE_DIR}/{owner_id}/")
}

/// Extract `(owner_id, filename)` from a stored certificate key.
///
/// The owner is the second path segment and the filename the last one; the
/// filename must start with a non-empty token followed by `_`.
pub fn gateway_parts(path: &str) -> Option<(&str, &str)> {
    if !path.contains(&format!("{CERTIFICATE_DIR}/")) {
        return None;
    }

    let mut segments = path.split('/');
    let owner_id = segments.nth(1).filter(|s| !s.is_empty())?;
    let filename = path.rsplit('/').next().filter(|s| !s.is_empty())?;

    let stem = filename
        .rsplit_once('.')
        .map_or(filename, |(stem, _ext)| stem);
    let (token, _) = stem.split_once('_')?;
    if token.is_empty() {
        return None;
    }

    Some((owner_id, filename))
}
