use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of the random part of a certificate filename.
pub const CERTIFICATE_TOKEN_LEN: usize = 40;

/// Default length of upload-link tokens.
pub const UPLOAD_LINK_TOKEN_LEN: usize = 64;

/// Shortest upload-link token the server accepts in configuration.
pub const MIN_LINK_TOKEN_LEN: usize = 40;

/// Generate a URL-safe random token of `len` ASCII letters and digits using
/// the thread-local CSPRNG.
pub fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
