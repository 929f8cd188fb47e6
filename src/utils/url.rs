//! Minimal URL handling for history rows.
//!
//! Only the pieces the index needs: the scheme, for the allow-list check
//! at query time, and removal of `user:password@` before anything is stored.

use std::borrow::Cow;

/// Schemes whose rows may be offered as completions
pub const ALLOWED_SCHEMES: &[&str] = &["about", "chrome", "file", "ftp", "http", "https", "mailto"];

/// RFC 3986 scheme of `url`, if it has one
pub fn url_scheme(url: &str) -> Option<&str> {
    let colon = url.find(':')?;
    let scheme = &url[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    chars
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        .then_some(scheme)
}

pub fn is_allowed_scheme(url: &str) -> bool {
    url_scheme(url)
        .map(|scheme| ALLOWED_SCHEMES.iter().any(|a| a.eq_ignore_ascii_case(scheme)))
        .unwrap_or(false)
}

/// Drop the userinfo component of an authority-form URL
pub fn strip_credentials(url: &str) -> Cow<'_, str> {
    let Some(scheme) = url_scheme(url) else {
        return Cow::Borrowed(url);
    };
    let Some(after_slashes) = url[scheme.len() + 1..].strip_prefix("//") else {
        return Cow::Borrowed(url);
    };
    let authority_end = after_slashes
        .find(['/', '?', '#'])
        .unwrap_or(after_slashes.len());
    match after_slashes[..authority_end].rfind('@') {
        Some(at) => Cow::Owned(format!("{}://{}", scheme, &after_slashes[at + 1..])),
        None => Cow::Borrowed(url),
    }
}
