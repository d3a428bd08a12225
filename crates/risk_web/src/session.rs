//! Cookie-backed session holding the active display language
//!
//! The cookie value is `<locale tag>.<blake3 keyed MAC>`. Anything that
//! fails verification is treated as no session at all.

use axum::http::{header, HeaderMap};
use riskcalc_core::Locale;
use thiserror::Error;

pub const SESSION_COOKIE: &str = "riskcalc_session";

#[derive(Error, Debug)]
pub enum SessionKeyError {
    #[error("Session secret is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Session secret must be 32 bytes, got {0}")]
    Length(usize),
}

/// Key used to sign and verify session cookies
#[derive(Clone)]
pub struct SessionKey([u8; 32]);

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

impl SessionKey {
    pub fn new(key: [u8; 32]) -> Self {
        Self(key)
    }

    pub fn from_hex(secret: &str) -> Result<Self, SessionKeyError> {
        let bytes = hex::decode(secret.trim())?;
        let key: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| SessionKeyError::Length(bytes.len()))?;
        Ok(Self(key))
    }

    /// Fresh per-process key; sessions do not survive a restart
    pub fn random() -> Self {
        Self(rand::random())
    }

    fn mac(&self, payload: &str) -> blake3::Hash {
        blake3::keyed_hash(&self.0, payload.as_bytes())
    }

    /// Signed cookie value for `locale`
    pub fn encode(&self, locale: Locale) -> String {
        let tag = locale.tag();
        format!("{tag}.{}", self.mac(tag).to_hex())
    }

    /// Verify a cookie value and extract its locale
    pub fn decode(&self, value: &str) -> Option<Locale> {
        let (tag, mac_hex) = value.rsplit_once('.')?;
        let mac = blake3::Hash::from_hex(mac_hex).ok()?;
        // blake3::Hash equality is constant-time
        if self.mac(tag) != mac {
            return None;
        }
        tag.parse().ok()
    }

    /// Locale stored in the request's session cookie, if present and valid
    pub fn read(&self, headers: &HeaderMap) -> Option<Locale> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| *name == SESSION_COOKIE)
            .find_map(|(_, value)| self.decode(value))
    }

    /// `Set-Cookie` header value persisting `locale` for the browser session
    pub fn set_cookie(&self, locale: Locale) -> String {
        format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            self.encode(locale)
        )
    }
}
