//! Credential storage for the OAuth token set
//!
//! Persists a single `TokenSet` as a flat JSON file. All writes use atomic
//! temp-file + rename to prevent corruption on crash, and the file is
//! created 0600 since it holds bearer tokens.
//!
//! The store is deliberately stateless: every call consults the filesystem,
//! because the file may be removed out-of-band between calls (that is the
//! only path back to the "no credential" state). Single-process use only —
//! two processes sharing one file race last-writer-wins on save.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::token::TokenResponse;

/// Current unix timestamp in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// The persisted token set.
///
/// `expires` is the authoritative absolute unix timestamp in seconds,
/// always derived as issuance time + `expires_in` at creation or refresh.
/// `expires_in` is kept as last received, informational only.
///
/// Updates never mutate in place: refresh produces a new record which then
/// replaces the stored one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Opaque bearer credential for API calls
    pub access_token: String,
    /// Longer-lived credential used to mint a new access token
    pub refresh_token: String,
    /// Scheme for the Authorization header, e.g. "Bearer"
    pub token_type: String,
    /// Seconds-to-live as last received from the token endpoint
    pub expires_in: u64,
    /// Absolute expiry, unix seconds
    pub expires: u64,
}

impl TokenSet {
    /// Build the initial token set from an authorization-code exchange.
    pub fn issued(response: TokenResponse, now: u64) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            token_type: response.token_type.unwrap_or_else(|| "Bearer".into()),
            expires: now + response.expires_in,
            expires_in: response.expires_in,
        }
    }

    /// Build the successor record after a refresh.
    ///
    /// Replaces both tokens and recomputes `expires`; `token_type` is
    /// carried over from the existing record untouched.
    pub fn refreshed(&self, response: TokenResponse, now: u64) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            token_type: self.token_type.clone(),
            expires: now + response.expires_in,
            expires_in: response.expires_in,
        }
    }

    /// Whether the access token is still valid at `now`.
    pub fn is_fresh(&self, now: u64) -> bool {
        now < self.expires
    }

    /// Authorization header value, `"{token_type} {access_token}"`.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Handle to the on-disk credential file.
///
/// Exactly one token set exists at a time; `save` overwrites the whole
/// record. The file is never deleted by this crate.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a persisted token set is present.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read and parse the stored token set.
    pub async fn load(&self) -> Result<TokenSet> {
        if !self.path.exists() {
            return Err(Error::NotFound(self.path.display().to_string()));
        }
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
        let tokens: TokenSet = serde_json::from_str(&contents)
            .map_err(|e| Error::CredentialParse(format!("parsing credential file: {e}")))?;
        debug!(path = %self.path.display(), expires = tokens.expires, "loaded credential");
        Ok(tokens)
    }

    /// Persist a token set, replacing any prior content.
    ///
    /// Writes to a temporary file in the same directory, then renames it
    /// over the target, so a crash mid-write cannot leave a torn file.
    /// Permissions are set to 0600 before the rename (unix only).
    pub async fn save(&self, tokens: &TokenSet) -> Result<()> {
        let json = serde_json::to_string_pretty(tokens)
            .map_err(|e| Error::CredentialParse(format!("serializing credential: {e}")))?;

        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;

        let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

        tokio::fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp_path, perms)
                .await
                .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
        }

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

        info!(path = %self.path.display(), expires = tokens.expires, "persisted credential");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(suffix: &str, expires_in: u64) -> TokenResponse {
        TokenResponse {
            access_token: format!("at_{suffix}"),
            refresh_token: format!("rt_{suffix}"),
            expires_in,
            token_type: Some("Bearer".into()),
        }
    }

    #[test]
    fn issued_derives_expires_from_now_plus_expires_in() {
        let tokens = TokenSet::issued(response("1", 604800), 1_000_000);
        assert_eq!(tokens.expires, 1_604_800);
        assert_eq!(tokens.expires_in, 604800);
        assert_eq!(tokens.access_token, "at_1");
        assert_eq!(tokens.token_type, "Bearer");
    }

    #[test]
    fn issued_defaults_token_type_to_bearer() {
        let resp = TokenResponse {
            token_type: None,
            ..response("1", 3600)
        };
        assert_eq!(TokenSet::issued(resp, 0).token_type, "Bearer");
    }

    #[test]
    fn refreshed_replaces_tokens_and_keeps_token_type() {
        let initial = TokenSet::issued(
            TokenResponse {
                token_type: Some("Custom".into()),
                ..response("1", 3600)
            },
            1_000,
        );
        // Refresh response carries a different token_type — ignored.
        let next = initial.refreshed(response("2", 7200), 2_000);
        assert_eq!(next.access_token, "at_2");
        assert_eq!(next.refresh_token, "rt_2");
        assert_eq!(next.token_type, "Custom");
        assert_eq!(next.expires, 9_200);
        // The prior record is untouched (updates build a new record).
        assert_eq!(initial.access_token, "at_1");
    }

    #[test]
    fn freshness_boundary_is_exclusive() {
        let tokens = TokenSet::issued(response("1", 100), 1_000);
        assert!(tokens.is_fresh(1_099));
        assert!(!tokens.is_fresh(1_100), "expiry instant is already stale");
        assert!(!tokens.is_fresh(2_000));
    }

    #[test]
    fn authorization_header_joins_type_and_token() {
        let tokens = TokenSet::issued(response("1", 100), 0);
        assert_eq!(tokens.authorization_header(), "Bearer at_1");
    }

    #[tokio::test]
    async fn roundtrip_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));

        let tokens = TokenSet::issued(response("1", 604800), unix_now());
        store.save(&tokens).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, tokens);
    }

    #[tokio::test]
    async fn save_overwrites_whole_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));

        store.save(&TokenSet::issued(response("1", 100), 0)).await.unwrap();
        store.save(&TokenSet::issued(response("2", 200), 0)).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.access_token, "at_2");
        assert_eq!(loaded.expires, 200);
    }

    #[tokio::test]
    async fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));

        assert!(!store.exists());
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn load_unparseable_file_is_credential_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let store = CredentialStore::new(path);
        assert!(store.exists());
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::CredentialParse(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn externally_deleted_file_reads_as_absent_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = CredentialStore::new(path.clone());

        store.save(&TokenSet::issued(response("1", 100), 0)).await.unwrap();
        assert!(store.exists());

        tokio::fs::remove_file(&path).await.unwrap();
        assert!(!store.exists());
        assert!(matches!(store.load().await, Err(Error::NotFound(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = CredentialStore::new(path.clone());
        store.save(&TokenSet::issued(response("1", 100), 0)).await.unwrap();

        let mode = tokio::fs::metadata(&path)
            .await
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600, "credential file must be 0600, got {mode:o}");
    }

    #[test]
    fn persisted_layout_matches_flat_record() {
        let tokens = TokenSet::issued(response("1", 3600), 10);
        let json = serde_json::to_string(&tokens).unwrap();
        for key in [
            "\"access_token\"",
            "\"refresh_token\"",
            "\"token_type\"",
            "\"expires_in\":3600",
            "\"expires\":3610",
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }
}
