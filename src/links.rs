//! Watch-link issuance
//!
//! A link is a random token stored with its [`TemporaryRecord`] plus a
//! shareable URL of the form `{base}/{fragment}-{slug}?token={token}`
//! (`{base}/backup-{fragment}-{slug}?token=...` for backup links).

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::RngCore;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use crate::models::{MediaType, TemporaryRecord};
use crate::store::TemporaryRecordStore;

/// Lifetime of every issued link
pub const LINK_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Random bytes in a token (12 hex characters)
const TOKEN_BYTES: usize = 6;
/// Random bytes in the cosmetic URL fragment (6 hex characters)
const FRAGMENT_BYTES: usize = 3;

/// Everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`, the set `encodeURIComponent` escapes
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Which resolver a link redeems through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Primary,
    Backup,
}

/// What to issue a link for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    pub media_type: MediaType,
    pub tmdb_id: String,
    pub title: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

/// A freshly issued link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedLink {
    pub watch_url: String,
    pub token: String,
}

/// Lowercase hex of `bytes` random bytes from the OS-seeded CSPRNG
pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Percent-encode one URL component, leaving the unreserved marks as they are
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// URL-safe slug: lowercased, whitespace runs become `-`, then percent-encoded
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    encode_component(&WHITESPACE.replace_all(&lower, "-"))
}

/// Mints tokens, stores their records, and builds watch URLs
#[derive(Clone)]
pub struct LinkIssuer {
    store: Arc<TemporaryRecordStore>,
    base_url: String,
}

impl LinkIssuer {
    pub fn new(store: Arc<TemporaryRecordStore>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self { store, base_url }
    }

    pub fn store(&self) -> &Arc<TemporaryRecordStore> {
        &self.store
    }

    pub fn issue(&self, request: &LinkRequest, kind: LinkKind) -> IssuedLink {
        let token = random_hex(TOKEN_BYTES);
        let fragment = random_hex(FRAGMENT_BYTES);

        let mut record = TemporaryRecord::new(
            request.media_type,
            request.tmdb_id.clone(),
            request.title.clone(),
        )
        .with_episode(request.season, request.episode);
        record.is_backup = kind == LinkKind::Backup;

        self.store.put(token.clone(), record, LINK_TTL);

        let prefix = match kind {
            LinkKind::Primary => "",
            LinkKind::Backup => "backup-",
        };
        let watch_url = format!(
            "{}/{}{}-{}?token={}",
            self.base_url,
            prefix,
            fragment,
            slugify(&request.title),
            token
        );

        tracing::info!(
            token = %token,
            tmdb_id = %request.tmdb_id,
            backup = kind == LinkKind::Backup,
            "Issued watch link"
        );

        IssuedLink { watch_url, token }
    }

    pub fn issue_primary(&self, request: &LinkRequest) -> IssuedLink {
        self.issue(request, LinkKind::Primary)
    }

    pub fn issue_backup(&self, request: &LinkRequest) -> IssuedLink {
        self.issue(request, LinkKind::Backup)
    }
}
