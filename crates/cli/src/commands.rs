//! Subcommand implementations.
//!
//! Each command takes resolved [`Settings`] and returns what `main` prints,
//! so the same code paths are exercised by tests without a process boundary.

use anyhow::{bail, Context, Result};
use bwt_auth::{
    AuthResult, AuthSession, AuthorizedSession, Authorizer, NewSession, SessionKey, SessionStore,
    SqliteSessionStore,
};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use tracing::{debug, info};

use crate::config::Settings;

/// Options for `issue`.
#[derive(Debug, Clone, Default)]
pub struct IssueOptions {
    pub did: String,
    pub expires: Option<String>,
    pub host: String,
    pub note: String,
    pub record: bool,
}

/// Parse an explicit expiry time.
///
/// Accepts RFC 3339 and the same layout with a colon-less offset
/// (`2030-01-01T00:00:00+0800`).
pub fn parse_expiry(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .map_err(|_| {
            anyhow::anyhow!("Invalid expiration time! Accepted format is YYYY-MM-DDTHH:MM:SS+ZZZZ")
        })
}

/// `now` plus the configured validity, failing instead of overflowing.
fn default_expiry(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    Duration::try_days(i64::from(days))
        .and_then(|validity| now.checked_add_signed(validity))
        .ok_or_else(|| anyhow::anyhow!("default_validity_days = {days} is out of range"))
}

/// Mint a token for `opts.did` and record its session unless told not to.
pub async fn issue(settings: &Settings, opts: IssueOptions, now: DateTime<Utc>) -> Result<String> {
    let exp = match opts.expires.as_deref() {
        Some(value) => parse_expiry(value)?.timestamp(),
        None => default_expiry(now, settings.validity_days)?.timestamp(),
    };

    let session = AuthSession::issue(opts.did, now.timestamp(), exp);
    let token = bwt::mint(&session, &settings.secret()?).context("Failed to mint token")?;

    if opts.record {
        let store = open_store(settings)?;
        let row = NewSession::for_token(&session)
            .with_host(opts.host)
            .with_note(opts.note);
        store
            .insert(row)
            .await
            .context("Failed to record session")?;
    }

    info!(jti = %session.jti, did = %session.did, exp, recorded = opts.record, "Issued token");
    Ok(token)
}

/// Create the session database if it does not exist yet.
///
/// Returns whether the file was created.
pub fn init_db(settings: &Settings) -> Result<bool> {
    let store = open_store(settings)?;
    if store.was_created() {
        info!(path = %settings.sqlite_path.display(), "Session database initialized");
    } else {
        info!(path = %settings.sqlite_path.display(), "Session database already exists");
    }
    Ok(store.was_created())
}

/// Decode a token without verifying it, as pretty JSON.
pub fn inspect(token: &str) -> Result<String> {
    let payload: serde_json::Value = bwt::parse(token).context("Failed to decode token")?;
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Run the full authorization check on `token`.
///
/// The outer error covers setup problems (no secret, unreadable database);
/// the inner result is the authorization verdict.
pub async fn verify(
    settings: &Settings,
    token: &str,
    now: DateTime<Utc>,
) -> Result<AuthResult<AuthorizedSession>> {
    let authorizer = Authorizer::new(settings.secret()?, open_store(settings)?);
    let verdict = authorizer.authorize(token.trim(), now.timestamp()).await;
    debug!(authorized = verdict.is_ok(), "Verified token");
    Ok(verdict)
}

/// JSON shown for an authorized session.
pub fn describe(authorized: &AuthorizedSession) -> Result<String> {
    let value = serde_json::json!({
        "info": authorized.info,
        "expired": authorized.expired,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Mark the session `jti` invalid.
pub async fn revoke(settings: &Settings, jti: &str) -> Result<()> {
    let store = open_store(settings)?;
    if !store.revoke(&SessionKey::from(jti)).await? {
        bail!("No session recorded under {jti}");
    }
    info!(jti, "Revoked session");
    Ok(())
}

fn open_store(settings: &Settings) -> Result<SqliteSessionStore> {
    SqliteSessionStore::open(&settings.sqlite_path).with_context(|| {
        format!(
            "Failed to open session database {}",
            settings.sqlite_path.display()
        )
    })
}
