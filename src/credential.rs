// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Cookie-backed storage for the bearer token.
//!
//! The jar mirrors how a browser keeps site cookies: entries carry an
//! absolute expiry, expired entries are evicted, and lookups go through the
//! ambient `name=value; name=value` string rather than the structured list.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::Result, storage::Storage};

const SECONDS_PER_DAY: i64 = 86_400;
const EVICTION_MAX_AGE: i64 = -99_999_999;

pub(crate) type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub(crate) fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Strict => f.write_str("Strict"),
            Self::Lax => f.write_str("Lax"),
            Self::None => f.write_str("None"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Cookie {
    name: String,
    value: String,
    expires: DateTime<Utc>,
    path: String,
    same_site: SameSite,
}

impl Cookie {
    /// A site-wide, strictly same-site cookie expiring `ttl_days` after `now`.
    pub(crate) fn new(name: &str, value: &str, ttl_days: u32, now: DateTime<Utc>) -> Self {
        Self {
            name: name.to_owned(),
            value: value.to_owned(),
            expires: now + Duration::seconds(i64::from(ttl_days) * SECONDS_PER_DAY),
            path: "/".to_owned(),
            same_site: SameSite::Strict,
        }
    }

    /// An empty cookie that is already past its expiry.
    pub(crate) fn expired(name: &str, now: DateTime<Utc>) -> Self {
        Self {
            name: name.to_owned(),
            value: String::new(),
            expires: now + Duration::seconds(EVICTION_MAX_AGE),
            path: "/".to_owned(),
            same_site: SameSite::Strict,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) const fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    pub(crate) fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    /// The `Set-Cookie` form of this cookie.
    #[cfg(test)]
    pub(crate) fn header(&self) -> String {
        format!(
            "{}={};expires={};path={};SameSite={}",
            self.name,
            self.value,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.path,
            self.same_site
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    /// All live cookies joined the way a `Cookie` request header carries them.
    pub(crate) fn ambient(&self, now: DateTime<Utc>) -> String {
        self.cookies
            .iter()
            .filter(|cookie| !cookie.is_expired(now))
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub(crate) fn get(&self, name: &str, now: DateTime<Utc>) -> Option<String> {
        parse_cookie(&self.ambient(now), name).map(str::to_owned)
    }

    pub(crate) fn set(&mut self, cookie: Cookie, now: DateTime<Utc>) {
        self.cookies
            .retain(|c| !c.is_expired(now) && !(c.name == cookie.name && c.path == cookie.path));
        if cookie.is_expired(now) {
            debug!("Evicting cookie {}", cookie.name());
        } else {
            self.cookies.push(cookie);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.cookies.len()
    }
}

/// Finds the first exact `name=` segment of an ambient cookie string. An
/// empty value counts as absent.
pub(crate) fn parse_cookie<'a>(ambient: &'a str, name: &str) -> Option<&'a str> {
    ambient
        .split(';')
        .map(str::trim_start)
        .find_map(|segment| segment.strip_prefix(name)?.strip_prefix('='))
        .filter(|value| !value.is_empty())
}

pub(crate) trait CredentialStore: Send + Sync {
    fn read(&self, name: &str) -> Option<String>;
    fn write(&self, name: &str, value: &str, ttl_days: u32) -> Result<()>;
    fn clear(&self, name: &str);
}

/// A [`CredentialStore`] keeping a [`CookieJar`] in a storage backend.
pub(crate) struct CookieStore<S> {
    storage: S,
    clock: Clock,
}

impl<S: Storage<CookieJar>> CookieStore<S> {
    pub(crate) fn new(storage: S) -> Self {
        Self::with_clock(storage, system_clock())
    }

    pub(crate) fn with_clock(storage: S, clock: Clock) -> Self {
        Self { storage, clock }
    }

    fn jar(&self) -> Result<CookieJar> {
        Ok(self.storage.get()?.unwrap_or_default())
    }

    fn put(&self, cookie: Cookie) -> Result<()> {
        let now = (self.clock)();
        let mut jar = self.jar()?;
        jar.set(cookie, now);
        if jar.len() == 0 {
            self.storage.clear()
        } else {
            self.storage.update(&jar)
        }
    }
}

impl<S: Storage<CookieJar>> CredentialStore for CookieStore<S> {
    fn read(&self, name: &str) -> Option<String> {
        match self.jar() {
            Ok(jar) => jar.get(name, (self.clock)()),
            Err(e) => {
                warn!("We could not read the cookie jar, so we're treating it as empty: {}", e);
                None
            }
        }
    }

    fn write(&self, name: &str, value: &str, ttl_days: u32) -> Result<()> {
        let cookie = Cookie::new(name, value, ttl_days, (self.clock)());
        debug!("Storing cookie {} until {}", name, cookie.expires());
        self.put(cookie)
    }

    fn clear(&self, name: &str) {
        if let Err(e) = self.put(Cookie::expired(name, (self.clock)())) {
            warn!("We could not remove cookie {}: {}", name, e);
        }
    }
}

/// The token slot of a [`CredentialStore`], bound to the configured cookie
/// name and lifetime.
#[derive(Clone)]
pub(crate) struct Credentials {
    store: Arc<dyn CredentialStore>,
    name: String,
    ttl_days: u32,
}

impl Credentials {
    pub(crate) fn new(store: Arc<dyn CredentialStore>, config: &Config) -> Self {
        Self {
            store,
            name: config.cookie_name().to_owned(),
            ttl_days: config.token_days(),
        }
    }

    pub(crate) fn token(&self) -> Option<SecretString> {
        self.store.read(&self.name).map(SecretString::new)
    }

    pub(crate) fn store(&self, token: &SecretString) -> Result<()> {
        self.store.write(&self.name, token.expose_secret(), self.ttl_days)
    }

    pub(crate) fn forget(&self) {
        self.store.clear(&self.name);
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::TimeZone as _;

    use crate::storage::{File, Memory};

    use super::*;

    fn fixed(at: DateTime<Utc>) -> (Clock, Arc<Mutex<DateTime<Utc>>>) {
        let now = Arc::new(Mutex::new(at));
        let handle = Arc::clone(&now);
        let clock: Clock = Arc::new(move || *handle.lock().expect("clock lock"));
        (clock, now)
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn parse_finds_exact_segment() {
        let ambient = "theme=dark; token=abc; xtoken=zzz";
        assert_eq!(parse_cookie(ambient, "token"), Some("abc"));
        assert_eq!(parse_cookie(ambient, "theme"), Some("dark"));
        assert_eq!(parse_cookie(ambient, "oken"), None);
        assert_eq!(parse_cookie(ambient, "missing"), None);
        assert_eq!(parse_cookie("", "token"), None);
        assert_eq!(parse_cookie("token=", "token"), None);
    }

    #[test]
    fn parse_returns_first_match() {
        assert_eq!(parse_cookie("token=first; token=second", "token"), Some("first"));
    }

    #[test]
    fn write_then_read_round_trips() {
        let store = CookieStore::new(Memory::<CookieJar>::new());
        for (name, value) in [("token", "abc"), ("session", "eyJhbGciOiJIUzI1NiJ9.e30.x")] {
            store.write(name, value, 2).expect("write");
            assert_eq!(store.read(name).as_deref(), Some(value));
        }
        assert_eq!(store.read("token").as_deref(), Some("abc"));
    }

    #[test]
    fn overwrite_replaces_value() {
        let store = CookieStore::new(Memory::<CookieJar>::new());
        store.write("token", "old", 2).expect("write");
        store.write("token", "new", 2).expect("write");
        assert_eq!(store.read("token").as_deref(), Some("new"));
    }

    #[test]
    fn clear_evicts() {
        let store = CookieStore::new(Memory::<CookieJar>::new());
        store.write("token", "abc", 2).expect("write");
        store.write("theme", "dark", 2).expect("write");
        store.clear("token");
        assert_eq!(store.read("token"), None);
        assert_eq!(store.read("theme").as_deref(), Some("dark"));

        store.clear("never-written");
        assert_eq!(store.read("never-written"), None);
    }

    #[test]
    fn expires_after_ttl() {
        let (clock, now) = fixed(start());
        let store = CookieStore::with_clock(Memory::<CookieJar>::new(), clock);
        store.write("token", "abc", 2).expect("write");

        *now.lock().expect("clock lock") = start() + Duration::days(2) - Duration::seconds(1);
        assert_eq!(store.read("token").as_deref(), Some("abc"));

        *now.lock().expect("clock lock") = start() + Duration::days(2);
        assert_eq!(store.read("token"), None);
    }

    #[test]
    fn cookie_header_carries_attributes() {
        let cookie = Cookie::new("token", "abc", 2, start());
        assert_eq!(
            cookie.header(),
            "token=abc;expires=Tue, 20 Oct 2026 12:00:00 GMT;path=/;SameSite=Strict"
        );
        assert!(Cookie::expired("token", start()).is_expired(start()));
    }

    #[test]
    fn file_backed_store_survives_restart() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cookies.json");

        CookieStore::new(File::at(&path)).write("token", "abc", 2)?;
        let reopened = CookieStore::new(File::at(&path));
        assert_eq!(reopened.read("token").as_deref(), Some("abc"));

        reopened.clear("token");
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn credentials_use_configured_slot() -> Result<()> {
        let store: Arc<dyn CredentialStore> =
            Arc::new(CookieStore::new(Memory::<CookieJar>::new()));
        let credentials = Credentials::new(
            Arc::clone(&store),
            &Config::default().with_cookie_name("auth"),
        );

        credentials.store(&SecretString::new("abc".to_owned()))?;
        assert_eq!(store.read("auth").as_deref(), Some("abc"));
        assert_eq!(store.read("token"), None);
        assert_eq!(
            credentials.token().map(|t| t.expose_secret().clone()).as_deref(),
            Some("abc")
        );

        credentials.forget();
        assert!(credentials.token().is_none());
        Ok(())
    }
}
