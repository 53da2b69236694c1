// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use url::Url;

pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub(crate) const DEFAULT_COOKIE_NAME: &str = "token";
pub(crate) const DEFAULT_TOKEN_DAYS: u32 = 2;
pub(crate) const DEFAULT_EXPIRY_DELAY: Duration = Duration::from_secs(1);

/// Resolved client settings shared by the credential store, the request
/// pipeline and the session.
#[derive(Clone, Debug)]
pub(crate) struct Config {
    base_url: Url,
    cookie_name: String,
    token_days: u32,
    expiry_delay: Duration,
}

impl Config {
    pub(crate) fn new(base_url: Url) -> Self {
        Self {
            base_url: normalize(base_url),
            cookie_name: DEFAULT_COOKIE_NAME.to_owned(),
            token_days: DEFAULT_TOKEN_DAYS,
            expiry_delay: DEFAULT_EXPIRY_DELAY,
        }
    }

    pub(crate) fn with_cookie_name(mut self, name: &str) -> Self {
        self.cookie_name = name.to_owned();
        self
    }

    pub(crate) const fn with_token_days(mut self, days: u32) -> Self {
        self.token_days = days;
        self
    }

    pub(crate) const fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub(crate) const fn token_days(&self) -> u32 {
        self.token_days
    }

    pub(crate) const fn expiry_delay(&self) -> Duration {
        self.expiry_delay
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        // LINT: The default URL is a compile-time constant.
        #[allow(clippy::expect_used)]
        Self::new(Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"))
    }
}

// Relative joins replace the last path segment unless the base ends in a
// slash.
fn normalize(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
