use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};
use http::HeaderValue;
use tower_cookies::cookie::SameSite;
use zeroize::Zeroizing;

/// Cookie name used when `COOKIE_NAME` is unset.
pub const DEFAULT_COOKIE_NAME: &str = "app_user";
/// Cookie lifetime used when `COOKIE_MAX_AGE_SECS` is unset (30 days).
pub const DEFAULT_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 30;
/// Bind address used when `BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
/// Browser origins allowed to make credentialed requests when `ALLOWED_ORIGINS` is unset.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://[::1]:3000",
];

/// Attributes applied to the session cookie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieSettings {
    /// The cookie name.
    pub name: String,
    /// Whether the cookie carries `Secure`. On in production only.
    pub secure: bool,
    /// The `SameSite` policy.
    pub same_site: SameSite,
    /// The cookie path.
    pub path: String,
    /// The cookie lifetime in seconds.
    pub max_age_secs: i64,
}

impl CookieSettings {
    /// Defaults for the given environment.
    pub fn for_environment(production: bool) -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            secure: production,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: DEFAULT_MAX_AGE_SECS,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self::for_environment(false)
    }
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The address the server listens on.
    pub bind_addr: SocketAddr,
    /// Whether `APP_ENV` is `production`.
    pub production: bool,
    /// Origins allowed by the CORS layer.
    pub allowed_origins: Vec<HeaderValue>,
    /// Session cookie attributes.
    pub cookie: CookieSettings,
    /// The secret the cookie encryption key is derived from.
    pub cookie_secret: Zeroizing<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("production", &self.production)
            .field("allowed_origins", &self.allowed_origins)
            .field("cookie", &self.cookie)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`. Fails if `COOKIE_SECRET` is missing or any
    /// variable has an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a `Config` from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cookie_secret = lookup("COOKIE_SECRET")
            .filter(|s| !s.is_empty())
            .map(Zeroizing::new)
            .context("COOKIE_SECRET must be set (base64 32-byte key or any passphrase)")?;

        let production = lookup("APP_ENV")
            .unwrap_or_else(|| "development".to_string())
            == "production";

        let mut cookie = CookieSettings::for_environment(production);

        if let Some(name) = lookup("COOKIE_NAME").filter(|s| !s.is_empty()) {
            cookie.name = name;
        }

        if let Some(same_site) = lookup("COOKIE_SAME_SITE") {
            cookie.same_site = parse_same_site(&same_site)?;
        }

        if let Some(path) = lookup("COOKIE_PATH").filter(|s| !s.is_empty()) {
            cookie.path = path;
        }

        if let Some(max_age) = lookup("COOKIE_MAX_AGE_SECS") {
            let max_age_secs: i64 = max_age
                .parse()
                .context("Invalid COOKIE_MAX_AGE_SECS")?;
            if max_age_secs < 0 {
                anyhow::bail!("Invalid COOKIE_MAX_AGE_SECS: {} (must not be negative)", max_age_secs);
            }
            cookie.max_age_secs = max_age_secs;
        }

        let bind_addr: SocketAddr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("Invalid BIND_ADDR")?;

        let allowed_origins = match lookup("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|origin| {
                    HeaderValue::from_str(origin)
                        .with_context(|| format!("Invalid origin in ALLOWED_ORIGINS: {}", origin))
                })
                .collect::<Result<Vec<_>>>()?,
            None => DEFAULT_ALLOWED_ORIGINS
                .into_iter()
                .map(HeaderValue::from_static)
                .collect(),
        };

        Ok(Self {
            bind_addr,
            production,
            allowed_origins,
            cookie,
            cookie_secret,
        })
    }
}

fn parse_same_site(value: &str) -> Result<SameSite> {
    match value.to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" => Ok(SameSite::None),
        other => anyhow::bail!("Invalid COOKIE_SAME_SITE: {} (expected lax, strict or none)", other),
    }
}
