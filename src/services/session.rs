//! Encrypted session cookie storage.
//!
//! [`SessionStore`] holds the codec and cookie attributes for the whole process.
//! [`SessionJar`] binds the store to one request and is what handlers use.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use http::{header, request::Parts, HeaderMap};
use tower_cookies::cookie::time::Duration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::{
    config::CookieSettings,
    crypto::codec::SessionCodec,
    error::{AppError, Result},
    models::{session::SessionState, user::UserRecord},
};

/// Per-call overrides of the configured cookie attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieOptions {
    /// Cookie name; defaults to the configured name.
    pub name: Option<String>,
    /// Cookie path; defaults to the configured path.
    pub path: Option<String>,
    /// `SameSite` policy; defaults to the configured policy.
    pub same_site: Option<SameSite>,
    /// Lifetime in seconds; defaults to the configured lifetime.
    pub max_age_secs: Option<i64>,
}

impl CookieOptions {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn with_max_age_secs(mut self, secs: i64) -> Self {
        self.max_age_secs = Some(secs);
        self
    }
}

/// Process-wide session cookie settings and codec.
#[derive(Clone, Debug)]
pub struct SessionStore {
    codec: SessionCodec,
    settings: Arc<CookieSettings>,
}

impl SessionStore {
    /// Creates a new `SessionStore`.
    pub fn new(codec: SessionCodec, settings: CookieSettings) -> Self {
        Self {
            codec,
            settings: Arc::new(settings),
        }
    }

    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    pub fn settings(&self) -> &CookieSettings {
        &self.settings
    }

    fn cookie_name<'a>(&'a self, options: &'a CookieOptions) -> &'a str {
        options.name.as_deref().unwrap_or(&self.settings.name)
    }

    /// Builds the session cookie carrying `value`.
    pub fn session_cookie(&self, value: String, options: &CookieOptions) -> Cookie<'static> {
        let mut cookie = Cookie::new(self.cookie_name(options).to_string(), value);

        cookie.set_http_only(true);
        cookie.set_secure(self.settings.secure);
        cookie.set_same_site(options.same_site.unwrap_or(self.settings.same_site));
        cookie.set_path(
            options
                .path
                .clone()
                .unwrap_or_else(|| self.settings.path.clone()),
        );
        cookie.set_max_age(Duration::seconds(
            options.max_age_secs.unwrap_or(self.settings.max_age_secs),
        ));

        cookie
    }

    /// Builds the cookie that overwrites the session with an empty, already expired value.
    pub fn expired_cookie(&self, options: &CookieOptions) -> Cookie<'static> {
        let mut cookie = self.session_cookie(String::new(), options);
        cookie.set_max_age(Duration::seconds(0));
        cookie
    }

    /// Decrypts a raw cookie value. Absent or empty values are `NoSession`.
    pub fn read(&self, token: Option<&str>) -> SessionState {
        match token {
            None | Some("") => SessionState::NoSession,
            Some(token) => {
                let state = self.codec.decrypt(token);
                if let SessionState::Malformed(reason) = &state {
                    tracing::debug!("🍪 Ignoring unreadable session cookie: {}", reason);
                }
                state
            }
        }
    }
}

/// The session store bound to the current request.
///
/// Writing requires `CookieManagerLayer`. Without it, `set_session` and
/// `init_session` fail with [`AppError::MutationContext`] and `remove_session`
/// does nothing. Reads fall back to the raw `Cookie` request header.
pub struct SessionJar {
    store: SessionStore,
    cookies: Option<Cookies>,
    request_cookies: Vec<Cookie<'static>>,
}

impl SessionJar {
    /// A jar with no response cookie access, reading from `headers` only.
    pub fn detached(store: SessionStore, headers: &HeaderMap) -> Self {
        Self {
            store,
            cookies: None,
            request_cookies: parse_cookie_headers(headers),
        }
    }

    /// A jar backed by the `tower-cookies` jar of the current request.
    pub fn attached(store: SessionStore, cookies: Cookies) -> Self {
        Self {
            store,
            cookies: Some(cookies),
            request_cookies: Vec::new(),
        }
    }

    /// Whether outgoing cookies can be written.
    pub fn can_write(&self) -> bool {
        self.cookies.is_some()
    }

    /// Writes a session cookie holding encrypted `null`.
    pub fn init_session(&self) -> Result<()> {
        self.set_session_with(None, &CookieOptions::default())
    }

    /// Writes `payload` into the encrypted session cookie.
    pub fn set_session(&self, payload: Option<&UserRecord>) -> Result<()> {
        self.set_session_with(payload, &CookieOptions::default())
    }

    pub fn set_session_with(
        &self,
        payload: Option<&UserRecord>,
        options: &CookieOptions,
    ) -> Result<()> {
        let cookies = self.cookies.as_ref().ok_or(AppError::MutationContext)?;

        let token = self.store.codec().encrypt(payload)?;
        let cookie = self.store.session_cookie(token.into_string(), options);
        let name = cookie.name().to_string();
        cookies.add(cookie);

        tracing::info!(
            "✅ Session cookie set: {} (user: {})",
            name,
            payload.and_then(UserRecord::id).unwrap_or("anonymous")
        );
        Ok(())
    }

    /// Reads and decrypts the session cookie.
    pub fn get_session(&self) -> SessionState {
        self.get_session_with(&CookieOptions::default())
    }

    pub fn get_session_with(&self, options: &CookieOptions) -> SessionState {
        let name = self.store.cookie_name(options);

        let token = match &self.cookies {
            Some(cookies) => cookies.get(name).map(|c| c.value().to_string()),
            None => self
                .request_cookies
                .iter()
                .find(|c| c.name() == name)
                .map(|c| c.value().to_string()),
        };

        self.store.read(token.as_deref())
    }

    /// Expires the session cookie.
    pub fn remove_session(&self) {
        self.remove_session_with(&CookieOptions::default())
    }

    pub fn remove_session_with(&self, options: &CookieOptions) {
        let Some(cookies) = &self.cookies else {
            tracing::debug!("🍪 Session removal skipped: cookies are read-only here");
            return;
        };

        let cookie = self.store.expired_cookie(options);
        let name = cookie.name().to_string();
        cookies.add(cookie);
        tracing::info!("✅ Session cookie expired: {}", name);
    }
}

impl<S> FromRequestParts<S> for SessionJar
where
    SessionStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let store = SessionStore::from_ref(state);

        match Cookies::from_request_parts(parts, state).await {
            Ok(cookies) => Ok(Self::attached(store, cookies)),
            Err(_) => Ok(Self::detached(store, &parts.headers)),
        }
    }
}

fn parse_cookie_headers(headers: &HeaderMap) -> Vec<Cookie<'static>> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value.to_owned()))
        .filter_map(|cookie| cookie.ok())
        .map(Cookie::into_owned)
        .collect()
}
