use super::session_store::SessionStore;
use crate::constants::AUTH_COOKIE_NAME;
use log::{debug, trace, warn};
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use std::sync::Arc;
use url::Url;

/// Attaches the session token to credentialed requests as the `auth_token`
/// cookie, the way a browser would for same-site requests.
///
/// The cookie is only sent to the application origin, and never over plain
/// HTTP when the session's cookie attributes require a secure channel.
/// Cookies set by responses are not adopted: the session only changes through
/// [`SessionStore::set_token`].
#[derive(Debug)]
pub struct SessionCookieProvider {
    session: Arc<SessionStore>,
    origin: Url,
}

impl SessionCookieProvider {
    pub const fn new(session: Arc<SessionStore>, origin: Url) -> Self {
        Self { session, origin }
    }

    fn is_same_site(&self, url: &Url) -> bool {
        url.host_str() == self.origin.host_str()
            && url.port_or_known_default() == self.origin.port_or_known_default()
    }
}

impl CookieStore for SessionCookieProvider {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let ignored = cookie_headers.count();
        if ignored > 0 {
            debug!("Ignoring {} Set-Cookie header(s) from {}", ignored, url.path());
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        if !self.is_same_site(url) {
            trace!("Not attaching session cookie to cross-site request {}", url);
            return None;
        }

        if self.session.cookie_attributes().secure && url.scheme() != "https" {
            debug!("Not attaching secure session cookie over {}", url.scheme());
            return None;
        }

        let token = self.session.token()?;
        match HeaderValue::from_str(&format!("{}={}", AUTH_COOKIE_NAME, token)) {
            Ok(header) => Some(header),
            Err(e) => {
                warn!("Session token cannot be sent as a cookie: {}", e);
                None
            }
        }
    }
}
