use crate::config::DeploymentMode;

pub const SESSION_COOKIE: &str = "sessionid";
pub const CSRF_COOKIE: &str = "csrftoken";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieKind {
    Session,
    Csrf,
}

impl CookieKind {
    pub fn name(self) -> &'static str {
        match self {
            CookieKind::Session => SESSION_COOKIE,
            CookieKind::Csrf => CSRF_COOKIE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    pub fn as_str(self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

/// Attribute set applied to a cookie by the hosting framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieAttributes {
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub max_age_secs: i64,
}

impl CookieAttributes {
    /// Render a full `Set-Cookie` value for the given name/value pair.
    pub fn to_set_cookie(&self, name: &str, value: &str) -> String {
        let mut cookie = format!(
            "{}={}; Max-Age={}; Path=/; SameSite={}",
            name,
            value,
            self.max_age_secs,
            self.same_site.as_str()
        );
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Pure attribute policy for session and CSRF cookies.
///
/// Production means trusted transport, so `Secure` on everything;
/// development permits plain-transport testing. Both cookie kinds are
/// HttpOnly always and SameSite Lax.
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    mode: DeploymentMode,
    session_max_age_secs: i64,
}

impl CookiePolicy {
    pub fn new(mode: DeploymentMode, session_max_age_secs: i64) -> Self {
        Self {
            mode,
            session_max_age_secs,
        }
    }

    pub fn attributes_for(&self, kind: CookieKind) -> CookieAttributes {
        let max_age_secs = match kind {
            // The CSRF token is valid for the session lifetime, so its
            // cookie shares the session max-age.
            CookieKind::Session | CookieKind::Csrf => self.session_max_age_secs,
        };

        CookieAttributes {
            secure: self.mode.is_production(),
            http_only: true,
            same_site: SameSite::Lax,
            max_age_secs,
        }
    }

    /// Convenience: render `Set-Cookie` for a kind under this policy.
    pub fn set_cookie(&self, kind: CookieKind, value: &str) -> String {
        self.attributes_for(kind).to_set_cookie(kind.name(), value)
    }
}
