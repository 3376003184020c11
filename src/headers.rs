use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, CONTENT_SECURITY_POLICY, REFERRER_POLICY,
    STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION,
};

use crate::config::HstsConfig;

/// Legacy mirror of `Content-Security-Policy`, still read by older browsers.
pub const X_CONTENT_SECURITY_POLICY: HeaderName =
    HeaderName::from_static("x-content-security-policy");

pub const FRAME_DENY: &str = "DENY";
pub const NOSNIFF: &str = "nosniff";
pub const XSS_FILTER: &str = "1; mode=block";
pub const REFERRER_SAME_ORIGIN: &str = "same-origin";

/// Ordered mapping from CSP directive name to its source expressions.
///
/// Declared order is the rendering order; a `Vec` of pairs keeps it stable
/// where a hash map would not. Adding sources to an already-declared
/// directive extends it in place.
#[derive(Debug, Clone, Default)]
pub struct DirectiveSet {
    directives: Vec<(String, Vec<String>)>,
}

impl DirectiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directive<I, S>(mut self, name: &str, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources = sources.into_iter().map(Into::into);
        match self.directives.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => existing.extend(sources),
            None => self.directives.push((name.to_string(), sources.collect())),
        }
        self
    }

    /// Serialize to one header value: `name v1 v2; name v1`, declared order,
    /// no trailing separator. Directives with no sources are omitted
    /// entirely, never emitted as `name ;`.
    pub fn render(&self) -> String {
        self.directives
            .iter()
            .filter(|(_, sources)| !sources.is_empty())
            .map(|(name, sources)| format!("{} {}", name, sources.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn is_empty(&self) -> bool {
        self.directives.iter().all(|(_, sources)| sources.is_empty())
    }

    /// The default policy: same-origin everything, inline script/style
    /// allowances for server-rendered pages, no embedding.
    pub fn default_policy() -> Self {
        Self::new()
            .directive("default-src", ["'self'"])
            .directive("script-src", ["'self'", "'unsafe-inline'"])
            .directive("style-src", ["'self'", "'unsafe-inline'"])
            .directive("img-src", ["'self'", "data:", "https:"])
            .directive("font-src", ["'self'", "data:"])
            .directive("connect-src", ["'self'"])
            .directive("frame-ancestors", ["'none'"])
            .directive("base-uri", ["'self'"])
            .directive("form-action", ["'self'"])
    }
}

/// Renders the HSTS value: `max-age=N[; includeSubDomains][; preload]`.
pub fn hsts_value(config: &HstsConfig) -> String {
    let mut value = format!("max-age={}", config.max_age_secs);
    if config.include_subdomains {
        value.push_str("; includeSubDomains");
    }
    if config.preload {
        value.push_str("; preload");
    }
    value
}

/// Builds the full hardening header set attached to every response.
#[derive(Debug, Clone)]
pub struct SecurityHeaderBuilder {
    csp: DirectiveSet,
    hsts: HstsConfig,
    secure_transport: bool,
}

impl SecurityHeaderBuilder {
    pub fn new(csp: DirectiveSet, hsts: HstsConfig, secure_transport: bool) -> Self {
        Self {
            csp,
            hsts,
            secure_transport,
        }
    }

    /// Header name/value pairs in emission order. HSTS is omitted entirely
    /// off a secure transport.
    pub fn headers(&self) -> Vec<(HeaderName, String)> {
        let mut headers = Vec::with_capacity(7);

        if !self.csp.is_empty() {
            let csp = self.csp.render();
            headers.push((CONTENT_SECURITY_POLICY, csp.clone()));
            headers.push((X_CONTENT_SECURITY_POLICY, csp));
        }

        headers.push((X_FRAME_OPTIONS, FRAME_DENY.to_string()));
        headers.push((X_CONTENT_TYPE_OPTIONS, NOSNIFF.to_string()));
        headers.push((X_XSS_PROTECTION, XSS_FILTER.to_string()));
        headers.push((REFERRER_POLICY, REFERRER_SAME_ORIGIN.to_string()));

        if self.secure_transport {
            headers.push((STRICT_TRANSPORT_SECURITY, hsts_value(&self.hsts)));
        }

        headers
    }

    /// Merge into a response header map. Existing values are overwritten;
    /// the policy is the policy, handlers don't get to weaken it.
    pub fn apply(&self, map: &mut HeaderMap) {
        for (name, value) in self.headers() {
            if let Ok(value) = HeaderValue::from_str(&value) {
                map.insert(name, value);
            }
        }
    }
}
