use crate::errors::AppError;

/// Deployment mode distinguishes trusted-transport ("production") from
/// permissive ("development") handling of cookies and transport headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Development,
    Production,
}

impl DeploymentMode {
    pub fn from_env() -> Self {
        match std::env::var("DEPLOYMENT_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => DeploymentMode::Production,
            _ => DeploymentMode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, DeploymentMode::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentMode::Development => "development",
            DeploymentMode::Production => "production",
        }
    }
}

/// HSTS parameters. The header itself is only emitted on a trusted
/// transport; advertising it over plain HTTP would promise a guarantee
/// the deployment cannot keep.
#[derive(Debug, Clone, Copy)]
pub struct HstsConfig {
    pub max_age_secs: u64,
    pub include_subdomains: bool,
    pub preload: bool,
}

impl Default for HstsConfig {
    fn default() -> Self {
        Self {
            // One year, the customary floor for preload eligibility.
            max_age_secs: 31_536_000,
            include_subdomains: true,
            preload: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub mode: DeploymentMode,
    pub session_max_age_secs: i64,
    pub hsts: HstsConfig,
}

/// Default session lifetime: two weeks.
pub const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 1_209_600;

impl SecurityConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let mode = DeploymentMode::from_env();

        let session_max_age_secs = std::env::var("SESSION_MAX_AGE_SECS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(DEFAULT_SESSION_MAX_AGE_SECS))
            .map_err(|_| AppError::configuration("SESSION_MAX_AGE_SECS must be a valid integer"))?;

        if session_max_age_secs <= 0 {
            return Err(AppError::configuration("SESSION_MAX_AGE_SECS must be positive"));
        }

        let defaults = HstsConfig::default();
        let hsts = HstsConfig {
            max_age_secs: std::env::var("HSTS_MAX_AGE_SECS")
                .map(|val| val.parse::<u64>())
                .unwrap_or(Ok(defaults.max_age_secs))
                .map_err(|_| AppError::configuration("HSTS_MAX_AGE_SECS must be a valid integer"))?,
            include_subdomains: env_flag("HSTS_INCLUDE_SUBDOMAINS", defaults.include_subdomains),
            preload: env_flag("HSTS_PRELOAD", defaults.preload),
        };

        Ok(Self {
            mode,
            session_max_age_secs,
            hsts,
        })
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            mode: DeploymentMode::Development,
            session_max_age_secs: DEFAULT_SESSION_MAX_AGE_SECS,
            hsts: HstsConfig::default(),
        }
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// TLS cert/key paths for serving HTTPS directly. Optional; absent means
/// plain HTTP (development, or TLS terminated upstream).
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
}

impl TlsConfig {
    pub fn from_env() -> Option<Self> {
        let cert_path = std::env::var("TLS_CERT_PATH").ok()?;
        let key_path = std::env::var("TLS_KEY_PATH").ok()?;
        Some(Self { cert_path, key_path })
    }
}
