// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for all auth config
// Decision: Default to the signed-token strategy; the stored-token strategy
// is kept for deployments that still rely on persisted opaque tokens

use std::time::Duration;

/// Token strategy selected at deployment time. Exactly one is live per
/// process; the two never mix against the same user table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStrategy {
    /// Opaque token persisted on the user record, checked by equality lookup
    Stored,
    /// Self-contained signed token with an expiry, verified cryptographically
    #[default]
    Signed,
}

impl AuthStrategy {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "stored" => AuthStrategy::Stored,
            _ => AuthStrategy::Signed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStrategy::Stored => "stored",
            AuthStrategy::Signed => "signed",
        }
    }
}

/// Signed-token configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token lifetime
    pub lifetime: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            lifetime: Duration::from_secs(30 * 24 * 60 * 60), // 30 days
        }
    }
}

/// Bootstrap admin account configuration
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: String,
    /// Login password (signed strategy). Absent means no admin is seeded.
    pub password: Option<String>,
    /// Fixed opaque token (stored strategy). Absent means one is generated.
    pub token: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: None,
            token: None,
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Token strategy
    pub strategy: AuthStrategy,
    /// Signed-token settings
    pub token: TokenConfig,
    /// Bootstrap admin account
    pub admin: AdminConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            strategy: AuthStrategy::default(),
            token: TokenConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let strategy = std::env::var("AUTH_STRATEGY")
            .map(|s| AuthStrategy::from_str(&s))
            .unwrap_or_default();

        let secret = std::env::var("AUTH_TOKEN_SECRET").unwrap_or_else(|_| {
            use rand::Rng;
            tracing::warn!(
                "AUTH_TOKEN_SECRET not set; using an ephemeral secret, \
                 signed tokens will not survive a restart"
            );
            let bytes: [u8; 32] = rand::thread_rng().gen();
            hex::encode(bytes)
        });

        let lifetime = std::env::var("AUTH_TOKEN_LIFETIME")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(30 * 24 * 60 * 60));

        let username =
            std::env::var("AUTH_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let password = std::env::var("AUTH_ADMIN_PASSWORD")
            .ok()
            .filter(|s| !s.is_empty());
        let token = std::env::var("AUTH_ADMIN_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());

        Self {
            strategy,
            token: TokenConfig { secret, lifetime },
            admin: AdminConfig {
                username,
                password,
                token,
            },
        }
    }

    /// Whether anyone may register, or only the admin
    pub fn open_registration(&self) -> bool {
        self.strategy == AuthStrategy::Signed
    }

    /// Whether password login is available. Stored-token deployments hand
    /// tokens out of band and have no login flow.
    pub fn password_login_enabled(&self) -> bool {
        self.strategy == AuthStrategy::Signed
    }
}
