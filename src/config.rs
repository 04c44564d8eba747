use anyhow::Context;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub cookie_secure: bool,
}

/// Credentials of the administrator account seeded on first startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            username: "ADM-001".into(),
            password: "Admin@123".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub admin: AdminSeed,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://eduleaner.db?mode=rwc".into());
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "eduleaner".into()),
            audience: std::env::var("SESSION_AUDIENCE")
                .unwrap_or_else(|_| "eduleaner-web".into()),
            ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 8),
            cookie_secure: std::env::var("COOKIE_SECURE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };
        let defaults = AdminSeed::default();
        let admin = AdminSeed {
            username: std::env::var("ADMIN_USERNAME").unwrap_or(defaults.username),
            password: std::env::var("ADMIN_PASSWORD").unwrap_or(defaults.password),
        };
        Ok(Self {
            database_url,
            session,
            admin,
        })
    }

    /// In-memory store and a fixed secret; used by tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            session: SessionConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                cookie_secure: false,
            },
            admin: AdminSeed::default(),
        }
    }
}
