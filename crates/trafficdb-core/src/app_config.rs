use std::path::PathBuf;

/// Where the Postgres store lives.
///
/// Either a full `DATABASE_URL` or discrete connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Url(String),
    Parts {
        host: String,
        port: u16,
        user: String,
        password: Option<String>,
        database: String,
    },
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseConfig::Url(_) => f.debug_tuple("Url").field(&"[redacted]").finish(),
            DatabaseConfig::Parts {
                host,
                port,
                user,
                password,
                database,
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("password", &password.as_ref().map(|_| "[redacted]"))
                .field("database", database)
                .finish(),
        }
    }
}

/// Settings for commands that only touch the database.
///
/// Needs no Yandex credentials, so `trafficdb db ...` runs with just the
/// Postgres variables set.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database: DatabaseConfig,
    pub log_level: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub oauth_token: String,
    pub metrika_counter_id: String,
    pub webmaster_host_id: String,
    pub webmaster_user_id: Option<i64>,
    pub sites_path: PathBuf,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub landing_page_limit: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database", &self.database)
            .field("oauth_token", &"[redacted]")
            .field("metrika_counter_id", &self.metrika_counter_id)
            .field("webmaster_host_id", &self.webmaster_host_id)
            .field("webmaster_user_id", &self.webmaster_user_id)
            .field("sites_path", &self.sites_path)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("landing_page_limit", &self.landing_page_limit)
            .finish()
    }
}
