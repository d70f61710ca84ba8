use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub path: String,
    pub pool_size: u32,
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
    pub cookie_name: String,
    pub cookie_domain: Option<String>,
    pub secure_cookies: bool,
    pub session_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
    /// Host suffixes allowed regardless of the explicit list, e.g. ".pages.dev"
    pub allowed_origin_suffixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentFilter {
    pub enabled: bool,
    pub extra_words: Vec<String>,
    pub allowed_words: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub auth: Auth,
    pub cors: Cors,
    pub rate_limit: RateLimit,
    pub content_filter: ContentFilter,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // 1. Try to load from settings.toml (optional for deployment)
        let config_file_name = "settings.toml";

        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        // Check in murmur-server directory (for development)
        let dev_path = PathBuf::from("murmur-server").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        builder = Self::with_defaults(builder)?;

        // 2. Override with environment variables (highest priority)
        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            builder = builder.set_override("database.path", db_path)?;
        }
        if let Ok(pool_size) = std::env::var("DATABASE_POOL_SIZE") {
            builder = builder.set_override("database.pool_size", pool_size)?;
        }
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }
        if let Ok(host) = std::env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }
        if let Ok(origins) = std::env::var("ALLOWED_ORIGINS") {
            builder = builder.set_override("cors.allowed_origins", split_list(&origins))?;
        }
        if let Ok(name) = std::env::var("COOKIE_NAME") {
            builder = builder.set_override("auth.cookie_name", name)?;
        }
        if let Ok(domain) = std::env::var("COOKIE_DOMAIN") {
            builder = builder.set_override("auth.cookie_domain", domain)?;
        }
        if std::env::var("APP_ENV").is_ok_and(|env| env.eq_ignore_ascii_case("production")) {
            builder = builder.set_override("auth.secure_cookies", true)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Build settings from an inline TOML document layered over the defaults.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder().add_source(File::from_str(contents, FileFormat::Toml));
        Self::with_defaults(builder)?.build()?.try_deserialize()
    }

    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        // Default to 0.0.0.0 for deployment; override with HOST for local development
        builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "murmur.db")?
            .set_default("database.pool_size", 10)?
            .set_default("database.seed_demo_data", false)?
            .set_default("auth.cookie_name", "access")?
            .set_default("auth.secure_cookies", false)?
            .set_default("auth.session_ttl_hours", 24 * 7)?
            .set_default(
                "cors.allowed_origins",
                vec!["http://localhost:3000".to_string()],
            )?
            .set_default(
                "cors.allowed_origin_suffixes",
                vec![".pages.dev".to_string()],
            )?
            .set_default("rate_limit.max_requests", 100)?
            .set_default("rate_limit.window_seconds", 60)?
            .set_default("content_filter.enabled", true)?
            .set_default("content_filter.extra_words", Vec::<String>::new())?
            .set_default("content_filter.allowed_words", Vec::<String>::new())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_empty_document() {
        let settings = Settings::from_toml("").expect("defaults should deserialize");

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.database.pool_size, 10);
        assert_eq!(settings.auth.cookie_name, "access");
        assert!(settings.auth.cookie_domain.is_none());
        assert_eq!(settings.cors.allowed_origins, vec!["http://localhost:3000"]);
        assert!(settings.content_filter.enabled);
    }

    #[test]
    fn test_document_overrides_defaults() {
        let settings = Settings::from_toml(
            r#"
            [server]
            port = 9000

            [content_filter]
            enabled = false
            extra_words = ["grumpkin"]
            "#,
        )
        .expect("settings should load");

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert!(!settings.content_filter.enabled);
        assert_eq!(settings.content_filter.extra_words, vec!["grumpkin"]);
    }

    #[test]
    fn test_split_list_trims_and_drops_empties() {
        assert_eq!(
            split_list(" https://a.example , ,https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
    }
}
