use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    /// Postgres connection string. In-memory repositories are used when unset.
    pub database_url: Option<String>,
    pub upload_folder: PathBuf,
    pub static_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub session_ttl_hours: i64,
    pub max_upload_bytes: usize,
    pub grammar_check_url: Option<String>,
    pub grammar_check_language: String,
    pub seed_demo_users: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            upload_folder: PathBuf::from("uploads"),
            static_dir: PathBuf::from("public"),
            host: "0.0.0.0".to_string(),
            port: 3000,
            session_ttl_hours: 24,
            max_upload_bytes: 20 * 1024 * 1024,
            grammar_check_url: None,
            grammar_check_language: "en-US".to_string(),
            seed_demo_users: false,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    match non_empty_var(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        None => default,
    }
}

fn parse_flag(key: &str) -> bool {
    matches!(
        non_empty_var(key).map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let base_dir = std::env::current_dir()?;

        let upload_folder = base_dir.join(
            non_empty_var("UPLOAD_FOLDER").unwrap_or_else(|| "uploads".to_string()),
        );
        let static_dir =
            base_dir.join(non_empty_var("STATIC_DIR").unwrap_or_else(|| "public".to_string()));

        let session_ttl_hours = parse_var("SESSION_TTL_HOURS", defaults.session_ttl_hours);
        if session_ttl_hours <= 0 {
            return Err("SESSION_TTL_HOURS must be positive".into());
        }

        Ok(Self {
            database_url: non_empty_var("DATABASE_URL"),
            upload_folder,
            static_dir,
            host: non_empty_var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port),
            session_ttl_hours,
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            grammar_check_url: non_empty_var("GRAMMAR_CHECK_URL"),
            grammar_check_language: non_empty_var("GRAMMAR_CHECK_LANGUAGE")
                .unwrap_or(defaults.grammar_check_language),
            seed_demo_users: parse_flag("SEED_DEMO_USERS"),
        })
    }
}
