use std::path::Path;

/// Deployment environment, selected by `APP_ENV`
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Local,
    Development,
    Production,
    Testing,
    Custom(String),
}

impl Environment {
    /// Detect environment from APP_ENV or default to Local
    pub fn detect() -> Self {
        match std::env::var("APP_ENV").ok().as_deref() {
            Some("production") => Self::Production,
            Some("development") => Self::Development,
            Some("testing") => Self::Testing,
            Some("local") | None => Self::Local,
            Some(other) => Self::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Load environment variables from .env files
///
/// Precedence (highest first): real environment variables,
/// `.env.{environment}.local`, `.env.{environment}`, `.env.local`, `.env`.
/// dotenvy never overwrites a variable that is already set, so the files
/// are loaded most specific first.
pub fn load_dotenv(project_root: &Path) -> Environment {
    let env = Environment::detect();

    let files = [
        format!(".env.{}.local", env),
        format!(".env.{}", env),
        ".env.local".to_string(),
        ".env".to_string(),
    ];
    for file in files {
        let _ = dotenvy::from_path(project_root.join(file));
    }

    env
}

/// Get an environment variable with a default value
///
/// # Example
/// ```
/// use kit::config::env;
///
/// let port: u16 = env("SERVER_PORT", 8080);
/// ```
pub fn env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_optional(key).unwrap_or(default)
}

/// Get an optional environment variable
pub fn env_optional<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Get a boolean flag; `1`, `true`, `yes` and `on` count as set
pub fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_fall_back_to_default() {
        assert_eq!(env("KIT_TEST_SURELY_UNSET_PORT", 8080u16), 8080);
        assert_eq!(env_optional::<u16>("KIT_TEST_SURELY_UNSET_PORT"), None);
        assert!(env_flag("KIT_TEST_SURELY_UNSET_FLAG", true));
    }

    #[test]
    fn environment_display_matches_file_suffix() {
        assert_eq!(Environment::Production.to_string(), "production");
        assert_eq!(Environment::Custom("ci".into()).to_string(), "ci");
    }
}
