use crate::LucinkaError;
use secrecy::SecretString;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub username: String,
    pub password: SecretString,
}

impl Config {
    pub fn from_env() -> Result<Self, LucinkaError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function. This avoids mutating global environment in tests and keeps
    /// `from_env()` small and safe.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, LucinkaError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let username = get("LUCINKA_USERNAME")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| LucinkaError::Config("LUCINKA_USERNAME missing".into()))?;
        let password = get("LUCINKA_PASSWORD")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LucinkaError::Config("LUCINKA_PASSWORD missing".into()))?;
        let base_url = get("LUCINKA_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        Ok(Self {
            base_url,
            username,
            password: SecretString::new(password.into()),
        })
    }
}
