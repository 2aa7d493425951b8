use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub affiliate_id: String,
    pub store: Option<StoreConfig>,
    pub admin: Option<AdminConfig>,
}

/// Connection to the hosted database/auth service. Absent when the service
/// should run standalone on the in-memory store.
pub struct StoreConfig {
    pub url: String,
    pub key: String,
}

/// Admin credential for standalone deployments without the hosted auth.
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("MENTA_PORT", "1111"),
            affiliate_id: try_load("MENTA_AFFILIATE_ID", "AFILIADO123"),
            store: load_store(),
            admin: load_admin(),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(path).ok().map(|s| s.trim().to_string())
}

fn load_store() -> Option<StoreConfig> {
    let Ok(url) = env::var("MENTA_STORE_URL") else {
        warn!("MENTA_STORE_URL not set, running on the in-memory store");
        return None;
    };

    let key = read_secret("MENTA_STORE_KEY").or_else(|| env::var("MENTA_STORE_KEY").ok());
    match key {
        Some(key) => Some(StoreConfig { url, key }),
        None => {
            warn!("MENTA_STORE_KEY missing, running on the in-memory store");
            None
        }
    }
}

fn load_admin() -> Option<AdminConfig> {
    let email = env::var("MENTA_ADMIN_EMAIL").ok()?;
    let password = read_secret("MENTA_ADMIN_PASSWORD")
        .or_else(|| env::var("MENTA_ADMIN_PASSWORD").ok())?;

    Some(AdminConfig { email, password })
}
