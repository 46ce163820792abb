use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Credentials used by the one-shot `/create-admin` bootstrap.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub upload_dir: PathBuf,
    pub cors_origins: Vec<String>,
    pub admin: AdminBootstrap,
}

// 30 days
const DEFAULT_TTL_MINUTES: i64 = 30 * 24 * 60;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "doctorshift".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "doctorshift-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(DEFAULT_TTL_MINUTES),
        };
        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));
        let cors_origins = parse_origins(&std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".into()));
        let admin = AdminBootstrap {
            email: std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@doctorshift.com".into()),
            password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into()),
        };
        Ok(Self {
            database_url,
            jwt,
            upload_dir,
            cors_origins,
            admin,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
