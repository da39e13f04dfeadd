//! Application configuration loaded from environment variables.

use common::TaxRate;
use store::StockPolicy;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — Postgres connection string (default: unset, in-memory store)
/// - `TAX_RATE_BPS` — tax rate in basis points (default: `1000`, i.e. 10%)
/// - `STOCK_POLICY` — `"permissive"` or `"reject"` (default: `"permissive"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub tax_rate: TaxRate,
    pub stock_policy: StockPolicy,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            tax_rate: std::env::var("TAX_RATE_BPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(TaxRate::from_basis_points)
                .unwrap_or_default(),
            stock_policy: std::env::var("STOCK_POLICY")
                .map(|v| parse_stock_policy(&v))
                .unwrap_or_default(),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            tax_rate: TaxRate::default(),
            stock_policy: StockPolicy::default(),
        }
    }
}

fn parse_stock_policy(value: &str) -> StockPolicy {
    match value.to_ascii_lowercase().as_str() {
        "reject" => StockPolicy::Reject,
        _ => StockPolicy::Permissive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.database_url, None);
        assert_eq!(config.tax_rate, TaxRate::from_percent(10));
        assert_eq!(config.stock_policy, StockPolicy::Permissive);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_addr_default() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_stock_policy_parsing() {
        assert_eq!(parse_stock_policy("reject"), StockPolicy::Reject);
        assert_eq!(parse_stock_policy("REJECT"), StockPolicy::Reject);
        assert_eq!(parse_stock_policy("permissive"), StockPolicy::Permissive);
        assert_eq!(parse_stock_policy("anything"), StockPolicy::Permissive);
    }
}
