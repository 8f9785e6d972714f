//! fx-router Configuration

/// Fractional digits kept on every exchange rate and per-hop amount
pub const RATE_DECIMALS: u32 = 4;

/// Required length of a currency code (ISO 4217 style)
pub const CURRENCY_CODE_LEN: usize = 3;

/// Field separator in request files
pub const FIELD_SEPARATOR: char = ';';

/// Env var naming the JSON Lines file that computed routes are appended to
pub const ROUTE_LOG_ENV: &str = "FX_ROUTE_LOG";
