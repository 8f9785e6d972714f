use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("exchange rates must be positive (got {0})")]
    NegativeRate(Decimal),

    #[error("currency {currency} is not part of the {pair_a}/{pair_b} exchange rate")]
    CurrencyMismatch {
        currency: String,
        pair_a: String,
        pair_b: String,
    },

    #[error("the target currency cannot be reached from the source currency with the available rates")]
    UnreachableTarget,

    #[error("the converted amount does not fit the output range")]
    AmountOverflow,

    #[error("the request must contain at least a header line and a rate-count line")]
    MissingLines,

    #[error("invalid header line '{0}': expected SRC;AMOUNT;DST")]
    BadHeader(String),

    #[error("invalid initial amount '{0}': expected a positive integer")]
    BadAmount(String),

    #[error("the second line must declare the number of rate lines that follow")]
    BadRateCount,

    #[error("invalid rate line '{0}': expected FROM;TO;RATE")]
    BadRateLine(String),

    #[error("invalid currency code '{0}': expected exactly 3 letters")]
    BadCurrencyCode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
