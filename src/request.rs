//! Conversion request parsing and the two core entry points
//!
//! A request text looks like:
//! ```text
//! EUR;550;JPY
//! 6
//! AUD;CHF;0.9661
//! JPY;KRW;13.1151
//! ...
//! ```
//! First line: source currency, integer amount, target currency. Second
//! line: how many rate lines follow. Lines and fields are trimmed and
//! empty lines are skipped, so copy/pasted requests with stray whitespace
//! still parse.

use rust_decimal::Decimal;

use crate::config::{CURRENCY_CODE_LEN, FIELD_SEPARATOR};
use crate::errors::{ConvertError, Result};
use crate::graph::{BestRoute, RateTable, RouteSearch};

/// A fully-constructed conversion request: source, amount, target and the
/// merged rate table.
#[derive(Debug)]
pub struct ConversionRequest {
    source: String,
    target: String,
    amount: u32,
    table: RateTable,
}

impl ConversionRequest {
    /// Build a request from already-validated parts.
    ///
    /// Currency codes are treated as opaque, pre-normalized strings here;
    /// only rate positivity and pair-merge semantics are enforced. When
    /// source and target coincide the records are irrelevant and the
    /// table collapses to the identity edge.
    pub fn new(
        source: &str,
        amount: u32,
        target: &str,
        records: Vec<(String, String, Decimal)>,
    ) -> Result<Self> {
        let table = if source == target {
            RateTable::identity(source)?
        } else {
            let mut table = RateTable::new();
            for (from, to, rate) in &records {
                table.add_record(from, to, *rate)?;
            }
            table
        };

        Ok(Self {
            source: source.to_string(),
            target: target.to_string(),
            amount,
            table,
        })
    }

    /// Parse a raw request text.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if lines.len() < 2 {
            return Err(ConvertError::MissingLines);
        }

        let header = split_fields(lines[0]);
        if header.len() != 3 {
            return Err(ConvertError::BadHeader(lines[0].to_string()));
        }

        let source = parse_currency_code(header[0])?;
        let amount: u32 = header[1]
            .parse()
            .map_err(|_| ConvertError::BadAmount(header[1].to_string()))?;
        let target = parse_currency_code(header[2])?;

        // Identity requests stop at the header; whatever follows is not
        // even read.
        if source == target {
            return Self::new(&source, amount, &target, Vec::new());
        }

        let declared: usize = lines[1].parse().unwrap_or(0);
        if declared == 0 || declared + 2 != lines.len() {
            return Err(ConvertError::BadRateCount);
        }

        let mut records = Vec::with_capacity(declared);
        for line in &lines[2..] {
            let fields = split_fields(line);
            if fields.len() != 3 {
                return Err(ConvertError::BadRateLine(line.to_string()));
            }
            let from = parse_currency_code(fields[0])?;
            let to = parse_currency_code(fields[1])?;
            if from == to {
                // Self-conversions carry no information; skip the line
                // without even parsing its rate.
                continue;
            }
            let rate: Decimal = fields[2]
                .parse()
                .map_err(|_| ConvertError::BadRateLine(line.to_string()))?;
            records.push((from, to, rate));
        }

        Self::new(&source, amount, &target, records)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// Best achievable amount in the target currency, as a whole unit.
    pub fn compute(self) -> Result<i64> {
        Ok(self.best_route()?.rounded)
    }

    /// Like [`compute`](Self::compute), but keeps the winning route for
    /// display and logging.
    pub fn best_route(self) -> Result<BestRoute> {
        let amount = Decimal::from(self.amount);
        RouteSearch::new(self.table, &self.source, &self.target).run(amount)
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(FIELD_SEPARATOR)
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .collect()
}

fn parse_currency_code(raw: &str) -> Result<String> {
    let code = raw.to_uppercase();
    if code.chars().count() != CURRENCY_CODE_LEN {
        return Err(ConvertError::BadCurrencyCode(raw.to_string()));
    }
    Ok(code)
}
