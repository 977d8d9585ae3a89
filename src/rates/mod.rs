use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use crate::models::Currency;

/// How long fetched rates stay fresh.
const CACHE_DURATION_SECS: i64 = 60 * 60;
/// Bound on the outbound rate lookup.
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

// Frankfurter publishes ECB reference rates; free, no API key.
const API_URL: &str = "https://api.frankfurter.app/latest?from=CZK&to=EUR,USD,GBP,PLN";

/// Fixed fallback table: 1 foreign unit = X CZK.
fn fallback_rates() -> HashMap<Currency, Decimal> {
    HashMap::from([
        (Currency::Eur, Decimal::from(25)),
        (Currency::Usd, Decimal::from(23)),
        (Currency::Gbp, Decimal::from(30)),
        (Currency::Pln, Decimal::from(6)),
    ])
}

/// Conversion failures that must reach the user instead of being absorbed.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ConvertError {
    /// The export carries a currency outside the supported set; summing it
    /// silently would misreport totals.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("Unparseable amount: '{0}'")]
    BadAmount(String),
}

/// Parse an exported amount: `,` is the fractional separator, whitespace
/// (including non-breaking spaces) groups thousands.
pub(crate) fn parse_amount(text: &str) -> Result<Decimal, ConvertError> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    Decimal::from_str(&cleaned).map_err(|_| ConvertError::BadAmount(text.to_string()))
}

/// Raw quotes from a rate provider, "1 CZK = X foreign" per currency code.
/// Validation and inversion happen in the service.
pub(crate) trait RateSource {
    fn latest(&self) -> Result<HashMap<String, f64>>;
}

pub(crate) trait Clock {
    /// Seconds since the Unix epoch.
    fn now(&self) -> i64;
}

pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[derive(Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

pub(crate) struct FrankfurterSource {
    // None when the client could not be built; latest() then reports the
    // failure and the service falls back.
    client: Option<reqwest::blocking::Client>,
}

impl FrankfurterSource {
    pub(crate) fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .ok();
        Self { client }
    }
}

impl RateSource for FrankfurterSource {
    fn latest(&self) -> Result<HashMap<String, f64>> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("HTTP client unavailable"))?;
        let response = client.get(API_URL).send().context("Rate request failed")?;
        if !response.status().is_success() {
            anyhow::bail!("HTTP {}", response.status());
        }
        let text = response.text().context("Failed to read rate response")?;
        let body: RatesResponse = serde_json::from_str(&text).context("Invalid rate response")?;
        Ok(body.rates)
    }
}

/// Exchange-rate cache with an injectable source and clock.
///
/// Starts on the fallback table; `refresh` swaps in live rates when the
/// fetch succeeds and silently returns to the fallback when it does not.
/// Conversion never depends on the fetch having worked.
pub(crate) struct ExchangeRates {
    source: Box<dyn RateSource>,
    clock: Box<dyn Clock>,
    rates: HashMap<Currency, Decimal>,
    fetched_at: Option<i64>,
    live: bool,
}

impl ExchangeRates {
    pub(crate) fn new() -> Self {
        Self::with_parts(Box::new(FrankfurterSource::new()), Box::new(SystemClock))
    }

    pub(crate) fn with_parts(source: Box<dyn RateSource>, clock: Box<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            rates: fallback_rates(),
            fetched_at: None,
            live: false,
        }
    }

    /// Fetch current rates unless the cache is still fresh. Every failure
    /// mode — timeout, bad status, malformed body, missing or non-positive
    /// rate — lands on the fallback table; this never errors.
    pub(crate) fn refresh(&mut self) {
        let now = self.clock.now();
        if let Some(at) = self.fetched_at {
            if now - at < CACHE_DURATION_SECS {
                return;
            }
        }
        match self.try_fetch() {
            Ok(rates) => {
                self.rates = rates;
                self.live = true;
            }
            Err(err) => {
                eprintln!("Warning: failed to fetch exchange rates, using fallback values: {err}");
                self.rates = fallback_rates();
                self.live = false;
            }
        }
        self.fetched_at = Some(now);
    }

    fn try_fetch(&self) -> Result<HashMap<Currency, Decimal>> {
        let quotes = self.source.latest()?;
        let mut rates = HashMap::new();
        for currency in Currency::FOREIGN {
            let quote = quotes
                .get(currency.code())
                .copied()
                .ok_or_else(|| anyhow::anyhow!("Missing {currency} in rate response"))?;
            if quote <= 0.0 {
                anyhow::bail!("Non-positive rate for {currency}");
            }
            // Quoted as "1 CZK = quote foreign"; stored inverted.
            let rate = Decimal::from_f64(1.0 / quote)
                .ok_or_else(|| anyhow::anyhow!("Unrepresentable rate for {currency}"))?;
            rates.insert(currency, rate);
        }
        Ok(rates)
    }

    /// Whether the active table came from a successful fetch. Display
    /// only; conversion behaves the same either way.
    pub(crate) fn is_live(&self) -> bool {
        self.live
    }

    /// Units of CZK per 1 unit of `currency`.
    pub(crate) fn rate(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Czk => Decimal::ONE,
            // Populated for every foreign currency by construction.
            other => self.rates.get(&other).copied().unwrap_or(Decimal::ONE),
        }
    }

    /// Convert an exported amount string to CZK.
    pub(crate) fn to_base(&self, amount: &str, code: &str) -> Result<Decimal, ConvertError> {
        let currency = Currency::parse(code)
            .ok_or_else(|| ConvertError::UnknownCurrency(code.trim().to_string()))?;
        let amount = parse_amount(amount)?;
        Ok(amount * self.rate(currency))
    }

    /// Convert a CZK amount to the display currency.
    pub(crate) fn from_base(&self, amount_czk: Decimal, target: Currency) -> Decimal {
        if target.is_base() {
            amount_czk
        } else {
            amount_czk / self.rate(target)
        }
    }

    /// `to_base` then `from_base` in one step.
    pub(crate) fn convert(
        &self,
        amount: &str,
        code: &str,
        target: Currency,
    ) -> Result<Decimal, ConvertError> {
        Ok(self.from_base(self.to_base(amount, code)?, target))
    }
}

/// Render an amount the way its currency is conventionally written:
/// grouping separator, decimal separator, symbol placement.
/// e.g. CZK `1 234,56 Kč`, EUR `1.234,56 €`, USD `$1,234.56`.
pub(crate) fn format_display(amount: Decimal, currency: Currency) -> String {
    let (thousands, decimal_sep, symbol_first) = match currency {
        Currency::Czk | Currency::Pln => (" ", ",", false),
        Currency::Eur => (".", ",", false),
        Currency::Usd | Currency::Gbp => (",", ".", true),
    };

    let abs = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let grouped: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(thousands);

    let body = format!("{grouped}{decimal_sep}{dec_part}");
    let rendered = if symbol_first {
        format!("{}{body}", currency.symbol())
    } else {
        format!("{body} {}", currency.symbol())
    };

    if amount < Decimal::ZERO {
        format!("-{rendered}")
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests;
