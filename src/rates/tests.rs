#![allow(clippy::unwrap_used)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use rust_decimal_macros::dec;

use super::*;
use crate::models::Currency;

struct StaticSource(HashMap<String, f64>);

impl RateSource for StaticSource {
    fn latest(&self) -> anyhow::Result<HashMap<String, f64>> {
        Ok(self.0.clone())
    }
}

struct FailingSource;

impl RateSource for FailingSource {
    fn latest(&self) -> anyhow::Result<HashMap<String, f64>> {
        anyhow::bail!("request timed out")
    }
}

struct CountingSource {
    calls: Rc<Cell<usize>>,
    quotes: HashMap<String, f64>,
}

impl RateSource for CountingSource {
    fn latest(&self) -> anyhow::Result<HashMap<String, f64>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.quotes.clone())
    }
}

/// Replays canned responses in order.
struct SequenceSource {
    responses: RefCell<Vec<anyhow::Result<HashMap<String, f64>>>>,
}

impl RateSource for SequenceSource {
    fn latest(&self) -> anyhow::Result<HashMap<String, f64>> {
        self.responses.borrow_mut().remove(0)
    }
}

#[derive(Clone)]
struct FakeClock(Rc<Cell<i64>>);

impl Clock for FakeClock {
    fn now(&self) -> i64 {
        self.0.get()
    }
}

fn fake_clock(start: i64) -> (FakeClock, Rc<Cell<i64>>) {
    let cell = Rc::new(Cell::new(start));
    (FakeClock(cell.clone()), cell)
}

/// Quotes chosen so the inverted rates land on exact values:
/// EUR 25, USD 20, GBP 40, PLN 5 CZK.
fn quotes() -> HashMap<String, f64> {
    HashMap::from([
        ("EUR".to_string(), 0.04),
        ("USD".to_string(), 0.05),
        ("GBP".to_string(), 0.025),
        ("PLN".to_string(), 0.2),
    ])
}

fn fallback_service() -> ExchangeRates {
    let (clock, _) = fake_clock(0);
    ExchangeRates::with_parts(Box::new(FailingSource), Box::new(clock))
}

// ── parse_amount ──────────────────────────────────────────────

#[test]
fn test_parse_amount_comma_fraction() {
    assert_eq!(parse_amount("123,45").unwrap(), dec!(123.45));
}

#[test]
fn test_parse_amount_thousands_separators() {
    assert_eq!(parse_amount("1 234,50").unwrap(), dec!(1234.50));
    assert_eq!(parse_amount("1\u{a0}234,50").unwrap(), dec!(1234.50));
}

#[test]
fn test_parse_amount_negative() {
    assert_eq!(parse_amount("-1 234,50").unwrap(), dec!(-1234.50));
}

#[test]
fn test_parse_amount_integer() {
    assert_eq!(parse_amount("42").unwrap(), dec!(42));
}

#[test]
fn test_parse_amount_empty_rejected() {
    assert_eq!(parse_amount(""), Err(ConvertError::BadAmount("".into())));
}

#[test]
fn test_parse_amount_garbage_rejected() {
    assert!(matches!(parse_amount("abc"), Err(ConvertError::BadAmount(_))));
}

// ── Conversion over the fallback table ────────────────────────

#[test]
fn test_starts_on_fallback() {
    let rates = fallback_service();
    assert!(!rates.is_live());
    assert_eq!(rates.rate(Currency::Eur), dec!(25));
    assert_eq!(rates.rate(Currency::Usd), dec!(23));
    assert_eq!(rates.rate(Currency::Gbp), dec!(30));
    assert_eq!(rates.rate(Currency::Pln), dec!(6));
}

#[test]
fn test_to_base_identity_for_czk() {
    let rates = fallback_service();
    assert_eq!(rates.to_base("150,00", "CZK").unwrap(), dec!(150.00));
}

#[test]
fn test_to_base_multiplies_by_rate() {
    let rates = fallback_service();
    // 1 234,50 EUR at 25 CZK/EUR.
    assert_eq!(rates.to_base("1 234,50", "EUR").unwrap(), dec!(30862.5));
}

#[test]
fn test_from_base_divides_by_rate() {
    let rates = fallback_service();
    let usd = rates.from_base(dec!(30862.5), Currency::Usd);
    assert_eq!(usd.round_dp(1), dec!(1341.8));
}

#[test]
fn test_from_base_identity_for_czk() {
    let rates = fallback_service();
    assert_eq!(rates.from_base(dec!(987.6), Currency::Czk), dec!(987.6));
}

#[test]
fn test_round_trip_every_currency() {
    let rates = fallback_service();
    for currency in Currency::ALL {
        let base = rates.to_base("100,00", currency.code()).unwrap();
        assert_eq!(
            rates.from_base(base, currency),
            dec!(100.00),
            "round trip failed for {currency}"
        );
    }
}

#[test]
fn test_unknown_currency_is_a_hard_error() {
    let rates = fallback_service();
    assert_eq!(
        rates.to_base("10,00", "JPY"),
        Err(ConvertError::UnknownCurrency("JPY".into()))
    );
}

#[test]
fn test_bad_amount_is_reported() {
    let rates = fallback_service();
    assert!(matches!(
        rates.to_base("x,y", "EUR"),
        Err(ConvertError::BadAmount(_))
    ));
}

#[test]
fn test_convert_chains_both_directions() {
    let rates = fallback_service();
    // 100 EUR -> 2500 CZK -> 2500/30 GBP.
    let gbp = rates.convert("100,00", "EUR", Currency::Gbp).unwrap();
    assert_eq!(gbp.round_dp(2), dec!(83.33));
}

// ── refresh ───────────────────────────────────────────────────

#[test]
fn test_refresh_success_inverts_and_goes_live() {
    let (clock, _) = fake_clock(1_000);
    let mut rates =
        ExchangeRates::with_parts(Box::new(StaticSource(quotes())), Box::new(clock));
    rates.refresh();
    assert!(rates.is_live());
    assert_eq!(rates.rate(Currency::Eur), dec!(25));
    assert_eq!(rates.rate(Currency::Pln), dec!(5));
    assert_eq!(rates.to_base("10,00", "USD").unwrap(), dec!(200));
}

#[test]
fn test_refresh_failure_keeps_fallback_and_determinism() {
    let (clock, _) = fake_clock(1_000);
    let mut rates = ExchangeRates::with_parts(Box::new(FailingSource), Box::new(clock));
    rates.refresh();
    assert!(!rates.is_live());
    // Conversions stay deterministic on the fixed table.
    assert_eq!(rates.to_base("2,00", "EUR").unwrap(), dec!(50));
    assert_eq!(rates.to_base("2,00", "GBP").unwrap(), dec!(60));
}

#[test]
fn test_refresh_missing_currency_falls_back() {
    let (clock, _) = fake_clock(0);
    let partial = HashMap::from([("EUR".to_string(), 0.04)]);
    let mut rates =
        ExchangeRates::with_parts(Box::new(StaticSource(partial)), Box::new(clock));
    rates.refresh();
    assert!(!rates.is_live());
    assert_eq!(rates.rate(Currency::Eur), dec!(25));
}

#[test]
fn test_refresh_non_positive_rate_falls_back() {
    let (clock, _) = fake_clock(0);
    let mut bad = quotes();
    bad.insert("USD".to_string(), 0.0);
    let mut rates = ExchangeRates::with_parts(Box::new(StaticSource(bad)), Box::new(clock));
    rates.refresh();
    assert!(!rates.is_live());
    assert_eq!(rates.rate(Currency::Usd), dec!(23));
}

#[test]
fn test_refresh_respects_cache_window() {
    let (clock, time) = fake_clock(0);
    let calls = Rc::new(Cell::new(0));
    let source = CountingSource {
        calls: calls.clone(),
        quotes: quotes(),
    };
    let mut rates = ExchangeRates::with_parts(Box::new(source), Box::new(clock));

    rates.refresh();
    time.set(CACHE_DURATION_SECS - 1);
    rates.refresh();
    assert_eq!(calls.get(), 1);

    time.set(CACHE_DURATION_SECS);
    rates.refresh();
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_stale_success_then_failure_reverts_to_fallback() {
    let (clock, time) = fake_clock(0);
    let source = SequenceSource {
        responses: RefCell::new(vec![Ok(quotes()), Err(anyhow::anyhow!("timed out"))]),
    };
    let mut rates = ExchangeRates::with_parts(Box::new(source), Box::new(clock));

    rates.refresh();
    assert!(rates.is_live());
    assert_eq!(rates.rate(Currency::Usd), dec!(20));

    time.set(CACHE_DURATION_SECS + 1);
    rates.refresh();
    assert!(!rates.is_live());
    assert_eq!(rates.rate(Currency::Usd), dec!(23));
}

// ── format_display ────────────────────────────────────────────

#[test]
fn test_format_czk() {
    assert_eq!(format_display(dec!(1234.56), Currency::Czk), "1 234,56 Kč");
}

#[test]
fn test_format_eur() {
    assert_eq!(format_display(dec!(1234.56), Currency::Eur), "1.234,56 €");
}

#[test]
fn test_format_usd() {
    assert_eq!(format_display(dec!(1234.56), Currency::Usd), "$1,234.56");
}

#[test]
fn test_format_gbp_small_amount() {
    assert_eq!(format_display(dec!(5), Currency::Gbp), "£5.00");
}

#[test]
fn test_format_pln() {
    assert_eq!(format_display(dec!(1234.5), Currency::Pln), "1 234,50 zł");
}

#[test]
fn test_format_negative_sign_leads() {
    assert_eq!(format_display(dec!(-42.5), Currency::Usd), "-$42.50");
    assert_eq!(format_display(dec!(-42.5), Currency::Czk), "-42,50 Kč");
}

#[test]
fn test_format_rounds_half_away_from_zero() {
    assert_eq!(format_display(dec!(1.005), Currency::Usd), "$1.01");
}

#[test]
fn test_format_zero() {
    assert_eq!(format_display(dec!(0), Currency::Czk), "0,00 Kč");
}

#[test]
fn test_format_large_grouping() {
    assert_eq!(
        format_display(dec!(1234567.89), Currency::Usd),
        "$1,234,567.89"
    );
}
