//! Live end-to-end check: conversions, margin, and base changes.

use std::io::Write;

use anyhow::ensure;
use rust_decimal::Decimal;
use tracing::warn;

use ratekit_common::Currency;
use ratekit_fx::{CurrencyHandle, CurrencyRegistry, FxEngine, FxError, Region};

/// Codes exercised per region.
const SAMPLES: &[(Region, &[&str])] = &[
    (Region::Major, &["USD", "EUR", "GBP", "JPY", "CNY", "AUD", "CAD"]),
    (Region::Asia, &["INR", "KRW", "THB", "PHP", "VND", "IDR"]),
    (Region::MiddleEastAfrica, &["AED", "SAR", "ILS", "ZAR", "EGP", "NGN"]),
    (Region::Americas, &["MXN", "BRL", "ARS", "CLP", "COP", "PEN"]),
];

/// Outcome of a check run.
#[derive(Debug, Default)]
pub struct CheckReport {
    /// Currencies converted successfully.
    pub checked: usize,
    /// Currencies absent from the fetched table.
    pub missing: Vec<String>,
}

/// Run every check, writing a human-readable log to `out`.
///
/// The engine's base and margin are restored afterwards, even on failure.
pub async fn run(engine: &FxEngine, out: &mut impl Write) -> anyhow::Result<CheckReport> {
    let original_base = engine.base_currency();
    let original_margin = engine.margin_percent();

    let result = run_all(engine, out).await;

    engine.set_margin(original_margin);
    if engine.base_currency() != original_base {
        engine.set_base(original_base.code()).await?;
    }

    result
}

async fn run_all(engine: &FxEngine, out: &mut impl Write) -> anyhow::Result<CheckReport> {
    writeln!(out, "{}", engine.status().await)?;

    let report = check_conversions(engine, out).await?;
    check_margin(engine, out).await?;
    check_base_changes(engine, out).await?;

    writeln!(out, "\nAll checks passed ({} currencies)", report.checked)?;
    Ok(report)
}

async fn check_conversions(engine: &FxEngine, out: &mut impl Write) -> anyhow::Result<CheckReport> {
    let registry = CurrencyRegistry::global();
    let base = engine.base_currency();
    let hundred = Decimal::ONE_HUNDRED;
    let mut report = CheckReport::default();

    for (region, codes) in SAMPLES {
        writeln!(out, "\n{} (base: {})", region, base)?;

        for code in codes.iter() {
            let Some(handle) = registry.get(code) else {
                continue;
            };

            let rate = match handle.rate(engine).await {
                Ok(rate) => rate,
                Err(FxError::CurrencyNotFound(_)) => {
                    warn!(currency = *code, "Currency missing from rate table");
                    report.missing.push(code.to_string());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let with_margin = handle.rate_with_margin(engine).await?;
            let converted = handle.convert(engine, hundred).await?;

            ensure!(rate > Decimal::ZERO, "{} rate is zero or negative", code);
            ensure!(converted > Decimal::ZERO, "{} conversion is zero or negative", code);

            writeln!(
                out,
                "  {:4}: Rate={:>14.6} | With Margin={:>14.6} | 100 {} = {:.2}",
                code, rate, with_margin, base, converted
            )?;
            report.checked += 1;
        }
    }

    ensure!(report.checked > 0, "No currencies could be converted");
    Ok(report)
}

async fn check_margin(engine: &FxEngine, out: &mut impl Write) -> anyhow::Result<()> {
    let eur = CurrencyHandle::from(Currency::eur());
    let hundred = Decimal::ONE_HUNDRED;
    let margin = engine.margin_percent();

    writeln!(out, "\nMargin: {}%", margin)?;
    let rate = eur.rate(engine).await?;
    let with_margin = eur.rate_with_margin(engine).await?;
    writeln!(out, "  Base rate: {:.6}", rate)?;
    writeln!(out, "  Rate with margin: {:.6}", with_margin)?;
    writeln!(out, "  Difference: {:.6}", rate - with_margin)?;

    engine.set_margin(Decimal::new(35, 1));
    let marked = eur.convert(engine, hundred).await?;
    engine.set_margin(Decimal::ZERO);
    let plain = eur.convert(engine, hundred).await?;
    engine.set_margin(margin);

    writeln!(out, "  100 at 3.5% margin = {:.4}", marked)?;
    writeln!(out, "  100 at 0% margin   = {:.4}", plain)?;
    ensure!(marked < plain, "Margin did not lower the converted amount");

    Ok(())
}

async fn check_base_changes(engine: &FxEngine, out: &mut impl Write) -> anyhow::Result<()> {
    let hundred = Decimal::ONE_HUNDRED;

    for (base, target) in [("USD", "EUR"), ("EUR", "USD"), ("GBP", "USD")] {
        engine.set_base(base).await?;
        let target = CurrencyHandle::parse(target)?;
        let converted = target.convert(engine, hundred).await?;

        writeln!(out, "  Base {}: 100 {} = {:.2} {}", base, base, converted, target)?;
        ensure!(converted > Decimal::ZERO, "{} conversion from {} failed", target, base);
    }

    Ok(())
}
