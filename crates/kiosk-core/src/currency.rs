//! # Currency Formatting
//!
//! Static currency table and customer-facing money formatting.
//!
//! ## Formatting Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Currency Display Rules                               │
//! │                                                                         │
//! │  Currency   Symbol   Placement   Decimals   Example                     │
//! │  ─────────  ───────  ──────────  ─────────  ──────────                  │
//! │  GBP        £        before      2          £10.99                      │
//! │  USD        $        before      2          $10.99                      │
//! │  EUR        €        before      2          €10.99                      │
//! │  JPY        ¥        before      0          ¥1099                       │
//! │  SEK        kr       after       2          10.99 kr                    │
//! │                                                                         │
//! │  Negative amounts put the minus sign BEFORE the symbol: -£5.50          │
//! │  Unknown codes degrade to the code itself: -XTS 5.50 (never a panic)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::money::Money;

// =============================================================================
// Currency Table
// =============================================================================

/// Where the currency symbol sits relative to the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolPlacement {
    /// Symbol before the amount: £10.99
    Before,
    /// Symbol after the amount: 10.99 kr
    After,
}

/// Display metadata for one currency.
#[derive(Debug, Clone, Copy)]
pub struct CurrencyInfo {
    /// ISO 4217 code.
    pub code: &'static str,
    /// Display symbol.
    pub symbol: &'static str,
    /// Symbol placement.
    pub placement: SymbolPlacement,
    /// Number of decimal places in the minor unit.
    pub decimals: u8,
}

/// The currencies the kiosk knows how to render.
///
/// Deliberately small: the kiosk renders whatever the platform returns, and
/// anything not listed here falls back to code-as-symbol rather than failing.
const CURRENCIES: &[CurrencyInfo] = &[
    CurrencyInfo { code: "GBP", symbol: "£", placement: SymbolPlacement::Before, decimals: 2 },
    CurrencyInfo { code: "USD", symbol: "$", placement: SymbolPlacement::Before, decimals: 2 },
    CurrencyInfo { code: "EUR", symbol: "€", placement: SymbolPlacement::Before, decimals: 2 },
    CurrencyInfo { code: "AUD", symbol: "A$", placement: SymbolPlacement::Before, decimals: 2 },
    CurrencyInfo { code: "CAD", symbol: "C$", placement: SymbolPlacement::Before, decimals: 2 },
    CurrencyInfo { code: "JPY", symbol: "¥", placement: SymbolPlacement::Before, decimals: 0 },
    CurrencyInfo { code: "SEK", symbol: "kr", placement: SymbolPlacement::After, decimals: 2 },
    CurrencyInfo { code: "NOK", symbol: "kr", placement: SymbolPlacement::After, decimals: 2 },
    CurrencyInfo { code: "DKK", symbol: "kr", placement: SymbolPlacement::After, decimals: 2 },
    CurrencyInfo { code: "PLN", symbol: "zł", placement: SymbolPlacement::After, decimals: 2 },
    CurrencyInfo { code: "CHF", symbol: "CHF", placement: SymbolPlacement::Before, decimals: 2 },
];

/// Looks up display metadata for a currency code (case-insensitive).
pub fn currency_info(code: &str) -> Option<&'static CurrencyInfo> {
    CURRENCIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

// =============================================================================
// Formatting
// =============================================================================

/// Formats a money amount for customer display.
///
/// Negative amounts render with a leading minus sign before the symbol.
/// Unknown currency codes fall back to the code itself as the symbol with
/// default placement and 2 decimals - degraded output beats a blocked till.
///
/// ## Example
/// ```rust
/// use kiosk_core::currency::format_money;
/// use kiosk_core::money::Money;
///
/// assert_eq!(format_money(Money::from_cents(1099), "GBP"), "£10.99");
/// assert_eq!(format_money(Money::from_cents(-550), "GBP"), "-£5.50");
/// assert_eq!(format_money(Money::from_cents(1099), "SEK"), "10.99 kr");
/// ```
pub fn format_money(amount: Money, code: &str) -> String {
    let fallback = CurrencyInfo {
        code: "",
        symbol: "",
        placement: SymbolPlacement::Before,
        decimals: 2,
    };

    let (symbol, info) = match currency_info(code) {
        Some(info) => (info.symbol.to_string(), *info),
        // Unknown code: use the code itself as symbol, separated by a space.
        None => (format!("{} ", code), fallback),
    };

    let sign = if amount.is_negative() { "-" } else { "" };
    let digits = render_digits(amount.abs().cents(), info.decimals);

    match info.placement {
        SymbolPlacement::Before => format!("{}{}{}", sign, symbol, digits),
        SymbolPlacement::After => format!("{}{} {}", sign, digits, symbol),
    }
}

/// Renders a non-negative cent amount with the given number of decimals.
fn render_digits(cents: i64, decimals: u8) -> String {
    if decimals == 0 {
        // Zero-decimal currencies carry their full value in the "cents"
        // field already (JPY 1099 is ¥1099).
        return cents.to_string();
    }

    let divisor = 10_i64.pow(decimals as u32);
    let whole = cents / divisor;
    let frac = cents % divisor;
    format!("{}.{:0width$}", whole, frac, width = decimals as usize)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_symbol_before() {
        assert_eq!(format_money(Money::from_cents(1234), "GBP"), "£12.34");
        assert_eq!(format_money(Money::from_cents(100), "USD"), "$1.00");
        assert_eq!(format_money(Money::from_cents(1), "EUR"), "€0.01");
        assert_eq!(format_money(Money::from_cents(0), "GBP"), "£0.00");
    }

    #[test]
    fn test_format_symbol_after() {
        assert_eq!(format_money(Money::from_cents(1099), "SEK"), "10.99 kr");
        assert_eq!(format_money(Money::from_cents(50), "PLN"), "0.50 zł");
    }

    #[test]
    fn test_format_negative_sign_before_symbol() {
        assert_eq!(format_money(Money::from_cents(-550), "GBP"), "-£5.50");
        assert_eq!(format_money(Money::from_cents(-550), "SEK"), "-5.50 kr");
    }

    #[test]
    fn test_format_zero_decimal_currency() {
        assert_eq!(format_money(Money::from_cents(1099), "JPY"), "¥1099");
    }

    #[test]
    fn test_unknown_code_degrades_gracefully() {
        assert_eq!(format_money(Money::from_cents(1234), "XTS"), "XTS 12.34");
        assert_eq!(format_money(Money::from_cents(-1234), "XTS"), "-XTS 12.34");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(currency_info("gbp").is_some());
        assert!(currency_info("Gbp").is_some());
        assert!(currency_info("XXX").is_none());
    }
}
