// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Regional payment settings: currency, tax and default method.
//!
//! Rates are headline figures (US sales tax varies by state and is left at
//! zero, EU VAT uses the common 20%). Lookups never fail: anything unknown
//! resolves to the global entry.

use std::sync::LazyLock;

use bizchat_core::payment::{PaymentMethod, PaymentRegion, TaxInfo};

#[derive(Debug, Clone, PartialEq)]
pub struct RegionConfig {
    pub region: PaymentRegion,
    /// Representative ISO 3166 alpha-2 country (`EU` for Europe).
    pub country: &'static str,
    pub currency: &'static str,
    pub default_method: PaymentMethod,
    pub supported_methods: &'static [PaymentMethod],
    pub tax: TaxInfo,
}

static REGIONS: LazyLock<Vec<RegionConfig>> = LazyLock::new(|| {
    use PaymentMethod::*;
    vec![
        RegionConfig {
            region: PaymentRegion::Global,
            country: "US",
            currency: "USD",
            default_method: CreditCard,
            supported_methods: &[CreditCard, BankTransfer, Paypal],
            tax: TaxInfo::new("Tax", 0),
        },
        RegionConfig {
            region: PaymentRegion::NorthAmerica,
            country: "US",
            currency: "USD",
            default_method: CreditCard,
            supported_methods: &[CreditCard, BankTransfer, Paypal],
            tax: TaxInfo::new("Sales Tax", 0),
        },
        RegionConfig {
            region: PaymentRegion::Europe,
            country: "EU",
            currency: "EUR",
            default_method: CreditCard,
            supported_methods: &[CreditCard, BankTransfer, Paypal],
            tax: TaxInfo::new("VAT", 2_000),
        },
        RegionConfig {
            region: PaymentRegion::India,
            country: "IN",
            currency: "INR",
            default_method: Upi,
            supported_methods: &[Upi, CreditCard, BankTransfer, Paypal],
            tax: TaxInfo::new("GST", 1_800),
        },
        RegionConfig {
            region: PaymentRegion::Apac,
            country: "SG",
            currency: "SGD",
            default_method: CreditCard,
            supported_methods: &[CreditCard, BankTransfer, Wallet],
            tax: TaxInfo::new("GST", 800),
        },
        RegionConfig {
            region: PaymentRegion::Latam,
            country: "BR",
            currency: "BRL",
            default_method: CreditCard,
            supported_methods: &[CreditCard, BankTransfer],
            tax: TaxInfo::new("ICMS", 1_700),
        },
    ]
});

/// Countries billed through the Europe entry.
const EU_COUNTRIES: &[&str] = &[
    "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "ES", "FI", "FR", "GR", "HR", "HU", "IE",
    "IT", "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK",
];

/// Every configured region, global first.
pub fn regions() -> &'static [RegionConfig] {
    &REGIONS
}

pub fn region_config(region: PaymentRegion) -> &'static RegionConfig {
    let regions = regions();
    regions
        .iter()
        .find(|r| r.region == region)
        .unwrap_or(&regions[0])
}

/// Region for an ISO country code, skipping the global entry.
pub fn region_for_country(country: &str) -> Option<&'static RegionConfig> {
    let code = country.trim().to_ascii_uppercase();
    if EU_COUNTRIES.contains(&code.as_str()) {
        return Some(region_config(PaymentRegion::Europe));
    }
    if code == "CA" {
        return Some(region_config(PaymentRegion::NorthAmerica));
    }
    regions()
        .iter()
        .filter(|r| r.region != PaymentRegion::Global)
        .find(|r| r.country == code)
}

/// Representative country for a currency, used when a business has no
/// country on file.
pub fn country_for_currency(currency: &str) -> Option<&'static str> {
    regions()
        .iter()
        .filter(|r| r.region != PaymentRegion::Global)
        .find(|r| r.currency.eq_ignore_ascii_case(currency))
        .map(|r| r.country)
}

/// Explicit region first, then country, then global.
pub fn resolve_region(
    region: Option<PaymentRegion>,
    country: Option<&str>,
) -> &'static RegionConfig {
    if let Some(region) = region {
        return region_config(region);
    }
    country
        .and_then(region_for_country)
        .unwrap_or_else(|| region_config(PaymentRegion::Global))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_region_wins_over_country() {
        let cfg = resolve_region(Some(PaymentRegion::Europe), Some("IN"));
        assert_eq!(cfg.region, PaymentRegion::Europe);
        assert_eq!(cfg.tax.rate_bp, 2_000);
    }

    #[test]
    fn country_resolves_region() {
        assert_eq!(resolve_region(None, Some("in")).region, PaymentRegion::India);
        assert_eq!(resolve_region(None, Some("US")).region, PaymentRegion::NorthAmerica);
        assert_eq!(resolve_region(None, Some("DE")).region, PaymentRegion::Europe);
        assert_eq!(resolve_region(None, Some("SG")).region, PaymentRegion::Apac);
        assert_eq!(resolve_region(None, Some("BR")).region, PaymentRegion::Latam);
    }

    #[test]
    fn unknown_falls_back_to_global() {
        let cfg = resolve_region(None, Some("ZZ"));
        assert_eq!(cfg.region, PaymentRegion::Global);
        assert_eq!(cfg.currency, "USD");
        assert_eq!(resolve_region(None, None).region, PaymentRegion::Global);
    }

    #[test]
    fn india_defaults_to_upi_with_gst() {
        let india = region_config(PaymentRegion::India);
        assert_eq!(india.default_method, PaymentMethod::Upi);
        assert_eq!(india.tax.name, "GST");
        assert_eq!(india.tax.rate_bp, 1_800);
        assert!(india.supported_methods.contains(&PaymentMethod::CreditCard));
    }

    #[test]
    fn currency_maps_to_country() {
        assert_eq!(country_for_currency("INR"), Some("IN"));
        assert_eq!(country_for_currency("usd"), Some("US"));
        assert_eq!(country_for_currency("JPY"), None);
    }
}
