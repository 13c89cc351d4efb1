use serde::Serialize;

use crate::shop::{is_blank, Shop};

/// Program whose adoption the dashboard tracks.
pub const FEATURED_PROGRAM: &str = "AtlasPro";

/// Dashboard counters over the whole shop collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopStats {
    pub total: usize,
    /// Shops on the featured program.
    pub atlas: usize,
    pub inactive: usize,
    /// Featured-program adoption in whole percent.
    pub rate: u32,
    /// Shops missing a phone number or a tax number (or both).
    pub missing: usize,
    pub no_phone: usize,
    pub no_tax: usize,
}

pub fn compute_stats(shops: &[Shop]) -> ShopStats {
    compute_stats_for(shops, FEATURED_PROGRAM)
}

pub fn compute_stats_for(shops: &[Shop], featured_program: &str) -> ShopStats {
    let mut stats = ShopStats { total: shops.len(), ..Default::default() };
    for shop in shops {
        let no_phone = is_blank(&shop.phone);
        let no_tax = is_blank(&shop.tax_no);
        stats.atlas += usize::from(shop.program == featured_program);
        stats.inactive += usize::from(shop.inactive);
        stats.no_phone += usize::from(no_phone);
        stats.no_tax += usize::from(no_tax);
        stats.missing += usize::from(no_phone || no_tax);
    }
    stats.rate = adoption_rate(stats.atlas, stats.total);
    stats
}

/// `round(part / total * 100)`, 0 for an empty collection.
pub fn adoption_rate(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    // Percentages of a non-negative share are in [0, 100]
    (part as f64 / total as f64 * 100.0).round() as u32
}


#[cfg(test)]
mod tests {
    use super::*;

    fn shop(program: &str, phone: &str, tax_no: &str) -> Shop {
        Shop {
            program: program.into(),
            phone: phone.into(),
            tax_no: tax_no.into(),
            ..Default::default()
        }
    }

    #[test]
    fn counts_featured_program_and_missing_fields() {
        let shops = vec![
            shop("AtlasPro", "0555 111", "123"),
            shop("AtlasPro", "0555 222", "456"),
            shop("Other", "", "789"),
        ];
        let stats = compute_stats(&shops);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.atlas, 2);
        assert_eq!(stats.rate, 67);
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.no_phone, 1);
        assert_eq!(stats.no_tax, 0);
        assert_eq!(stats.inactive, 0);
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        let mut s = shop("", "   ", "\t");
        s.inactive = true;
        let stats = compute_stats(&[s]);
        assert_eq!(stats.no_phone, 1);
        assert_eq!(stats.no_tax, 1);
        // Missing both still counts once
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.rate, 0);
    }

    #[test]
    fn empty_collection_has_zero_rate() {
        assert_eq!(compute_stats(&[]), ShopStats::default());
    }

    #[test]
    fn program_match_is_exact() {
        let stats = compute_stats(&[shop("atlaspro", "1", "1"), shop(" AtlasPro", "1", "1")]);
        assert_eq!(stats.atlas, 0);
    }

    #[test]
    fn rate_rounds_half_up() {
        assert_eq!(adoption_rate(1, 8), 13);
        assert_eq!(adoption_rate(1, 3), 33);
        assert_eq!(adoption_rate(5, 5), 100);
    }
}
