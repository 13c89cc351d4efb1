use std::fmt;
use std::str::FromStr;

use crate::programs::{is_unknown_program, normalize_key, tr_lower, ProgramRegistry};
use crate::shop::Shop;

/// The filter chips of the map and list views.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ShopFilter {
    #[default]
    All,
    /// In use and assigned a program.
    Active,
    /// Marked as not in use.
    Unused,
    /// In use, but the program is blank or a placeholder.
    Unknown,
    /// Program matches the normalized key, by value or resolved label.
    Program(String),
}

impl ShopFilter {
    pub fn program(key: &str) -> Self {
        ShopFilter::Program(normalize_key(key))
    }

    pub fn matches(&self, shop: &Shop, programs: &ProgramRegistry) -> bool {
        match self {
            ShopFilter::All => true,
            ShopFilter::Active => !shop.inactive && shop.has_program(),
            ShopFilter::Unused => shop.inactive,
            ShopFilter::Unknown => !shop.inactive && is_unknown_program(&shop.program),
            ShopFilter::Program(key) => {
                let program = shop.program.trim();
                if program.is_empty() {
                    return false;
                }
                if key == "atlas" {
                    return program.to_lowercase() == "atlas";
                }
                normalize_key(program) == *key || normalize_key(programs.label_of(shop)) == *key
            }
        }
    }
}

impl FromStr for ShopFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(key) = s.strip_prefix("program:").or_else(|| s.strip_prefix("prog:")) {
            return Ok(ShopFilter::program(key));
        }
        match s.to_lowercase().as_str() {
            "" | "all" => Ok(ShopFilter::All),
            "active" => Ok(ShopFilter::Active),
            "unused" | "inactive" => Ok(ShopFilter::Unused),
            "unknown" => Ok(ShopFilter::Unknown),
            other => Err(format!(
                "unknown filter '{other}' (expected all, active, unused, unknown or program:<key>)"
            )),
        }
    }
}

impl fmt::Display for ShopFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShopFilter::All => f.write_str("all"),
            ShopFilter::Active => f.write_str("active"),
            ShopFilter::Unused => f.write_str("unused"),
            ShopFilter::Unknown => f.write_str("unknown"),
            ShopFilter::Program(key) => write!(f, "program:{key}"),
        }
    }
}

/// Case-insensitive substring search over name, number, tax number and
/// phone. A blank query matches every shop.
pub fn matches_query(shop: &Shop, query: &str) -> bool {
    let q = tr_lower(query);
    if q.is_empty() {
        return true;
    }
    [&shop.name, &shop.no, &shop.tax_no, &shop.phone]
        .iter()
        .any(|field| tr_lower(field).contains(&q))
}

/// Shops passing both the filter chip and the search box, in input order.
pub fn filter_shops<'a>(
    shops: &'a [Shop],
    filter: &ShopFilter,
    query: &str,
    programs: &ProgramRegistry,
) -> Vec<&'a Shop> {
    shops
        .iter()
        .filter(|s| filter.matches(s, programs) && matches_query(s, query))
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::Program;

    fn shop(name: &str, no: &str, program: &str, inactive: bool) -> Shop {
        Shop {
            id: format!("id-{no}"),
            name: name.into(),
            no: no.into(),
            program: program.into(),
            inactive,
            phone: format!("0555 {no}"),
            ..Default::default()
        }
    }

    fn registry() -> ProgramRegistry {
        ProgramRegistry::new(vec![Program {
            label: "Logo Go".into(),
            value: "logo".into(),
            color: "#123456".into(),
        }])
    }

    fn fixture() -> Vec<Shop> {
        vec![
            shop("Istanbul Fruit", "1", "logo", false),
            shop("Green Grocer", "2", "", false),
            shop("Closed Corner", "3", "logo", true),
            shop("Atlas Shop", "4", "Atlas", false),
            shop("Mystery", "5", "bilinmiyor", false),
        ]
    }

    fn ids(v: Vec<&Shop>) -> Vec<&str> {
        v.into_iter().map(|s| s.no.as_str()).collect()
    }

    #[test]
    fn chip_filters() {
        let shops = fixture();
        let reg = registry();
        assert_eq!(ids(filter_shops(&shops, &ShopFilter::All, "", &reg)), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(ids(filter_shops(&shops, &ShopFilter::Active, "", &reg)), vec!["1", "4", "5"]);
        assert_eq!(ids(filter_shops(&shops, &ShopFilter::Unused, "", &reg)), vec!["3"]);
        assert_eq!(ids(filter_shops(&shops, &ShopFilter::Unknown, "", &reg)), vec!["2", "5"]);
    }

    #[test]
    fn program_filter_matches_value_or_label() {
        let shops = fixture();
        let reg = registry();
        let by_value = ShopFilter::program("LOGO");
        assert_eq!(ids(filter_shops(&shops, &by_value, "", &reg)), vec!["1", "3"]);
        let by_label = ShopFilter::program("logo-go");
        assert_eq!(ids(filter_shops(&shops, &by_label, "", &reg)), vec!["1", "3"]);
        let atlas = ShopFilter::program("atlas");
        assert_eq!(ids(filter_shops(&shops, &atlas, "", &reg)), vec!["4"]);
    }

    #[test]
    fn search_is_case_insensitive_turkish() {
        let shops = fixture();
        let reg = registry();
        // Turkish lowercasing maps I to dotless ı
        assert_eq!(ids(filter_shops(&shops, &ShopFilter::All, "ıstanbul", &reg)), vec!["1"]);
        assert_eq!(ids(filter_shops(&shops, &ShopFilter::All, "GROCER", &reg)), vec!["2"]);
        assert_eq!(ids(filter_shops(&shops, &ShopFilter::All, "0555 3", &reg)), vec!["3"]);
        assert_eq!(ids(filter_shops(&shops, &ShopFilter::All, "   ", &reg)).len(), 5);
        assert!(filter_shops(&shops, &ShopFilter::Unused, "fruit", &reg).is_empty());
    }

    #[test]
    fn parses_filter_names() {
        assert_eq!("all".parse::<ShopFilter>(), Ok(ShopFilter::All));
        assert_eq!("Inactive".parse::<ShopFilter>(), Ok(ShopFilter::Unused));
        assert_eq!("prog:Logo Go".parse::<ShopFilter>(), Ok(ShopFilter::Program("logogo".into())));
        assert_eq!(ShopFilter::program("Logo").to_string(), "program:logo");
        assert!("everything".parse::<ShopFilter>().is_err());
    }
}
