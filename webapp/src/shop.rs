use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::block::Cell;
use crate::error::InvalidInputError;
use crate::geometry::CoordGeo;

/// A shop record as stored in the `shops` collection.
///
/// Text fields that are absent in the stored document come back as empty
/// strings, so "missing" and "blank" are the same thing everywhere.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Shop {
    pub id: String,
    pub name: String,
    /// Shop number, kept as text since operators type it in freely.
    pub no: String,
    pub program: String,
    pub phone: String,
    pub tax_no: String,
    pub inactive: bool,
    pub center: Option<CoordGeo>,
    pub polygon: Vec<CoordGeo>,
    pub block_id: Option<String>,
    pub created_at_ms: Option<i64>,
    pub updated_at_ms: Option<i64>,
}

impl Shop {
    /// Fresh record for a partitioned cell. `cell.seq` must already be the
    /// shop number (see `number_cells`).
    pub fn from_cell(cell: &Cell, block: &BlockId, created_at_ms: i64) -> Self {
        Self {
            id: block.shop_id(cell.seq),
            name: format!("Shop {}", cell.seq),
            no: cell.seq.to_string(),
            program: String::new(),
            phone: String::new(),
            tax_no: String::new(),
            inactive: false,
            center: Some(cell.center),
            polygon: cell.vertices.to_vec(),
            block_id: Some(block.as_str().to_string()),
            created_at_ms: Some(created_at_ms),
            updated_at_ms: None,
        }
    }

    pub fn parsed_no(&self) -> Option<i64> {
        parse_shop_no(&self.no)
    }

    pub fn has_program(&self) -> bool {
        !is_blank(&self.program)
    }
}

/// True when the value is empty after trimming whitespace.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Parses the leading integer of a shop number the lenient way operators
/// expect: surrounding whitespace is ignored and trailing garbage after the
/// digits is dropped, so `" 12b "` is 12. No digits at all is `None`.
pub fn parse_shop_no(no: &str) -> Option<i64> {
    let s = no.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Orders shops by parsed number; shops without a usable number go last.
pub fn cmp_by_no(a: &Shop, b: &Shop) -> Ordering {
    match (a.parsed_no(), b.parsed_no()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_by_no(shops: &mut [Shop]) {
    shops.sort_by(cmp_by_no);
}


// --------------------------------------------------------------------------
// BlockId

/// Identifier shared by every shop generated from one partition, of the form
/// `block_<created-at millis>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(String);

impl BlockId {
    pub fn from_millis(created_at_ms: i64) -> Self {
        Self(format!("block_{created_at_ms}"))
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Document id for shop `no` of this block.
    pub fn shop_id(&self, no: i64) -> String {
        format!("{}_{}", self.0, no)
    }

    /// Creation time encoded in the id, 0 when the id was not generated by
    /// `from_millis`.
    pub fn created_at_ms(&self) -> i64 {
        self.0
            .split('_')
            .nth(1)
            .and_then(parse_shop_no)
            .unwrap_or(0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}


// --------------------------------------------------------------------------
// ShopEdit

/// Fields an operator may change on an existing shop.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShopEdit {
    pub name: String,
    pub no: String,
    pub phone: String,
    pub tax_no: String,
    pub program: String,
    pub inactive: bool,
}

impl ShopEdit {
    /// Prefills an edit with the shop's current values.
    pub fn from_shop(shop: &Shop) -> Self {
        Self {
            name: shop.name.clone(),
            no: shop.no.clone(),
            phone: shop.phone.clone(),
            tax_no: shop.tax_no.clone(),
            program: shop.program.clone(),
            inactive: shop.inactive,
        }
    }

    /// Trims every text field and rejects an empty name.
    pub fn normalized(&self) -> Result<ShopEdit, InvalidInputError> {
        let edit = ShopEdit {
            name: self.name.trim().to_string(),
            no: self.no.trim().to_string(),
            phone: self.phone.trim().to_string(),
            tax_no: self.tax_no.trim().to_string(),
            program: self.program.trim().to_string(),
            inactive: self.inactive,
        };
        if edit.name.is_empty() {
            return Err(InvalidInputError::EmptyName);
        }
        Ok(edit)
    }

    pub fn apply_to(&self, shop: &mut Shop, updated_at_ms: i64) {
        shop.name = self.name.clone();
        shop.no = self.no.clone();
        shop.phone = self.phone.clone();
        shop.tax_no = self.tax_no.clone();
        shop.program = self.program.clone();
        shop.inactive = self.inactive;
        shop.updated_at_ms = Some(updated_at_ms);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockPlan, Direction, NumberingOrigin};

    #[test]
    fn parses_leading_integer() {
        assert_eq!(parse_shop_no("12"), Some(12));
        assert_eq!(parse_shop_no("  7  "), Some(7));
        assert_eq!(parse_shop_no("12b"), Some(12));
        assert_eq!(parse_shop_no("-3"), Some(-3));
        assert_eq!(parse_shop_no("b12"), None);
        assert_eq!(parse_shop_no(""), None);
        assert_eq!(parse_shop_no("-"), None);
    }

    #[test]
    fn sorts_unnumbered_last() {
        let mut shops: Vec<Shop> = ["10", "", "2", "x", "33"]
            .iter()
            .map(|no| Shop { no: no.to_string(), ..Default::default() })
            .collect();
        sort_by_no(&mut shops);
        let nos: Vec<&str> = shops.iter().map(|s| s.no.as_str()).collect();
        assert_eq!(nos, vec!["2", "10", "33", "", "x"]);
    }

    #[test]
    fn block_id_round_trips_timestamp() {
        let id = BlockId::from_millis(1_717_000_000_123);
        assert_eq!(id.as_str(), "block_1717000000123");
        assert_eq!(id.created_at_ms(), 1_717_000_000_123);
        assert_eq!(id.shop_id(42), "block_1717000000123_42");
        assert_eq!(BlockId::parse("legacy").unwrap().created_at_ms(), 0);
        assert!(BlockId::parse("   ").is_none());
    }

    #[test]
    fn shop_from_cell_has_blank_fields() {
        let plan = BlockPlan {
            start_no: 5,
            end_no: 5,
            direction: Direction::Horizontal,
            origin: NumberingOrigin::TopLeft,
        };
        let pts = [
            CoordGeo::new(0.0, 0.0),
            CoordGeo::new(0.0, 1.0),
            CoordGeo::new(1.0, 1.0),
            CoordGeo::new(1.0, 0.0),
        ];
        let cell = &plan.generate(&pts).unwrap()[0];
        let block = BlockId::from_millis(99);
        let shop = Shop::from_cell(cell, &block, 99);

        assert_eq!(shop.id, "block_99_5");
        assert_eq!(shop.name, "Shop 5");
        assert_eq!(shop.no, "5");
        assert!(shop.program.is_empty() && shop.phone.is_empty() && shop.tax_no.is_empty());
        assert!(!shop.inactive);
        assert_eq!(shop.center, Some(CoordGeo::new(0.5, 0.5)));
        assert_eq!(shop.polygon.len(), 4);
        assert_eq!(shop.block_id.as_deref(), Some("block_99"));
        assert_eq!(shop.created_at_ms, Some(99));
    }

    #[test]
    fn missing_fields_deserialize_blank() {
        let shop: Shop = serde_json::from_str(r#"{"id":"a","name":"Kiosk"}"#).unwrap();
        assert_eq!(shop.phone, "");
        assert!(!shop.inactive);
        assert!(shop.polygon.is_empty());

        let json = serde_json::to_value(&shop).unwrap();
        assert!(json.get("taxNo").is_some());
    }

    #[test]
    fn edit_trims_and_requires_name() {
        let edit = ShopEdit {
            name: "  Fruit stall ".into(),
            phone: " 0555 ".into(),
            ..Default::default()
        };
        let edit = edit.normalized().unwrap();
        assert_eq!(edit.name, "Fruit stall");
        assert_eq!(edit.phone, "0555");

        let blank = ShopEdit { name: "   ".into(), ..Default::default() };
        assert_eq!(blank.normalized(), Err(InvalidInputError::EmptyName));

        let mut shop = Shop { id: "s1".into(), ..Default::default() };
        edit.apply_to(&mut shop, 1234);
        assert_eq!(shop.name, "Fruit stall");
        assert_eq!(shop.updated_at_ms, Some(1234));
        assert_eq!(shop.id, "s1");
    }
}
