//! Wire messages of the on-disk snapshot. Declared with `prost` derives so
//! the build needs no `protoc`; the equivalent schema is:
//!
//! ```proto
//! message StoreSnapshot { uint32 version = 1; repeated ShopRecord shops = 2; repeated ProgramRecord programs = 3; }
//! message LatLng { double lat = 1; double lng = 2; }
//! message ShopRecord {
//!   string id = 1; string name = 2; string no = 3; string program = 4;
//!   string phone = 5; string tax_no = 6; bool inactive = 7;
//!   optional LatLng center = 8; repeated LatLng polygon = 9;
//!   optional string block_id = 10; optional int64 created_at_ms = 11;
//!   optional int64 updated_at_ms = 12;
//! }
//! message ProgramRecord { string label = 1; string value = 2; string color = 3; }
//! ```

use hal_map::{CoordGeo, Program, Shop};

/// Bumped whenever a field changes meaning.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, PartialEq, prost::Message)]
pub struct StoreSnapshot {
    #[prost(uint32, tag = "1")]
    pub version: u32,
    #[prost(message, repeated, tag = "2")]
    pub shops: Vec<ShopRecord>,
    #[prost(message, repeated, tag = "3")]
    pub programs: Vec<ProgramRecord>,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct LatLng {
    #[prost(double, tag = "1")]
    pub lat: f64,
    #[prost(double, tag = "2")]
    pub lng: f64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ShopRecord {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub no: String,
    #[prost(string, tag = "4")]
    pub program: String,
    #[prost(string, tag = "5")]
    pub phone: String,
    #[prost(string, tag = "6")]
    pub tax_no: String,
    #[prost(bool, tag = "7")]
    pub inactive: bool,
    #[prost(message, optional, tag = "8")]
    pub center: Option<LatLng>,
    #[prost(message, repeated, tag = "9")]
    pub polygon: Vec<LatLng>,
    #[prost(string, optional, tag = "10")]
    pub block_id: Option<String>,
    #[prost(int64, optional, tag = "11")]
    pub created_at_ms: Option<i64>,
    #[prost(int64, optional, tag = "12")]
    pub updated_at_ms: Option<i64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProgramRecord {
    #[prost(string, tag = "1")]
    pub label: String,
    #[prost(string, tag = "2")]
    pub value: String,
    #[prost(string, tag = "3")]
    pub color: String,
}

impl From<&CoordGeo> for LatLng {
    fn from(c: &CoordGeo) -> Self {
        LatLng { lat: c.latitude, lng: c.longitude }
    }
}

impl From<LatLng> for CoordGeo {
    fn from(p: LatLng) -> Self {
        CoordGeo::new(p.lat, p.lng)
    }
}

impl From<&Shop> for ShopRecord {
    fn from(s: &Shop) -> Self {
        ShopRecord {
            id: s.id.clone(),
            name: s.name.clone(),
            no: s.no.clone(),
            program: s.program.clone(),
            phone: s.phone.clone(),
            tax_no: s.tax_no.clone(),
            inactive: s.inactive,
            center: s.center.as_ref().map(LatLng::from),
            polygon: s.polygon.iter().map(LatLng::from).collect(),
            block_id: s.block_id.clone(),
            created_at_ms: s.created_at_ms,
            updated_at_ms: s.updated_at_ms,
        }
    }
}

impl From<ShopRecord> for Shop {
    fn from(r: ShopRecord) -> Self {
        Shop {
            id: r.id,
            name: r.name,
            no: r.no,
            program: r.program,
            phone: r.phone,
            tax_no: r.tax_no,
            inactive: r.inactive,
            center: r.center.map(CoordGeo::from),
            polygon: r.polygon.into_iter().map(CoordGeo::from).collect(),
            block_id: r.block_id,
            created_at_ms: r.created_at_ms,
            updated_at_ms: r.updated_at_ms,
        }
    }
}

impl From<&Program> for ProgramRecord {
    fn from(p: &Program) -> Self {
        ProgramRecord { label: p.label.clone(), value: p.value.clone(), color: p.color.clone() }
    }
}

impl From<ProgramRecord> for Program {
    fn from(r: ProgramRecord) -> Self {
        Program { label: r.label, value: r.value, color: r.color }
    }
}
