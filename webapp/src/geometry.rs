use std::cmp::Ordering;
use std::fmt;
use std::ops;

use serde::{Deserialize, Serialize};

// --------------------------------------------------------------------------
// CoordGeo

/// A geographic point in degrees. Serialized the way the map layer stores
/// polygon vertices: `{ "lat": .., "lng": .. }`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordGeo {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl CoordGeo {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl fmt::Display for CoordGeo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ latitude: {}, longitude: {} }}", self.latitude, self.longitude)
    }
}

impl ops::Add<&CoordGeo> for &CoordGeo {
    type Output = CoordGeo;

    fn add(self, rhs: &CoordGeo) -> CoordGeo {
        CoordGeo {
            latitude: self.latitude + rhs.latitude,
            longitude: self.longitude + rhs.longitude,
        }
    }
}

impl ops::Sub<&CoordGeo> for &CoordGeo {
    type Output = CoordGeo;

    fn sub(self, rhs: &CoordGeo) -> CoordGeo {
        CoordGeo {
            latitude: self.latitude - rhs.latitude,
            longitude: self.longitude - rhs.longitude,
        }
    }
}

impl ops::Mul<f64> for &CoordGeo {
    type Output = CoordGeo;

    fn mul(self, rhs: f64) -> CoordGeo {
        CoordGeo {
            latitude: self.latitude * rhs,
            longitude: self.longitude * rhs,
        }
    }
}

/// Affine blend between `a` and `b`: `a + (b - a) * t`.
pub fn lerp(a: &CoordGeo, b: &CoordGeo, t: f64) -> CoordGeo {
    a + &(&(b - a) * t)
}

/// Arithmetic mean of the points; `None` for an empty slice.
pub fn centroid(points: &[CoordGeo]) -> Option<CoordGeo> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(CoordGeo::new(0.0, 0.0), |acc, p| &acc + p);
    Some(&sum * (1.0 / points.len() as f64))
}

/// Ordering for floats that treats incomparable values as equal, so a
/// stable sort keeps their input order.
pub fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Outline of the marketplace grounds, used as the default map extent.
pub const HAL_BOUNDARY: [CoordGeo; 10] = [
    CoordGeo::new(36.925717, 30.743771),
    CoordGeo::new(36.925020, 30.738135),
    CoordGeo::new(36.922557, 30.738725),
    CoordGeo::new(36.921024, 30.739153),
    CoordGeo::new(36.920119, 30.739401),
    CoordGeo::new(36.918652, 30.740409),
    CoordGeo::new(36.918163, 30.740827),
    CoordGeo::new(36.918060, 30.741257),
    CoordGeo::new(36.919150, 30.743628),
    CoordGeo::new(36.921672, 30.746337),
];


// --------------------------------------------------------------------------
// Bounds

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min: CoordGeo,
    pub max: CoordGeo,
}

impl Bounds {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a CoordGeo>) -> Option<Bounds> {
        let mut iter = points.into_iter().filter(|p| p.is_finite());
        let first = *iter.next()?;
        let mut bounds = Bounds { min: first, max: first };
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: &CoordGeo) {
        self.min.latitude = self.min.latitude.min(p.latitude);
        self.min.longitude = self.min.longitude.min(p.longitude);
        self.max.latitude = self.max.latitude.max(p.latitude);
        self.max.longitude = self.max.longitude.max(p.longitude);
    }
}


// --------------------------------------------------------------------------
// Coord2D

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coord2D {
    pub x: f64,
    pub y: f64,
}

impl fmt::Display for Coord2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ x: {}, y: {}}}", self.x, self.y)
    }
}


// --------------------------------------------------------------------------
// Projection

pub trait Projection<From, To> {
    fn project(&self, input: &From) -> To;
}

/// Plate carree projection around a reference latitude. Longitudes are
/// shrunk by `cos(reference latitude)` so cells keep their on-ground aspect
/// at city scale. The canvas Y axis grows downwards, so latitude is negated.
#[derive(Copy, Clone, Debug)]
pub struct EquirectangularProjection {
    origin: CoordGeo,
    lon_factor: f64,
}

impl EquirectangularProjection {
    pub fn new(origin: CoordGeo) -> Self {
        Self {
            origin,
            lon_factor: f64::cos(f64::to_radians(origin.latitude)),
        }
    }
}

impl Projection<CoordGeo, Coord2D> for EquirectangularProjection {
    fn project(&self, input: &CoordGeo) -> Coord2D {
        Coord2D {
            x: (input.longitude - self.origin.longitude) * self.lon_factor,
            y: self.origin.latitude - input.latitude,
        }
    }
}


// --------------------------------------------------------------------------
// Transform

pub trait Transform<CoordType> {
    fn transform(&self, input: &CoordType) -> CoordType;
}

#[derive(Copy, Clone, Debug)]
pub struct Translate2D {
    pub x: f64,
    pub y: f64,
}

impl Transform<Coord2D> for Translate2D {
    fn transform(&self, input: &Coord2D) -> Coord2D {
        Coord2D { x: input.x + self.x, y: input.y + self.y }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Scale2D {
    pub x: f64,
    pub y: f64,
}

impl Transform<Coord2D> for Scale2D {
    fn transform(&self, input: &Coord2D) -> Coord2D {
        Coord2D { x: input.x * self.x, y: input.y * self.y }
    }
}


// --------------------------------------------------------------------------
// Viewport

/// Maps geographic coordinates onto a `width` x `height` pixel canvas so
/// that `bounds` fits inside it with `margin` pixels to spare on each side.
#[derive(Copy, Clone, Debug)]
pub struct Viewport {
    proj: EquirectangularProjection,
    scale: Scale2D,
    translate: Translate2D,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn fit(bounds: &Bounds, width: f64, height: f64, margin: f64) -> Self {
        // Project from the top-left corner so both axes start at zero
        let top_left = CoordGeo::new(bounds.max.latitude, bounds.min.longitude);
        let proj = EquirectangularProjection::new(top_left);
        let extent = proj.project(&CoordGeo::new(bounds.min.latitude, bounds.max.longitude));

        let avail_w = f64::max(width - 2.0 * margin, 1.0);
        let avail_h = f64::max(height - 2.0 * margin, 1.0);
        // A degenerate extent (single point, flat line) would divide by zero
        let scale_x = if extent.x > 0.0 { avail_w / extent.x } else { f64::INFINITY };
        let scale_y = if extent.y > 0.0 { avail_h / extent.y } else { f64::INFINITY };
        let mut scale_fac = f64::min(scale_x, scale_y);
        if !scale_fac.is_finite() {
            scale_fac = 1.0;
        }

        // Center the projected extent inside the canvas
        let translate = Translate2D {
            x: (width - extent.x * scale_fac) / 2.0,
            y: (height - extent.y * scale_fac) / 2.0,
        };

        Self {
            proj,
            scale: Scale2D { x: scale_fac, y: scale_fac },
            translate,
            width,
            height,
        }
    }
}

impl Projection<CoordGeo, Coord2D> for Viewport {
    fn project(&self, input: &CoordGeo) -> Coord2D {
        self.translate
            .transform(&self.scale.transform(&self.proj.project(input)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_blends_both_axes() {
        let a = CoordGeo::new(0.0, 10.0);
        let b = CoordGeo::new(2.0, 20.0);
        assert_eq!(lerp(&a, &b, 0.0), a);
        assert_eq!(lerp(&a, &b, 1.0), b);
        assert_eq!(lerp(&a, &b, 0.25), CoordGeo::new(0.5, 12.5));
    }

    #[test]
    fn centroid_of_square() {
        let pts = [
            CoordGeo::new(0.0, 0.0),
            CoordGeo::new(0.0, 1.0),
            CoordGeo::new(1.0, 1.0),
            CoordGeo::new(1.0, 0.0),
        ];
        assert_eq!(centroid(&pts), Some(CoordGeo::new(0.5, 0.5)));
        assert_eq!(centroid(&[]), None);
    }

    #[test]
    fn coord_serializes_as_lat_lng() {
        let json = serde_json::to_string(&CoordGeo::new(36.5, 30.25)).unwrap();
        assert_eq!(json, r#"{"lat":36.5,"lng":30.25}"#);
    }

    #[test]
    fn viewport_fits_bounds_inside_canvas() {
        let bounds = Bounds::from_points(HAL_BOUNDARY.iter()).unwrap();
        let vp = Viewport::fit(&bounds, 800.0, 600.0, 20.0);
        for p in HAL_BOUNDARY.iter() {
            let c = vp.project(p);
            assert!(c.x >= 19.999 && c.x <= 780.001, "x out of range: {}", c);
            assert!(c.y >= 19.999 && c.y <= 580.001, "y out of range: {}", c);
        }
        // North is up
        let north = vp.project(&bounds.max);
        let south = vp.project(&bounds.min);
        assert!(north.y < south.y);
    }

    #[test]
    fn viewport_handles_single_point() {
        let p = CoordGeo::new(36.9, 30.7);
        let bounds = Bounds::from_points([p].iter()).unwrap();
        let vp = Viewport::fit(&bounds, 100.0, 100.0, 10.0);
        let c = vp.project(&p);
        assert!(c.x.is_finite() && c.y.is_finite());
        assert_eq!(c, Coord2D { x: 50.0, y: 50.0 });
    }
}
