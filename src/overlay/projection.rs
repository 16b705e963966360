//! Map projections and their world extents.

use std::f64::consts::PI;

/// WGS84 ellipsoid semi-major axis in meters.
pub const ELLIPSOID_RADIUS: f64 = 6_378_137.0;

/// Half the Web Mercator world extent in meters.
const WEB_MERCATOR_HALF_WORLD: f64 = PI * ELLIPSOID_RADIUS;

/// An axis-aligned rectangle in projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Rectangle {
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }
}

/// A rectangle on the globe, in degrees of longitude and latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobeRectangle {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GlobeRectangle {
    /// The whole globe.
    pub const WORLD: GlobeRectangle = GlobeRectangle {
        west: -180.0,
        south: -90.0,
        east: 180.0,
        north: 90.0,
    };
}

/// The map projections overlay services address tiles in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// EPSG:3857-family spherical Mercator, square world, one root tile.
    #[default]
    WebMercator,
    /// Equirectangular longitude/latitude, 2:1 world, two root tiles.
    Geographic,
}

impl Projection {
    /// The full world extent in this projection's coordinates.
    pub fn world_rectangle(self) -> Rectangle {
        match self {
            Projection::WebMercator => Rectangle {
                west: -WEB_MERCATOR_HALF_WORLD,
                south: -WEB_MERCATOR_HALF_WORLD,
                east: WEB_MERCATOR_HALF_WORLD,
                north: WEB_MERCATOR_HALF_WORLD,
            },
            Projection::Geographic => Rectangle {
                west: -180.0,
                south: -90.0,
                east: 180.0,
                north: 90.0,
            },
        }
    }

    /// Root tile grid matching the world extent's aspect ratio.
    pub fn root_tile_counts(self) -> (u32, u32) {
        match self {
            Projection::WebMercator => (1, 1),
            Projection::Geographic => (2, 1),
        }
    }

    /// Projects a globe rectangle into this projection. Web Mercator
    /// latitudes are clamped to the projection's valid range.
    pub fn project(self, globe: GlobeRectangle) -> Rectangle {
        match self {
            Projection::Geographic => Rectangle {
                west: globe.west,
                south: globe.south,
                east: globe.east,
                north: globe.north,
            },
            Projection::WebMercator => Rectangle {
                west: globe.west.to_radians() * ELLIPSOID_RADIUS,
                south: mercator_y(globe.south),
                east: globe.east.to_radians() * ELLIPSOID_RADIUS,
                north: mercator_y(globe.north),
            },
        }
    }
}

/// Maximum latitude representable in Web Mercator, in degrees.
const WEB_MERCATOR_MAX_LAT: f64 = 85.05112878;

fn mercator_y(lat_degrees: f64) -> f64 {
    let lat = lat_degrees
        .clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT)
        .to_radians();
    ((PI / 4.0 + lat / 2.0).tan()).ln() * ELLIPSOID_RADIUS
}

/// Maps a coordinate-reference-system token from a capability document to a
/// projection.
///
/// Geographic CRS tokens select the equirectangular projection; everything
/// else, including unrecognized tokens, falls back to Web Mercator.
pub fn projection_for_crs(token: &str) -> Projection {
    const GEOGRAPHIC_TOKENS: [&str; 3] = ["4326", "4490", "CRS84"];
    if GEOGRAPHIC_TOKENS.iter().any(|t| token.contains(t)) {
        Projection::Geographic
    } else {
        Projection::WebMercator
    }
}
