use derive_more::Display;
use serde::Serialize;

/// Mean Earth radius in kilometres. Good enough for short and medium range
/// geofencing, not for geodesy.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Separates the north-east and south-west corners of a box filter,
/// e.g. `"10,10|0,0"`.
pub const BOUNDS_PAIR_SEPARATOR: char = '|';

/// Separates latitude from longitude inside one coordinate, e.g. `"51.5,-0.12"`.
pub const COORDINATE_SEPARATOR: char = ',';

#[derive(Debug, Display, Clone, PartialEq)]
pub enum GeoParseError {
    #[display("expected {expected} values separated by '{separator}', found {found}")]
    WrongTokenCount { expected: usize, found: usize, separator: char },

    #[display("'{_0}' is not a finite number")]
    NotANumber(String),

    #[display("a radius needs a 'lat,lng' center in bounds")]
    MissingCenter,

    #[display("radius must be a non-negative number of meters, got {_0}")]
    InvalidRadius(f64),
}

impl std::error::Error for GeoParseError {}

/// A latitude/longitude pair in degrees. Ranges are not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint { latitude, longitude }
    }

    /// Parses `"lat,lng"`. Surrounding whitespace around either value is allowed.
    pub fn parse(raw: &str) -> Result<Self, GeoParseError> {
        let tokens: Vec<&str> = raw.split(COORDINATE_SEPARATOR).collect();
        if tokens.len() != 2 {
            return Err(GeoParseError::WrongTokenCount {
                expected: 2,
                found: tokens.len(),
                separator: COORDINATE_SEPARATOR,
            });
        }

        Ok(GeoPoint {
            latitude: parse_degrees(tokens[0])?,
            longitude: parse_degrees(tokens[1])?,
        })
    }
}

fn parse_degrees(token: &str) -> Result<f64, GeoParseError> {
    let token = token.trim();
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeoParseError::NotANumber(token.to_string()))
}

/// Rectangular region; `west > east` means the box crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Builds the box from its north-east and south-west corners.
    pub fn from_corners(north_east: GeoPoint, south_west: GeoPoint) -> Self {
        BoundingBox {
            north: north_east.latitude,
            south: south_west.latitude,
            east: north_east.longitude,
            west: south_west.longitude,
        }
    }

    /// Parses `"north,east|south,west"`.
    pub fn parse(raw: &str) -> Result<Self, GeoParseError> {
        let corners: Vec<&str> = raw.split(BOUNDS_PAIR_SEPARATOR).collect();
        if corners.len() != 2 {
            return Err(GeoParseError::WrongTokenCount {
                expected: 2,
                found: corners.len(),
                separator: BOUNDS_PAIR_SEPARATOR,
            });
        }

        let north_east = GeoPoint::parse(corners[0])?;
        let south_west = GeoPoint::parse(corners[1])?;
        Ok(Self::from_corners(north_east, south_west))
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        is_within_bounds(
            self.north,
            self.south,
            self.east,
            self.west,
            point.latitude,
            point.longitude,
        )
    }
}

/// Returns true iff `(latitude, longitude)` lies inside the box.
///
/// Edges are inclusive, so a degenerate box (`north == south` or
/// `east == west`) only admits exact matches. When `west > east` the box
/// wraps the antimeridian and a longitude only has to clear one of the two
/// bounds.
pub fn is_within_bounds(
    north: f64,
    south: f64,
    east: f64,
    west: f64,
    latitude: f64,
    longitude: f64,
) -> bool {
    if !(south <= latitude && latitude <= north) {
        return false;
    }

    if west <= east {
        west <= longitude && longitude <= east
    } else {
        longitude >= west || longitude <= east
    }
}

/// Haversine distance in meters between two points, corrected for the
/// elevation difference `el1 - el2` (meters). Pass 0 for both elevations to
/// get the plain surface distance.
///
/// The elevation delta is treated as orthogonal to the great-circle
/// distance, which only holds for small deltas.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64, el1: f64, el2: f64) -> f64 {
    let lat_distance = (lat2 - lat1).to_radians();
    let lon_distance = (lon2 - lon1).to_radians();

    let a = (lat_distance / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (lon_distance / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    let surface = EARTH_RADIUS_KM * c * 1000.0;

    let height = el1 - el2;

    (surface.powi(2) + height.powi(2)).sqrt()
}

/// A region resolved from the query parameters. Built once per query, before
/// any record is read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoFilter {
    Everywhere,
    Radius { center: GeoPoint, meters: f64 },
    Box(BoundingBox),
}

impl GeoFilter {
    /// Radius mode wins when a radius is given; otherwise `bounds` is read as
    /// a corner pair. Neither means no filtering.
    pub fn resolve(bounds: Option<&str>, radius: Option<f64>) -> Result<Self, GeoParseError> {
        match (bounds, radius) {
            (_, Some(meters)) if !meters.is_finite() || meters < 0.0 => {
                Err(GeoParseError::InvalidRadius(meters))
            }
            (Some(center), Some(meters)) => Ok(GeoFilter::Radius {
                center: GeoPoint::parse(center)?,
                meters,
            }),
            (None, Some(_)) => Err(GeoParseError::MissingCenter),
            (Some(corners), None) => Ok(GeoFilter::Box(BoundingBox::parse(corners)?)),
            (None, None) => Ok(GeoFilter::Everywhere),
        }
    }
}

/// Decides whether a record at `(latitude, longitude)` passes the filter.
pub fn matches_filter(filter: &GeoFilter, latitude: f64, longitude: f64) -> bool {
    match filter {
        GeoFilter::Everywhere => true,
        GeoFilter::Radius { center, meters } => {
            distance(center.latitude, center.longitude, latitude, longitude, 0.0, 0.0) <= *meters
        }
        GeoFilter::Box(bbox) => bbox.contains(GeoPoint::new(latitude, longitude)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_inside_plain_box() {
        assert!(is_within_bounds(10.0, 0.0, 10.0, 0.0, 5.0, 5.0));
    }

    #[test]
    fn point_outside_each_edge_is_rejected() {
        assert!(!is_within_bounds(10.0, 0.0, 10.0, 0.0, 15.0, 5.0));
        assert!(!is_within_bounds(10.0, 0.0, 10.0, 0.0, -5.0, 5.0));
        assert!(!is_within_bounds(10.0, 0.0, 10.0, 0.0, 5.0, 15.0));
        assert!(!is_within_bounds(10.0, 0.0, 10.0, 0.0, 5.0, -5.0));
    }

    #[test]
    fn box_edges_are_inclusive() {
        assert!(is_within_bounds(10.0, 0.0, 10.0, 0.0, 10.0, 0.0));
        assert!(is_within_bounds(10.0, 0.0, 10.0, 0.0, 0.0, 10.0));
    }

    #[test]
    fn antimeridian_box_wraps() {
        assert!(is_within_bounds(10.0, -10.0, -170.0, 170.0, 0.0, 175.0));
        assert!(is_within_bounds(10.0, -10.0, -170.0, 170.0, 0.0, -175.0));
        assert!(is_within_bounds(10.0, -10.0, -170.0, 170.0, 0.0, 180.0));
        assert!(!is_within_bounds(10.0, -10.0, -170.0, 170.0, 0.0, 0.0));
        assert!(!is_within_bounds(10.0, -10.0, -170.0, 170.0, 20.0, 175.0));
    }

    #[test]
    fn degenerate_box_only_matches_exactly() {
        assert!(is_within_bounds(5.0, 5.0, 7.0, 7.0, 5.0, 7.0));
        assert!(!is_within_bounds(5.0, 5.0, 7.0, 7.0, 5.0, 7.0001));
        assert!(!is_within_bounds(5.0, 5.0, 7.0, 7.0, 5.0001, 7.0));
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(distance(48.8566, 2.3522, 48.8566, 2.3522, 0.0, 0.0), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            ((0.0, 0.0), (0.0, 0.02)),
            ((51.5074, -0.1278), (48.8566, 2.3522)),
            ((-33.8688, 151.2093), (35.6762, 139.6503)),
            ((10.0, 179.9), (10.0, -179.9)),
        ];
        for ((lat1, lon1), (lat2, lon2)) in pairs {
            let there = distance(lat1, lon1, lat2, lon2, 0.0, 0.0);
            let back = distance(lat2, lon2, lat1, lon1, 0.0, 0.0);
            assert!((there - back).abs() < 1e-6, "{there} != {back}");
        }
    }

    #[test]
    fn distance_along_equator_matches_arc_length() {
        // 0.005 degrees of longitude on the equator is roughly 556 m
        let d = distance(0.0, 0.0, 0.0, 0.005, 0.0, 0.0);
        assert!((d - 555.97).abs() < 1.0, "got {d}");

        let d = distance(0.0, 0.0, 0.0, 0.02, 0.0, 0.0);
        assert!((d - 2223.9).abs() < 1.0, "got {d}");
    }

    #[test]
    fn distance_london_to_paris() {
        let d = distance(51.5074, -0.1278, 48.8566, 2.3522, 0.0, 0.0);
        assert!((d - 343_500.0).abs() < 1_500.0, "got {d}");
    }

    #[test]
    fn elevation_adds_orthogonally() {
        assert!((distance(0.0, 0.0, 0.0, 0.0, 300.0, 0.0) - 300.0).abs() < 1e-9);

        let flat = distance(0.0, 0.0, 0.0, 0.005, 0.0, 0.0);
        let raised = distance(0.0, 0.0, 0.0, 0.005, 0.0, 100.0);
        assert!((raised - (flat.powi(2) + 100.0_f64.powi(2)).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn parses_point_with_whitespace() {
        assert_eq!(GeoPoint::parse(" 12.5 , -7 ").unwrap(), GeoPoint::new(12.5, -7.0));
    }

    #[test]
    fn rejects_malformed_points() {
        assert!(matches!(
            GeoPoint::parse("abc"),
            Err(GeoParseError::WrongTokenCount { expected: 2, found: 1, .. })
        ));
        assert!(matches!(
            GeoPoint::parse("1,2,3"),
            Err(GeoParseError::WrongTokenCount { found: 3, .. })
        ));
        assert!(matches!(GeoPoint::parse("1,x"), Err(GeoParseError::NotANumber(_))));
        assert!(matches!(GeoPoint::parse("NaN,2"), Err(GeoParseError::NotANumber(_))));
        assert!(matches!(GeoPoint::parse(","), Err(GeoParseError::NotANumber(_))));
    }

    #[test]
    fn parses_bounds_pair() {
        let bbox = BoundingBox::parse("10,10|0,0").unwrap();
        assert_eq!(
            bbox,
            BoundingBox { north: 10.0, south: 0.0, east: 10.0, west: 0.0 }
        );
    }

    #[test]
    fn rejects_bounds_without_separator() {
        assert!(matches!(
            BoundingBox::parse("10,10,0,0"),
            Err(GeoParseError::WrongTokenCount { separator: '|', found: 1, .. })
        ));
        assert!(BoundingBox::parse("10,10|0,0|1,1").is_err());
        assert!(BoundingBox::parse("10,10|zero,0").is_err());
    }

    #[test]
    fn resolve_prefers_radius_over_box() {
        let filter = GeoFilter::resolve(Some("1,2"), Some(500.0)).unwrap();
        assert_eq!(
            filter,
            GeoFilter::Radius { center: GeoPoint::new(1.0, 2.0), meters: 500.0 }
        );
    }

    #[test]
    fn resolve_without_parameters_is_everywhere() {
        assert_eq!(GeoFilter::resolve(None, None).unwrap(), GeoFilter::Everywhere);
    }

    #[test]
    fn resolve_rejects_radius_without_center() {
        assert_eq!(GeoFilter::resolve(None, Some(10.0)), Err(GeoParseError::MissingCenter));
    }

    #[test]
    fn resolve_rejects_negative_or_infinite_radius() {
        assert!(matches!(
            GeoFilter::resolve(Some("0,0"), Some(-5.0)),
            Err(GeoParseError::InvalidRadius(_))
        ));
        assert!(matches!(
            GeoFilter::resolve(Some("0,0"), Some(f64::INFINITY)),
            Err(GeoParseError::InvalidRadius(_))
        ));
    }

    #[test]
    fn resolve_rejects_box_string_in_radius_mode() {
        assert!(GeoFilter::resolve(Some("10,10|0,0"), Some(100.0)).is_err());
    }

    #[test]
    fn radius_filter_includes_near_and_excludes_far() {
        let filter = GeoFilter::resolve(Some("0,0"), Some(1000.0)).unwrap();
        assert!(matches_filter(&filter, 0.0, 0.005));
        assert!(!matches_filter(&filter, 0.0, 0.02));
    }

    #[test]
    fn zero_radius_only_matches_the_center() {
        let filter = GeoFilter::resolve(Some("3,4"), Some(0.0)).unwrap();
        assert!(matches_filter(&filter, 3.0, 4.0));
        assert!(!matches_filter(&filter, 3.0, 4.00001));
    }

    #[test]
    fn box_filter_uses_north_east_then_south_west() {
        let filter = GeoFilter::resolve(Some("10,10|0,0"), None).unwrap();
        assert!(matches_filter(&filter, 5.0, 5.0));
        assert!(!matches_filter(&filter, -5.0, -5.0));
    }

    #[test]
    fn box_filter_across_antimeridian() {
        let filter = GeoFilter::resolve(Some("10,-170|-10,170"), None).unwrap();
        assert!(matches_filter(&filter, 0.0, 175.0));
        assert!(matches_filter(&filter, 0.0, -172.5));
        assert!(!matches_filter(&filter, 0.0, 0.0));
    }

    #[test]
    fn everywhere_accepts_any_point() {
        assert!(matches_filter(&GeoFilter::Everywhere, -90.0, 180.0));
        assert!(matches_filter(&GeoFilter::Everywhere, 1234.0, -999.0));
    }
}
