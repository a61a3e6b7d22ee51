//! Tests for region selection and query value types.

use ocean_common::query::{optional, required};
use ocean_common::{DepthRange, Field, LatLonBox, QualityLevel, RegionSelector, ResponseFormat};

// ============================================================================
// LatLonBox tests
// ============================================================================

#[test]
fn test_latlon_box_new() {
    let bbox = LatLonBox::new(-40.0, -10.0, 105.0, 160.0);
    assert_eq!(bbox.lat_min, -40.0);
    assert_eq!(bbox.lat_max, -10.0);
    assert_eq!(bbox.lon_min, 105.0);
    assert_eq!(bbox.lon_max, 160.0);
    assert_eq!(bbox.lat_range(), [-40.0, -10.0]);
    assert_eq!(bbox.lon_range(), [105.0, 160.0]);
}

#[test]
fn test_latlon_box_inverted_matches_nothing() {
    let bbox = LatLonBox::new(10.0, -10.0, 0.0, 20.0);
    assert!(!bbox.contains(0.0, 10.0));
}

#[test]
fn test_latlon_box_serializes_flat() {
    let bbox = LatLonBox::new(1.0, 2.0, 3.0, 4.0);
    let json = serde_json::to_value(bbox).unwrap();
    assert_eq!(json["lat_min"], 1.0);
    assert_eq!(json["lon_max"], 4.0);
}

// ============================================================================
// Selector tests
// ============================================================================

#[test]
fn test_region_selector_defaults() {
    let selector = RegionSelector::new(
        LatLonBox::new(-40.0, -10.0, 105.0, 160.0),
        DepthRange::default(),
        QualityLevel::default(),
    );
    assert_eq!(selector.depth.as_pair(), [0, 1]);
    assert_eq!(selector.quality.value(), -12);
}

#[test]
fn test_depth_range_error_is_client_error() {
    let err = DepthRange::new(10, 0).unwrap_err();
    assert_eq!(err.http_status_code(), 400);
}

// ============================================================================
// Parameter parsing tests
// ============================================================================

#[test]
fn test_parse_scientific_notation() {
    let v: f64 = required("lon_min", Some("1.05e2")).unwrap();
    assert!((v - 105.0).abs() < 1e-9);
}

#[test]
fn test_parse_with_whitespace() {
    let v: i32 = optional("quality", Some(" -8 "), -12).unwrap();
    assert_eq!(v, -8);
}

#[test]
fn test_format_default_is_array() {
    assert_eq!(ResponseFormat::default(), ResponseFormat::Array);
    assert_eq!(ResponseFormat::Base64.as_str(), "base64");
}

#[test]
fn test_field_display_is_canonical() {
    assert_eq!(Field::parse("THETA").unwrap().to_string(), "temperature");
    assert_eq!(Field::VerticalVelocity.aliases(), ["vertical_velocity", "w"]);
}
