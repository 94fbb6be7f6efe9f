use super::*;
use std::collections::HashSet;

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

#[test]
fn test_numeric_not_lexicographic() {
    assert_eq!(compare_versions("1.2", "1.10").unwrap(), Ordering::Less);
    assert_eq!(compare_versions("2", "10").unwrap(), Ordering::Less);
    assert_eq!(compare_versions("10", "9").unwrap(), Ordering::Greater);
}

#[test]
fn test_trailing_zero_padding() {
    assert_eq!(v("1.5"), v("1.5.0"));
    assert_eq!(v("1"), v("1.0.0"));
    assert!(v("1.5") < v("1.5.1"));

    let mut set = HashSet::new();
    set.insert(v("1.5"));
    assert!(set.contains(&v("1.5.0")));
}

#[test]
fn test_timestamp_style_versions() {
    let a = v("20240215_120000");
    let b = v("20240215_130000");
    let c = v("20240301");
    assert_eq!(a.components(), &[20240215, 120000]);
    assert!(a < b);
    assert!(b < c);
}

#[test]
fn test_leading_zeros_are_numeric() {
    assert_eq!(v("0001"), v("1"));
    assert!(v("0002") > v("1"));
}

#[test]
fn test_display_keeps_raw_text() {
    assert_eq!(v("1.5.0").to_string(), "1.5.0");
    assert_eq!(v("0001").as_str(), "0001");
}

#[test]
fn test_total_order_over_sample() {
    let mut versions: Vec<Version> = ["10", "1.10", "1.2", "1", "2.0.1", "2", "1.2.3"]
        .iter()
        .map(|s| v(s))
        .collect();
    versions.sort();
    let sorted: Vec<&str> = versions.iter().map(Version::as_str).collect();
    assert_eq!(sorted, vec!["1", "1.2", "1.2.3", "1.10", "2", "2.0.1", "10"]);

    for a in &versions {
        for b in &versions {
            assert_eq!(a.cmp(b), b.cmp(a).reverse());
        }
    }
}

#[test]
fn test_invalid_versions() {
    for bad in ["", "1..2", "1.", ".1", "v1", "1.a", "1-2", "99999999999999999999999"] {
        assert!(
            matches!(Version::parse(bad), Err(CoreError::InvalidVersion { .. })),
            "expected '{bad}' to be rejected"
        );
    }
}

#[test]
fn test_from_str_and_serialize() {
    let parsed: Version = "3.1".parse().unwrap();
    assert_eq!(parsed.major(), 3);
    let yaml = serde_yaml::to_string(&parsed).unwrap();
    let back: String = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back, "3.1");
}
