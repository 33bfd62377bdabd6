use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TrailError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(TrailError::render("x").to_string().contains("render error:"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TrailError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde_variant() {
    let err: TrailError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, TrailError::Serde(_)));
    assert!(err.to_string().starts_with("serialization error:"));
}
