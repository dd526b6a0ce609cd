use seamline::{ComponentKind, DesignConfig, PatternError};

#[test]
fn json_overrides_defaults() {
    let config = DesignConfig::from_json_str(
        r#"{
            "body": { "waist": 80, "hips": 104 },
            "meta": { "bottom": "Skirt2" },
            "skirt": { "ruffle": 1.8, "bottom_cut": 0.3 },
            "flare-skirt": { "n_panels": 12 },
            "tolerances": { "seam_match": 0.05 }
        }"#,
    )
    .unwrap();
    assert_eq!(config.body.waist, 80.0);
    assert_eq!(config.body.leg_length, 85.0);
    assert_eq!(config.skirt.ruffle, 1.8);
    assert_eq!(config.skirt.length, 50.0);
    assert_eq!(config.flare_skirt.n_panels, 12);
    assert_eq!(config.tolerances.seam_match, 0.05);
    assert_eq!(config.bottom(), Some(ComponentKind::Skirt2));
}

#[test]
fn out_of_range_values_name_their_field() {
    let cases = [
        (r#"{ "skirt": { "ruffle": 0.5 } }"#, "skirt.ruffle"),
        (r#"{ "flare-skirt": { "n_panels": 1 } }"#, "flare_skirt.n_panels"),
        (r#"{ "pencil-skirt": { "dart_angle": 150 } }"#, "pencil_skirt.dart_angle"),
        (r#"{ "body": { "waist": -1 } }"#, "body.waist"),
        (r#"{ "body": { "waist": 110 } }"#, "body.hips"),
        (r#"{ "tolerances": { "chain": 0 } }"#, "tolerances.chain"),
    ];
    for (json, expected) in cases {
        match DesignConfig::from_json_str(json) {
            Err(PatternError::InvalidConfig { field, .. }) => assert_eq!(field, expected),
            other => panic!("{} accepted: {:?}", json, other.map(|_| ())),
        }
    }
}

#[test]
fn unknown_component_is_reported() {
    let err = DesignConfig::from_json_str(r#"{ "meta": { "bottom": "Trousers" } }"#).unwrap_err();
    assert!(matches!(err, PatternError::UnknownComponent { name } if name == "Trousers"));
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(
        DesignConfig::from_json_str("{ \"body\": "),
        Err(PatternError::Json(_))
    ));
}
