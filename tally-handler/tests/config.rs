use tally_handler::{HandlerConfig, MissingRecordPolicy};

#[test]
fn default_policy_is_lenient() {
    assert_eq!(MissingRecordPolicy::Lenient, HandlerConfig::default().missing_record);
    assert_eq!(None, HandlerConfig::default().table_name);
}

#[test]
fn parse_policy() {
    assert_eq!(Ok(MissingRecordPolicy::Strict), "strict".parse());
    assert_eq!(Ok(MissingRecordPolicy::Lenient), " Lenient ".parse());
    assert!("sometimes".parse::<MissingRecordPolicy>().is_err());
    assert_eq!("strict", MissingRecordPolicy::Strict.to_string());
}

#[test]
fn overrides_replace_configured_values() {
    let config = HandlerConfig::new("from-file")
        .with_overrides(Some("from-env".to_owned()), Some("strict".to_owned()))
        .unwrap();

    assert_eq!(Some("from-env".to_owned()), config.table_name);
    assert_eq!(MissingRecordPolicy::Strict, config.missing_record);
}

#[test]
fn blank_table_name_override_is_ignored() {
    let config = HandlerConfig::new("from-file")
        .with_overrides(Some("  ".to_owned()), None)
        .unwrap();

    assert_eq!(Some("from-file".to_owned()), config.table_name);
    assert_eq!(MissingRecordPolicy::Lenient, config.missing_record);
}

#[test]
fn invalid_policy_override_is_an_error() {
    assert!(HandlerConfig::default().with_overrides(None, Some("maybe".to_owned())).is_err());
}

#[test]
fn blank_policy_override_is_ignored() {
    let config = HandlerConfig::new("from-file")
        .with_missing_record_policy(MissingRecordPolicy::Strict)
        .with_overrides(None, Some(" ".to_owned()))
        .unwrap();

    assert_eq!(MissingRecordPolicy::Strict, config.missing_record);
}

#[test]
fn policy_deserializes_like_it_parses() {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        missing_record: MissingRecordPolicy,
    }

    for (raw, expected) in [("\"strict\"", MissingRecordPolicy::Strict), ("\"Strict\"", MissingRecordPolicy::Strict), ("\" LENIENT \"", MissingRecordPolicy::Lenient)] {
        let wrapper: Wrapper = serde_json::from_str(&format!("{{\"missing_record\": {raw}}}")).unwrap();
        assert_eq!(expected, wrapper.missing_record, "input: {raw}");
    }
    assert!(serde_json::from_str::<Wrapper>(r#"{"missing_record": "sometimes"}"#).is_err());
}
