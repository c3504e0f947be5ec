use config_tree::{ConfigError, ConfigTree, ConfigValue};

fn joystick_like() -> ConfigTree {
    ConfigTree::new()
        .with("ctrl_dt", 0.02)
        .with("episode_length", 1000)
        .with(
            "reward_config",
            ConfigTree::new()
                .with("tracking_sigma", 0.25)
                .with("scales", ConfigTree::new().with("tracking_lin_vel", 1.0).with("orientation", -2.0)),
        )
}

#[test]
fn json_keeps_insertion_order() {
    let tree = ConfigTree::new().with("zeta", 1).with("alpha", 2).with("mid", "x");
    let json = tree.to_json_pretty().unwrap();

    let zeta = json.find("zeta").unwrap();
    let alpha = json.find("alpha").unwrap();
    let mid = json.find("mid").unwrap();
    assert!(zeta < alpha && alpha < mid);

    let back = ConfigTree::from_json_str(&json).unwrap();
    assert_eq!(back, tree);
}

#[test]
fn json_root_must_be_object() {
    let err = ConfigTree::from_json_str("[1, 2]").unwrap_err();
    assert!(matches!(err, ConfigError::NotAnObject));
}

#[test]
fn saves_and_loads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let tree = joystick_like();

    tree.save_json(&path).unwrap();

    assert_eq!(ConfigTree::load_json(&path).unwrap(), tree);
}

#[test]
fn dotted_path_lookup() {
    let tree = joystick_like();
    assert_eq!(tree.get_f64("reward_config.scales.orientation"), Some(-2.0));
    assert_eq!(tree.get_f64("reward_config.scales.missing"), None);
    assert_eq!(tree.get_i64("episode_length"), Some(1000));
}

#[test]
fn flattened_update_writes_nested_leaf() {
    let mut tree = joystick_like();
    let overrides = ConfigTree::new()
        .with("reward_config.scales.tracking_lin_vel", 2)
        .with("episode_length", 500);

    tree.update_from_flattened(&overrides).unwrap();

    assert_eq!(
        tree.get_path("reward_config.scales.tracking_lin_vel"),
        Some(&ConfigValue::Float(2.0))
    );
    assert_eq!(tree.get_i64("episode_length"), Some(500));
    assert_eq!(tree.get_f64("reward_config.scales.orientation"), Some(-2.0));
}

#[test]
fn flattened_update_rejects_unknown_key() {
    let mut tree = joystick_like();
    let overrides = ConfigTree::new().with("reward_config.scales.typo", 1.0);

    let err = tree.update_from_flattened(&overrides).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownKey(k) if k == "reward_config.scales.typo"));
}

#[test]
fn insert_replaces_in_place() {
    let mut tree = ConfigTree::new().with("a", 1).with("b", 2);
    let previous = tree.insert("a", 10);

    assert_eq!(previous, Some(ConfigValue::Int(1)));
    assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["a", "b"]);
}
