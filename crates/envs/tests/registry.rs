use config_tree::ConfigTree;
use envs::locomotion::joystick::{Joystick, Terrain};
use envs::locomotion::LocomotionTask;
use envs::{
    AssetBundle, DirectoryAssets, EnvError, Environment, EnvironmentDescriptor, Registry,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn custom_descriptor(name: &str, episode_length: i64) -> EnvironmentDescriptor {
    EnvironmentDescriptor::new(
        name,
        |config, overrides| Ok(Box::new(Joystick::new(Terrain::Flat, config, overrides)?) as Box<dyn Environment>),
        move || envs::locomotion::joystick::default_config().with("episode_length", episode_length),
    )
}

#[test]
fn load_without_config_uses_defaults() {
    let registry = Registry::with_default_suites();
    for name in registry.names() {
        let env = registry.load(&name, None, None).unwrap();
        assert_eq!(env.config(), &registry.get_default_config(&name).unwrap(), "{name}");
    }
}

#[test]
fn unknown_name_lists_every_environment() {
    let mut registry = Registry::with_default_suites();
    registry.register("manipulation", custom_descriptor("PandaPickCube", 150));

    let err = registry.get_default_config("DoesNotExist").unwrap_err();
    let message = err.to_string();

    match err {
        EnvError::UnknownEnvironment { name, available } => {
            assert_eq!(name, "DoesNotExist");
            assert_eq!(available.len(), 3);
        }
        other => panic!("unexpected error {other:?}"),
    }
    for name in ["G1JoystickFlatTerrain", "G1JoystickRoughTerrain", "PandaPickCube"] {
        assert!(message.contains(name), "{message} is missing {name}");
    }
}

#[test]
fn load_unknown_name_fails() {
    let registry = Registry::with_default_suites();
    assert!(matches!(
        registry.load("DoesNotExist", None, None),
        Err(EnvError::UnknownEnvironment { .. })
    ));
}

#[test]
fn last_registration_wins() {
    let mut registry = Registry::empty();
    registry.register("locomotion", custom_descriptor("Custom", 100));
    registry.register("locomotion", custom_descriptor("Custom", 250));

    let config = registry.get_default_config("Custom").unwrap();
    assert_eq!(config.get_i64("episode_length"), Some(250));
    assert_eq!(registry.names(), vec!["Custom".to_string()]);
}

#[test]
fn reregistering_into_another_suite_moves_the_task() {
    let mut registry = Registry::with_default_suites();
    registry.register("manipulation", custom_descriptor("G1JoystickFlatTerrain", 10));

    assert_eq!(registry.suite_of("G1JoystickFlatTerrain"), Some("manipulation"));
    assert_eq!(
        registry.names().iter().filter(|n| *n == "G1JoystickFlatTerrain").count(),
        1
    );
}

#[test]
fn randomizer_is_optional() {
    let mut registry = Registry::with_default_suites();
    registry.register("locomotion", custom_descriptor("NoRandomizer", 100));

    assert!(registry
        .get_domain_randomizer(LocomotionTask::G1JoystickRoughTerrain.name())
        .is_some());
    assert!(registry.get_domain_randomizer("NoRandomizer").is_none());
    assert!(registry.get_domain_randomizer("DoesNotExist").is_none());
}

#[test]
fn explicit_config_and_overrides_reach_the_factory() {
    let registry = Registry::with_default_suites();
    let name = LocomotionTask::G1JoystickFlatTerrain.name();
    let config = registry.get_default_config(name).unwrap().with("ctrl_dt", 0.04);
    let overrides = ConfigTree::new().with("reward_config.tracking_sigma", 0.5);

    let env = registry.load(name, Some(config), Some(&overrides)).unwrap();

    assert!((env.dt() - 0.04).abs() < 1e-12);
    assert_eq!(env.config().get_f64("reward_config.tracking_sigma"), Some(0.5));
}

#[test]
fn bad_override_is_a_config_error() {
    let registry = Registry::with_default_suites();
    let overrides = ConfigTree::new().with("reward_config.nope", 1.0);
    let result = registry.load(LocomotionTask::G1JoystickFlatTerrain.name(), None, Some(&overrides));
    assert!(matches!(result, Err(EnvError::Config(_))));
}

struct CountingAssets(AtomicUsize);

impl AssetBundle for CountingAssets {
    fn ensure_present(&self) -> Result<(), EnvError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn assets_checked_on_every_load_but_not_for_unknown_names() {
    let assets = Arc::new(CountingAssets(AtomicUsize::new(0)));
    let registry = Registry::with_default_suites().with_assets(assets.clone());

    registry.load("G1JoystickFlatTerrain", None, None).unwrap();
    registry.load("G1JoystickRoughTerrain", None, None).unwrap();
    let _ = registry.load("DoesNotExist", None, None);

    assert_eq!(assets.0.load(Ordering::SeqCst), 2);
}

#[test]
fn directory_assets_report_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let assets = DirectoryAssets::new(dir.path()).requiring("unitree_g1/scene.xml");
    assert!(matches!(assets.ensure_present(), Err(EnvError::MissingAssets(_))));

    std::fs::create_dir_all(dir.path().join("unitree_g1")).unwrap();
    std::fs::write(dir.path().join("unitree_g1/scene.xml"), "<mujoco/>").unwrap();
    assert!(assets.ensure_present().is_ok());
    assert!(assets.ensure_present().is_ok());
}
