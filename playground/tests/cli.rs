use config_tree::ConfigValue;
use envs::Registry;
use playground::cli::{Backend, Invocation};
use training::params::locomotion_ppo_config;

fn parse(args: &[&str]) -> Invocation {
    Invocation::try_parse_from(std::iter::once("playground").chain(args.iter().copied())).unwrap()
}

#[test]
fn defaults_supply_no_overrides() {
    let invocation = parse(&[]);
    assert_eq!(invocation.overrides.present().count(), 0);
    assert_eq!(invocation.cli.env_name, "G1JoystickFlatTerrain");
    assert_eq!(invocation.cli.backend, Backend::Jax);
    assert_eq!(invocation.cli.hyperparameters.num_timesteps, 1_000_000);

    let options = invocation.run_options();
    assert_eq!(options.backend, "jax");
    assert_eq!(options.seed, 1);
    assert!(options.deterministic_rscope);
}

#[test]
fn only_typed_flags_are_present() {
    let invocation = parse(&["--learning-rate", "0.001", "--num-envs", "64"]);
    let names: Vec<&str> = invocation.overrides.present().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["learning_rate", "num_envs"]);
    assert_eq!(invocation.overrides.get("learning_rate").unwrap().value, ConfigValue::Float(1e-3));
}

#[test]
fn typed_default_value_still_counts() {
    let invocation = parse(&["--discounting", "0.97"]);
    assert!(invocation.overrides.is_present("discounting"));
}

#[test]
fn learning_rate_alone_changes_one_field() {
    let invocation = parse(&["--learning-rate", "0.001"]);
    let defaults = locomotion_ppo_config();
    let (resolved, report) = defaults.merged(&invocation.overrides);

    assert_eq!(report.applied, vec!["learning_rate".to_string()]);
    assert_eq!(resolved.get_f64("learning_rate"), Some(1e-3));
    assert_eq!(resolved.get_i64("num_envs"), defaults.get_i64("num_envs"));
    assert_eq!(resolved.get("network_factory"), defaults.get("network_factory"));
}

#[test]
fn layer_sizes_go_into_network_factory() {
    let invocation = parse(&["--policy-hidden-layer-sizes", "128,64"]);
    let (resolved, report) = locomotion_ppo_config().merged(&invocation.overrides);

    assert_eq!(report.applied, vec!["network_factory.policy_hidden_layer_sizes".to_string()]);
    assert_eq!(
        resolved.get_path("network_factory.policy_hidden_layer_sizes").and_then(ConfigValue::as_usize_list),
        Some(vec![128, 64])
    );
    assert_eq!(resolved.get_path("network_factory.value_obs_key").and_then(ConfigValue::as_str), Some("privileged_state"));
}

#[test]
fn boolean_flags_take_values() {
    let invocation = parse(&["--run-evals", "false", "--deterministic-rscope", "false", "--play-only", "--impl", "warp"]);
    assert!(!invocation.cli.hyperparameters.run_evals);
    assert!(invocation.overrides.is_present("run_evals"));

    let options = invocation.run_options();
    assert!(!options.deterministic_rscope);
    assert!(options.play_only);
    assert_eq!(options.backend, "warp");
}

#[test]
fn run_flags_map_to_options() {
    let invocation = parse(&[
        "--env-name",
        "G1JoystickRoughTerrain",
        "--agent",
        "fql",
        "--suffix",
        "dr",
        "--seed",
        "9",
        "--rscope-envs",
        "4",
        "--num-videos",
        "3",
        "--load-checkpoint-path",
        "ckpt",
        "--logdir",
        "runs",
    ]);
    let options = invocation.run_options();
    assert_eq!(options.env_name, "G1JoystickRoughTerrain");
    assert_eq!(options.agent, "fql");
    assert_eq!(options.suffix.as_deref(), Some("dr"));
    assert_eq!(options.seed, 9);
    assert_eq!(options.rscope_envs, Some(4));
    assert_eq!(options.num_videos, 3);
    assert_eq!(options.load_checkpoint_path.as_deref(), Some(std::path::Path::new("ckpt")));
    assert_eq!(options.logdir, std::path::PathBuf::from("runs"));
}

#[test]
fn bad_values_are_usage_errors() {
    let err = Invocation::try_parse_from(["playground", "--num-envs", "many"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    assert!(Invocation::try_parse_from(["playground", "--impl", "cuda"]).is_err());
}

#[test]
fn unknown_environment_fails_without_logs() {
    let dir = tempfile::tempdir().unwrap();
    let logdir = dir.path().join("logs");
    let invocation = parse(&["--env-name", "Nope", "--logdir", logdir.to_str().unwrap()]);

    let err = playground::app::run(&invocation).unwrap_err();

    assert!(err.to_string().contains("Nope"), "{err}");
    assert!(!logdir.exists());
}

#[test]
fn assets_dir_guards_loading() {
    let dir = tempfile::tempdir().unwrap();
    let invocation = parse(&["--assets-dir", dir.path().join("missing").to_str().unwrap()]);
    let registry: Registry = playground::app::registry(&invocation);
    assert!(registry.load("G1JoystickFlatTerrain", None, None).is_err());
}
