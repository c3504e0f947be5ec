//! Velocity-command tracking for a 12-joint biped.
//!
//! The dynamics here are a kinematic stand-in: joints are PD-driven point
//! inertias and the floating base relaxes toward a velocity set by the first
//! three action channels. That is enough to exercise registries, trainers and
//! the render pipeline without a physics engine.

use crate::env::Environment;
use crate::error::EnvError;
use crate::model::Model;
use crate::state::{Observation, SimData, State};
use config_tree::{ConfigError, ConfigTree};
use std::collections::BTreeMap;
use std::f64::consts::TAU;

pub const NUM_JOINTS: usize = 12;
const NUM_BODIES: usize = NUM_JOINTS + 1;
const BASE_HEIGHT: f64 = 0.75;
const MAX_JOINT_DEVIATION: f64 = 1.5;
const NOMINAL_FRICTION: f64 = 0.6;
const GAIT_SPEED: [f64; 3] = [1.5, 0.8, 1.2];

/// Hip pitch/roll/yaw, knee, ankle pitch/roll for the left then right leg.
pub const DEFAULT_POSE: [f64; NUM_JOINTS] =
    [-0.312, 0.0, 0.0, 0.669, -0.363, 0.0, -0.312, 0.0, 0.0, 0.669, -0.363, 0.0];

const STATE_OBS: usize = 3 + 3 + 3 + 3 + 3 * NUM_JOINTS;
const PRIVILEGED_OBS: usize = STATE_OBS + 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terrain {
    Flat,
    Rough,
}

impl Terrain {
    /// Ground height under `(x, y)`.
    #[must_use]
    pub fn height(self, x: f64, y: f64) -> f64 {
        match self {
            Terrain::Flat => 0.0,
            Terrain::Rough => 0.04 * (2.5 * x).sin() * (2.5 * y).cos(),
        }
    }
}

#[must_use]
pub fn default_config() -> ConfigTree {
    ConfigTree::new()
        .with("ctrl_dt", 0.02)
        .with("sim_dt", 0.004)
        .with("episode_length", 1000)
        .with("action_repeat", 1)
        .with("action_scale", 0.5)
        .with("history_len", 1)
        .with("soft_joint_pos_limit_factor", 0.95)
        .with("impl", "jax")
        .with(
            "noise_config",
            ConfigTree::new().with("level", 1.0).with(
                "scales",
                ConfigTree::new()
                    .with("joint_pos", 0.03)
                    .with("joint_vel", 1.5)
                    .with("gravity", 0.05)
                    .with("linvel", 0.1)
                    .with("gyro", 0.2),
            ),
        )
        .with(
            "reward_config",
            ConfigTree::new()
                .with(
                    "scales",
                    ConfigTree::new()
                        .with("tracking_lin_vel", 1.0)
                        .with("tracking_ang_vel", 0.5)
                        .with("action_rate", -0.01)
                        .with("energy", -1e-4)
                        .with("termination", -1.0),
                )
                .with("tracking_sigma", 0.25),
        )
        .with(
            "push_config",
            ConfigTree::new()
                .with("enable", true)
                .with("interval_range", [5.0, 10.0])
                .with("magnitude_range", [0.1, 2.0]),
        )
        .with("lin_vel_x", [-1.0, 1.0])
        .with("lin_vel_y", [-0.5, 0.5])
        .with("ang_vel_yaw", [-1.0, 1.0])
}

#[must_use]
pub fn nominal_model(sim_dt: f64) -> Model {
    let mut body_mass = vec![15.0];
    body_mass.extend([2.5, 1.5, 1.5, 2.0, 0.8, 0.5].iter().cycle().take(NUM_JOINTS));
    Model {
        timestep: sim_dt,
        geom_friction: vec![NOMINAL_FRICTION; 3],
        body_mass,
        actuator_gain: vec![75.0; NUM_JOINTS],
        dof_damping: vec![2.0; NUM_JOINTS],
        nmocap: 0,
    }
}

fn require_timestep(config: &ConfigTree, key: &str) -> Result<f64, ConfigError> {
    let dt = config.require_f64(key)?;
    if dt.is_finite() && dt > 0.0 {
        Ok(dt)
    } else {
        Err(ConfigError::TypeMismatch { key: key.to_string(), expected: "a positive timestep" })
    }
}

struct Params {
    ctrl_dt: f64,
    action_scale: f64,
    tracking_sigma: f64,
    scale_lin_vel: f64,
    scale_ang_vel: f64,
    scale_action_rate: f64,
    scale_energy: f64,
    scale_termination: f64,
    push_enable: bool,
    push_interval: [f64; 2],
    push_magnitude: [f64; 2],
    command_ranges: [[f64; 2]; 3],
    noise_level: f64,
    noise_joint_pos: f64,
    noise_joint_vel: f64,
    noise_gravity: f64,
    noise_linvel: f64,
    noise_gyro: f64,
}

impl Params {
    fn from_config(config: &ConfigTree) -> Result<Self, ConfigError> {
        Ok(Self {
            ctrl_dt: require_timestep(config, "ctrl_dt")?,
            action_scale: config.require_f64("action_scale")?,
            tracking_sigma: config.require_f64("reward_config.tracking_sigma")?,
            scale_lin_vel: config.require_f64("reward_config.scales.tracking_lin_vel")?,
            scale_ang_vel: config.require_f64("reward_config.scales.tracking_ang_vel")?,
            scale_action_rate: config.require_f64("reward_config.scales.action_rate")?,
            scale_energy: config.require_f64("reward_config.scales.energy")?,
            scale_termination: config.require_f64("reward_config.scales.termination")?,
            push_enable: config.get_bool("push_config.enable").unwrap_or(false),
            push_interval: range(config, "push_config.interval_range")?,
            push_magnitude: range(config, "push_config.magnitude_range")?,
            command_ranges: [
                range(config, "lin_vel_x")?,
                range(config, "lin_vel_y")?,
                range(config, "ang_vel_yaw")?,
            ],
            noise_level: config.require_f64("noise_config.level")?,
            noise_joint_pos: config.require_f64("noise_config.scales.joint_pos")?,
            noise_joint_vel: config.require_f64("noise_config.scales.joint_vel")?,
            noise_gravity: config.require_f64("noise_config.scales.gravity")?,
            noise_linvel: config.require_f64("noise_config.scales.linvel")?,
            noise_gyro: config.require_f64("noise_config.scales.gyro")?,
        })
    }
}

fn range(config: &ConfigTree, key: &str) -> Result<[f64; 2], ConfigError> {
    let mismatch = || ConfigError::TypeMismatch { key: key.to_string(), expected: "[low, high]" };
    let items = config
        .get_path(key)
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?
        .as_list()
        .ok_or_else(mismatch)?;
    match items {
        [lo, hi] => Ok([lo.as_f64().ok_or_else(mismatch)?, hi.as_f64().ok_or_else(mismatch)?]),
        _ => Err(mismatch()),
    }
}

fn uniform(rng: &mut fastrand::Rng, [lo, hi]: [f64; 2]) -> f64 {
    lo + (hi - lo) * rng.f64()
}

#[allow(clippy::cast_possible_truncation)]
fn noise(rng: &mut fastrand::Rng, scale: f64) -> f32 {
    (scale * (2.0 * rng.f64() - 1.0)) as f32
}

fn info_scalar(info: &BTreeMap<String, Vec<f64>>, key: &str) -> f64 {
    info.get(key).and_then(|v| v.first().copied()).unwrap_or(0.0)
}

/// Joystick-commanded walking on flat or rough ground.
pub struct Joystick {
    terrain: Terrain,
    config: ConfigTree,
    model: Model,
    params: Params,
}

impl Joystick {
    /// Builds the task, applying dotted-key `overrides` to `config` first.
    pub fn new(
        terrain: Terrain,
        mut config: ConfigTree,
        overrides: Option<&ConfigTree>,
    ) -> Result<Self, EnvError> {
        if let Some(overrides) = overrides {
            config.update_from_flattened(overrides)?;
        }
        let params = Params::from_config(&config)?;
        let model = nominal_model(require_timestep(&config, "sim_dt")?);
        Ok(Self { terrain, config, model, params })
    }

    #[must_use]
    pub fn terrain(&self) -> Terrain {
        self.terrain
    }

    fn push_countdown(&self, rng: &mut fastrand::Rng) -> f64 {
        (uniform(rng, self.params.push_interval) / self.params.ctrl_dt).round()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn observe(
        &self,
        model: &Model,
        data: &SimData,
        info: &BTreeMap<String, Vec<f64>>,
        rng: &mut fastrand::Rng,
    ) -> Observation {
        let p = &self.params;
        let level = p.noise_level;
        let yaw = 2.0 * data.qpos[6].atan2(data.qpos[3]);
        let (sin, cos) = yaw.sin_cos();
        let (vx_w, vy_w, wz) = (data.qvel[0], data.qvel[1], data.qvel[5]);
        let local_v = [cos * vx_w + sin * vy_w, -sin * vx_w + cos * vy_w];
        let command = info.get("command").cloned().unwrap_or_else(|| vec![0.0; 3]);
        let last_action = info.get("last_action").cloned().unwrap_or_else(|| vec![0.0; NUM_JOINTS]);

        let mut state = Vec::with_capacity(STATE_OBS);
        state.push(local_v[0] as f32 + noise(rng, level * p.noise_linvel));
        state.push(local_v[1] as f32 + noise(rng, level * p.noise_linvel));
        state.push(noise(rng, level * p.noise_linvel));
        state.push(noise(rng, level * p.noise_gyro));
        state.push(noise(rng, level * p.noise_gyro));
        state.push(wz as f32 + noise(rng, level * p.noise_gyro));
        state.push(noise(rng, level * p.noise_gravity));
        state.push(noise(rng, level * p.noise_gravity));
        state.push(-1.0 + noise(rng, level * p.noise_gravity));
        state.extend(command.iter().map(|&c| c as f32));
        for j in 0..NUM_JOINTS {
            let q = data.qpos[7 + j] - DEFAULT_POSE[j];
            state.push(q as f32 + noise(rng, level * p.noise_joint_pos));
        }
        for j in 0..NUM_JOINTS {
            let qd = data.qvel[6 + j];
            state.push(qd as f32 + noise(rng, level * p.noise_joint_vel));
        }
        state.extend(last_action.iter().map(|&a| a as f32));

        let mut privileged = state.clone();
        let nominal_mass = nominal_model(model.timestep).total_mass();
        let push = data.xfrc_applied.first().copied().unwrap_or_default();
        privileged.extend([
            local_v[0] as f32,
            local_v[1] as f32,
            wz as f32,
            (data.qpos[2] - self.terrain.height(data.qpos[0], data.qpos[1])) as f32,
            mean(&model.geom_friction) as f32,
            (model.total_mass() / nominal_mass) as f32,
            push[0] as f32,
            push[1] as f32,
        ]);

        Observation::from([
            ("state".to_string(), state),
            ("privileged_state".to_string(), privileged),
        ])
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Environment for Joystick {
    fn reset(&self, seed: u64) -> State {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut qpos = vec![0.0, 0.0, BASE_HEIGHT + self.terrain.height(0.0, 0.0), 1.0, 0.0, 0.0, 0.0];
        qpos.extend(DEFAULT_POSE.iter().map(|q| q + uniform(&mut rng, [-0.05, 0.05])));

        let data = SimData {
            qpos,
            qvel: vec![0.0; 6 + NUM_JOINTS],
            qacc: vec![0.0; 6 + NUM_JOINTS],
            time: 0.0,
            ctrl: DEFAULT_POSE.to_vec(),
            act: vec![0.0; NUM_JOINTS],
            mocap_pos: Vec::new(),
            mocap_quat: Vec::new(),
            xfrc_applied: vec![[0.0; 6]; NUM_BODIES],
        };

        let command: Vec<f64> =
            self.params.command_ranges.iter().map(|r| uniform(&mut rng, *r)).collect();
        let mut info = BTreeMap::new();
        info.insert("command".to_string(), command);
        info.insert("last_action".to_string(), vec![0.0; NUM_JOINTS]);
        info.insert("push_countdown".to_string(), vec![self.push_countdown(&mut rng)]);
        info.insert("step".to_string(), vec![0.0]);

        let obs = self.observe(&self.model, &data, &info, &mut rng);
        State { data, obs, reward: 0.0, done: false, metrics: BTreeMap::new(), info, rng: rng.u64(..) }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn step_with(&self, model: &Model, state: &State, action: &[f32]) -> State {
        let p = &self.params;
        let mut rng = fastrand::Rng::with_seed(state.rng);
        let mut data = state.data.clone();
        let mut info = state.info.clone();

        let action: Vec<f64> = (0..NUM_JOINTS)
            .map(|j| f64::from(action.get(j).copied().unwrap_or(0.0)).clamp(-1.0, 1.0))
            .collect();
        for j in 0..NUM_JOINTS {
            data.ctrl[j] = DEFAULT_POSE[j] + action[j] * p.action_scale;
        }

        let substeps = (p.ctrl_dt / model.timestep).round().max(1.0) as usize;
        let dt = model.timestep;
        let nominal_mass = nominal_model(model.timestep).total_mass();
        let mass_scale = model.total_mass() / nominal_mass;
        let traction = (mean(&model.geom_friction) / NOMINAL_FRICTION).min(1.0);

        let yaw0 = 2.0 * data.qpos[6].atan2(data.qpos[3]);
        let (sin0, cos0) = yaw0.sin_cos();
        let mut local_v = [
            cos0 * data.qvel[0] + sin0 * data.qvel[1],
            -sin0 * data.qvel[0] + cos0 * data.qvel[1],
            data.qvel[5],
        ];

        let mut countdown = info_scalar(&info, "push_countdown") - 1.0;
        data.xfrc_applied = vec![[0.0; 6]; NUM_BODIES];
        if p.push_enable && countdown <= 0.0 {
            let angle = TAU * rng.f64();
            let kick = uniform(&mut rng, p.push_magnitude) / mass_scale;
            local_v[0] += kick * (angle - yaw0).cos();
            local_v[1] += kick * (angle - yaw0).sin();
            let force = kick * model.total_mass() / p.ctrl_dt;
            data.xfrc_applied[0] = [force * angle.cos(), force * angle.sin(), 0.0, 0.0, 0.0, 0.0];
            countdown = self.push_countdown(&mut rng);
        }

        let mut energy = 0.0;
        for _ in 0..substeps {
            for j in 0..NUM_JOINTS {
                let q = data.qpos[7 + j];
                let qd = data.qvel[6 + j];
                let torque = model.actuator_gain[j] * (data.ctrl[j] - q);
                let qdd = (torque - model.dof_damping[j] * qd) / model.body_mass[1 + j];
                data.qacc[6 + j] = qdd;
                data.qvel[6 + j] = qd + qdd * dt;
                data.qpos[7 + j] = q + data.qvel[6 + j] * dt;
                data.act[j] = torque;
                energy += (torque * qd).abs() * dt;
            }
            let relax = (dt / (0.1 * mass_scale)).min(1.0);
            for (k, v) in local_v.iter_mut().enumerate() {
                let target = action[k] * GAIT_SPEED[k] * traction;
                *v += (target - *v) * relax;
            }
            let yaw = 2.0 * data.qpos[6].atan2(data.qpos[3]) + local_v[2] * dt;
            let (sin, cos) = yaw.sin_cos();
            data.qpos[0] += (cos * local_v[0] - sin * local_v[1]) * dt;
            data.qpos[1] += (sin * local_v[0] + cos * local_v[1]) * dt;
            data.qpos[3] = (yaw / 2.0).cos();
            data.qpos[6] = (yaw / 2.0).sin();
            data.qvel[0] = cos * local_v[0] - sin * local_v[1];
            data.qvel[1] = sin * local_v[0] + cos * local_v[1];
            data.qvel[5] = local_v[2];
            data.time += dt;
        }
        data.qpos[2] = BASE_HEIGHT + self.terrain.height(data.qpos[0], data.qpos[1]);

        let command = info.get("command").cloned().unwrap_or_else(|| vec![0.0; 3]);
        let last_action = info.get("last_action").cloned().unwrap_or_else(|| vec![0.0; NUM_JOINTS]);
        let lin_err = (command[0] - local_v[0]).powi(2) + (command[1] - local_v[1]).powi(2);
        let ang_err = (command[2] - local_v[2]).powi(2);
        let action_rate: f64 = action.iter().zip(&last_action).map(|(a, b)| (a - b).powi(2)).sum();

        let done = (0..NUM_JOINTS)
            .any(|j| (data.qpos[7 + j] - DEFAULT_POSE[j]).abs() > MAX_JOINT_DEVIATION)
            || data.qpos.iter().chain(&data.qvel).any(|x| !x.is_finite());

        let mut metrics = BTreeMap::new();
        metrics.insert("reward/tracking_lin_vel".to_string(), (-lin_err / p.tracking_sigma).exp());
        metrics.insert("reward/tracking_ang_vel".to_string(), (-ang_err / p.tracking_sigma).exp());
        metrics.insert("reward/action_rate".to_string(), action_rate);
        metrics.insert("reward/energy".to_string(), energy);
        metrics.insert("reward/termination".to_string(), f64::from(u8::from(done)));

        let total = p.scale_lin_vel * metrics["reward/tracking_lin_vel"]
            + p.scale_ang_vel * metrics["reward/tracking_ang_vel"]
            + p.scale_action_rate * action_rate
            + p.scale_energy * energy
            + p.scale_termination * metrics["reward/termination"];
        let reward = (total * p.ctrl_dt).clamp(0.0, 10_000.0);

        info.insert("last_action".to_string(), action);
        info.insert("push_countdown".to_string(), vec![countdown]);
        info.insert("step".to_string(), vec![info_scalar(&info, "step") + 1.0]);

        let obs = self.observe(model, &data, &info, &mut rng);
        State { data, obs, reward, done, metrics, info, rng: rng.u64(..) }
    }

    fn model(&self) -> &Model {
        &self.model
    }

    fn config(&self) -> &ConfigTree {
        &self.config
    }

    fn dt(&self) -> f64 {
        self.params.ctrl_dt
    }

    fn action_size(&self) -> usize {
        NUM_JOINTS
    }

    fn observation_size(&self) -> BTreeMap<String, usize> {
        BTreeMap::from([
            ("state".to_string(), STATE_OBS),
            ("privileged_state".to_string(), PRIVILEGED_OBS),
        ])
    }
}
