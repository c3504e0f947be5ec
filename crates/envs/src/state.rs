use std::collections::BTreeMap;

/// Observations keyed by name, e.g. `state` and `privileged_state`.
pub type Observation = BTreeMap<String, Vec<f32>>;

/// Full simulation data for one environment instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimData {
    pub qpos: Vec<f64>,
    pub qvel: Vec<f64>,
    pub qacc: Vec<f64>,
    pub time: f64,
    pub ctrl: Vec<f64>,
    /// Actuator activation; grows with the scene, never rendered.
    pub act: Vec<f64>,
    pub mocap_pos: Vec<[f64; 3]>,
    pub mocap_quat: Vec<[f64; 4]>,
    /// Per-body external wrench `[fx, fy, fz, tx, ty, tz]`.
    pub xfrc_applied: Vec<[f64; 6]>,
}

impl SimData {
    /// Copies out the fields a trajectory keeps, dropping everything else.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            qpos: self.qpos.clone(),
            qvel: self.qvel.clone(),
            time: self.time,
            ctrl: self.ctrl.clone(),
            mocap_pos: self.mocap_pos.clone(),
            mocap_quat: self.mocap_quat.clone(),
            xfrc_applied: self.xfrc_applied.clone(),
        }
    }
}

/// The fixed per-step schema recorded for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub qpos: Vec<f64>,
    pub qvel: Vec<f64>,
    pub time: f64,
    pub ctrl: Vec<f64>,
    pub mocap_pos: Vec<[f64; 3]>,
    pub mocap_quat: Vec<[f64; 4]>,
    pub xfrc_applied: Vec<[f64; 6]>,
}

impl Snapshot {
    /// Field names in schema order.
    pub const FIELDS: [&'static str; 7] =
        ["qpos", "qvel", "time", "ctrl", "mocap_pos", "mocap_quat", "xfrc_applied"];
}

/// Environment state threaded through `reset`/`step`.
#[derive(Clone, Debug, Default)]
pub struct State {
    pub data: SimData,
    pub obs: Observation,
    pub reward: f64,
    pub done: bool,
    /// Per-step reward terms and diagnostics.
    pub metrics: BTreeMap<String, f64>,
    /// Task bookkeeping (command, counters) private to the environment.
    pub info: BTreeMap<String, Vec<f64>>,
    /// Per-instance generator state so stepping stays a pure function.
    pub rng: u64,
}
