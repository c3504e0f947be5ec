use std::sync::Arc;

/// Physical parameters of a simulated scene.
///
/// These are the quantities a domain randomizer perturbs. Everything else
/// about the scene (topology, geometry) is fixed by the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    /// Physics integration step in seconds.
    pub timestep: f64,
    pub geom_friction: Vec<f64>,
    /// Index 0 is the floating base (torso).
    pub body_mass: Vec<f64>,
    pub actuator_gain: Vec<f64>,
    pub dof_damping: Vec<f64>,
    pub nmocap: usize,
}

impl Model {
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.body_mass.iter().sum()
    }

    /// Draws a model uniformly inside the per-field envelope `[lo, hi]`.
    ///
    /// Fields are paired positionally; `lo` supplies everything that is not
    /// randomized (timestep, mocap count).
    #[must_use]
    pub fn sample_between(lo: &Model, hi: &Model, rng: &mut fastrand::Rng) -> Model {
        let mut draw = |a: &[f64], b: &[f64]| -> Vec<f64> {
            a.iter().zip(b).map(|(l, h)| l + (h - l) * rng.f64()).collect()
        };
        Model {
            timestep: lo.timestep,
            geom_friction: draw(&lo.geom_friction, &hi.geom_friction),
            body_mass: draw(&lo.body_mass, &hi.body_mass),
            actuator_gain: draw(&lo.actuator_gain, &hi.actuator_gain),
            dof_damping: draw(&lo.dof_damping, &hi.dof_damping),
            nmocap: lo.nmocap,
        }
    }

    /// True when every randomizable field of `self` lies within `[lo, hi]`.
    #[must_use]
    pub fn within(&self, lo: &Model, hi: &Model) -> bool {
        let inside = |v: &[f64], a: &[f64], b: &[f64]| {
            v.len() == a.len()
                && v.iter().zip(a.iter().zip(b)).all(|(x, (l, h))| *l <= *x && *x <= *h)
        };
        inside(&self.geom_friction, &lo.geom_friction, &hi.geom_friction)
            && inside(&self.body_mass, &lo.body_mass, &hi.body_mass)
            && inside(&self.actuator_gain, &lo.actuator_gain, &hi.actuator_gain)
            && inside(&self.dof_damping, &lo.dof_damping, &hi.dof_damping)
    }
}

/// `(model, seed) -> (lo, hi)`: the envelope a trainer samples per-episode
/// models from.
pub type DomainRandomizer = Arc<dyn Fn(&Model, u64) -> (Model, Model) + Send + Sync>;
