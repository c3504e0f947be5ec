use crate::model::Model;

const FRICTION_RANGE: [f64; 2] = [0.4, 1.0];
const FRICTION_SPREAD: f64 = 0.1;
const MASS_SCALE_RANGE: [f64; 2] = [0.9, 1.1];
const TORSO_MASS_DELTA: [f64; 2] = [-1.0, 1.0];
const GAIN_SCALE_RANGE: [f64; 2] = [0.9, 1.1];
const DAMPING_SCALE_RANGE: [f64; 2] = [0.5, 1.5];

/// Randomization envelope for the G1 joystick tasks.
///
/// `seed` places a friction band inside `[0.4, 1.0]`; link masses, torso
/// payload, actuator gains and joint damping span fixed relative ranges around
/// the nominal model.
#[must_use]
pub fn domain_randomize(model: &Model, seed: u64) -> (Model, Model) {
    let mut rng = fastrand::Rng::with_seed(seed);
    let half = FRICTION_SPREAD / 2.0;
    let center = FRICTION_RANGE[0] + half + (FRICTION_RANGE[1] - FRICTION_RANGE[0] - FRICTION_SPREAD) * rng.f64();

    let mut lo = model.clone();
    let mut hi = model.clone();

    lo.geom_friction = vec![center - half; model.geom_friction.len()];
    hi.geom_friction = vec![center + half; model.geom_friction.len()];

    for (i, mass) in model.body_mass.iter().enumerate() {
        let (mut l, mut h) = (mass * MASS_SCALE_RANGE[0], mass * MASS_SCALE_RANGE[1]);
        if i == 0 {
            l += TORSO_MASS_DELTA[0];
            h += TORSO_MASS_DELTA[1];
        }
        lo.body_mass[i] = l;
        hi.body_mass[i] = h;
    }

    lo.actuator_gain = model.actuator_gain.iter().map(|g| g * GAIN_SCALE_RANGE[0]).collect();
    hi.actuator_gain = model.actuator_gain.iter().map(|g| g * GAIN_SCALE_RANGE[1]).collect();
    lo.dof_damping = model.dof_damping.iter().map(|d| d * DAMPING_SCALE_RANGE[0]).collect();
    hi.dof_damping = model.dof_damping.iter().map(|d| d * DAMPING_SCALE_RANGE[1]).collect();

    (lo, hi)
}
