/// Visual flags for a rendered scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneOptions {
    /// Draw bodies semi-transparent.
    pub transparent: bool,
    /// Draw arrows for externally applied perturbation forces.
    pub perturbation_forces: bool,
    /// Draw contact force markers.
    pub contact_forces: bool,
}

/// Output frame size plus scene flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub scene: SceneOptions,
}

impl Default for RenderSettings {
    /// 640x480 with every overlay disabled.
    fn default() -> Self {
        Self { width: 640, height: 480, scene: SceneOptions::default() }
    }
}

/// Kinematic layout used to turn `qpos` into line segments.
///
/// `qpos[0..3]` is the base position and `qpos[3..7]` its `w, x, y, z`
/// orientation. Each chain hangs from the base at `anchor` (base frame) and
/// bends by the hinge angles at the listed `qpos` indices.
#[derive(Clone, Debug, PartialEq)]
pub struct Skeleton {
    pub chains: Vec<Chain>,
    pub segment_length: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    pub anchor: [f32; 3],
    pub joints: Vec<usize>,
}

impl Skeleton {
    /// Two legs of `joints_per_leg` hinges each, left leg first.
    #[must_use]
    pub fn biped(joints_per_leg: usize) -> Self {
        let first = 7;
        let leg = |offset: usize, y: f32| Chain {
            anchor: [0.0, y, -0.1],
            joints: (first + offset..first + offset + joints_per_leg).collect(),
        };
        Self {
            chains: vec![leg(0, 0.12), leg(joints_per_leg, -0.12)],
            segment_length: 0.125,
        }
    }

    /// Smallest `qpos` length this layout can read.
    #[must_use]
    pub fn required_qpos(&self) -> usize {
        self.chains
            .iter()
            .flat_map(|c| c.joints.iter())
            .map(|&j| j + 1)
            .max()
            .unwrap_or(0)
            .max(7)
    }
}
