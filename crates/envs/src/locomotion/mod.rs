//! Locomotion tasks.

pub mod joystick;
pub mod randomize;

use crate::env::Environment;
use crate::registry::{EnvironmentDescriptor, Suite};
use joystick::{Joystick, Terrain};
use std::fmt;

pub const SUITE_NAME: &str = "locomotion";

/// The shipped locomotion tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocomotionTask {
    G1JoystickFlatTerrain,
    G1JoystickRoughTerrain,
}

impl LocomotionTask {
    pub const ALL: [LocomotionTask; 2] =
        [LocomotionTask::G1JoystickFlatTerrain, LocomotionTask::G1JoystickRoughTerrain];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            LocomotionTask::G1JoystickFlatTerrain => "G1JoystickFlatTerrain",
            LocomotionTask::G1JoystickRoughTerrain => "G1JoystickRoughTerrain",
        }
    }

    #[must_use]
    pub const fn terrain(self) -> Terrain {
        match self {
            LocomotionTask::G1JoystickFlatTerrain => Terrain::Flat,
            LocomotionTask::G1JoystickRoughTerrain => Terrain::Rough,
        }
    }

    fn descriptor(self) -> EnvironmentDescriptor {
        let terrain = self.terrain();
        EnvironmentDescriptor::new(
            self.name(),
            move |config, overrides| {
                Ok(Box::new(Joystick::new(terrain, config, overrides)?) as Box<dyn Environment>)
            },
            joystick::default_config,
        )
        .with_randomizer(randomize::domain_randomize)
    }
}

impl fmt::Display for LocomotionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The locomotion suite with every [`LocomotionTask`] registered.
#[must_use]
pub fn suite() -> Suite {
    let mut suite = Suite::new(SUITE_NAME);
    for task in LocomotionTask::ALL {
        suite.register(task.descriptor());
    }
    suite
}
