//! Presence-aware overrides and the sparse merge.
//!
//! Every flag records whether the caller supplied it. Only supplied flags are
//! written, and nested `network_factory` flags are written leaf by leaf, so
//! overriding the policy layer sizes never resets the value observation key.

use crate::tree::ConfigTree;
use crate::value::ConfigValue;

/// Name of the nested sub-tree holding network hyperparameters.
pub const NETWORK_FACTORY: &str = "network_factory";

/// Keys the `network_factory` sub-tree accepts even when its defaults lack them.
pub const NETWORK_FACTORY_KEYS: &[&str] = &[
    "policy_hidden_layer_sizes",
    "value_hidden_layer_sizes",
    "policy_obs_key",
    "value_obs_key",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// A top-level field such as `learning_rate`.
    Root,
    /// A leaf of the `network_factory` sub-tree.
    NetworkFactory,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Flag {
    pub name: String,
    pub target: Target,
    pub value: ConfigValue,
    pub present: bool,
}

/// Flags collected from the command line, in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverrideSet {
    flags: Vec<Flag>,
}

impl OverrideSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, flag: Flag) -> &mut Self {
        match self.flags.iter_mut().find(|f| f.name == flag.name && f.target == flag.target) {
            Some(existing) => *existing = flag,
            None => self.flags.push(flag),
        }
        self
    }

    pub fn root(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ConfigValue>,
        present: bool,
    ) -> &mut Self {
        self.push(Flag { name: name.into(), target: Target::Root, value: value.into(), present })
    }

    pub fn network(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ConfigValue>,
        present: bool,
    ) -> &mut Self {
        self.push(Flag {
            name: name.into(),
            target: Target::NetworkFactory,
            value: value.into(),
            present,
        })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some_and(|f| f.present)
    }

    pub fn present(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter().filter(|f| f.present)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Which supplied flags were written and which had nowhere to go.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub applied: Vec<String>,
    pub dropped: Vec<String>,
}

impl ConfigTree {
    /// Writes every present flag of `overrides` into `self`.
    ///
    /// Root flags replace existing keys only. Nested flags are written into
    /// an existing `network_factory` sub-tree when the key is already there or
    /// is one of [`NETWORK_FACTORY_KEYS`]; without that sub-tree they are
    /// dropped rather than creating one.
    pub fn merge(&mut self, overrides: &OverrideSet) -> MergeReport {
        let mut report = MergeReport::default();
        for flag in overrides.present() {
            let written = match flag.target {
                Target::Root => write_existing(self, &flag.name, &flag.value),
                Target::NetworkFactory => match self.subtree_mut(NETWORK_FACTORY) {
                    Some(network) if network.contains_key(&flag.name) => {
                        write_existing(network, &flag.name, &flag.value)
                    }
                    Some(network) if NETWORK_FACTORY_KEYS.contains(&flag.name.as_str()) => {
                        network.insert(flag.name.clone(), flag.value.clone());
                        true
                    }
                    _ => false,
                },
            };
            let label = match flag.target {
                Target::Root => flag.name.clone(),
                Target::NetworkFactory => format!("{NETWORK_FACTORY}.{}", flag.name),
            };
            if written {
                tracing::debug!("override applied: {label} = {:?}", flag.value);
                report.applied.push(label);
            } else {
                tracing::debug!("override dropped, no such field: {label}");
                report.dropped.push(label);
            }
        }
        report
    }

    /// Non-mutating [`ConfigTree::merge`].
    #[must_use]
    pub fn merged(&self, overrides: &OverrideSet) -> (ConfigTree, MergeReport) {
        let mut out = self.clone();
        let report = out.merge(overrides);
        (out, report)
    }
}

fn write_existing(tree: &mut ConfigTree, key: &str, value: &ConfigValue) -> bool {
    match tree.get_mut(key) {
        Some(slot) => {
            *slot = value.clone().coerced_to(slot);
            true
        }
        None => false,
    }
}
