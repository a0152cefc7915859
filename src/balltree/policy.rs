//! Construction policies for building ball trees.

use std::fmt;
use std::str::FromStr;

use crate::error::KdSearchError;

/// The algorithm used to build a [`StaticBallTree`][crate::balltree::StaticBallTree].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// Top-down, splitting each range at the coordinate median along the selected axis.
    Kd,
    /// Top-down, choosing the split that minimizes the summed volume of both halves.
    #[default]
    TopDown,
    /// Repeated dynamic insertion with the greedy cost heuristic.
    RoughInsertion,
    /// Repeated dynamic insertion with the best-first cost heuristic.
    FineInsertion,
    /// Dynamic insertion followed by agglomerative bottom-up refinement.
    BottomUp,
}

impl Algorithm {
    /// All algorithms, in code order.
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Kd,
        Algorithm::TopDown,
        Algorithm::RoughInsertion,
        Algorithm::FineInsertion,
        Algorithm::BottomUp,
    ];

    /// Returns `true` if this algorithm builds a dynamic tree and flattens it.
    pub fn is_insertion_based(&self) -> bool {
        matches!(
            self,
            Algorithm::RoughInsertion | Algorithm::FineInsertion | Algorithm::BottomUp
        )
    }

    fn name(&self) -> &'static str {
        match self {
            Algorithm::Kd => "kd",
            Algorithm::TopDown => "top_down",
            Algorithm::RoughInsertion => "rough_insertion",
            Algorithm::FineInsertion => "fine_insertion",
            Algorithm::BottomUp => "bottom_up",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = KdSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == normalized)
            .ok_or_else(|| KdSearchError::InvalidPolicy(format!("Unknown algorithm {s:?}.")))
    }
}

impl TryFrom<u8> for Algorithm {
    type Error = KdSearchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Algorithm::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| KdSearchError::InvalidPolicy(format!("Unknown algorithm code {value}.")))
    }
}

/// How the top-down algorithms choose the axis to split along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AxisSelection {
    /// The axis with the largest coordinate extent.
    #[default]
    MaxExtreme,
    /// The axis with the largest coordinate variance.
    MaxVariance,
    /// Round-robin by depth.
    Ordered,
    /// A uniformly random axis, drawn from the policy's seeded RNG.
    Random,
}

impl AxisSelection {
    /// All axis rules, in code order.
    pub const ALL: [AxisSelection; 4] = [
        AxisSelection::MaxExtreme,
        AxisSelection::MaxVariance,
        AxisSelection::Ordered,
        AxisSelection::Random,
    ];

    fn name(&self) -> &'static str {
        match self {
            AxisSelection::MaxExtreme => "max_extreme",
            AxisSelection::MaxVariance => "max_variance",
            AxisSelection::Ordered => "ordered",
            AxisSelection::Random => "random",
        }
    }
}

impl fmt::Display for AxisSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AxisSelection {
    type Err = KdSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        AxisSelection::ALL
            .into_iter()
            .find(|rule| rule.name() == normalized)
            .ok_or_else(|| KdSearchError::InvalidPolicy(format!("Unknown axis selection {s:?}.")))
    }
}

impl TryFrom<u8> for AxisSelection {
    type Error = KdSearchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        AxisSelection::ALL.get(value as usize).copied().ok_or_else(|| {
            KdSearchError::InvalidPolicy(format!("Unknown axis selection code {value}."))
        })
    }
}

/// The strength of the cost heuristic used to place new items in a
/// [`DynamicBallTree`][crate::balltree::DynamicBallTree].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InsertFavor {
    /// Greedy descent, following the cheaper child only.
    #[default]
    Rough,
    /// Best-first search over every subtree whose lower bound beats the best cost so far.
    Fine,
}

/// Everything needed to choose how a static tree gets built.
///
/// ```
/// use kdsearch::balltree::{Algorithm, AxisSelection, ConstructionPolicy};
///
/// let policy = ConstructionPolicy::new(Algorithm::Kd)
///     .with_axis_selection(AxisSelection::Random)
///     .with_seed(42);
/// assert_eq!(policy.algorithm(), Algorithm::Kd);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConstructionPolicy {
    algorithm: Algorithm,
    axis_selection: AxisSelection,
    seed: u64,
}

impl ConstructionPolicy {
    /// A policy for `algorithm` with the default axis rule and seed.
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            ..Default::default()
        }
    }

    /// Parse a policy from an algorithm name and an axis-selection name.
    pub fn try_from_names(algorithm: &str, axis_selection: &str) -> Result<Self, KdSearchError> {
        Ok(Self::new(algorithm.parse()?).with_axis_selection(axis_selection.parse()?))
    }

    /// Replace the algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Replace the axis-selection rule.
    pub fn with_axis_selection(mut self, axis_selection: AxisSelection) -> Self {
        self.axis_selection = axis_selection;
        self
    }

    /// Replace the seed of the random axis rule.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The construction algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The axis-selection rule of the top-down algorithms.
    pub fn axis_selection(&self) -> AxisSelection {
        self.axis_selection
    }

    /// The seed of the random axis rule.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The insertion heuristic used by the insertion-based algorithms.
    pub(crate) fn insert_favor(&self) -> InsertFavor {
        match self.algorithm {
            Algorithm::FineInsertion => InsertFavor::Fine,
            _ => InsertFavor::Rough,
        }
    }
}
