//! Discrete-time, discrete-state Markov chains with branchable trajectories.
//!
//! A [`ChainDescription`] fixes the state count, the transition matrix, the
//! initial-state policy and the seed policy. [`Endless`] walks a description
//! lazily and can be forked at any point; a [`Collector`] records the walks
//! and reports the distinct ones across whole branch trees.
//!
//! # Pipeline
//!
//! ```text
//!  ┌───────────────────┐     ┌────────────────┐     ┌──────────────────┐
//!  │ ChainDescription  │────▶│    Endless     │────▶│    Collector     │
//!  │ (matrix, seed)    │     │ (take, branch) │     │ (deduplicate)    │
//!  └───────────────────┘     └────────────────┘     └──────────────────┘
//!           ▲                        │
//!           │                        ▼
//!   fit / read_json            Model (firing order)
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use markovtool_chain::{ChainDescription, Collector, Endless, InitialState};
//!
//! let chain = ChainDescription::random(5, Some(0))
//!     .unwrap()
//!     .with_initial_state(InitialState::Fixed(1))
//!     .unwrap();
//!
//! let collector = Collector::new();
//! let mut walk = Endless::new(chain);
//! collector.register(&mut walk);
//!
//! let head = walk.take(5).unwrap();
//! assert_eq!(head[0], 1);
//!
//! // A branch at the current state replays the parent's future.
//! let mut fork = walk.branch(walk.state()).unwrap();
//! assert_eq!(fork.take(5).unwrap(), walk.take(5).unwrap());
//! assert_eq!(collector.trajectories().len(), 1);
//! ```

pub mod collector;
pub mod config;
pub mod description;
pub mod endless;
pub mod error;
pub mod fit;
pub mod initial;
pub mod load;
pub mod matrix;
pub mod model;

pub use collector::{Collector, Trajectory};
pub use config::FitConfig;
pub use description::{ChainDescription, Overrides};
pub use endless::{Endless, InstanceId};
pub use error::ChainError;
pub use fit::estimate_transitions;
pub use initial::InitialState;
pub use load::{parse_json, parse_txt, read_json, read_txt, to_json, write_json};
pub use matrix::{ROW_SUM_TOLERANCE, TransitionMatrix};
pub use model::{Model, NodeId};
