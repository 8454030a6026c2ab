//! Deterministic random generator derivation.
//!
//! Every source of randomness in markovtool is a [`StdRng`] built here from
//! an optional seed. With a seed, generators are pure functions of their
//! inputs; without one, they are drawn from OS entropy.
//!
//! # Streams
//!
//! ```text
//!  seed ──┬── derive(seed)                 matrix / initial-vector construction
//!         ├── derive_initial(seed)         first state of a trajectory
//!         └── derive_for_state(seed, s)    transition out of state `s`
//! ```
//!
//! Two trajectories that share a seed and a current state therefore share
//! their next draw, whatever path led them there.
//!
//! # Quick start
//!
//! ```
//! use markovtool_rng::derive_for_state;
//! use rand::Rng;
//!
//! let a: u64 = derive_for_state(Some(7), 3).random();
//! let b: u64 = derive_for_state(Some(7), 3).random();
//! assert_eq!(a, b);
//! ```
//!
//! [`StdRng`]: rand::rngs::StdRng

pub mod derive;

pub use derive::{INITIAL_KEY, derive, derive_for_state, derive_initial, mix_seed};
