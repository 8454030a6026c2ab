//! Lazily advancing, branchable trajectories.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use markovtool_rng::{derive, derive_for_state, derive_initial};
use rand::rngs::StdRng;
use tracing::{debug, trace};

use crate::collector::{Ledger, lock};
use crate::description::ChainDescription;
use crate::error::ChainError;
use crate::matrix::TransitionMatrix;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(0);

/// Upper bound on states buffered by [`Endless::skip`] before they are
/// handed to collectors.
const EMIT_CHUNK: usize = 1024;

/// Process-unique identity of an [`Endless`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an instance's random draws come from.
#[derive(Debug, Clone)]
enum Randomness {
    /// Every draw uses a generator derived from the seed and the state being
    /// left, so equal states give equal futures.
    Seeded(u64),
    /// A private entropy-seeded stream.
    Stream(StdRng),
}

impl Randomness {
    fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::Seeded(s),
            None => Self::Stream(derive(None)),
        }
    }

    /// Runs `f` with the generator for leaving `from` (`None` before the first state).
    fn draw<T>(&mut self, from: Option<usize>, f: impl FnOnce(&mut StdRng) -> T) -> T {
        match self {
            Self::Seeded(seed) => {
                let mut rng = match from {
                    Some(state) => derive_for_state(Some(*seed), state),
                    None => derive_initial(Some(*seed)),
                };
                f(&mut rng)
            }
            Self::Stream(rng) => f(rng),
        }
    }
}

/// Condition checked before every step of a finite trajectory.
#[derive(Clone)]
struct StopPredicate(Arc<dyn Fn(&Endless) -> bool + Send + Sync>);

impl fmt::Debug for StopPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StopPredicate(..)")
    }
}

/// A trajectory through a [`ChainDescription`], endless unless given a stop
/// condition with [`until`](Self::until).
///
/// States are produced on demand: nothing is sampled until [`take`](Self::take)
/// or [`skip`](Self::skip) is called, and consecutive calls continue where the
/// previous one stopped.
///
/// With a seeded description, the draw that leaves state `s` depends only
/// on `(seed, s)`. Two instances sitting in the same state therefore
/// produce the same continuation, however they got there. Without a seed
/// each instance owns an independent entropy-seeded stream.
///
/// # Example
///
/// ```
/// use markovtool_chain::{ChainDescription, Endless, InitialState};
///
/// let chain = ChainDescription::random(4, Some(0))
///     .unwrap()
///     .with_initial_state(InitialState::Fixed(1))
///     .unwrap();
/// let mut walk = Endless::new(chain);
/// let head = walk.take(5).unwrap();
/// assert_eq!(head[0], 1);
///
/// let mut fork = walk.branch(None).unwrap();
/// assert_eq!(fork.take(10).unwrap(), walk.take(10).unwrap());
/// ```
#[derive(Debug)]
pub struct Endless {
    id: InstanceId,
    description: Arc<ChainDescription>,
    randomness: Randomness,
    state: Option<usize>,
    step_count: u64,
    stop: Option<StopPredicate>,
    stopped: bool,
    collectors: Vec<Weak<Mutex<Ledger>>>,
}

impl Endless {
    /// Binds a new, unstarted trajectory to `description`.
    ///
    /// The seed policy is captured now; later changes to a description
    /// clone do not affect this instance.
    pub fn new(description: impl Into<Arc<ChainDescription>>) -> Self {
        let description = description.into();
        let randomness = Randomness::new(description.my_seed());
        Self {
            id: InstanceId::next(),
            description,
            randomness,
            state: None,
            step_count: 0,
            stop: None,
            stopped: false,
            collectors: Vec::new(),
        }
    }

    /// Makes the trajectory finite: once `predicate` holds, no further
    /// states are produced.
    ///
    /// The predicate is checked before each step, starting once the
    /// instance occupies a state, so the first state is always produced.
    /// After it has held once the instance stays stopped.
    ///
    /// # Example
    ///
    /// ```
    /// use markovtool_chain::{ChainDescription, Endless, InitialState};
    ///
    /// let chain = ChainDescription::from_array(&[[0.0, 1.0], [1.0, 0.0]])
    ///     .unwrap()
    ///     .with_initial_state(InitialState::Fixed(0))
    ///     .unwrap();
    /// let mut walk = Endless::new(chain).until(|e| e.step_count() >= 3);
    /// assert_eq!(walk.take(10).unwrap(), vec![0, 1, 0]);
    /// assert!(walk.has_stopped());
    /// ```
    pub fn until(mut self, predicate: impl Fn(&Endless) -> bool + Send + Sync + 'static) -> Self {
        self.stop = Some(StopPredicate(Arc::new(predicate)));
        self
    }

    /// Returns `true` once the stop condition has ended the trajectory.
    pub fn has_stopped(&self) -> bool {
        self.stopped
    }

    /// Returns this instance's identity.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Returns the shared description.
    pub fn description(&self) -> &Arc<ChainDescription> {
        &self.description
    }

    /// Returns the current state, or `None` before the first step.
    pub fn state(&self) -> Option<usize> {
        self.state
    }

    /// Returns the number of states produced by this instance.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Returns `true` once the instance occupies a state.
    pub fn is_started(&self) -> bool {
        self.state.is_some()
    }

    /// Produces the next `n` states.
    ///
    /// The first state of an unstarted instance comes from the description's
    /// initial-state policy; every later one from the current state's row.
    /// A finite instance returns fewer than `n` states once it stops.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UninitializedChain`] if the description has no
    /// valid matrix. Nothing is produced in that case.
    pub fn take(&mut self, n: usize) -> Result<Vec<usize>, ChainError> {
        let description = Arc::clone(&self.description);
        let matrix = description.ready_matrix()?;

        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            match self.advance(&description, matrix) {
                Some(next) => out.push(next),
                None => break,
            }
        }

        trace!(instance = %self.id, n = out.len(), step_count = self.step_count, "produced states");
        self.emit(&out);
        Ok(out)
    }

    /// Advances `n` steps, discarding the produced states.
    ///
    /// Bound collectors still record the skipped states, delivered in
    /// bounded chunks. Nothing is buffered when no collector is bound.
    pub fn skip(&mut self, n: usize) -> Result<(), ChainError> {
        let description = Arc::clone(&self.description);
        let matrix = description.ready_matrix()?;

        let mut pending = Vec::new();
        for _ in 0..n {
            let Some(next) = self.advance(&description, matrix) else {
                break;
            };
            if !self.collectors.is_empty() {
                pending.push(next);
                if pending.len() == EMIT_CHUNK {
                    self.emit(&pending);
                    pending.clear();
                }
            }
        }
        self.emit(&pending);

        trace!(instance = %self.id, n, step_count = self.step_count, "skipped states");
        Ok(())
    }

    /// Produces one state, or `None` if the stop condition holds.
    fn advance(
        &mut self,
        description: &ChainDescription,
        matrix: &TransitionMatrix,
    ) -> Option<usize> {
        if self.check_stop() {
            return None;
        }
        let from = self.state;
        let next = self.randomness.draw(from, |rng| match from {
            Some(current) => matrix.sample(current, rng),
            None => description
                .initial_state()
                .sample(description.dimension(), rng),
        });
        self.state = Some(next);
        self.step_count += 1;
        Some(next)
    }

    fn check_stop(&mut self) -> bool {
        if !self.stopped && self.state.is_some() {
            if let Some(stop) = self.stop.clone() {
                if (stop.0)(&*self) {
                    self.halt();
                }
            }
        }
        self.stopped
    }

    /// Marks the instance as stopped.
    pub(crate) fn halt(&mut self) {
        if !self.stopped {
            self.stopped = true;
            debug!(instance = %self.id, step_count = self.step_count, "stopped");
        }
    }

    /// Produces one state from the row of `input` instead of the current state.
    ///
    /// Used by [`Model`](crate::Model) for nodes driven by another instance.
    /// Returns `None` if the stop condition holds.
    pub(crate) fn step_from(&mut self, input: usize) -> Result<Option<usize>, ChainError> {
        let description = Arc::clone(&self.description);
        let matrix = description.ready_matrix()?;
        if input >= description.dimension() {
            return Err(ChainError::InvalidState {
                state: input,
                dimension: description.dimension(),
            });
        }
        if self.check_stop() {
            return Ok(None);
        }
        let next = self
            .randomness
            .draw(Some(input), |rng| matrix.sample(input, rng));
        self.state = Some(next);
        self.step_count += 1;
        self.emit(&[next]);
        Ok(Some(next))
    }

    /// Forks an independent continuation of this trajectory.
    ///
    /// The branch shares the description, starts with a step count of zero
    /// and sits in `state` if given, otherwise in this instance's current
    /// state. The parent is not modified. Collectors tracking the parent
    /// adopt the branch. A branch keeps the parent's stop condition but
    /// starts out running; the condition is re-checked before its first step.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidState`] if `state` is out of range.
    pub fn branch(&self, state: Option<usize>) -> Result<Self, ChainError> {
        self.fork(Arc::clone(&self.description), state)
    }

    /// Forks a continuation that follows a different description from here on.
    ///
    /// The new description's seed policy applies to the branch.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::DimensionMismatch`] if the dimensions differ and
    /// [`ChainError::InvalidState`] if `state` is out of range.
    pub fn branch_variant(
        &self,
        description: ChainDescription,
        state: Option<usize>,
    ) -> Result<Self, ChainError> {
        if description.dimension() != self.description.dimension() {
            return Err(ChainError::DimensionMismatch {
                expected: self.description.dimension(),
                got: description.dimension(),
            });
        }
        self.fork(Arc::new(description), state)
    }

    fn fork(
        &self,
        description: Arc<ChainDescription>,
        state: Option<usize>,
    ) -> Result<Self, ChainError> {
        if let Some(s) = state {
            let dimension = description.dimension();
            if s >= dimension {
                return Err(ChainError::InvalidState {
                    state: s,
                    dimension,
                });
            }
        }

        let mut child = Self {
            id: InstanceId::next(),
            randomness: Randomness::new(description.my_seed()),
            description,
            state: state.or(self.state),
            step_count: 0,
            stop: self.stop.clone(),
            stopped: false,
            collectors: Vec::new(),
        };

        for weak in &self.collectors {
            if let Some(ledger) = weak.upgrade() {
                if lock(&ledger).adopt(self.id, &child, state) {
                    child.collectors.push(Weak::clone(weak));
                }
            }
        }

        debug!(
            parent = %self.id,
            child = %child.id,
            state = ?child.state,
            collectors = child.collectors.len(),
            "branched"
        );
        Ok(child)
    }

    pub(crate) fn bind(&mut self, ledger: Weak<Mutex<Ledger>>) {
        if !self.collectors.iter().any(|w| w.ptr_eq(&ledger)) {
            self.collectors.push(ledger);
        }
    }

    pub(crate) fn release(&mut self, ledger: &Weak<Mutex<Ledger>>) {
        self.collectors.retain(|w| !w.ptr_eq(ledger));
    }

    fn emit(&mut self, states: &[usize]) {
        if states.is_empty() {
            return;
        }
        let id = self.id;
        self.collectors.retain(|weak| match weak.upgrade() {
            Some(ledger) => {
                lock(&ledger).record(id, states);
                true
            }
            None => false,
        });
    }
}
