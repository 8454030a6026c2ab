//! Deduplicating registry of trajectories across branch trees.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::description::ChainDescription;
use crate::endless::{Endless, InstanceId};

/// Records the states produced by registered [`Endless`] instances and
/// reports the distinct trajectories among them.
///
/// Instances hold a weak reference to the collector and push every state
/// they produce into it. Branches of a registered instance register
/// themselves, inheriting the parent's recorded history. Dropping the
/// collector never affects the instances.
///
/// Cloning a `Collector` yields another handle to the same registry.
///
/// # Example
///
/// ```
/// use markovtool_chain::{ChainDescription, Collector, Endless};
///
/// let chain = ChainDescription::random(3, Some(2)).unwrap();
/// let collector = Collector::new();
/// let mut walk = Endless::new(chain);
/// collector.register(&mut walk);
/// walk.skip(4).unwrap();
///
/// // Same seed, same state: the branch is not a new trajectory.
/// let mut fork = walk.branch(None).unwrap();
/// fork.skip(4).unwrap();
/// walk.skip(4).unwrap();
/// assert_eq!(collector.len(), 2);
/// assert_eq!(collector.trajectories().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Collector {
    ledger: Arc<Mutex<Ledger>>,
}

/// One distinct trajectory reported by [`Collector::trajectories`].
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    members: Vec<InstanceId>,
    description: Arc<ChainDescription>,
    states: Vec<usize>,
}

impl Trajectory {
    /// Returns the instances that produced this trajectory, in registration order.
    pub fn members(&self) -> &[InstanceId] {
        &self.members
    }

    /// Returns the description the trajectory was drawn from.
    pub fn description(&self) -> &Arc<ChainDescription> {
        &self.description
    }

    /// Returns the recorded states.
    pub fn states(&self) -> &[usize] {
        &self.states
    }
}

#[derive(Debug)]
pub(crate) struct Ledger {
    open: bool,
    members: Vec<Member>,
}

#[derive(Debug)]
struct Member {
    id: InstanceId,
    description: Arc<ChainDescription>,
    states: Vec<usize>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            open: true,
            members: Vec::new(),
        }
    }
}

impl Ledger {
    fn position(&self, id: InstanceId) -> Option<usize> {
        self.members.iter().position(|m| m.id == id)
    }

    /// Appends produced states to a member's history.
    pub(crate) fn record(&mut self, id: InstanceId, states: &[usize]) {
        if !self.open {
            return;
        }
        if let Some(i) = self.position(id) {
            self.members[i].states.extend_from_slice(states);
        }
    }

    /// Registers `child` as a branch of `parent`, copying the parent's history.
    ///
    /// An override replaces the state the parent currently sits in. Returns
    /// `false` when the parent is not a member or the ledger is closed.
    pub(crate) fn adopt(
        &mut self,
        parent: InstanceId,
        child: &Endless,
        state: Option<usize>,
    ) -> bool {
        if !self.open || self.position(child.id()).is_some() {
            return false;
        }
        let Some(i) = self.position(parent) else {
            return false;
        };
        let mut states = self.members[i].states.clone();
        if let Some(s) = state {
            match states.last_mut() {
                Some(last) => *last = s,
                None => states.push(s),
            }
        }
        self.members.push(Member {
            id: child.id(),
            description: Arc::clone(child.description()),
            states,
        });
        true
    }
}

/// Locks a ledger, recovering the data if a previous holder panicked.
pub(crate) fn lock(ledger: &Mutex<Ledger>) -> MutexGuard<'_, Ledger> {
    ledger.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Collector {
    /// Creates an empty, open collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `instance`.
    ///
    /// Recording begins at the current point: a started instance contributes
    /// its current state, then everything it produces afterwards. Returns
    /// `false` if the instance was already tracked or the collector is closed.
    pub fn register(&self, instance: &mut Endless) -> bool {
        let mut ledger = lock(&self.ledger);
        if !ledger.open || ledger.position(instance.id()).is_some() {
            return false;
        }
        ledger.members.push(Member {
            id: instance.id(),
            description: Arc::clone(instance.description()),
            states: instance.state().into_iter().collect(),
        });
        drop(ledger);
        instance.bind(Arc::downgrade(&self.ledger));
        debug!(instance = %instance.id(), "registered");
        true
    }

    /// Stops tracking `instance` and discards its history.
    ///
    /// Unbinding a non-member is a no-op. Returns `true` if the instance was
    /// tracked.
    pub fn unbind(&self, instance: &mut Endless) -> bool {
        instance.release(&Arc::downgrade(&self.ledger));
        let mut ledger = lock(&self.ledger);
        match ledger.position(instance.id()) {
            Some(i) => {
                ledger.members.remove(i);
                debug!(instance = %instance.id(), "unbound");
                true
            }
            None => false,
        }
    }

    /// Stops accepting new states and new members.
    pub fn close(&self) {
        lock(&self.ledger).open = false;
    }

    /// Resumes accepting states and members after [`close`](Self::close).
    pub fn reopen(&self) {
        lock(&self.ledger).open = true;
    }

    /// Returns `true` while the collector accepts entries.
    pub fn is_open(&self) -> bool {
        lock(&self.ledger).open
    }

    /// Returns `true` if the instance is tracked.
    pub fn contains(&self, id: InstanceId) -> bool {
        lock(&self.ledger).position(id).is_some()
    }

    /// Returns the number of tracked instances.
    pub fn len(&self) -> usize {
        lock(&self.ledger).members.len()
    }

    /// Returns `true` if no instance is tracked.
    pub fn is_empty(&self) -> bool {
        lock(&self.ledger).members.is_empty()
    }

    /// Returns the recorded history of a tracked instance.
    pub fn playback(&self, id: InstanceId) -> Option<Vec<usize>> {
        let ledger = lock(&self.ledger);
        ledger
            .position(id)
            .map(|i| ledger.members[i].states.clone())
    }

    /// Returns the state recorded at `step` of a tracked instance's history.
    pub fn retrieve(&self, id: InstanceId, step: usize) -> Option<usize> {
        let ledger = lock(&self.ledger);
        let i = ledger.position(id)?;
        ledger.members[i].states.get(step).copied()
    }

    /// Returns the distinct trajectories, in order of first registration.
    ///
    /// Members are grouped by description (by identity, not by value). Within
    /// a group, a member whose history is a prefix of a trajectory's history,
    /// or extends it, joins that trajectory; a branch that lags behind its
    /// parent is therefore not counted twice. A trajectory reports the
    /// longest history among its members.
    pub fn trajectories(&self) -> Vec<Trajectory> {
        let ledger = lock(&self.ledger);
        let mut out: Vec<Trajectory> = Vec::new();
        let mut groups: HashMap<*const ChainDescription, Vec<usize>> = HashMap::new();
        for member in &ledger.members {
            let group = groups
                .entry(Arc::as_ptr(&member.description))
                .or_default();
            let joined = group
                .iter()
                .copied()
                .find(|&t| agrees(&out[t].states, &member.states));
            match joined {
                Some(t) => {
                    let trajectory = &mut out[t];
                    trajectory.members.push(member.id);
                    if member.states.len() > trajectory.states.len() {
                        trajectory.states.clone_from(&member.states);
                    }
                }
                None => {
                    group.push(out.len());
                    out.push(Trajectory {
                        members: vec![member.id],
                        description: Arc::clone(&member.description),
                        states: member.states.clone(),
                    });
                }
            }
        }
        out
    }
}

/// Returns `true` if one history is a prefix of the other.
fn agrees(a: &[usize], b: &[usize]) -> bool {
    a.iter().zip(b).all(|(x, y)| x == y)
}
