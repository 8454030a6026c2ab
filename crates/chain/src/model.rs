//! Lockstep advancement of several trajectories with explicit firing order.

use tracing::debug;

use crate::endless::Endless;
use crate::error::ChainError;

/// Handle to a node in a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the node's position in firing order.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Node {
    instance: Endless,
    pattern: Vec<bool>,
    cursor: usize,
    input: Option<NodeId>,
}

impl Node {
    /// Reads the next pattern entry and moves the cursor on.
    fn fires(&mut self) -> bool {
        let fire = self.pattern[self.cursor];
        self.cursor = (self.cursor + 1) % self.pattern.len();
        fire
    }
}

/// A set of trajectories advanced together, one tick at a time.
///
/// Nodes fire in the order they were added. Each node follows a cyclic
/// pattern: on tick `t` it produces a state if its pattern's next entry is
/// `true`. A dependent node draws from the row of its input node's current
/// state instead of its own, so an input must be added before the nodes
/// that read it, and sees its own state of the same tick already updated.
///
/// Stopped nodes (see [`Endless::until`]) no longer fire, and a dependent
/// node stops as soon as its input has stopped.
///
/// # Example
///
/// ```
/// use markovtool_chain::{ChainDescription, Endless, InitialState, Model};
///
/// let leader = ChainDescription::from_array(&[[0.0, 1.0], [1.0, 0.0]])
///     .unwrap()
///     .with_initial_state(InitialState::Fixed(0))
///     .unwrap();
/// let echo = ChainDescription::from_array(&[[1.0, 0.0], [0.0, 1.0]]).unwrap();
///
/// let mut model = Model::new();
/// let a = model.add(Endless::new(leader), vec![true]).unwrap();
/// let b = model.add_dependent(Endless::new(echo), vec![true], a).unwrap();
/// model.forward(4).unwrap();
/// assert_eq!(model.instance(a).unwrap().state(), model.instance(b).unwrap().state());
/// assert_eq!(model.tick(), 4);
/// ```
#[derive(Debug, Default)]
pub struct Model {
    nodes: Vec<Node>,
    tick: u64,
}

impl Model {
    /// Creates an empty model at tick zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node that advances from its own state.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::EmptyPattern`] for an empty firing pattern.
    pub fn add(&mut self, instance: Endless, pattern: Vec<bool>) -> Result<NodeId, ChainError> {
        self.push(instance, pattern, None)
    }

    /// Adds a node that advances from `input`'s current state.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::EmptyPattern`] for an empty firing pattern,
    /// [`ChainError::InvalidConfig`] if `input` is not a node of this model,
    /// and [`ChainError::DimensionMismatch`] if the two chains differ in size.
    pub fn add_dependent(
        &mut self,
        instance: Endless,
        pattern: Vec<bool>,
        input: NodeId,
    ) -> Result<NodeId, ChainError> {
        let Some(source) = self.nodes.get(input.0) else {
            return Err(ChainError::InvalidConfig {
                reason: format!("input node {} is not part of this model", input.0),
            });
        };
        let expected = source.instance.description().dimension();
        let got = instance.description().dimension();
        if expected != got {
            return Err(ChainError::DimensionMismatch { expected, got });
        }
        self.push(instance, pattern, Some(input))
    }

    fn push(
        &mut self,
        instance: Endless,
        pattern: Vec<bool>,
        input: Option<NodeId>,
    ) -> Result<NodeId, ChainError> {
        if pattern.is_empty() {
            return Err(ChainError::EmptyPattern);
        }
        let id = NodeId(self.nodes.len());
        debug!(node = id.0, instance = %instance.id(), ?input, "node added");
        self.nodes.push(Node {
            instance,
            pattern,
            cursor: 0,
            input,
        });
        Ok(id)
    }

    /// Advances the model by `ticks` ticks.
    ///
    /// Returns, for every tick, the state each node produced, or `None` for
    /// nodes that did not fire or have stopped. On error the failing tick is
    /// left partially applied: nodes before the failing one have already
    /// fired.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnstartedInput`] when a dependent node fires
    /// before its input has produced any state, or the instance's own error.
    #[tracing::instrument(skip(self), fields(nodes = self.nodes.len(), tick = self.tick))]
    pub fn forward(&mut self, ticks: u64) -> Result<Vec<Vec<Option<usize>>>, ChainError> {
        let mut out = Vec::new();
        for _ in 0..ticks {
            let mut fired = Vec::with_capacity(self.nodes.len());
            for i in 0..self.nodes.len() {
                let fire = self.nodes[i].fires();
                if !fire || self.nodes[i].instance.has_stopped() {
                    fired.push(None);
                    continue;
                }
                let state = match self.nodes[i].input {
                    Some(input) => {
                        let source = &self.nodes[input.0].instance;
                        if source.has_stopped() {
                            self.nodes[i].instance.halt();
                            fired.push(None);
                            continue;
                        }
                        let Some(from) = source.state() else {
                            return Err(ChainError::UnstartedInput { node: i });
                        };
                        self.nodes[i].instance.step_from(from)?
                    }
                    None => self.nodes[i].instance.take(1)?.first().copied(),
                };
                fired.push(state);
            }
            self.tick += 1;
            out.push(fired);
        }
        Ok(out)
    }

    /// Returns the instance behind `node`.
    pub fn instance(&self, node: NodeId) -> Option<&Endless> {
        self.nodes.get(node.0).map(|n| &n.instance)
    }

    /// Returns the instance behind `node` mutably, e.g. to branch or register it.
    pub fn instance_mut(&mut self, node: NodeId) -> Option<&mut Endless> {
        self.nodes.get_mut(node.0).map(|n| &mut n.instance)
    }

    /// Returns `true` once every node has stopped.
    ///
    /// An empty model counts as finished.
    pub fn is_finished(&self) -> bool {
        self.nodes.iter().all(|n| n.instance.has_stopped())
    }

    /// Returns the number of completed ticks.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the model has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
