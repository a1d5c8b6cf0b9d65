use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::mem;

use crate::graph::node::{BlockCtx, Inputs, SignalNode};
use crate::param::{expansion_width, ControlSpec, Param};
use crate::stream::Stream;

use super::error::GraphError;

/*
Graph Execution
===============

The graph is an insertion-ordered arena of boxed nodes. Each slot holds the
node itself and its bank of output streams; consumers reference producers by
NodeId, never by pointer, so a node can feed any number of downstream nodes
while the graph retains sole ownership for the whole session.

Per tick, nodes run in a stable topological order: every node after all of
its inputs, insertion order among independents. The order is recomputed only
when membership or parameter wiring changes; an unchanged acyclic topology
reuses the cached walk, so a steady-state tick does no ordering work and no
allocation.

Cycles are rejected when the offending edge is introduced, not at tick time.
A node can only reference ids that already exist when it is added, so adding
can never close a loop; `set_param` can, and validates reachability before
accepting a node-valued reassignment. Feedback has to live inside a node as
state carried across blocks (see `SineLoop`), never as a graph edge.
*/

/// Handle to a node registered in a [`Graph`]. Ids are never reused within
/// a session, so a stale handle fails lookups instead of aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn for_tests(index: usize) -> Self {
        NodeId(index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}", self.0)
    }
}

/// Owns every node of a session and drives their per-block recomputation.
pub struct Graph {
    nodes: Vec<Option<Box<dyn SignalNode>>>,
    banks: Vec<Vec<Stream>>,
    deps: Vec<Vec<NodeId>>,
    order: Vec<usize>,
    dirty: bool,
    block_size: usize,
    sample_rate: f32,
}

impl Graph {
    pub(crate) fn new(block_size: usize, sample_rate: f32) -> Self {
        Self {
            nodes: Vec::new(),
            banks: Vec::new(),
            deps: Vec::new(),
            order: Vec::new(),
            dirty: false,
            block_size,
            sample_rate,
        }
    }

    /// Register a node, resolving its expansion width against the widths of
    /// every parameter and input it references.
    pub fn add(&mut self, node: impl SignalNode + 'static) -> Result<NodeId, GraphError> {
        self.add_boxed(Box::new(node))
    }

    pub fn add_boxed(&mut self, mut node: Box<dyn SignalNode>) -> Result<NodeId, GraphError> {
        let deps = self.collect_deps(&node.params(), &node.inputs())?;
        let lookup = |id: NodeId| self.banks[id.index()].len();
        let width = match node.fixed_width() {
            Some(w) => w.max(1),
            None => {
                let from_params = expansion_width(node.params(), &lookup);
                let from_inputs = node
                    .inputs()
                    .iter()
                    .map(|id| lookup(*id))
                    .max()
                    .unwrap_or(1);
                from_params.max(from_inputs).max(node.fan())
            }
        };
        node.allocate(width, self.sample_rate);

        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node));
        self.banks
            .push((0..width).map(|_| Stream::new(self.block_size)).collect());
        self.deps.push(deps);
        self.dirty = true;
        Ok(id)
    }

    /// Remove a node. Fails while any live node still lists it as an input;
    /// the graph owns producers for at least as long as their consumers.
    pub fn remove(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.check_alive(id)?;
        for (j, deps) in self.deps.iter().enumerate() {
            if j != id.index() && self.nodes[j].is_some() && deps.contains(&id) {
                return Err(GraphError::NodeInUse(id, NodeId(j)));
            }
        }
        self.nodes[id.index()] = None;
        self.banks[id.index()].clear();
        self.deps[id.index()].clear();
        self.dirty = true;
        Ok(())
    }

    /// Reassign one of a node's parameters.
    ///
    /// Requires `&mut self`, so it can only run between blocks; the running
    /// graph never observes a half-applied parameter. A node-valued
    /// reassignment is checked for cycles before it lands. The node's width
    /// is fixed at construction and is not revisited here; a wider sequence
    /// simply wraps across the existing streams.
    pub fn set_param(&mut self, id: NodeId, name: &str, value: Param) -> Result<(), GraphError> {
        self.check_alive(id)?;
        if let Some(target) = value.node() {
            self.check_alive(target)?;
            if target == id || self.reaches(target, id) {
                return Err(GraphError::Cycle(id));
            }
        }
        let node = match self.nodes[id.index()].as_mut() {
            Some(node) => node,
            None => return Err(GraphError::UnknownNode(id)),
        };
        node.set_param(name, value)
            .map_err(|_| GraphError::UnknownParam {
                node: id,
                name: name.to_string(),
            })?;
        let deps = match self.nodes[id.index()].as_ref() {
            Some(node) => self.collect_deps(&node.params(), &node.inputs())?,
            None => return Err(GraphError::UnknownNode(id)),
        };
        self.deps[id.index()] = deps;
        self.dirty = true;
        Ok(())
    }

    /// Stream count of a node, if it is registered and alive.
    pub fn width(&self, id: NodeId) -> Option<usize> {
        if self.is_alive(id) {
            Some(self.banks[id.index()].len())
        } else {
            None
        }
    }

    /// Read-only view of a node's most recently computed block.
    pub fn bank(&self, id: NodeId) -> Option<&[Stream]> {
        if self.is_alive(id) {
            Some(&self.banks[id.index()])
        } else {
            None
        }
    }

    /// Control descriptors for a node's mutable parameters.
    pub fn controls(&self, id: NodeId) -> Vec<ControlSpec> {
        match self.nodes.get(id.index()).and_then(|slot| slot.as_ref()) {
            Some(node) => node.controls(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every live node once, in dependency order, for the block
    /// starting at `ctx.start`. Never fails and never allocates on the
    /// cached-order path.
    pub(crate) fn process_block(&mut self, ctx: &mut BlockCtx) {
        if self.dirty {
            self.recompute_order();
        }
        for k in 0..self.order.len() {
            let i = self.order[k];
            let mut bank = mem::take(&mut self.banks[i]);
            if let Some(node) = self.nodes[i].as_mut() {
                let inputs = Inputs { banks: &self.banks };
                node.process_block(&inputs, &mut bank, ctx);
            }
            self.banks[i] = bank;
        }
    }

    fn is_alive(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len() && self.nodes[id.index()].is_some()
    }

    fn check_alive(&self, id: NodeId) -> Result<(), GraphError> {
        if self.is_alive(id) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(id))
        }
    }

    fn collect_deps(
        &self,
        params: &[&Param],
        inputs: &[NodeId],
    ) -> Result<Vec<NodeId>, GraphError> {
        let mut deps = Vec::new();
        let referenced = params
            .iter()
            .filter_map(|p| p.node())
            .chain(inputs.iter().copied());
        for id in referenced {
            self.check_alive(id)?;
            if !deps.contains(&id) {
                deps.push(id);
            }
        }
        Ok(deps)
    }

    /// Whether `from` transitively depends on `to`.
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(n) = stack.pop() {
            if n == to {
                return true;
            }
            if mem::replace(&mut seen[n.index()], true) {
                continue;
            }
            stack.extend(self.deps[n.index()].iter().copied());
        }
        false
    }

    /// Stable Kahn walk: among nodes whose inputs are all scheduled, the
    /// lowest id (insertion order) goes first.
    fn recompute_order(&mut self) {
        let n = self.nodes.len();
        let mut indegree = vec![0usize; n];
        let mut rdeps: Vec<Vec<usize>> = vec![Vec::new(); n];
        for i in 0..n {
            if self.nodes[i].is_none() {
                continue;
            }
            indegree[i] = self.deps[i].len();
            for d in &self.deps[i] {
                rdeps[d.index()].push(i);
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
            .filter(|&i| self.nodes[i].is_some() && indegree[i] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for &j in &rdeps[i] {
                indegree[j] -= 1;
                if indegree[j] == 0 {
                    ready.push(Reverse(j));
                }
            }
        }

        // Mutations reject cycles before they land, so the walk covers
        // every live node.
        debug_assert_eq!(order.len(), self.len());
        self.order = order;
        self.dirty = false;
    }
}
