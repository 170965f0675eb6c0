//  NETWORK.rs
//    by Lut99
//
//  Created:
//    20 Mar 2025, 14:11:08
//  Last edited:
//    11 Apr 2025, 16:03:21
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements ground task networks: an ordered sequence of task indices
//!   plus a square precedence bit-matrix, where bit `(i, j)` means the task
//!   at position `i` must precede the task at position `j`.
//!
//!   A network is only ever handed out well-formed: the matrix is irreflexive
//!   and acyclic, verified by a topological-sort attempt at construction.
//!   Failing that check is the fatal `CyclicOrderingConstraint` condition; a
//!   malformed network must never reach search.
//

use std::collections::VecDeque;
use std::error;
use std::fmt::{Display, Formatter, Result as FResult};

use itertools::Itertools as _;

use crate::bits::BitMatrix;


/***** ERRORS *****/
/// Defines errors occurring while building task networks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NetworkError {
    /// The ordering constraints contain a cycle (a self-loop counts).
    CyclicOrderingConstraint { positions: Vec<usize> },
    /// An ordering constraint referenced a subtask position that does not exist.
    OrderingOutOfRange { position: usize, len: usize },
}
impl Display for NetworkError {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::CyclicOrderingConstraint { positions } => {
                write!(f, "Ordering constraints are cyclic over subtask positions [{}]", positions.iter().join(", "))
            },
            Self::OrderingOutOfRange { position, len } => {
                write!(f, "Ordering constraint references subtask position {position}, but the network has only {len} subtasks")
            },
        }
    }
}
impl error::Error for NetworkError {}





/***** LIBRARY *****/
/// An ordered sequence of ground tasks plus a precedence bit-matrix.
///
/// Positions index into the sequence; the task at a position is an index into the relevant-task
/// table. Construction goes through [`TaskNetworkBuilder`] or [`TaskNetwork::decompose()`], both
/// of which verify irreflexivity and acyclicity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskNetwork {
    /// The relevant-task index of every subtask, in sequence order.
    tasks:    Vec<usize>,
    /// The precedence matrix over sequence positions.
    ordering: BitMatrix,
}

// Accessors
impl TaskNetwork {
    /// Returns the relevant-task indices of the subtasks, in sequence order.
    #[inline]
    pub fn tasks(&self) -> &[usize] { &self.tasks }

    /// Returns the precedence matrix.
    #[inline]
    pub fn ordering(&self) -> &BitMatrix { &self.ordering }

    /// Returns the number of subtasks.
    #[inline]
    pub fn len(&self) -> usize { self.tasks.len() }

    /// Checks whether the network has no subtasks.
    #[inline]
    pub fn is_empty(&self) -> bool { self.tasks.is_empty() }
}

// Ordering queries
impl TaskNetwork {
    /// Returns the positions with no (direct) predecessor, i.e., those a decomposition search may
    /// consider next.
    ///
    /// # Returns
    /// The unconstrained positions, in sequence order.
    pub fn unconstrained_positions(&self) -> Vec<usize> {
        (0..self.tasks.len()).filter(|j| (0..self.tasks.len()).all(|i| !self.ordering.get(i, *j))).collect()
    }

    /// Checks whether the precedence relation admits exactly one execution order.
    ///
    /// A DAG is totally ordered precisely when every step of a topological sort has a unique
    /// choice.
    ///
    /// # Returns
    /// True if the network is totally ordered (trivially so when it has at most one subtask).
    pub fn totally_ordered(&self) -> bool {
        let n: usize = self.tasks.len();
        let mut indegree: Vec<usize> = vec![0; n];
        for i in 0..n {
            for j in self.ordering.row(i).iter_ones() {
                indegree[j] += 1;
            }
        }
        let mut removed: Vec<bool> = vec![false; n];
        for _ in 0..n {
            let mut ready = (0..n).filter(|i| !removed[*i] && indegree[*i] == 0);
            let next: usize = match ready.next() {
                Some(next) if ready.next().is_none() => next,
                _ => return false,
            };
            removed[next] = true;
            for j in self.ordering.row(next).iter_ones() {
                indegree[j] -= 1;
            }
        }
        true
    }
}

// Decomposition
impl TaskNetwork {
    /// Replaces the subtask at a position with a method's subtask network.
    ///
    /// The method's subtasks are spliced into the sequence in place of the decomposed task. Every
    /// ordering constraint that held on the replaced position is re-derived onto all substituted
    /// positions; the method network's internal constraints are kept. If the method network is
    /// empty, the inherited predecessors and successors are bridged directly so transitivity
    /// survives the removal.
    ///
    /// # Arguments
    /// - `position`: The sequence position to decompose.
    /// - `sub`: The method's ground subtask network.
    ///
    /// # Returns
    /// A new, well-formed [`TaskNetwork`]; the original is left untouched.
    ///
    /// # Errors
    /// This function errors with [`NetworkError::CyclicOrderingConstraint`] if the merged
    /// constraints are cyclic.
    ///
    /// # Panics
    /// This function panics if `position` is out-of-range.
    pub fn decompose(&self, position: usize, sub: &TaskNetwork) -> Result<TaskNetwork, NetworkError> {
        let n: usize = self.tasks.len();
        let m: usize = sub.tasks.len();
        assert!(position < n, "Cannot decompose position {position} in a network of {n} subtasks");

        // Splice the subtask sequence
        let mut builder: TaskNetworkBuilder = TaskNetworkBuilder::new();
        for task in &self.tasks[..position] {
            builder.add_task(*task);
        }
        for task in &sub.tasks {
            builder.add_task(*task);
        }
        for task in &self.tasks[position + 1..] {
            builder.add_task(*task);
        }

        // Maps an old position to its new position(s)
        let map = |p: usize| -> Vec<usize> {
            if p < position {
                vec![p]
            } else if p == position {
                (position..position + m).collect()
            } else {
                vec![p + m - 1]
            }
        };

        // Re-derive the parent's constraints over the new positions
        for i in 0..n {
            for j in self.ordering.row(i).iter_ones() {
                if m == 0 && (i == position || j == position) {
                    // The replaced task vanished; bridge its predecessors to its successors
                    if i == position {
                        continue;
                    }
                    for k in self.ordering.row(position).iter_ones() {
                        for (ni, nk) in map(i).into_iter().cartesian_product(map(k)) {
                            builder.order(ni, nk);
                        }
                    }
                    continue;
                }
                for (ni, nj) in map(i).into_iter().cartesian_product(map(j)) {
                    builder.order(ni, nj);
                }
            }
        }

        // Keep the method network's internal constraints
        for i in 0..m {
            for j in sub.ordering.row(i).iter_ones() {
                builder.order(position + i, position + j);
            }
        }

        builder.build()
    }
}



/// Incrementally assembles a [`TaskNetwork`], deferring validation to [`TaskNetworkBuilder::build()`].
#[derive(Clone, Debug, Default)]
pub struct TaskNetworkBuilder {
    /// The relevant-task indices added so far.
    tasks:     Vec<usize>,
    /// The `(before, after)` constraints added so far.
    orderings: Vec<(usize, usize)>,
}
impl TaskNetworkBuilder {
    /// Creates a new, empty builder.
    ///
    /// # Returns
    /// A TaskNetworkBuilder with no subtasks and no constraints.
    #[inline]
    pub fn new() -> Self { Self::default() }

    /// Appends a subtask to the sequence.
    ///
    /// # Arguments
    /// - `task`: The relevant-task index of the subtask.
    ///
    /// # Returns
    /// The sequence position the subtask ended up at.
    #[inline]
    pub fn add_task(&mut self, task: usize) -> usize {
        self.tasks.push(task);
        self.tasks.len() - 1
    }

    /// Adds an ordering constraint between two sequence positions.
    ///
    /// # Arguments
    /// - `before`: The position that must come first.
    /// - `after`: The position that must come later.
    #[inline]
    pub fn order(&mut self, before: usize, after: usize) { self.orderings.push((before, after)); }

    /// Finalizes the network, verifying it is well-formed.
    ///
    /// # Returns
    /// The built [`TaskNetwork`].
    ///
    /// # Errors
    /// This function errors with [`NetworkError::OrderingOutOfRange`] if a constraint references
    /// a position beyond the sequence, or with [`NetworkError::CyclicOrderingConstraint`] if the
    /// constraints are reflexive or cyclic.
    pub fn build(self) -> Result<TaskNetwork, NetworkError> {
        let n: usize = self.tasks.len();

        // Materialize the matrix
        let mut ordering: BitMatrix = BitMatrix::new(n);
        for (before, after) in self.orderings {
            for position in [before, after] {
                if position >= n {
                    return Err(NetworkError::OrderingOutOfRange { position, len: n });
                }
            }
            if before == after {
                return Err(NetworkError::CyclicOrderingConstraint { positions: vec![before] });
            }
            ordering.set(before, after);
        }

        // Attempt a topological sort (Kahn); any residue is a cycle
        let mut indegree: Vec<usize> = vec![0; n];
        for i in 0..n {
            for j in ordering.row(i).iter_ones() {
                indegree[j] += 1;
            }
        }
        let mut queue: VecDeque<usize> = (0..n).filter(|i| indegree[*i] == 0).collect();
        let mut seen: usize = 0;
        let mut removed: Vec<bool> = vec![false; n];
        while let Some(i) = queue.pop_front() {
            seen += 1;
            removed[i] = true;
            for j in ordering.row(i).iter_ones() {
                indegree[j] -= 1;
                if indegree[j] == 0 {
                    queue.push_back(j);
                }
            }
        }
        if seen < n {
            return Err(NetworkError::CyclicOrderingConstraint { positions: (0..n).filter(|i| !removed[*i]).collect() });
        }

        Ok(TaskNetwork { tasks: self.tasks, ordering })
    }
}





/***** TESTS *****/
