//  STATE.rs
//    by Lut99
//
//  Created:
//    17 Mar 2025, 09:22:10
//  Last edited:
//    09 Apr 2025, 14:57:33
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the ground atoms ([`Fluent`]s and [`Task`]s) and the state
//!   encodings over the relevant-fluent universe.
//!
//!   A [`State`] is three-valued: a fluent is asserted true, asserted false,
//!   or unknown. It is what the initial state and the goal are encoded as. A
//!   [`ClosedWorldState`] is the single-bitset projection used during search,
//!   where everything not asserted true is false.
//

use std::fmt::{Display, Formatter, Result as FResult};

use itertools::Itertools as _;

use crate::bits::BitVec;
use crate::symbols::SymbolTables;


/***** LIBRARY *****/
/// A ground atom: a predicate applied to constants.
///
/// Identity is the pair of predicate index and argument tuple; the relevance filter assigns every
/// distinct Fluent a unique position in the relevant-fluent table, which is how the rest of the
/// crate refers to it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Fluent {
    /// The index of the predicate in the symbol tables.
    pub predicate: usize,
    /// The constant indices bound to each argument position. Length equals the predicate's arity.
    pub args: Vec<usize>,
}
impl Fluent {
    /// Convenience constructor.
    #[inline]
    pub fn new(predicate: usize, args: impl IntoIterator<Item = usize>) -> Self { Self { predicate, args: args.into_iter().collect() } }

    /// Resolves this fluent against the symbol tables for human consumption.
    ///
    /// # Arguments
    /// - `symbols`: The [`SymbolTables`] to resolve the indices with.
    ///
    /// # Returns
    /// A [`Display`]able rendering like `(on a b)`.
    #[inline]
    pub fn display<'a>(&'a self, symbols: &'a SymbolTables) -> impl 'a + Display { FluentDisplay { fluent: self, symbols } }
}

/// Formatter returned by [`Fluent::display()`].
struct FluentDisplay<'a> {
    fluent:  &'a Fluent,
    symbols: &'a SymbolTables,
}
impl Display for FluentDisplay<'_> {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        write!(f, "({}", self.symbols.predicate_name(self.fluent.predicate))?;
        if !self.fluent.args.is_empty() {
            write!(f, " {}", self.fluent.args.iter().map(|a| self.symbols.constant_name(*a)).join(" "))?;
        }
        write!(f, ")")
    }
}



/// A ground task instance: a task symbol applied to constants.
///
/// The task-side analogue of [`Fluent`]; identity is the pair of task symbol index and argument
/// tuple, and the relevance filter assigns every distinct Task a unique position in the
/// relevant-task table.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Task {
    /// The index of the task symbol in the symbol tables.
    pub symbol: usize,
    /// The constant indices bound to each argument position.
    pub args:   Vec<usize>,
}
impl Task {
    /// Convenience constructor.
    #[inline]
    pub fn new(symbol: usize, args: impl IntoIterator<Item = usize>) -> Self { Self { symbol, args: args.into_iter().collect() } }

    /// Resolves this task against the symbol tables for human consumption.
    ///
    /// # Arguments
    /// - `symbols`: The [`SymbolTables`] to resolve the indices with.
    ///
    /// # Returns
    /// A [`Display`]able rendering like `(deliver pkg1 depot)`.
    #[inline]
    pub fn display<'a>(&'a self, symbols: &'a SymbolTables) -> impl 'a + Display { TaskDisplay { task: self, symbols } }
}

/// Formatter returned by [`Task::display()`].
struct TaskDisplay<'a> {
    task:    &'a Task,
    symbols: &'a SymbolTables,
}
impl Display for TaskDisplay<'_> {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        write!(f, "({}", self.symbols.task_name(self.task.symbol))?;
        if !self.task.args.is_empty() {
            write!(f, " {}", self.task.args.iter().map(|a| self.symbols.constant_name(*a)).join(" "))?;
        }
        write!(f, ")")
    }
}



/// A pair of bitsets over the fluent universe: required-true and required-false.
///
/// Used for preconditions, effect guards and effects alike. For effects, read the pair as
/// adds/deletes instead.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Condition {
    /// The fluents that must be true (or, for an effect, become true).
    pub pos: BitVec,
    /// The fluents that must be false (or, for an effect, become false).
    pub neg: BitVec,
}
impl Condition {
    /// Creates a new, empty Condition over a universe of the given size.
    ///
    /// # Arguments
    /// - `len`: The size of the fluent universe.
    ///
    /// # Returns
    /// A Condition with both bitsets empty (i.e., trivially satisfied).
    #[inline]
    pub fn new(len: usize) -> Self { Self { pos: BitVec::new(len), neg: BitVec::new(len) } }

    /// Checks whether this condition requires nothing.
    ///
    /// # Returns
    /// True if both bitsets are empty.
    #[inline]
    pub fn is_empty(&self) -> bool { self.pos.is_empty() && self.neg.is_empty() }
}



/// A three-valued assertion over the fluent universe.
///
/// A fluent is asserted true (positive bit set), asserted false (negative bit set), or unknown
/// (absent from both). The initial state and the goal are encoded as States.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct State {
    /// The fluents asserted true.
    positive: BitVec,
    /// The fluents asserted false.
    negative: BitVec,
}

// Constructors
impl State {
    /// Creates a new State in which every fluent is unknown.
    ///
    /// # Arguments
    /// - `len`: The size of the fluent universe.
    ///
    /// # Returns
    /// A new, all-unknown State.
    #[inline]
    pub fn new(len: usize) -> Self { Self { positive: BitVec::new(len), negative: BitVec::new(len) } }
}

// Assertions
impl State {
    /// Asserts a fluent true. Clears any previous false-assertion of the same fluent.
    ///
    /// # Arguments
    /// - `index`: The fluent index to assert.
    #[inline]
    pub fn assert_true(&mut self, index: usize) {
        self.positive.set(index);
        self.negative.clear(index);
    }

    /// Asserts a fluent false. Clears any previous true-assertion of the same fluent.
    ///
    /// # Arguments
    /// - `index`: The fluent index to assert.
    #[inline]
    pub fn assert_false(&mut self, index: usize) {
        self.negative.set(index);
        self.positive.clear(index);
    }
}

// Reads
impl State {
    /// Returns what this state asserts about a fluent.
    ///
    /// # Arguments
    /// - `index`: The fluent index to query.
    ///
    /// # Returns
    /// [`Some(true)`] if asserted true, [`Some(false)`] if asserted false, or [`None`] if unknown.
    #[inline]
    pub fn truth(&self, index: usize) -> Option<bool> {
        if self.positive.get(index) {
            Some(true)
        } else if self.negative.get(index) {
            Some(false)
        } else {
            None
        }
    }

    /// Returns the bitset of fluents asserted true.
    #[inline]
    pub fn positive(&self) -> &BitVec { &self.positive }

    /// Returns the bitset of fluents asserted false.
    #[inline]
    pub fn negative(&self) -> &BitVec { &self.negative }

    /// Projects this State onto the closed-world assumption.
    ///
    /// The result's bitset equals this state's positive bitset exactly; fluents that were asserted
    /// false or unknown are both simply absent (i.e., false).
    ///
    /// # Returns
    /// The [`ClosedWorldState`] projection.
    #[inline]
    pub fn to_closed_world(&self) -> ClosedWorldState { ClosedWorldState { bits: self.positive.clone() } }
}



/// A state under the closed-world assumption: one bitset, absent means false.
///
/// This is the representation a forward-search consumer mutates; the compiled problem itself only
/// stores three-valued [`State`]s.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ClosedWorldState {
    /// The fluents that hold.
    bits: BitVec,
}

impl ClosedWorldState {
    /// Creates a new ClosedWorldState in which nothing holds.
    ///
    /// # Arguments
    /// - `len`: The size of the fluent universe.
    ///
    /// # Returns
    /// A new, all-false ClosedWorldState.
    #[inline]
    pub fn new(len: usize) -> Self { Self { bits: BitVec::new(len) } }

    /// Checks whether a fluent holds.
    ///
    /// # Arguments
    /// - `index`: The fluent index to query.
    ///
    /// # Returns
    /// True if the fluent holds, or false otherwise.
    #[inline]
    pub fn holds(&self, index: usize) -> bool { self.bits.get(index) }

    /// Checks whether a condition is satisfied in this state.
    ///
    /// # Arguments
    /// - `condition`: The [`Condition`] to check.
    ///
    /// # Returns
    /// True if every positive fluent holds and no negative fluent does.
    #[inline]
    pub fn satisfies(&self, condition: &Condition) -> bool { condition.pos.is_subset_of(&self.bits) && !condition.neg.intersects(&self.bits) }

    /// Applies an effect to this state: deletes first, then adds.
    ///
    /// # Arguments
    /// - `effect`: The effect [`Condition`], read as (adds, deletes).
    #[inline]
    pub fn apply(&mut self, effect: &Condition) {
        self.bits.difference_with(&effect.neg);
        self.bits.union_with(&effect.pos);
    }

    /// Returns the underlying bitset.
    #[inline]
    pub fn bits(&self) -> &BitVec { &self.bits }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitVec;


    #[test]
    fn test_state_three_valued() {
        let mut state = State::new(4);
        state.assert_true(0);
        state.assert_false(1);
        assert_eq!(state.truth(0), Some(true));
        assert_eq!(state.truth(1), Some(false));
        assert_eq!(state.truth(2), None);

        // Re-asserting flips cleanly
        state.assert_false(0);
        assert_eq!(state.truth(0), Some(false));
        assert!(!state.positive().get(0));
    }

    #[test]
    fn test_closed_world_projection_roundtrip() {
        // The projection of State { positive: S, negative: ∅ } must equal S exactly
        let mut state = State::new(67);
        for i in [0, 5, 63, 64, 66] {
            state.assert_true(i);
        }
        let cws: ClosedWorldState = state.to_closed_world();
        assert_eq!(cws.bits(), &BitVec::from_indices(67, [0, 5, 63, 64, 66]));

        // Negative and unknown fluents project identically (to absent)
        let mut state = State::new(3);
        state.assert_true(0);
        state.assert_false(1);
        let cws: ClosedWorldState = state.to_closed_world();
        assert!(cws.holds(0));
        assert!(!cws.holds(1));
        assert!(!cws.holds(2));
    }

    #[test]
    fn test_closed_world_satisfies_and_apply() {
        let mut cws = ClosedWorldState::new(4);
        cws.apply(&Condition { pos: BitVec::from_indices(4, [0, 1]), neg: BitVec::new(4) });

        let mut cond = Condition::new(4);
        cond.pos.set(0);
        cond.neg.set(2);
        assert!(cws.satisfies(&cond));

        // Delete 0, add 2: the condition must now fail on both counts
        cws.apply(&Condition { pos: BitVec::from_indices(4, [2]), neg: BitVec::from_indices(4, [0]) });
        assert!(!cws.satisfies(&cond));
        assert!(cws.holds(1));
        assert!(cws.holds(2));
    }
}
