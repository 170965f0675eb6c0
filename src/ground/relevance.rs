//  RELEVANCE.rs
//    by Lut99
//
//  Created:
//    27 Mar 2025, 11:02:13
//  Last edited:
//    15 Apr 2025, 09:26:40
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the relevance filter: the canonical tables of ground atoms
//!   and ground tasks that actually occur somewhere in the problem, and the
//!   per-task index of operators that can achieve or decompose it.
//!
//!   The tables deduplicate by (symbol, argument-tuple) identity; the first
//!   registration of a pair assigns it the next dense index and every later
//!   registration returns that same index. Keeping the universe restricted to
//!   atoms that occur in some precondition, effect, guard, initial fact or
//!   goal literal (and tasks that occur in some network) is what keeps the
//!   bitset width manageable.
//

use indexmap::IndexSet;
use log::warn;

use crate::problem::{GroundAction, GroundMethod};
use crate::state::{Fluent, Task};
use crate::symbols::SymbolTables;


/***** LIBRARY *****/
/// The deduplicating registry of relevant fluents and tasks.
///
/// Filled by the grounder as it discovers ground atoms and tasks; frozen (via
/// [`RelevanceTable::into_tables()`]) before anything is encoded into bitsets, because the number
/// of fluents registered here becomes the universe width.
#[derive(Clone, Debug, Default)]
pub struct RelevanceTable {
    /// The relevant fluents, position = fluent index.
    fluents: IndexSet<Fluent>,
    /// The relevant tasks, position = task index.
    tasks:   IndexSet<Task>,
}

// Constructors
impl RelevanceTable {
    /// Creates a new, empty table.
    ///
    /// # Returns
    /// A RelevanceTable with no fluents and no tasks.
    #[inline]
    pub fn new() -> Self { Self::default() }
}

// Registration
impl RelevanceTable {
    /// Registers a ground atom, deduplicating by (predicate, argument-tuple) identity.
    ///
    /// # Arguments
    /// - `fluent`: The [`Fluent`] to register.
    ///
    /// # Returns
    /// The fluent's dense index: a fresh one on first registration, the same one ever after.
    #[inline]
    pub fn register_fluent(&mut self, fluent: Fluent) -> usize { self.fluents.insert_full(fluent).0 }

    /// Registers a ground task, deduplicating by (symbol, argument-tuple) identity.
    ///
    /// # Arguments
    /// - `task`: The [`Task`] to register.
    ///
    /// # Returns
    /// The task's dense index: a fresh one on first registration, the same one ever after.
    #[inline]
    pub fn register_task(&mut self, task: Task) -> usize { self.tasks.insert_full(task).0 }
}

// Lookups
impl RelevanceTable {
    /// Returns the index of an already-registered fluent, if any.
    #[inline]
    pub fn fluent_index(&self, fluent: &Fluent) -> Option<usize> { self.fluents.get_index_of(fluent) }

    /// Returns the index of an already-registered task, if any.
    #[inline]
    pub fn task_index(&self, task: &Task) -> Option<usize> { self.tasks.get_index_of(task) }

    /// The number of registered fluents. Once the table is frozen, this is the bitset width.
    #[inline]
    pub fn num_fluents(&self) -> usize { self.fluents.len() }

    /// The number of registered tasks.
    #[inline]
    pub fn num_tasks(&self) -> usize { self.tasks.len() }

    /// Freezes the table into the final fluent and task tables.
    ///
    /// # Returns
    /// The relevant fluents and tasks, in registration order.
    #[inline]
    pub fn into_tables(self) -> (Vec<Fluent>, Vec<Task>) { (self.fluents.into_iter().collect(), self.tasks.into_iter().collect()) }
}



/// Builds the per-task relevant-operator index.
///
/// A primitive task unifies with the ground actions whose schema name and bound argument tuple
/// equal the task's symbol and arguments; a compound task unifies with the ground methods that
/// decompose exactly it. A task with no match is reported (it is unachievable, which makes the
/// problem unsolvable only if the task is actually reached) but never fatal.
///
/// # Arguments
/// - `symbols`: The [`SymbolTables`], to tell primitive from compound tasks and to render names.
/// - `tasks`: The frozen relevant-task table.
/// - `actions`: All ground actions.
/// - `methods`: All ground methods.
///
/// # Returns
/// A pair of the per-task operator-index lists and the indices of unachievable tasks.
pub(crate) fn build_relevant_operators(
    symbols: &SymbolTables,
    tasks: &[Task],
    actions: &[GroundAction],
    methods: &[GroundMethod],
) -> (Vec<Vec<usize>>, Vec<usize>) {
    let mut relevant: Vec<Vec<usize>> = Vec::with_capacity(tasks.len());
    let mut unachievable: Vec<usize> = Vec::new();
    for (index, task) in tasks.iter().enumerate() {
        let operators: Vec<usize> = if symbols.task_is_primitive(task.symbol) {
            actions.iter().enumerate().filter(|(_, a)| action_unifies(a, task)).map(|(a, _)| a).collect()
        } else {
            methods.iter().enumerate().filter(|(_, m)| m.task() == index).map(|(m, _)| m).collect()
        };
        if operators.is_empty() {
            warn!("Task {} is unachievable (no ground operator matches it)", task.display(symbols));
            unachievable.push(index);
        }
        relevant.push(operators);
    }
    (relevant, unachievable)
}

/// Checks whether a ground action is an instance of the given primitive task.
#[inline]
fn action_unifies(action: &GroundAction, task: &Task) -> bool {
    action.name() == task.symbol
        && action.params().len() == task.args.len()
        && action.params().iter().zip(task.args.iter()).all(|(p, a)| *p == Some(*a))
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Condition;


    #[test]
    fn test_fluent_registration_is_idempotent() {
        let mut table = RelevanceTable::new();
        let clear_a: usize = table.register_fluent(Fluent::new(0, [0]));
        let clear_b: usize = table.register_fluent(Fluent::new(0, [1]));
        let on_ab: usize = table.register_fluent(Fluent::new(1, [0, 1]));

        // Distinct pairs get distinct indices; re-registration returns the original
        assert_eq!((clear_a, clear_b, on_ab), (0, 1, 2));
        assert_eq!(table.register_fluent(Fluent::new(0, [0])), clear_a);
        assert_eq!(table.register_fluent(Fluent::new(1, [0, 1])), on_ab);
        assert_eq!(table.num_fluents(), 3);
    }

    #[test]
    fn test_task_registration_is_idempotent() {
        let mut table = RelevanceTable::new();
        let t0: usize = table.register_task(Task::new(0, [0]));
        assert_eq!(table.register_task(Task::new(0, [0])), t0);
        assert_ne!(table.register_task(Task::new(0, [1])), t0);
        assert_eq!(table.num_tasks(), 2);
    }

    #[test]
    fn test_relevant_operator_unification() {
        let mut symbols = SymbolTables::new();
        symbols.register_type("block");
        symbols.register_constant("a", "block").unwrap();
        symbols.register_constant("b", "block").unwrap();
        let pickup: usize = symbols.register_task("pickup", &["block".into()], true).unwrap();
        let fetch: usize = symbols.register_task("fetch", &["block".into()], false).unwrap();

        let tasks: Vec<Task> = vec![Task::new(pickup, [0]), Task::new(fetch, [0]), Task::new(pickup, [1])];
        let actions: Vec<GroundAction> = vec![
            GroundAction::new(pickup, vec![Some(0)], Condition::new(0), Condition::new(0), vec![], 1.0, None),
            GroundAction::new(pickup, vec![Some(1)], Condition::new(0), Condition::new(0), vec![], 1.0, None),
        ];
        let methods: Vec<GroundMethod> = vec![GroundMethod::new(
            "fetch-directly".into(),
            vec![Some(0)],
            1,
            Condition::new(0),
            crate::network::TaskNetworkBuilder::new().build().unwrap(),
        )];

        let (relevant, unachievable) = build_relevant_operators(&symbols, &tasks, &actions, &methods);
        assert_eq!(relevant, vec![vec![0], vec![0], vec![1]]);
        assert!(unachievable.is_empty());
    }

    #[test]
    fn test_unachievable_task_is_reported_not_fatal() {
        let mut symbols = SymbolTables::new();
        symbols.register_type("block");
        symbols.register_constant("a", "block").unwrap();
        let orphan: usize = symbols.register_task("orphan", &["block".into()], false).unwrap();

        let tasks: Vec<Task> = vec![Task::new(orphan, [0])];
        let (relevant, unachievable) = build_relevant_operators(&symbols, &tasks, &[], &[]);
        assert_eq!(relevant, vec![Vec::<usize>::new()]);
        assert_eq!(unachievable, vec![0]);
    }
}
