//  PROBLEM.rs
//    by Lut99
//
//  Created:
//    24 Mar 2025, 10:44:56
//  Last edited:
//    14 Apr 2025, 17:31:09
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the compiled [`Problem`] aggregate: the immutable result of
//!   the grounding pipeline, owning every table the search and reporting
//!   collaborators read.
//!
//!   A Problem is built once, bottom-up, by [`ground()`](crate::ground::ground())
//!   and is read-only afterwards. Every collection in it is owned, so
//!   [`Clone`] is a full structural deep copy: a search algorithm may freely
//!   mutate its own copy (speculative state edits and the likes) without
//!   affecting the canonical value.
//

use crate::inertia::{Inertia, TypeAnalysis};
use crate::network::TaskNetwork;
use crate::state::{Condition, Fluent, State, Task};
use crate::symbols::SymbolTables;

use indexmap::IndexSet;


/***** LIBRARY *****/
/// A fully instantiated action: an operator schema with all parameters bound.
///
/// Preconditions and effects are encoded as [`Condition`]s (positive/negative bitset pairs) over
/// the relevant-fluent universe.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundAction {
    /// The task-symbol index of the schema this action instantiates.
    name: usize,
    /// The binding of every formal parameter; [`None`] is the unbound sentinel.
    params: Vec<Option<usize>>,
    /// The precondition.
    precondition: Condition,
    /// The unconditional effect, read as (adds, deletes).
    effect: Condition,
    /// The conditional effects, as (guard, effect) pairs.
    cond_effects: Vec<(Condition, Condition)>,
    /// The cost of applying this action.
    cost: f64,
    /// The duration of this action, if the domain declares one.
    duration: Option<f64>,
}

// Constructors
impl GroundAction {
    /// Assembles a ground action. Crate-internal; actions only come out of the grounder.
    #[inline]
    pub(crate) fn new(
        name: usize,
        params: Vec<Option<usize>>,
        precondition: Condition,
        effect: Condition,
        cond_effects: Vec<(Condition, Condition)>,
        cost: f64,
        duration: Option<f64>,
    ) -> Self {
        Self { name, params, precondition, effect, cond_effects, cost, duration }
    }
}

// Accessors
impl GroundAction {
    /// Returns the task-symbol index of the instantiated schema.
    #[inline]
    pub fn name(&self) -> usize { self.name }

    /// Returns the parameter bindings ([`None`] meaning unbound).
    #[inline]
    pub fn params(&self) -> &[Option<usize>] { &self.params }

    /// Returns the precondition.
    #[inline]
    pub fn precondition(&self) -> &Condition { &self.precondition }

    /// Returns the unconditional effect, read as (adds, deletes).
    #[inline]
    pub fn effect(&self) -> &Condition { &self.effect }

    /// Returns the conditional effects as (guard, effect) pairs.
    #[inline]
    pub fn conditional_effects(&self) -> &[(Condition, Condition)] { &self.cond_effects }

    /// Returns the cost of applying this action.
    #[inline]
    pub fn cost(&self) -> f64 { self.cost }

    /// Returns the duration of this action, if any.
    #[inline]
    pub fn duration(&self) -> Option<f64> { self.duration }
}



/// A fully instantiated method: a decomposition schema with all parameters bound.
///
/// A method achieves nothing by itself; it rewrites its compound task into its subtask network,
/// provided its precondition holds.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundMethod {
    /// The name of the schema this method instantiates.
    name: String,
    /// The binding of every formal parameter; [`None`] is the unbound sentinel.
    params: Vec<Option<usize>>,
    /// The relevant-task index of the compound task this method decomposes.
    task: usize,
    /// The precondition.
    precondition: Condition,
    /// The ground subtask network.
    network: TaskNetwork,
}

// Constructors
impl GroundMethod {
    /// Assembles a ground method. Crate-internal; methods only come out of the grounder.
    #[inline]
    pub(crate) fn new(name: String, params: Vec<Option<usize>>, task: usize, precondition: Condition, network: TaskNetwork) -> Self {
        Self { name, params, task, precondition, network }
    }
}

// Accessors
impl GroundMethod {
    /// Returns the name of the instantiated schema.
    #[inline]
    pub fn name(&self) -> &str { &self.name }

    /// Returns the parameter bindings ([`None`] meaning unbound).
    #[inline]
    pub fn params(&self) -> &[Option<usize>] { &self.params }

    /// Returns the relevant-task index of the decomposed compound task.
    #[inline]
    pub fn task(&self) -> usize { self.task }

    /// Returns the precondition.
    #[inline]
    pub fn precondition(&self) -> &Condition { &self.precondition }

    /// Returns the ground subtask network.
    #[inline]
    pub fn network(&self) -> &TaskNetwork { &self.network }
}



/// The compiled problem: everything the search engine and the reporting collaborator read.
///
/// Exactly one of [`Problem::goal()`] and [`Problem::initial_network()`] being present makes the
/// problem purely classical or purely hierarchical; both may coexist. A goal of [`None`] *after*
/// compilation means static simplification proved it contradictory (the problem is unsolvable
/// unless an initial network is present), which is distinct from a compilation error.
#[derive(Clone, Debug)]
pub struct Problem {
    /// The symbol tables.
    symbols: SymbolTables,
    /// The type-domain and inertia analysis results.
    analysis: TypeAnalysis,
    /// The relevant-fluent table; positions are the fluent indices all bitsets are over.
    fluents: Vec<Fluent>,
    /// The relevant-task table; positions are the task indices networks refer to.
    tasks: Vec<Task>,
    /// The ground actions.
    actions: Vec<GroundAction>,
    /// The ground methods.
    methods: Vec<GroundMethod>,
    /// The initial state (three-valued).
    init: State,
    /// The goal, if any survives static simplification.
    goal: Option<State>,
    /// Whether the input declared a goal at all (to tell "no goal" from "goal simplified away").
    had_goal: bool,
    /// The initial task network, if the problem is (partly) hierarchical.
    initial_network: Option<TaskNetwork>,
    /// Per relevant task, the indices of the operators that can achieve or decompose it: action
    /// indices for primitive tasks, method indices for compound ones.
    relevant_operators: Vec<Vec<usize>>,
    /// The relevant-task indices with an empty relevant-operator list.
    unachievable_tasks: Vec<usize>,
}

// Constructors
impl Problem {
    /// Assembles a compiled problem. Crate-internal; problems only come out of the grounder.
    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub(crate) fn new(
        symbols: SymbolTables,
        analysis: TypeAnalysis,
        fluents: Vec<Fluent>,
        tasks: Vec<Task>,
        actions: Vec<GroundAction>,
        methods: Vec<GroundMethod>,
        init: State,
        goal: Option<State>,
        had_goal: bool,
        initial_network: Option<TaskNetwork>,
        relevant_operators: Vec<Vec<usize>>,
        unachievable_tasks: Vec<usize>,
    ) -> Self {
        Self { symbols, analysis, fluents, tasks, actions, methods, init, goal, had_goal, initial_network, relevant_operators, unachievable_tasks }
    }
}

// Accessors
impl Problem {
    /// Returns the symbol tables.
    #[inline]
    pub fn symbols(&self) -> &SymbolTables { &self.symbols }

    /// Returns the constants that may bind to a parameter of the given type.
    #[inline]
    pub fn domain(&self, r#type: usize) -> &IndexSet<usize> { self.analysis.domain(r#type) }

    /// Returns the unary-static narrowings known for the given type.
    #[inline]
    pub fn inferred_domains(&self, r#type: usize) -> &[(usize, IndexSet<usize>)] { self.analysis.inferred_domains(r#type) }

    /// Returns the inertia classification of the given predicate.
    #[inline]
    pub fn predicate_inertia(&self, predicate: usize) -> Inertia { self.analysis.predicate_inertia(predicate) }

    /// Returns the relevant-fluent table. The size of this table is the width of every bitset in
    /// the problem.
    #[inline]
    pub fn fluents(&self) -> &[Fluent] { &self.fluents }

    /// Returns the relevant-task table.
    #[inline]
    pub fn tasks(&self) -> &[Task] { &self.tasks }

    /// Returns the ground actions.
    #[inline]
    pub fn actions(&self) -> &[GroundAction] { &self.actions }

    /// Returns the ground methods.
    #[inline]
    pub fn methods(&self) -> &[GroundMethod] { &self.methods }

    /// Returns the initial state.
    #[inline]
    pub fn init(&self) -> &State { &self.init }

    /// Returns the initial state mutably.
    ///
    /// Only reachable on an owned (or uniquely borrowed) Problem, so a search algorithm can edit
    /// its own deep copy while every shared reference to the canonical value stays frozen.
    #[inline]
    pub fn init_mut(&mut self) -> &mut State { &mut self.init }

    /// Returns the goal, or [`None`] if there is none or it was statically proven contradictory.
    #[inline]
    pub fn goal(&self) -> Option<&State> { self.goal.as_ref() }

    /// Returns the initial task network, if any.
    #[inline]
    pub fn initial_network(&self) -> Option<&TaskNetwork> { self.initial_network.as_ref() }

    /// Returns, for a relevant task, the indices of the operators that can achieve or decompose
    /// it: [`Problem::actions()`] indices for a primitive task, [`Problem::methods()`] indices
    /// for a compound one.
    #[inline]
    pub fn relevant_operators(&self, task: usize) -> &[usize] { &self.relevant_operators[task] }

    /// Returns the relevant-task indices that no operator can achieve or decompose.
    ///
    /// Compilation reports these but does not fail on them; the problem may still be solvable if
    /// such a task is never reached.
    #[inline]
    pub fn unachievable_tasks(&self) -> &[usize] { &self.unachievable_tasks }

    /// Checks whether the problem can possibly be solved.
    ///
    /// # Returns
    /// False if a declared goal was statically proven contradictory and no initial task network
    /// exists; true otherwise.
    #[inline]
    pub fn is_solvable(&self) -> bool { !(self.had_goal && self.goal.is_none() && self.initial_network.is_none()) }

    /// Checks whether the problem is hierarchical (has an initial task network).
    #[inline]
    pub fn is_hierarchical(&self) -> bool { self.initial_network.is_some() }
}
