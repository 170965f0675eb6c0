//  MOD.rs
//    by Lut99
//
//  Created:
//    25 Mar 2025, 09:14:02
//  Last edited:
//    17 Apr 2025, 15:42:37
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the grounding pipeline: from a typed, lifted
//!   [`ProblemInput`] to a fully instantiated, bit-vector-encoded
//!   [`Problem`].
//!
//!   The pipeline is a single-pass batch compilation: symbol registration,
//!   type-domain/inertia analysis, per-schema binding enumeration into local
//!   buffers, a merge through the relevance filter, and a finalize phase that
//!   encodes everything against the then-frozen fluent universe. Bitsets are
//!   only materialized in the finalize phase, so the per-schema enumeration
//!   never depends on the final universe width.
//!
//!   The dominant performance technique is evaluating *static* precondition
//!   literals immediately against the initial state: a binding that falsifies
//!   one is discarded before any ground instance is materialized, which
//!   avoids enumerating exponentially many dead bindings. Static predicates
//!   are evaluated under the closed-world assumption (absent from the
//!   initial state means false). Note that this is strictly weaker than a
//!   reachability analysis: a non-static precondition that happens to be
//!   false initially does NOT discard a binding.
//

// Nested modules
pub mod relevance;

// Imports
use std::error;
use std::fmt::{Display, Formatter, Result as FResult};

use indexmap::IndexSet;
use log::{debug, trace};

use crate::bits::BitVec;
use crate::inertia::TypeAnalysis;
use crate::input::{ActionSchema, Literal, MethodSchema, Parameter, ProblemInput, TaskRef, Term};
use crate::network::{NetworkError, TaskNetwork, TaskNetworkBuilder};
use crate::problem::{GroundAction, GroundMethod, Problem};
use crate::state::{Condition, Fluent, State, Task};
use crate::symbols::{SymbolError, SymbolKind, SymbolTables};
use relevance::RelevanceTable;


/***** ERRORS *****/
/// Defines the fatal errors of the grounding pipeline.
///
/// Anything representable here aborts compilation; no partially-built [`Problem`] is ever
/// returned. Droppable conditions (a statically unsatisfiable binding, an unachievable task) are
/// deliberately NOT errors.
#[derive(Debug)]
pub enum GroundError {
    /// A declaration-level symbol error (unknown type, unknown symbol, arity mismatch).
    Symbol(SymbolError),
    /// A symbol error inside a specific operator schema.
    Schema { schema: String, err: SymbolError },
    /// A schema referenced a variable that is not one of its parameters.
    UnknownVariable { schema: String, name: String },
    /// A variable occurred where only constants are allowed (initial state, goal, initial
    /// network).
    VariableInGroundContext { name: String },
    /// A task network was malformed (cyclic or referencing unknown positions).
    Network { schema: Option<String>, err: NetworkError },
}
impl Display for GroundError {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Symbol(err) => write!(f, "{err}"),
            Self::Schema { schema, err } => write!(f, "In schema \"{schema}\": {err}"),
            Self::UnknownVariable { schema, name } => write!(f, "Schema \"{schema}\" references variable \"?{name}\" that is not a parameter"),
            Self::VariableInGroundContext { name } => write!(f, "Variable \"?{name}\" occurs in a ground context (initial state, goal or initial network)"),
            Self::Network { schema: Some(schema), err } => write!(f, "In the subtask network of schema \"{schema}\": {err}"),
            Self::Network { schema: None, err } => write!(f, "In the initial task network: {err}"),
        }
    }
}
impl error::Error for GroundError {
    #[inline]
    fn source(&self) -> Option<&(dyn 'static + error::Error)> {
        match self {
            Self::Symbol(err) | Self::Schema { err, .. } => Some(err),
            Self::Network { err, .. } => Some(err),
            Self::UnknownVariable { .. } | Self::VariableInGroundContext { .. } => None,
        }
    }
}
impl From<SymbolError> for GroundError {
    #[inline]
    fn from(err: SymbolError) -> Self { Self::Symbol(err) }
}





/***** HELPERS *****/
/// An argument of a schema literal or task reference after name resolution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Arg {
    /// A schema parameter, by position.
    Param(usize),
    /// A constant, by index.
    Const(usize),
}
impl Arg {
    /// Substitutes this argument under a parameter binding.
    #[inline]
    fn bind(&self, binding: &[usize]) -> usize {
        match self {
            Self::Param(position) => binding[*position],
            Self::Const(index) => *index,
        }
    }
}

/// A schema literal with all names resolved to indices.
#[derive(Clone, Debug)]
struct ResolvedLiteral {
    predicate: usize,
    args:      Vec<Arg>,
    positive:  bool,
}

/// A schema task reference with all names resolved to indices.
#[derive(Clone, Debug)]
struct ResolvedTaskRef {
    symbol: usize,
    args:   Vec<Arg>,
}

/// Finds the position of a named parameter in a schema's parameter list.
#[inline]
fn param_position(params: &[Parameter], name: &str) -> Option<usize> { params.iter().position(|p| p.name == name) }

/// Resolves a schema term to an [`Arg`].
fn resolve_term(symbols: &SymbolTables, schema: &str, params: &[Parameter], term: &Term) -> Result<Arg, GroundError> {
    match term {
        Term::Var(name) => {
            param_position(params, name).map(Arg::Param).ok_or_else(|| GroundError::UnknownVariable { schema: schema.into(), name: name.clone() })
        },
        Term::Const(name) => symbols.constant_index(name).map(Arg::Const).ok_or_else(|| GroundError::Schema {
            schema: schema.into(),
            err:    SymbolError::UnknownSymbol { kind: SymbolKind::Constant, name: name.clone() },
        }),
    }
}

/// Resolves a schema literal, checking the used arity against the declared signature.
fn resolve_literal(symbols: &SymbolTables, schema: &str, params: &[Parameter], lit: &Literal) -> Result<ResolvedLiteral, GroundError> {
    let predicate: usize = symbols.predicate_index(&lit.predicate).ok_or_else(|| GroundError::Schema {
        schema: schema.into(),
        err:    SymbolError::UnknownSymbol { kind: SymbolKind::Predicate, name: lit.predicate.clone() },
    })?;
    let declared: usize = symbols.predicate_signature(predicate).len();
    if lit.args.len() != declared {
        return Err(GroundError::Schema {
            schema: schema.into(),
            err:    SymbolError::ArityMismatch { symbol: lit.predicate.clone(), declared, used: lit.args.len() },
        });
    }
    let args: Vec<Arg> = lit.args.iter().map(|t| resolve_term(symbols, schema, params, t)).collect::<Result<_, GroundError>>()?;
    Ok(ResolvedLiteral { predicate, args, positive: lit.positive })
}

/// Resolves a schema task reference, checking the used arity against the declared signature.
fn resolve_task_ref(symbols: &SymbolTables, schema: &str, params: &[Parameter], tref: &TaskRef) -> Result<ResolvedTaskRef, GroundError> {
    let symbol: usize = symbols.task_index(&tref.task).ok_or_else(|| GroundError::Schema {
        schema: schema.into(),
        err:    SymbolError::UnknownSymbol { kind: SymbolKind::Task, name: tref.task.clone() },
    })?;
    let declared: usize = symbols.task_signature(symbol).len();
    if tref.args.len() != declared {
        return Err(GroundError::Schema {
            schema: schema.into(),
            err:    SymbolError::ArityMismatch { symbol: tref.task.clone(), declared, used: tref.args.len() },
        });
    }
    let args: Vec<Arg> = tref.args.iter().map(|t| resolve_term(symbols, schema, params, t)).collect::<Result<_, GroundError>>()?;
    Ok(ResolvedTaskRef { symbol, args })
}

/// Resolves a ground literal (initial state or goal), where variables are illegal.
fn resolve_ground_literal(symbols: &SymbolTables, lit: &Literal) -> Result<(usize, Vec<usize>, bool), GroundError> {
    let predicate: usize = symbols
        .predicate_index(&lit.predicate)
        .ok_or_else(|| SymbolError::UnknownSymbol { kind: SymbolKind::Predicate, name: lit.predicate.clone() })?;
    let declared: usize = symbols.predicate_signature(predicate).len();
    if lit.args.len() != declared {
        return Err(SymbolError::ArityMismatch { symbol: lit.predicate.clone(), declared, used: lit.args.len() }.into());
    }
    let args: Vec<usize> = lit
        .args
        .iter()
        .map(|t| match t {
            Term::Var(name) => Err(GroundError::VariableInGroundContext { name: name.clone() }),
            Term::Const(name) => symbols
                .constant_index(name)
                .ok_or_else(|| SymbolError::UnknownSymbol { kind: SymbolKind::Constant, name: name.clone() }.into()),
        })
        .collect::<Result<_, GroundError>>()?;
    Ok((predicate, args, lit.positive))
}

/// Resolves a ground task reference (initial network), where variables are illegal.
fn resolve_ground_task_ref(symbols: &SymbolTables, tref: &TaskRef) -> Result<Task, GroundError> {
    let symbol: usize =
        symbols.task_index(&tref.task).ok_or_else(|| SymbolError::UnknownSymbol { kind: SymbolKind::Task, name: tref.task.clone() })?;
    let declared: usize = symbols.task_signature(symbol).len();
    if tref.args.len() != declared {
        return Err(SymbolError::ArityMismatch { symbol: tref.task.clone(), declared, used: tref.args.len() }.into());
    }
    let args: Vec<usize> = tref
        .args
        .iter()
        .map(|t| match t {
            Term::Var(name) => Err(GroundError::VariableInGroundContext { name: name.clone() }),
            Term::Const(name) => symbols
                .constant_index(name)
                .ok_or_else(|| SymbolError::UnknownSymbol { kind: SymbolKind::Constant, name: name.clone() }.into()),
        })
        .collect::<Result<_, GroundError>>()?;
    Ok(Task::new(symbol, args))
}



/// Odometer-style iterator over the cross-product of per-parameter candidate domains.
///
/// Enumerates every assignment of one constant per parameter, rightmost parameter cycling
/// fastest. Zero parameters yield exactly one (empty) binding; an empty candidate list yields
/// none.
#[derive(Clone, Debug)]
struct BindingIter {
    /// The candidate constants per parameter.
    domains:  Vec<Vec<usize>>,
    /// The current odometer position.
    counters: Vec<usize>,
    /// Whether the first binding has been emitted yet.
    started:  bool,
    /// Whether the odometer has wrapped around.
    done:     bool,
}
impl BindingIter {
    /// Creates a new BindingIter over the given candidate domains.
    #[inline]
    fn new(domains: Vec<Vec<usize>>) -> Self {
        let done: bool = domains.iter().any(Vec::is_empty);
        let counters: Vec<usize> = vec![0; domains.len()];
        Self { domains, counters, started: false, done }
    }
}
impl Iterator for BindingIter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.started {
            // Tick the odometer, rightmost digit fastest
            let mut i: usize = self.counters.len();
            loop {
                if i == 0 {
                    self.done = true;
                    return None;
                }
                i -= 1;
                self.counters[i] += 1;
                if self.counters[i] < self.domains[i].len() {
                    break;
                }
                self.counters[i] = 0;
            }
        } else {
            self.started = true;
        }
        Some(self.counters.iter().enumerate().map(|(i, c)| self.domains[i][*c]).collect())
    }
}



/// A precondition/effect under construction: fluent-index lists instead of bitsets.
///
/// Bitsets can only be sized once the relevance filter has frozen the universe, so everything the
/// per-schema enumeration produces is buffered in this form until the finalize phase.
#[derive(Clone, Debug, Default)]
struct PartialCondition {
    /// Indices of fluents required true (or added).
    pos: Vec<usize>,
    /// Indices of fluents required false (or deleted).
    neg: Vec<usize>,
}
impl PartialCondition {
    /// Records a literal's fluent index under its polarity.
    #[inline]
    fn add(&mut self, positive: bool, index: usize) {
        if positive {
            self.pos.push(index);
        } else {
            self.neg.push(index);
        }
    }

    /// Checks whether nothing has been recorded.
    #[inline]
    fn is_empty(&self) -> bool { self.pos.is_empty() && self.neg.is_empty() }

    /// Encodes the buffered indices as a [`Condition`] over the final universe.
    #[inline]
    fn encode(&self, len: usize) -> Condition {
        Condition { pos: BitVec::from_indices(len, self.pos.iter().copied()), neg: BitVec::from_indices(len, self.neg.iter().copied()) }
    }
}

/// A ground action buffered before the finalize phase.
#[derive(Clone, Debug)]
struct PartialAction {
    name: usize,
    params: Vec<Option<usize>>,
    precondition: PartialCondition,
    effect: PartialCondition,
    cond_effects: Vec<(PartialCondition, PartialCondition)>,
    cost: f64,
    duration: Option<f64>,
}
impl PartialAction {
    /// Encodes the buffered action against the final universe.
    #[inline]
    fn encode(self, len: usize) -> GroundAction {
        GroundAction::new(
            self.name,
            self.params,
            self.precondition.encode(len),
            self.effect.encode(len),
            self.cond_effects.iter().map(|(g, e)| (g.encode(len), e.encode(len))).collect(),
            self.cost,
            self.duration,
        )
    }
}

/// A ground method buffered before the finalize phase.
///
/// The subtask network is already final: its matrix is sized by its own subtask count, not by the
/// fluent universe.
#[derive(Clone, Debug)]
struct PartialMethod {
    name: String,
    params: Vec<Option<usize>>,
    task: usize,
    precondition: PartialCondition,
    network: TaskNetwork,
}
impl PartialMethod {
    /// Encodes the buffered method against the final universe.
    #[inline]
    fn encode(self, len: usize) -> GroundMethod { GroundMethod::new(self.name, self.params, self.task, self.precondition.encode(len), self.network) }
}



/// Evaluates a static literal under a binding against the initial state.
///
/// Static predicates are closed-world: a fluent absent from the initial positives is false.
#[inline]
fn static_literal_holds(lit: &ResolvedLiteral, binding: &[usize], init_pos: &IndexSet<Fluent>) -> bool {
    let holds: bool = init_pos.contains(&Fluent::new(lit.predicate, lit.args.iter().map(|a| a.bind(binding))));
    holds == lit.positive
}

/// Computes the candidate constants for every parameter of a schema.
///
/// Starts from the declared type domain and narrows by every unary static predicate that guards
/// the parameter in the schema's own precondition. The narrowing is sound because the guard
/// literal itself restricts legal bindings to exactly the guard's initial extension.
fn candidate_domains(
    symbols: &SymbolTables,
    analysis: &TypeAnalysis,
    schema: &str,
    params: &[Parameter],
    precondition: &[ResolvedLiteral],
) -> Result<Vec<Vec<usize>>, GroundError> {
    let mut domains: Vec<Vec<usize>> = Vec::with_capacity(params.len());
    for (position, param) in params.iter().enumerate() {
        let r#type: usize = symbols.type_index(&param.r#type).ok_or_else(|| GroundError::Schema {
            schema: schema.into(),
            err:    SymbolError::UnknownTypeReference { symbol: param.name.clone(), r#type: param.r#type.clone() },
        })?;
        let mut candidates: Vec<usize> = analysis.domain(r#type).iter().copied().collect();
        for (pred, extension) in analysis.inferred_domains(r#type) {
            let guards: bool =
                precondition.iter().any(|l| l.positive && l.predicate == *pred && l.args.len() == 1 && l.args[0] == Arg::Param(position));
            if guards {
                candidates.retain(|c| extension.contains(c));
            }
        }
        domains.push(candidates);
    }
    Ok(domains)
}

/// Resolves a schema's parameter-inequality constraints to parameter positions.
fn resolve_inequalities(schema: &str, params: &[Parameter], inequalities: &[(String, String)]) -> Result<Vec<(usize, usize)>, GroundError> {
    inequalities
        .iter()
        .map(|(a, b)| {
            let a: usize = param_position(params, a).ok_or_else(|| GroundError::UnknownVariable { schema: schema.into(), name: a.clone() })?;
            let b: usize = param_position(params, b).ok_or_else(|| GroundError::UnknownVariable { schema: schema.into(), name: b.clone() })?;
            Ok((a, b))
        })
        .collect()
}

/// Encodes a list of resolved precondition literals under a binding, statically pruning.
///
/// # Returns
/// The buffered condition over non-static literals, or [`None`] if a static literal is falsified
/// (the binding is dead).
fn encode_precondition(
    analysis: &TypeAnalysis,
    init_pos: &IndexSet<Fluent>,
    relevance: &mut RelevanceTable,
    precondition: &[ResolvedLiteral],
    binding: &[usize],
) -> Option<PartialCondition> {
    let mut partial: PartialCondition = PartialCondition::default();
    for lit in precondition {
        if analysis.predicate_inertia(lit.predicate).is_static() {
            if !static_literal_holds(lit, binding, init_pos) {
                return None;
            }
            // Statically satisfied literals are simplified away entirely
            continue;
        }
        let index: usize = relevance.register_fluent(Fluent::new(lit.predicate, lit.args.iter().map(|a| a.bind(binding))));
        partial.add(lit.positive, index);
    }
    Some(partial)
}





/***** LIBRARY FUNCTIONS *****/
/// Compiles a typed, lifted problem description into a fully instantiated, bit-vector-encoded
/// [`Problem`].
///
/// This is the whole pipeline: symbol registration, type-domain/inertia analysis, schema
/// grounding with static pruning, relevance filtering, state/goal encoding and task-network
/// construction, in that order.
///
/// # Arguments
/// - `input`: The [`ProblemInput`] handed over by the parsing collaborator, with quantifiers and
///   disjunction already expanded.
///
/// # Returns
/// The compiled, immutable [`Problem`].
///
/// # Errors
/// This function errors with a [`GroundError`] on any fatal condition: unknown type/symbol
/// references, arity mismatches, variables in ground contexts, or cyclic ordering constraints.
/// A statically unsatisfiable binding and an unachievable task are NOT fatal; the former is
/// silently dropped and the latter reported through [`log::warn!`] and
/// [`Problem::unachievable_tasks()`].
pub fn ground(input: &ProblemInput) -> Result<Problem, GroundError> {
    // Phase 1: symbols
    let mut symbols: SymbolTables = SymbolTables::new();
    for decl in &input.domain.types {
        symbols.register_type(&decl.name);
    }
    for decl in &input.domain.types {
        if let Some(parent) = &decl.parent {
            symbols.declare_subtype(&decl.name, parent)?;
        }
    }
    for decl in &input.domain.constants {
        symbols.register_constant(&decl.name, &decl.r#type)?;
    }
    for decl in &input.domain.predicates {
        symbols.register_predicate(&decl.name, &decl.params)?;
    }
    for decl in &input.domain.functions {
        symbols.register_function(&decl.name, &decl.params)?;
    }
    for decl in &input.domain.tasks {
        symbols.register_task(&decl.name, &decl.params, false)?;
    }
    for schema in &input.domain.actions {
        let signature: Vec<String> = schema.params.iter().map(|p| p.r#type.clone()).collect();
        symbols.register_task(&schema.name, &signature, true).map_err(|err| GroundError::Schema { schema: schema.name.clone(), err })?;
    }
    debug!(
        "Registered {} types, {} constants, {} predicates, {} functions, {} tasks",
        symbols.num_types(),
        symbols.num_constants(),
        symbols.num_predicates(),
        symbols.num_functions(),
        symbols.num_tasks()
    );

    // Phase 2: the initial state, resolved early because the analysis needs it
    let mut init_pos: IndexSet<Fluent> = IndexSet::new();
    let mut init_neg: IndexSet<Fluent> = IndexSet::new();
    for lit in &input.init {
        let (predicate, args, positive) = resolve_ground_literal(&symbols, lit)?;
        if positive {
            init_pos.insert(Fluent::new(predicate, args));
        } else {
            init_neg.insert(Fluent::new(predicate, args));
        }
    }

    // Phase 3: type domains, inferred domains, inertia
    let analysis: TypeAnalysis = TypeAnalysis::analyze(&symbols, &input.domain, &init_pos)?;

    // Phase 4: the relevance filter opens with the initial facts
    let mut relevance: RelevanceTable = RelevanceTable::new();
    for fluent in init_pos.iter().chain(init_neg.iter()) {
        relevance.register_fluent(fluent.clone());
    }

    // Phase 5: ground the action schemas
    let mut actions: Vec<PartialAction> = Vec::new();
    for schema in &input.domain.actions {
        ground_action_schema(&symbols, &analysis, &init_pos, &mut relevance, schema, &mut actions)?;
    }
    debug!("Grounded {} actions from {} schemas", actions.len(), input.domain.actions.len());

    // Phase 6: ground the method schemas
    let mut methods: Vec<PartialMethod> = Vec::new();
    for schema in &input.domain.methods {
        ground_method_schema(&symbols, &analysis, &init_pos, &mut relevance, schema, &mut methods)?;
    }
    debug!("Grounded {} methods from {} schemas", methods.len(), input.domain.methods.len());

    // Phase 7: the initial task network
    let initial_network: Option<TaskNetwork> = match &input.initial_network {
        Some(schema) => {
            let mut builder: TaskNetworkBuilder = TaskNetworkBuilder::new();
            for tref in &schema.subtasks {
                let task: Task = resolve_ground_task_ref(&symbols, tref)?;
                builder.add_task(relevance.register_task(task));
            }
            for (before, after) in &schema.orderings {
                builder.order(*before, *after);
            }
            Some(builder.build().map_err(|err| GroundError::Network { schema: None, err })?)
        },
        None => None,
    };

    // Phase 8: the goal, with static simplification
    let had_goal: bool = input.goal.is_some();
    let mut goal_partial: Option<PartialCondition> = None;
    if let Some(literals) = &input.goal {
        let mut partial: PartialCondition = PartialCondition::default();
        let mut contradicted: bool = false;
        for lit in literals {
            let (predicate, args, positive) = resolve_ground_literal(&symbols, lit)?;
            if analysis.predicate_inertia(predicate).is_static() {
                let holds: bool = init_pos.contains(&Fluent::new(predicate, args));
                if holds != positive {
                    debug!("Goal literal on \"{}\" is statically contradicted; the goal is unreachable", symbols.predicate_name(predicate));
                    contradicted = true;
                    break;
                }
                // Statically satisfied; simplified away
            } else {
                let index: usize = relevance.register_fluent(Fluent::new(predicate, args));
                partial.add(positive, index);
            }
        }
        if !contradicted {
            goal_partial = Some(partial);
        }
    }

    // Phase 9: finalize. The universe is frozen here; everything buffered gets encoded
    let len: usize = relevance.num_fluents();
    debug!("Fluent universe frozen at {len} fluents, {} tasks", relevance.num_tasks());

    let mut init: State = State::new(len);
    for fluent in &init_pos {
        init.assert_true(relevance.register_fluent(fluent.clone()));
    }
    for fluent in &init_neg {
        init.assert_false(relevance.register_fluent(fluent.clone()));
    }
    let goal: Option<State> = goal_partial.map(|partial| {
        let mut state: State = State::new(len);
        for index in &partial.pos {
            state.assert_true(*index);
        }
        for index in &partial.neg {
            state.assert_false(*index);
        }
        state
    });

    let actions: Vec<GroundAction> = actions.into_iter().map(|a| a.encode(len)).collect();
    let methods: Vec<GroundMethod> = methods.into_iter().map(|m| m.encode(len)).collect();
    let (fluents, tasks): (Vec<Fluent>, Vec<Task>) = relevance.into_tables();
    let (relevant_operators, unachievable_tasks): (Vec<Vec<usize>>, Vec<usize>) =
        relevance::build_relevant_operators(&symbols, &tasks, &actions, &methods);

    Ok(Problem::new(
        symbols,
        analysis,
        fluents,
        tasks,
        actions,
        methods,
        init,
        goal,
        had_goal,
        initial_network,
        relevant_operators,
        unachievable_tasks,
    ))
}





/***** HELPER FUNCTIONS *****/
/// Grounds one action schema into the buffer.
fn ground_action_schema(
    symbols: &SymbolTables,
    analysis: &TypeAnalysis,
    init_pos: &IndexSet<Fluent>,
    relevance: &mut RelevanceTable,
    schema: &ActionSchema,
    actions: &mut Vec<PartialAction>,
) -> Result<(), GroundError> {
    let name: usize = symbols.task_index(&schema.name).ok_or_else(|| GroundError::Schema {
        schema: schema.name.clone(),
        err:    SymbolError::UnknownSymbol { kind: SymbolKind::Task, name: schema.name.clone() },
    })?;

    // Resolve the schema once; bindings then only substitute indices
    let precondition: Vec<ResolvedLiteral> =
        schema.precondition.iter().map(|l| resolve_literal(symbols, &schema.name, &schema.params, l)).collect::<Result<_, GroundError>>()?;
    let effects: Vec<ResolvedLiteral> =
        schema.effects.iter().map(|l| resolve_literal(symbols, &schema.name, &schema.params, l)).collect::<Result<_, GroundError>>()?;
    let cond_effects: Vec<(Vec<ResolvedLiteral>, Vec<ResolvedLiteral>)> = schema
        .cond_effects
        .iter()
        .map(|ce| {
            let guard: Vec<ResolvedLiteral> =
                ce.guard.iter().map(|l| resolve_literal(symbols, &schema.name, &schema.params, l)).collect::<Result<_, GroundError>>()?;
            let effect: Vec<ResolvedLiteral> =
                ce.effect.iter().map(|l| resolve_literal(symbols, &schema.name, &schema.params, l)).collect::<Result<_, GroundError>>()?;
            Ok((guard, effect))
        })
        .collect::<Result<_, GroundError>>()?;
    let inequalities: Vec<(usize, usize)> = resolve_inequalities(&schema.name, &schema.params, &schema.inequalities)?;
    let domains: Vec<Vec<usize>> = candidate_domains(symbols, analysis, &schema.name, &schema.params, &precondition)?;

    let before: usize = actions.len();
    'bindings: for binding in BindingIter::new(domains) {
        for (a, b) in &inequalities {
            if binding[*a] == binding[*b] {
                continue 'bindings;
            }
        }
        let pre: PartialCondition = match encode_precondition(analysis, init_pos, relevance, &precondition, &binding) {
            Some(pre) => pre,
            None => {
                trace!("Discarding a binding of schema \"{}\": static precondition falsified", schema.name);
                continue 'bindings;
            },
        };

        // Unconditional effects
        let mut effect: PartialCondition = PartialCondition::default();
        for lit in &effects {
            let index: usize = relevance.register_fluent(Fluent::new(lit.predicate, lit.args.iter().map(|a| a.bind(&binding))));
            effect.add(lit.positive, index);
        }

        // Conditional effects; a statically falsified guard kills the pair, a statically
        // satisfied-and-empty guard promotes the pair to unconditional
        let mut pairs: Vec<(PartialCondition, PartialCondition)> = Vec::with_capacity(cond_effects.len());
        'pairs: for (guard_lits, effect_lits) in &cond_effects {
            let guard: PartialCondition = match encode_precondition(analysis, init_pos, relevance, guard_lits, &binding) {
                Some(guard) => guard,
                None => continue 'pairs,
            };
            let mut eff: PartialCondition = PartialCondition::default();
            for lit in effect_lits {
                let index: usize = relevance.register_fluent(Fluent::new(lit.predicate, lit.args.iter().map(|a| a.bind(&binding))));
                eff.add(lit.positive, index);
            }
            if guard.is_empty() {
                effect.pos.extend(eff.pos);
                effect.neg.extend(eff.neg);
            } else {
                pairs.push((guard, eff));
            }
        }

        trace!("Grounded an instance of schema \"{}\"", schema.name);
        actions.push(PartialAction {
            name,
            params: binding.into_iter().map(Some).collect(),
            precondition: pre,
            effect,
            cond_effects: pairs,
            cost: schema.cost,
            duration: schema.duration,
        });
    }
    debug!("Schema \"{}\" produced {} ground actions", schema.name, actions.len() - before);
    Ok(())
}

/// Grounds one method schema into the buffer.
fn ground_method_schema(
    symbols: &SymbolTables,
    analysis: &TypeAnalysis,
    init_pos: &IndexSet<Fluent>,
    relevance: &mut RelevanceTable,
    schema: &MethodSchema,
    methods: &mut Vec<PartialMethod>,
) -> Result<(), GroundError> {
    // Resolve the schema once
    let precondition: Vec<ResolvedLiteral> =
        schema.precondition.iter().map(|l| resolve_literal(symbols, &schema.name, &schema.params, l)).collect::<Result<_, GroundError>>()?;
    let task: ResolvedTaskRef = resolve_task_ref(symbols, &schema.name, &schema.params, &schema.task)?;
    let subtasks: Vec<ResolvedTaskRef> =
        schema.network.subtasks.iter().map(|t| resolve_task_ref(symbols, &schema.name, &schema.params, t)).collect::<Result<_, GroundError>>()?;
    let inequalities: Vec<(usize, usize)> = resolve_inequalities(&schema.name, &schema.params, &schema.inequalities)?;
    let domains: Vec<Vec<usize>> = candidate_domains(symbols, analysis, &schema.name, &schema.params, &precondition)?;

    let before: usize = methods.len();
    'bindings: for binding in BindingIter::new(domains) {
        for (a, b) in &inequalities {
            if binding[*a] == binding[*b] {
                continue 'bindings;
            }
        }
        let pre: PartialCondition = match encode_precondition(analysis, init_pos, relevance, &precondition, &binding) {
            Some(pre) => pre,
            None => {
                trace!("Discarding a binding of schema \"{}\": static precondition falsified", schema.name);
                continue 'bindings;
            },
        };

        // Substitute the achieved task and the subtask network template
        let task: usize = relevance.register_task(Task::new(task.symbol, task.args.iter().map(|a| a.bind(&binding))));
        let mut builder: TaskNetworkBuilder = TaskNetworkBuilder::new();
        for subtask in &subtasks {
            builder.add_task(relevance.register_task(Task::new(subtask.symbol, subtask.args.iter().map(|a| a.bind(&binding)))));
        }
        for (before, after) in &schema.network.orderings {
            builder.order(*before, *after);
        }
        let network: TaskNetwork = builder.build().map_err(|err| GroundError::Network { schema: Some(schema.name.clone()), err })?;

        trace!("Grounded an instance of schema \"{}\"", schema.name);
        methods.push(PartialMethod { name: schema.name.clone(), params: binding.into_iter().map(Some).collect(), task, precondition: pre, network });
    }
    debug!("Schema \"{}\" produced {} ground methods", schema.name, methods.len() - before);
    Ok(())
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::inertia::Inertia;
    use crate::tests::{blocks_input, htn_input, make_ground_lit};


    #[test]
    fn test_blocks_grounds_exactly_two_pickups() {
        // One type `block` over {a, b}; `pickup(?x)` requires and deletes `clear(?x)`
        let problem: Problem = ground(&blocks_input()).unwrap();
        let symbols: &SymbolTables = problem.symbols();

        assert_eq!(problem.actions().len(), 2);
        let clear: usize = symbols.predicate_index("clear").unwrap();
        assert_eq!(problem.predicate_inertia(clear), Inertia::DeleteOnly);

        // The relevant-fluent table is exactly {clear(a), clear(b)}
        let a: usize = symbols.constant_index("a").unwrap();
        let b: usize = symbols.constant_index("b").unwrap();
        assert_eq!(problem.fluents(), &[Fluent::new(clear, [a]), Fluent::new(clear, [b])]);

        // Both instances require their own fluent and delete it
        for (action, arg) in problem.actions().iter().zip([a, b]) {
            assert_eq!(action.params(), &[Some(arg)]);
            assert_eq!(action.precondition().pos.iter_ones().collect::<Vec<usize>>(), vec![arg]);
            assert!(action.precondition().neg.is_empty());
            assert_eq!(action.effect().neg.iter_ones().collect::<Vec<usize>>(), vec![arg]);
            assert!(action.effect().pos.is_empty());
            assert_eq!(action.cost(), 1.0);
        }
    }

    #[test]
    fn test_nonstatic_precondition_does_not_prune() {
        // `clear` is delete-only, not static; `clear(a)=false` initially must still ground both
        // bindings (static pruning is not reachability analysis)
        let mut input: ProblemInput = blocks_input();
        input.init = vec![make_ground_lit(false, "clear", ["a"]), make_ground_lit(true, "clear", ["b"])];
        let problem: Problem = ground(&input).unwrap();
        assert_eq!(problem.actions().len(), 2);
        let clear: usize = problem.symbols().predicate_index("clear").unwrap();
        let a: usize = problem.symbols().constant_index("a").unwrap();
        let clear_a: usize = problem.fluents().iter().position(|f| f == &Fluent::new(clear, [a])).unwrap();
        assert_eq!(problem.init().truth(clear_a), Some(false));
    }

    #[test]
    fn test_static_precondition_prunes_bindings() {
        // Add a static guard `heavy(?x)` that only `a` satisfies initially
        let mut input: ProblemInput = blocks_input();
        input.domain.predicates.push(crate::input::PredicateDecl::new("heavy", ["block"]));
        input.domain.actions[0].precondition.push(Literal::positive("heavy", [Term::var("x")]));
        input.init.push(make_ground_lit(true, "heavy", ["a"]));

        let problem: Problem = ground(&input).unwrap();
        assert_eq!(problem.actions().len(), 1);
        assert_eq!(problem.actions()[0].params(), &[Some(problem.symbols().constant_index("a").unwrap())]);
        // The satisfied static literal is simplified out of the precondition
        let clear: usize = problem.symbols().predicate_index("clear").unwrap();
        assert_eq!(problem.fluents().iter().filter(|f| f.predicate != clear).count(), 1, "only the init fact heavy(a) may survive");
    }

    #[test]
    fn test_inequality_constraints_filter_bindings() {
        let mut input: ProblemInput = blocks_input();
        input.domain.predicates.push(crate::input::PredicateDecl::new("on", ["block", "block"]));
        let mut stack = ActionSchema::new("stack", [crate::input::Parameter::new("x", "block"), crate::input::Parameter::new("y", "block")]);
        stack.inequalities = vec![("x".into(), "y".into())];
        stack.effects = vec![Literal::positive("on", [Term::var("x"), Term::var("y")])];
        input.domain.actions.push(stack);

        let problem: Problem = ground(&input).unwrap();
        let stacks: usize = problem.actions().iter().filter(|a| problem.symbols().task_name(a.name()) == "stack").count();
        assert_eq!(stacks, 2);
    }

    #[test]
    fn test_goal_encoding_and_static_contradiction() {
        // A dynamic goal literal encodes normally
        let mut input: ProblemInput = blocks_input();
        input.goal = Some(vec![make_ground_lit(false, "clear", ["a"])]);
        let problem: Problem = ground(&input).unwrap();
        let a: usize = problem.symbols().constant_index("a").unwrap();
        assert_eq!(problem.goal().unwrap().truth(a), Some(false));
        assert!(problem.is_solvable());

        // A statically contradicted goal collapses to None; unsolvable without a network
        let mut input: ProblemInput = blocks_input();
        input.domain.predicates.push(crate::input::PredicateDecl::new("broken", ["block"]));
        input.goal = Some(vec![make_ground_lit(true, "broken", ["a"])]);
        let problem: Problem = ground(&input).unwrap();
        assert!(problem.goal().is_none());
        assert!(!problem.is_solvable());
    }

    #[test]
    fn test_htn_methods_and_relevant_operators() {
        // Compound `fetch(?x)` decomposes into primitive `pickup(?x)`; initial network [fetch(a)]
        let problem: Problem = ground(&htn_input()).unwrap();
        let symbols: &SymbolTables = problem.symbols();
        assert!(problem.is_hierarchical());
        assert_eq!(problem.methods().len(), 2);

        let fetch: usize = symbols.task_index("fetch").unwrap();
        let pickup: usize = symbols.task_index("pickup").unwrap();
        let a: usize = symbols.constant_index("a").unwrap();

        // The initial network holds exactly fetch(a)
        let network: &TaskNetwork = problem.initial_network().unwrap();
        assert_eq!(network.len(), 1);
        assert_eq!(problem.tasks()[network.tasks()[0]], Task::new(fetch, [a]));

        // fetch(a) is decomposed by the method bound to a; pickup(a) achieved by the action on a
        for (index, task) in problem.tasks().iter().enumerate() {
            let ops: &[usize] = problem.relevant_operators(index);
            assert_eq!(ops.len(), 1, "task {} should have exactly one relevant operator", task.display(symbols));
            if task.symbol == fetch {
                assert_eq!(problem.methods()[ops[0]].task(), index);
            } else {
                assert_eq!(task.symbol, pickup);
                assert_eq!(problem.actions()[ops[0]].params(), task.args.iter().map(|a| Some(*a)).collect::<Vec<Option<usize>>>().as_slice());
            }
        }
        assert!(problem.unachievable_tasks().is_empty());
    }

    #[test]
    fn test_cyclic_method_network_is_fatal() {
        let mut input: ProblemInput = htn_input();
        input.domain.methods[0].network.orderings = vec![(0, 0)];
        assert!(matches!(ground(&input).unwrap_err(), GroundError::Network { schema: Some(_), err: NetworkError::CyclicOrderingConstraint { .. } }));
    }

    #[test]
    fn test_arity_mismatch_is_fatal() {
        let mut input: ProblemInput = blocks_input();
        input.domain.actions[0].precondition.push(Literal::positive("clear", [Term::var("x"), Term::var("x")]));
        assert!(matches!(
            ground(&input).unwrap_err(),
            GroundError::Schema { err: SymbolError::ArityMismatch { declared: 1, used: 2, .. }, .. }
        ));
    }

    #[test]
    fn test_unknown_type_is_fatal() {
        let mut input: ProblemInput = blocks_input();
        input.domain.actions[0].params[0].r#type = "pyramid".into();
        assert!(matches!(ground(&input).unwrap_err(), GroundError::Schema { err: SymbolError::UnknownTypeReference { .. }, .. }));
    }

    #[test]
    fn test_variable_in_ground_context_is_fatal() {
        let mut input: ProblemInput = blocks_input();
        input.init.push(Literal::positive("clear", [Term::var("x")]));
        assert!(matches!(ground(&input).unwrap_err(), GroundError::VariableInGroundContext { .. }));
    }

    #[test]
    fn test_deep_copy_is_structurally_independent() {
        let problem: Problem = ground(&blocks_input()).unwrap();
        let mut copy: Problem = problem.clone();

        // Flip a bit in the copy's initial state; the original must be bitwise unchanged
        let b: usize = problem.symbols().constant_index("b").unwrap();
        copy.init_mut().assert_false(b);
        assert_eq!(problem.init().truth(b), Some(true));
        assert_eq!(copy.init().truth(b), Some(false));
    }

    #[test]
    fn test_cyclic_type_hierarchy_is_fatal() {
        let mut input: ProblemInput = blocks_input();
        input.domain.types = vec![crate::input::TypeDecl::subtype("block", "thing"), crate::input::TypeDecl::subtype("thing", "block")];
        assert!(matches!(ground(&input).unwrap_err(), GroundError::Symbol(SymbolError::CyclicTypeHierarchy { .. })));
    }

    #[test]
    fn test_conditional_effect_pair_encoding_and_inertia() {
        // `mark(?x)` adds `marked(?x)` only when `clear(?x)` holds; `clear` is non-static, so the
        // pair must survive as an encoded (guard, effect) pair
        let mut input: ProblemInput = blocks_input();
        input.domain.predicates.push(crate::input::PredicateDecl::new("marked", ["block"]));
        let mut mark = ActionSchema::new("mark", [crate::input::Parameter::new("x", "block")]);
        mark.cond_effects = vec![crate::input::CondEffect {
            guard:  vec![Literal::positive("clear", [Term::var("x")])],
            effect: vec![Literal::positive("marked", [Term::var("x")])],
        }];
        input.domain.actions.push(mark);

        let problem: Problem = ground(&input).unwrap();
        let symbols: &SymbolTables = problem.symbols();
        let clear: usize = symbols.predicate_index("clear").unwrap();
        let marked: usize = symbols.predicate_index("marked").unwrap();
        // A predicate occurring only in a conditional positive effect is add-only
        assert_eq!(problem.predicate_inertia(marked), Inertia::AddOnly);

        let a: usize = symbols.constant_index("a").unwrap();
        let mark_a: &GroundAction =
            problem.actions().iter().find(|ga| symbols.task_name(ga.name()) == "mark" && ga.params() == [Some(a)]).unwrap();
        let clear_a: usize = problem.fluents().iter().position(|f| f == &Fluent::new(clear, [a])).unwrap();
        let marked_a: usize = problem.fluents().iter().position(|f| f == &Fluent::new(marked, [a])).unwrap();
        assert!(mark_a.effect().pos.is_empty() && mark_a.effect().neg.is_empty());
        assert_eq!(mark_a.conditional_effects().len(), 1);
        let (guard, effect): &(Condition, Condition) = &mark_a.conditional_effects()[0];
        assert_eq!(guard.pos.iter_ones().collect::<Vec<usize>>(), vec![clear_a]);
        assert!(guard.neg.is_empty());
        assert_eq!(effect.pos.iter_ones().collect::<Vec<usize>>(), vec![marked_a]);
        assert!(effect.neg.is_empty());
    }

    #[test]
    fn test_static_guard_promotes_or_drops_conditional_effect() {
        // `jolt(?x)` deletes `clear(?x)` only when static `fragile(?x)` holds, and only
        // `fragile(a)` does. The satisfied guard simplifies to empty and promotes the pair to an
        // unconditional effect; the falsified guard kills the pair outright
        let mut input: ProblemInput = blocks_input();
        input.domain.predicates.push(crate::input::PredicateDecl::new("fragile", ["block"]));
        let mut jolt = ActionSchema::new("jolt", [crate::input::Parameter::new("x", "block")]);
        jolt.cond_effects = vec![crate::input::CondEffect {
            guard:  vec![Literal::positive("fragile", [Term::var("x")])],
            effect: vec![Literal::negative("clear", [Term::var("x")])],
        }];
        input.domain.actions.push(jolt);
        input.init.push(make_ground_lit(true, "fragile", ["a"]));

        let problem: Problem = ground(&input).unwrap();
        let symbols: &SymbolTables = problem.symbols();
        let clear: usize = symbols.predicate_index("clear").unwrap();
        let a: usize = symbols.constant_index("a").unwrap();
        let b: usize = symbols.constant_index("b").unwrap();
        let jolt_a: &GroundAction =
            problem.actions().iter().find(|ga| symbols.task_name(ga.name()) == "jolt" && ga.params() == [Some(a)]).unwrap();
        let jolt_b: &GroundAction =
            problem.actions().iter().find(|ga| symbols.task_name(ga.name()) == "jolt" && ga.params() == [Some(b)]).unwrap();

        // jolt(a): the emptied guard promoted the delete to the unconditional effect
        let clear_a: usize = problem.fluents().iter().position(|f| f == &Fluent::new(clear, [a])).unwrap();
        assert!(jolt_a.conditional_effects().is_empty());
        assert_eq!(jolt_a.effect().neg.iter_ones().collect::<Vec<usize>>(), vec![clear_a]);
        assert!(jolt_a.effect().pos.is_empty());

        // jolt(b): the pair is gone entirely, leaving a no-op instance
        assert!(jolt_b.conditional_effects().is_empty());
        assert!(jolt_b.effect().pos.is_empty() && jolt_b.effect().neg.is_empty());
    }

    #[test]
    fn test_empty_schema_contributes_nothing() {
        // A schema whose static guard nothing satisfies grounds zero operators, without error
        let mut input: ProblemInput = blocks_input();
        input.domain.predicates.push(crate::input::PredicateDecl::new("winged", ["block"]));
        input.domain.actions[0].precondition.push(Literal::positive("winged", [Term::var("x")]));
        let problem: Problem = ground(&input).unwrap();
        assert!(problem.actions().is_empty());
    }
}
