//  INPUT.rs
//    by Lut99
//
//  Created:
//    14 Mar 2025, 13:05:51
//  Last edited:
//    07 Apr 2025, 10:12:36
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the typed, lifted input model handed over by the parsing
//!   collaborator.
//!
//!   Everything here is plain, name-based data: types with a subtype
//!   hierarchy, constants with declared types, predicate/function/task
//!   signatures, operator schemas, an initial-state literal list, an optional
//!   goal and an optional initial task network. Quantifiers and disjunction
//!   are assumed to be expanded away by the caller; preconditions, guards and
//!   effects are conjunctions of literals.
//

use std::fmt::{Display, Formatter, Result as FResult};


/***** LIBRARY *****/
/// A term in a literal or task reference: either a schema variable or a constant.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Term {
    /// A reference to a schema parameter by name.
    Var(String),
    /// A reference to a constant by name.
    Const(String),
}
impl Term {
    /// Convenience constructor for a variable term.
    #[inline]
    pub fn var(name: impl Into<String>) -> Self { Self::Var(name.into()) }

    /// Convenience constructor for a constant term.
    #[inline]
    pub fn constant(name: impl Into<String>) -> Self { Self::Const(name.into()) }
}
impl Display for Term {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Var(name) => write!(f, "?{name}"),
            Self::Const(name) => write!(f, "{name}"),
        }
    }
}



/// A (possibly negated) application of a predicate to terms.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Literal {
    /// The name of the predicate.
    pub predicate: String,
    /// The arguments, one per predicate parameter.
    pub args: Vec<Term>,
    /// The polarity: true for the atom itself, false for its negation.
    pub positive: bool,
}
impl Literal {
    /// Convenience constructor for a positive literal.
    ///
    /// # Arguments
    /// - `predicate`: The name of the predicate.
    /// - `args`: The argument terms.
    ///
    /// # Returns
    /// A new positive Literal.
    #[inline]
    pub fn positive(predicate: impl Into<String>, args: impl IntoIterator<Item = Term>) -> Self {
        Self { predicate: predicate.into(), args: args.into_iter().collect(), positive: true }
    }

    /// Convenience constructor for a negative literal.
    ///
    /// # Arguments
    /// - `predicate`: The name of the predicate.
    /// - `args`: The argument terms.
    ///
    /// # Returns
    /// A new negative Literal.
    #[inline]
    pub fn negative(predicate: impl Into<String>, args: impl IntoIterator<Item = Term>) -> Self {
        Self { predicate: predicate.into(), args: args.into_iter().collect(), positive: false }
    }
}



/// A conditional effect: a guard conjunction plus the effect literals it enables.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CondEffect {
    /// The literals that must hold for the effect to trigger.
    pub guard:  Vec<Literal>,
    /// The literals applied when the guard holds.
    pub effect: Vec<Literal>,
}

/// A typed formal parameter of an operator schema.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Parameter {
    /// The variable name (without any `?` sigil).
    pub name:   String,
    /// The name of the parameter's type.
    pub r#type: String,
}
impl Parameter {
    /// Convenience constructor.
    #[inline]
    pub fn new(name: impl Into<String>, r#type: impl Into<String>) -> Self { Self { name: name.into(), r#type: r#type.into() } }
}

/// A lifted action schema.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionSchema {
    /// The name of the schema. Doubles as its primitive-task symbol.
    pub name: String,
    /// The typed formal parameters.
    pub params: Vec<Parameter>,
    /// Pairs of parameter names that must bind to distinct constants.
    pub inequalities: Vec<(String, String)>,
    /// The precondition, a conjunction of literals.
    pub precondition: Vec<Literal>,
    /// The unconditional effect literals.
    pub effects: Vec<Literal>,
    /// The conditional effects.
    pub cond_effects: Vec<CondEffect>,
    /// The cost of applying any instance of this schema.
    pub cost: f64,
    /// The duration of any instance of this schema, if the domain declares one.
    pub duration: Option<f64>,
}
impl ActionSchema {
    /// Creates a new ActionSchema with no constraints, no effects, unit cost and no duration.
    ///
    /// # Arguments
    /// - `name`: The name of the schema.
    /// - `params`: The typed formal parameters.
    ///
    /// # Returns
    /// A new, mostly-empty ActionSchema to fill in further.
    #[inline]
    pub fn new(name: impl Into<String>, params: impl IntoIterator<Item = Parameter>) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().collect(),
            inequalities: vec![],
            precondition: vec![],
            effects: vec![],
            cond_effects: vec![],
            cost: 1.0,
            duration: None,
        }
    }
}



/// A reference to a task with argument terms, as it occurs in network templates.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TaskRef {
    /// The name of the task symbol.
    pub task: String,
    /// The argument terms.
    pub args: Vec<Term>,
}
impl TaskRef {
    /// Convenience constructor.
    #[inline]
    pub fn new(task: impl Into<String>, args: impl IntoIterator<Item = Term>) -> Self { Self { task: task.into(), args: args.into_iter().collect() } }
}

/// A lifted task network template: subtask references plus ordering constraints.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct NetworkSchema {
    /// The subtask references, in declaration order.
    pub subtasks:  Vec<TaskRef>,
    /// Ordering constraints as `(before, after)` pairs of positions into `subtasks`.
    pub orderings: Vec<(usize, usize)>,
}

/// A lifted method schema, decomposing a compound task into a subtask network.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodSchema {
    /// The name of the schema.
    pub name: String,
    /// The typed formal parameters.
    pub params: Vec<Parameter>,
    /// Pairs of parameter names that must bind to distinct constants.
    pub inequalities: Vec<(String, String)>,
    /// The precondition, a conjunction of literals.
    pub precondition: Vec<Literal>,
    /// The compound task this method decomposes.
    pub task: TaskRef,
    /// The subtask network template.
    pub network: NetworkSchema,
}



/// A type declaration, possibly with a parent in the hierarchy.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TypeDecl {
    /// The name of the type.
    pub name:   String,
    /// The name of the supertype, if any.
    pub parent: Option<String>,
}
impl TypeDecl {
    /// Convenience constructor for a parentless type.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self { Self { name: name.into(), parent: None } }

    /// Convenience constructor for a subtype.
    #[inline]
    pub fn subtype(name: impl Into<String>, parent: impl Into<String>) -> Self { Self { name: name.into(), parent: Some(parent.into()) } }
}

/// A constant declaration with its type.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ConstDecl {
    /// The name of the constant.
    pub name:   String,
    /// The name of its declared type.
    pub r#type: String,
}
impl ConstDecl {
    /// Convenience constructor.
    #[inline]
    pub fn new(name: impl Into<String>, r#type: impl Into<String>) -> Self { Self { name: name.into(), r#type: r#type.into() } }
}

/// A predicate declaration with its argument types.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PredicateDecl {
    /// The name of the predicate.
    pub name:   String,
    /// The argument type names, one per position.
    pub params: Vec<String>,
}
impl PredicateDecl {
    /// Convenience constructor.
    #[inline]
    pub fn new(name: impl Into<String>, params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { name: name.into(), params: params.into_iter().map(Into::into).collect() }
    }
}

/// A function declaration with its argument types.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FunctionDecl {
    /// The name of the function.
    pub name:   String,
    /// The argument type names, one per position.
    pub params: Vec<String>,
}

/// A compound-task declaration with its argument types.
///
/// Primitive tasks need no declaration; every action schema implicitly declares one under its own
/// name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TaskDecl {
    /// The name of the task.
    pub name:   String,
    /// The argument type names, one per position.
    pub params: Vec<String>,
}
impl TaskDecl {
    /// Convenience constructor.
    #[inline]
    pub fn new(name: impl Into<String>, params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { name: name.into(), params: params.into_iter().map(Into::into).collect() }
    }
}



/// A complete lifted domain: declarations plus operator schemas.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Domain {
    /// The type declarations.
    pub types: Vec<TypeDecl>,
    /// The constant declarations.
    pub constants: Vec<ConstDecl>,
    /// The predicate declarations.
    pub predicates: Vec<PredicateDecl>,
    /// The function declarations.
    pub functions: Vec<FunctionDecl>,
    /// The compound-task declarations.
    pub tasks: Vec<TaskDecl>,
    /// The action schemas.
    pub actions: Vec<ActionSchema>,
    /// The method schemas.
    pub methods: Vec<MethodSchema>,
}

/// A complete lifted problem: a domain plus an initial state and an objective.
///
/// At least one of `goal` and `initial_network` should be present for the compiled problem to be
/// meaningful: a goal alone makes a classical problem, an initial network alone a hierarchical
/// one, and both may coexist.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProblemInput {
    /// The lifted domain.
    pub domain: Domain,
    /// The initial-state literals. Positive literals assert truth, negative ones assert falsity;
    /// anything unmentioned is unknown. All terms must be constants.
    pub init: Vec<Literal>,
    /// The goal, a conjunction of ground literals, if this is a (partly) classical problem.
    pub goal: Option<Vec<Literal>>,
    /// The initial task network, if this is a (partly) hierarchical problem. All subtask terms
    /// must be constants.
    pub initial_network: Option<NetworkSchema>,
}
