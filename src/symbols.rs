//  SYMBOLS.rs
//    by Lut99
//
//  Created:
//    14 Mar 2025, 11:30:19
//  Last edited:
//    04 Apr 2025, 09:48:02
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the symbol table manager: dense, stable, zero-based integer
//!   indices for types, constants, predicates, functions and tasks, plus the
//!   argument-type signature of everything that takes arguments.
//!
//!   An index, once handed out, is permanent for the lifetime of the compiled
//!   problem; nothing here ever reorders or reuses one. Registration is
//!   idempotent: re-registering a name in the same category returns the
//!   original index.
//

use std::error;
use std::fmt::{Display, Formatter, Result as FResult};

use indexmap::IndexSet;


/***** ERRORS *****/
/// The category a symbol (or lookup failure) belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolKind {
    /// A type symbol.
    Type,
    /// A constant symbol.
    Constant,
    /// A predicate symbol.
    Predicate,
    /// A function symbol.
    Function,
    /// A task symbol.
    Task,
}
impl Display for SymbolKind {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Type => write!(f, "type"),
            Self::Constant => write!(f, "constant"),
            Self::Predicate => write!(f, "predicate"),
            Self::Function => write!(f, "function"),
            Self::Task => write!(f, "task"),
        }
    }
}

/// Defines errors occurring while registering or resolving symbols.
///
/// All of these are fatal for the compilation as a whole (spec-side input is malformed).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SymbolError {
    /// A signature or declaration referenced a type that was never declared.
    UnknownTypeReference { symbol: String, r#type: String },
    /// A symbol was used with a different arity than its declared signature.
    ArityMismatch { symbol: String, declared: usize, used: usize },
    /// A use site referenced a symbol that was never declared.
    UnknownSymbol { kind: SymbolKind, name: String },
    /// A subtype declaration would make the type hierarchy cyclic.
    CyclicTypeHierarchy { r#type: String },
}
impl Display for SymbolError {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::UnknownTypeReference { symbol, r#type } => write!(f, "Symbol \"{symbol}\" references unknown type \"{type}\""),
            Self::ArityMismatch { symbol, declared, used } => {
                write!(f, "Symbol \"{symbol}\" is declared with arity {declared} but used with arity {used}")
            },
            Self::UnknownSymbol { kind, name } => write!(f, "Unknown {kind} symbol \"{name}\""),
            Self::CyclicTypeHierarchy { r#type } => write!(f, "Declaring type \"{type}\" a subtype here would make the type hierarchy cyclic"),
        }
    }
}
impl error::Error for SymbolError {}





/***** LIBRARY *****/
/// The symbol tables of a compiled problem.
///
/// Holds one insertion-ordered name table per category, argument-type signatures for predicates,
/// functions and tasks, the declared type of every constant and the (single-inheritance) type
/// hierarchy. Positions in the tables are the permanent indices used by every other part of the
/// crate.
#[derive(Clone, Debug, Default)]
pub struct SymbolTables {
    /// The table of type symbols.
    types: IndexSet<String>,
    /// The parent of every type, if any (same index space as `types`).
    type_parents: Vec<Option<usize>>,
    /// The table of constant symbols.
    constants: IndexSet<String>,
    /// The declared type of every constant (same index space as `constants`).
    constant_types: Vec<usize>,
    /// The table of predicate symbols.
    predicates: IndexSet<String>,
    /// The argument-type signature of every predicate.
    predicate_signatures: Vec<Vec<usize>>,
    /// The table of function symbols.
    functions: IndexSet<String>,
    /// The argument-type signature of every function.
    function_signatures: Vec<Vec<usize>>,
    /// The table of task symbols. Contains both primitive tasks (action names) and compound ones.
    tasks: IndexSet<String>,
    /// The argument-type signature of every task.
    task_signatures: Vec<Vec<usize>>,
    /// Whether every task symbol is primitive (i.e., the name of an action schema).
    task_primitive: Vec<bool>,
}

// Constructors
impl SymbolTables {
    /// Creates a new, empty set of symbol tables.
    ///
    /// # Returns
    /// A SymbolTables with every category empty.
    #[inline]
    pub fn new() -> Self { Self::default() }
}

// Registration
impl SymbolTables {
    /// Registers a type symbol.
    ///
    /// # Arguments
    /// - `name`: The name of the type.
    ///
    /// # Returns
    /// The dense index of the type; the existing one if it was already registered.
    pub fn register_type(&mut self, name: &str) -> usize {
        match self.types.get_index_of(name) {
            Some(index) => index,
            None => {
                let (index, _): (usize, bool) = self.types.insert_full(name.into());
                self.type_parents.push(None);
                index
            },
        }
    }

    /// Declares a subtype relation between two already-registered types.
    ///
    /// # Arguments
    /// - `child`: The name of the subtype.
    /// - `parent`: The name of the supertype.
    ///
    /// # Errors
    /// This function errors with [`SymbolError::UnknownTypeReference`] if either type was never
    /// registered, or with [`SymbolError::CyclicTypeHierarchy`] if the declaration would close a
    /// cycle in the hierarchy (a type declared a subtype of itself included).
    pub fn declare_subtype(&mut self, child: &str, parent: &str) -> Result<(), SymbolError> {
        let child_ix: usize =
            self.types.get_index_of(child).ok_or_else(|| SymbolError::UnknownTypeReference { symbol: child.into(), r#type: child.into() })?;
        let parent_ix: usize =
            self.types.get_index_of(parent).ok_or_else(|| SymbolError::UnknownTypeReference { symbol: child.into(), r#type: parent.into() })?;

        // Walk the new parent's ancestor chain; reaching the child means the declaration would
        // close a cycle. The existing hierarchy is acyclic (this check is the only gate on it),
        // so the walk terminates.
        let mut current: Option<usize> = Some(parent_ix);
        while let Some(ancestor) = current {
            if ancestor == child_ix {
                return Err(SymbolError::CyclicTypeHierarchy { r#type: child.into() });
            }
            current = self.type_parents[ancestor];
        }

        self.type_parents[child_ix] = Some(parent_ix);
        Ok(())
    }

    /// Registers a constant symbol with its declared type.
    ///
    /// # Arguments
    /// - `name`: The name of the constant.
    /// - `r#type`: The name of its declared type.
    ///
    /// # Returns
    /// The dense index of the constant; the existing one if it was already registered.
    ///
    /// # Errors
    /// This function errors with [`SymbolError::UnknownTypeReference`] if the type was never
    /// registered.
    pub fn register_constant(&mut self, name: &str, r#type: &str) -> Result<usize, SymbolError> {
        let type_ix: usize =
            self.types.get_index_of(r#type).ok_or_else(|| SymbolError::UnknownTypeReference { symbol: name.into(), r#type: r#type.into() })?;
        match self.constants.get_index_of(name) {
            Some(index) => Ok(index),
            None => {
                let (index, _): (usize, bool) = self.constants.insert_full(name.into());
                self.constant_types.push(type_ix);
                Ok(index)
            },
        }
    }

    /// Registers a predicate symbol with its argument-type signature.
    ///
    /// # Arguments
    /// - `name`: The name of the predicate.
    /// - `signature`: The names of the argument types, one per argument position.
    ///
    /// # Returns
    /// The dense index of the predicate; the existing one if it was already registered.
    ///
    /// # Errors
    /// This function errors with [`SymbolError::UnknownTypeReference`] if any signature type was
    /// never registered.
    pub fn register_predicate(&mut self, name: &str, signature: &[String]) -> Result<usize, SymbolError> {
        let sig: Vec<usize> = self.resolve_signature(name, signature)?;
        match self.predicates.get_index_of(name) {
            Some(index) => Ok(index),
            None => {
                let (index, _): (usize, bool) = self.predicates.insert_full(name.into());
                self.predicate_signatures.push(sig);
                Ok(index)
            },
        }
    }

    /// Registers a function symbol with its argument-type signature.
    ///
    /// # Arguments
    /// - `name`: The name of the function.
    /// - `signature`: The names of the argument types, one per argument position.
    ///
    /// # Returns
    /// The dense index of the function; the existing one if it was already registered.
    ///
    /// # Errors
    /// This function errors with [`SymbolError::UnknownTypeReference`] if any signature type was
    /// never registered.
    pub fn register_function(&mut self, name: &str, signature: &[String]) -> Result<usize, SymbolError> {
        let sig: Vec<usize> = self.resolve_signature(name, signature)?;
        match self.functions.get_index_of(name) {
            Some(index) => Ok(index),
            None => {
                let (index, _): (usize, bool) = self.functions.insert_full(name.into());
                self.function_signatures.push(sig);
                Ok(index)
            },
        }
    }

    /// Registers a task symbol with its argument-type signature.
    ///
    /// # Arguments
    /// - `name`: The name of the task.
    /// - `signature`: The names of the argument types, one per argument position.
    /// - `primitive`: Whether this task is primitive (the name of an action schema) or compound
    ///   (decomposed by methods).
    ///
    /// # Returns
    /// The dense index of the task; the existing one if it was already registered.
    ///
    /// # Errors
    /// This function errors with [`SymbolError::UnknownTypeReference`] if any signature type was
    /// never registered.
    pub fn register_task(&mut self, name: &str, signature: &[String], primitive: bool) -> Result<usize, SymbolError> {
        let sig: Vec<usize> = self.resolve_signature(name, signature)?;
        match self.tasks.get_index_of(name) {
            Some(index) => Ok(index),
            None => {
                let (index, _): (usize, bool) = self.tasks.insert_full(name.into());
                self.task_signatures.push(sig);
                self.task_primitive.push(primitive);
                Ok(index)
            },
        }
    }

    /// Resolves a list of type names into type indices.
    fn resolve_signature(&self, symbol: &str, signature: &[String]) -> Result<Vec<usize>, SymbolError> {
        signature
            .iter()
            .map(|t| self.types.get_index_of(t.as_str()).ok_or_else(|| SymbolError::UnknownTypeReference { symbol: symbol.into(), r#type: t.clone() }))
            .collect()
    }
}

// Lookups
impl SymbolTables {
    /// Resolves a type name to its index.
    ///
    /// # Arguments
    /// - `name`: The name to resolve.
    ///
    /// # Returns
    /// The type's index, or [`None`] if it was never registered.
    #[inline]
    pub fn type_index(&self, name: &str) -> Option<usize> { self.types.get_index_of(name) }

    /// Resolves a constant name to its index.
    ///
    /// # Arguments
    /// - `name`: The name to resolve.
    ///
    /// # Returns
    /// The constant's index, or [`None`] if it was never registered.
    #[inline]
    pub fn constant_index(&self, name: &str) -> Option<usize> { self.constants.get_index_of(name) }

    /// Resolves a predicate name to its index.
    ///
    /// # Arguments
    /// - `name`: The name to resolve.
    ///
    /// # Returns
    /// The predicate's index, or [`None`] if it was never registered.
    #[inline]
    pub fn predicate_index(&self, name: &str) -> Option<usize> { self.predicates.get_index_of(name) }

    /// Resolves a function name to its index.
    ///
    /// # Arguments
    /// - `name`: The name to resolve.
    ///
    /// # Returns
    /// The function's index, or [`None`] if it was never registered.
    #[inline]
    pub fn function_index(&self, name: &str) -> Option<usize> { self.functions.get_index_of(name) }

    /// Resolves a task name to its index.
    ///
    /// # Arguments
    /// - `name`: The name to resolve.
    ///
    /// # Returns
    /// The task's index, or [`None`] if it was never registered.
    #[inline]
    pub fn task_index(&self, name: &str) -> Option<usize> { self.tasks.get_index_of(name) }
}

// Accessors
impl SymbolTables {
    /// Returns the name of a type.
    ///
    /// # Panics
    /// This function panics if the index is out-of-range.
    #[inline]
    #[track_caller]
    pub fn type_name(&self, index: usize) -> &str { self.types.get_index(index).unwrap_or_else(|| panic!("Type index {index} out of range")) }

    /// Returns the name of a constant.
    ///
    /// # Panics
    /// This function panics if the index is out-of-range.
    #[inline]
    #[track_caller]
    pub fn constant_name(&self, index: usize) -> &str {
        self.constants.get_index(index).unwrap_or_else(|| panic!("Constant index {index} out of range"))
    }

    /// Returns the name of a predicate.
    ///
    /// # Panics
    /// This function panics if the index is out-of-range.
    #[inline]
    #[track_caller]
    pub fn predicate_name(&self, index: usize) -> &str {
        self.predicates.get_index(index).unwrap_or_else(|| panic!("Predicate index {index} out of range"))
    }

    /// Returns the name of a function.
    ///
    /// # Panics
    /// This function panics if the index is out-of-range.
    #[inline]
    #[track_caller]
    pub fn function_name(&self, index: usize) -> &str {
        self.functions.get_index(index).unwrap_or_else(|| panic!("Function index {index} out of range"))
    }

    /// Returns the name of a task.
    ///
    /// # Panics
    /// This function panics if the index is out-of-range.
    #[inline]
    #[track_caller]
    pub fn task_name(&self, index: usize) -> &str { self.tasks.get_index(index).unwrap_or_else(|| panic!("Task index {index} out of range")) }

    /// Returns the argument-type signature of a predicate.
    #[inline]
    pub fn predicate_signature(&self, index: usize) -> &[usize] { &self.predicate_signatures[index] }

    /// Returns the argument-type signature of a function.
    #[inline]
    pub fn function_signature(&self, index: usize) -> &[usize] { &self.function_signatures[index] }

    /// Returns the argument-type signature of a task.
    #[inline]
    pub fn task_signature(&self, index: usize) -> &[usize] { &self.task_signatures[index] }

    /// Returns whether a task symbol is primitive (the name of an action schema).
    #[inline]
    pub fn task_is_primitive(&self, index: usize) -> bool { self.task_primitive[index] }

    /// Returns the declared type of a constant.
    #[inline]
    pub fn constant_type(&self, index: usize) -> usize { self.constant_types[index] }

    /// Returns the parent type of a type, if it has one.
    #[inline]
    pub fn type_parent(&self, index: usize) -> Option<usize> { self.type_parents[index] }

    /// The number of registered types.
    #[inline]
    pub fn num_types(&self) -> usize { self.types.len() }

    /// The number of registered constants.
    #[inline]
    pub fn num_constants(&self) -> usize { self.constants.len() }

    /// The number of registered predicates.
    #[inline]
    pub fn num_predicates(&self) -> usize { self.predicates.len() }

    /// The number of registered functions.
    #[inline]
    pub fn num_functions(&self) -> usize { self.functions.len() }

    /// The number of registered tasks.
    #[inline]
    pub fn num_tasks(&self) -> usize { self.tasks.len() }
}

// Hierarchy queries
impl SymbolTables {
    /// Checks whether one type equals or descends from another.
    ///
    /// # Arguments
    /// - `r#type`: The candidate subtype's index.
    /// - `ancestor`: The candidate supertype's index.
    ///
    /// # Returns
    /// True if `r#type` is `ancestor` or transitively declared a subtype of it.
    pub fn is_subtype_of(&self, r#type: usize, ancestor: usize) -> bool {
        let mut current: usize = r#type;
        loop {
            if current == ancestor {
                return true;
            }
            match self.type_parents[current] {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Returns the indices of all constants whose declared type equals or descends from the given
    /// type.
    ///
    /// # Arguments
    /// - `r#type`: The type index to collect constants for.
    ///
    /// # Returns
    /// An [`Iterator`] over constant indices, in registration order.
    #[inline]
    pub fn constants_of_type(&self, r#type: usize) -> impl '_ + Iterator<Item = usize> {
        self.constant_types.iter().enumerate().filter(move |(_, t)| self.is_subtype_of(**t, r#type)).map(|(c, _)| c)
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn test_register_is_idempotent_and_dense() {
        let mut symbols = SymbolTables::new();
        assert_eq!(symbols.register_type("object"), 0);
        assert_eq!(symbols.register_type("block"), 1);
        assert_eq!(symbols.register_type("object"), 0);
        assert_eq!(symbols.num_types(), 2);

        let a: usize = symbols.register_constant("a", "block").unwrap();
        let b: usize = symbols.register_constant("b", "block").unwrap();
        assert_eq!((a, b), (0, 1));
        assert_eq!(symbols.register_constant("a", "block").unwrap(), 0);
        assert_eq!(symbols.constant_name(1), "b");
    }

    #[test]
    fn test_unknown_type_reference_is_fatal() {
        let mut symbols = SymbolTables::new();
        symbols.register_type("block");
        assert_eq!(
            symbols.register_predicate("on", &["block".into(), "table".into()]),
            Err(SymbolError::UnknownTypeReference { symbol: "on".into(), r#type: "table".into() })
        );
        assert_eq!(
            symbols.register_constant("t1", "table"),
            Err(SymbolError::UnknownTypeReference { symbol: "t1".into(), r#type: "table".into() })
        );
    }

    #[test]
    fn test_signatures() {
        let mut symbols = SymbolTables::new();
        symbols.register_type("block");
        symbols.register_type("gripper");
        let on: usize = symbols.register_predicate("on", &["block".into(), "block".into()]).unwrap();
        assert_eq!(symbols.predicate_signature(on), &[0, 0]);
        let pickup: usize = symbols.register_task("pickup", &["gripper".into(), "block".into()], true).unwrap();
        assert_eq!(symbols.task_signature(pickup), &[1, 0]);
        assert!(symbols.task_is_primitive(pickup));
    }

    #[test]
    fn test_subtype_hierarchy() {
        let mut symbols = SymbolTables::new();
        symbols.register_type("object");
        symbols.register_type("vehicle");
        symbols.register_type("truck");
        symbols.declare_subtype("vehicle", "object").unwrap();
        symbols.declare_subtype("truck", "vehicle").unwrap();

        let object: usize = symbols.type_index("object").unwrap();
        let vehicle: usize = symbols.type_index("vehicle").unwrap();
        let truck: usize = symbols.type_index("truck").unwrap();
        assert!(symbols.is_subtype_of(truck, object));
        assert!(symbols.is_subtype_of(truck, truck));
        assert!(!symbols.is_subtype_of(object, truck));

        symbols.register_constant("t1", "truck").unwrap();
        symbols.register_constant("o1", "object").unwrap();
        assert_eq!(symbols.constants_of_type(object).collect::<Vec<usize>>(), vec![0, 1]);
        assert_eq!(symbols.constants_of_type(vehicle).collect::<Vec<usize>>(), vec![0]);
    }

    #[test]
    fn test_cyclic_subtype_declaration_is_fatal() {
        let mut symbols = SymbolTables::new();
        symbols.register_type("a");
        symbols.register_type("b");
        symbols.declare_subtype("a", "b").unwrap();

        // Closing the 2-cycle must be rejected, not silently recorded
        assert_eq!(symbols.declare_subtype("b", "a"), Err(SymbolError::CyclicTypeHierarchy { r#type: "b".into() }));
        // A type cannot be its own supertype either
        assert_eq!(symbols.declare_subtype("a", "a"), Err(SymbolError::CyclicTypeHierarchy { r#type: "a".into() }));

        // The rejected declarations left the hierarchy intact; chain walks still terminate
        let a: usize = symbols.type_index("a").unwrap();
        let b: usize = symbols.type_index("b").unwrap();
        assert!(symbols.is_subtype_of(a, b));
        assert!(!symbols.is_subtype_of(b, a));
        symbols.register_constant("x", "a").unwrap();
        assert_eq!(symbols.constants_of_type(b).collect::<Vec<usize>>(), vec![0]);
    }
}
