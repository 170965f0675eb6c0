//  INERTIA.rs
//    by Lut99
//
//  Created:
//    18 Mar 2025, 15:40:27
//  Last edited:
//    10 Apr 2025, 11:18:50
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the type-domain and inertia analysis that runs before
//!   grounding.
//!
//!   Per type, it collects the set of constants that may legally bind to a
//!   parameter of that type (the type's own constants plus those of all
//!   subtypes). Per predicate, it classifies how the predicate can change
//!   across effects: a predicate that never occurs in any effect is *static*,
//!   one that only occurs positively is *add-only*, one that only occurs
//!   negatively *delete-only*, and anything else *dynamic*.
//!
//!   On top of that it derives *inferred domains* from unary static
//!   predicates: such a predicate acts as a type guard, and the set of
//!   constants for which it holds initially can replace the declared type
//!   domain of a guarded parameter during grounding. This narrowing is what
//!   keeps the binding cross-product tractable on realistic inputs; skipping
//!   it would still be correct, only slower.
//

use std::fmt::{Display, Formatter, Result as FResult};

use indexmap::IndexSet;
use log::debug;

use crate::input::{CondEffect, Domain, Literal};
use crate::state::Fluent;
use crate::symbols::{SymbolError, SymbolKind, SymbolTables};


/***** LIBRARY *****/
/// The mutability classification of a predicate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Inertia {
    /// The predicate occurs in no effect; its truth is fixed by the initial state.
    Static,
    /// The predicate occurs only in positive effects; once true, it stays true.
    AddOnly,
    /// The predicate occurs only in negative effects; once false, it stays false.
    DeleteOnly,
    /// The predicate occurs in both positive and negative effects.
    Dynamic,
}
impl Inertia {
    /// Folds one more effect occurrence into the classification.
    ///
    /// # Arguments
    /// - `positive`: The polarity of the occurrence.
    ///
    /// # Returns
    /// The updated classification.
    #[inline]
    pub fn note_effect(self, positive: bool) -> Self {
        match (self, positive) {
            (Self::Static, true) | (Self::AddOnly, true) => Self::AddOnly,
            (Self::Static, false) | (Self::DeleteOnly, false) => Self::DeleteOnly,
            _ => Self::Dynamic,
        }
    }

    /// Checks whether this classification is [`Inertia::Static`].
    ///
    /// # Returns
    /// True for static predicates only.
    #[inline]
    pub const fn is_static(&self) -> bool { matches!(self, Self::Static) }
}
impl Display for Inertia {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Static => write!(f, "static"),
            Self::AddOnly => write!(f, "add-only"),
            Self::DeleteOnly => write!(f, "delete-only"),
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}



/// The result of the pre-grounding analysis: type domains, inferred domains and inertia.
///
/// All tables are keyed by the stable indices of the [`SymbolTables`] this was computed against.
#[derive(Clone, Debug)]
pub struct TypeAnalysis {
    /// Per type, the constants that may bind to a parameter of that type.
    domains: Vec<IndexSet<usize>>,
    /// Per type, the narrowings derived from unary static predicates: pairs of the guarding
    /// predicate and the constants for which it holds initially (within the declared domain).
    inferred_domains: Vec<Vec<(usize, IndexSet<usize>)>>,
    /// Per predicate, its inertia classification.
    inertia: Vec<Inertia>,
}

// Analysis
impl TypeAnalysis {
    /// Runs the analysis over a domain.
    ///
    /// # Arguments
    /// - `symbols`: The fully-populated [`SymbolTables`] of the domain.
    /// - `domain`: The lifted [`Domain`], scanned for effect occurrences.
    /// - `init_pos`: The set of fluents asserted true by the initial state, used to compute
    ///   inferred domains.
    ///
    /// # Returns
    /// The computed [`TypeAnalysis`].
    ///
    /// # Errors
    /// This function errors with a [`SymbolError`] if an effect references an undeclared
    /// predicate.
    pub fn analyze(symbols: &SymbolTables, domain: &Domain, init_pos: &IndexSet<Fluent>) -> Result<Self, SymbolError> {
        // Type domains: every constant whose declared type equals or descends from the type
        let domains: Vec<IndexSet<usize>> = (0..symbols.num_types()).map(|t| symbols.constants_of_type(t).collect()).collect();

        // Inertia: fold every effect occurrence of every action schema
        let mut inertia: Vec<Inertia> = vec![Inertia::Static; symbols.num_predicates()];
        for schema in &domain.actions {
            for lit in &schema.effects {
                Self::note_literal(symbols, &mut inertia, lit)?;
            }
            for CondEffect { effect, .. } in &schema.cond_effects {
                for lit in effect {
                    Self::note_literal(symbols, &mut inertia, lit)?;
                }
            }
        }

        // Inferred domains: unary static predicates act as type guards
        let mut inferred_domains: Vec<Vec<(usize, IndexSet<usize>)>> = vec![Vec::new(); symbols.num_types()];
        for pred in 0..symbols.num_predicates() {
            let signature: &[usize] = symbols.predicate_signature(pred);
            if signature.len() != 1 || !inertia[pred].is_static() {
                continue;
            }
            let r#type: usize = signature[0];
            let extension: IndexSet<usize> = domains[r#type].iter().copied().filter(|c| init_pos.contains(&Fluent::new(pred, [*c]))).collect();
            debug!(
                "Inferred domain for type \"{}\" from unary static predicate \"{}\": {}/{} constants",
                symbols.type_name(r#type),
                symbols.predicate_name(pred),
                extension.len(),
                domains[r#type].len()
            );
            inferred_domains[r#type].push((pred, extension));
        }

        Ok(Self { domains, inferred_domains, inertia })
    }

    /// Folds one effect literal into the inertia table.
    fn note_literal(symbols: &SymbolTables, inertia: &mut [Inertia], lit: &Literal) -> Result<(), SymbolError> {
        let pred: usize = symbols
            .predicate_index(&lit.predicate)
            .ok_or_else(|| SymbolError::UnknownSymbol { kind: SymbolKind::Predicate, name: lit.predicate.clone() })?;
        inertia[pred] = inertia[pred].note_effect(lit.positive);
        Ok(())
    }
}

// Accessors
impl TypeAnalysis {
    /// Returns the constants that may bind to a parameter of the given type.
    #[inline]
    pub fn domain(&self, r#type: usize) -> &IndexSet<usize> { &self.domains[r#type] }

    /// Returns all per-type domains.
    #[inline]
    pub fn domains(&self) -> &[IndexSet<usize>] { &self.domains }

    /// Returns the unary-static narrowings known for the given type, as pairs of the guarding
    /// predicate and its initial extension.
    #[inline]
    pub fn inferred_domains(&self, r#type: usize) -> &[(usize, IndexSet<usize>)] { &self.inferred_domains[r#type] }

    /// Returns the inertia classification of the given predicate.
    #[inline]
    pub fn predicate_inertia(&self, predicate: usize) -> Inertia { self.inertia[predicate] }

    /// Returns the whole inertia table, keyed by predicate index.
    #[inline]
    pub fn inertia(&self) -> &[Inertia] { &self.inertia }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ActionSchema, ConstDecl, Parameter, PredicateDecl, Term, TypeDecl};


    /// Builds a little domain with one of each inertia class.
    fn inertia_domain() -> (SymbolTables, Domain) {
        let mut symbols = SymbolTables::new();
        symbols.register_type("block");
        symbols.register_constant("a", "block").unwrap();
        symbols.register_constant("b", "block").unwrap();
        for name in ["fixed", "grows", "shrinks", "churns"] {
            symbols.register_predicate(name, &["block".into()]).unwrap();
        }

        let mut schema = ActionSchema::new("act", [Parameter::new("x", "block")]);
        schema.precondition = vec![Literal::positive("fixed", [Term::var("x")])];
        schema.effects = vec![
            Literal::positive("grows", [Term::var("x")]),
            Literal::negative("shrinks", [Term::var("x")]),
            Literal::positive("churns", [Term::var("x")]),
            Literal::negative("churns", [Term::var("x")]),
        ];

        let domain = Domain {
            types: vec![TypeDecl::new("block")],
            constants: vec![ConstDecl::new("a", "block"), ConstDecl::new("b", "block")],
            predicates: vec![
                PredicateDecl::new("fixed", ["block"]),
                PredicateDecl::new("grows", ["block"]),
                PredicateDecl::new("shrinks", ["block"]),
                PredicateDecl::new("churns", ["block"]),
            ],
            actions: vec![schema],
            ..Domain::default()
        };
        (symbols, domain)
    }


    #[test]
    fn test_inertia_classification() {
        let (symbols, domain) = inertia_domain();
        let analysis = TypeAnalysis::analyze(&symbols, &domain, &IndexSet::new()).unwrap();
        assert_eq!(analysis.predicate_inertia(symbols.predicate_index("fixed").unwrap()), Inertia::Static);
        assert_eq!(analysis.predicate_inertia(symbols.predicate_index("grows").unwrap()), Inertia::AddOnly);
        assert_eq!(analysis.predicate_inertia(symbols.predicate_index("shrinks").unwrap()), Inertia::DeleteOnly);
        assert_eq!(analysis.predicate_inertia(symbols.predicate_index("churns").unwrap()), Inertia::Dynamic);
    }

    #[test]
    fn test_conditional_effects_count_toward_inertia() {
        let (symbols, mut domain) = inertia_domain();
        domain.actions[0].cond_effects = vec![CondEffect {
            guard:  vec![Literal::positive("fixed", [Term::var("x")])],
            effect: vec![Literal::negative("grows", [Term::var("x")])],
        }];

        let analysis = TypeAnalysis::analyze(&symbols, &domain, &IndexSet::new()).unwrap();
        // `grows` is added unconditionally and deleted conditionally, so it churns now
        assert_eq!(analysis.predicate_inertia(symbols.predicate_index("grows").unwrap()), Inertia::Dynamic);
        // A guard is a condition, not an effect; `fixed` stays static
        assert_eq!(analysis.predicate_inertia(symbols.predicate_index("fixed").unwrap()), Inertia::Static);
    }

    #[test]
    fn test_type_domains_include_subtypes() {
        let mut symbols = SymbolTables::new();
        symbols.register_type("object");
        symbols.register_type("truck");
        symbols.declare_subtype("truck", "object").unwrap();
        symbols.register_constant("t1", "truck").unwrap();
        symbols.register_constant("o1", "object").unwrap();

        let analysis = TypeAnalysis::analyze(&symbols, &Domain::default(), &IndexSet::new()).unwrap();
        let object: usize = symbols.type_index("object").unwrap();
        let truck: usize = symbols.type_index("truck").unwrap();
        assert_eq!(analysis.domain(object).iter().copied().collect::<Vec<usize>>(), vec![0, 1]);
        assert_eq!(analysis.domain(truck).iter().copied().collect::<Vec<usize>>(), vec![0]);
    }

    #[test]
    fn test_inferred_domain_from_unary_static() {
        let (symbols, domain) = inertia_domain();
        let fixed: usize = symbols.predicate_index("fixed").unwrap();
        let a: usize = symbols.constant_index("a").unwrap();

        // Initially only `fixed(a)` holds, so the guard narrows `block` to {a}
        let init_pos: IndexSet<Fluent> = IndexSet::from([Fluent::new(fixed, [a])]);
        let analysis = TypeAnalysis::analyze(&symbols, &domain, &init_pos).unwrap();
        let block: usize = symbols.type_index("block").unwrap();
        let narrowings: &[(usize, IndexSet<usize>)] = analysis.inferred_domains(block);
        assert_eq!(narrowings.len(), 1);
        assert_eq!(narrowings[0].0, fixed);
        assert_eq!(narrowings[0].1.iter().copied().collect::<Vec<usize>>(), vec![a]);
    }

    #[test]
    fn test_unknown_effect_predicate_is_fatal() {
        let (symbols, mut domain) = inertia_domain();
        domain.actions[0].effects.push(Literal::positive("phantom", [Term::var("x")]));
        assert_eq!(
            TypeAnalysis::analyze(&symbols, &domain, &IndexSet::new()).unwrap_err(),
            SymbolError::UnknownSymbol { kind: SymbolKind::Predicate, name: "phantom".into() }
        );
    }
}
