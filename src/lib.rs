//  LIB.rs
//    by Lut99
//
//  Created:
//    14 Mar 2025, 12:58:11
//  Last edited:
//    17 Apr 2025, 15:44:20
//  Auto updated?
//    Yes
//
//  Description:
//!   A grounding compiler for typed, lifted planning problems: turns
//!   operator schemas, an initial state and an objective (a goal, an
//!   initial task network, or both) into a fully instantiated
//!   [`Problem`](problem::Problem) whose states, preconditions and effects
//!   are encoded as bitsets over the relevant-fluent universe.
//!
//!   The entry point is [`ground()`](ground::ground()).
//

// Declare modules
pub mod bits;
pub mod ground;
pub mod inertia;
pub mod input;
pub mod network;
pub mod problem;
pub mod state;
pub mod symbols;
