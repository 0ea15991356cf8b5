//! Noyau multiprécision
//!
//! Organisation interne :
//! - erreur.rs         : FormulaError + Span
//! - nombre.rs         : BigNumber (décimal, zéro signé, nan/inf, chiffres de garde)
//! - transcendantes.rs : π, e, exp, ln, trig (entiers scalés) + caches
//! - complexe.rs       : ComplexValue + drapeau de contamination
//! - jetons.rs         : tokenisation
//! - syntaxe.rs        : descente récursive -> Expr
//! - expr.rs           : AST, Fonction, Constante
//! - eval.rs           : évaluation, Bindings, variables sans valeur
//! - derivee.rs        : dérivation symbolique
//! - format.rs         : affichage (Default / Fixed / Scientific)
//! - formule.rs        : façade Formula

pub mod complexe;
pub mod derivee;
pub mod erreur;
pub mod eval;
pub mod expr;
pub mod format;
pub mod formule;
pub mod jetons;
pub mod nombre;
pub mod syntaxe;
pub mod transcendantes;

#[cfg(test)]
mod tests_scientifiques;

#[cfg(test)]
mod tests_fuzz_safe;


// API publique minimale
pub use complexe::ComplexValue;
pub use erreur::{FormulaError, Result, Span};
pub use eval::{Bindings, UnboundPolicy};
pub use format::Notation;
pub use formule::{
    Formula, FormulaOptions, DEFAULT_PRECISION, GUARD_DIGITS, MAX_PRECISION, PRECISION_TIERS,
};
pub use nombre::BigNumber;
