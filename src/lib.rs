//! formule_mp : formules en précision arbitraire
//!
//! Lit une expression (`"2*asin(x)*i"`), puis l’évalue ou la dérive pour des
//! valeurs de variables données en texte, à une précision choisie
//! (16 à 8192 chiffres significatifs), réels et complexes compris.
//!
//! ```
//! use formule_mp::{Bindings, Formula, Notation};
//!
//! let f = Formula::with_precision("2*asin(x)", 32)?;
//! let x = Bindings::from([("x", "1")]);
//! assert_eq!(f.get_formatted(&x, 5, Notation::Default)?, "3.1416");
//! assert_eq!(f.get_derivative("x", &Bindings::from([("x", "0")]))?, "2");
//! # Ok::<(), formule_mp::FormulaError>(())
//! ```

pub mod noyau;

pub use noyau::{
    BigNumber, Bindings, ComplexValue, Formula, FormulaError, FormulaOptions, Notation, Result,
    Span, UnboundPolicy, DEFAULT_PRECISION, GUARD_DIGITS, MAX_PRECISION, PRECISION_TIERS,
};
