// src/noyau/erreur.rs
//
// Erreurs du noyau.
// - Syntax  : lecture du texte (jetons, grammaire, parenthèses)
// - Binding : variable sans valeur / valeur illisible
// - Domain  : calcul indéfini (division par zéro, log(0), asin(2) réel…)

use std::fmt;

use thiserror::Error;

/// Position dans le texte source (octets, fin exclue).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span d’un seul caractère (ou d’une fin de texte).
    pub fn at(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexé pour l’humain
        if self.end > self.start + 1 {
            write!(f, "positions {}-{}", self.start + 1, self.end)
        } else {
            write!(f, "position {}", self.start + 1)
        }
    }
}

fn suffixe_span(span: &Option<Span>) -> String {
    match span {
        Some(s) => format!(" ({s})"),
        None => String::new(),
    }
}

#[derive(Error, Clone, Debug, PartialEq)]
pub enum FormulaError {
    #[error("erreur de syntaxe : {msg}{}", suffixe_span(.span))]
    Syntax { msg: String, span: Option<Span> },

    #[error("variable '{name}' : {msg}")]
    Binding { name: String, msg: String },

    #[error("erreur de domaine : {0}")]
    Domain(String),
}

impl FormulaError {
    pub fn syntax(msg: impl Into<String>, span: Span) -> Self {
        FormulaError::Syntax {
            msg: msg.into(),
            span: Some(span),
        }
    }

    pub fn syntax_sans_position(msg: impl Into<String>) -> Self {
        FormulaError::Syntax {
            msg: msg.into(),
            span: None,
        }
    }

    pub fn binding(name: impl Into<String>, msg: impl Into<String>) -> Self {
        FormulaError::Binding {
            name: name.into(),
            msg: msg.into(),
        }
    }

    pub fn domain(msg: impl Into<String>) -> Self {
        FormulaError::Domain(msg.into())
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, FormulaError::Syntax { .. })
    }

    pub fn is_binding(&self) -> bool {
        matches!(self, FormulaError::Binding { .. })
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, FormulaError::Domain(_))
    }
}

pub type Result<T> = std::result::Result<T, FormulaError>;
