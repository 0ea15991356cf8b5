//! Noyau : façade `Formula`
//!
//! texte -> (jetons -> Expr) une fois, puis évaluations / dérivées à la demande.
//!
//! - l’arbre est partagé (`Arc`) : `copy()` ne duplique que les petits champs
//! - la précision demandée est bornée à [0, 8192] puis montée au palier supérieur
//! - options (unité imaginaire, casse, variables sans valeur) figées à la construction

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, warn};

use super::complexe::ComplexValue;
use super::derivee::derive;
use super::erreur::Result;
use super::eval::{evalue, Bindings, Contexte, UnboundPolicy};
use super::expr::Expr;
use super::format::{formate, Notation};
use super::nombre::GARDE;
use super::syntaxe::{parse, verifie_unite, OptionsLecture};

pub const DEFAULT_PRECISION: usize = 24;
pub const MAX_PRECISION: usize = 8192;
pub const GUARD_DIGITS: usize = GARDE;

/// Paliers de précision effectivement utilisés.
pub const PRECISION_TIERS: [usize; 18] = [
    16, 24, 32, 48, 64, 96, 128, 192, 256, 384, 512, 768, 1024, 2048, 3072, 4096, 6144, 8192,
];

/// Plus petit palier >= p (p déjà borné).
fn palier(p: usize) -> usize {
    PRECISION_TIERS
        .into_iter()
        .find(|&t| t >= p)
        .unwrap_or(MAX_PRECISION)
}

/// Options figées à la construction d’une formule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormulaOptions {
    pub imaginary_unit: String,
    pub case_insensitive: bool,
    pub unbound: UnboundPolicy,
}

impl Default for FormulaOptions {
    fn default() -> Self {
        Self {
            imaginary_unit: "i".to_string(),
            case_insensitive: false,
            unbound: UnboundPolicy::Error,
        }
    }
}

impl FormulaOptions {
    pub fn with_imaginary_unit(mut self, unite: impl Into<String>) -> Self {
        self.imaginary_unit = unite.into();
        self
    }

    pub fn case_insensitive(mut self, oui: bool) -> Self {
        self.case_insensitive = oui;
        self
    }

    pub fn unbound(mut self, politique: UnboundPolicy) -> Self {
        self.unbound = politique;
        self
    }

    fn lecture(&self) -> OptionsLecture<'_> {
        OptionsLecture {
            unite: &self.imaginary_unit,
            insensible_casse: self.case_insensitive,
        }
    }
}

/// Texte de valeur pour un flottant (aller-retour exact, non finis compris).
fn texte_flottant(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        let s = if x < 0.0 { "-inf" } else { "inf" };
        s.to_string()
    } else {
        format!("{x:e}")
    }
}

#[derive(Clone, Debug)]
pub struct Formula {
    texte: String,
    ast: Arc<Expr>,
    demandee: usize,
    precision: usize,
    options: FormulaOptions,
}

impl Formula {
    /* ------------------------ Construction ------------------------ */

    pub fn new(expression: &str) -> Result<Self> {
        Self::with_precision(expression, DEFAULT_PRECISION)
    }

    pub fn with_precision(expression: &str, precision: usize) -> Result<Self> {
        Self::with_options(expression, precision, FormulaOptions::default())
    }

    pub fn with_options(expression: &str, precision: usize, options: FormulaOptions) -> Result<Self> {
        verifie_unite(&options.imaginary_unit)?;
        let ast = parse(expression, &options.lecture())?;

        let mut f = Self {
            texte: expression.to_string(),
            ast: Arc::new(ast),
            demandee: 0,
            precision: 0,
            options,
        };
        f.set_precision(precision);
        Ok(f)
    }

    /// Copie indépendante (l’arbre immuable reste partagé).
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /* ------------------------ Expression ------------------------ */

    pub fn expression(&self) -> &str {
        &self.texte
    }

    /// Relit le texte ; en cas d’erreur la formule reste inchangée.
    pub fn set_expression(&mut self, expression: &str) -> Result<()> {
        let ast = parse(expression, &self.options.lecture())?;
        self.ast = Arc::new(ast);
        self.texte = expression.to_string();
        Ok(())
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    pub fn options(&self) -> &FormulaOptions {
        &self.options
    }

    /// Variables libres (sans fonctions, constantes ni unité imaginaire).
    pub fn variables(&self) -> HashSet<String> {
        self.ast.variables().into_iter().collect()
    }

    /* ------------------------ Précision ------------------------ */

    /// Palier effectif.
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Précision demandée, après bornage.
    pub fn requested_precision(&self) -> usize {
        self.demandee
    }

    pub fn set_precision(&mut self, precision: usize) {
        if precision > MAX_PRECISION {
            warn!("précision {precision} ramenée à {MAX_PRECISION}");
        }
        self.demandee = precision.min(MAX_PRECISION);
        self.precision = palier(self.demandee);
        debug!("précision demandée {} -> palier {}", self.demandee, self.precision);
    }

    /* ------------------------ Évaluation ------------------------ */

    fn contexte<'a>(&self, bindings: &'a Bindings) -> Contexte<'a> {
        Contexte {
            bindings,
            precision: self.precision,
            unbound: self.options.unbound,
            insensible_casse: self.options.case_insensitive,
        }
    }

    /// Valeur brute (non formatée).
    pub fn value(&self, bindings: &Bindings) -> Result<ComplexValue> {
        evalue(&self.ast, &self.contexte(bindings))
    }

    /// Valeur formatée : `precision()` chiffres significatifs, notation par défaut.
    pub fn get(&self, bindings: &Bindings) -> Result<String> {
        self.get_formatted(bindings, self.precision, Notation::Default)
    }

    /// `chiffres` est ramené à `MAX_PRECISION` ; 0 garde tous les chiffres.
    pub fn get_formatted(&self, bindings: &Bindings, chiffres: usize, notation: Notation) -> Result<String> {
        Ok(formate(&self.value(bindings)?, chiffres.min(MAX_PRECISION), notation))
    }

    /// Valeurs flottantes : chaque f64 devient son écriture décimale la plus courte.
    pub fn get_from_float<K, I>(&self, valeurs: I) -> Result<String>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        let bindings: Bindings = valeurs
            .into_iter()
            .map(|(k, x)| (k, texte_flottant(x)))
            .collect();
        self.get(&bindings)
    }

    /* ------------------------ Dérivées ------------------------ */

    /// Arbre de d/d(var) ; `var` est replié en minuscules si la casse est ignorée.
    pub fn derivative(&self, var: &str) -> Expr {
        let var = if self.options.case_insensitive {
            var.to_lowercase()
        } else {
            var.to_string()
        };
        let d = derive(&self.ast, &var);
        debug!("dérivée par rapport à {var} : {} nœuds", d.nb_noeuds());
        d
    }

    pub fn get_derivative(&self, var: &str, bindings: &Bindings) -> Result<String> {
        self.get_derivative_formatted(var, bindings, self.precision, Notation::Default)
    }

    pub fn get_derivative_formatted(
        &self,
        var: &str,
        bindings: &Bindings,
        chiffres: usize,
        notation: Notation,
    ) -> Result<String> {
        let d = self.derivative(var);
        let v = evalue(&d, &self.contexte(bindings))?;
        Ok(formate(&v, chiffres.min(MAX_PRECISION), notation))
    }

    /// Une dérivée par nom, dans l’ordre donné.
    pub fn get_derivatives<S: AsRef<str>>(
        &self,
        vars: &[S],
        bindings: &Bindings,
        chiffres: usize,
        notation: Notation,
    ) -> Result<Vec<String>> {
        vars.iter()
            .map(|v| self.get_derivative_formatted(v.as_ref(), bindings, chiffres, notation))
            .collect()
    }
}
