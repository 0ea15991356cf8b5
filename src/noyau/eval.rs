//! Noyau : évaluation d’un arbre
//!
//! Expr + valeurs (texte) -> ComplexValue, à une précision donnée.
//!
//! - les valeurs fournies ne sont lues qu’au besoin (une fois par nom)
//! - une valeur fournie sous le nom d’une constante (`e`, `pi`) la masque
//! - variable sans valeur : erreur ou zéro, selon `UnboundPolicy`

use std::collections::HashMap;

use log::trace;

use super::complexe::ComplexValue;
use super::erreur::{FormulaError, Result};
use super::expr::Expr;
use super::nombre::BigNumber;

/// Valeurs des variables, en texte décimal (`"1e-15"`, `"-inf"`…).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bindings {
    valeurs: HashMap<String, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, nom: impl Into<String>, valeur: impl Into<String>) -> Option<String> {
        self.valeurs.insert(nom.into(), valeur.into())
    }

    pub fn get(&self, nom: &str) -> Option<&str> {
        self.valeurs.get(nom).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.valeurs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valeurs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.valeurs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Recherche, éventuellement insensible à la casse (`nom` déjà en minuscules).
    /// Deux clés de même forme minuscule : la plus petite l’emporte.
    fn cherche(&self, nom: &str, insensible_casse: bool) -> Option<&str> {
        if let Some(v) = self.get(nom) {
            return Some(v);
        }
        if !insensible_casse {
            return None;
        }
        self.valeurs
            .iter()
            .filter(|(k, _)| k.to_lowercase() == nom)
            .min_by(|a, b| a.0.cmp(b.0))
            .map(|(_, v)| v.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Bindings {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            valeurs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Bindings {
    fn from(paires: [(K, V); N]) -> Self {
        paires.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Bindings {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.valeurs
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

/// Variable référencée mais absente des valeurs fournies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnboundPolicy {
    /// Erreur `Binding`.
    #[default]
    Error,
    /// La variable vaut +0.
    Zero,
}

/// Paramètres d’une évaluation.
#[derive(Clone, Copy, Debug)]
pub struct Contexte<'a> {
    pub bindings: &'a Bindings,
    pub precision: usize,
    pub unbound: UnboundPolicy,
    pub insensible_casse: bool,
}

/// Évalue `e` ; l’arbre n’est jamais modifié.
pub fn evalue(e: &Expr, ctx: &Contexte<'_>) -> Result<ComplexValue> {
    let mut ev = Evaluateur {
        ctx,
        lues: HashMap::new(),
    };
    let v = ev.noeud(e)?;
    trace!(
        "évaluation à {} chiffres : complexe={}",
        ctx.precision,
        v.is_complex()
    );
    Ok(v)
}

struct Evaluateur<'a> {
    ctx: &'a Contexte<'a>,
    // valeurs déjà lues (par nom)
    lues: HashMap<String, BigNumber>,
}

impl Evaluateur<'_> {
    fn variable(&mut self, nom: &str) -> Result<Option<BigNumber>> {
        if let Some(v) = self.lues.get(nom) {
            return Ok(Some(v.clone()));
        }
        let Some(texte) = self.ctx.bindings.cherche(nom, self.ctx.insensible_casse) else {
            return Ok(None);
        };
        let v = BigNumber::parse(texte, self.ctx.precision).ok_or_else(|| {
            FormulaError::binding(nom, format!("valeur illisible '{texte}'"))
        })?;
        self.lues.insert(nom.to_string(), v.clone());
        Ok(Some(v))
    }

    fn feuille(&mut self, e: &Expr) -> Result<ComplexValue> {
        use Expr::*;

        let p = self.ctx.precision;
        Ok(match e {
            Num(s) => {
                let v = BigNumber::parse(s, p).ok_or_else(|| {
                    FormulaError::syntax_sans_position(format!("littéral invalide '{s}'"))
                })?;
                ComplexValue::reel(v)
            }
            Var(nom) => match self.variable(nom)? {
                Some(v) => ComplexValue::reel(v),
                None => match self.ctx.unbound {
                    UnboundPolicy::Error => {
                        return Err(FormulaError::binding(nom.as_str(), "aucune valeur fournie"))
                    }
                    UnboundPolicy::Zero => ComplexValue::reel(BigNumber::zero(p)),
                },
            },
            Const(c) => match self.variable(c.name())? {
                Some(v) => ComplexValue::reel(v),
                None => ComplexValue::reel(c.valeur(p)),
            },
            _ => ComplexValue::i(p),
        })
    }

    /// Parcours postfixe à pile explicite : gauche, droite, puis le nœud.
    fn noeud(&mut self, racine: &Expr) -> Result<ComplexValue> {
        use Expr::*;

        enum Tache<'e> {
            Descend(&'e Expr),
            Combine(&'e Expr),
        }

        let mut taches = vec![Tache::Descend(racine)];
        let mut valeurs: Vec<ComplexValue> = Vec::new();
        while let Some(t) = taches.pop() {
            match t {
                Tache::Descend(e) => {
                    if e.est_feuille() {
                        valeurs.push(self.feuille(e)?);
                        continue;
                    }
                    taches.push(Tache::Combine(e));
                    let (a, b) = e.enfants();
                    if let Some(b) = b {
                        taches.push(Tache::Descend(b));
                    }
                    if let Some(a) = a {
                        taches.push(Tache::Descend(a));
                    }
                }
                Tache::Combine(e) => {
                    let v = match e {
                        Neg(_) | Call(..) => {
                            let a = depile(&mut valeurs)?;
                            match e {
                                Call(f, _) => f.evalue(&a)?,
                                _ => a.neg(),
                            }
                        }
                        _ => {
                            let b = depile(&mut valeurs)?;
                            let a = depile(&mut valeurs)?;
                            match e {
                                Add(..) => a.add(&b),
                                Sub(..) => a.sub(&b),
                                Mul(..) => a.mul(&b),
                                Div(..) => a.div(&b)?,
                                Pow(..) => a.pow(&b)?,
                                Rel(r, ..) => r.evalue(&a, &b)?,
                                _ => return Err(interne()),
                            }
                        }
                    };
                    valeurs.push(v);
                }
            }
        }
        depile(&mut valeurs)
    }
}

fn depile(valeurs: &mut Vec<ComplexValue>) -> Result<ComplexValue> {
    valeurs.pop().ok_or_else(interne)
}

fn interne() -> FormulaError {
    FormulaError::syntax_sans_position("arbre mal formé")
}
