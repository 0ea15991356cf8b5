// src/noyau/expr.rs
//
// AST (immuable, partagé en lecture par l’évaluation et la dérivation).
// - Num   : littéral gardé en texte (lu à la précision de l’évaluation)
// - Var   : variable libre
// - Const : pi / e (une valeur fournie sous le même nom les masque)
// - Imag  : unité imaginaire
// - Neg, Add, Sub, Mul, Div, Pow, Call
// - Rel   : | & = < > (vaut 1 ou 0)
//
// Destruction sans récursion : une chaîne `1+1+…` de longueur quelconque
// ne consomme pas la pile.
// Fonction : liste fermée ; chaque fonction porte sa règle d’évaluation
// ET sa dérivée extérieure f'(u) (les deux matchs sont exhaustifs).

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::mem;

use super::complexe::ComplexValue;
use super::erreur::{FormulaError, Result};
use super::nombre::BigNumber;
use super::transcendantes as tr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fonction {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Log,
    Sqrt,
    Abs,
}

impl Fonction {
    pub const TOUTES: [Fonction; 13] = [
        Fonction::Sin,
        Fonction::Cos,
        Fonction::Tan,
        Fonction::Asin,
        Fonction::Acos,
        Fonction::Atan,
        Fonction::Sinh,
        Fonction::Cosh,
        Fonction::Tanh,
        Fonction::Exp,
        Fonction::Log,
        Fonction::Sqrt,
        Fonction::Abs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Fonction::Sin => "sin",
            Fonction::Cos => "cos",
            Fonction::Tan => "tan",
            Fonction::Asin => "asin",
            Fonction::Acos => "acos",
            Fonction::Atan => "atan",
            Fonction::Sinh => "sinh",
            Fonction::Cosh => "cosh",
            Fonction::Tanh => "tanh",
            Fonction::Exp => "exp",
            Fonction::Log => "log",
            Fonction::Sqrt => "sqrt",
            Fonction::Abs => "abs",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::TOUTES.into_iter().find(|f| f.name() == name)
    }

    /// Règle d’évaluation.
    pub fn evalue(self, z: &ComplexValue) -> Result<ComplexValue> {
        match self {
            Fonction::Sin => z.sin(),
            Fonction::Cos => z.cos(),
            Fonction::Tan => z.tan(),
            Fonction::Asin => z.asin(),
            Fonction::Acos => z.acos(),
            Fonction::Atan => z.atan(),
            Fonction::Sinh => z.sinh(),
            Fonction::Cosh => z.cosh(),
            Fonction::Tanh => z.tanh(),
            Fonction::Exp => z.exp(),
            Fonction::Log => z.log(),
            Fonction::Sqrt => z.sqrt(),
            Fonction::Abs => z.abs(),
        }
    }

    /// Dérivée extérieure f'(u) ; la règle de chaîne multiplie par u'.
    pub fn derivee(self, u: &Expr) -> Expr {
        use Expr as E;

        let appel = |f: Fonction| E::appel(f, u.clone());
        let un_moins_u2 = || E::difference(E::entier(1), E::puissance(u.clone(), E::entier(2)));

        match self {
            Fonction::Sin => appel(Fonction::Cos),
            Fonction::Cos => E::neg(appel(Fonction::Sin)),
            // 1/cos(u)^2
            Fonction::Tan => E::quotient(
                E::entier(1),
                E::puissance(appel(Fonction::Cos), E::entier(2)),
            ),
            // 1/sqrt(1-u^2)
            Fonction::Asin => E::quotient(E::entier(1), E::appel(Fonction::Sqrt, un_moins_u2())),
            Fonction::Acos => E::neg(E::quotient(
                E::entier(1),
                E::appel(Fonction::Sqrt, un_moins_u2()),
            )),
            // 1/(1+u^2)
            Fonction::Atan => E::quotient(
                E::entier(1),
                E::somme(E::entier(1), E::puissance(u.clone(), E::entier(2))),
            ),
            Fonction::Sinh => appel(Fonction::Cosh),
            Fonction::Cosh => appel(Fonction::Sinh),
            Fonction::Tanh => E::quotient(
                E::entier(1),
                E::puissance(appel(Fonction::Cosh), E::entier(2)),
            ),
            Fonction::Exp => appel(Fonction::Exp),
            Fonction::Log => E::quotient(E::entier(1), u.clone()),
            // 1/(2*sqrt(u))
            Fonction::Sqrt => E::quotient(
                E::entier(1),
                E::produit(E::entier(2), appel(Fonction::Sqrt)),
            ),
            // u/abs(u)
            Fonction::Abs => E::quotient(u.clone(), appel(Fonction::Abs)),
        }
    }
}

/// Opérateurs de comparaison et de logique, du plus lâche au plus serré.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    Ou,
    Et,
    Egal,
    Inf,
    Sup,
}

impl Relation {
    pub fn symbole(self) -> &'static str {
        match self {
            Relation::Ou => "|",
            Relation::Et => "&",
            Relation::Egal => "=",
            Relation::Inf => "<",
            Relation::Sup => ">",
        }
    }

    fn priorite(self) -> u8 {
        match self {
            Relation::Ou => 1,
            Relation::Et => 2,
            Relation::Egal => 3,
            Relation::Inf | Relation::Sup => 4,
        }
    }

    /// 1 ou 0 ; `=` compare à la précision nominale, `<` et `>` exigent des réels.
    pub fn evalue(self, a: &ComplexValue, b: &ComplexValue) -> Result<ComplexValue> {
        let complexe = a.is_complex() || b.is_complex();
        let egal = a.re == b.re && a.im == b.im;
        let vrai = match self {
            Relation::Ou => !a.is_zero() || !b.is_zero(),
            Relation::Et => !a.is_zero() && !b.is_zero(),
            Relation::Egal => egal,
            Relation::Inf | Relation::Sup => {
                if complexe {
                    return Err(FormulaError::domain(format!(
                        "comparaison '{}' entre valeurs complexes",
                        self.symbole()
                    )));
                }
                let voulu = if self == Relation::Inf {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                !egal && a.re.partial_cmp(&b.re) == Some(voulu)
            }
        };
        Ok(ComplexValue::booleen(vrai, a.precision(), complexe))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Constante {
    Pi,
    E,
}

impl Constante {
    pub fn name(self) -> &'static str {
        match self {
            Constante::Pi => "pi",
            Constante::E => "e",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pi" | "π" => Some(Constante::Pi),
            "e" => Some(Constante::E),
            _ => None,
        }
    }

    pub fn valeur(self, precision: usize) -> BigNumber {
        match self {
            Constante::Pi => tr::pi(precision),
            Constante::E => tr::e(precision),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Num(String),
    Var(String),
    Const(Constante),
    Imag,

    Neg(Box<Expr>),

    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),

    Call(Fonction, Box<Expr>),

    Rel(Relation, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub(crate) fn est_feuille(&self) -> bool {
        matches!(self, Expr::Num(_) | Expr::Var(_) | Expr::Const(_) | Expr::Imag)
    }

    /// Sort les sous-arbres non triviaux (remplacés par `Imag`) vers `pile`.
    fn detache(&mut self, pile: &mut Vec<Expr>) {
        use Expr::*;
        let mut prend = |b: &mut Box<Expr>| {
            if !b.est_feuille() {
                pile.push(mem::replace(&mut **b, Imag));
            }
        };
        match self {
            Num(_) | Var(_) | Const(_) | Imag => {}
            Neg(a) | Call(_, a) => prend(a),
            Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) | Pow(a, b) | Rel(_, a, b) => {
                prend(a);
                prend(b);
            }
        }
    }
}

impl Drop for Expr {
    fn drop(&mut self) {
        let mut pile = Vec::new();
        self.detache(&mut pile);
        while let Some(mut e) = pile.pop() {
            e.detache(&mut pile);
        }
    }
}

/// Mantisse d’un littéral faite uniquement de zéros ("0", "0.0", ".0e5").
fn litteral_nul(s: &str) -> bool {
    let mantisse = s.split(['e', 'E']).next().unwrap_or(s);
    mantisse.chars().all(|c| c == '0' || c == '.')
}

impl Expr {
    /* ------------------------ Constructeurs simplifiés ------------------------ */
    // Simplifications locales seulement (0 et 1), sans heuristiques.

    pub fn entier(n: u64) -> Expr {
        Expr::Num(n.to_string())
    }

    pub fn est_zero(&self) -> bool {
        matches!(self, Expr::Num(s) if litteral_nul(s))
    }

    pub fn est_un(&self) -> bool {
        matches!(self, Expr::Num(s) if s == "1")
    }

    pub fn neg(mut a: Expr) -> Expr {
        if a.est_zero() {
            return a;
        }
        if let Expr::Neg(x) = &mut a {
            return mem::replace(&mut **x, Expr::Imag);
        }
        Expr::Neg(Box::new(a))
    }

    pub fn somme(a: Expr, b: Expr) -> Expr {
        if a.est_zero() {
            return b;
        }
        if b.est_zero() {
            return a;
        }
        Expr::Add(Box::new(a), Box::new(b))
    }

    pub fn difference(a: Expr, b: Expr) -> Expr {
        if b.est_zero() {
            return a;
        }
        if a.est_zero() {
            return Expr::neg(b);
        }
        Expr::Sub(Box::new(a), Box::new(b))
    }

    pub fn produit(a: Expr, b: Expr) -> Expr {
        if a.est_zero() || b.est_zero() {
            return Expr::entier(0);
        }
        if a.est_un() {
            return b;
        }
        if b.est_un() {
            return a;
        }
        Expr::Mul(Box::new(a), Box::new(b))
    }

    pub fn quotient(a: Expr, b: Expr) -> Expr {
        if a.est_zero() {
            return Expr::entier(0);
        }
        if b.est_un() {
            return a;
        }
        Expr::Div(Box::new(a), Box::new(b))
    }

    pub fn puissance(a: Expr, b: Expr) -> Expr {
        if b.est_zero() {
            return Expr::entier(1);
        }
        if b.est_un() {
            return a;
        }
        Expr::Pow(Box::new(a), Box::new(b))
    }

    pub fn appel(f: Fonction, a: Expr) -> Expr {
        Expr::Call(f, Box::new(a))
    }

    /* ------------------------ Parcours (itératifs) ------------------------ */

    pub(crate) fn enfants(&self) -> (Option<&Expr>, Option<&Expr>) {
        use Expr::*;
        match self {
            Num(_) | Var(_) | Const(_) | Imag => (None, None),
            Neg(a) | Call(_, a) => (Some(a), None),
            Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) | Pow(a, b) | Rel(_, a, b) => {
                (Some(a), Some(b))
            }
        }
    }

    /// Visite chaque nœud (pile explicite : pas de récursion).
    fn visite<'a>(&'a self, mut f: impl FnMut(&'a Expr)) {
        let mut pile: Vec<&Expr> = Vec::with_capacity(64);
        pile.push(self);
        while let Some(e) = pile.pop() {
            f(e);
            let (a, b) = e.enfants();
            pile.extend(b);
            pile.extend(a);
        }
    }

    /// Noms des variables libres (sans fonctions, constantes ni unité imaginaire).
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.visite(|e| {
            if let Expr::Var(name) = e {
                out.insert(name.clone());
            }
        });
        out
    }

    pub fn nb_noeuds(&self) -> usize {
        let mut n = 0;
        self.visite(|_| n += 1);
        n
    }

    /// Profondeur de l’arbre (pile explicite).
    pub fn profondeur(&self) -> usize {
        let mut max = 0;
        let mut pile: Vec<(&Expr, usize)> = vec![(self, 1)];
        while let Some((e, d)) = pile.pop() {
            max = max.max(d);
            let (a, b) = e.enfants();
            pile.extend(a.map(|x| (x, d + 1)));
            pile.extend(b.map(|x| (x, d + 1)));
        }
        max
    }

    /// Le sous-arbre dépend-il de `var` ? (une constante du même nom compte)
    pub fn depend_de(&self, var: &str) -> bool {
        let mut trouve = false;
        self.visite(|e| match e {
            Expr::Var(name) if name == var => trouve = true,
            Expr::Const(c) if c.name() == var => trouve = true,
            _ => {}
        });
        trouve
    }

    fn priorite(&self) -> u8 {
        use Expr::*;
        match self {
            Rel(r, ..) => r.priorite(),
            Add(..) | Sub(..) => 5,
            Mul(..) | Div(..) => 6,
            Neg(_) => 7,
            Pow(..) => 8,
            Num(_) | Var(_) | Const(_) | Imag | Call(..) => 9,
        }
    }
}

/* ------------------------ Affichage (relisible par le parseur) ------------------------ */

struct Affiche<'a> {
    e: &'a Expr,
    unite: &'a str,
}

impl Expr {
    /// Texte relisible, l’unité imaginaire écrite `unite`.
    pub fn affiche<'a>(&'a self, unite: &'a str) -> impl fmt::Display + 'a {
        Affiche { e: self, unite }
    }
}

impl fmt::Display for Affiche<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Expr::*;

        let sous = |f: &mut fmt::Formatter<'_>, e: &Expr, parens: bool| -> fmt::Result {
            let a = Affiche { e, unite: self.unite };
            if parens {
                write!(f, "({a})")
            } else {
                write!(f, "{a}")
            }
        };
        let p = self.e.priorite();

        match self.e {
            Num(s) => f.write_str(s),
            Var(name) => f.write_str(name),
            Const(c) => f.write_str(c.name()),
            Imag => f.write_str(self.unite),
            Neg(a) => {
                f.write_str("-")?;
                // "--x" se relit x : signe imbriqué entre parenthèses
                sous(f, a, a.priorite() <= p)
            }
            Call(fonction, a) => {
                write!(f, "{}", fonction.name())?;
                sous(f, a, true)
            }
            Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) | Rel(_, a, b) => {
                let op = match self.e {
                    Add(..) => " + ",
                    Sub(..) => " - ",
                    Mul(..) => "*",
                    Div(..) => "/",
                    Rel(Relation::Ou, ..) => " | ",
                    Rel(Relation::Et, ..) => " & ",
                    Rel(Relation::Egal, ..) => " = ",
                    Rel(Relation::Inf, ..) => " < ",
                    _ => " > ",
                };
                sous(f, a, a.priorite() < p)?;
                f.write_str(op)?;
                // a - (b + c), a/(b*c) : même priorité à droite => parenthèses
                sous(f, b, b.priorite() <= p)
            }
            Pow(a, b) => {
                sous(f, a, a.priorite() <= p)?;
                f.write_str("^")?;
                sous(f, b, b.priorite() < p)
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.affiche("i"))
    }
}
