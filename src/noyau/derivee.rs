// src/noyau/derivee.rs
//
// Dérivation symbolique : Expr -> Expr (d/dvar).
// - constantes et autres variables -> 0
// - une constante portant le nom de `var` (e, pi) est traitée comme variable
// - puissance : exposant constant, base constante, ou forme générale
//     d(u^v) = u^v · (v'·log u + v·u'/u)
// - fonctions : règle de chaîne, f'(u) fourni par `Fonction::derivee`
//
// - relations (| & = < >) -> 0
//
// Le résultat passe par les constructeurs simplifiés (0 et 1 seulement).

use super::expr::{Expr, Fonction};

/// d(e)/d(var), parcours postfixe à pile explicite.
pub fn derive(e: &Expr, var: &str) -> Expr {
    enum Tache<'e> {
        Descend(&'e Expr),
        Combine(&'e Expr),
    }

    let mut taches = vec![Tache::Descend(e)];
    let mut derivees: Vec<Expr> = Vec::new();
    while let Some(t) = taches.pop() {
        match t {
            Tache::Descend(n) => {
                if n.est_feuille() {
                    derivees.push(feuille(n, var));
                    continue;
                }
                taches.push(Tache::Combine(n));
                let (a, b) = n.enfants();
                taches.extend(b.map(Tache::Descend));
                taches.extend(a.map(Tache::Descend));
            }
            Tache::Combine(n) => {
                let db = match n.enfants() {
                    (_, Some(_)) => derivees.pop(),
                    _ => None,
                };
                let da = derivees.pop().unwrap_or_else(|| Expr::entier(0));
                let db = db.unwrap_or_else(|| Expr::entier(0));
                derivees.push(combine(n, da, db, var));
            }
        }
    }
    derivees.pop().unwrap_or_else(|| Expr::entier(0))
}

fn feuille(e: &Expr, var: &str) -> Expr {
    match e {
        Expr::Var(nom) => Expr::entier(u64::from(nom == var)),
        Expr::Const(c) => Expr::entier(u64::from(c.name() == var)),
        _ => Expr::entier(0),
    }
}

/// Dérivée d’un nœud interne, celles de ses enfants (`da`, `db`) déjà connues.
fn combine(e: &Expr, da: Expr, db: Expr, var: &str) -> Expr {
    use Expr::*;

    match e {
        Num(_) | Var(_) | Const(_) | Imag => feuille(e, var),

        Neg(_) => Expr::neg(da),
        Add(..) => Expr::somme(da, db),
        Sub(..) => Expr::difference(da, db),

        // (ab)' = a'b + ab'
        Mul(a, b) => Expr::somme(
            Expr::produit(da, (**b).clone()),
            Expr::produit((**a).clone(), db),
        ),

        // (a/b)' = (a'b - ab') / b^2
        Div(a, b) => Expr::quotient(
            Expr::difference(
                Expr::produit(da, (**b).clone()),
                Expr::produit((**a).clone(), db),
            ),
            Expr::puissance((**b).clone(), Expr::entier(2)),
        ),

        Pow(u, v) => derive_puissance(e, u, v, da, db, var),

        Call(f, a) => Expr::produit(f.derivee(a), da),

        // constante par morceaux
        Rel(..) => Expr::entier(0),
    }
}

/// Exposant entier littéral moins un ("3" -> "2"), sinon v - 1.
fn exposant_moins_un(v: &Expr) -> Expr {
    if let Expr::Num(s) = v {
        if let Ok(n) = s.parse::<u64>() {
            if n >= 1 {
                return Expr::entier(n - 1);
            }
        }
    }
    Expr::difference(v.clone(), Expr::entier(1))
}

fn derive_puissance(e: &Expr, u: &Expr, v: &Expr, du: Expr, dv: Expr, var: &str) -> Expr {
    // v constant : (u^v)' = v·u^(v-1)·u'
    if !v.depend_de(var) {
        return Expr::produit(
            Expr::produit(
                v.clone(),
                Expr::puissance(u.clone(), exposant_moins_un(v)),
            ),
            du,
        );
    }

    // u constant : (u^v)' = u^v·log(u)·v'
    if !u.depend_de(var) {
        return Expr::produit(
            Expr::produit(e.clone(), Expr::appel(Fonction::Log, u.clone())),
            dv,
        );
    }

    Expr::produit(
        e.clone(),
        Expr::somme(
            Expr::produit(dv, Expr::appel(Fonction::Log, u.clone())),
            Expr::quotient(Expr::produit(v.clone(), du), u.clone()),
        ),
    )
}
