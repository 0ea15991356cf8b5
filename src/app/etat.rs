//! src/app/etat.rs
//!
//! État de session (sans entrée/sortie).
//!
//! Rôle : lire une ligne en `Commande`, garder les réglages (précision,
//! chiffres affichés, notation) et exécuter la commande sur le noyau.
//!
//! Contrats :
//! - Une ligne = une commande ; une erreur n’arrête pas la session.
//! - Chiffres affichés bornés à [0, 8192].

use formule_mp::{Bindings, Formula, FormulaError, Notation, DEFAULT_PRECISION, MAX_PRECISION};

const DIGITS_MAX: usize = MAX_PRECISION;

#[derive(Clone, Debug, PartialEq)]
pub enum Commande {
    /// `<expr> [; a=1, b=2]`
    Evalue { expr: String, bindings: Bindings },
    /// `d/<var> <expr> [; a=1, b=2]`
    Derive {
        var: String,
        expr: String,
        bindings: Bindings,
    },
    Precision(usize),
    Digits(usize),
    Notation(Notation),
    Vars(String),
    Reset,
    Quitte,
    /// Ligne vide : rien à faire.
    Rien,
}

/// Résultat d’une commande, pour la boucle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sortie {
    Texte(String),
    Silence,
    Fin,
}

/// "a=1, b=2" -> Bindings
fn lire_bindings(texte: &str) -> Result<Bindings, String> {
    let mut b = Bindings::new();
    for paire in texte.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (nom, valeur) = paire
            .split_once('=')
            .ok_or_else(|| format!("liaison sans '=' : {paire}"))?;
        let nom = nom.trim();
        if nom.is_empty() {
            return Err(format!("liaison sans nom : {paire}"));
        }
        b.insert(nom, valeur.trim());
    }
    Ok(b)
}

fn expr_et_bindings(texte: &str) -> Result<(String, Bindings), String> {
    match texte.split_once(';') {
        Some((e, b)) => Ok((e.trim().to_string(), lire_bindings(b)?)),
        None => Ok((texte.trim().to_string(), Bindings::new())),
    }
}

fn lire_entier(arg: &str, quoi: &str) -> Result<usize, String> {
    arg.trim()
        .parse::<usize>()
        .map_err(|_| format!("{quoi} : entier positif attendu, lu '{}'", arg.trim()))
}

/// Lit une ligne de session.
pub fn lire_commande(ligne: &str) -> Result<Commande, String> {
    let ligne = ligne.trim();
    if ligne.is_empty() {
        return Ok(Commande::Rien);
    }

    if let Some(reste) = ligne.strip_prefix(':') {
        let (nom, arg) = reste.split_once(char::is_whitespace).unwrap_or((reste, ""));
        return match nom {
            "precision" => Ok(Commande::Precision(lire_entier(arg, "precision")?)),
            "digits" => Ok(Commande::Digits(lire_entier(arg, "digits")?)),
            "notation" => Notation::from_name(arg)
                .map(Commande::Notation)
                .ok_or_else(|| format!("notation inconnue '{}' (default|fixed|scientific)", arg.trim())),
            "vars" => Ok(Commande::Vars(arg.trim().to_string())),
            "reset" => Ok(Commande::Reset),
            "quit" | "q" => Ok(Commande::Quitte),
            _ => Err(format!("commande inconnue ':{nom}'")),
        };
    }

    if let Some(reste) = ligne.strip_prefix("d/") {
        let (var, suite) = reste
            .split_once(char::is_whitespace)
            .ok_or_else(|| "d/<var> <expr> attendu".to_string())?;
        let (expr, bindings) = expr_et_bindings(suite)?;
        return Ok(Commande::Derive {
            var: var.to_string(),
            expr,
            bindings,
        });
    }

    let (expr, bindings) = expr_et_bindings(ligne)?;
    Ok(Commande::Evalue { expr, bindings })
}

#[derive(Clone, Debug)]
pub struct Session {
    pub precision: usize,
    /// None : autant de chiffres que la précision.
    pub digits: Option<usize>,
    pub notation: Notation,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            digits: None,
            notation: Notation::Default,
        }
    }
}

impl Session {
    /// Lit puis exécute une ligne ; les erreurs deviennent du texte.
    pub fn ligne(&mut self, ligne: &str) -> Sortie {
        match lire_commande(ligne) {
            Ok(cmd) => match self.execute(cmd) {
                Ok(sortie) => sortie,
                Err(e) => Sortie::Texte(format!("erreur: {e}")),
            },
            Err(msg) => Sortie::Texte(format!("erreur: {msg}")),
        }
    }

    pub fn execute(&mut self, cmd: Commande) -> Result<Sortie, FormulaError> {
        Ok(match cmd {
            Commande::Evalue { expr, bindings } => {
                let f = Formula::with_precision(&expr, self.precision)?;
                let chiffres = self.digits.unwrap_or(f.precision());
                Sortie::Texte(f.get_formatted(&bindings, chiffres, self.notation)?)
            }
            Commande::Derive {
                var,
                expr,
                bindings,
            } => {
                let f = Formula::with_precision(&expr, self.precision)?;
                let chiffres = self.digits.unwrap_or(f.precision());
                Sortie::Texte(f.get_derivative_formatted(&var, &bindings, chiffres, self.notation)?)
            }
            Commande::Precision(p) => {
                self.precision = p.min(MAX_PRECISION);
                Sortie::Silence
            }
            Commande::Digits(d) => {
                self.digits = Some(d.min(DIGITS_MAX));
                Sortie::Silence
            }
            Commande::Notation(n) => {
                self.notation = n;
                Sortie::Silence
            }
            Commande::Vars(expr) => {
                let f = Formula::new(&expr)?;
                let mut noms: Vec<String> = f.variables().into_iter().collect();
                noms.sort();
                if noms.is_empty() {
                    Sortie::Texte("(aucune)".to_string())
                } else {
                    Sortie::Texte(noms.join(", "))
                }
            }
            Commande::Reset => {
                *self = Self::default();
                Sortie::Silence
            }
            Commande::Quitte => Sortie::Fin,
            Commande::Rien => Sortie::Silence,
        })
    }
}
