// src/noyau/syntaxe.rs
//
// Descente récursive : jetons -> Expr
//
// Grammaire effective :
//   expr     := et ('|' et)*
//   et       := egalite ('&' egalite)*
//   egalite  := ordre ('=' ordre)*
//   ordre    := somme (('<' | '>') somme)*
//   somme    := terme (('+' | '-') terme)*
//   terme    := unaire (('*' | '/') unaire)*
//   unaire   := ('+' | '-')* puissance       // "-x^2" = -(x^2)
//   puissance:= primaire ('^' unaire)?       // associatif à droite, "2^-1"
//   primaire := nombre | appel | nom | '(' expr ')'
//
// Règles:
// - signes empilés : repliés par parité (pas de nœud pour '+')
// - nom suivi de '(' : fonction connue, sinon erreur
// - fonction sans '(' : erreur
// - unité imaginaire, puis constantes (pi, π, e), sinon variable
// - imbrication bornée (parenthèses, appels, exposants) ; chaînes à plat libres

use log::debug;

use super::erreur::{FormulaError, Result, Span};
use super::expr::{Constante, Expr, Fonction, Relation};
use super::jetons::{tokenize, Jeton, Tok};

/// Niveaux d’imbrication acceptés (parenthèses, appels, exposants).
pub const IMBRICATION_MAX: usize = 256;

/// Options de lecture fixées par la formule.
#[derive(Clone, Copy, Debug)]
pub struct OptionsLecture<'a> {
    pub unite: &'a str,
    pub insensible_casse: bool,
}

impl Default for OptionsLecture<'_> {
    fn default() -> Self {
        Self {
            unite: "i",
            insensible_casse: false,
        }
    }
}

/// L’unité imaginaire doit être un identifiant seul, et pas un nom de fonction.
pub fn verifie_unite(unite: &str) -> Result<()> {
    let jetons = tokenize(unite)?;
    match jetons.as_slice() {
        [Jeton {
            tok: Tok::Ident(nom),
            ..
        }] if nom == unite => {
            if Fonction::from_name(&nom.to_lowercase()).is_some() {
                return Err(FormulaError::syntax_sans_position(format!(
                    "unité imaginaire '{unite}' : c’est un nom de fonction"
                )));
            }
            Ok(())
        }
        _ => Err(FormulaError::syntax_sans_position(format!(
            "unité imaginaire '{unite}' : identifiant invalide"
        ))),
    }
}

/// Lit une expression complète (aucun arbre partiel en cas d’erreur).
pub fn parse(texte: &str, opts: &OptionsLecture<'_>) -> Result<Expr> {
    let jetons = tokenize(texte)?;
    debug!("lecture de {texte:?} : {} jetons", jetons.len());

    if jetons.is_empty() {
        return Err(FormulaError::syntax_sans_position("expression vide"));
    }

    let unite = if opts.insensible_casse {
        opts.unite.to_lowercase()
    } else {
        opts.unite.to_string()
    };
    let mut p = Parseur {
        jetons: &jetons,
        pos: 0,
        fin: texte.len(),
        imbrication: 0,
        unite,
        insensible_casse: opts.insensible_casse,
    };

    let e = p.expr()?;

    if let Some(j) = p.jetons.get(p.pos) {
        let msg = match &j.tok {
            Tok::RPar => "parenthèse fermante sans ouvrante".to_string(),
            Tok::Num(s) | Tok::Ident(s) => format!("opérateur manquant avant '{s}'"),
            Tok::LPar => "opérateur manquant avant '('".to_string(),
            _ => "jeton inattendu".to_string(),
        };
        return Err(FormulaError::syntax(msg, j.span));
    }

    Ok(e)
}

struct Parseur<'a> {
    jetons: &'a [Jeton],
    pos: usize,
    fin: usize,
    imbrication: usize,
    unite: String,
    insensible_casse: bool,
}

fn symbole(t: &Tok) -> &'static str {
    match t {
        Tok::Plus => "+",
        Tok::Minus => "-",
        Tok::Star => "*",
        Tok::Slash => "/",
        Tok::Caret => "^",
        Tok::Pipe => "|",
        Tok::Amp => "&",
        Tok::Egal => "=",
        Tok::Inf => "<",
        Tok::Sup => ">",
        Tok::LPar => "(",
        Tok::RPar => ")",
        Tok::Num(_) | Tok::Ident(_) => "",
    }
}

impl Parseur<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.jetons.get(self.pos).map(|j| &j.tok)
    }

    fn avance(&mut self) -> Option<Jeton> {
        let j = self.jetons.get(self.pos).cloned();
        if j.is_some() {
            self.pos += 1;
        }
        j
    }

    fn entrer(&mut self, span: Span) -> Result<()> {
        self.imbrication += 1;
        if self.imbrication > IMBRICATION_MAX {
            return Err(FormulaError::syntax(
                format!("expression trop imbriquée (plus de {IMBRICATION_MAX} niveaux)"),
                span,
            ));
        }
        Ok(())
    }

    fn sortir(&mut self) {
        self.imbrication -= 1;
    }

    fn expr(&mut self) -> Result<Expr> {
        self.relations(&[(Tok::Pipe, Relation::Ou)], Self::et)
    }

    fn et(&mut self) -> Result<Expr> {
        self.relations(&[(Tok::Amp, Relation::Et)], Self::egalite)
    }

    fn egalite(&mut self) -> Result<Expr> {
        self.relations(&[(Tok::Egal, Relation::Egal)], Self::ordre)
    }

    fn ordre(&mut self) -> Result<Expr> {
        self.relations(&[(Tok::Inf, Relation::Inf), (Tok::Sup, Relation::Sup)], Self::somme)
    }

    /// Un niveau de relations, associatif à gauche.
    fn relations(&mut self, ops: &[(Tok, Relation)], suivant: fn(&mut Self) -> Result<Expr>) -> Result<Expr> {
        let mut g = suivant(self)?;
        loop {
            let Some(r) = self
                .peek()
                .and_then(|t| ops.iter().find(|(o, _)| o == t))
                .map(|&(_, r)| r)
            else {
                return Ok(g);
            };
            self.pos += 1;
            let d = suivant(self)?;
            g = Expr::Rel(r, Box::new(g), Box::new(d));
        }
    }

    fn somme(&mut self) -> Result<Expr> {
        let mut g = self.terme()?;
        loop {
            match self.peek() {
                Some(Tok::Plus) => {
                    self.pos += 1;
                    let d = self.terme()?;
                    g = Expr::Add(Box::new(g), Box::new(d));
                }
                Some(Tok::Minus) => {
                    self.pos += 1;
                    let d = self.terme()?;
                    g = Expr::Sub(Box::new(g), Box::new(d));
                }
                _ => return Ok(g),
            }
        }
    }

    fn terme(&mut self) -> Result<Expr> {
        let mut g = self.unaire()?;
        loop {
            match self.peek() {
                Some(Tok::Star) => {
                    self.pos += 1;
                    let d = self.unaire()?;
                    g = Expr::Mul(Box::new(g), Box::new(d));
                }
                Some(Tok::Slash) => {
                    self.pos += 1;
                    let d = self.unaire()?;
                    g = Expr::Div(Box::new(g), Box::new(d));
                }
                _ => return Ok(g),
            }
        }
    }

    fn unaire(&mut self) -> Result<Expr> {
        let mut negatif = false;
        while let Some(t @ (Tok::Plus | Tok::Minus)) = self.peek() {
            negatif ^= matches!(t, Tok::Minus);
            self.pos += 1;
        }
        let e = self.puissance()?;
        Ok(if negatif { Expr::Neg(Box::new(e)) } else { e })
    }

    fn puissance(&mut self) -> Result<Expr> {
        let base = self.primaire()?;
        let Some(Tok::Caret) = self.peek() else {
            return Ok(base);
        };
        let span = self.jetons[self.pos].span;
        self.pos += 1;

        self.entrer(span)?;
        let exposant = self.unaire();
        self.sortir();

        Ok(Expr::Pow(Box::new(base), Box::new(exposant?)))
    }

    /// '(' expr ')' après consommation de '(' ; `ouvrante` sert aux messages.
    fn groupe(&mut self, ouvrante: Span) -> Result<Expr> {
        if let Some(Tok::RPar) = self.peek() {
            return Err(FormulaError::syntax(
                "parenthèses vides",
                self.jetons[self.pos].span,
            ));
        }

        self.entrer(ouvrante)?;
        let e = self.expr();
        self.sortir();
        let e = e?;

        match self.avance() {
            Some(Jeton { tok: Tok::RPar, .. }) => Ok(e),
            _ => Err(FormulaError::syntax("parenthèse non fermée", ouvrante)),
        }
    }

    fn primaire(&mut self) -> Result<Expr> {
        let Some(j) = self.avance() else {
            return Err(FormulaError::syntax(
                "opérande attendu en fin d’expression",
                Span::at(self.fin),
            ));
        };

        match j.tok {
            Tok::Num(s) => Ok(Expr::Num(s)),
            Tok::LPar => self.groupe(j.span),
            Tok::Ident(name) => self.nom(name, j.span),
            Tok::RPar => Err(FormulaError::syntax("opérande attendu avant ')'", j.span)),
            t => Err(FormulaError::syntax(
                format!("opérande attendu avant '{}'", symbole(&t)),
                j.span,
            )),
        }
    }

    fn nom(&mut self, name: String, span: Span) -> Result<Expr> {
        let nom = if self.insensible_casse {
            name.to_lowercase()
        } else {
            name
        };
        let fonction = Fonction::from_name(&nom);

        if let Some(Tok::LPar) = self.peek() {
            let Some(f) = fonction else {
                return Err(FormulaError::syntax(
                    format!("fonction inconnue '{nom}'"),
                    span,
                ));
            };
            let ouvrante = self.jetons[self.pos].span;
            self.pos += 1;
            let arg = self.groupe(ouvrante)?;
            return Ok(Expr::Call(f, Box::new(arg)));
        }

        if fonction.is_some() {
            return Err(FormulaError::syntax(
                format!("la fonction '{nom}' attend un argument entre parenthèses"),
                span,
            ));
        }
        if nom == self.unite {
            return Ok(Expr::Imag);
        }
        Ok(match Constante::from_name(&nom) {
            Some(c) => Expr::Const(c),
            None => Expr::Var(nom),
        })
    }
}
