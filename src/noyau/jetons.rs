// src/noyau/jetons.rs

use super::erreur::{FormulaError, Result, Span};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tok {
    /// Littéral numérique, gardé en texte : il sera lu à la précision de l’évaluation.
    /// Jamais signé : les signes restent des opérateurs.
    Num(String),

    // Fonctions, constantes, variables, unité imaginaire.
    // NOTE: le parseur décide selon le jeton suivant et les options de la formule.
    Ident(String),

    Plus,
    Minus,
    Star,
    Slash,
    Caret, // ^

    // Relations : 1 si vrai, 0 sinon
    Pipe,  // |
    Amp,   // &
    Egal,  // =
    Inf,   // <
    Sup,   // >

    LPar,
    RPar,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jeton {
    pub tok: Tok,
    pub span: Span,
}

fn est_debut_ident(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn est_suite_ident(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Tokenize une chaîne en jetons.
/// Supporte:
/// - nombres : 12, 1.5, .5, 5., 1e-3, 2.E+10 (au moins un chiffre de mantisse)
/// - opérateurs + - * / ^ et relations | & = < >
/// - parenthèses ( )
/// - identifiants : lettre Unicode ou '_', puis lettres, chiffres, '_', '.'
/// - √ (équivaut à ident("sqrt"))
pub fn tokenize(s: &str) -> Result<Vec<Jeton>> {
    let chars: Vec<(usize, char)> = s.char_indices().collect();
    let octet = |i: usize| chars.get(i).map_or(s.len(), |&(o, _)| o);

    let mut out = Vec::new();
    let mut i: usize = 0;

    while i < chars.len() {
        let (debut, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Opérateurs + parenthèses
        let simple = match c {
            '+' => Some(Tok::Plus),
            '-' => Some(Tok::Minus),
            '*' => Some(Tok::Star),
            '/' => Some(Tok::Slash),
            '^' => Some(Tok::Caret),
            '|' => Some(Tok::Pipe),
            '&' => Some(Tok::Amp),
            '=' => Some(Tok::Egal),
            '<' => Some(Tok::Inf),
            '>' => Some(Tok::Sup),
            '(' => Some(Tok::LPar),
            ')' => Some(Tok::RPar),
            // Racine carrée unicode : √  => ident("sqrt")
            '√' => Some(Tok::Ident("sqrt".to_string())),
            _ => None,
        };
        if let Some(tok) = simple {
            out.push(Jeton {
                tok,
                span: Span::new(debut, octet(i + 1)),
            });
            i += 1;
            continue;
        }

        // Identifiants
        if est_debut_ident(c) {
            i += 1;
            while i < chars.len() && est_suite_ident(chars[i].1) {
                i += 1;
            }
            out.push(Jeton {
                tok: Tok::Ident(s[debut..octet(i)].to_string()),
                span: Span::new(debut, octet(i)),
            });
            continue;
        }

        // Nombres
        if c.is_ascii_digit() || c == '.' {
            let fin = lire_nombre(&chars, i, s)?;
            let span = Span::new(debut, octet(fin));

            // "2x", "1.2.3", "3eq" : rien ne se colle à un littéral
            if let Some(&(o, suivant)) = chars.get(fin) {
                if est_suite_ident(suivant) {
                    return Err(FormulaError::syntax(
                        format!("caractère inattendu après un nombre: '{suivant}'"),
                        Span::at(o),
                    ));
                }
            }

            out.push(Jeton {
                tok: Tok::Num(s[debut..octet(fin)].to_string()),
                span,
            });
            i = fin;
            continue;
        }

        return Err(FormulaError::syntax(
            format!("caractère inattendu: '{c}'"),
            Span::new(debut, octet(i + 1)),
        ));
    }

    Ok(out)
}

/// Lit `chiffres [. chiffres] [(e|E) [+-] chiffres]` à partir de `i`, renvoie l’indice de fin.
fn lire_nombre(chars: &[(usize, char)], mut i: usize, s: &str) -> Result<usize> {
    let octet = |i: usize| chars.get(i).map_or(s.len(), |&(o, _)| o);
    let est_chiffre = |i: usize| chars.get(i).is_some_and(|&(_, c)| c.is_ascii_digit());

    let debut = i;
    let mut chiffres = 0usize;
    while est_chiffre(i) {
        i += 1;
        chiffres += 1;
    }
    if chars.get(i).is_some_and(|&(_, c)| c == '.') {
        i += 1;
        while est_chiffre(i) {
            i += 1;
            chiffres += 1;
        }
    }
    if chiffres == 0 {
        return Err(FormulaError::syntax(
            "nombre invalide : aucun chiffre dans la mantisse",
            Span::new(octet(debut), octet(i)),
        ));
    }

    if chars.get(i).is_some_and(|&(_, c)| c == 'e' || c == 'E') {
        let marque = i;
        i += 1;
        if chars.get(i).is_some_and(|&(_, c)| c == '+' || c == '-') {
            i += 1;
        }
        if !est_chiffre(i) {
            return Err(FormulaError::syntax(
                "nombre invalide : exposant sans chiffre",
                Span::at(octet(marque)),
            ));
        }
        while est_chiffre(i) {
            i += 1;
        }
    }

    Ok(i)
}
