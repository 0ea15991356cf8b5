// src/app.rs
//
// formule_mp : module App (racine)
// --------------------------------
// Rôle:
// - Déclarer le sous-module etat.rs (commandes + réglages de session)
// - Fournir la boucle ligne à ligne (lecture / exécution / affichage)
//
// Important:
// - La boucle ne connaît ni le noyau ni les commandes : tout passe par Session.
// - Les erreurs s’affichent ("erreur: …") et la session continue.

pub mod etat;

pub use etat::{Session, Sortie};

use std::io::{self, BufRead, Write};

use log::info;

/// Invite affichée avant chaque ligne.
const INVITE: &str = "> ";

/// Lit `entree` ligne à ligne jusqu’à `:quit` ou la fin du flux.
pub fn boucle<R: BufRead, W: Write>(entree: R, mut sortie: W) -> io::Result<()> {
    let mut session = Session::default();
    info!("session ouverte (précision {})", session.precision);

    write!(sortie, "{INVITE}")?;
    sortie.flush()?;
    for ligne in entree.lines() {
        match session.ligne(&ligne?) {
            Sortie::Texte(t) => writeln!(sortie, "{t}")?,
            Sortie::Silence => {}
            Sortie::Fin => break,
        }
        write!(sortie, "{INVITE}")?;
        sortie.flush()?;
    }
    writeln!(sortie)?;
    Ok(())
}
