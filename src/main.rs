// src/main.rs
//
// formule_mp : point d’entrée (session en ligne de commande)
// -----------------------------------------------------------
// But:
// - Journalisation : env_logger (niveau via RUST_LOG, "warn" par défaut)
// - Session        : stdin -> app::boucle -> stdout
//
// Commandes (voir app/etat.rs) :
//   <expr> [; a=1, b=2]          valeur
//   d/<var> <expr> [; a=1]       dérivée partielle
//   :precision N  :digits N  :notation default|fixed|scientific
//   :vars <expr>  :reset  :quit

mod app;

use std::io;

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    app::boucle(stdin.lock(), stdout.lock())
}
