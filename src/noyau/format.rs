// src/noyau/format.rs
//
// Affichage décimal des valeurs.
// - Default    : `chiffres` significatifs, zéros de queue retirés,
//                bascule en scientifique si ordre < -4 ou ordre >= chiffres
// - Fixed      : `chiffres` après la virgule (complétés par des zéros)
// - Scientific : `chiffres` après la virgule de la mantisse, puis e±XX
// - chiffres == 0 : tous les chiffres sauf le dernier de garde, tronqués
//
// Arrondi : demi loin de zéro, sur le chiffre qui suit la coupure.

use num_bigint::BigUint;
use num_traits::Zero;

use super::complexe::ComplexValue;
use super::nombre::{nb_chiffres, pow10u, BigNumber, Genre, GARDE};

/// Au-delà de cet ordre, Fixed passe en écriture scientifique.
const LARGEUR_FIXE_MAX: i64 = 10_000;

/// Seuil de bascule du mode Default quand tous les chiffres sont demandés.
const SEUIL_TOUS_CHIFFRES: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Notation {
    #[default]
    Default,
    Fixed,
    Scientific,
}

impl Notation {
    pub fn name(self) -> &'static str {
        match self {
            Notation::Default => "default",
            Notation::Fixed => "fixed",
            Notation::Scientific => "scientific",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Notation::Default),
            "fixed" => Some(Notation::Fixed),
            "scientific" => Some(Notation::Scientific),
            _ => None,
        }
    }
}

/* ------------------------ Outils ------------------------ */

/// Arrondit m × 10^e au multiple de 10^cible (demi loin de zéro).
fn arrondi_a(m: &BigUint, e: i64, cible: i64) -> (BigUint, i64) {
    if e >= cible {
        return (m.clone(), e);
    }
    let coupe = (cible - e) as usize;
    if coupe > nb_chiffres(m) + 1 {
        return (BigUint::zero(), cible);
    }
    let p = pow10u(coupe);
    let mut q = m / &p;
    let r = m % &p;
    if r * 2u32 >= p {
        q += 1u32;
    }
    (q, cible)
}

/// Garde au plus `n` chiffres significatifs, sans arrondir.
fn tronque(m: &BigUint, e: i64, n: usize) -> (BigUint, i64) {
    let k = nb_chiffres(m);
    if k <= n {
        return (m.clone(), e);
    }
    (m / pow10u(k - n), e + (k - n) as i64)
}

fn sans_zeros_de_queue(mut m: BigUint, mut e: i64) -> (BigUint, i64) {
    if m.is_zero() {
        return (m, 0);
    }
    let dix = BigUint::from(10u32);
    while (&m % &dix).is_zero() {
        m /= &dix;
        e += 1;
    }
    (m, e)
}

fn ordre_de(m: &BigUint, e: i64) -> i64 {
    e + nb_chiffres(m) as i64 - 1
}

fn exposant_texte(ordre: i64) -> String {
    let signe = if ordre < 0 { '-' } else { '+' };
    format!("e{signe}{:02}", ordre.unsigned_abs())
}

/// m × 10^e en écriture positionnelle (au moins `decimales` chiffres après la virgule).
fn positionnel(m: &BigUint, e: i64, decimales: usize) -> String {
    let mut chiffres = m.to_string();
    if e >= 0 {
        chiffres.push_str(&"0".repeat(e as usize));
        if decimales > 0 {
            chiffres.push('.');
            chiffres.push_str(&"0".repeat(decimales));
        }
        return chiffres;
    }

    let k = (-e) as usize;
    if chiffres.len() <= k {
        chiffres.insert_str(0, &"0".repeat(k - chiffres.len() + 1));
    }
    let point = chiffres.len() - k;
    chiffres.insert(point, '.');
    if decimales > k {
        chiffres.push_str(&"0".repeat(decimales - k));
    }
    chiffres
}

/// Mantisse d.ddd (au moins `decimales` chiffres après la virgule) + exposant.
fn scientifique(m: &BigUint, decimales: usize) -> String {
    let chiffres = m.to_string();
    let (tete, queue) = chiffres.split_at(1);
    let mut out = tete.to_string();
    if !queue.is_empty() || decimales > 0 {
        out.push('.');
        out.push_str(queue);
        if decimales > queue.len() {
            out.push_str(&"0".repeat(decimales - queue.len()));
        }
    }
    out
}

/* ------------------------ Réel ------------------------ */

/// Affiche un réel selon `notation` et `chiffres` (0 = tous les chiffres).
pub fn formate_reel(x: &BigNumber, chiffres: usize, notation: Notation) -> String {
    match x.genre() {
        Genre::Nan => return "nan".to_string(),
        Genre::Infini if x.is_sign_negative() => return "-inf".to_string(),
        Genre::Infini => return "inf".to_string(),
        Genre::Fini => {}
    }

    let signe = if x.is_sign_negative() { "-" } else { "" };
    let (m, e) = x.parts();
    let tous;
    let (m, e) = if chiffres == 0 {
        tous = tronque(m, e, x.precision() + GARDE - 1);
        (&tous.0, tous.1)
    } else {
        (m, e)
    };

    let corps = match notation {
        Notation::Default => {
            if x.is_zero() {
                return "0".to_string();
            }
            return format!("{signe}{}", defaut(m, e, chiffres));
        }
        Notation::Fixed => {
            if !x.is_zero() && x.ordre().abs() > LARGEUR_FIXE_MAX {
                sci(m, e, chiffres)
            } else {
                fixe(m, e, chiffres)
            }
        }
        Notation::Scientific => sci(m, e, chiffres),
    };
    format!("{signe}{corps}")
}

fn defaut(m: &BigUint, e: i64, chiffres: usize) -> String {
    let (q, e2, seuil) = if chiffres == 0 {
        (m.clone(), e, nb_chiffres(m).max(SEUIL_TOUS_CHIFFRES))
    } else {
        let cible = ordre_de(m, e) - chiffres as i64 + 1;
        let (q, e2) = arrondi_a(m, e, cible);
        (q, e2, chiffres)
    };
    let (q, e2) = sans_zeros_de_queue(q, e2);
    let ordre = ordre_de(&q, e2);

    if ordre < -4 || ordre >= seuil as i64 {
        format!("{}{}", scientifique(&q, 0), exposant_texte(ordre))
    } else {
        positionnel(&q, e2, 0)
    }
}

fn fixe(m: &BigUint, e: i64, chiffres: usize) -> String {
    if chiffres == 0 {
        return positionnel(m, e, 0);
    }
    let (q, e2) = arrondi_a(m, e, -(chiffres as i64));
    positionnel(&q, e2, chiffres)
}

fn sci(m: &BigUint, e: i64, chiffres: usize) -> String {
    if m.is_zero() {
        return format!("{}{}", scientifique(m, chiffres), exposant_texte(0));
    }
    if chiffres == 0 {
        return format!("{}{}", scientifique(m, 0), exposant_texte(ordre_de(m, e)));
    }

    let cible = ordre_de(m, e) - chiffres as i64;
    let (mut q, mut e2) = arrondi_a(m, e, cible);
    // 9.99 -> 10.0 : un chiffre de trop, toujours un zéro
    if nb_chiffres(&q) > chiffres + 1 {
        q /= 10u32;
        e2 += 1;
    }
    format!("{}{}", scientifique(&q, chiffres), exposant_texte(ordre_de(&q, e2)))
}

/* ------------------------ Complexe ------------------------ */

/// Réel seul, ou "<re>+i*(<im>)" pour une valeur complexe.
pub fn formate(z: &ComplexValue, chiffres: usize, notation: Notation) -> String {
    let re = formate_reel(&z.re, chiffres, notation);
    if !z.is_complex() {
        return re;
    }
    let im = formate_reel(&z.im, chiffres, notation);
    format!("{re}+i*({im})")
}
