// src/noyau/transcendantes.rs
//
// Fonctions élémentaires sur BigNumber.
// Tout se calcule en entiers “scalés” (×10^w), w = chiffres retenus + EXTRA,
// puis on revient en BigNumber (arrondi à precision + GARDE).
//
// Constantes π, ln 2, ln 10 : séries exactes (Machin / atanh), cache par largeur.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use num_bigint::BigInt;
use num_traits::{One, ToPrimitive, Zero};

use super::erreur::{FormulaError, Result};
use super::nombre::{nb_chiffres, BigNumber, GARDE};

/// Chiffres en plus pour amortir les troncatures des séries.
const EXTRA: usize = 10;

/// exp : nombre de divisions par 2 avant la série (puis autant de carrés).
const REDUCTIONS_EXP: usize = 10;

/// Au-delà, la réduction modulo π/2 coûterait trop cher.
const ORDRE_TRIG_MAX: i64 = 100_000;

/* ------------------------ Outils scalés ------------------------ */

fn pow10(n: usize) -> BigInt {
    BigInt::from(10).pow(n as u32)
}

fn largeur(precision: usize) -> usize {
    precision + GARDE + EXTRA
}

fn mul_s(a: &BigInt, b: &BigInt, scale: &BigInt) -> BigInt {
    (a * b) / scale
}

fn div_s(a: &BigInt, b: &BigInt, scale: &BigInt) -> BigInt {
    (a * scale) / b
}

/// Division entière arrondie au plus proche (b > 0).
fn div_arrondie(a: &BigInt, b: &BigInt) -> BigInt {
    let q = a / b;
    let r2: BigInt = (a - &q * b) * 2;
    if r2 >= *b {
        q + 1
    } else if -r2 > *b {
        q - 1
    } else {
        q
    }
}

/// floor(√n), n >= 0 (Newton par au-dessus).
fn racine_entiere(n: &BigInt) -> BigInt {
    if n.is_zero() || n.sign() == num_bigint::Sign::Minus {
        return BigInt::zero();
    }

    // point de départ >= √n
    let mut y = BigInt::one() << ((n.bits() + 1) / 2);
    loop {
        let y_next = (&y + n / &y) >> 1;
        if y_next >= y {
            break;
        }
        y = y_next;
    }

    // ajustement final (floor)
    while &y * &y > *n {
        y -= 1u32;
    }
    while (&y + 1u32) * (&y + 1u32) <= *n {
        y += 1u32;
    }
    y
}

/// Petit argument : les termes d’ordre 3 disparaissent dans l’arrondi.
fn negligeable(x: &BigNumber) -> bool {
    x.is_zero() || -2 * x.ordre() > (x.precision() + GARDE) as i64 + 2
}

/* ------------------------ Séries de base ------------------------ */

/// arctan(1/q) en entier scalé (troncature) via série:
/// atan(z) = z - z^3/3 + z^5/5 - ...
fn arctan_inv_q_scaled(q: i64, scale: &BigInt) -> BigInt {
    let q = BigInt::from(q);

    let mut k: usize = 0;
    let mut sign_pos = true;

    // q^(2k+1)
    let mut q_pow = q.clone();
    let mut sum = BigInt::zero();

    loop {
        let d = &q_pow * BigInt::from(2 * k + 1);
        let term = scale / &d;
        if term.is_zero() {
            break;
        }

        if sign_pos {
            sum += &term;
        } else {
            sum -= &term;
        }

        q_pow *= &q;
        q_pow *= &q;

        sign_pos = !sign_pos;
        k += 1;
    }

    sum
}

/// atanh(1/q) scalé : z + z^3/3 + z^5/5 + ...
fn atanh_inv_q_scaled(q: i64, scale: &BigInt) -> BigInt {
    let q = BigInt::from(q);

    let mut k: usize = 0;
    let mut q_pow = q.clone();
    let mut sum = BigInt::zero();

    loop {
        let term = scale / (&q_pow * BigInt::from(2 * k + 1));
        if term.is_zero() {
            break;
        }
        sum += term;
        q_pow *= &q;
        q_pow *= &q;
        k += 1;
    }

    sum
}

/* ------------------------ Constantes + cache ------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Constante {
    Pi,
    Ln2,
    Ln10,
}

fn constante_compute(c: Constante, digits: usize) -> BigInt {
    let scale = pow10(digits + EXTRA);

    let v = match c {
        // Machin : π = 16*atan(1/5) - 4*atan(1/239)
        Constante::Pi => {
            BigInt::from(16) * arctan_inv_q_scaled(5, &scale)
                - BigInt::from(4) * arctan_inv_q_scaled(239, &scale)
        }
        // ln 2 = 2*atanh(1/3)
        Constante::Ln2 => BigInt::from(2) * atanh_inv_q_scaled(3, &scale),
        // ln 10 = 3*ln 2 + ln(5/4) = 6*atanh(1/3) + 2*atanh(1/9)
        Constante::Ln10 => {
            BigInt::from(6) * atanh_inv_q_scaled(3, &scale)
                + BigInt::from(2) * atanh_inv_q_scaled(9, &scale)
        }
    };

    v / pow10(EXTRA)
}

static CONSTANTES: OnceLock<Mutex<HashMap<(Constante, usize), BigInt>>> = OnceLock::new();

fn constante_scaled(c: Constante, digits: usize) -> BigInt {
    let m = CONSTANTES.get_or_init(|| Mutex::new(HashMap::new()));
    // un calcul interrompu ne laisse pas d’entrée partielle : le cache reste sain
    let mut guard = m.lock().unwrap_or_else(|e| e.into_inner());

    if let Some(v) = guard.get(&(c, digits)) {
        return v.clone();
    }

    let v = constante_compute(c, digits);
    guard.insert((c, digits), v.clone());
    v
}

pub fn pi(precision: usize) -> BigNumber {
    let w = largeur(precision);
    BigNumber::depuis_scaled(&constante_scaled(Constante::Pi, w), w, precision)
}

fn demi_pi(precision: usize, negatif: bool) -> BigNumber {
    let w = largeur(precision);
    let v = BigNumber::depuis_scaled(&(constante_scaled(Constante::Pi, w) / 2), w, precision);
    if negatif {
        -v
    } else {
        v
    }
}

/// Nombre d’Euler.
pub fn e(precision: usize) -> BigNumber {
    exp(&BigNumber::one(precision))
}

fn moitie(precision: usize) -> BigNumber {
    BigNumber::construit(false, 5u32.into(), -1, precision)
}

/* ------------------------ Racine carrée ------------------------ */

/// √x réel ; x < 0 => erreur de domaine. √(-0) = -0.
pub fn sqrt(x: &BigNumber) -> Result<BigNumber> {
    if x.is_nan() || x.is_zero() {
        return Ok(x.clone());
    }
    if x.is_sign_negative() {
        return Err(FormulaError::domain("racine carrée d’un nombre négatif"));
    }
    if x.is_infinite() {
        return Ok(x.clone());
    }

    let p = x.precision();
    let (m, e) = x.parts();
    let mut m = BigInt::from(m.clone());
    let mut e = e;
    if e % 2 != 0 {
        m *= 10;
        e -= 1;
    }

    // assez de chiffres pour que la racine en porte precision + GARDE + 2
    let cible = 2 * (p + GARDE + 2);
    let k = cible.saturating_sub(nb_chiffres(m.magnitude())) / 2 + 1;
    m *= pow10(2 * k);
    e -= 2 * k as i64;

    let mut r = racine_entiere(&m);
    let mut er = e / 2;
    if &r * &r != m {
        // chiffre collant : racine inexacte
        r = r * 10 + 1;
        er -= 1;
    }
    Ok(BigNumber::construit(false, r.magnitude().clone(), er, p))
}

/* ------------------------ Exponentielle / logarithme ------------------------ */

fn exp_scaled(r: &BigInt, scale: &BigInt) -> BigInt {
    let y = r >> REDUCTIONS_EXP;

    let mut somme = scale.clone();
    let mut terme = scale.clone();
    let mut i: u64 = 1;
    loop {
        terme = (&terme * &y) / (scale * BigInt::from(i));
        if terme.is_zero() {
            break;
        }
        somme += &terme;
        i += 1;
    }

    for _ in 0..REDUCTIONS_EXP {
        somme = mul_s(&somme, &somme, scale);
    }
    somme
}

pub fn exp(x: &BigNumber) -> BigNumber {
    let p = x.precision();
    if x.is_nan() {
        return x.clone();
    }
    if x.is_infinite() {
        return if x.is_sign_negative() {
            BigNumber::zero(p)
        } else {
            x.clone()
        };
    }
    if x.is_zero() {
        return BigNumber::one(p);
    }
    if x.ordre() >= 16 {
        // hors de la plage des exposants
        return if x.is_sign_negative() {
            BigNumber::zero(p)
        } else {
            BigNumber::infini(false, p)
        };
    }

    // x = n*ln 10 + r, |r| <= ln(10)/2
    let w = largeur(p) + (x.ordre() + 1).max(0) as usize;
    let scale = pow10(w);
    let sx = x.vers_scaled(w);
    let ln10 = constante_scaled(Constante::Ln10, w);
    let n = div_arrondie(&sx, &ln10);
    let r = &sx - &n * &ln10;

    let y = exp_scaled(&r, &scale);
    match n.to_i64() {
        Some(n) => BigNumber::construit(false, y.magnitude().clone(), n - w as i64, p),
        None if n.sign() == num_bigint::Sign::Minus => BigNumber::zero(p),
        None => BigNumber::infini(false, p),
    }
}

/// Logarithme naturel réel ; x <= 0 => erreur de domaine.
pub fn ln(x: &BigNumber) -> Result<BigNumber> {
    let p = x.precision();
    if x.is_nan() {
        return Ok(x.clone());
    }
    if x.is_zero() {
        return Err(FormulaError::domain("logarithme de zéro"));
    }
    if x.is_sign_negative() {
        return Err(FormulaError::domain("logarithme d’un nombre négatif"));
    }
    if x.is_infinite() {
        return Ok(x.clone());
    }

    let t = x - &BigNumber::one(p);
    if t.is_zero() {
        return Ok(BigNumber::zero(p));
    }

    let ordre = x.ordre();
    let mut w = largeur(p) + ordre.unsigned_abs().to_string().len();
    if ordre == 0 || ordre == -1 {
        // près de 1 : annulation
        w += (-t.ordre()).max(0) as usize;
    }
    let scale = pow10(w);

    // y = x / 10^ordre dans [1, 10), puis y / 2^k dans [1, 2)
    let (m, e) = x.parts();
    let decal = e - ordre + w as i64;
    let mut sy = BigInt::from(m.clone()) * pow10(decal.max(0) as usize);
    let deux = &scale * 2;
    let mut k: u32 = 0;
    while sy >= deux {
        sy >>= 1;
        k += 1;
    }

    // ln(y) = 2*atanh(z), z = (y-1)/(y+1) < 1/3
    let z = div_s(&(&sy - &scale), &(&sy + &scale), &scale);
    let z2 = mul_s(&z, &z, &scale);
    let mut puis = z;
    let mut somme = BigInt::zero();
    let mut j: u64 = 0;
    loop {
        let terme = &puis / BigInt::from(2 * j + 1);
        if terme.is_zero() {
            break;
        }
        somme += terme;
        puis = mul_s(&puis, &z2, &scale);
        j += 1;
    }

    let res = somme * 2
        + constante_scaled(Constante::Ln2, w) * k
        + constante_scaled(Constante::Ln10, w) * ordre;
    Ok(BigNumber::depuis_scaled(&res, w, p))
}

/// x^y réel, exposant quelconque : base > 0, ou base nulle et y > 0.
pub fn pow_reel(x: &BigNumber, y: &BigNumber) -> Result<BigNumber> {
    let p = x.precision().max(y.precision());
    if x.is_nan() || y.is_nan() {
        return Ok(BigNumber::nan(p));
    }
    if x.is_zero() {
        return match y.partial_cmp(&BigNumber::zero(p)) {
            Some(Ordering::Greater) => Ok(BigNumber::zero(p)),
            Some(Ordering::Equal) => Ok(BigNumber::one(p)),
            _ => Err(FormulaError::domain("zéro élevé à une puissance négative")),
        };
    }
    if x.is_sign_negative() {
        return Err(FormulaError::domain(
            "puissance non entière d’un nombre négatif",
        ));
    }
    if x.is_infinite() {
        return Ok(if y.is_sign_negative() {
            BigNumber::zero(p)
        } else {
            BigNumber::infini(false, p)
        });
    }

    // |y*ln x| grand : chiffres en plus pour l’exponentielle
    let l = ln(&x.with_precision(p))?;
    let produit = y * &l;
    // exp sature déjà au-delà de 10^16
    if !produit.is_finite() || produit.ordre() >= 16 {
        return Ok(exp(&produit).with_precision(p));
    }
    let q = p + (produit.ordre() + 1).max(0) as usize;
    let l = ln(&x.with_precision(q))?;
    let v = exp(&(&y.with_precision(q) * &l));
    Ok(v.with_precision(p))
}

/* ------------------------ Trigonométrie ------------------------ */

fn sin_cos_scaled(r: &BigInt, scale: &BigInt) -> (BigInt, BigInt) {
    let r2 = mul_s(r, r, scale);

    let mut s = r.clone();
    let mut terme = r.clone();
    let mut k: u64 = 1;
    loop {
        terme = -(&terme * &r2) / (scale * BigInt::from((2 * k) * (2 * k + 1)));
        if terme.is_zero() {
            break;
        }
        s += &terme;
        k += 1;
    }

    let mut c = scale.clone();
    let mut terme = scale.clone();
    let mut k: u64 = 1;
    loop {
        terme = -(&terme * &r2) / (scale * BigInt::from((2 * k - 1) * (2 * k)));
        if terme.is_zero() {
            break;
        }
        c += &terme;
        k += 1;
    }

    (s, c)
}

/// (sin x, cos x) par réduction modulo π/2.
pub fn sin_cos(x: &BigNumber) -> Result<(BigNumber, BigNumber)> {
    let p = x.precision();
    if !x.is_finite() {
        return Ok((BigNumber::nan(p), BigNumber::nan(p)));
    }
    if negligeable(x) {
        return Ok((x.clone(), BigNumber::one(p)));
    }
    let ordre = x.ordre();
    if ordre > ORDRE_TRIG_MAX {
        return Err(FormulaError::domain("argument trigonométrique trop grand"));
    }

    let voulu = largeur(p);
    let mut w = voulu + (ordre + 1).max(0) as usize;
    let mut essai = 0;
    loop {
        let scale = pow10(w);
        let sx = x.vers_scaled(w);
        let demi = constante_scaled(Constante::Pi, w) / 2;
        let n = div_arrondie(&sx, &demi);
        let r = &sx - &n * &demi;

        // r trop court (x proche d’un multiple de π/2, ou petit) : on élargit
        let presents = nb_chiffres(r.magnitude());
        if !r.is_zero() && presents < voulu && essai < 2 {
            w += voulu - presents;
            essai += 1;
            continue;
        }

        let (s, c) = sin_cos_scaled(&r, &scale);
        let quadrant = ((n % 4u32) + 4u32) % 4u32;
        let (vs, vc) = match quadrant.to_u8() {
            Some(0) => (s, c),
            Some(1) => (c, -s),
            Some(2) => (-s, -c),
            _ => (-c, s),
        };
        return Ok((
            BigNumber::depuis_scaled(&vs, w, p),
            BigNumber::depuis_scaled(&vc, w, p),
        ));
    }
}

pub fn sin(x: &BigNumber) -> Result<BigNumber> {
    Ok(sin_cos(x)?.0)
}

pub fn cos(x: &BigNumber) -> Result<BigNumber> {
    Ok(sin_cos(x)?.1)
}

pub fn tan(x: &BigNumber) -> Result<BigNumber> {
    let (s, c) = sin_cos(x)?;
    s.checked_div(&c)
        .map_err(|_| FormulaError::domain("tangente : pôle"))
}

/// atan, |x| < 1 : trois demi-angles puis série.
fn atan_petit(x: &BigNumber) -> BigNumber {
    if negligeable(x) {
        return x.clone();
    }
    let p = x.precision();
    let w = largeur(p) + (-x.ordre()).max(0) as usize;
    let scale = pow10(w);

    // t <- t / (1 + √(1 + t²))
    let mut t = x.vers_scaled(w);
    for _ in 0..3 {
        let t2 = mul_s(&t, &t, &scale);
        let rac = racine_entiere(&((&scale + t2) * &scale));
        t = div_s(&t, &(&scale + rac), &scale);
    }

    let t2 = mul_s(&t, &t, &scale);
    let mut puis = t;
    let mut somme = BigInt::zero();
    let mut k: u64 = 0;
    let mut sign_pos = true;
    loop {
        let terme = &puis / BigInt::from(2 * k + 1);
        if terme.is_zero() {
            break;
        }
        if sign_pos {
            somme += terme;
        } else {
            somme -= terme;
        }
        puis = mul_s(&puis, &t2, &scale);
        sign_pos = !sign_pos;
        k += 1;
    }

    BigNumber::depuis_scaled(&(somme * 8), w, p)
}

pub fn atan(x: &BigNumber) -> Result<BigNumber> {
    let p = x.precision();
    if x.is_nan() || negligeable(x) {
        return Ok(x.clone());
    }
    if x.is_infinite() {
        return Ok(demi_pi(p, x.is_sign_negative()));
    }

    match x.cmp_abs(&BigNumber::one(p)) {
        Some(Ordering::Greater) => {
            // atan(x) = ±π/2 - atan(1/x)
            let inv = x.recip()?;
            let pi_2 = demi_pi(p, x.is_sign_negative());
            if negligeable(&inv) {
                return Ok(&pi_2 - &inv);
            }
            Ok(&pi_2 - &atan_petit(&inv))
        }
        Some(Ordering::Equal) => Ok(&demi_pi(p, x.is_sign_negative()) * &moitie(p)),
        _ => Ok(atan_petit(x)),
    }
}

/// asin à la précision q (x porte au plus q/2 chiffres : 1 - x² exact).
fn asin_eleve(x: &BigNumber, q: usize) -> Result<BigNumber> {
    let xe = x.with_precision(q);
    let d = &BigNumber::one(q) - &(&xe * &xe);
    let r = sqrt(&d)?;
    atan(&xe.checked_div(&r)?)
}

fn hors_unite(x: &BigNumber) -> Option<Ordering> {
    x.cmp_abs(&BigNumber::one(x.precision()))
}

pub fn asin(x: &BigNumber) -> Result<BigNumber> {
    let p = x.precision();
    if x.is_nan() || negligeable(x) {
        return Ok(x.clone());
    }
    match hors_unite(x) {
        None => Ok(BigNumber::nan(p)),
        Some(Ordering::Greater) => Err(FormulaError::domain("asin : argument hors de [-1, 1]")),
        Some(Ordering::Equal) => Ok(demi_pi(p, x.is_sign_negative())),
        Some(Ordering::Less) => {
            let q = 2 * (p + GARDE);
            Ok(asin_eleve(x, q)?.with_precision(p))
        }
    }
}

pub fn acos(x: &BigNumber) -> Result<BigNumber> {
    let p = x.precision();
    if x.is_nan() {
        return Ok(x.clone());
    }
    match hors_unite(x) {
        None => Ok(BigNumber::nan(p)),
        Some(Ordering::Greater) => Err(FormulaError::domain("acos : argument hors de [-1, 1]")),
        Some(Ordering::Equal) if x.is_sign_negative() => Ok(pi(p)),
        Some(Ordering::Equal) => Ok(BigNumber::zero(p)),
        Some(Ordering::Less) => {
            let q = 2 * (p + GARDE);
            let v = &demi_pi(q, false) - &asin_eleve(x, q)?;
            Ok(v.with_precision(p))
        }
    }
}

/// atan2(y, x) : argument principal dans ]-π, π], zéros signés à la IEEE.
pub fn atan2(y: &BigNumber, x: &BigNumber) -> Result<BigNumber> {
    let p = x.precision().max(y.precision());
    if x.is_nan() || y.is_nan() {
        return Ok(BigNumber::nan(p));
    }
    let signe_pi = |negatif: bool| if negatif { -pi(p) } else { pi(p) };

    if y.is_zero() {
        return Ok(if x.is_sign_negative() {
            signe_pi(y.is_sign_negative())
        } else {
            y.with_precision(p)
        });
    }
    if x.is_zero() {
        return Ok(demi_pi(p, y.is_sign_negative()));
    }
    if x.is_infinite() || y.is_infinite() {
        let quart = &demi_pi(p, y.is_sign_negative()) * &moitie(p);
        return Ok(match (x.is_infinite(), y.is_infinite()) {
            (true, true) if x.is_sign_negative() => &quart * &BigNumber::from_i64(3, p),
            (true, true) => quart,
            (true, false) if x.is_sign_negative() => signe_pi(y.is_sign_negative()),
            (true, false) => BigNumber::zero_signe(y.is_sign_negative(), p),
            _ => demi_pi(p, y.is_sign_negative()),
        });
    }

    let a = atan(&y.checked_div(x)?)?;
    if x.is_sign_negative() {
        Ok(if y.is_sign_negative() {
            &a - &pi(p)
        } else {
            &a + &pi(p)
        })
    } else {
        Ok(a)
    }
}

/* ------------------------ Hyperboliques ------------------------ */

/// (e^x, e^-x) avec des chiffres en plus si x est petit (annulation).
fn exp_paire(x: &BigNumber) -> (BigNumber, BigNumber, usize) {
    let q = x.precision() + (-x.ordre()).max(0) as usize;
    let xe = x.with_precision(q);
    (exp(&xe), exp(&-&xe), q)
}

pub fn sinh(x: &BigNumber) -> BigNumber {
    if !x.is_finite() || negligeable(x) {
        return x.clone();
    }
    let (a, b, q) = exp_paire(x);
    (&(&a - &b) * &moitie(q)).with_precision(x.precision())
}

pub fn cosh(x: &BigNumber) -> BigNumber {
    let p = x.precision();
    if x.is_nan() {
        return x.clone();
    }
    if x.is_infinite() {
        return BigNumber::infini(false, p);
    }
    if negligeable(x) {
        return BigNumber::one(p);
    }
    let (a, b, q) = exp_paire(x);
    (&(&a + &b) * &moitie(q)).with_precision(p)
}

pub fn tanh(x: &BigNumber) -> Result<BigNumber> {
    let p = x.precision();
    if x.is_nan() || negligeable(x) {
        return Ok(x.clone());
    }
    let un = |negatif: bool| {
        let v = BigNumber::one(p);
        if negatif {
            -v
        } else {
            v
        }
    };
    if x.is_infinite() {
        return Ok(un(x.is_sign_negative()));
    }
    let (a, b, _) = exp_paire(x);
    if a.is_infinite() || b.is_infinite() {
        return Ok(un(x.is_sign_negative()));
    }
    let v = (&a - &b).checked_div(&(&a + &b))?;
    Ok(v.with_precision(p))
}
