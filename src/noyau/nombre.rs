// src/noyau/nombre.rs
//
// BigNumber : décimal signé multiprécision.
//   valeur = (-1)^negatif × mantisse × 10^exposant
//
// - precision : chiffres significatifs demandés (nominal)
// - GARDE     : chiffres conservés en plus, jamais arrondis avant l’affichage
// - zéro signé, infini et nan suivent les règles IEEE (x - x = +0, -0 + -0 = -0)
// - mantisse toujours normalisée : au plus precision + GARDE chiffres, sans zéros de queue
//
// Valeur immuable : chaque opération construit un nouveau BigNumber.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};

use super::erreur::{FormulaError, Result};

/// Chiffres de garde conservés au-delà de la précision nominale.
pub const GARDE: usize = 10;

/// Borne sur l’ordre décimal : au-delà => infini, en deçà => zéro.
const ORDRE_MAX: i64 = 1_000_000_000_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Genre {
    Fini,
    Infini,
    Nan,
}

#[derive(Clone, Debug)]
pub struct BigNumber {
    genre: Genre,
    negatif: bool,
    mantisse: BigUint,
    exposant: i64,
    precision: usize,
}

/* ------------------------ Outils entiers ------------------------ */

pub(crate) fn pow10u(n: usize) -> BigUint {
    BigUint::from(10u32).pow(n as u32)
}

/// Nombre de chiffres décimaux de m (1 pour zéro).
pub(crate) fn nb_chiffres(m: &BigUint) -> usize {
    if m.is_zero() {
        return 1;
    }
    let bits = m.bits();
    let mut d = ((bits - 1) as f64 * std::f64::consts::LOG10_2).floor() as usize + 1;
    while *m >= pow10u(d) {
        d += 1;
    }
    while d > 1 && *m < pow10u(d - 1) {
        d -= 1;
    }
    d
}

/// Exposant littéral (signe optionnel, au moins un chiffre), saturé.
fn lire_exposant(texte: &str) -> Option<i64> {
    let (negatif, chiffres) = match texte.as_bytes().first() {
        Some(b'-') => (true, &texte[1..]),
        Some(b'+') => (false, &texte[1..]),
        _ => (false, texte),
    };
    if chiffres.is_empty() || !chiffres.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let utiles = chiffres.trim_start_matches('0');
    let v = if utiles.len() > 17 {
        2 * ORDRE_MAX
    } else if utiles.is_empty() {
        0
    } else {
        utiles.parse::<i64>().ok()?
    };
    Some(if negatif { -v } else { v })
}

impl BigNumber {
    /* ------------------------ Constructeurs ------------------------ */

    pub fn zero(precision: usize) -> Self {
        Self::zero_signe(false, precision)
    }

    pub fn zero_signe(negatif: bool, precision: usize) -> Self {
        Self {
            genre: Genre::Fini,
            negatif,
            mantisse: BigUint::zero(),
            exposant: 0,
            precision,
        }
    }

    pub fn one(precision: usize) -> Self {
        Self::from_i64(1, precision)
    }

    pub fn from_i64(n: i64, precision: usize) -> Self {
        Self::construit(
            n < 0,
            BigUint::from(n.unsigned_abs()),
            0,
            precision,
        )
    }

    pub fn nan(precision: usize) -> Self {
        Self {
            genre: Genre::Nan,
            negatif: false,
            mantisse: BigUint::zero(),
            exposant: 0,
            precision,
        }
    }

    pub fn infini(negatif: bool, precision: usize) -> Self {
        Self {
            genre: Genre::Infini,
            negatif,
            mantisse: BigUint::zero(),
            exposant: 0,
            precision,
        }
    }

    /// Construit et arrondit à precision + GARDE chiffres.
    pub(crate) fn construit(negatif: bool, mantisse: BigUint, exposant: i64, precision: usize) -> Self {
        Self::construit_arrondi(negatif, mantisse, exposant, precision, precision + GARDE)
    }

    /// Arrondi demi vers le haut (en magnitude) à `chiffres` chiffres significatifs.
    fn construit_arrondi(
        negatif: bool,
        mut m: BigUint,
        mut e: i64,
        precision: usize,
        chiffres: usize,
    ) -> Self {
        if m.is_zero() {
            return Self::zero_signe(negatif, precision);
        }
        let chiffres = chiffres.max(1);

        let d = nb_chiffres(&m);
        let ordre = e.saturating_add(d as i64 - 1);
        if ordre > ORDRE_MAX {
            return Self::infini(negatif, precision);
        }
        if ordre < -ORDRE_MAX {
            return Self::zero_signe(negatif, precision);
        }

        if d > chiffres {
            let coupe = d - chiffres;
            let p = pow10u(coupe);
            let reste = &m % &p;
            m /= &p;
            if reste * 2u32 >= p {
                m += 1u32;
            }
            e += coupe as i64;
        }

        // zéros de queue
        while (&m % 10u32).is_zero() {
            m /= 10u32;
            e += 1;
        }

        Self {
            genre: Genre::Fini,
            negatif,
            mantisse: m,
            exposant: e,
            precision,
        }
    }

    /// Lit un texte décimal : `[+-] chiffres [. chiffres] [(e|E) [+-] chiffres]`,
    /// ou `nan`, `inf`, `-inf`. Espaces autour tolérés.
    pub fn parse(texte: &str, precision: usize) -> Option<Self> {
        let t = texte.trim();
        let (negatif, corps) = match t.as_bytes().first() {
            Some(b'-') => (true, &t[1..]),
            Some(b'+') => (false, &t[1..]),
            _ => (false, t),
        };

        match corps.to_ascii_lowercase().as_str() {
            "nan" => return Some(Self::nan(precision)),
            "inf" | "infinity" => return Some(Self::infini(negatif, precision)),
            _ => {}
        }

        let (mant, exposant) = match corps.find(|c: char| c == 'e' || c == 'E') {
            Some(i) => (&corps[..i], lire_exposant(&corps[i + 1..])?),
            None => (corps, 0),
        };
        let (ent, frac) = match mant.find('.') {
            Some(i) => (&mant[..i], &mant[i + 1..]),
            None => (mant, ""),
        };
        if ent.is_empty() && frac.is_empty() {
            return None;
        }
        let tous_chiffres = |s: &str| s.bytes().all(|c| c.is_ascii_digit());
        if !tous_chiffres(ent) || !tous_chiffres(frac) {
            return None;
        }

        let texte_m = format!("{ent}{frac}");
        let m = BigUint::parse_bytes(texte_m.as_bytes(), 10)?;
        let e = exposant.saturating_sub(frac.len() as i64);
        Some(Self::construit(negatif, m, e, precision))
    }

    /// Entier “scalé” (×10^w) -> BigNumber.
    pub(crate) fn depuis_scaled(s: &BigInt, w: usize, precision: usize) -> Self {
        let negatif = s.sign() == Sign::Minus;
        Self::construit(negatif, s.magnitude().clone(), -(w as i64), precision)
    }

    /// BigNumber -> entier “scalé” tronqué : trunc(x × 10^w).
    /// L’appelant borne l’ordre de x.
    pub(crate) fn vers_scaled(&self, w: usize) -> BigInt {
        if self.genre != Genre::Fini || self.mantisse.is_zero() {
            return BigInt::zero();
        }
        let decal = self.exposant + w as i64;
        if decal < 0 && (-decal) as usize > nb_chiffres(&self.mantisse) {
            return BigInt::zero();
        }
        let mag = if decal >= 0 {
            &self.mantisse * pow10u(decal as usize)
        } else {
            &self.mantisse / pow10u((-decal) as usize)
        };
        let sign = if self.negatif { Sign::Minus } else { Sign::Plus };
        BigInt::from_biguint(sign, mag)
    }

    /// Même valeur, autre précision nominale (ré-arrondie si besoin).
    pub fn with_precision(&self, precision: usize) -> Self {
        match self.genre {
            Genre::Fini => Self::construit(
                self.negatif,
                self.mantisse.clone(),
                self.exposant,
                precision,
            ),
            _ => Self {
                precision,
                ..self.clone()
            },
        }
    }

    /* ------------------------ Lecture ------------------------ */

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn genre(&self) -> Genre {
        self.genre
    }

    pub fn is_finite(&self) -> bool {
        self.genre == Genre::Fini
    }

    pub fn is_nan(&self) -> bool {
        self.genre == Genre::Nan
    }

    pub fn is_infinite(&self) -> bool {
        self.genre == Genre::Infini
    }

    pub fn is_zero(&self) -> bool {
        self.genre == Genre::Fini && self.mantisse.is_zero()
    }

    /// Bit de signe (vrai aussi pour -0 et -inf).
    pub fn is_sign_negative(&self) -> bool {
        self.negatif
    }

    /// Strictement négatif (exclut -0).
    pub fn is_negative(&self) -> bool {
        self.negatif && !self.is_zero() && !self.is_nan()
    }

    pub fn is_integer(&self) -> bool {
        self.genre == Genre::Fini && (self.mantisse.is_zero() || self.exposant >= 0)
    }

    /// Ordre décimal : floor(log10 |x|). Zéro => 0.
    pub fn ordre(&self) -> i64 {
        if self.mantisse.is_zero() {
            return 0;
        }
        self.exposant + nb_chiffres(&self.mantisse) as i64 - 1
    }

    /// Mantisse et exposant bruts (x = ±m × 10^e).
    pub(crate) fn parts(&self) -> (&BigUint, i64) {
        (&self.mantisse, self.exposant)
    }

    /// Valeur entière exacte, si |x| < 10^18.
    pub fn to_i64(&self) -> Option<i64> {
        if !self.is_integer() {
            return None;
        }
        if self.mantisse.is_zero() {
            return Some(0);
        }
        if self.ordre() >= 18 {
            return None;
        }
        let v = (&self.mantisse * pow10u(self.exposant as usize)).to_i64()?;
        Some(if self.negatif { -v } else { v })
    }

    /* ------------------------ Arithmétique ------------------------ */

    pub fn abs(&self) -> Self {
        Self {
            negatif: false,
            ..self.clone()
        }
    }

    fn somme(a: &Self, b: &Self) -> Self {
        use Genre::*;

        let precision = a.precision.max(b.precision);
        match (a.genre, b.genre) {
            (Nan, _) | (_, Nan) => return Self::nan(precision),
            (Infini, Infini) => {
                return if a.negatif == b.negatif {
                    Self::infini(a.negatif, precision)
                } else {
                    Self::nan(precision)
                };
            }
            (Infini, _) => return Self::infini(a.negatif, precision),
            (_, Infini) => return Self::infini(b.negatif, precision),
            _ => {}
        }

        if a.is_zero() && b.is_zero() {
            return Self::zero_signe(a.negatif && b.negatif, precision);
        }
        if a.is_zero() {
            return b.with_precision(precision);
        }
        if b.is_zero() {
            return a.with_precision(precision);
        }

        let chiffres = (precision + GARDE) as i64;
        let (grand, petit) = if a.ordre() >= b.ordre() { (a, b) } else { (b, a) };

        // petit hors de portée de l’arrondi : un chiffre “collant” suffit
        let seuil = grand.ordre() - chiffres - 2;
        let (pm, pe) = if petit.ordre() < seuil {
            (BigUint::one(), seuil - 1)
        } else {
            (petit.mantisse.clone(), petit.exposant)
        };

        let e = grand.exposant.min(pe);
        let gm = &grand.mantisse * pow10u((grand.exposant - e) as usize);
        let pm = pm * pow10u((pe - e) as usize);

        if grand.negatif == petit.negatif {
            return Self::construit(grand.negatif, gm + pm, e, precision);
        }
        match gm.cmp(&pm) {
            Ordering::Equal => Self::zero(precision),
            Ordering::Greater => Self::construit(grand.negatif, gm - pm, e, precision),
            Ordering::Less => Self::construit(petit.negatif, pm - gm, e, precision),
        }
    }

    fn produit(a: &Self, b: &Self) -> Self {
        use Genre::*;

        let precision = a.precision.max(b.precision);
        let negatif = a.negatif != b.negatif;
        match (a.genre, b.genre) {
            (Nan, _) | (_, Nan) => Self::nan(precision),
            (Infini, _) | (_, Infini) => {
                if a.is_zero() || b.is_zero() {
                    Self::nan(precision)
                } else {
                    Self::infini(negatif, precision)
                }
            }
            (Fini, Fini) => Self::construit(
                negatif,
                &a.mantisse * &b.mantisse,
                a.exposant.saturating_add(b.exposant),
                precision,
            ),
        }
    }

    /// Division ; diviseur nul => erreur de domaine.
    pub fn checked_div(&self, autre: &Self) -> Result<Self> {
        use Genre::*;

        let precision = self.precision.max(autre.precision);
        let negatif = self.negatif != autre.negatif;

        if autre.is_zero() {
            return Err(FormulaError::domain("division par zéro"));
        }
        match (self.genre, autre.genre) {
            (Nan, _) | (_, Nan) => return Ok(Self::nan(precision)),
            (Infini, Infini) => return Ok(Self::nan(precision)),
            (Infini, _) => return Ok(Self::infini(negatif, precision)),
            (_, Infini) => return Ok(Self::zero_signe(negatif, precision)),
            _ => {}
        }
        if self.is_zero() {
            return Ok(Self::zero_signe(negatif, precision));
        }

        let chiffres = precision + GARDE;
        let da = nb_chiffres(&self.mantisse);
        let db = nb_chiffres(&autre.mantisse);
        let decal = (chiffres + 2 + db).saturating_sub(da);

        let num = &self.mantisse * pow10u(decal);
        let mut q = &num / &autre.mantisse;
        let mut e = self
            .exposant
            .saturating_sub(autre.exposant)
            .saturating_sub(decal as i64);
        if !(num % &autre.mantisse).is_zero() {
            // chiffre collant : le quotient n’est pas exact
            q = q * 10u32 + 1u32;
            e -= 1;
        }
        Ok(Self::construit(negatif, q, e, precision))
    }

    /// Inverse 1/x.
    pub fn recip(&self) -> Result<Self> {
        Self::one(self.precision).checked_div(self)
    }

    /// Puissance entière exacte (exponentiation binaire).
    pub fn powi(&self, n: i64) -> Result<Self> {
        if n == 0 {
            return Ok(Self::one(self.precision));
        }
        if n < 0 {
            if self.is_zero() {
                return Err(FormulaError::domain("zéro élevé à une puissance négative"));
            }
            return self.powi(-n)?.recip();
        }

        let mut e = n as u64;
        let mut acc = Self::one(self.precision);
        let mut b = self.clone();
        while e > 0 {
            if (e & 1) == 1 {
                acc = &acc * &b;
            }
            e >>= 1;
            if e > 0 {
                b = &b * &b;
            }
        }
        Ok(acc)
    }

    /* ------------------------ Comparaisons ------------------------ */

    fn cmp_abs_fini(a: &Self, b: &Self) -> Ordering {
        match (a.mantisse.is_zero(), b.mantisse.is_zero()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        let (oa, ob) = (a.ordre(), b.ordre());
        if oa != ob {
            return oa.cmp(&ob);
        }
        let e = a.exposant.min(b.exposant);
        let ma = &a.mantisse * pow10u((a.exposant - e) as usize);
        let mb = &b.mantisse * pow10u((b.exposant - e) as usize);
        ma.cmp(&mb)
    }

    /// Comparaison exacte des magnitudes (nan => None).
    pub fn cmp_abs(&self, autre: &Self) -> Option<Ordering> {
        use Genre::*;
        match (self.genre, autre.genre) {
            (Nan, _) | (_, Nan) => None,
            (Infini, Infini) => Some(Ordering::Equal),
            (Infini, _) => Some(Ordering::Greater),
            (_, Infini) => Some(Ordering::Less),
            (Fini, Fini) => Some(Self::cmp_abs_fini(self, autre)),
        }
    }

    /// Arrondi à la précision nominale (comparaison “visible”).
    fn arrondi_nominal(&self, precision: usize) -> Self {
        if self.genre != Genre::Fini {
            return self.clone();
        }
        Self::construit_arrondi(
            self.negatif,
            self.mantisse.clone(),
            self.exposant,
            self.precision,
            precision,
        )
    }
}

/* ------------------------ Opérateurs ------------------------ */

impl Add for &BigNumber {
    type Output = BigNumber;
    fn add(self, autre: &BigNumber) -> BigNumber {
        BigNumber::somme(self, autre)
    }
}

impl Sub for &BigNumber {
    type Output = BigNumber;
    fn sub(self, autre: &BigNumber) -> BigNumber {
        BigNumber::somme(self, &-autre)
    }
}

impl Mul for &BigNumber {
    type Output = BigNumber;
    fn mul(self, autre: &BigNumber) -> BigNumber {
        BigNumber::produit(self, autre)
    }
}

impl Neg for &BigNumber {
    type Output = BigNumber;
    fn neg(self) -> BigNumber {
        if self.is_nan() {
            return self.clone();
        }
        BigNumber {
            negatif: !self.negatif,
            ..self.clone()
        }
    }
}

impl Neg for BigNumber {
    type Output = BigNumber;
    fn neg(self) -> BigNumber {
        -&self
    }
}

/// Égalité à la précision nominale : les chiffres de garde sont ignorés.
impl PartialEq for BigNumber {
    fn eq(&self, autre: &Self) -> bool {
        use Genre::*;
        match (self.genre, autre.genre) {
            (Nan, _) | (_, Nan) => false,
            (Infini, Infini) => self.negatif == autre.negatif,
            (Fini, Fini) => {
                let p = self.precision.min(autre.precision);
                let a = self.arrondi_nominal(p);
                let b = autre.arrondi_nominal(p);
                if a.is_zero() && b.is_zero() {
                    return true;
                }
                a.negatif == b.negatif && a.mantisse == b.mantisse && a.exposant == b.exposant
            }
            _ => false,
        }
    }
}

impl PartialOrd for BigNumber {
    fn partial_cmp(&self, autre: &Self) -> Option<Ordering> {
        let mag = self.cmp_abs(autre)?;
        let zero_a = self.is_zero();
        let zero_b = autre.is_zero();
        if zero_a && zero_b {
            return Some(Ordering::Equal);
        }
        let neg_a = self.negatif && !zero_a;
        let neg_b = autre.negatif && !zero_b;
        Some(match (neg_a, neg_b) {
            (false, false) => mag,
            (true, true) => mag.reverse(),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
        })
    }
}

/// Tous les chiffres retenus, notation par défaut.
impl fmt::Display for BigNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::format::formate_reel(
            self,
            0,
            super::format::Notation::Default,
        ))
    }
}
