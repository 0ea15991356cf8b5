// src/noyau/complexe.rs
//
// ComplexValue : (re, im) + drapeau “complexe”.
// - Le drapeau suit la provenance : vrai dès que l’unité imaginaire a servi
//   dans le sous-arbre, même si im finit à zéro.
// - Valeur non complexe : fonctions dans le domaine réel (sinon erreur de domaine).
// - Valeur complexe : branches principales.

use super::erreur::{FormulaError, Result};
use super::nombre::{BigNumber, GARDE};
use super::transcendantes as tr;

/// Plus grand exposant entier calculé par carrés successifs.
const EXPOSANT_ENTIER_MAX: i64 = 1 << 20;

#[derive(Clone, Debug, PartialEq)]
pub struct ComplexValue {
    pub re: BigNumber,
    pub im: BigNumber,
    complexe: bool,
}

impl ComplexValue {
    pub fn reel(re: BigNumber) -> Self {
        let p = re.precision();
        Self {
            re,
            im: BigNumber::zero(p),
            complexe: false,
        }
    }

    pub fn new(re: BigNumber, im: BigNumber) -> Self {
        Self {
            re,
            im,
            complexe: true,
        }
    }

    /// Unité imaginaire (0, 1).
    pub fn i(precision: usize) -> Self {
        Self::new(BigNumber::zero(precision), BigNumber::one(precision))
    }

    /// Résultat d’une relation : 1 ou 0, contamination conservée.
    pub fn booleen(vrai: bool, precision: usize, complexe: bool) -> Self {
        let re = if vrai {
            BigNumber::one(precision)
        } else {
            BigNumber::zero(precision)
        };
        Self::avec(re, BigNumber::zero(precision), complexe)
    }

    fn avec(re: BigNumber, im: BigNumber, complexe: bool) -> Self {
        Self { re, im, complexe }
    }

    pub fn is_complex(&self) -> bool {
        self.complexe
    }

    pub fn precision(&self) -> usize {
        self.re.precision().max(self.im.precision())
    }

    pub fn is_zero(&self) -> bool {
        self.re.is_zero() && self.im.is_zero()
    }

    fn with_precision(&self, p: usize) -> Self {
        Self::avec(self.re.with_precision(p), self.im.with_precision(p), self.complexe)
    }

    /// Calcul à precision + GARDE, puis retour à la précision d’origine.
    fn eleve<F>(&self, f: F) -> Result<Self>
    where
        F: FnOnce(&Self) -> Result<Self>,
    {
        let p = self.precision();
        let v = f(&self.with_precision(p + GARDE))?;
        Ok(v.with_precision(p))
    }

    /// Contamination héritée d’un opérande.
    fn marque(mut self, complexe: bool) -> Self {
        self.complexe |= complexe;
        self
    }

    /* ------------------------ Arithmétique ------------------------ */

    pub fn add(&self, autre: &Self) -> Self {
        Self::avec(
            &self.re + &autre.re,
            &self.im + &autre.im,
            self.complexe || autre.complexe,
        )
    }

    pub fn sub(&self, autre: &Self) -> Self {
        Self::avec(
            &self.re - &autre.re,
            &self.im - &autre.im,
            self.complexe || autre.complexe,
        )
    }

    pub fn neg(&self) -> Self {
        Self::avec(-&self.re, -&self.im, self.complexe)
    }

    /// Produit ; zéros signés conservés : (a+bi)(c+di) = (ac - bd) + (ad + bc)i.
    pub fn mul(&self, autre: &Self) -> Self {
        if !self.complexe && !autre.complexe {
            return Self::reel(&self.re * &autre.re);
        }
        let (a, b, c, d) = (&self.re, &self.im, &autre.re, &autre.im);
        Self::new(&(a * c) - &(b * d), &(a * d) + &(b * c))
    }

    pub fn div(&self, autre: &Self) -> Result<Self> {
        if !self.complexe && !autre.complexe {
            return Ok(Self::reel(self.re.checked_div(&autre.re)?));
        }
        if autre.is_zero() {
            return Err(FormulaError::domain("division par zéro"));
        }
        let (a, b, c, d) = (&self.re, &self.im, &autre.re, &autre.im);
        if d.is_zero() {
            return Ok(Self::new(a.checked_div(c)?, b.checked_div(c)?));
        }
        let den = &(c * c) + &(d * d);
        let re = (&(a * c) + &(b * d)).checked_div(&den)?;
        let im = (&(b * c) - &(a * d)).checked_div(&den)?;
        Ok(Self::new(re, im))
    }

    /// Exposant entier borné (réel, partie imaginaire nulle) ?
    fn exposant_entier(&self) -> Option<i64> {
        if !self.im.is_zero() {
            return None;
        }
        let n = self.re.to_i64()?;
        (n.abs() <= EXPOSANT_ENTIER_MAX).then_some(n)
    }

    /// z^w : réels, exposant entier exact ; complexes, toujours exp(w·log z).
    /// i^2 vaut donc (-1, sin 2·arg i) et non (-1, ±0).
    pub fn pow(&self, w: &Self) -> Result<Self> {
        if !self.complexe && !w.complexe {
            return Ok(Self::reel(match w.exposant_entier() {
                Some(n) => self.re.powi(n)?,
                None => tr::pow_reel(&self.re, &w.re)?,
            }));
        }
        let p = self.precision();
        if w.is_zero() {
            return Ok(Self::new(BigNumber::one(p), BigNumber::zero(p)));
        }
        if self.is_zero() {
            return if w.re.partial_cmp(&BigNumber::zero(w.precision()))
                == Some(std::cmp::Ordering::Greater)
            {
                Ok(Self::new(BigNumber::zero(p), BigNumber::zero(p)))
            } else {
                Err(FormulaError::domain("zéro élevé à une puissance non positive"))
            };
        }
        self.eleve(|z| w.with_precision(z.precision()).mul(&z.log()?).exp())
    }

    /* ------------------------ Fonctions ------------------------ */

    /// Module |z| (réel, drapeau conservé).
    pub fn abs(&self) -> Result<Self> {
        if !self.complexe {
            return Ok(Self::reel(self.re.abs()));
        }
        let m = if self.im.is_zero() {
            self.re.abs()
        } else if self.re.is_zero() {
            self.im.abs()
        } else {
            tr::sqrt(&(&(&self.re * &self.re) + &(&self.im * &self.im)))?
        };
        Ok(Self::new(m, BigNumber::zero(self.precision())))
    }

    pub fn sqrt(&self) -> Result<Self> {
        if !self.complexe {
            return Ok(Self::reel(tr::sqrt(&self.re)?));
        }
        if self.is_zero() {
            return Ok(self.clone());
        }
        self.eleve(|z| {
            let (a, b) = (&z.re, &z.im);
            let r = z.abs()?.re;
            let deux = BigNumber::from_i64(2, z.precision());
            if !a.is_sign_negative() {
                let t = tr::sqrt(&(&r + a).checked_div(&deux)?)?;
                let im = b.checked_div(&(&t * &deux))?;
                Ok(Self::new(t, im))
            } else {
                let t = tr::sqrt(&(&r - a).checked_div(&deux)?)?;
                let re = b.abs().checked_div(&(&t * &deux))?;
                let im = if b.is_sign_negative() { -t } else { t };
                Ok(Self::new(re, im))
            }
        })
    }

    pub fn exp(&self) -> Result<Self> {
        if !self.complexe {
            return Ok(Self::reel(tr::exp(&self.re)));
        }
        let m = tr::exp(&self.re);
        if self.im.is_zero() {
            return Ok(Self::new(m, self.im.clone()));
        }
        let (s, c) = tr::sin_cos(&self.im)?;
        Ok(Self::new(&m * &c, &m * &s))
    }

    /// Logarithme naturel (branche principale, arg dans ]-π, π]).
    pub fn log(&self) -> Result<Self> {
        if !self.complexe {
            return Ok(Self::reel(tr::ln(&self.re)?));
        }
        if self.is_zero() {
            return Err(FormulaError::domain("logarithme de zéro"));
        }
        let module = self.abs()?.re;
        Ok(Self::new(
            tr::ln(&module)?,
            tr::atan2(&self.im, &self.re)?,
        ))
    }

    pub fn sin(&self) -> Result<Self> {
        if !self.complexe {
            return Ok(Self::reel(tr::sin(&self.re)?));
        }
        let (s, c) = tr::sin_cos(&self.re)?;
        Ok(Self::new(
            &s * &tr::cosh(&self.im),
            &c * &tr::sinh(&self.im),
        ))
    }

    pub fn cos(&self) -> Result<Self> {
        if !self.complexe {
            return Ok(Self::reel(tr::cos(&self.re)?));
        }
        let (s, c) = tr::sin_cos(&self.re)?;
        Ok(Self::new(
            &c * &tr::cosh(&self.im),
            -(&s * &tr::sinh(&self.im)),
        ))
    }

    pub fn tan(&self) -> Result<Self> {
        if !self.complexe {
            return Ok(Self::reel(tr::tan(&self.re)?));
        }
        self.eleve(|z| {
            z.sin()?
                .div(&z.cos()?)
                .map_err(|_| FormulaError::domain("tangente : pôle"))
        })
    }

    pub fn sinh(&self) -> Result<Self> {
        if !self.complexe {
            return Ok(Self::reel(tr::sinh(&self.re)));
        }
        let (s, c) = tr::sin_cos(&self.im)?;
        Ok(Self::new(
            &tr::sinh(&self.re) * &c,
            &tr::cosh(&self.re) * &s,
        ))
    }

    pub fn cosh(&self) -> Result<Self> {
        if !self.complexe {
            return Ok(Self::reel(tr::cosh(&self.re)));
        }
        let (s, c) = tr::sin_cos(&self.im)?;
        Ok(Self::new(
            &tr::cosh(&self.re) * &c,
            &tr::sinh(&self.re) * &s,
        ))
    }

    pub fn tanh(&self) -> Result<Self> {
        if !self.complexe {
            return Ok(Self::reel(tr::tanh(&self.re)?));
        }
        self.eleve(|z| {
            z.sinh()?
                .div(&z.cosh()?)
                .map_err(|_| FormulaError::domain("tangente hyperbolique : pôle"))
        })
    }

    /// asin(z) = -i·log(iz + √(1 - z²))
    pub fn asin(&self) -> Result<Self> {
        if !self.complexe {
            return Ok(Self::reel(tr::asin(&self.re)?));
        }
        self.eleve(|z| {
            let p = z.precision();
            let i = Self::i(p);
            let un = Self::reel(BigNumber::one(p));
            let racine = un.sub(&z.mul(z)).sqrt()?;
            let l = i.mul(z).add(&racine).log()?;
            Ok(i.neg().mul(&l))
        })
    }

    /// acos(z) = π/2 - asin(z)
    pub fn acos(&self) -> Result<Self> {
        if !self.complexe {
            return Ok(Self::reel(tr::acos(&self.re)?));
        }
        self.eleve(|z| {
            let p = z.precision();
            let demi_pi = Self::reel(&tr::pi(p) * &BigNumber::construit(false, 5u32.into(), -1, p));
            Ok(demi_pi.sub(&z.asin()?))
        })
    }

    /// atan(z) = (i/2)·(log(1 - iz) - log(1 + iz))
    pub fn atan(&self) -> Result<Self> {
        if !self.complexe {
            return Ok(Self::reel(tr::atan(&self.re)?));
        }
        self.eleve(|z| {
            let p = z.precision();
            let i = Self::i(p);
            let un = Self::reel(BigNumber::one(p));
            let iz = i.mul(z);
            let l = un.sub(&iz).log()?.sub(&un.add(&iz).log()?);
            let demi_i = Self::new(BigNumber::zero(p), BigNumber::construit(false, 5u32.into(), -1, p));
            Ok(demi_i.mul(&l))
        })
    }
}
