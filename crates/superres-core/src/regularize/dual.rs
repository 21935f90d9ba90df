//! Forward-mode automatic differentiation.
//!
//! [`Dual`] carries a value together with its partial derivatives with respect
//! to every image pixel. Only non-zero partials are stored, sorted by pixel
//! index, so a residual that touches three pixels stays three entries long.

use std::ops::{Add, Mul, Sub};

use num_traits::Zero;

/// Scalar arithmetic needed to evaluate a total-variation residual, shared by
/// plain `f64` evaluation and derivative-tracking [`Dual`] evaluation.
pub trait TvScalar: Clone + Zero + Sub<Output = Self> + Mul<Output = Self> {
    /// Square root. Where a derivative is propagated, its denominator uses
    /// `max(sqrt(self), floor)`.
    fn floored_sqrt(self, floor: f64) -> Self;

    /// `sqrt(dx^2 + dy^2)`, with the same derivative floor as
    /// [`floored_sqrt`](Self::floored_sqrt).
    fn gradient_magnitude(dx: Self, dy: Self, floor: f64) -> Self {
        (dy.clone() * dy + dx.clone() * dx).floored_sqrt(floor)
    }
}

impl TvScalar for f64 {
    fn floored_sqrt(self, _floor: f64) -> Self {
        self.sqrt()
    }

    // hypot avoids the overflow of dx * dx once |dx| passes about 1e154.
    fn gradient_magnitude(dx: Self, dy: Self, _floor: f64) -> Self {
        dx.hypot(dy)
    }
}

/// Value plus sparse gradient with respect to the image pixels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dual {
    value: f64,
    partials: Vec<(usize, f64)>,
}

impl Dual {
    /// A constant, with every partial equal to zero.
    pub fn constant(value: f64) -> Self {
        Self {
            value,
            partials: Vec::new(),
        }
    }

    /// The independent variable for pixel `index`: d(self)/d(x_index) = 1.
    pub fn variable(value: f64, index: usize) -> Self {
        Self {
            value,
            partials: vec![(index, 1.0)],
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Partial derivative with respect to pixel `index`.
    pub fn partial(&self, index: usize) -> f64 {
        self.partials
            .binary_search_by_key(&index, |&(i, _)| i)
            .map(|pos| self.partials[pos].1)
            .unwrap_or(0.0)
    }

    /// Non-zero partials as `(pixel index, derivative)` pairs.
    pub fn partials(&self) -> &[(usize, f64)] {
        &self.partials
    }

    /// `a * self' + b * other'`, merged by pixel index.
    fn combine_partials(&self, a: f64, other: &Dual, b: f64) -> Vec<(usize, f64)> {
        let mut merged = Vec::with_capacity(self.partials.len() + other.partials.len());
        let (mut i, mut j) = (0, 0);
        while i < self.partials.len() || j < other.partials.len() {
            let left = self.partials.get(i);
            let right = other.partials.get(j);
            let entry = match (left, right) {
                (Some(&(li, lv)), Some(&(ri, rv))) if li == ri => {
                    i += 1;
                    j += 1;
                    (li, a * lv + b * rv)
                }
                (Some(&(li, lv)), Some(&(ri, _))) if li < ri => {
                    i += 1;
                    (li, a * lv)
                }
                (Some(&(li, lv)), None) => {
                    i += 1;
                    (li, a * lv)
                }
                (_, Some(&(ri, rv))) => {
                    j += 1;
                    (ri, b * rv)
                }
                (None, None) => break,
            };
            if entry.1 != 0.0 {
                merged.push(entry);
            }
        }
        merged
    }
}

impl Add for Dual {
    type Output = Dual;

    fn add(self, rhs: Dual) -> Dual {
        let partials = self.combine_partials(1.0, &rhs, 1.0);
        Dual {
            value: self.value + rhs.value,
            partials,
        }
    }
}

impl Sub for Dual {
    type Output = Dual;

    fn sub(self, rhs: Dual) -> Dual {
        let partials = self.combine_partials(1.0, &rhs, -1.0);
        Dual {
            value: self.value - rhs.value,
            partials,
        }
    }
}

impl Mul for Dual {
    type Output = Dual;

    // Product rule: (uv)' = u'v + uv'
    fn mul(self, rhs: Dual) -> Dual {
        let partials = self.combine_partials(rhs.value, &rhs, self.value);
        Dual {
            value: self.value * rhs.value,
            partials,
        }
    }
}

impl Zero for Dual {
    fn zero() -> Self {
        Dual::constant(0.0)
    }

    fn is_zero(&self) -> bool {
        self.value == 0.0 && self.partials.is_empty()
    }
}

impl TvScalar for Dual {
    fn floored_sqrt(self, floor: f64) -> Self {
        let root = self.value.sqrt();
        let scale = 0.5 / root.max(floor);
        Dual {
            value: root,
            partials: self
                .partials
                .into_iter()
                .map(|(i, d)| (i, d * scale))
                .collect(),
        }
    }
}
