// ABOUTME: SI dimension vectors attached to numeric values

use num_rational::Rational64;
use num_traits::Zero;
use std::fmt;

/// The seven SI base quantities, in the fixed component order used by
/// [`Dimension`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseUnit {
    Time,
    Length,
    Mass,
    Current,
    Temperature,
    Amount,
    Luminosity,
}

pub const BASE_UNITS: [BaseUnit; 7] = [
    BaseUnit::Time,
    BaseUnit::Length,
    BaseUnit::Mass,
    BaseUnit::Current,
    BaseUnit::Temperature,
    BaseUnit::Amount,
    BaseUnit::Luminosity,
];

impl BaseUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            BaseUnit::Time => "s",
            BaseUnit::Length => "m",
            BaseUnit::Mass => "kg",
            BaseUnit::Current => "A",
            BaseUnit::Temperature => "K",
            BaseUnit::Amount => "mol",
            BaseUnit::Luminosity => "cd",
        }
    }

    fn index(self) -> usize {
        match self {
            BaseUnit::Time => 0,
            BaseUnit::Length => 1,
            BaseUnit::Mass => 2,
            BaseUnit::Current => 3,
            BaseUnit::Temperature => 4,
            BaseUnit::Amount => 5,
            BaseUnit::Luminosity => 6,
        }
    }
}

/// A vector of rational exponents over the SI base units.
///
/// Exponents stay reduced because all arithmetic goes through
/// `Rational64`, which normalizes on construction.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Dimension([Rational64; 7]);

impl Dimension {
    /// The dimensionless vector (all exponents zero).
    pub const NONE: Dimension = Dimension([Rational64::new_raw(0, 1); 7]);

    /// A single base unit raised to the first power.
    pub fn base(unit: BaseUnit) -> Self {
        let mut exponents = Self::NONE.0;
        exponents[unit.index()] = Rational64::new_raw(1, 1);
        Dimension(exponents)
    }

    pub fn is_none(&self) -> bool {
        self.0.iter().all(Rational64::is_zero)
    }

    pub fn exponent(&self, unit: BaseUnit) -> Rational64 {
        self.0[unit.index()]
    }

    /// Componentwise sum, the dimension of a product.
    pub fn mul(&self, other: &Dimension) -> Dimension {
        let mut exponents = self.0;
        for (exp, rhs) in exponents.iter_mut().zip(other.0.iter()) {
            *exp += *rhs;
        }
        Dimension(exponents)
    }

    /// Componentwise difference, the dimension of a quotient.
    pub fn div(&self, other: &Dimension) -> Dimension {
        let mut exponents = self.0;
        for (exp, rhs) in exponents.iter_mut().zip(other.0.iter()) {
            *exp -= *rhs;
        }
        Dimension(exponents)
    }

    /// Every exponent multiplied by `factor`; the dimension of a power
    /// or a root.
    pub fn scale(&self, factor: Rational64) -> Dimension {
        let mut exponents = self.0;
        for exp in exponents.iter_mut() {
            *exp *= factor;
        }
        Dimension(exponents)
    }
}

fn write_exponent(f: &mut fmt::Formatter<'_>, unit: BaseUnit, exp: Rational64) -> fmt::Result {
    if exp == Rational64::new_raw(1, 1) {
        write!(f, "{}", unit.symbol())
    } else if exp.is_integer() {
        write!(f, "{}^{}", unit.symbol(), exp.numer())
    } else {
        write!(f, "{}^{}/{}", unit.symbol(), exp.numer(), exp.denom())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "dimensionless");
        }
        let mut first = true;
        for unit in BASE_UNITS {
            let exp = self.exponent(unit);
            if exp.is_zero() {
                continue;
            }
            if !first {
                write!(f, " ")?;
            }
            write_exponent(f, unit, exp)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dimension({})", self)
    }
}
