use std::{cmp::Ordering, fmt::Display, ops::{Add, Mul, Sub}, str::FromStr};

use crate::{constants::{METERS_PER_FOOT, METERS_PER_NAUTICAL_MILE, METERS_PER_STATUTE_MILE}, Error};

/// Units of length a [`Distance`] can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LengthUnit {
    Meter,
    Kilometer,
    NauticalMile,
    StatuteMile,
    Foot,
}

impl LengthUnit {
    /// How many meters one of this unit is. Exact by definition for every
    /// supported unit.
    pub fn meters_per_unit(self) -> f64 {
        match self {
            LengthUnit::Meter => 1.,
            LengthUnit::Kilometer => 1000.,
            LengthUnit::NauticalMile => METERS_PER_NAUTICAL_MILE,
            LengthUnit::StatuteMile => METERS_PER_STATUTE_MILE,
            LengthUnit::Foot => METERS_PER_FOOT,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            LengthUnit::Meter => "m",
            LengthUnit::Kilometer => "km",
            LengthUnit::NauticalMile => "nmi",
            LengthUnit::StatuteMile => "mi",
            LengthUnit::Foot => "ft",
        }
    }
}

impl FromStr for LengthUnit {
    type Err = Error;

    /// Parses a unit symbol or name, case-insensitively. `nm` is read as the
    /// nautical mile, as in navigation, not the nanometer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.trim().to_ascii_lowercase().replace(['_', '-'], " ").as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => LengthUnit::Meter,
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => LengthUnit::Kilometer,
            "nmi" | "nm" | "nautical mile" | "nautical miles" => LengthUnit::NauticalMile,
            "mi" | "mile" | "miles" | "statute mile" | "statute miles" => LengthUnit::StatuteMile,
            "ft" | "foot" | "feet" => LengthUnit::Foot,
            other => {
                return Err(Error::InvalidParameter(format!(
                    "'{other}' is not a unit of length"
                )))
            }
        };

        Ok(unit)
    }
}

impl Display for LengthUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A length tagged with its unit. Arithmetic and comparison between two
/// distances convert to a common unit first.
///
/// # Usage
///
/// ```
/// use trackmarks::{Distance, LengthUnit};
///
/// let major: Distance = "2 nmi".parse().unwrap();
/// assert_eq!(major.meters(), 3704.0);
///
/// let sum = major + Distance::new(148.0, LengthUnit::Meter);
/// assert_eq!(sum.unit(), LengthUnit::NauticalMile);
/// assert!((sum.meters() - 3852.0).abs() < 1e-9);
///
/// assert!("2 kg".parse::<Distance>().is_err());
/// ```
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Distance {
    value: f64,
    unit: LengthUnit,
}

impl Distance {
    pub fn new(value: f64, unit: LengthUnit) -> Distance {
        Self { value, unit }
    }

    pub fn from_meters(value: f64) -> Distance {
        Self::new(value, LengthUnit::Meter)
    }

    pub fn from_nautical_miles(value: f64) -> Distance {
        Self::new(value, LengthUnit::NauticalMile)
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    /// The magnitude of this distance in meters.
    pub fn meters(&self) -> f64 {
        if self.unit == LengthUnit::Meter {
            self.value
        } else {
            self.value * self.unit.meters_per_unit()
        }
    }

    /// The same length expressed in `unit`.
    pub fn to(&self, unit: LengthUnit) -> Distance {
        if unit == self.unit {
            *self
        } else {
            Distance::new(self.meters() / unit.meters_per_unit(), unit)
        }
    }
}

impl Add for Distance {
    type Output = Distance;

    /// The result keeps the unit of the left operand.
    fn add(self, rhs: Distance) -> Distance {
        Distance::new(self.value + rhs.to(self.unit).value, self.unit)
    }
}

impl Sub for Distance {
    type Output = Distance;

    fn sub(self, rhs: Distance) -> Distance {
        Distance::new(self.value - rhs.to(self.unit).value, self.unit)
    }
}

impl Mul<f64> for Distance {
    type Output = Distance;

    fn mul(self, rhs: f64) -> Distance {
        Distance::new(self.value * rhs, self.unit)
    }
}

impl PartialEq for Distance {
    #[allow(clippy::float_cmp)]
    fn eq(&self, other: &Distance) -> bool {
        self.meters() == other.meters()
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Distance) -> Option<Ordering> {
        self.meters().partial_cmp(&other.meters())
    }
}

impl FromStr for Distance {
    type Err = Error;

    /// Parses `"<value> <unit>"`, with or without the space.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Exponent markers belong to the number; no unit starts with 'e'.
        let split = s
            .find(|c: char| c.is_alphabetic() && c != 'e' && c != 'E')
            .ok_or_else(|| Error::InvalidParameter(format!("Distance '{s}' has no unit")))?;

        let (value, unit) = s.split_at(split);
        let value = value.trim().parse::<f64>().map_err(|e| {
            Error::InvalidParameter(format!("Distance '{s}' has an invalid magnitude: {e}"))
        })?;

        Ok(Distance::new(value, unit.parse()?))
    }
}

impl Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = ryu::Buffer::new();
        let value = buf.format(self.value);
        write!(
            f,
            "{value} {}",
            self.unit,
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn nautical_mile_is_exactly_1852_meters() {
        assert_eq!(Distance::from_nautical_miles(1.0).meters(), 1852.0);
        assert_eq!(Distance::from_meters(3704.0).to(LengthUnit::NauticalMile).value(), 2.0);
    }

    #[test]
    fn arithmetic_converts_to_the_left_unit() {
        let total = Distance::new(1.0, LengthUnit::Kilometer) + Distance::new(500.0, LengthUnit::Meter);
        assert_eq!(total.unit(), LengthUnit::Kilometer);
        assert_abs_diff_eq!(total.value(), 1.5);

        let rest = Distance::from_nautical_miles(1.0) - Distance::from_meters(852.0);
        assert_abs_diff_eq!(rest.meters(), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn compares_across_units() {
        assert_eq!(Distance::from_nautical_miles(1.0), Distance::from_meters(1852.0));
        assert!(Distance::new(1.0, LengthUnit::StatuteMile) < Distance::from_nautical_miles(1.0));
        assert!(Distance::new(3.0, LengthUnit::Foot) < Distance::from_meters(1.0));
    }

    #[test]
    fn parses_with_and_without_space() {
        let d: Distance = "2nmi".parse().unwrap();
        assert_eq!(d.unit(), LengthUnit::NauticalMile);
        assert_abs_diff_eq!(d.value(), 2.0);

        let d: Distance = " 1.5e3 Meters ".parse().unwrap();
        assert_eq!(d.unit(), LengthUnit::Meter);
        assert_abs_diff_eq!(d.value(), 1500.0);

        let d: Distance = "-1 NM".parse().unwrap();
        assert_abs_diff_eq!(d.meters(), -1852.0);
    }

    #[test]
    fn rejects_non_length_units() {
        assert!(matches!("2 kg".parse::<Distance>(), Err(Error::InvalidParameter(_))));
        assert!(matches!("12".parse::<Distance>(), Err(Error::InvalidParameter(_))));
        assert!(matches!("abc m".parse::<Distance>(), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn displays_value_and_symbol() {
        assert_eq!(Distance::from_nautical_miles(2.0).to_string(), "2.0 nmi");
    }
}
