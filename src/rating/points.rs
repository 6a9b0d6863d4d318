use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

const SCALE: f64 = 100.0;
// Keeps `value * SCALE` well inside the range where f64 holds whole numbers exactly.
const MAX_ABS: f64 = 1e13;

/// Two-decimal quantity kept as a whole number of hundredths.
///
/// Ratings, deltas and minor points all use it, so sums and differences are
/// exact and a change applied then removed leaves no residue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Points(i64);

impl Points {
    pub const ZERO: Points = Points(0);

    pub const fn from_hundredths(hundredths: i64) -> Self {
        Points(hundredths)
    }

    pub const fn from_whole(value: i64) -> Self {
        Points(value * 100)
    }

    pub const fn hundredths(self) -> i64 {
        self.0
    }

    /// Rounds to two decimal places, half away from zero. `None` for NaN,
    /// infinities and magnitudes beyond 1e13.
    pub fn round_from(value: f64) -> Option<Self> {
        if !value.is_finite() || value.abs() > MAX_ABS {
            return None;
        }
        Some(Points((value * SCALE).round() as i64))
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / SCALE
    }
}

impl Add for Points {
    type Output = Points;

    fn add(self, rhs: Points) -> Points {
        Points(self.0 + rhs.0)
    }
}

impl Sub for Points {
    type Output = Points;

    fn sub(self, rhs: Points) -> Points {
        Points(self.0 - rhs.0)
    }
}

impl Neg for Points {
    type Output = Points;

    fn neg(self) -> Points {
        Points(-self.0)
    }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Points) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Points {
    fn sub_assign(&mut self, rhs: Points) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Points::round_from(value)
            .ok_or_else(|| de::Error::custom(format!("{} is not a representable points value", value)))
    }
}
