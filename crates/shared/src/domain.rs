use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(ChannelId);
id_newtype!(MessageId);
id_newtype!(ReviewId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStyle {
    #[default]
    Primary,
    Secondary,
    Success,
    Danger,
}

/// Grade a reviewer gives a subject. Stored as its ordinal (A = 0 .. F = 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    C,
    D,
    E,
    F,
}

const GRADE_NUMBERS: [f64; 6] = [1.0, 1.5, 2.0, 2.5, 3.0, 4.0];

impl Tier {
    pub const ALL: [Tier; 6] = [Tier::A, Tier::B, Tier::C, Tier::D, Tier::E, Tier::F];

    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(value: i64) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// Nearest tier for an average ordinal, e.g. a subject's mean review tier. Halves go to the
    /// even ordinal, so 2.5 is C and 3.5 is E.
    pub fn from_average(avg: f64) -> Self {
        let rounded = avg.round_ties_even().clamp(0.0, 5.0) as i64;
        Self::from_ordinal(rounded).unwrap_or(Tier::F)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Tier::A),
            "B" => Some(Tier::B),
            "C" => Some(Tier::C),
            "D" => Some(Tier::D),
            "E" => Some(Tier::E),
            "F" => Some(Tier::F),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
            Tier::E => "E",
            Tier::F => "F",
        }
    }
}

/// Maps an average tier ordinal onto the 1.0 - 4.0 grade scale, interpolating between tiers.
pub fn grade_number(avg_tier: f64) -> f64 {
    let avg = avg_tier.clamp(0.0, 5.0);
    let lower = avg.floor() as usize;
    if lower >= GRADE_NUMBERS.len() - 1 {
        return GRADE_NUMBERS[GRADE_NUMBERS.len() - 1];
    }
    let frac = avg - lower as f64;
    GRADE_NUMBERS[lower] + (GRADE_NUMBERS[lower + 1] - GRADE_NUMBERS[lower]) * frac
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Semester {
    Winter,
    Summer,
}

impl Semester {
    pub fn code(self) -> &'static str {
        match self {
            Semester::Winter => "Z",
            Semester::Summer => "L",
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "Z" => Some(Semester::Winter),
            "L" => Some(Semester::Summer),
            _ => None,
        }
    }
}
