use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RenewalError;

/// Academic year in "YYYY-YYYY" form, e.g. "2024-2025". The second year must
/// follow the first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AcademicYear {
    start: i32,
}

impl AcademicYear {
    pub fn new(start: i32) -> Self {
        Self { start }
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn next(&self) -> Self {
        Self {
            start: self.start + 1,
        }
    }
}

impl FromStr for AcademicYear {
    type Err = RenewalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || RenewalError::InvalidPeriod(value.to_string());
        let (first, second) = value.split_once('-').ok_or_else(invalid)?;
        if first.len() != 4 || second.len() != 4 {
            return Err(invalid());
        }
        let start: i32 = first.parse().map_err(|_| invalid())?;
        let end: i32 = second.parse().map_err(|_| invalid())?;
        if end != start + 1 {
            return Err(invalid());
        }
        Ok(Self { start })
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.start + 1)
    }
}

impl TryFrom<String> for AcademicYear {
    type Error = RenewalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AcademicYear> for String {
    fn from(year: AcademicYear) -> Self {
        year.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Semester {
    First,
    Second,
    Summer,
}

impl FromStr for Semester {
    type Err = RenewalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "1st" => Ok(Semester::First),
            "2nd" => Ok(Semester::Second),
            "Summer" => Ok(Semester::Summer),
            other => Err(RenewalError::InvalidPeriod(other.to_string())),
        }
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Semester::First => "1st",
            Semester::Second => "2nd",
            Semester::Summer => "Summer",
        };
        f.write_str(label)
    }
}

impl TryFrom<String> for Semester {
    type Error = RenewalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Semester> for String {
    fn from(semester: Semester) -> Self {
        semester.to_string()
    }
}

/// One academic term: the (academic_year, semester) pair a recipient record
/// belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AcademicPeriod {
    pub year: AcademicYear,
    pub semester: Semester,
}

impl AcademicPeriod {
    pub fn new(year: AcademicYear, semester: Semester) -> Self {
        Self { year, semester }
    }

    pub fn parse(year: &str, semester: &str) -> Result<Self, RenewalError> {
        Ok(Self {
            year: year.parse()?,
            semester: semester.parse()?,
        })
    }

    /// The term that follows this one. Summer rolls into the 1st semester of
    /// the next academic year.
    pub fn next(&self) -> Self {
        match self.semester {
            Semester::First => Self::new(self.year.clone(), Semester::Second),
            Semester::Second => Self::new(self.year.clone(), Semester::Summer),
            Semester::Summer => Self::new(self.year.next(), Semester::First),
        }
    }
}

impl fmt::Display for AcademicPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.year, self.semester)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_academic_year() {
        let year: AcademicYear = "2024-2025".parse().unwrap();
        assert_eq!(year.start(), 2024);
        assert_eq!(year.to_string(), "2024-2025");
    }

    #[test]
    fn rejects_malformed_years() {
        assert!("2024".parse::<AcademicYear>().is_err());
        assert!("2024-2026".parse::<AcademicYear>().is_err());
        assert!("24-25".parse::<AcademicYear>().is_err());
        assert!("abcd-efgh".parse::<AcademicYear>().is_err());
    }

    #[test]
    fn parses_semesters() {
        assert_eq!("1st".parse::<Semester>().unwrap(), Semester::First);
        assert_eq!("Summer".parse::<Semester>().unwrap(), Semester::Summer);
        assert!("3rd".parse::<Semester>().is_err());
    }

    #[test]
    fn next_period_walks_through_the_year() {
        let first = AcademicPeriod::parse("2024-2025", "1st").unwrap();
        let second = first.next();
        assert_eq!(second, AcademicPeriod::parse("2024-2025", "2nd").unwrap());
        let summer = second.next();
        assert_eq!(summer, AcademicPeriod::parse("2024-2025", "Summer").unwrap());
        let rollover = summer.next();
        assert_eq!(rollover, AcademicPeriod::parse("2025-2026", "1st").unwrap());
    }
}
