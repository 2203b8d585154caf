use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Graded outcome of a rule. Ordered `Ok < Warn < Bad` so that `Ord::max`
/// is the combinator for merging results.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Ok,
    Warn,
    Bad,
}

impl Severity {
    /// Folds any number of severities into the worst one.
    pub fn combine<I: IntoIterator<Item = Severity>>(items: I) -> Severity {
        items.into_iter().fold(Severity::Ok, Ord::max)
    }

    /// One level milder: bad → warn → ok.
    pub fn downgrade(self) -> Severity {
        match self {
            Severity::Bad => Severity::Warn,
            Severity::Warn | Severity::Ok => Severity::Ok,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "ok",
            Severity::Warn => "warn",
            Severity::Bad => "bad",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" | "good" => Ok(Severity::Ok),
            "warn" | "warning" | "caution" => Ok(Severity::Warn),
            "bad" | "danger" | "critical" => Ok(Severity::Bad),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_picks_worst() {
        assert_eq!(Severity::combine([]), Severity::Ok);
        assert_eq!(Severity::combine([Severity::Warn, Severity::Ok]), Severity::Warn);
        assert_eq!(
            Severity::combine([Severity::Warn, Severity::Bad, Severity::Ok]),
            Severity::Bad
        );
    }

    #[test]
    fn test_downgrade_steps_one_level() {
        assert_eq!(Severity::Bad.downgrade(), Severity::Warn);
        assert_eq!(Severity::Warn.downgrade(), Severity::Ok);
        assert_eq!(Severity::Ok.downgrade(), Severity::Ok);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("danger".parse::<Severity>(), Ok(Severity::Bad));
        assert_eq!("Warn".parse::<Severity>(), Ok(Severity::Warn));
        assert!("meh".parse::<Severity>().is_err());
    }
}
