//! Binary self-assessment given after reviewing a file.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewOutcome {
    Remembered,
    Forgotten,
}

impl ReviewOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewOutcome::Remembered => "remembered",
            ReviewOutcome::Forgotten => "forgotten",
        }
    }
}

impl fmt::Display for ReviewOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remembered" => Ok(ReviewOutcome::Remembered),
            "forgotten" => Ok(ReviewOutcome::Forgotten),
            other => Err(format!("unknown review outcome '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_outcome() {
        assert_eq!("remembered".parse::<ReviewOutcome>(), Ok(ReviewOutcome::Remembered));
        assert_eq!("forgotten".parse::<ReviewOutcome>(), Ok(ReviewOutcome::Forgotten));
        assert!("maybe".parse::<ReviewOutcome>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase() {
        let json = serde_json::to_string(&ReviewOutcome::Forgotten).unwrap();
        assert_eq!(json, "\"forgotten\"");
    }
}
