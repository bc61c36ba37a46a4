// ABOUTME: Product edition of the cluster services.
// ABOUTME: Selects open-source or enterprise images during baking and deploy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Edition {
    #[default]
    #[serde(rename = "oss")]
    Oss,
    #[serde(rename = "ent")]
    Enterprise,
}

impl Edition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Edition::Oss => "oss",
            Edition::Enterprise => "ent",
        }
    }
}

impl FromStr for Edition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "oss" => Ok(Edition::Oss),
            "ent" | "enterprise" => Ok(Edition::Enterprise),
            other => Err(format!("unknown edition '{other}' (expected oss or ent)")),
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("oss".parse::<Edition>().unwrap(), Edition::Oss);
        assert_eq!("ENT".parse::<Edition>().unwrap(), Edition::Enterprise);
        assert_eq!("enterprise".parse::<Edition>().unwrap(), Edition::Enterprise);
        assert!("pro".parse::<Edition>().is_err());
    }

    #[test]
    fn serializes_short_form() {
        assert_eq!(serde_json::to_string(&Edition::Enterprise).unwrap(), "\"ent\"");
    }
}
