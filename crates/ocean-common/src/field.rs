//! Supported ocean fields and their aliases.
//!
//! Every physical variable served by the API is one [`Field`]. Several request
//! names resolve to the same field (`salt` and `salinity` both read the salt
//! dataset); names are matched case-insensitively.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OceanError, OceanResult};

/// Every accepted request name, in the order advertised by the metadata endpoint.
pub const FIELD_NAMES: [&str; 6] = [
    "salinity",
    "temperature",
    "vertical_velocity",
    "salt",
    "theta",
    "w",
];

/// A physical ocean variable backed by one remote dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Salinity,
    Temperature,
    VerticalVelocity,
}

impl Field {
    /// All fields.
    pub const ALL: [Field; 3] = [Field::Salinity, Field::Temperature, Field::VerticalVelocity];

    /// Resolve a request name (case-insensitive, aliases allowed).
    pub fn parse(name: &str) -> OceanResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "salinity" | "salt" => Ok(Field::Salinity),
            "temperature" | "theta" => Ok(Field::Temperature),
            "vertical_velocity" | "w" => Ok(Field::VerticalVelocity),
            _ => Err(OceanError::UnknownField {
                name: name.to_string(),
                available: FIELD_NAMES.to_vec(),
            }),
        }
    }

    /// Canonical name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Salinity => "salinity",
            Field::Temperature => "temperature",
            Field::VerticalVelocity => "vertical_velocity",
        }
    }

    /// Model variable name used in the remote dataset layout.
    pub fn variable(&self) -> &'static str {
        match self {
            Field::Salinity => "salt",
            Field::Temperature => "theta",
            Field::VerticalVelocity => "w",
        }
    }

    /// Physical units.
    pub fn units(&self) -> &'static str {
        match self {
            Field::Salinity => "g kg⁻¹",
            Field::Temperature => "°C",
            Field::VerticalVelocity => "m s⁻¹",
        }
    }

    /// Request names that resolve to this field.
    pub fn aliases(&self) -> [&'static str; 2] {
        [self.as_str(), self.variable()]
    }

    /// Unit lookup keyed by every accepted request name.
    pub fn unit_table() -> Vec<(&'static str, &'static str)> {
        FIELD_NAMES
            .iter()
            .filter_map(|name| Field::parse(name).ok().map(|f| (*name, f.units())))
            .collect()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_same_field() {
        assert_eq!(Field::parse("salt").unwrap(), Field::Salinity);
        assert_eq!(Field::parse("salinity").unwrap(), Field::Salinity);
        assert_eq!(Field::parse("theta").unwrap(), Field::Temperature);
        assert_eq!(Field::parse("w").unwrap(), Field::VerticalVelocity);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(Field::parse("SALT").unwrap(), Field::Salinity);
        assert_eq!(Field::parse("Vertical_Velocity").unwrap(), Field::VerticalVelocity);
    }

    #[test]
    fn test_unknown_field() {
        let err = Field::parse("density").unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().starts_with("Unknown field: density"));
    }

    #[test]
    fn test_unit_table_covers_all_names() {
        let table = Field::unit_table();
        assert_eq!(table.len(), FIELD_NAMES.len());
        assert!(table.contains(&("salt", "g kg⁻¹")));
        assert!(table.contains(&("w", "m s⁻¹")));
    }
}
