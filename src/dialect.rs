//! Parameter placeholder dialects and INSERT statement generation.

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder convention of the destination driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dialect {
    /// `?` for every parameter (MySQL, SQLite)
    Anonymous,
    /// `:p0`, `:p1`, ... (Oracle/OCI)
    Named,
    /// `$1`, `$2`, ... (PostgreSQL, DuckDB)
    Indexed,
}

impl Dialect {
    /// Render the placeholder for the parameter at 0-based `index`
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Anonymous => "?".to_string(),
            Dialect::Named => format!(":p{}", index),
            Dialect::Indexed => format!("${}", index + 1),
        }
    }

    /// Canonical driver name for this dialect
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Anonymous => "mysql",
            Dialect::Named => "oci8",
            Dialect::Indexed => "postgres",
        }
    }
}

impl FromStr for Dialect {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "question" | "anonymous" => Ok(Dialect::Anonymous),
            "oci8" | "oracle" | "colon" | "named" => Ok(Dialect::Named),
            "postgres" | "postgresql" | "pg" | "dollar" | "indexed" => Ok(Dialect::Indexed),
            _ => Err(LoadError::DialectUnsupported {
                name: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Dialect {
    type Error = LoadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dialect> for String {
    fn from(value: Dialect) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Build the parameterized INSERT for `table` with one placeholder per column.
///
/// Column names and the table name are emitted as given; they come from the
/// stream header and the operator, not from row data.
pub fn build_insert(dialect: Dialect, table: &str, columns: &[String]) -> String {
    let placeholders: Vec<String> = (0..columns.len())
        .map(|i| dialect.placeholder(i))
        .collect();

    format!(
        "insert into {}({})values({})",
        table,
        columns.join(","),
        placeholders.join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_rendering() {
        assert_eq!(Dialect::Anonymous.placeholder(3), "?");
        assert_eq!(Dialect::Named.placeholder(0), ":p0");
        assert_eq!(Dialect::Named.placeholder(11), ":p11");
        assert_eq!(Dialect::Indexed.placeholder(0), "$1");
        assert_eq!(Dialect::Indexed.placeholder(9), "$10");
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("MySQL".parse::<Dialect>().unwrap(), Dialect::Anonymous);
        assert_eq!("oracle".parse::<Dialect>().unwrap(), Dialect::Named);
        assert_eq!("pg".parse::<Dialect>().unwrap(), Dialect::Indexed);
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for d in [Dialect::Anonymous, Dialect::Named, Dialect::Indexed] {
            assert_eq!(d.to_string().parse::<Dialect>().unwrap(), d);
        }
    }
}
