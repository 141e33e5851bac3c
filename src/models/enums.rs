use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same string form as the database column.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Criticality {
    Critical => "on",
    Stable => "off",
});

impl Default for Criticality {
    fn default() -> Self {
        Self::Stable
    }
}

impl Criticality {
    /// Checkbox semantics: a ticked box submits a non-blank value; an
    /// absent or blank field means stable.
    pub fn from_checkbox(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => Self::Critical,
            _ => Self::Stable,
        }
    }
}
