//! Status enumerations shared by validation and storage checks
//!
//! Rows store statuses as lower-case text; these enums give typed access and
//! the canonical value lists used by `OneOf` rules and CHECK translation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every accepted value, in declaration order.
            pub const VALUES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} `{other}`", stringify!($name))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

status_enum! {
    /// Lifecycle of an active pharmaceutical ingredient
    IngredientStatus {
        Active => "active",
        Inactive => "inactive",
        Withdrawn => "withdrawn",
        Banned => "banned",
    }
}

status_enum! {
    /// Standing of a marketing authorization
    AuthorizationStatus {
        Active => "active",
        Suspended => "suspended",
        Revoked => "revoked",
        Expired => "expired",
    }
}

status_enum! {
    BatchStatus {
        Planned => "planned",
        Released => "released",
        OnHold => "on_hold",
        Recalled => "recalled",
        Expired => "expired",
        SoldOut => "sold_out",
        Inactive => "inactive",
    }
}

status_enum! {
    RegistrationStatus {
        Active => "active",
        Suspended => "suspended",
        Expired => "expired",
        Withdrawn => "withdrawn",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_match_text() {
        assert_eq!(BatchStatus::VALUES.len(), 7);
        assert_eq!(BatchStatus::OnHold.as_str(), "on_hold");
        assert_eq!("sold_out".parse::<BatchStatus>(), Ok(BatchStatus::SoldOut));
        assert!("SOLD_OUT".parse::<BatchStatus>().is_err());
    }

    #[test]
    fn test_serde_matches_stored_text() {
        let json = serde_json::to_string(&BatchStatus::OnHold).unwrap();
        assert_eq!(json, "\"on_hold\"");
        for value in IngredientStatus::VALUES {
            let parsed: IngredientStatus = value.parse().unwrap();
            assert_eq!(parsed.to_string(), *value);
        }
    }
}
