use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub const VALID_ROLES: [AppRole; 3] = [AppRole::Admin, AppRole::Moderator, AppRole::User];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    Admin,
    Moderator,
    User,
}

impl Display for AppRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = match self {
            AppRole::Admin => "admin",
            AppRole::Moderator => "moderator",
            AppRole::User => "user",
        };
        write!(f, "{}", role)
    }
}

impl FromStr for AppRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(AppRole::Admin),
            "moderator" => Ok(AppRole::Moderator),
            "user" => Ok(AppRole::User),
            _ => {
                let allowed = VALID_ROLES
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(format!("Invalid role. Must be one of: {}", allowed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_their_column_value() {
        for role in VALID_ROLES {
            assert_eq!(role.to_string().parse::<AppRole>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_lists_the_allowed_values() {
        let err = "owner".parse::<AppRole>().unwrap_err();
        assert_eq!(err, "Invalid role. Must be one of: admin, moderator, user");
    }

    #[test]
    fn role_matching_is_case_sensitive() {
        assert!("Admin".parse::<AppRole>().is_err());
    }
}
