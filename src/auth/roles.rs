use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of roles a user account can hold.
///
/// Role lists coming in over the wire are parsed through `FromStr`, so any
/// value outside this enumeration is rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Patient,
    Doctor,
    Nurse,
    Admin,
    Receptionist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Doctor => "Doctor",
            Role::Nurse => "Nurse",
            Role::Admin => "Admin",
            Role::Receptionist => "Receptionist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Patient" => Ok(Role::Patient),
            "Doctor" => Ok(Role::Doctor),
            "Nurse" => Ok(Role::Nurse),
            "Admin" => Ok(Role::Admin),
            "Receptionist" => Ok(Role::Receptionist),
            other => Err(other.to_string()),
        }
    }
}

/// Parses a role list, collecting every unknown value into one error message.
pub fn parse_roles(raw: &[String]) -> Result<Vec<Role>, String> {
    let mut roles = Vec::with_capacity(raw.len());
    let mut invalid = Vec::new();

    for value in raw {
        match value.parse::<Role>() {
            Ok(role) => roles.push(role),
            Err(bad) => invalid.push(bad),
        }
    }

    if !invalid.is_empty() {
        return Err(format!("Invalid roles: {}", invalid.join(", ")));
    }

    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_strings() {
        for role in [
            Role::Patient,
            Role::Doctor,
            Role::Nurse,
            Role::Admin,
            Role::Receptionist,
        ] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_roles_are_rejected() {
        assert!("SuperAdmin".parse::<Role>().is_err());
        assert!("patient".parse::<Role>().is_err()); // case-sensitive
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn parse_roles_reports_every_invalid_value() {
        let raw = vec![
            "Doctor".to_string(),
            "SuperAdmin".to_string(),
            "Wizard".to_string(),
        ];
        let err = parse_roles(&raw).unwrap_err();
        assert_eq!(err, "Invalid roles: SuperAdmin, Wizard");
    }

    #[test]
    fn parse_roles_accepts_valid_sets() {
        let raw = vec!["Nurse".to_string(), "Receptionist".to_string()];
        assert_eq!(
            parse_roles(&raw).unwrap(),
            vec![Role::Nurse, Role::Receptionist]
        );
    }

    #[test]
    fn serde_uses_pascal_case_strings() {
        let json = serde_json::to_string(&Role::Receptionist).unwrap();
        assert_eq!(json, "\"Receptionist\"");
        let role: Role = serde_json::from_str("\"Doctor\"").unwrap();
        assert_eq!(role, Role::Doctor);
    }
}
