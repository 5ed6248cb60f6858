//! # Roles
//!
//! Resolves the session user's role from whatever the backend reports.
//!
//! ## Resolution Order
//! ```text
//! user.is_admin == true                  → Admin
//! user.rol / role / roles as array       → first element
//! user.rol / role as string              → that string
//! nothing usable                         → Unknown
//! ```
//!
//! The sales view is only opened for [`Role::Vendedor`]; user management
//! only for [`Role::Admin`].

use serde_json::Value;

/// Role of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Admin,
    /// Cashier: the only role allowed on the sales view
    Vendedor,
    Other(String),
    #[default]
    Unknown,
}

impl Role {
    /// Parses a role name, case-insensitively.
    pub fn from_name(name: &str) -> Role {
        let name = name.trim();
        match name.to_lowercase().as_str() {
            "" => Role::Unknown,
            "admin" | "administrador" => Role::Admin,
            "vendedor" => Role::Vendedor,
            _ => Role::Other(name.to_string()),
        }
    }

    /// Resolves the role of a backend user object.
    pub fn resolve(user: &Value) -> Role {
        if user.get("is_admin").and_then(Value::as_bool) == Some(true) {
            return Role::Admin;
        }

        for key in ["rol", "role", "roles"] {
            let Some(raw) = user.get(key) else { continue };
            let role = match raw {
                Value::Array(items) => items.first().map(role_name),
                other => Some(role_name(other)),
            };
            if let Some(role) = role.filter(|r| *r != Role::Unknown) {
                return role;
            }
        }

        Role::Unknown
    }

    pub fn name(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Vendedor => "vendedor",
            Role::Other(name) => name,
            Role::Unknown => "",
        }
    }

    /// True when the user may operate the point of sale.
    pub fn can_sell(&self) -> bool {
        matches!(self, Role::Vendedor)
    }

    /// True when the user may list, create and edit back-office users.
    pub fn can_manage_users(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

fn role_name(value: &Value) -> Role {
    match value {
        Value::String(s) => Role::from_name(s),
        // {"nombre": "vendedor"} shaped role objects
        Value::Object(map) => map
            .get("nombre")
            .or_else(|| map.get("name"))
            .and_then(Value::as_str)
            .map(Role::from_name)
            .unwrap_or_default(),
        _ => Role::Unknown,
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Unknown => write!(f, "-"),
            other => write!(f, "{}", other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_admin_flag_wins() {
        let user = json!({"is_admin": true, "rol": "vendedor"});
        assert_eq!(Role::resolve(&user), Role::Admin);
    }

    #[test]
    fn test_array_role_takes_first() {
        let user = json!({"roles": ["Vendedor", "admin"]});
        assert_eq!(Role::resolve(&user), Role::Vendedor);
    }

    #[test]
    fn test_string_role() {
        assert_eq!(Role::resolve(&json!({"rol": "vendedor"})), Role::Vendedor);
        assert_eq!(
            Role::resolve(&json!({"role": "farmaceutico"})),
            Role::Other("farmaceutico".into())
        );
        assert_eq!(Role::resolve(&json!({"nombre": "x"})), Role::Unknown);
    }

    #[test]
    fn test_only_vendedor_can_sell() {
        assert!(Role::Vendedor.can_sell());
        assert!(!Role::Admin.can_sell());
        assert!(!Role::Other("caja".into()).can_sell());
    }

    #[test]
    fn test_only_admin_manages_users() {
        assert!(Role::Admin.can_manage_users());
        assert!(Role::resolve(&json!({"is_admin": true})).can_manage_users());
        assert!(!Role::Vendedor.can_manage_users());
        assert!(!Role::Unknown.can_manage_users());
    }
}
