//! # Router
//!
//! Hash routes (`#/ventas`, `#/productos/edit/12`, ...) dispatched by string
//! prefix into [`Route`].
//!
//! ## Dispatch Table
//! ```text
//! ┌──────────────────────────────┬────────────────────┬─────────────────────┐
//! │ Hash                         │ Match              │ Route               │
//! ├──────────────────────────────┼────────────────────┼─────────────────────┤
//! │ "" | /inicio                 │ exact              │ Inicio              │
//! │ /productos/create            │ exact              │ ProductCreate       │
//! │ /productos/edit…/{id}        │ prefix             │ ProductEdit(id)     │
//! │ /productos…                  │ prefix             │ Productos           │
//! │ /inventarios…                │ prefix             │ Inventarios         │
//! │ /ventas…                     │ prefix             │ Ventas (vendedor)   │
//! │ /clientes                    │ exact              │ Clientes            │
//! │ /usuarios…                   │ prefix             │ Usuarios (admin)    │
//! │ /facturas                    │ exact              │ Facturas            │
//! │ /compras…                    │ prefix             │ Compras             │
//! │ /login                       │ exact              │ Login               │
//! │ /configuraciones             │ exact              │ Configuraciones     │
//! │ anything else                │                    │ Inicio              │
//! └──────────────────────────────┴────────────────────┴─────────────────────┘
//! ```

use std::fmt;

use farma_core::{Role, UserInfo};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Inicio,
    Productos,
    ProductCreate,
    ProductEdit(String),
    Inventarios,
    Ventas,
    Clientes,
    Usuarios,
    Facturas,
    Compras,
    Login,
    Configuraciones,
}

impl Route {
    /// Parses a hash. Accepts `#/x`, `/x` or `x`.
    pub fn parse(hash: &str) -> Route {
        let trimmed = hash.trim().trim_start_matches('#');
        let path = if trimmed.starts_with('/') || trimmed.is_empty() {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        let route = path.as_str();

        if route.is_empty() || route == "/inicio" {
            return Route::Inicio;
        }
        if route == "/productos/create" {
            return Route::ProductCreate;
        }
        if route.starts_with("/productos/edit") {
            return match route.rsplit('/').next() {
                Some(id) if !id.is_empty() && !id.starts_with("edit") => {
                    Route::ProductEdit(id.to_string())
                }
                _ => Route::Productos,
            };
        }
        if route.starts_with("/productos") {
            return Route::Productos;
        }
        if route.starts_with("/inventarios") {
            return Route::Inventarios;
        }
        if route.starts_with("/ventas") {
            return Route::Ventas;
        }
        if route == "/clientes" {
            return Route::Clientes;
        }
        if route.starts_with("/usuarios") {
            return Route::Usuarios;
        }
        if route == "/facturas" {
            return Route::Facturas;
        }
        if route.starts_with("/compras") {
            return Route::Compras;
        }
        if route == "/login" {
            return Route::Login;
        }
        if route == "/configuraciones" {
            return Route::Configuraciones;
        }
        Route::Inicio
    }

    /// Canonical hash for this route.
    pub fn hash(&self) -> String {
        match self {
            Route::Inicio => "#/inicio".to_string(),
            Route::Productos => "#/productos".to_string(),
            Route::ProductCreate => "#/productos/create".to_string(),
            Route::ProductEdit(id) => format!("#/productos/edit/{id}"),
            Route::Inventarios => "#/inventarios".to_string(),
            Route::Ventas => "#/ventas".to_string(),
            Route::Clientes => "#/clientes".to_string(),
            Route::Usuarios => "#/usuarios".to_string(),
            Route::Facturas => "#/facturas".to_string(),
            Route::Compras => "#/compras".to_string(),
            Route::Login => "#/login".to_string(),
            Route::Configuraciones => "#/configuraciones".to_string(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Inicio => "Inicio",
            Route::Productos | Route::ProductCreate | Route::ProductEdit(_) => "Productos",
            Route::Inventarios => "Inventarios",
            Route::Ventas => "Ventas",
            Route::Clientes => "Clientes",
            Route::Usuarios => "Usuarios",
            Route::Facturas => "Facturas",
            Route::Compras => "Compras",
            Route::Login => "Iniciar sesión",
            Route::Configuraciones => "Configuraciones",
        }
    }

    pub fn is_sales(&self) -> bool {
        matches!(self, Route::Ventas)
    }

    /// Checks the session may open this route.
    ///
    /// The sales view needs a `vendedor` session and user management an
    /// `admin` one. Every other route is open.
    pub fn authorize(&self, user: Option<&UserInfo>) -> AppResult<()> {
        let (allowed, restricted): (fn(&Role) -> bool, &str) = match self {
            Route::Ventas => (
                Role::can_sell,
                "Restricted: the sales view is only available to the vendedor role",
            ),
            Route::Usuarios => (
                Role::can_manage_users,
                "Restricted: user management is only available to the admin role",
            ),
            _ => return Ok(()),
        };
        match user {
            Some(u) if allowed(&u.role) => Ok(()),
            Some(_) => Err(AppError::forbidden(restricted)),
            None => Err(AppError::session_required()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> UserInfo {
        UserInfo {
            id: Some("3".into()),
            name: "Laura".into(),
            email: None,
            role,
        }
    }

    #[test]
    fn test_prefix_dispatch() {
        assert_eq!(Route::parse(""), Route::Inicio);
        assert_eq!(Route::parse("#/inicio"), Route::Inicio);
        assert_eq!(Route::parse("#/productos"), Route::Productos);
        assert_eq!(Route::parse("#/productos/lista"), Route::Productos);
        assert_eq!(Route::parse("#/productos/create"), Route::ProductCreate);
        assert_eq!(
            Route::parse("#/productos/edit/17"),
            Route::ProductEdit("17".into())
        );
        assert_eq!(Route::parse("#/productos/edit"), Route::Productos);
        assert_eq!(Route::parse("#/inventarios/lotes"), Route::Inventarios);
        assert_eq!(Route::parse("#/ventas"), Route::Ventas);
        assert_eq!(Route::parse("#/ventas/nueva"), Route::Ventas);
        assert_eq!(Route::parse("#/usuarios/3"), Route::Usuarios);
        assert_eq!(Route::parse("#/compras/ordenes"), Route::Compras);
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("configuraciones"), Route::Configuraciones);
    }

    #[test]
    fn test_exact_routes_do_not_prefix_match() {
        assert_eq!(Route::parse("#/clientes/7"), Route::Inicio);
        assert_eq!(Route::parse("#/facturas/9"), Route::Inicio);
        assert_eq!(Route::parse("#/loginx"), Route::Inicio);
    }

    #[test]
    fn test_unknown_falls_back_to_inicio() {
        assert_eq!(Route::parse("#/reportes"), Route::Inicio);
        assert_eq!(Route::parse("#/reportes").hash(), "#/inicio");
    }

    #[test]
    fn test_sales_needs_vendedor() {
        assert!(Route::Ventas.authorize(Some(&user(Role::Vendedor))).is_ok());

        let err = Route::Ventas.authorize(Some(&user(Role::Admin))).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Forbidden);

        let err = Route::Ventas.authorize(None).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::SessionRequired);

        assert!(Route::Productos.authorize(None).is_ok());
    }

    #[test]
    fn test_user_management_needs_admin() {
        assert!(Route::Usuarios.authorize(Some(&user(Role::Admin))).is_ok());

        let err = Route::Usuarios
            .authorize(Some(&user(Role::Vendedor)))
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Forbidden);
        assert!(err.message.contains("admin role"));

        let err = Route::Usuarios.authorize(None).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::SessionRequired);

        assert!(Route::Compras.authorize(Some(&user(Role::Vendedor))).is_ok());
    }
}
