//! # Terminal Application
//!
//! Owns the state and dispatches parsed commands to their handlers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              App                                        │
//! │                                                                         │
//! │  handle_line(&str) ──► Command::parse ──► execute ──► Reply { text }    │
//! │                                              │                          │
//! │            ┌─────────────────────────────────┼──────────────────┐       │
//! │            ▼                ▼                ▼                  ▼       │
//! │       session.rs       cart.rs         checkout.rs        product.rs    │
//! │                                                                         │
//! │  search ──► spawn_search ──► mpsc ──► apply_search (repl select!)       │
//! │                                                                         │
//! │  Errors become a banner line; the loop always continues.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use farma_api::PosBackend;
use farma_core::{Credentials, NewClient};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::commands::product::SearchOutcome;
use crate::commands::{cart, checkout, client, invoice, product, purchase, session, user, Command};
use crate::error::AppResult;
use crate::receipts::ReceiptExporter;
use crate::router::Route;
use crate::state::AppState;
use crate::view;

/// What the loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub flow: Flow,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            flow: Flow::Continue,
        }
    }
}

pub struct App {
    state: AppState,
    backend: Arc<dyn PosBackend>,
    exporter: ReceiptExporter,
    searches_tx: UnboundedSender<SearchOutcome>,
}

impl App {
    /// Builds the app and the channel background searches report on.
    pub fn new(
        state: AppState,
        backend: Arc<dyn PosBackend>,
        exporter: ReceiptExporter,
    ) -> (Self, UnboundedReceiver<SearchOutcome>) {
        let (searches_tx, searches_rx) = mpsc::unbounded_channel();
        let app = App {
            state,
            backend,
            exporter,
            searches_tx,
        };
        (app, searches_rx)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Probes the session and opens the first route.
    ///
    /// A route the session may not open falls back to the login view when
    /// nobody is logged in, and to the home view otherwise.
    pub async fn start(&mut self, initial: Route) -> String {
        let user = session::probe(&mut self.state, self.backend.as_ref()).await;
        let mut out = view::banner(&self.state.config, user.as_ref());
        out.push_str(&self.go(initial).await);
        out
    }

    /// Executes one input line.
    pub async fn handle_line(&mut self, line: &str) -> Reply {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Reply::text(""),
            Err(e) => return Reply::text(view::error(&e)),
        };
        debug!(?command, "Command");

        match self.execute(command).await {
            Ok(reply) => reply,
            Err(e) => {
                if !e.is_recoverable_inline() {
                    warn!(error = %e, "Command failed");
                }
                Reply::text(view::error(&e))
            }
        }
    }

    /// Shows a finished background search if it is still the newest.
    pub fn apply_search(&mut self, outcome: SearchOutcome) -> Option<String> {
        match product::apply_search(&mut self.state, outcome)? {
            Ok(results) => Some(view::products(results)),
            Err(e) => Some(view::error(&e)),
        }
    }

    async fn execute(&mut self, command: Command) -> AppResult<Reply> {
        let backend = self.backend.as_ref();
        let state = &mut self.state;

        let text = match command {
            Command::Help => view::help(state.route()),
            Command::Quit => {
                return Ok(Reply {
                    text: String::new(),
                    flow: Flow::Quit,
                })
            }
            Command::Go(route) => return Ok(Reply::text(self.go(route).await)),

            // Session
            Command::Login {
                username,
                password,
                remember,
            } => {
                let user = session::login(
                    state,
                    backend,
                    Credentials {
                        username,
                        password,
                        remember,
                    },
                )
                .await?;
                let mut out = format!("Welcome, {}.\n", user.name);
                if state.route() == &Route::Login {
                    let home = if user.role.can_sell() {
                        Route::Ventas
                    } else {
                        Route::Inicio
                    };
                    out.push_str(&self.go(home).await);
                }
                out
            }
            Command::Logout => {
                session::logout(state, backend).await?;
                format!("Logged out.\n{}", view::route_header(state.route()))
            }
            Command::WhoAmI => view::user(&session::whoami(state)?),

            // Sales view
            Command::Search(term) => {
                let (ticket, term) = product::begin_search(state, &term)?;
                product::spawn_search(
                    Arc::clone(&self.backend),
                    ticket,
                    term.clone(),
                    self.searches_tx.clone(),
                );
                format!("Searching '{term}'...\n")
            }
            Command::Add { selector, quantity } => {
                view::cart(&cart::add_to_cart(state, backend, selector, quantity).await?)
            }
            Command::SetQuantity { line, quantity } => {
                view::cart(&cart::set_quantity(state, line, quantity)?)
            }
            Command::Remove(line) => view::cart(&cart::remove_line(state, line)?),
            Command::ShowCart => view::cart(&cart::get_cart(state)?),
            Command::ClearCart => view::cart(&cart::clear_cart(state)?),
            Command::SelectClient(document_number) => {
                view::cart(&cart::select_client(state, backend, document_number).await?)
            }
            Command::Checkout => view::checkout(&checkout::open_checkout(state)?),
            Command::LookupClient(raw) => {
                view::checkout(&checkout::lookup_client(state, backend, &raw).await?)
            }
            Command::NewClient(name) => {
                view::checkout(&checkout::create_client(state, backend, &name).await?)
            }
            Command::ChangeClient => view::checkout(&checkout::change_client(state)?),
            Command::Pay(method) => view::checkout(&checkout::select_method(state, method)?),
            Command::Tender(raw) => view::checkout(&checkout::set_tendered(state, &raw)?),
            Command::Note(note) => view::checkout(&checkout::set_note(state, &note)?),
            Command::Confirm => {
                match checkout::confirm(state, backend, &self.exporter).await {
                    Ok(sale) => view::sale(&sale),
                    Err(e) => {
                        // The payment panel shows what was kept after a refusal.
                        let mut out = view::error(&e);
                        if let Ok(panel) = checkout::view_checkout(state) {
                            out.push_str(&view::checkout(&panel));
                        }
                        out
                    }
                }
            }
            Command::Cancel => {
                checkout::cancel_checkout(state)?;
                format!("Payment cancelled.\n{}", view::cart(&cart::get_cart(state)?))
            }
            Command::LastReceipt => match state.sales()?.last_receipt() {
                Some(receipt) => view::receipt(receipt),
                None => "No sale completed yet.\n".to_string(),
            },

            // Back office
            Command::Products(term) => view::products(&product::list_products(backend, &term).await?),
            Command::Product(id) => view::product_detail(&product::get_product(backend, &id).await?),
            Command::CreateProduct(draft) => {
                let created = product::create_product(backend, &draft).await?;
                format!("Product created.\n{}", view::product_detail(&created))
            }
            Command::UpdateProduct { id, draft } => {
                let updated = product::update_product(backend, &id, &draft).await?;
                format!("Product updated.\n{}", view::product_detail(&updated))
            }
            Command::DeleteProduct(id) => {
                product::delete_product(backend, &id).await?;
                format!("Product {id} deleted.\n")
            }
            Command::Clients(name) => view::clients(&client::list_clients(backend, &name).await?),
            Command::CreateClient {
                document_number,
                name,
            } => {
                let created = client::create_client(
                    backend,
                    NewClient {
                        name,
                        document_number,
                    },
                )
                .await?;
                format!("Client registered: {}\n", created.label())
            }
            Command::Invoices => view::invoices(&invoice::list_invoices(backend).await?),
            Command::Invoice(id) => view::invoice_detail(&invoice::invoice_detail(backend, &id).await?),

            Command::Users => view::users(&user::list_users(state, backend).await?),
            Command::User(id) => view::user_detail(&user::get_user(state, backend, &id).await?),
            Command::CreateUser(draft) => {
                let created = user::create_user(state, backend, &draft).await?;
                format!("User created.\n{}", view::user_detail(&created))
            }
            Command::UpdateUser { id, draft } => {
                let updated = user::update_user(state, backend, &id, &draft).await?;
                format!("User updated.\n{}", view::user_detail(&updated))
            }
            Command::DeleteUser(id) => {
                user::delete_user(state, backend, &id).await?;
                format!("User {id} deleted.\n")
            }
            Command::Suppliers => view::suppliers(&purchase::list_suppliers(backend).await?),
            Command::CreateSupplier(new_supplier) => {
                let created = purchase::create_supplier(backend, &new_supplier).await?;
                format!("Supplier registered: {} (id {})\n", created.name, created.id)
            }
            Command::Purchases => view::purchases(&purchase::list_purchases(backend).await?),
            Command::Purchase(draft) => view::purchase(&purchase::register_purchase(backend, draft).await?),
        };
        Ok(Reply::text(text))
    }

    /// Navigates and renders the new route. A refused route leaves the
    /// operator where they were, except that an anonymous session is sent
    /// to the login view.
    async fn go(&mut self, route: Route) -> String {
        if let Err(e) = self.state.navigate(route).map(|_| ()) {
            let mut out = view::error(&e);
            if !self.state.session.is_logged_in() && self.state.navigate(Route::Login).is_ok() {
                out.push_str(&view::route_header(self.state.route()));
                out.push_str("login <user> <password> [--remember]\n");
            }
            return out;
        }

        let route = self.state.route().clone();
        let mut out = view::route_header(&route);
        match self.render(&route).await {
            Ok(body) => out.push_str(&body),
            Err(e) => out.push_str(&view::error(&e)),
        }
        out
    }

    async fn render(&self, route: &Route) -> AppResult<String> {
        let backend = self.backend.as_ref();
        let body = match route {
            Route::Inicio => match self.state.session.user() {
                Some(user) => format!("Hello, {}. {}", user.name, view::help(route)),
                None => format!("Not logged in.\n{}", view::help(route)),
            },
            Route::Productos => view::products(&backend.list_products().await?),
            Route::ProductCreate => {
                "New product: pnew code;name;price[;stock[;generic[;action[;barcode]]]]\n".to_string()
            }
            Route::ProductEdit(id) => {
                let product = product::get_product(backend, id).await?;
                format!(
                    "{}Edit with: pedit {} code;name;price[;stock[;generic[;action[;barcode]]]]\n",
                    view::product_detail(&product),
                    product.id
                )
            }
            Route::Inventarios => view::inventory(&backend.list_products().await?),
            Route::Ventas => {
                let cart = cart::get_cart(&self.state)?;
                format!("{}{}", view::cart(&cart), view::help(route))
            }
            Route::Clientes => view::clients(&backend.list_clients().await?),
            Route::Facturas => view::invoices(&invoice::list_invoices(backend).await?),
            Route::Login => "login <user> <password> [--remember]\n".to_string(),
            Route::Configuraciones => view::settings(&self.state.config),
            Route::Usuarios => format!(
                "{}{}",
                view::users(&user::list_users(&self.state, backend).await?),
                view::help(route)
            ),
            Route::Compras => format!(
                "{}{}",
                view::purchases(&purchase::list_purchases(backend).await?),
                view::suppliers(&purchase::list_suppliers(backend).await?)
            ),
        };
        Ok(body)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("route", self.state.route())
            .field("exporter", &self.exporter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerminalConfig;
    use crate::testing::{temp_exporter, FakeBackend};
    use std::time::Duration;

    fn app(backend: Arc<FakeBackend>) -> (App, UnboundedReceiver<SearchOutcome>, std::path::PathBuf) {
        let (exporter, dir) = temp_exporter();
        let (app, rx) = App::new(AppState::new(TerminalConfig::default()), backend, exporter);
        (app, rx, dir)
    }

    async fn run(app: &mut App, line: &str) -> String {
        app.handle_line(line).await.text
    }

    #[tokio::test]
    async fn test_full_sale() {
        let backend = Arc::new(FakeBackend::new());
        let (mut app, mut searches, dir) = app(backend.clone());

        let out = app.start(Route::Ventas).await;
        assert!(out.contains("Log in first"));
        assert_eq!(app.state().route(), &Route::Login);

        let out = run(&mut app, "login laura secreto").await;
        assert!(out.contains("Welcome, Laura"));
        assert_eq!(app.state().route(), &Route::Ventas);

        run(&mut app, "search parac").await;
        let outcome = tokio::time::timeout(Duration::from_secs(5), searches.recv())
            .await
            .unwrap()
            .unwrap();
        let shown = app.apply_search(outcome).unwrap();
        assert!(shown.contains("Paracetamol 500mg"));

        let out = run(&mut app, "add 1 2").await;
        assert!(out.contains("TOTAL $7.00"));

        run(&mut app, "checkout").await;
        run(&mut app, "ci 1234567").await;
        let out = run(&mut app, "tender 10").await;
        assert!(out.contains("Change:   $3.00"));

        let out = run(&mut app, "confirm").await;
        assert!(out.contains("Sale completed."));
        assert!(out.contains("Vendedor: Laura"));
        assert!(out.contains("Fecha: 16/10/2026 11:45"));

        let out = run(&mut app, "cart").await;
        assert!(out.contains("Cart is empty."));
        assert_eq!(backend.submitted_invoices().len(), 1);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_admin_cannot_open_sales() {
        let backend = Arc::new(FakeBackend::new());
        let (mut app, _searches, _dir) = app(backend);

        run(&mut app, "login admin secreto").await;
        assert_eq!(app.state().route(), &Route::Inicio);

        let out = run(&mut app, "#/ventas").await;
        assert!(out.contains("only available to the vendedor role"));
        assert_eq!(app.state().route(), &Route::Inicio);
    }

    #[tokio::test]
    async fn test_leaving_sales_clears_cart() {
        let backend = Arc::new(FakeBackend::new());
        let (mut app, _searches, _dir) = app(backend);
        run(&mut app, "login laura secreto").await;
        run(&mut app, "#/ventas").await;
        let out = run(&mut app, "add @1").await;
        assert!(out.contains("Paracetamol 500mg"));

        run(&mut app, "#/facturas").await;
        let out = run(&mut app, "#/ventas").await;
        assert!(out.contains("Cart is empty."));
    }

    #[tokio::test]
    async fn test_errors_keep_the_loop_going() {
        let backend = Arc::new(FakeBackend::new());
        let (mut app, _searches, _dir) = app(backend);

        let reply = app.handle_line("vender").await;
        assert_eq!(reply.flow, Flow::Continue);
        assert!(reply.text.starts_with("! Unknown command"));

        let reply = app.handle_line("login laura equivocada").await;
        assert!(reply.text.contains("Credenciales inválidas"));

        assert_eq!(app.handle_line("quit").await.flow, Flow::Quit);
    }

    #[tokio::test]
    async fn test_logout_returns_to_login() {
        let backend = Arc::new(FakeBackend::new());
        let (mut app, _searches, _dir) = app(backend);
        run(&mut app, "login laura secreto").await;

        let out = run(&mut app, "logout").await;
        assert!(out.contains("Iniciar sesión"));
        assert_eq!(app.state().route(), &Route::Login);
        assert!(!app.state().session.is_logged_in());
    }

    #[tokio::test]
    async fn test_admin_opens_user_management() {
        let backend = Arc::new(FakeBackend::new());
        let (mut app, _searches, _dir) = app(backend);
        run(&mut app, "login admin secreto").await;

        let out = run(&mut app, "#/usuarios").await;
        assert_eq!(app.state().route(), &Route::Usuarios);
        assert!(out.contains("│ Laura "));
        assert!(out.contains("udel <id>"));

        let out = run(&mut app, "unew Marta Quispe;marta;;vendedor;clave").await;
        assert!(out.contains("User created."));
        assert!(out.contains("Marta Quispe"));

        let out = run(&mut app, "users").await;
        assert!(out.contains("marta"));
    }

    #[tokio::test]
    async fn test_vendedor_cannot_open_user_management() {
        let backend = Arc::new(FakeBackend::new());
        let (mut app, _searches, _dir) = app(backend);
        run(&mut app, "login laura secreto").await;
        assert_eq!(app.state().route(), &Route::Inicio);

        let out = run(&mut app, "#/usuarios").await;
        assert!(out.contains("only available to the admin role"));
        assert_eq!(app.state().route(), &Route::Inicio);

        let out = run(&mut app, "users").await;
        assert!(out.starts_with("! Restricted: user management"));
    }

    #[tokio::test]
    async fn test_purchase_restocks_sold_out_product() {
        let backend = Arc::new(FakeBackend::new());
        let (mut app, _searches, _dir) = app(backend.clone());
        run(&mut app, "login admin secreto").await;

        let out = run(&mut app, "#/compras").await;
        assert!(out.contains("Droguería Inti"));
        assert!(out.contains("│ c1 "));

        let out = run(&mut app, "buy prov=p1 3:24:3,10").await;
        assert!(out.contains("Purchase 101 registered."));
        assert!(out.contains("Ibuprofeno 400mg"));
        assert!(out.contains("TOTAL $74.40"));
        assert_eq!(backend.registered_purchases().len(), 1);

        let out = run(&mut app, "product 3").await;
        assert!(out.contains("Stock:      24"));
    }
}
