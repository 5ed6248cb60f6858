//! # Terminal Commands Module
//!
//! Everything the operator can type, parsed into [`Command`] and executed
//! by the handlers in the submodules.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (parsing)
//! ├── session.rs   ◄─── Login, logout, session probe
//! ├── product.rs   ◄─── Product search and CRUD
//! ├── cart.rs      ◄─── Cart manipulation
//! ├── checkout.rs  ◄─── Payment step and invoice submission
//! ├── client.rs    ◄─── Client list, search, creation
//! ├── invoice.rs   ◄─── Invoice history and detail
//! ├── user.rs      ◄─── User management (admin)
//! └── purchase.rs  ◄─── Suppliers and stock purchases
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stdin line ──► Command::parse ──► App::execute ──► handler(state, be) │
//! │                      │                                    │             │
//! │                      ▼                                    ▼             │
//! │              AppError(UnknownCommand)           response DTO ──► view  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers take only what they need: `&mut AppState` for the screen and
//! `&dyn PosBackend` for the server.

pub mod cart;
pub mod checkout;
pub mod client;
pub mod invoice;
pub mod product;
pub mod purchase;
pub mod session;
pub mod user;

use farma_core::money::parse_amount;
use farma_core::validation::{
    validate_client_name, validate_document_number, validate_product_code, validate_user_name,
    validate_user_role,
};
use farma_core::{
    Money, NewSupplier, PaymentMethod, ProductDraft, PurchaseDraft, PurchaseItem, Role, UserDraft,
    ValidationError,
};

use crate::error::{AppError, AppResult};
use crate::router::Route;

/// How `add` names the product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductSelector {
    /// 1-based position in the last search results
    Result(usize),
    /// Backend product id (`@12`)
    Id(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Go(Route),

    // Session
    Login {
        username: String,
        password: String,
        remember: bool,
    },
    Logout,
    WhoAmI,

    // Sales view
    Search(String),
    Add {
        selector: ProductSelector,
        quantity: i64,
    },
    SetQuantity {
        line: usize,
        quantity: i64,
    },
    Remove(usize),
    ShowCart,
    ClearCart,
    SelectClient(Option<String>),
    Checkout,
    LookupClient(String),
    NewClient(String),
    ChangeClient,
    Pay(PaymentMethod),
    Tender(String),
    Note(String),
    Confirm,
    Cancel,
    LastReceipt,

    // Back office
    Products(String),
    Product(String),
    CreateProduct(ProductDraft),
    UpdateProduct { id: String, draft: ProductDraft },
    DeleteProduct(String),
    Clients(String),
    CreateClient { document_number: String, name: String },
    Invoices,
    Invoice(String),
    Users,
    User(String),
    CreateUser(UserDraft),
    UpdateUser { id: String, draft: UserDraft },
    DeleteUser(String),
    Suppliers,
    CreateSupplier(NewSupplier),
    Purchases,
    Purchase(PurchaseDraft),
}

impl Command {
    /// Parses one input line. Blank lines are `Ok(None)`.
    pub fn parse(line: &str) -> AppResult<Option<Command>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if line.starts_with('#') {
            return Ok(Some(Command::Go(Route::parse(line))));
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match verb.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "go" => Command::Go(Route::parse(required(rest, "go <#/route>")?)),

            "login" => match args.as_slice() {
                [username, password] => Command::Login {
                    username: username.to_string(),
                    password: password.to_string(),
                    remember: false,
                },
                [username, password, "--remember"] => Command::Login {
                    username: username.to_string(),
                    password: password.to_string(),
                    remember: true,
                },
                _ => return Err(usage("login <user> <password> [--remember]")),
            },
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,

            "search" | "s" => Command::Search(rest.to_string()),
            "add" | "a" => {
                let (selector, quantity) = match args.as_slice() {
                    [selector] => (*selector, 1),
                    [selector, quantity] => (*selector, integer(quantity, "quantity")?),
                    _ => return Err(usage("add <result #|@id> [quantity]")),
                };
                Command::Add {
                    selector: product_selector(selector)?,
                    quantity,
                }
            }
            "qty" => match args.as_slice() {
                [line, quantity] => Command::SetQuantity {
                    line: position(line)?,
                    quantity: integer(quantity, "quantity")?,
                },
                _ => return Err(usage("qty <line #> <quantity>")),
            },
            "rm" | "remove" => match args.as_slice() {
                [line] => Command::Remove(position(line)?),
                _ => return Err(usage("rm <line #>")),
            },
            "cart" => Command::ShowCart,
            "clear" => Command::ClearCart,
            "client" => match args.as_slice() {
                ["none"] | ["-"] => Command::SelectClient(None),
                [document] => Command::SelectClient(Some(validate_document_number(document)?)),
                _ => return Err(usage("client <CI>|none")),
            },
            "checkout" | "pay-step" => Command::Checkout,
            "ci" => Command::LookupClient(required(rest, "ci <document number>")?.to_string()),
            "newclient" => Command::NewClient(required(rest, "newclient <name>")?.to_string()),
            "changeclient" => Command::ChangeClient,
            "pay" => {
                let method = required(rest, "pay cash|card")?
                    .parse::<PaymentMethod>()
                    .map_err(AppError::validation)?;
                Command::Pay(method)
            }
            "tender" => Command::Tender(required(rest, "tender <amount>")?.to_string()),
            "note" => Command::Note(rest.to_string()),
            "confirm" => Command::Confirm,
            "cancel" => Command::Cancel,
            "receipt" => Command::LastReceipt,

            "products" => Command::Products(rest.to_string()),
            "product" => Command::Product(required(rest, "product <id>")?.to_string()),
            "pnew" => Command::CreateProduct(product_draft(required(
                rest,
                PRODUCT_FIELDS_USAGE,
            )?)?),
            "pedit" => match rest.split_once(char::is_whitespace) {
                Some((id, fields)) => Command::UpdateProduct {
                    id: id.to_string(),
                    draft: product_draft(fields)?,
                },
                None => return Err(usage("pedit <id> <fields>")),
            },
            "pdel" => Command::DeleteProduct(required(rest, "pdel <id>")?.to_string()),

            "clients" => Command::Clients(rest.to_string()),
            "cnew" => match rest.split_once(char::is_whitespace) {
                Some((document, name)) => Command::CreateClient {
                    document_number: validate_document_number(document)?,
                    name: validate_client_name(name)?,
                },
                None => return Err(usage("cnew <CI> <name>")),
            },
            "invoices" => Command::Invoices,
            "invoice" => Command::Invoice(required(rest, "invoice <id>")?.to_string()),

            "users" => Command::Users,
            "user" => Command::User(required(rest, "user <id>")?.to_string()),
            "unew" => Command::CreateUser(user_draft(required(rest, USER_FIELDS_USAGE)?, true)?),
            "uedit" => match rest.split_once(char::is_whitespace) {
                Some((id, fields)) => Command::UpdateUser {
                    id: id.to_string(),
                    draft: user_draft(fields, false)?,
                },
                None => return Err(usage("uedit <id> name;username;email;rol[;password]")),
            },
            "udel" => Command::DeleteUser(required(rest, "udel <id>")?.to_string()),

            "suppliers" => Command::Suppliers,
            "snew" => Command::CreateSupplier(supplier(required(rest, "snew name[;contact[;phone]]")?)?),
            "purchases" => Command::Purchases,
            "buy" => Command::Purchase(purchase_draft(&args)?),

            other => {
                return Err(AppError::unknown_command(format!(
                    "Unknown command '{other}'. Type help for the list."
                )))
            }
        };
        Ok(Some(command))
    }
}

const PRODUCT_FIELDS_USAGE: &str =
    "pnew code;name;price[;stock[;generic name[;therapeutic action[;barcode]]]]";

fn usage(text: &str) -> AppError {
    AppError::unknown_command(format!("Usage: {text}"))
}

fn required<'a>(rest: &'a str, text: &str) -> AppResult<&'a str> {
    if rest.is_empty() {
        Err(usage(text))
    } else {
        Ok(rest)
    }
}

fn integer(raw: &str, field: &str) -> AppResult<i64> {
    raw.parse::<i64>().map_err(|_| {
        AppError::from(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("'{raw}' is not a whole number"),
        })
    })
}

fn position(raw: &str) -> AppResult<usize> {
    match raw.trim_start_matches('#').parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(AppError::validation(format!("'{raw}' is not a line number"))),
    }
}

fn product_selector(raw: &str) -> AppResult<ProductSelector> {
    match raw.strip_prefix('@') {
        Some(id) if !id.is_empty() => Ok(ProductSelector::Id(id.to_string())),
        Some(_) => Err(usage("add @<product id>")),
        None => position(raw).map(ProductSelector::Result),
    }
}

/// `code;name;price[;stock[;generic[;action[;barcode]]]]`
fn product_draft(raw: &str) -> AppResult<ProductDraft> {
    let fields: Vec<&str> = raw.split(';').map(str::trim).collect();
    if fields.len() < 3 {
        return Err(usage(PRODUCT_FIELDS_USAGE));
    }

    let mut draft = ProductDraft::with_code(validate_product_code(fields[0])?);
    draft.name = validate_client_name(fields[1])
        .map_err(|_| AppError::validation("Product name is required"))?;
    draft.price = parse_amount(fields[2])
        .filter(|m| !m.is_negative())
        .ok_or_else(|| AppError::validation(format!("'{}' is not a valid price", fields[2])))?;

    let optional = |i: usize| {
        fields
            .get(i)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    };
    draft.stock = match optional(3) {
        Some(raw) => match raw.replace(',', ".").parse::<f64>() {
            Ok(stock) if stock >= 0.0 => Some(stock),
            _ => return Err(AppError::validation(format!("'{raw}' is not a valid stock"))),
        },
        None => None,
    };
    draft.generic_name = optional(4);
    draft.therapeutic_action = optional(5);
    draft.barcode = optional(6);
    Ok(draft)
}

const USER_FIELDS_USAGE: &str = "unew name;username;email;rol;password";

/// `name;username;email;rol[;password]`
///
/// A new user needs a password and a username or email; an empty role
/// defaults to `vendedor`. An edit must name the role and keeps the
/// current password when none is given.
fn user_draft(raw: &str, creating: bool) -> AppResult<UserDraft> {
    let fields: Vec<&str> = raw.split(';').map(str::trim).collect();
    if fields.len() < 4 {
        return Err(usage(USER_FIELDS_USAGE));
    }
    let optional = |i: usize| {
        fields
            .get(i)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    };

    let role = if creating && fields[3].is_empty() {
        Role::Vendedor
    } else {
        validate_user_role(fields[3])?
    };
    let draft = UserDraft {
        name: validate_user_name(fields[0])?,
        username: optional(1),
        email: optional(2),
        role,
        password: optional(4),
    };

    if creating && (draft.password.is_none() || (draft.username.is_none() && draft.email.is_none())) {
        return Err(AppError::validation(
            "A new user needs a username or email and a password",
        ));
    }
    Ok(draft)
}

/// `name[;contact[;phone]]`
fn supplier(raw: &str) -> AppResult<NewSupplier> {
    let mut fields = raw.split(';').map(str::trim);
    let name = validate_client_name(fields.next().unwrap_or_default())
        .map_err(|_| AppError::validation("Supplier name is required"))?;
    let mut optional = || fields.next().filter(|v| !v.is_empty()).map(str::to_string);
    Ok(NewSupplier {
        name,
        contact: optional(),
        phone: optional(),
    })
}

const BUY_USAGE: &str = "buy [prov=<id>] <product id>:<qty>[:<cost>] ... [total=<amount>]";

/// `[prov=<id>] <id>:<qty>[:<cost>] ... [total=<amount>]`
fn purchase_draft(args: &[&str]) -> AppResult<PurchaseDraft> {
    let mut supplier_id = None;
    let mut total = None;
    let mut items = Vec::new();

    for arg in args {
        if let Some(id) = arg.strip_prefix("prov=") {
            supplier_id = Some(id.to_string());
        } else if let Some(raw) = arg.strip_prefix("total=") {
            total = Some(amount(raw, "total")?);
        } else {
            let mut parts = arg.split(':');
            let (Some(product_id), Some(quantity)) = (parts.next(), parts.next()) else {
                return Err(usage(BUY_USAGE));
            };
            if product_id.is_empty() {
                return Err(usage(BUY_USAGE));
            }
            items.push(PurchaseItem {
                product_id: product_id.to_string(),
                quantity: integer(quantity, "quantity")?,
                unit_cost: match parts.next() {
                    Some(raw) => amount(raw, "cost")?,
                    None => Money::zero(),
                },
            });
        }
    }

    if items.is_empty() {
        return Err(usage(BUY_USAGE));
    }
    Ok(PurchaseDraft::new(supplier_id, items, total)?)
}

fn amount(raw: &str, field: &str) -> AppResult<Money> {
    parse_amount(raw)
        .filter(|m| !m.is_negative())
        .ok_or_else(|| AppError::validation(format!("'{raw}' is not a valid {field}")))
}
