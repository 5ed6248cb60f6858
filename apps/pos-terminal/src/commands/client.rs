//! # Client Commands
//!
//! Client list, name search and registration from the back office.
//! Registration during a sale goes through the payment step instead.

use farma_api::PosBackend;
use farma_core::validation::validate_search_term;
use farma_core::{Client, NewClient};
use tracing::info;

use crate::error::AppResult;

/// Lists clients, or searches by name when `name` is given.
pub async fn list_clients(backend: &dyn PosBackend, name: &str) -> AppResult<Vec<Client>> {
    let name = validate_search_term(name)?;
    let clients = if name.is_empty() {
        backend.list_clients().await?
    } else {
        backend.search_clients(&name).await?
    };
    Ok(clients)
}

/// Registers a client. A CI the backend already has comes back as its
/// conflict message.
pub async fn create_client(backend: &dyn PosBackend, new_client: NewClient) -> AppResult<Client> {
    let client = backend.create_client(&new_client).await?;
    info!(client_id = %client.id, "Client registered");
    Ok(client)
}
