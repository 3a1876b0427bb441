//! Restaurant back-office client core.
//!
//! Headless controllers for the back-office dashboard: a typed client for
//! the REST API, per-resource modules, the cascading restaurant → branch →
//! category selectors, list/editor state for every CRUD page, the POS cart
//! and the report viewer. A UI shell drives these and renders their state;
//! all persistence and business rules live behind the API.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub mod api;
pub mod auth;
pub mod cart;
pub mod chain;
pub mod config;
pub mod editor;
pub mod error;
pub mod forms;
pub mod list;
pub mod logging;
pub mod notice;
pub mod page;
pub mod report_viewer;
pub mod resources;
pub mod selector;
pub mod storage;

pub use api::ApiClient;
pub use auth::{AccessScope, Session, UserProfile};
pub use cart::{Cart, CartError, OrderDetails};
pub use chain::ScopeChain;
pub use config::{ClientConfig, ConfigError};
pub use editor::{Form, RecordEditor, ValidationErrors};
pub use error::ApiError;
pub use list::ListController;
pub use notice::Notice;
pub use page::ResourcePage;
pub use report_viewer::ReportViewer;
pub use selector::{CascadingSelect, Choice};
pub use storage::{CredentialStore, KeyringStore, MemoryStore};

use resources::orders::OrdersApi;
use resources::reports::ReportsApi;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Entry point for a UI shell: one configured client and credential store,
/// from which sessions, pages and controllers are built.
#[derive(Clone)]
pub struct BackOffice {
    config: ClientConfig,
    client: ApiClient,
    store: Arc<dyn CredentialStore>,
}

impl BackOffice {
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let client = ApiClient::from_config(&config)?;
        info!(
            api_url = %client.base_url(),
            version = env!("CARGO_PKG_VERSION"),
            "back-office client ready"
        );
        Ok(Self {
            config,
            client,
            store,
        })
    }

    /// Environment first, then the API URL remembered in the OS keyring.
    pub fn from_env() -> Result<Self, StartupError> {
        let store: Arc<dyn CredentialStore> = Arc::new(KeyringStore::default());
        let config = ClientConfig::from_env_and_store(store.as_ref())?;
        Ok(Self::new(config, store)?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> Arc<dyn CredentialStore> {
        Arc::clone(&self.store)
    }

    pub fn session(&self) -> Session {
        Session::new(self.client.clone(), self.store())
    }

    pub fn cart(&self) -> Cart {
        Cart::from_config(&self.config)
    }

    pub fn orders(&self) -> OrdersApi {
        OrdersApi::new(self.client.clone())
    }

    pub fn report_viewer(&self) -> ReportViewer<ReportsApi> {
        ReportViewer::new(ReportsApi::new(self.client.clone()))
    }

    /// Restaurant → branch selects.
    pub fn scope_chain(&self) -> ScopeChain {
        ScopeChain::for_client(&self.client)
    }

    /// Restaurant → branch (with "global") → category/modifier selects.
    pub fn menu_chain(&self) -> ScopeChain {
        ScopeChain::menu(&self.client)
    }

    /// Inventory item dialog: restaurant → category → subcategory.
    pub fn inventory_item_editor(&self) -> forms::inventory::InventoryItemEditor {
        forms::inventory::InventoryItemEditor::for_client(&self.client)
    }

    pub fn supplier_product_editor(&self) -> forms::inventory::SupplierProductEditor {
        forms::inventory::SupplierProductEditor::for_client(&self.client)
    }

    /// A CRUD page over `api`.
    pub fn page<A, F>(&self, api: A) -> ResourcePage<A, F>
    where
        A: resources::ResourceApi,
        F: Form<Record = A::Record, Input = A::Input>,
    {
        ResourcePage::new(api)
    }

    pub async fn check_connectivity(&self) -> api::ConnectivityResult {
        api::test_connectivity(self.client.base_url()).await
    }
}
