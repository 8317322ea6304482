//! `New-AzureStoreAddOn`.

use std::sync::Arc;

use async_trait::async_trait;
use mgmtkit_core::MgmtError;

use super::Cmdlet;
use crate::confirmation::Confirmation;
use crate::context::ExecutionContext;
use crate::runtime::CommandRuntime;
use crate::store::{OperationType, StoreClient};

/// Caption of the confirmation asked before purchasing.
pub const NEW_ADD_ON_CAPTION: &str = "Create new Add-On";

/// Purchases a store add-on.
///
/// Fails if the name is taken. Otherwise asks for confirmation and, when
/// given, creates the add-on and writes `true`.
pub struct NewAzureStoreAddOnCommand {
    /// Name for the new add-on.
    pub name: String,
    /// The add-on product.
    pub add_on: String,
    /// The product plan.
    pub plan: String,
    /// Hosting region.
    pub location: String,
    /// Optional promotion code.
    pub promotion_code: Option<String>,
    store_client: Arc<dyn StoreClient>,
    confirmation: Arc<dyn Confirmation>,
}

impl NewAzureStoreAddOnCommand {
    /// Create the command.
    pub fn new(
        store_client: Arc<dyn StoreClient>,
        confirmation: Arc<dyn Confirmation>,
        name: impl Into<String>,
        add_on: impl Into<String>,
        plan: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            add_on: add_on.into(),
            plan: plan.into(),
            location: location.into(),
            promotion_code: None,
            store_client,
            confirmation,
        }
    }

    /// Apply a promotion code.
    #[must_use]
    pub fn with_promotion_code(mut self, code: impl Into<String>) -> Self {
        self.promotion_code = Some(code.into());
        self
    }
}

impl std::fmt::Debug for NewAzureStoreAddOnCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAzureStoreAddOnCommand")
            .field("name", &self.name)
            .field("add_on", &self.add_on)
            .field("plan", &self.plan)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Cmdlet for NewAzureStoreAddOnCommand {
    fn name(&self) -> &'static str {
        "New-AzureStoreAddOn"
    }

    async fn execute_cmdlet(
        &mut self,
        _context: &ExecutionContext,
        runtime: &mut dyn CommandRuntime,
    ) -> Result<(), MgmtError> {
        if self.store_client.try_get_add_on(&self.name).await?.is_some() {
            return Err(MgmtError::resource_conflict(
                &self.name,
                format!("Add-on name {} is already used.", self.name),
            ));
        }

        let message = self
            .store_client
            .get_confirmation_message(OperationType::New, &self.add_on, &self.plan);
        if !self.confirmation.should_process(NEW_ADD_ON_CAPTION, &message) {
            tracing::info!(name = %self.name, "Add-on purchase declined");
            return Ok(());
        }

        self.store_client
            .new_add_on(
                &self.name,
                &self.add_on,
                &self.plan,
                &self.location,
                self.promotion_code.as_deref(),
            )
            .await?;
        runtime.write_object(true.into());
        Ok(())
    }
}
