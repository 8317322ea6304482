//! The commands.
//!
//! Each command is a struct holding its parameters and collaborators, and
//! implements [`Cmdlet`]. Running it writes to a
//! [`CommandRuntime`](crate::runtime::CommandRuntime).

use async_trait::async_trait;
use mgmtkit_core::MgmtError;

use crate::context::ExecutionContext;
use crate::runtime::CommandRuntime;

mod get_database;
mod new_add_on;

pub use get_database::GetAzureSqlDatabaseCommand;
pub use new_add_on::{NEW_ADD_ON_CAPTION, NewAzureStoreAddOnCommand};

/// A command that can be executed.
#[async_trait]
pub trait Cmdlet: Send {
    /// The command's user-facing name, e.g. `Get-AzureSqlDatabase`.
    fn name(&self) -> &'static str;

    /// Run the command.
    ///
    /// Non-terminating failures are written to `runtime` as error records;
    /// a returned error terminates the command.
    async fn execute_cmdlet(
        &mut self,
        context: &ExecutionContext,
        runtime: &mut dyn CommandRuntime,
    ) -> Result<(), MgmtError>;
}
