//! Tests for `New-AzureStoreAddOn` against a scripted store client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mgmtkit_cmdlets::commands::NEW_ADD_ON_CAPTION;
use mgmtkit_cmdlets::prelude::*;
use mgmtkit_core::{ErrorCategory, MgmtError};
use pretty_assertions::assert_eq;

const NAME: &str = "TestAddOn";
const LOCATION: &str = "West US";
const ADD_ON: &str = "Search";
const PLAN: &str = "free";
const MESSAGE: &str = "Expected message for new";

type NewCall = (String, String, String, String, Option<String>);

#[derive(Default)]
struct ScriptedStore {
    existing: Option<AddOn>,
    new_calls: Mutex<Vec<NewCall>>,
    confirmation_requests: Mutex<Vec<(OperationType, String, String)>>,
}

impl ScriptedStore {
    fn with_existing() -> Self {
        Self {
            existing: Some(AddOn {
                name: NAME.to_string(),
                add_on: ADD_ON.to_string(),
                plan: PLAN.to_string(),
                location: LOCATION.to_string(),
                state: Some("Provisioned".to_string()),
            }),
            ..Self::default()
        }
    }

    fn new_calls(&self) -> Vec<NewCall> {
        self.new_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoreClient for ScriptedStore {
    async fn try_get_add_on(&self, name: &str) -> Result<Option<AddOn>, MgmtError> {
        assert_eq!(name, NAME);
        Ok(self.existing.clone())
    }

    async fn new_add_on(
        &self,
        name: &str,
        add_on: &str,
        plan: &str,
        location: &str,
        promotion_code: Option<&str>,
    ) -> Result<AddOn, MgmtError> {
        self.new_calls.lock().unwrap().push((
            name.to_string(),
            add_on.to_string(),
            plan.to_string(),
            location.to_string(),
            promotion_code.map(str::to_string),
        ));
        Ok(AddOn {
            name: name.to_string(),
            add_on: add_on.to_string(),
            plan: plan.to_string(),
            location: location.to_string(),
            state: None,
        })
    }

    fn get_confirmation_message(&self, operation: OperationType, add_on: &str, plan: &str) -> String {
        self.confirmation_requests.lock().unwrap().push((
            operation,
            add_on.to_string(),
            plan.to_string(),
        ));
        MESSAGE.to_string()
    }
}

/// Confirmation that answers `answer` and counts matching prompts.
struct CountingConfirmation {
    answer: bool,
    asked: AtomicUsize,
}

impl CountingConfirmation {
    fn new(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            asked: AtomicUsize::new(0),
        })
    }

    fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl Confirmation for CountingConfirmation {
    fn should_process(&self, caption: &str, message: &str) -> bool {
        assert_eq!(caption, NEW_ADD_ON_CAPTION);
        assert_eq!(message, MESSAGE);
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

fn command(store: &Arc<ScriptedStore>, confirmation: &Arc<CountingConfirmation>) -> NewAzureStoreAddOnCommand {
    NewAzureStoreAddOnCommand::new(
        Arc::clone(store) as Arc<dyn StoreClient>,
        Arc::clone(confirmation) as Arc<dyn Confirmation>,
        NAME,
        ADD_ON,
        PLAN,
        LOCATION,
    )
}

#[tokio::test]
async fn test_new_add_on_when_confirmed() {
    let store = Arc::new(ScriptedStore::default());
    let confirmation = CountingConfirmation::new(true);
    let mut streams = OutputStreams::new();

    command(&store, &confirmation)
        .execute_cmdlet(&ExecutionContext::new(), &mut streams)
        .await
        .unwrap();

    assert_eq!(
        store.new_calls(),
        vec![(
            NAME.to_string(),
            ADD_ON.to_string(),
            PLAN.to_string(),
            LOCATION.to_string(),
            None
        )]
    );
    assert_eq!(
        *store.confirmation_requests.lock().unwrap(),
        vec![(OperationType::New, ADD_ON.to_string(), PLAN.to_string())]
    );
    assert_eq!(confirmation.asked(), 1);
    assert_eq!(streams.objects, vec![PipelineObject::Bool(true)]);
    assert!(streams.errors.is_empty());
}

#[tokio::test]
async fn test_new_add_on_when_declined() {
    let store = Arc::new(ScriptedStore::default());
    let confirmation = CountingConfirmation::new(false);
    let mut streams = OutputStreams::new();

    command(&store, &confirmation)
        .execute_cmdlet(&ExecutionContext::new(), &mut streams)
        .await
        .unwrap();

    assert!(store.new_calls().is_empty());
    assert_eq!(confirmation.asked(), 1);
    assert!(streams.objects.is_empty());
}

#[tokio::test]
async fn test_new_add_on_with_name_already_used() {
    let store = Arc::new(ScriptedStore::with_existing());
    let confirmation = CountingConfirmation::new(true);
    let mut streams = OutputStreams::new();

    let err = command(&store, &confirmation)
        .execute_cmdlet(&ExecutionContext::new(), &mut streams)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Add-on name TestAddOn is already used.");
    assert_eq!(err.category(), ErrorCategory::ResourceExists);
    assert!(store.new_calls().is_empty());
    assert_eq!(confirmation.asked(), 0);
    assert!(streams.objects.is_empty());
}

#[tokio::test]
async fn test_promotion_code_is_passed_through() {
    let store = Arc::new(ScriptedStore::default());
    let confirmation = CountingConfirmation::new(true);
    let mut streams = OutputStreams::new();

    command(&store, &confirmation)
        .with_promotion_code("WELCOME")
        .execute_cmdlet(&ExecutionContext::new(), &mut streams)
        .await
        .unwrap();

    assert_eq!(store.new_calls()[0].4.as_deref(), Some("WELCOME"));
}

#[tokio::test]
async fn test_closure_confirmation() {
    let store = Arc::new(ScriptedStore::default());
    let mut streams = OutputStreams::new();
    let mut cmd = NewAzureStoreAddOnCommand::new(
        Arc::clone(&store) as Arc<dyn StoreClient>,
        Arc::new(|_: &str, _: &str| false),
        NAME,
        ADD_ON,
        PLAN,
        LOCATION,
    );

    assert_eq!(cmd.name(), "New-AzureStoreAddOn");
    cmd.execute_cmdlet(&ExecutionContext::new(), &mut streams)
        .await
        .unwrap();
    assert!(store.new_calls().is_empty());
}
