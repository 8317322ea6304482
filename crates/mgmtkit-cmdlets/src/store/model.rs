//! Store add-on entities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A purchased store add-on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOn {
    /// The name chosen for this instance.
    pub name: String,
    /// The add-on product, e.g. `Search`.
    #[serde(rename = "type")]
    pub add_on: String,
    /// The product plan, e.g. `free`.
    pub plan: String,
    /// The region hosting it.
    pub location: String,
    /// Provisioning state reported by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// The operation a confirmation message describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Purchase a new add-on.
    New,
    /// Change an add-on's plan.
    Set,
    /// Remove an add-on.
    Remove,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "purchase"),
            Self::Set => write!(f, "change"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// Body of a create request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewAddOnRequest<'a> {
    #[serde(rename = "type")]
    pub add_on: &'a str,
    pub plan: &'a str,
    pub location: &'a str,
    pub promotion_code: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_on_json() {
        let add_on: AddOn = serde_json::from_value(json!({
            "name": "TestAddOn",
            "type": "Search",
            "plan": "free",
            "location": "West US"
        }))
        .unwrap();
        assert_eq!(add_on.add_on, "Search");
        assert!(add_on.state.is_none());
    }

    #[test]
    fn test_request_keeps_null_promotion_code() {
        let body = serde_json::to_value(NewAddOnRequest {
            add_on: "Search",
            plan: "free",
            location: "West US",
            promotion_code: None,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({ "type": "Search", "plan": "free", "location": "West US", "promotionCode": null })
        );
    }
}
