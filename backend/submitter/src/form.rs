//! User-editable pool form and the request payload derived from it.

use serde::{Deserialize, Serialize};

/// Raw field values as typed by the user.
///
/// The UI layer owns and mutates this; the controller only ever sees a
/// snapshot taken at submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormData {
    pub name: String,
    pub description: String,
    pub external_url: String,
    pub image_hash: String,
    /// Decimal string in native units (up to 7 fractional digits).
    pub target_amount: String,
    /// Whole number of days, as typed.
    pub duration_days: String,
}

/// Identifies the form field a validation failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Description,
    ExternalUrl,
    ImageHash,
    TargetAmount,
    DurationDays,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::ExternalUrl => "externalUrl",
            Self::ImageHash => "imageHash",
            Self::TargetAmount => "targetAmount",
            Self::DurationDays => "durationDays",
        }
    }
}

/// Payload handed to [`ContractGateway::create_pool`](crate::gateway::ContractGateway::create_pool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolRequest {
    pub name: String,
    pub description: String,
    pub external_url: String,
    pub image_hash: String,
    /// Decimal string, native 7-decimal precision.
    pub target_amount: String,
    /// Unix epoch seconds after which the pool stops accepting contributions.
    pub deadline: u64,
}

impl CreatePoolRequest {
    /// Build the payload from an already validated form.
    pub fn from_form(form: &FormData, deadline: u64) -> Self {
        Self {
            name: form.name.trim().to_string(),
            description: form.description.trim().to_string(),
            external_url: form.external_url.trim().to_string(),
            image_hash: form.image_hash.trim().to_string(),
            target_amount: form.target_amount.trim().to_string(),
            deadline,
        }
    }
}
