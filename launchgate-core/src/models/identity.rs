//! Client identity sent with decision requests.

use serde::{Deserialize, Serialize};

/// Fixed client identifiers attached to every decision request.
///
/// These values are authoritative: when a conversion or deep-link payload
/// carries a colliding key, the identity value wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    /// Application bundle identifier.
    pub bundle_id: String,
    /// Operating system name reported to the endpoint.
    pub os: String,
    /// Store identifier of the app listing.
    pub store_id: String,
    /// BCP 47 locale tag of the device.
    pub locale: String,
    /// Firebase project the client reports into, when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firebase_project_id: Option<String>,
}

impl AppIdentity {
    /// Creates an identity from the required fields.
    pub fn new(
        bundle_id: impl Into<String>,
        os: impl Into<String>,
        store_id: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            os: os.into(),
            store_id: store_id.into(),
            locale: locale.into(),
            firebase_project_id: None,
        }
    }

    /// Sets the Firebase project identifier.
    pub fn with_firebase_project_id(mut self, id: impl Into<String>) -> Self {
        self.firebase_project_id = Some(id.into());
        self
    }
}
