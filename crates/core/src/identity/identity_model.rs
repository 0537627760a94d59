use serde::{Deserialize, Serialize};

/// What the identity provider hands back on sign-in. Trusted as is; the
/// core never issues or validates credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}
