use thiserror::Error;

/// Precondition failures at the schema/resolver boundary. These are thrown
/// (not recovered); the surrounding layout layer turns them into an error
/// page.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("master_data is missing from the design payload")]
    MissingMasterData,
    #[error("form_design_detail is missing from the design payload")]
    MissingFormDesign,
    #[error("malformed form design document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed form design document: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
