/// Errors from building or decoding integrity records.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("manifest serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("manifest describes object {found:?}, expected {expected:?}")]
    ForeignManifest { expected: String, found: String },
}
