use serde::Serialize;

/// Which entry point started a run. Stored in `collection_runs.trigger_source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Api,
    Cli,
}

impl TriggerSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerSource::Api => "api",
            TriggerSource::Cli => "cli",
        }
    }
}

/// A failure scoped to one product inside a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub product_hash: String,
    pub message: String,
}

impl ItemError {
    pub fn new(product_hash: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self {
            product_hash: product_hash.into(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for ItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.product_hash, self.message)
    }
}
