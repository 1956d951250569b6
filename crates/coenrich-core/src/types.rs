use serde::{Deserialize, Serialize};

/// Header names of the three output columns, in the order they are appended
/// to a sheet that lacks them.
pub const OUTPUT_HEADERS: [&str; 3] = ["Company ID", "Company Location", "Company URL"];

/// Fields recovered from a single profile page.
///
/// Either field may be empty; an empty string means "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub identifier: String,
    pub location: String,
}

/// Output of the enrichment pipeline for one company name.
///
/// Every field defaults to the empty string when the corresponding lookup
/// fails. Callers treat empty as "unresolved", never as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub identifier: String,
    pub location: String,
    pub url: String,
}

impl EnrichmentResult {
    /// Builds a result from a resolved profile URL and whatever was extracted
    /// from its page.
    #[must_use]
    pub fn from_fields(url: String, fields: ExtractedFields) -> Self {
        Self {
            identifier: fields.identifier,
            location: fields.location,
            url,
        }
    }

    /// Values in output-column order: identifier, location, url.
    #[must_use]
    pub fn values(&self) -> [&str; 3] {
        [&self.identifier, &self.location, &self.url]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(|v| v.is_empty())
    }
}
