//! Label-based split of model output into the two answer sections

use serde::{Deserialize, Serialize};

use super::{COMPLIANCE_LABEL, CUSTOMER_LABEL};

/// Compliance text used when the model output could not be split
pub const REVIEW_SENTINEL: &str = "Review required";

/// Result of splitting a model response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitResponse {
    /// Internal compliance section
    pub compliance: String,
    /// Customer-facing section (never empty for non-empty input)
    pub customer: String,
    /// False when the labels were missing and the sentinel was used
    pub parsed_ok: bool,
}

/// Response splitter
pub struct ResponseSplitter;

impl ResponseSplitter {
    /// Split raw model text at the customer label
    ///
    /// Both labels must be present. Otherwise the compliance section is
    /// [`REVIEW_SENTINEL`] and the customer section is the raw text verbatim.
    /// Only the first compliance label is stripped; later repeats stay in the
    /// internal text.
    pub fn split(raw: &str) -> SplitResponse {
        if !raw.contains(COMPLIANCE_LABEL) {
            return Self::unparsed(raw);
        }
        let Some(at) = raw.find(CUSTOMER_LABEL) else {
            return Self::unparsed(raw);
        };

        let before = &raw[..at];
        let after = &raw[at + CUSTOMER_LABEL.len()..];

        let customer = after.trim();
        if customer.is_empty() {
            return Self::unparsed(raw);
        }

        SplitResponse {
            compliance: before.replacen(COMPLIANCE_LABEL, "", 1).trim().to_string(),
            customer: customer.to_string(),
            parsed_ok: true,
        }
    }

    fn unparsed(raw: &str) -> SplitResponse {
        tracing::warn!(
            "Model output lacked section labels ({} chars), flagging for review",
            raw.len()
        );
        SplitResponse {
            compliance: REVIEW_SENTINEL.to_string(),
            customer: raw.to_string(),
            parsed_ok: false,
        }
    }
}
