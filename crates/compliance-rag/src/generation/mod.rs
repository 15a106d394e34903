//! Prompt rendering and model-output splitting
//!
//! The prompt asks for two labeled sections and the splitter looks for the
//! same labels, so both sides read them from here.

pub mod prompt;
pub mod splitter;

pub use prompt::{PromptBuilder, ROLE_FRAMING};
pub use splitter::{ResponseSplitter, SplitResponse, REVIEW_SENTINEL};

/// Label opening the internal compliance section
pub const COMPLIANCE_LABEL: &str = "COMPLIANCE SUMMARY:";

/// Label opening the customer-facing section
pub const CUSTOMER_LABEL: &str = "CUSTOMER ANSWER:";
