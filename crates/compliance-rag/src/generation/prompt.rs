//! Two-section compliance prompt

use super::{COMPLIANCE_LABEL, CUSTOMER_LABEL};

/// Default role framing for the sales compliance assistant
pub const ROLE_FRAMING: &str =
    "You are a CryoCord sales compliance assistant with access to uploaded knowledge base documents.";

/// Prompt builder for compliance queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render the prompt
    ///
    /// `context` is embedded verbatim and may be empty (context-free fallback).
    pub fn build(role: &str, context: &str, question: &str) -> String {
        format!(
            r#"{role}

{context}

Customer Question: {question}

Based on the knowledge base documents above, respond with exactly two sections in this order.
Start each section with its label exactly as written below, on its own line.

{compliance}
(for internal use)
   - Key regulatory considerations from the documents
   - Required disclosures
   - Risk factors to address
   - Recommended talking points

{customer}
(for customer-facing response)
   - Clear, accurate answer based on the knowledge base
   - Compliant language
   - Relevant disclaimers if needed
   - Reference specific documents when applicable

If the documents don't contain relevant information, acknowledge this in both sections and provide general guidance.
"#,
            role = role,
            context = context,
            question = question,
            compliance = COMPLIANCE_LABEL,
            customer = CUSTOMER_LABEL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ResponseSplitter;

    #[test]
    fn test_prompt_embeds_context_and_question() {
        let prompt = PromptBuilder::build(
            ROLE_FRAMING,
            "\n\n=== KNOWLEDGE BASE DOCUMENTS ===\n\nDocument 1: policy.txt\nNo cure claims.\n\n",
            "Can we say cord blood cures autism?",
        );

        assert!(prompt.starts_with(ROLE_FRAMING));
        assert!(prompt.contains("Document 1: policy.txt"));
        assert!(prompt.contains("Customer Question: Can we say cord blood cures autism?"));
    }

    #[test]
    fn test_sections_requested_in_order() {
        let prompt = PromptBuilder::build("role", "", "q");
        let compliance = prompt.find(COMPLIANCE_LABEL).unwrap();
        let customer = prompt.find(CUSTOMER_LABEL).unwrap();
        assert!(compliance < customer);
        assert_eq!(prompt.matches(COMPLIANCE_LABEL).count(), 1);
        assert_eq!(prompt.matches(CUSTOMER_LABEL).count(), 1);
    }

    #[test]
    fn test_output_shaped_like_the_template_splits() {
        let prompt = PromptBuilder::build(ROLE_FRAMING, "", "How long is storage?");
        let start = prompt.find(COMPLIANCE_LABEL).unwrap();

        // A model that echoes the requested layout must parse cleanly
        let echoed = &prompt[start..];
        let split = ResponseSplitter::split(echoed);
        assert!(split.parsed_ok);
        assert!(split.compliance.starts_with("(for internal use)"));
        assert!(split.customer.starts_with("(for customer-facing response)"));
    }
}
