//! Prompt builders: fixed system messages + deterministic user prompts.
//!
//! Identical inputs always produce byte-identical prompts.

use doc_store::RetrievedChunk;

use crate::types::TestCase;

/// System instructions for test-case generation.
pub const TEST_CASE_SYSTEM: &str = r#"You are an expert QA engineer who writes test cases from product documentation.

Rules:
1. Base every test case on the provided documentation context.
2. Include both positive and negative test cases.
3. If the context is sparse, still produce at least 2 basic functional test cases.
4. Each test case is a JSON object with these fields:
{
  "test_id": "TC-001",
  "feature": "Feature name",
  "test_scenario": "What is being tested",
  "test_type": "positive" or "negative",
  "preconditions": ["Setup needed"],
  "test_steps": ["Step 1: action", "Step 2: action"],
  "expected_result": "What should happen",
  "source_document": "Document the case is based on"
}

Return ONLY a valid JSON array of test cases. Do not return an empty array."#;

/// System instructions for Selenium script generation.
pub const SELENIUM_SYSTEM: &str = r#"You are an expert Selenium (Python) automation engineer.

Requirements:
1. Use the element selectors from the provided HTML structure (ids, names, CSS selectors).
2. Import every Selenium module the script needs.
3. Use explicit waits (WebDriverWait), never implicit waits.
4. Assert the expected result of every test case.
5. Include setup and teardown of the driver.
6. Comment each step briefly.
7. The script must be self-contained and executable.

Return ONLY the Python code. No markdown fences, no explanations."#;

/// System instructions for explanations.
pub const EXPLAIN_SYSTEM: &str = "You are a QA expert who explains test cases in simple, clear English.";

/// System instructions for finding the data fields of a test case.
pub const FIELD_EXTRACTION_SYSTEM: &str = r#"You are an expert at analyzing test cases and identifying the data fields they need.

For each field, determine:
1. field_name
2. data_type: one of email, phone, name, username, password, age, date, price, discount_code, url, address, zipcode, credit_card, text, number
3. required: true or false
4. constraints: optional min, max, min_length, max_length

Return ONLY a valid JSON array, for example:
[
  {"field_name": "email", "data_type": "email", "required": true, "constraints": {}},
  {"field_name": "age", "data_type": "age", "required": true, "constraints": {"min": 18, "max": 100}}
]

If the test case needs no data, return []."#;

/// Shown instead of a context block when retrieval returned nothing.
pub const NO_CONTEXT: &str = "No documentation context available.";

/// Shown when no page structure was analyzed.
pub const NO_HTML: &str = "No HTML structure available.";

/// Labeled context block within `max_chars`, preserving retrieval order.
///
/// Each chunk renders as `[n] source: <filename>` followed by its text. A chunk that
/// does not fit is cut at a char boundary and the block ends there.
pub fn build_context(hits: &[RetrievedChunk], max_chars: usize) -> String {
    if hits.is_empty() {
        return NO_CONTEXT.to_string();
    }

    let mut out = String::new();
    let mut budget = max_chars;
    for (i, h) in hits.iter().enumerate() {
        let header = format!("[{}] source: {}\n", i + 1, h.source);
        let header_len = header.chars().count();
        if header_len >= budget {
            break;
        }
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&header);
        budget -= header_len;

        let text = h.chunk.text.trim();
        let len = text.chars().count();
        if len + 1 > budget {
            out.extend(text.chars().take(budget.saturating_sub(2)));
            out.push_str("\n…\n");
            break;
        }
        out.push_str(text);
        out.push('\n');
        budget -= len + 1;
    }
    out.trim_end().to_string()
}

/// User prompt for test-case generation.
pub fn test_case_prompt(feature: &str, hits: &[RetrievedChunk], max_chars: usize) -> String {
    format!(
        "Documentation Context:\n---\n{ctx}\n---\n\n\
         Feature to Test: {feature}\n\n\
         Based on the documentation above, generate 3-5 test cases for this feature, \
         covering positive and negative scenarios.\n\
         Return a JSON array of test case objects.",
        ctx = build_context(hits, max_chars),
        feature = feature.trim(),
    )
}

/// User prompt for Selenium generation.
pub fn selenium_prompt(
    test_cases: &[TestCase],
    html_context: Option<&str>,
    hits: &[RetrievedChunk],
    max_chars: usize,
) -> String {
    format!(
        "Test Cases:\n{cases}\n\n\
         HTML Structure:\n{html}\n\n\
         Documentation Context:\n{ctx}\n\n\
         Generate one complete, executable Selenium Python script that covers the test cases above.\n\
         Use the element selectors from the HTML structure.",
        cases = render_test_cases(test_cases),
        html = html_context.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(NO_HTML),
        ctx = build_context(hits, max_chars),
    )
}

/// User prompt for explaining one test case.
pub fn explain_prompt(test_case: &str) -> String {
    format!(
        "Explain this test case in simple terms:\n\n{}\n\n\
         Provide a brief, clear explanation of what this test verifies.",
        test_case.trim()
    )
}

/// User prompt for field extraction.
pub fn fields_prompt(test_case: &str) -> String {
    format!(
        "Test Case:\n{}\n\nExtract all data fields from this test case.",
        test_case.trim()
    )
}

/// Stable plain-text rendering of test cases.
pub fn render_test_cases(test_cases: &[TestCase]) -> String {
    let mut out = String::new();
    for (i, tc) in test_cases.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!(
            "{} [{}] {}\n",
            tc.test_id,
            match tc.test_type {
                crate::types::TestType::Positive => "positive",
                crate::types::TestType::Negative => "negative",
            },
            tc.title
        ));
        if !tc.preconditions.is_empty() {
            out.push_str(&format!("Preconditions: {}\n", tc.preconditions.join("; ")));
        }
        for (n, step) in tc.steps.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", n + 1, step));
        }
        out.push_str(&format!("Expected: {}\n", tc.expected_result));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TestType;
    use doc_store::Chunk;

    fn hit(source: &str, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk: Chunk {
                id: format!("{source}:00000"),
                document_id: source.to_string(),
                index: 0,
                text: text.to_string(),
                start: 0,
                end: text.chars().count(),
            },
            source: source.to_string(),
            distance: 0.5,
            score: 1.0 / 1.5,
        }
    }

    fn case() -> TestCase {
        TestCase {
            test_id: "TC-001".into(),
            feature: "Discount".into(),
            title: "Valid code".into(),
            test_type: TestType::Positive,
            preconditions: vec!["Cart has items".into()],
            steps: vec!["Enter SAVE15".into(), "Click Apply".into()],
            expected_result: "15% off".into(),
            source_document: None,
        }
    }

    #[test]
    fn test_case_prompt_golden() {
        let hits = [
            hit("specs.md", "SAVE15 gives 15% off."),
            hit("faq.txt", "Codes are case sensitive."),
        ];
        let expected = "Documentation Context:\n---\n\
[1] source: specs.md\nSAVE15 gives 15% off.\n\n\
[2] source: faq.txt\nCodes are case sensitive.\n---\n\n\
Feature to Test: discount code\n\n\
Based on the documentation above, generate 3-5 test cases for this feature, covering positive and negative scenarios.\n\
Return a JSON array of test case objects.";
        assert_eq!(test_case_prompt("  discount code ", &hits, 8000), expected);
        assert_eq!(
            test_case_prompt("discount code", &hits, 8000),
            test_case_prompt("discount code", &hits, 8000)
        );
    }

    #[test]
    fn empty_context_is_explicit() {
        let p = test_case_prompt("login", &[], 8000);
        assert!(p.contains("---\nNo documentation context available.\n---"));
    }

    #[test]
    fn selenium_prompt_golden() {
        let expected = "Test Cases:\n\
TC-001 [positive] Valid code\n\
Preconditions: Cart has items\n  1. Enter SAVE15\n  2. Click Apply\nExpected: 15% off\n\n\
HTML Structure:\nNo HTML structure available.\n\n\
Documentation Context:\nNo documentation context available.\n\n\
Generate one complete, executable Selenium Python script that covers the test cases above.\n\
Use the element selectors from the HTML structure.";
        assert_eq!(selenium_prompt(&[case()], None, &[], 8000), expected);
    }

    #[test]
    fn context_respects_budget() {
        let long = "x".repeat(500);
        let ctx = build_context(&[hit("a.md", &long), hit("b.md", "never shown")], 100);
        assert!(ctx.chars().count() <= 100);
        assert!(ctx.ends_with('…'));
        assert!(!ctx.contains("b.md"));
    }

    #[test]
    fn explain_prompt_golden() {
        assert_eq!(
            explain_prompt(" TC-001: login works "),
            "Explain this test case in simple terms:\n\nTC-001: login works\n\nProvide a brief, clear explanation of what this test verifies."
        );
    }

    #[test]
    fn fields_prompt_golden() {
        assert_eq!(
            fields_prompt("\nRegister with email and age\n"),
            "Test Case:\nRegister with email and age\n\nExtract all data fields from this test case."
        );
    }
}
