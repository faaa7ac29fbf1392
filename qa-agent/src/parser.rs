//! Tolerant extraction of test cases, scripts and data fields from raw LLM text.
//!
//! Never panics and never errors: anything unusable becomes [`Parsed::Failed`]
//! carrying the raw text.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    test_data::{DataType, FieldSpec},
    types::{Parsed, SeleniumScript, TestCase, TestType},
};

/// First fenced block, with an optional language tag.
static FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_+\-]*[ \t]*\r?\n?(.*?)```").ok());

/// Removes markdown fences. An unterminated opening fence (truncated output) is dropped too.
pub fn strip_fences(raw: &str) -> &str {
    if let Some(caps) = FENCE.as_ref().and_then(|re| re.captures(raw)) {
        if let Some(m) = caps.get(1) {
            return m.as_str().trim();
        }
    }
    let t = raw.trim();
    match t.strip_prefix("```") {
        Some(rest) => rest
            .split_once('\n')
            .map(|(_, body)| body)
            .unwrap_or("")
            .trim(),
        None => t,
    }
}

/// Parses test cases out of `raw`.
///
/// Accepts a JSON array, an object wrapping an array under `test_cases`, or a single object,
/// optionally inside fences or prose. Records without title, steps and expected result are
/// dropped; missing ids become `TC-NNN` and a missing feature becomes `feature`.
pub fn parse_test_cases(raw: &str, feature: &str) -> Parsed<Vec<TestCase>> {
    if raw.trim().is_empty() {
        return Parsed::failed("empty response", raw);
    }
    let Some(value) = find_json(strip_fences(raw)).or_else(|| find_json(raw)) else {
        return Parsed::failed("no JSON array or object found in response", raw);
    };

    let items: Vec<Value> = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("test_cases") {
            Some(Value::Array(items)) => items,
            _ => vec![Value::Object(obj)],
        },
        _ => return Parsed::failed("JSON is neither an array nor an object", raw),
    };

    let total = items.len();
    let mut cases = Vec::with_capacity(total);
    for item in items {
        let Value::Object(obj) = item else { continue };
        if let Some(tc) = test_case_from(&obj, feature, cases.len() + 1) {
            cases.push(tc);
        }
    }
    debug!(total, kept = cases.len(), "test cases parsed");

    if cases.is_empty() {
        return Parsed::failed(
            format!("none of {total} records had a title, steps and an expected result"),
            raw,
        );
    }
    Parsed::Ok { value: cases }
}

/// Parses a Selenium script (Python) out of `raw`.
pub fn parse_selenium_script(raw: &str, test_case_ids: &[String]) -> Parsed<SeleniumScript> {
    let code = strip_fences(raw);
    if code.is_empty() {
        return Parsed::failed("empty script", raw);
    }
    Parsed::Ok {
        value: SeleniumScript {
            language: "python".into(),
            code: code.to_string(),
            test_case_ids: test_case_ids.to_vec(),
        },
    }
}

/// Parses data fields out of `raw`.
///
/// Accepts an array or an object wrapping one under `fields`. `[]` is a valid answer
/// (no fields). Duplicate names keep the first record.
pub fn parse_fields(raw: &str) -> Parsed<Vec<FieldSpec>> {
    if raw.trim().is_empty() {
        return Parsed::failed("empty response", raw);
    }
    let Some(value) = find_json(strip_fences(raw)).or_else(|| find_json(raw)) else {
        return Parsed::failed("no JSON array or object found in response", raw);
    };
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("fields") {
            Some(Value::Array(items)) => items,
            _ => vec![Value::Object(obj)],
        },
        _ => return Parsed::failed("JSON is neither an array nor an object", raw),
    };

    let total = items.len();
    let mut fields: Vec<FieldSpec> = Vec::with_capacity(total);
    for item in items {
        let Ok(mut f) = serde_json::from_value::<FieldSpec>(item) else { continue };
        f.field_name = f.field_name.trim().to_string();
        if f.field_name.is_empty() || fields.iter().any(|g| g.field_name == f.field_name) {
            continue;
        }
        fields.push(f);
    }
    debug!(total, kept = fields.len(), "fields parsed");

    if total > 0 && fields.is_empty() {
        return Parsed::failed(format!("none of {total} records was a usable field"), raw);
    }
    Parsed::Ok { value: fields }
}

/// Field-name keywords scanned when the model gives no usable answer.
static FIELD_KEYWORDS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("email", r"(?i)\b(email|e-mail|mail)\b"),
        ("phone", r"(?i)\b(phone|mobile|telephone|tel)\b"),
        ("username", r"(?i)\b(username|user name|login)\b"),
        ("name", r"(?i)\b(name|full name)\b"),
        ("password", r"(?i)\b(password|pwd|pass)\b"),
        ("age", r"(?i)\bage\b"),
        ("discount_code", r"(?i)\b(discount|promo|coupon|code)\b"),
        ("price", r"(?i)\b(price|cost|amount)\b"),
        ("date", r"(?i)\b(date|dob|birth date)\b"),
        ("address", r"(?i)\baddress\b"),
        ("zipcode", r"(?i)\b(zip|zipcode|postal code)\b"),
        ("credit_card", r"(?i)\b(credit card|card number)\b"),
        ("url", r"(?i)\b(url|website|link)\b"),
        ("quantity", r"(?i)\b(quantity|qty)\b"),
    ]
    .into_iter()
    .filter_map(|(name, pat)| Regex::new(pat).ok().map(|re| (name, re)))
    .collect()
});

/// Keyword scan of a test case; each hit becomes a required field typed from its name.
pub fn keyword_fields(test_case: &str) -> Vec<FieldSpec> {
    FIELD_KEYWORDS
        .iter()
        .filter(|(_, re)| re.is_match(test_case))
        .map(|(name, _)| FieldSpec::new(*name, DataType::detect(name)))
        .collect()
}

/// Whole text as JSON, else the widest `[..]` span, else the widest `{..}` span.
fn find_json(text: &str) -> Option<Value> {
    let t = text.trim();
    if let Ok(v) = serde_json::from_str::<Value>(t) {
        if v.is_array() || v.is_object() {
            return Some(v);
        }
    }
    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(s), Some(e)) = (t.find(open), t.rfind(close)) {
            if s < e {
                if let Ok(v) = serde_json::from_str::<Value>(&t[s..=e]) {
                    return Some(v);
                }
            }
        }
    }
    None
}

fn test_case_from(obj: &Map<String, Value>, feature: &str, ordinal: usize) -> Option<TestCase> {
    let tc = TestCase {
        test_id: str_field(obj, &["test_id", "id"]).unwrap_or_else(|| format!("TC-{ordinal:03}")),
        feature: str_field(obj, &["feature"]).unwrap_or_else(|| feature.trim().to_string()),
        title: str_field(obj, &["test_scenario", "scenario", "title"]).unwrap_or_default(),
        test_type: str_field(obj, &["test_type", "type"])
            .map(|s| TestType::from_label(&s))
            .unwrap_or_default(),
        preconditions: list_field(obj, &["preconditions"]),
        steps: list_field(obj, &["test_steps", "steps"]),
        expected_result: str_field(obj, &["expected_result", "expected"]).unwrap_or_default(),
        source_document: str_field(obj, &["source_document", "source"]),
    };
    tc.is_complete().then_some(tc)
}

fn str_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; ");
            (!joined.trim().is_empty()).then_some(joined)
        }
        _ => None,
    })
}

/// A list of strings, or a single string split into lines.
fn list_field(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let Some(v) = keys.iter().find_map(|k| obj.get(*k)) else {
        return Vec::new();
    };
    match v {
        Value::Array(items) => items
            .iter()
            .filter_map(|i| match i {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(_) | Value::Number(_) => Some(i.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: &str = r#"{"test_id":"TC-007","feature":"Discount","test_scenario":"Valid code","test_type":"positive","preconditions":["Cart has items"],"test_steps":["Enter SAVE15","Click Apply"],"expected_result":"15% off","source_document":"specs.md"}"#;

    #[test]
    fn plain_array() {
        let raw = format!("[{ONE}]");
        let cases = parse_test_cases(&raw, "ignored").ok().unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].test_id, "TC-007");
        assert_eq!(cases[0].title, "Valid code");
        assert_eq!(cases[0].steps, vec!["Enter SAVE15", "Click Apply"]);
        assert_eq!(cases[0].source_document.as_deref(), Some("specs.md"));
    }

    #[test]
    fn fenced_with_prose() {
        let raw = format!("Here are your tests:\n\n```json\n[{ONE}]\n```\nLet me know!");
        assert!(parse_test_cases(&raw, "f").is_ok());
    }

    #[test]
    fn wrapped_object_and_aliases() {
        let raw = r#"{"test_cases":[{"scenario":"Bad code","type":"Negative","steps":"Enter XXX\nClick Apply","expected":"Error shown"}]}"#;
        let cases = parse_test_cases(raw, "Discount code").ok().unwrap();
        assert_eq!(cases[0].test_id, "TC-001");
        assert_eq!(cases[0].feature, "Discount code");
        assert_eq!(cases[0].test_type, TestType::Negative);
        assert_eq!(cases[0].steps.len(), 2);
        assert_eq!(cases[0].expected_result, "Error shown");
    }

    #[test]
    fn single_object() {
        let cases = parse_test_cases(ONE, "f").ok().unwrap();
        assert_eq!(cases.len(), 1);
    }

    #[test]
    fn incomplete_records_are_dropped() {
        let raw = format!(r#"[{{"title":"no steps","expected_result":"x"}}, {ONE}]"#);
        let cases = parse_test_cases(&raw, "f").ok().unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].title, "Valid code");
    }

    #[test]
    fn truncated_json_keeps_raw_text() {
        let raw = r#"[{"test_id": "TC-001", "test_scenario": "Apply coupon", "test_steps": ["Open cart""#;
        match parse_test_cases(raw, "f") {
            Parsed::Failed { raw: kept, reason } => {
                assert_eq!(kept, raw);
                assert!(!reason.is_empty());
            }
            Parsed::Ok { .. } => panic!("truncated JSON must not parse"),
        }
    }

    #[test]
    fn prose_only_and_empty_fail() {
        assert!(!parse_test_cases("I cannot help with that.", "f").is_ok());
        assert!(!parse_test_cases("   ", "f").is_ok());
        assert!(!parse_test_cases("[]", "f").is_ok());
    }

    #[test]
    fn failure_serializes_with_status_tag() {
        let p: Parsed<Vec<TestCase>> = parse_test_cases("nope", "f");
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["status"], "parse_failed");
        assert_eq!(v["raw"], "nope");
    }

    #[test]
    fn fields_from_fenced_array() {
        let raw = "```json\n[{\"field_name\":\"email\",\"data_type\":\"email\"},\
                   {\"field_name\":\"age\",\"data_type\":\"age\",\"constraints\":{\"min\":18,\"max\":65}},\
                   {\"field_name\":\"email\",\"data_type\":\"text\"}]\n```";
        let fields = parse_fields(raw).ok().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].data_type, Some(DataType::Email));
        assert_eq!(fields[1].constraints.max, Some(65.0));
    }

    #[test]
    fn empty_field_list_is_an_answer() {
        assert_eq!(parse_fields("[]").ok(), Some(vec![]));
        assert_eq!(parse_fields(r#"{"fields": []}"#).ok(), Some(vec![]));
        assert!(!parse_fields("no fields here").is_ok());
        assert!(!parse_fields(r#"[{"data_type":"email"}]"#).is_ok());
    }

    #[test]
    fn keyword_scan_types_fields_by_name() {
        let fields = keyword_fields("Log in with a valid Email and Password, then apply coupon SAVE15");
        let names: Vec<_> = fields.iter().map(|f| (f.field_name.as_str(), f.resolved_type())).collect();
        assert_eq!(
            names,
            vec![
                ("email", DataType::Email),
                ("password", DataType::Password),
                ("discount_code", DataType::DiscountCode),
            ]
        );
        assert!(keyword_fields("Click the blue button").is_empty());
    }

    #[test]
    fn selenium_fences_are_stripped() {
        let raw = "```python\nfrom selenium import webdriver\n```";
        let s = parse_selenium_script(raw, &["TC-001".into()]).ok().unwrap();
        assert_eq!(s.code, "from selenium import webdriver");
        assert_eq!(s.language, "python");
        assert_eq!(s.test_case_ids, vec!["TC-001"]);

        let unterminated = "```python\nimport time\n";
        assert_eq!(parse_selenium_script(unterminated, &[]).ok().unwrap().code, "import time");
        assert!(!parse_selenium_script("``````", &[]).is_ok());
    }
}
