//! Typed test-data generation for the fields a test case exercises.
//!
//! Fields come from the request, from the model, or from a keyword scan of the test case.
//! Values are drawn from fixed pools by a [`DataGenerator`]; a seeded generator yields the
//! same dataset for the same fields.

use std::{collections::BTreeMap, str::FromStr};

use chrono::{Duration, Local};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of value a field holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Email,
    Phone,
    Name,
    Username,
    Password,
    Age,
    Date,
    Price,
    DiscountCode,
    Url,
    Address,
    Zipcode,
    CreditCard,
    Number,
    #[serde(other)]
    Text,
}

impl DataType {
    pub const ALL: [DataType; 15] = [
        DataType::Email,
        DataType::Phone,
        DataType::Name,
        DataType::Username,
        DataType::Password,
        DataType::Age,
        DataType::Date,
        DataType::Price,
        DataType::DiscountCode,
        DataType::Url,
        DataType::Address,
        DataType::Zipcode,
        DataType::CreditCard,
        DataType::Text,
        DataType::Number,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Email => "email",
            DataType::Phone => "phone",
            DataType::Name => "name",
            DataType::Username => "username",
            DataType::Password => "password",
            DataType::Age => "age",
            DataType::Date => "date",
            DataType::Price => "price",
            DataType::DiscountCode => "discount_code",
            DataType::Url => "url",
            DataType::Address => "address",
            DataType::Zipcode => "zipcode",
            DataType::CreditCard => "credit_card",
            DataType::Text => "text",
            DataType::Number => "number",
        }
    }

    /// Guesses the type from a field name (`user_email` → email, `qty_count` → number).
    pub fn detect(field_name: &str) -> DataType {
        let f = field_name.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| f.contains(w));

        if has(&["email", "mail"]) {
            DataType::Email
        } else if has(&["phone", "mobile", "tel"]) {
            DataType::Phone
        } else if has(&["user"]) {
            DataType::Username
        } else if has(&["name"]) {
            DataType::Name
        } else if has(&["password", "pwd"]) {
            DataType::Password
        } else if has(&["age"]) {
            DataType::Age
        } else if has(&["date", "dob", "birth"]) {
            DataType::Date
        } else if has(&["price", "cost", "amount"]) {
            DataType::Price
        } else if has(&["zip", "postal"]) {
            DataType::Zipcode
        } else if has(&["discount", "promo", "coupon", "code"]) {
            DataType::DiscountCode
        } else if has(&["url", "website"]) {
            DataType::Url
        } else if has(&["address"]) {
            DataType::Address
        } else if has(&["card", "credit"]) {
            DataType::CreditCard
        } else if has(&["quantity", "count"]) {
            DataType::Number
        } else {
            DataType::Text
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        DataType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown data type '{s}'"))
    }
}

/// Optional bounds for numeric values and text lengths.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// One input a test case needs data for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(alias = "name", alias = "field")]
    pub field_name: String,
    /// Missing types are detected from the field name.
    #[serde(default, alias = "type")]
    pub data_type: Option<DataType>,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub constraints: FieldConstraints,
}

fn default_true() -> bool {
    true
}

impl FieldSpec {
    pub fn new(field_name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            field_name: field_name.into(),
            data_type: Some(data_type),
            required: true,
            constraints: FieldConstraints::default(),
        }
    }

    pub fn resolved_type(&self) -> DataType {
        self.data_type.unwrap_or_else(|| DataType::detect(&self.field_name))
    }
}

/// Where the field list of a dataset came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrigin {
    Request,
    Model,
    KeywordFallback,
}

/// Fields found in a test case.
#[derive(Clone, Debug, Serialize)]
pub struct FieldExtraction {
    pub model: String,
    pub origin: FieldOrigin,
    pub count: usize,
    pub fields: Vec<FieldSpec>,
    /// Why the model's answer was not used, when the keyword scan ran instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// One generated row: a value per field, plus which field was made invalid.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DataRecord {
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
    #[serde(rename = "_invalid_field", skip_serializing_if = "Option::is_none")]
    pub invalid_field: Option<String>,
    #[serde(rename = "_reason", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Edge value for a single field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoundaryValue {
    pub field_name: String,
    pub value: Value,
    pub case: String,
    pub valid: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_valid: usize,
    pub total_invalid: usize,
    pub total_boundary: usize,
    pub total_fields: usize,
    pub test_cases_processed: usize,
}

/// Valid, invalid and boundary rows for a set of fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TestDataset {
    pub fields: Vec<FieldSpec>,
    pub valid_data: Vec<DataRecord>,
    pub invalid_data: Vec<DataRecord>,
    pub boundary_data: Vec<BoundaryValue>,
    pub summary: DatasetSummary,
}

impl TestDataset {
    /// Appends `other`, keeping the first definition of each field name.
    pub fn merge(&mut self, other: TestDataset) {
        for f in other.fields {
            if !self.fields.iter().any(|g| g.field_name == f.field_name) {
                self.fields.push(f);
            }
        }
        self.valid_data.extend(other.valid_data);
        self.invalid_data.extend(other.invalid_data);
        self.boundary_data.extend(other.boundary_data);
        self.summary = DatasetSummary {
            total_valid: self.valid_data.len(),
            total_invalid: self.invalid_data.len(),
            total_boundary: self.boundary_data.len(),
            total_fields: self.fields.len(),
            test_cases_processed: self.summary.test_cases_processed + other.summary.test_cases_processed,
        };
    }
}

/// Input of single-case dataset generation.
#[derive(Clone, Debug, Deserialize)]
pub struct TestDataRequest {
    /// Test case as free text or JSON.
    pub test_case: String,
    #[serde(default = "default_num_valid")]
    pub num_valid: usize,
    #[serde(default = "default_num_invalid")]
    pub num_invalid: usize,
    /// Skips extraction when given.
    #[serde(default)]
    pub fields: Option<Vec<FieldSpec>>,
    /// Reproducible values when set.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_num_valid() -> usize {
    5
}

fn default_num_invalid() -> usize {
    3
}

/// Input of dataset generation over several test cases.
#[derive(Clone, Debug, Deserialize)]
pub struct TestDataFromCasesRequest {
    /// Test case objects; partial records are fine.
    pub test_cases: Vec<Value>,
    #[serde(default = "default_valid_per_case")]
    pub num_valid_per_case: usize,
    #[serde(default = "default_invalid_per_case")]
    pub num_invalid_per_case: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_valid_per_case() -> usize {
    3
}

fn default_invalid_per_case() -> usize {
    2
}

/// Dataset plus the origin of each test case's fields.
#[derive(Clone, Debug, Serialize)]
pub struct TestDataGeneration {
    pub model: String,
    pub field_origins: Vec<FieldOrigin>,
    #[serde(flatten)]
    pub dataset: TestDataset,
}

const FIRST_NAMES: &[&str] = &[
    "John", "Jane", "Michael", "Sarah", "David", "Emily", "Robert", "Lisa", "James", "Mary",
    "William", "Patricia", "Richard", "Jennifer", "Thomas", "Linda", "Daniel", "Elizabeth",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Martinez",
    "Wilson", "Anderson", "Taylor", "Moore", "Jackson", "Martin",
];
const DOMAINS: &[&str] = &["example.com", "test.com", "mail.test", "company.example"];
const STREETS: &[&str] = &["Main St", "Oak Ave", "Maple Dr", "Cedar Ln", "Pine Rd", "Park Ave", "Lake Dr"];
const CITIES: &[&str] = &["New York", "Chicago", "Houston", "Phoenix", "San Diego", "Dallas", "San Jose"];
const STATES: &[&str] = &["NY", "CA", "IL", "TX", "AZ", "PA", "FL", "WA"];
const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "tempor",
];
const CODE_PREFIXES: &[&str] = &["SAVE", "DISCOUNT", "DEAL", "PROMO", "OFFER"];
const CODE_SUFFIXES: &[&str] = &["10", "15", "20", "50"];
const SYMBOLS: &[u8] = b"!@#$%^&*";

const BAD_EMAILS: &[&str] = &["invalid-email", "missing@domain", "@nodomain.com", "double@@domain.com", "spaces in@email.com", ""];
const BAD_PHONES: &[&str] = &["123-456-789", "000-000-0000", "phone-number", "12345", ""];
const BAD_USERNAMES: &[&str] = &["ab", "user name", "user@name", ""];
const BAD_PASSWORDS: &[&str] = &["123", "password", "12345678", "abcdefgh", ""];
const BAD_DATES: &[&str] = &["2024-13-01", "2024-02-30", "99-99-9999", "not-a-date", "2024/02/30", ""];
const BAD_CODES: &[&str] = &["EXPIRED", "INVALID_CODE", "USED_CODE", "CODE WITH SPACES", "123", ""];
const BAD_URLS: &[&str] = &["not-a-url", "ftp://invalid", "http://", "javascript:alert('xss')", ""];
const BAD_ADDRESSES: &[&str] = &["123", "Invalid Address", "!@#$%", ""];
const BAD_ZIPCODES: &[&str] = &["123", "ABCDE", "00000", "999999", ""];
const BAD_CARDS: &[&str] = &["1234-5678-9012-3456", "0000 0000 0000 0000", "1234", "abcd efgh ijkl mnop", ""];
const BAD_TEXTS: &[&str] = &["", "a", "<script>alert('xss')</script>", "Text with\nnewlines\nand\ttabs"];

/// Draws valid and invalid values per [`DataType`].
pub struct DataGenerator<R = StdRng> {
    rng: R,
}

impl DataGenerator<StdRng> {
    /// Seeded when `seed` is given, otherwise from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl<R: Rng> DataGenerator<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }

    fn pick(&mut self, pool: &[&'static str]) -> &'static str {
        pool.choose(&mut self.rng).copied().unwrap_or("")
    }

    fn pick_num(&mut self, pool: &[i64]) -> i64 {
        pool.choose(&mut self.rng).copied().unwrap_or(0)
    }

    /// One value for `field`; `valid == false` yields a value the field should reject.
    pub fn value(&mut self, field: &FieldSpec, valid: bool) -> Value {
        let c = &field.constraints;
        match (field.resolved_type(), valid) {
            (DataType::Email, true) => {
                let first = self.pick(FIRST_NAMES).to_lowercase();
                let last = self.pick(LAST_NAMES).to_lowercase();
                let n = self.rng.gen_range(1..=999);
                let domain = self.pick(DOMAINS);
                Value::from(format!("{first}.{last}{n}@{domain}"))
            }
            (DataType::Email, false) => self.pick(BAD_EMAILS).into(),

            (DataType::Phone, true) => {
                let (a, p, l) = (
                    self.rng.gen_range(200..=999),
                    self.rng.gen_range(200..=999),
                    self.rng.gen_range(1000..=9999),
                );
                let phone = match self.rng.gen_range(0..3) {
                    0 => format!("({a}) {p}-{l}"),
                    1 => format!("{a}-{p}-{l}"),
                    _ => format!("+1{a}{p}{l}"),
                };
                phone.into()
            }
            (DataType::Phone, false) => self.pick(BAD_PHONES).into(),

            (DataType::Name, true) => {
                let name = format!("{} {}", self.pick(FIRST_NAMES), self.pick(LAST_NAMES));
                name.into()
            }
            (DataType::Name, false) => {
                let long = "VeryLongNameThatExceedsReasonableLimits".repeat(3);
                let pool = ["123", "A", "Test User!@#", ""];
                match self.rng.gen_range(0..=pool.len()) {
                    i if i < pool.len() => pool[i].into(),
                    _ => long.into(),
                }
            }

            (DataType::Username, true) => {
                let first = self.pick(FIRST_NAMES).to_lowercase();
                let n = self.rng.gen_range(100..=9999);
                let sep = self.pick(&["", "_", "."]);
                Value::from(format!("{first}{sep}{n}"))
            }
            (DataType::Username, false) => self.pick(BAD_USERNAMES).into(),

            (DataType::Password, true) => self.password().into(),
            (DataType::Password, false) => self.pick(BAD_PASSWORDS).into(),

            (DataType::Age, true) => {
                let (lo, hi) = int_bounds(c, 18, 100);
                self.rng.gen_range(lo..=hi).into()
            }
            (DataType::Age, false) => {
                let (lo, hi) = int_bounds(c, 18, 100);
                self.pick_num(&[-5, 0, lo - 1, hi + 1, 150, 999]).into()
            }

            (DataType::Date, true) => {
                let days = self.rng.gen_range(0..=365);
                let d = Local::now().date_naive() - Duration::days(days);
                d.format("%Y-%m-%d").to_string().into()
            }
            (DataType::Date, false) => self.pick(BAD_DATES).into(),

            (DataType::Price, true) => {
                let lo = c.min.unwrap_or(1.0);
                let hi = c.max.unwrap_or(1000.0).max(lo);
                round2(self.rng.gen_range(lo..=hi)).into()
            }
            (DataType::Price, false) => {
                let pool = [-10.5, 0.0, 0.001, 9_999_999.99];
                pool.choose(&mut self.rng).copied().unwrap_or(-1.0).into()
            }

            (DataType::DiscountCode, true) => {
                let code = format!("{}{}", self.pick(CODE_PREFIXES), self.pick(CODE_SUFFIXES));
                code.into()
            }
            (DataType::DiscountCode, false) => self.pick(BAD_CODES).into(),

            (DataType::Url, true) => {
                let scheme = self.pick(&["https://", "http://"]);
                let host = self.pick(DOMAINS);
                let path = self.pick(&["", "/page", "/products", "/api/v1"]);
                Value::from(format!("{scheme}{host}{path}"))
            }
            (DataType::Url, false) => self.pick(BAD_URLS).into(),

            (DataType::Address, true) => {
                let n = self.rng.gen_range(100..=9999);
                let street = self.pick(STREETS);
                let city = self.pick(CITIES);
                let state = self.pick(STATES);
                let zip = self.rng.gen_range(10000..=99999);
                Value::from(format!("{n} {street}, {city}, {state} {zip}"))
            }
            (DataType::Address, false) => self.pick(BAD_ADDRESSES).into(),

            (DataType::Zipcode, true) => self.rng.gen_range(10000..=99999_u32).to_string().into(),
            (DataType::Zipcode, false) => self.pick(BAD_ZIPCODES).into(),

            (DataType::CreditCard, true) => {
                let card = format!(
                    "{} {} {} {}",
                    self.rng.gen_range(4000..=4999),
                    self.rng.gen_range(1000..=9999),
                    self.rng.gen_range(1000..=9999),
                    self.rng.gen_range(1000..=9999)
                );
                card.into()
            }
            (DataType::CreditCard, false) => self.pick(BAD_CARDS).into(),

            (DataType::Number, true) => {
                let (lo, hi) = int_bounds(c, 1, 100);
                self.rng.gen_range(lo..=hi).into()
            }
            (DataType::Number, false) => {
                let (lo, hi) = int_bounds(c, 1, 100);
                self.pick_num(&[lo - 1, hi + 1, -999]).into()
            }

            (DataType::Text, true) => {
                let (lo, hi) = len_bounds(c, 10, 100);
                let target = self.rng.gen_range(lo..=hi);
                self.text(target).into()
            }
            (DataType::Text, false) => {
                let (_, hi) = len_bounds(c, 10, 100);
                match self.rng.gen_range(0..=BAD_TEXTS.len()) {
                    i if i < BAD_TEXTS.len() => BAD_TEXTS[i].into(),
                    _ => "x".repeat(hi + 1).into(),
                }
            }
        }
    }

    /// 8..=16 chars with at least one upper, lower, digit and symbol.
    fn password(&mut self) -> String {
        let len = self.rng.gen_range(8..=16);
        let mut chars: Vec<char> = vec![
            self.rng.gen_range(b'A'..=b'Z') as char,
            self.rng.gen_range(b'a'..=b'z') as char,
            self.rng.gen_range(b'0'..=b'9') as char,
            SYMBOLS.choose(&mut self.rng).copied().unwrap_or(b'!') as char,
        ];
        while chars.len() < len {
            let c = match self.rng.gen_range(0..4) {
                0 => self.rng.gen_range(b'A'..=b'Z'),
                1 => self.rng.gen_range(b'a'..=b'z'),
                2 => self.rng.gen_range(b'0'..=b'9'),
                _ => SYMBOLS.choose(&mut self.rng).copied().unwrap_or(b'#'),
            };
            chars.push(c as char);
        }
        chars.shuffle(&mut self.rng);
        chars.into_iter().collect()
    }

    /// Words joined by spaces, cut to exactly `target` chars.
    fn text(&mut self, target: usize) -> String {
        let mut out = String::with_capacity(target + 12);
        while out.len() < target {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(self.pick(WORDS));
        }
        out.truncate(target);
        out.trim_end().to_string()
    }

    /// Valid rows, then invalid rows with one field broken per row (rotating), then boundaries.
    pub fn dataset(&mut self, fields: &[FieldSpec], num_valid: usize, num_invalid: usize) -> TestDataset {
        if fields.is_empty() {
            return TestDataset {
                summary: DatasetSummary {
                    test_cases_processed: 1,
                    ..Default::default()
                },
                ..Default::default()
            };
        }

        let valid_data: Vec<DataRecord> = (0..num_valid)
            .map(|_| DataRecord {
                values: fields
                    .iter()
                    .map(|f| (f.field_name.clone(), self.value(f, true)))
                    .collect(),
                ..Default::default()
            })
            .collect();

        let invalid_data: Vec<DataRecord> = (0..num_invalid)
            .map(|i| {
                let broken = i % fields.len();
                let values = fields
                    .iter()
                    .enumerate()
                    .map(|(j, f)| (f.field_name.clone(), self.value(f, j != broken)))
                    .collect();
                let name = fields[broken].field_name.clone();
                DataRecord {
                    values,
                    reason: Some(format!("Invalid {name}")),
                    invalid_field: Some(name),
                }
            })
            .collect();

        let boundary_data = boundary_values(fields);

        TestDataset {
            summary: DatasetSummary {
                total_valid: valid_data.len(),
                total_invalid: invalid_data.len(),
                total_boundary: boundary_data.len(),
                total_fields: fields.len(),
                test_cases_processed: 1,
            },
            fields: fields.to_vec(),
            valid_data,
            invalid_data,
            boundary_data,
        }
    }
}

/// Edge values for numeric and text fields; other types have none.
pub fn boundary_values(fields: &[FieldSpec]) -> Vec<BoundaryValue> {
    let mut out = Vec::new();
    for f in fields {
        let c = &f.constraints;
        let mut push = |value: Value, case: &str, valid: bool| {
            out.push(BoundaryValue {
                field_name: f.field_name.clone(),
                value,
                case: case.to_string(),
                valid,
            })
        };
        match f.resolved_type() {
            DataType::Age => {
                let (lo, hi) = int_bounds(c, 18, 100);
                push(lo.into(), "minimum_age", true);
                push(hi.into(), "maximum_age", true);
                push((lo - 1).into(), "below_minimum", false);
                push((hi + 1).into(), "above_maximum", false);
            }
            DataType::Number => {
                let (lo, hi) = int_bounds(c, 1, 100);
                push(lo.into(), "minimum_value", true);
                push(hi.into(), "maximum_value", true);
                push((lo - 1).into(), "below_minimum", false);
                push((hi + 1).into(), "above_maximum", false);
            }
            DataType::Price => {
                let lo = c.min.unwrap_or(1.0);
                let hi = c.max.unwrap_or(1000.0);
                push(lo.into(), "minimum_price", true);
                push(hi.into(), "maximum_price", true);
                push(0.01_f64.into(), "very_small_price", true);
                push((-1.0_f64).into(), "negative_price", false);
            }
            DataType::Text => {
                let min = c.min_length.unwrap_or(1);
                let max = c.max_length.unwrap_or(100).max(min);
                push("a".repeat(min).into(), "minimum_length", true);
                push("a".repeat(max).into(), "maximum_length", true);
                push("".into(), "empty_string", false);
                push("a".repeat(max + 1).into(), "exceeds_maximum", false);
            }
            _ => {}
        }
    }
    out
}

fn int_bounds(c: &FieldConstraints, lo: i64, hi: i64) -> (i64, i64) {
    let lo = c.min.map(|v| v.round() as i64).unwrap_or(lo);
    let hi = c.max.map(|v| v.round() as i64).unwrap_or(hi).max(lo);
    (lo, hi)
}

fn len_bounds(c: &FieldConstraints, lo: usize, hi: usize) -> (usize, usize) {
    let lo = c.min_length.unwrap_or(lo);
    let hi = c.max_length.unwrap_or(hi).max(lo);
    (lo, hi)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<FieldSpec> {
        let mut age = FieldSpec::new("age", DataType::Age);
        age.constraints.min = Some(21.0);
        age.constraints.max = Some(65.0);
        vec![FieldSpec::new("email", DataType::Email), age, FieldSpec::new("coupon", DataType::DiscountCode)]
    }

    #[test]
    fn field_names_map_to_types() {
        assert_eq!(DataType::detect("user_email"), DataType::Email);
        assert_eq!(DataType::detect("Username"), DataType::Username);
        assert_eq!(DataType::detect("full name"), DataType::Name);
        assert_eq!(DataType::detect("promo"), DataType::DiscountCode);
        assert_eq!(DataType::detect("postal"), DataType::Zipcode);
        assert_eq!(DataType::detect("zipcode"), DataType::Zipcode);
        assert_eq!(DataType::detect("item_count"), DataType::Number);
        assert_eq!(DataType::detect("comment"), DataType::Text);
        assert_eq!("credit_card".parse::<DataType>(), Ok(DataType::CreditCard));
    }

    #[test]
    fn unknown_types_deserialize_as_text() {
        let f: FieldSpec = serde_json::from_value(serde_json::json!({"name": "notes", "type": "blob"})).unwrap();
        assert_eq!(f.data_type, Some(DataType::Text));
        assert!(f.required);
        let g: FieldSpec = serde_json::from_value(serde_json::json!({"field_name": "phone"})).unwrap();
        assert_eq!(g.resolved_type(), DataType::Phone);
    }

    #[test]
    fn valid_values_respect_type_and_constraints() {
        let mut g = DataGenerator::new(Some(7));
        let fs = fields();
        for _ in 0..50 {
            let email = g.value(&fs[0], true);
            assert!(email.as_str().unwrap().contains('@'));
            let age = g.value(&fs[1], true).as_i64().unwrap();
            assert!((21..=65).contains(&age));
            let code = g.value(&fs[2], true);
            assert!(CODE_PREFIXES.iter().any(|p| code.as_str().unwrap().starts_with(p)));
        }
        let pw = g.value(&FieldSpec::new("password", DataType::Password), true);
        let pw = pw.as_str().unwrap();
        assert!(pw.len() >= 8 && pw.chars().any(|c| c.is_ascii_digit()) && pw.chars().any(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn invalid_rows_break_one_field_each() {
        let mut g = DataGenerator::new(Some(1));
        let ds = g.dataset(&fields(), 4, 3);
        assert_eq!(ds.summary.total_valid, 4);
        assert_eq!(ds.summary.total_invalid, 3);
        let broken: Vec<_> = ds.invalid_data.iter().map(|r| r.invalid_field.clone().unwrap()).collect();
        assert_eq!(broken, vec!["email", "age", "coupon"]);
        let age = ds.invalid_data[1].values["age"].as_i64().unwrap();
        assert!(!(21..=65).contains(&age));
        assert!(ds.valid_data.iter().all(|r| r.values.len() == 3 && r.invalid_field.is_none()));
    }

    #[test]
    fn same_seed_same_dataset() {
        let a = DataGenerator::new(Some(42)).dataset(&fields(), 3, 2);
        let b = DataGenerator::new(Some(42)).dataset(&fields(), 3, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn boundaries_use_constraints() {
        let b = boundary_values(&fields());
        let cases: Vec<_> = b.iter().map(|v| (v.case.as_str(), v.value.clone(), v.valid)).collect();
        assert_eq!(
            cases,
            vec![
                ("minimum_age", Value::from(21), true),
                ("maximum_age", Value::from(65), true),
                ("below_minimum", Value::from(20), false),
                ("above_maximum", Value::from(66), false),
            ]
        );
    }

    #[test]
    fn no_fields_no_rows() {
        let ds = DataGenerator::new(Some(3)).dataset(&[], 5, 3);
        assert!(ds.valid_data.is_empty() && ds.invalid_data.is_empty());
        assert_eq!(ds.summary.test_cases_processed, 1);
    }

    #[test]
    fn merge_keeps_first_field_definition() {
        let mut g = DataGenerator::new(Some(9));
        let mut all = g.dataset(&fields(), 1, 1);
        all.merge(g.dataset(&[FieldSpec::new("email", DataType::Text)], 2, 0));
        assert_eq!(all.fields.len(), 3);
        assert_eq!(all.fields[0].data_type, Some(DataType::Email));
        assert_eq!(all.summary.total_valid, 3);
        assert_eq!(all.summary.test_cases_processed, 2);
    }

    #[test]
    fn record_serializes_flat() {
        let mut r = DataRecord::default();
        r.values.insert("email".into(), "a@b.c".into());
        r.invalid_field = Some("email".into());
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["email"], "a@b.c");
        assert_eq!(v["_invalid_field"], "email");
        assert!(v.get("_reason").is_none());
    }
}
