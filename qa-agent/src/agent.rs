//! `QaAgent`: retrieval + prompt + LLM + tolerant parsing.

use std::{
    path::PathBuf,
    sync::Arc,
    time::Instant,
};

use ai_llm_service::{GenerationParams, TextGenerator};
use doc_store::{DocStore, RetrievedChunk};
use tracing::{debug, info, instrument, warn};

use crate::{
    cfg::AgentConfig,
    error::{AgentError, Result},
    html::HtmlAnalyzer,
    parser, prompt,
    test_data::{
        DataGenerator, FieldExtraction, FieldOrigin, FieldSpec, TestDataFromCasesRequest,
        TestDataGeneration, TestDataRequest, TestDataset,
    },
    types::{
        Explanation, Parsed, SeleniumGeneration, SeleniumRequest, SourceRef, TestCaseGeneration,
        TestCaseRequest,
    },
};

/// Minimum length of a feature description.
pub const MIN_FEATURE_CHARS: usize = 10;
/// Minimum length of a feature name for "all test cases" generation.
pub const MIN_FEATURE_NAME_CHARS: usize = 3;
/// Minimum length of a test case passed for explanation.
pub const MIN_EXPLAIN_CHARS: usize = 20;
/// Minimum length of a test case passed for field extraction or data generation.
pub const MIN_TEST_DATA_CHARS: usize = 10;
/// Upper bound of valid (and of invalid) rows for a single test case.
pub const MAX_RECORDS: usize = 50;
/// Upper bound of valid (and of invalid) rows per case when several cases are sent.
pub const MAX_RECORDS_PER_CASE: usize = 20;

/// Orchestrates generation over a shared store and text generator.
pub struct QaAgent {
    cfg: AgentConfig,
    store: Arc<DocStore>,
    llm: Arc<dyn TextGenerator>,
}

impl QaAgent {
    pub fn new(cfg: AgentConfig, store: Arc<DocStore>, llm: Arc<dyn TextGenerator>) -> Self {
        Self { cfg, store, llm }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.cfg
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Generates test cases for a feature description.
    ///
    /// An empty index is not an error: the prompt says no context is available and
    /// `context_available` is `false`. Malformed model output is returned as
    /// [`Parsed::Failed`] with the raw text.
    ///
    /// # Errors
    /// `Validation` (no LLM call is made), store errors from retrieval, LLM errors.
    #[instrument(skip_all, fields(top_k = ?req.top_k, scoped = req.document_ids.is_some()))]
    pub async fn generate_test_cases(&self, req: &TestCaseRequest) -> Result<TestCaseGeneration> {
        let feature = req.feature_description.trim();
        if feature.chars().count() < MIN_FEATURE_CHARS {
            return Err(AgentError::Validation(format!(
                "feature_description must be at least {MIN_FEATURE_CHARS} characters"
            )));
        }
        let k = self.resolve_k(req.top_k, self.cfg.top_k)?;
        self.run_test_cases(feature, feature, k, req.document_ids.as_deref()).await
    }

    /// Positive and negative test cases for a named feature, over all documents.
    ///
    /// # Errors
    /// Same as [`QaAgent::generate_test_cases`].
    #[instrument(skip_all)]
    pub async fn generate_all_test_cases_for_feature(&self, feature_name: &str) -> Result<TestCaseGeneration> {
        let name = feature_name.trim();
        if name.chars().count() < MIN_FEATURE_NAME_CHARS {
            return Err(AgentError::Validation(format!(
                "feature_name must be at least {MIN_FEATURE_NAME_CHARS} characters"
            )));
        }
        let query = format!("Generate all positive and negative test cases for {name}");
        self.run_test_cases(&query, name, self.cfg.top_k, None).await
    }

    /// Generates one Selenium (Python) script covering `req.test_cases`.
    ///
    /// The page named by `html_file_path` (or `TARGET_HTML_PATH` when allowed) is summarized
    /// into selector hints.
    ///
    /// # Errors
    /// `Validation` for an empty case list or an incomplete case, `NotFound` for a missing explicit HTML path,
    /// store and LLM errors.
    #[instrument(skip_all, fields(cases = req.test_cases.len()))]
    pub async fn generate_selenium_script(&self, req: &SeleniumRequest) -> Result<SeleniumGeneration> {
        if req.test_cases.is_empty() {
            return Err(AgentError::Validation("test_cases must not be empty".into()));
        }
        if let Some((i, tc)) = req.test_cases.iter().enumerate().find(|(_, tc)| !tc.is_complete()) {
            let label = if tc.test_id.trim().is_empty() {
                format!("test_cases[{i}]")
            } else {
                format!("test_cases[{i}] ({})", tc.test_id.trim())
            };
            return Err(AgentError::Validation(format!(
                "{label} needs a title, at least one step and an expected result"
            )));
        }
        let k = self.resolve_k(req.top_k, self.cfg.selenium_top_k)?;

        let html_context = match self.html_source(req) {
            Some(path) => {
                let analyzer = HtmlAnalyzer::load(&path).await?;
                Some(analyzer.selenium_context())
            }
            None => None,
        };

        let query = req
            .test_cases
            .iter()
            .map(|tc| tc.title.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let hits = if query.is_empty() {
            Vec::new()
        } else {
            self.store.retrieve(&query, Some(k), None).await?
        };

        let user = prompt::selenium_prompt(&req.test_cases, html_context.as_deref(), &hits, self.cfg.max_ctx_chars);
        let raw = self.call(prompt::SELENIUM_SYSTEM, &user, self.cfg.selenium_params, "selenium").await?;

        let ids: Vec<String> = req.test_cases.iter().map(|tc| tc.test_id.clone()).collect();
        let result = parser::parse_selenium_script(&raw, &ids);
        log_outcome(&result, "selenium script");

        Ok(SeleniumGeneration {
            model: self.llm.model_name().to_string(),
            sources: sources(&hits),
            html_analyzed: html_context.is_some(),
            result,
        })
    }

    /// Plain-English explanation of a test case (free text in, free text out).
    ///
    /// # Errors
    /// `Validation` for text shorter than 20 characters, LLM errors.
    #[instrument(skip_all)]
    pub async fn explain_test_case(&self, test_case: &str) -> Result<Explanation> {
        if test_case.trim().chars().count() < MIN_EXPLAIN_CHARS {
            return Err(AgentError::Validation(format!(
                "test_case must be at least {MIN_EXPLAIN_CHARS} characters"
            )));
        }
        let user = prompt::explain_prompt(test_case);
        let raw = self.call(prompt::EXPLAIN_SYSTEM, &user, self.cfg.explain_params, "explain").await?;
        Ok(Explanation {
            model: self.llm.model_name().to_string(),
            explanation: raw.trim().to_string(),
        })
    }

    /// Data fields a test case needs, with their types.
    ///
    /// Unparseable model output or an unreachable model falls back to a keyword scan
    /// of the test case; the response says which source was used.
    ///
    /// # Errors
    /// `Validation` for text shorter than 10 characters, non-transient LLM errors.
    #[instrument(skip_all)]
    pub async fn extract_fields(&self, test_case: &str) -> Result<FieldExtraction> {
        let text = test_case.trim();
        check_test_case_text(text, "test_case")?;
        self.find_fields(text).await
    }

    /// Valid, invalid and boundary rows for one test case.
    ///
    /// Explicit `fields` skip the model entirely.
    ///
    /// # Errors
    /// `Validation` (no LLM call is made), non-transient LLM errors.
    #[instrument(skip_all, fields(num_valid = req.num_valid, num_invalid = req.num_invalid, explicit = req.fields.is_some()))]
    pub async fn generate_test_data(&self, req: &TestDataRequest) -> Result<TestDataGeneration> {
        let text = req.test_case.trim();
        check_test_case_text(text, "test_case")?;
        check_counts(req.num_valid, req.num_invalid, MAX_RECORDS)?;

        let (fields, origin) = match &req.fields {
            Some(fields) => (check_fields(fields)?, FieldOrigin::Request),
            None => {
                let found = self.find_fields(text).await?;
                (found.fields, found.origin)
            }
        };

        let dataset = DataGenerator::new(req.seed).dataset(&fields, req.num_valid, req.num_invalid);
        log_dataset(&dataset);
        Ok(TestDataGeneration {
            model: self.llm.model_name().to_string(),
            field_origins: vec![origin],
            dataset,
        })
    }

    /// One merged dataset over several (possibly partial) test case objects.
    ///
    /// # Errors
    /// `Validation` (no LLM call is made), non-transient LLM errors.
    #[instrument(skip_all, fields(cases = req.test_cases.len()))]
    pub async fn generate_test_data_from_cases(&self, req: &TestDataFromCasesRequest) -> Result<TestDataGeneration> {
        if req.test_cases.is_empty() {
            return Err(AgentError::Validation("test_cases must not be empty".into()));
        }
        check_counts(req.num_valid_per_case, req.num_invalid_per_case, MAX_RECORDS_PER_CASE)?;
        let texts = req
            .test_cases
            .iter()
            .enumerate()
            .map(|(i, tc)| {
                if !tc.is_object() {
                    return Err(AgentError::Validation(format!("test_cases[{i}] must be a JSON object")));
                }
                Ok(serde_json::to_string_pretty(tc)?)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut found = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            debug!(case = i + 1, total = texts.len(), "extracting fields");
            found.push(self.find_fields(text).await?);
        }

        let mut generator = DataGenerator::new(req.seed);
        let mut dataset = TestDataset::default();
        let mut field_origins = Vec::with_capacity(found.len());
        for f in found {
            dataset.merge(generator.dataset(&f.fields, req.num_valid_per_case, req.num_invalid_per_case));
            field_origins.push(f.origin);
        }
        log_dataset(&dataset);
        Ok(TestDataGeneration {
            model: self.llm.model_name().to_string(),
            field_origins,
            dataset,
        })
    }

    async fn find_fields(&self, text: &str) -> Result<FieldExtraction> {
        let user = prompt::fields_prompt(text);
        let answer = self
            .call(prompt::FIELD_EXTRACTION_SYSTEM, &user, self.cfg.test_data_params, "extract_fields")
            .await;

        let (origin, fields, fallback_reason, raw) = match answer {
            Ok(answer) => match parser::parse_fields(&answer) {
                Parsed::Ok { value } => (FieldOrigin::Model, value, None, None),
                Parsed::Failed { reason, raw } => {
                    warn!(reason = %reason, "field list could not be parsed; scanning keywords");
                    (FieldOrigin::KeywordFallback, parser::keyword_fields(text), Some(reason), Some(raw))
                }
            },
            Err(AgentError::Llm(e)) if e.is_unavailable() => {
                warn!(error = %e, "model unavailable; scanning keywords for fields");
                (FieldOrigin::KeywordFallback, parser::keyword_fields(text), Some(e.to_string()), None)
            }
            Err(e) => return Err(e),
        };
        info!(origin = ?origin, fields = fields.len(), "fields extracted");

        Ok(FieldExtraction {
            model: self.llm.model_name().to_string(),
            origin,
            count: fields.len(),
            fields,
            fallback_reason,
            raw,
        })
    }

    async fn run_test_cases(
        &self,
        query: &str,
        feature: &str,
        k: usize,
        scope: Option<&[String]>,
    ) -> Result<TestCaseGeneration> {
        let hits = self.store.retrieve(query, Some(k), scope).await?;
        if hits.is_empty() {
            warn!("no documentation context; generating from the feature alone");
        } else {
            debug!(hits = hits.len(), "context retrieved");
        }

        let user = prompt::test_case_prompt(query, &hits, self.cfg.max_ctx_chars);
        let raw = self.call(prompt::TEST_CASE_SYSTEM, &user, self.cfg.test_case_params, "test_cases").await?;

        let result = parser::parse_test_cases(&raw, feature);
        log_outcome(&result, "test cases");

        Ok(TestCaseGeneration {
            query: query.to_string(),
            model: self.llm.model_name().to_string(),
            sources: sources(&hits),
            context_available: !hits.is_empty(),
            result,
        })
    }

    async fn call(&self, system: &str, user: &str, params: GenerationParams, op: &'static str) -> Result<String> {
        let t0 = Instant::now();
        let raw = self.llm.generate(Some(system), user, params).await?;
        info!(
            op,
            model = %self.llm.model_name(),
            prompt_chars = user.chars().count(),
            response_chars = raw.chars().count(),
            latency_ms = t0.elapsed().as_millis() as u64,
            "generation finished"
        );
        Ok(raw)
    }

    fn resolve_k(&self, requested: Option<usize>, default: usize) -> Result<usize> {
        let k = requested.unwrap_or(default);
        if !(1..=20).contains(&k) {
            return Err(AgentError::Validation("top_k must be in 1..=20".into()));
        }
        Ok(k)
    }

    /// An explicit path always wins; the configured page is used only when allowed and present.
    fn html_source(&self, req: &SeleniumRequest) -> Option<PathBuf> {
        if let Some(p) = req.html_file_path.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(p));
        }
        if !req.use_target_html {
            return None;
        }
        match self.cfg.target_html_path.as_deref() {
            Some(p) if p.is_file() => Some(p.to_path_buf()),
            Some(p) => {
                warn!(path = %p.display(), "TARGET_HTML_PATH does not exist; skipping HTML analysis");
                None
            }
            None => None,
        }
    }
}

fn sources(hits: &[RetrievedChunk]) -> Vec<SourceRef> {
    hits.iter()
        .map(|h| SourceRef {
            document_id: h.chunk.document_id.clone(),
            filename: h.source.clone(),
            chunk_index: h.chunk.index,
            score: h.score,
        })
        .collect()
}

fn check_test_case_text(text: &str, field: &str) -> Result<()> {
    if text.chars().count() < MIN_TEST_DATA_CHARS {
        return Err(AgentError::Validation(format!(
            "{field} must be at least {MIN_TEST_DATA_CHARS} characters"
        )));
    }
    Ok(())
}

fn check_counts(num_valid: usize, num_invalid: usize, max: usize) -> Result<()> {
    if !(1..=max).contains(&num_valid) {
        return Err(AgentError::Validation(format!("valid record count must be in 1..={max}")));
    }
    if num_invalid > max {
        return Err(AgentError::Validation(format!("invalid record count must be in 0..={max}")));
    }
    Ok(())
}

fn check_fields(fields: &[FieldSpec]) -> Result<Vec<FieldSpec>> {
    if fields.is_empty() {
        return Err(AgentError::Validation("fields must not be empty when given".into()));
    }
    let mut out: Vec<FieldSpec> = Vec::with_capacity(fields.len());
    for (i, f) in fields.iter().enumerate() {
        let name = f.field_name.trim();
        if name.is_empty() {
            return Err(AgentError::Validation(format!("fields[{i}].field_name must not be empty")));
        }
        if out.iter().any(|g| g.field_name == name) {
            return Err(AgentError::Validation(format!("fields[{i}]: duplicate field '{name}'")));
        }
        out.push(FieldSpec {
            field_name: name.to_string(),
            ..f.clone()
        });
    }
    Ok(out)
}

fn log_dataset(dataset: &TestDataset) {
    let s = &dataset.summary;
    info!(
        fields = s.total_fields,
        valid = s.total_valid,
        invalid = s.total_invalid,
        boundary = s.total_boundary,
        cases = s.test_cases_processed,
        "test data generated"
    );
}

fn log_outcome<T>(result: &Parsed<T>, what: &str) {
    match result {
        Parsed::Ok { .. } => info!(what, "model output parsed"),
        Parsed::Failed { reason, raw } => {
            warn!(what, reason = %reason, raw_chars = raw.chars().count(), "model output could not be parsed")
        }
    }
}
