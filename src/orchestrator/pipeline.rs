//! Pipeline facade.
//!
//! Composes the services and the workflow into the four public operations
//! and normalizes every result into a [`QuizDraft`]. This is the only layer
//! UI code talks to.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::infrastructure::server_api::{content_of, Endpoint, HttpServerApi, ServerApi};
use crate::models::draft::QuizDraft;
use crate::models::question::Question;
use crate::models::settings::{
    GenerationMode, GenerationOptions, ParsingMode, TitleDescription, TitleOptions, UploadedFile,
};
use crate::services::coordinator::{log_partial_result, RequestCoordinator, RequestKey};
use crate::services::{extractor, normalizer, prompts, validator};
use crate::utils::logging;
use crate::workflow::QuestionWorkflow;

/// The quiz generation/extraction pipeline.
pub struct QuizPipeline {
    api: Arc<dyn ServerApi>,
    coordinator: RequestCoordinator,
    config: Config,
}

impl QuizPipeline {
    pub fn new(config: Config) -> Self {
        let api: Arc<dyn ServerApi> = Arc::new(HttpServerApi::new(&config));
        Self::with_api(config, api)
    }

    /// Build the pipeline over a custom transport (tests inject mocks here).
    pub fn with_api(config: Config, api: Arc<dyn ServerApi>) -> Self {
        Self {
            coordinator: RequestCoordinator::new(&config),
            api,
            config,
        }
    }

    // ========== Structural extraction (no AI) ==========

    /// Extract questions already formatted in the text.
    pub fn extract_from_text(&self, content: &str) -> Result<QuizDraft> {
        let questions = extractor::extract_questions(content);
        if questions.is_empty() {
            return Err(AppError::no_questions_found("the provided text"));
        }

        info!("✓ structural extraction found {} questions", questions.len());
        Ok(self.finish_draft(default_title(GenerationMode::Extract, questions.len()), questions))
    }

    /// Extract questions from an already-read document.
    pub fn extract_from_file(&self, file_name: &str, content: &str) -> Result<QuizDraft> {
        let questions = extractor::extract_questions(content);
        if questions.is_empty() {
            return Err(AppError::no_questions_found(file_name.to_string()));
        }

        info!("✓ [{}] structural extraction found {} questions", file_name, questions.len());
        Ok(self.finish_draft(default_title(GenerationMode::Extract, questions.len()), questions))
    }

    // ========== AI generation ==========

    /// Generate (or AI-extract) questions from pasted text.
    ///
    /// `ParsingMode::Thorough` engages the multi-agent workflow; `Fast` and
    /// `Balanced` issue a single-shot prompt. Either way the call goes
    /// through the coordinator for deduplication and retry, and the
    /// response through the validator.
    pub async fn generate_from_text(
        &self,
        content: &str,
        options: &GenerationOptions,
    ) -> Result<QuizDraft> {
        let normalized = normalizer::normalize(content);
        if normalized.is_empty() {
            return Err(AppError::Other("no content provided".to_string()));
        }

        let key = RequestKey::new(
            normalized.clone(),
            self.config.model_name.clone(),
            options.fingerprint(),
        );

        let api = Arc::clone(&self.api);
        let config = self.config.clone();
        let options_owned = options.clone();

        let raw = self
            .coordinator
            .execute(key, move || {
                let api = Arc::clone(&api);
                let config = config.clone();
                let options = options_owned.clone();
                let content = normalized.clone();
                async move {
                    if options.parsing_mode == ParsingMode::Thorough {
                        QuestionWorkflow::new(api, &config).run(&content, &options).await
                    } else {
                        single_shot(api.as_ref(), &config, &content, &options).await
                    }
                }
            })
            .await?;

        self.validate_and_finish(&raw, options)
    }

    /// Generate questions from an uploaded document via the file route.
    pub async fn generate_from_file(
        &self,
        file: &UploadedFile,
        options: &GenerationOptions,
    ) -> Result<QuizDraft> {
        info!("📄 [{}] generating questions from file", file.name);

        let key = RequestKey::new(
            file.data_base64.clone(),
            self.config.model_name.clone(),
            options.fingerprint(),
        );

        let api = Arc::clone(&self.api);
        let model = self.config.model_name.clone();
        let file_owned = file.clone();
        let options_owned = options.clone();

        let raw = self
            .coordinator
            .execute(key, move || {
                let api = Arc::clone(&api);
                let model = model.clone();
                let file = file_owned.clone();
                let options = options_owned.clone();
                async move {
                    let payload = json!({
                        "file": {
                            "name": file.name,
                            "mimeType": file.mime_type,
                            "data": file.data_base64,
                        },
                        "model": model,
                        "mode": options.mode.name(),
                        "settings": {
                            "language": options.language.code(),
                            "parsingMode": options.parsing_mode.name(),
                            "difficulty": options.difficulty.name(),
                            "questionType": options.question_type.name(),
                            "numberOfQuestions": options.number_of_questions,
                        },
                    });
                    let response = api
                        .call(Endpoint::GenerateQuestionsFromFile, payload)
                        .await?;
                    content_of(&response, Endpoint::GenerateQuestionsFromFile)
                }
            })
            .await?;

        self.validate_and_finish(&raw, options)
    }

    /// Process several files concurrently; each file is independent and
    /// completion order is unspecified.
    pub async fn generate_from_files(
        &self,
        files: &[UploadedFile],
        options: &GenerationOptions,
    ) -> Vec<Result<QuizDraft>> {
        info!("processing {} files concurrently", files.len());
        let results = join_all(
            files
                .iter()
                .map(|file| self.generate_from_file(file, options)),
        )
        .await;

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        logging::log_summary(succeeded, results.len() - succeeded);
        results
    }

    // ========== Title/description (best-effort) ==========

    /// Ask the model for a quiz title and description.
    ///
    /// Never fails: any error falls back to a templated title/description.
    pub async fn generate_title_description(
        &self,
        content: &str,
        questions: &[Question],
        is_extract_mode: bool,
        options: &TitleOptions,
    ) -> TitleDescription {
        let (system, user) = prompts::build_title_messages(content, questions, is_extract_mode, options);

        let key = RequestKey::new(
            content.to_string(),
            self.config.model_name.clone(),
            format!("title|{}|{}", options.language.code(), is_extract_mode),
        );

        let api = Arc::clone(&self.api);
        let model = self.config.model_name.clone();

        let result = self
            .coordinator
            .execute(key, move || {
                let api = Arc::clone(&api);
                let model = model.clone();
                let system = system.clone();
                let user = user.clone();
                async move {
                    let payload = json!({
                        "task": "title-description",
                        "system": system,
                        "user": user,
                        "model": model,
                    });
                    let response = api.call(Endpoint::GenerateQuestions, payload).await?;
                    content_of(&response, Endpoint::GenerateQuestions)
                }
            })
            .await;

        match result.ok().and_then(|raw| parse_title_response(&raw)) {
            Some(parsed) => parsed,
            None => {
                warn!("⚠️ title/description call failed, using templated fallback");
                fallback_title_description(questions.len(), is_extract_mode)
            }
        }
    }

    // ========== Shared tail ==========

    fn validate_and_finish(&self, raw: &str, options: &GenerationOptions) -> Result<QuizDraft> {
        let questions = validator::parse_ai_response(raw);
        if questions.is_empty() {
            let context = match options.mode {
                GenerationMode::Generate => "generated",
                GenerationMode::Extract => "extracted",
            };
            return Err(AppError::validation_empty(context));
        }

        log_partial_result(options.number_of_questions, questions.len());
        if self.config.verbose_logging {
            for question in &questions {
                info!(
                    "  · [{}] {}",
                    question.kind.name(),
                    logging::truncate_text(&question.text, 80)
                );
            }
        }

        Ok(self.finish_draft(default_title(options.mode, questions.len()), questions))
    }

    fn finish_draft(&self, (title, description): (String, String), questions: Vec<Question>) -> QuizDraft {
        let mut draft = QuizDraft::new(title, description, questions);
        draft.enrich_metadata(None);
        draft
    }
}

/// Single LLM call for `Fast`/`Balanced` modes.
async fn single_shot(
    api: &dyn ServerApi,
    config: &Config,
    content: &str,
    options: &GenerationOptions,
) -> Result<String> {
    let (system, user) = prompts::build_generation_messages(content, options);
    let endpoint = match options.mode {
        GenerationMode::Generate => Endpoint::GenerateQuestions,
        GenerationMode::Extract => Endpoint::ExtractQuestionsAi,
    };

    let payload = json!({
        "system": system,
        "user": user,
        "model": config.model_name,
        "settings": {
            "language": options.language.code(),
            "parsingMode": options.parsing_mode.name(),
            "difficulty": options.difficulty.name(),
            "questionType": options.question_type.name(),
            "numberOfQuestions": options.number_of_questions,
        },
    });

    let response = api.call(endpoint, payload).await?;
    content_of(&response, endpoint)
}

/// Templated title/description used until (or instead of) the AI one.
fn default_title(mode: GenerationMode, count: usize) -> (String, String) {
    match mode {
        GenerationMode::Generate => (
            "Generated Quiz".to_string(),
            format!("A quiz with {} AI-generated questions.", count),
        ),
        GenerationMode::Extract => (
            "Extracted Quiz".to_string(),
            format!("A quiz with {} questions extracted from the source material.", count),
        ),
    }
}

fn fallback_title_description(count: usize, is_extract_mode: bool) -> TitleDescription {
    let mode = if is_extract_mode {
        GenerationMode::Extract
    } else {
        GenerationMode::Generate
    };
    let (title, description) = default_title(mode, count);
    TitleDescription { title, description }
}

/// Lenient parse of the title/description response.
fn parse_title_response(raw: &str) -> Option<TitleDescription> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let value: serde_json::Value = serde_json::from_str(cleaned.trim()).ok()?;
    let title = value.get("title")?.as_str()?.trim().to_string();
    let description = value
        .get("description")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();
    if title.is_empty() {
        return None;
    }
    Some(TitleDescription { title, description })
}
