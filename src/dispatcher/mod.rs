//! Feature Dispatcher
//!
//! Routes one feature request for one session to either a deterministic
//! template or a generative handler. Every path ends in display text;
//! upstream and input failures never escape as errors.

pub mod fallback;
pub mod prompts;

use crate::config::InferenceConfig;
use crate::documents::{DocumentExtractor, PlainTextExtractor, Upload};
use crate::features::{Feature, FeatureKind, Handler, InputRequirement, Template};
use crate::history::{ChatLog, ChatRecord};
use crate::inference::{accumulate, CompletionClient, CompletionRequest, StreamEnd};
use crate::models::{Role, Session, UserProfile};
use crate::templates;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const LOGIN_REQUIRED: &str = "Please log in to use this feature.";
pub const DEFAULT_LANGUAGE: &str = "English";

/// One feature invocation as received from a front-end.
#[derive(Debug, Clone)]
pub struct FeatureRequest {
    pub feature: Feature,
    pub text: Option<String>,
    pub balance: Option<String>,
    pub upload: Option<Upload>,
    pub language: String,
}

impl FeatureRequest {
    pub fn new(feature: Feature) -> Self {
        Self {
            feature,
            text: None,
            balance: None,
            upload: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_balance(mut self, balance: impl Into<String>) -> Self {
        self.balance = Some(balance.into());
        self
    }

    pub fn with_upload(mut self, upload: Upload) -> Self {
        self.upload = Some(upload);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        if !language.trim().is_empty() {
            self.language = language.trim().to_string();
        }
        self
    }

    fn typed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// What the chat log stores as the user's side of the exchange.
    fn summary(&self) -> String {
        if let Some(text) = self.typed_text() {
            return text.to_string();
        }
        if let Some(upload) = &self.upload {
            return format!("[file] {}", upload.file_name);
        }
        if let Some(balance) = &self.balance {
            return balance.trim().to_string();
        }
        String::new()
    }
}

/// Result of precondition checks and local work.
enum Prepared {
    /// Final text; no completion call needed.
    Ready(String),
    /// Prompt to send upstream.
    Generate(CompletionRequest),
}

pub struct FeatureDispatcher {
    client: Arc<dyn CompletionClient>,
    extractor: Arc<dyn DocumentExtractor>,
    inference: InferenceConfig,
    chat_log: Arc<ChatLog>,
}

impl FeatureDispatcher {
    pub fn new(client: Arc<dyn CompletionClient>, inference: InferenceConfig) -> Self {
        Self {
            client,
            extractor: Arc::new(PlainTextExtractor),
            inference,
            chat_log: Arc::new(ChatLog::new()),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_chat_log(mut self, chat_log: Arc<ChatLog>) -> Self {
        self.chat_log = chat_log;
        self
    }

    pub fn chat_log(&self) -> &Arc<ChatLog> {
        &self.chat_log
    }

    /// Run one feature and return the text to display.
    pub async fn run_feature(&self, session: &Session, request: FeatureRequest) -> String {
        let feature = request.feature;
        let profile = match self.check_access(session, feature) {
            Ok(profile) => profile,
            Err(message) => return message,
        };

        info!(feature = feature.key(), role = profile.role.as_str(), "Running feature");

        let answer = match self.prepare(profile, &request) {
            Prepared::Ready(text) => text,
            Prepared::Generate(completion) => match self.client.complete(&completion).await {
                Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
                Ok(_) => {
                    warn!(feature = feature.key(), "Completion returned no text");
                    fallback_for(feature, profile.role)
                }
                Err(e) => {
                    warn!(feature = feature.key(), "Completion failed: {}", e);
                    fallback_for(feature, profile.role)
                }
            },
        };

        self.log(profile, &request, &answer).await;
        answer
    }

    /// Streaming variant of `run_feature`. Each chunk reaches `on_chunk` as
    /// it arrives; the returned string is everything that was shown.
    /// Templates and canned text arrive as a single chunk.
    pub async fn stream_feature<F>(
        &self,
        session: &Session,
        request: FeatureRequest,
        cancel: Option<watch::Receiver<bool>>,
        mut on_chunk: F,
    ) -> String
    where
        F: FnMut(&str),
    {
        let feature = request.feature;
        let profile = match self.check_access(session, feature) {
            Ok(profile) => profile,
            Err(message) => {
                on_chunk(&message);
                return message;
            }
        };

        info!(feature = feature.key(), role = profile.role.as_str(), "Streaming feature");

        let answer = match self.prepare(profile, &request) {
            Prepared::Ready(text) => {
                on_chunk(&text);
                text
            }
            Prepared::Generate(completion) => {
                match self.client.complete_stream(&completion).await {
                    Err(e) => {
                        warn!(feature = feature.key(), "Stream could not start: {}", e);
                        let text = fallback_for(feature, profile.role);
                        on_chunk(&text);
                        text
                    }
                    Ok(stream) => {
                        let outcome = accumulate(stream, cancel, &mut on_chunk).await;
                        match outcome.end {
                            StreamEnd::Cancelled => {
                                debug!(feature = feature.key(), "Stream cancelled by caller");
                                outcome.text
                            }
                            _ if !outcome.text.is_empty() => outcome.text,
                            StreamEnd::Failed(e) => {
                                warn!(feature = feature.key(), "Stream failed before any text: {}", e);
                                let text = fallback_for(feature, profile.role);
                                on_chunk(&text);
                                text
                            }
                            StreamEnd::Completed => {
                                warn!(feature = feature.key(), "Stream ended without text");
                                let text = fallback_for(feature, profile.role);
                                on_chunk(&text);
                                text
                            }
                        }
                    }
                }
            }
        };

        self.log(profile, &request, &answer).await;
        answer
    }

    fn check_access<'a>(
        &self,
        session: &'a Session,
        feature: Feature,
    ) -> Result<&'a UserProfile, String> {
        let profile = match session.profile() {
            Some(profile) if session.is_authenticated() => profile,
            _ => return Err(LOGIN_REQUIRED.to_string()),
        };

        if !feature.available_to(profile.role) {
            debug!(feature = feature.key(), role = profile.role.as_str(), "Feature not offered to role");
            return Err(format!(
                "{} is only available for {} accounts.",
                feature.label(),
                other_role(profile.role)
            ));
        }

        Ok(profile)
    }

    fn prepare(&self, profile: &UserProfile, request: &FeatureRequest) -> Prepared {
        let feature = request.feature;

        if let Err(message) = check_input(request) {
            return Prepared::Ready(message);
        }

        match feature.handler() {
            Handler::Template(template) => Prepared::Ready(run_template(template, profile, request)),
            Handler::ExtractText => Prepared::Ready(self.extract_text(request)),
            Handler::Advice => {
                let document = match request.upload.as_ref().map(|u| self.extractor.extract(u)) {
                    Some(Ok(text)) => Some(text),
                    Some(Err(e)) => return Prepared::Ready(e.display()),
                    None => None,
                };
                let user_text = request.typed_text().unwrap_or("Review the attached document.");
                let prompt = prompts::advice_prompt(
                    feature,
                    profile,
                    &request.language,
                    user_text,
                    document.as_deref(),
                );
                Prepared::Generate(self.completion(feature, prompt))
            }
            Handler::DocumentAnalysis => {
                let content = match request.upload.as_ref().map(|u| self.extractor.extract(u)) {
                    Some(Ok(text)) => text,
                    Some(Err(e)) => return Prepared::Ready(e.display()),
                    None => request.typed_text().unwrap_or_default().to_string(),
                };
                let prompt = prompts::document_prompt(feature, profile, &request.language, &content);
                Prepared::Generate(self.completion(feature, prompt))
            }
        }
    }

    fn completion(&self, feature: Feature, prompt: String) -> CompletionRequest {
        let budget = self
            .inference
            .max_new_tokens
            .unwrap_or_else(|| feature.max_new_tokens());
        CompletionRequest::new(prompt, &self.inference).with_max_new_tokens(budget)
    }

    fn extract_text(&self, request: &FeatureRequest) -> String {
        match &request.upload {
            Some(upload) => match self.extractor.extract(upload) {
                Ok(text) => text,
                Err(e) => {
                    debug!(file = %upload.file_name, "Extraction failed: {}", e.display());
                    e.display()
                }
            },
            None => missing_input_message(InputRequirement::File),
        }
    }

    async fn log(&self, profile: &UserProfile, request: &FeatureRequest, answer: &str) {
        let record = ChatRecord::new(
            &profile.account_id,
            profile.role,
            request.feature,
            &request.summary(),
            answer,
        );
        self.chat_log.record(record).await;
    }
}

fn run_template(template: Template, profile: &UserProfile, request: &FeatureRequest) -> String {
    match template {
        Template::BudgetSummary => templates::budget_summary(profile),
        Template::ExpenseBreakdown => templates::expense_breakdown(profile),
        Template::NetWorth => templates::net_worth(profile),
        Template::BillReminders => templates::bill_reminders(profile),
        Template::SubscriptionAudit => templates::subscription_audit(profile),
        Template::CashFlowProjection => templates::cash_flow_projection(profile),
        Template::BudgetSplit => {
            templates::budget_split_text(request.balance.as_deref().unwrap_or_default())
        }
    }
}

fn check_input(request: &FeatureRequest) -> Result<(), String> {
    let has_text = request.typed_text().is_some();
    let has_file = request.upload.is_some();
    let has_balance = request
        .balance
        .as_deref()
        .map_or(false, |b| !b.trim().is_empty());

    let requirement = request.feature.input();
    let satisfied = match requirement {
        InputRequirement::None => true,
        InputRequirement::Balance => has_balance,
        InputRequirement::Text => has_text,
        InputRequirement::TextOrFile => has_text || has_file,
        InputRequirement::File => has_file,
    };

    if satisfied {
        Ok(())
    } else {
        Err(missing_input_message(requirement))
    }
}

fn missing_input_message(requirement: InputRequirement) -> String {
    match requirement {
        InputRequirement::Balance => "Enter your bank balance to calculate a split.",
        InputRequirement::Text => "Please enter your question or details first.",
        InputRequirement::TextOrFile => "Please enter some text or upload a file (PDF/DOCX/TXT).",
        InputRequirement::File => "Please upload a file (PDF/DOCX/TXT).",
        InputRequirement::None => "",
    }
    .to_string()
}

fn other_role(role: Role) -> Role {
    match role {
        Role::Student => Role::Professional,
        Role::Professional => Role::Student,
    }
}

fn fallback_for(feature: Feature, role: Role) -> String {
    match feature.kind() {
        FeatureKind::DocumentAnalysis => fallback::APOLOGY.to_string(),
        _ => fallback::random_tip(role).to_string(),
    }
}
