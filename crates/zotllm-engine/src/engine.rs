//! Task engine: the per-task pipelines
//!
//! Every model-backed task has the same shape: resolve the scope, drop what
//! is already done, then assemble, generate and write back one item at a
//! time. A failing item is recorded and the loop moves on.

use crate::assembler::ContentAssembler;
use crate::audit::run_missing_pdf;
use crate::config::EngineConfig;
use crate::error::{EngineError, FailureKind, ItemFailure};
use crate::filter::partition_done;
use crate::notes::{render_note, render_qa_note};
use crate::organizer::{destination_name, QaOrganizer};
use crate::prompt::{check_prompt_size, PromptBuilder};
use crate::report::{ProcessedItem, QaNote, TaskReport};
use crate::resolver::ScopeResolver;
use std::time::Duration;
use tracing::{error, info, warn};
use zotllm_domain::traits::{LibraryClient, LlmProvider};
use zotllm_domain::{
    LibraryItem, NoteTarget, Scope, ScopeRequest, TaskKind, TaskResult, QA_ROOT_COLLECTION,
};
use zotllm_library::LibraryError;
use zotllm_llm::LlmError;

/// Runs tasks against a library and a model backend
///
/// # Examples
///
/// ```
/// use zotllm_domain::{Attachment, LibraryItem, ScopeRequest, TaskKind};
/// use zotllm_engine::{EngineConfig, TaskEngine};
/// use zotllm_library::InMemoryLibrary;
/// use zotllm_llm::MockProvider;
///
/// let library = InMemoryLibrary::new();
/// library.add_item(LibraryItem::new("K1", "Scaling laws"));
/// library.add_attachment("K1", Attachment::pdf("A1"), Some("We find..."));
/// let provider = MockProvider::new("A summary.");
///
/// let mut engine = TaskEngine::new(&library, &provider, EngineConfig::default());
/// let request = ScopeRequest { item_id: Some("K1".into()), ..Default::default() };
/// let report = engine.run_document_task(TaskKind::LlmSummary, &request, false).unwrap();
///
/// assert_eq!(report.processed_count(), 1);
/// assert!(library.item("K1").unwrap().has_tag("llm_summary"));
/// ```
pub struct TaskEngine<'a, L, P> {
    library: &'a L,
    provider: &'a P,
    config: EngineConfig,
    organizer: QaOrganizer<'a, L>,
}

impl<'a, L, P> TaskEngine<'a, L, P>
where
    L: LibraryClient<Error = LibraryError>,
    P: LlmProvider<Error = LlmError>,
{
    /// Create an engine
    pub fn new(library: &'a L, provider: &'a P, config: EngineConfig) -> Self {
        Self {
            library,
            provider,
            config,
            organizer: QaOrganizer::new(library),
        }
    }

    /// The engine's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate a scope request and resolve it
    pub fn resolve(&self, request: &ScopeRequest) -> Result<Scope, EngineError> {
        let selector = request.selector().map_err(EngineError::InvalidScope)?;
        ScopeResolver::new(self.library).resolve(selector)
    }

    /// Run `llm_summary` or `key_references` over a scope
    ///
    /// Items already carrying the task's marker tag are skipped unless
    /// `force` is set. A forced re-run overwrites the item's existing task
    /// note instead of adding a second one.
    ///
    /// # Errors
    ///
    /// Pre-flight errors abort the run. Per-item failures are recorded in
    /// the report, except in a single-item invocation where a failure of
    /// that item is returned as `EngineError::ItemFailed`.
    pub fn run_document_task(
        &mut self,
        kind: TaskKind,
        request: &ScopeRequest,
        force: bool,
    ) -> Result<TaskReport, EngineError> {
        if !kind.is_per_item() {
            return Err(EngineError::Config(format!("{} is not a per-item task", kind)));
        }
        let scope = self.resolve(request)?;
        let single_item = scope.selector().is_single_item();

        let mut report = TaskReport::new(kind, scope.selector().describe());
        report.unresolved_paths = scope.unresolved_paths().to_vec();

        let (todo, done) = partition_done(scope.into_items(), kind.marker_tag(), force);
        for scoped in done {
            info!(item = %scoped.item.key, title = %scoped.item.title, "Already done, skipping");
            report.record_skipped(&scoped.item.key, scoped.item.label());
        }

        let total = todo.len();
        for (index, scoped) in todo.into_iter().enumerate() {
            let item = scoped.item;
            info!(
                item = %item.key,
                title = %item.title,
                progress = %format!("{}/{}", index + 1, total),
                "Processing item"
            );
            match self.process_document(kind, &item) {
                Ok(processed) => {
                    info!(item = %item.key, note = ?processed.note_key, updated = processed.note_updated, "Item done");
                    report.record_processed(processed);
                }
                Err(failure) => {
                    if failure.is_missing_content() {
                        warn!(item = %item.key, title = %item.title, reason = %failure, "Item skipped");
                    } else {
                        error!(item = %item.key, title = %item.title, reason = %failure, "Item failed");
                    }
                    report.record_failure(ItemFailure::new(&item.key, item.label(), failure));
                }
            }
        }

        if single_item {
            if let Some(failure) = report.failures.first() {
                return Err(EngineError::ItemFailed {
                    key: failure.key.clone(),
                    reason: failure.kind.to_string(),
                });
            }
        }

        info!(
            task = %kind,
            processed = report.processed_count(),
            skipped = report.skipped_done_count(),
            missing_content = report.skipped_missing_content_count(),
            failed = report.failed_count(),
            "Task finished"
        );
        Ok(report)
    }

    /// Run the `missing_pdf` audit over the whole library
    pub fn run_missing_pdf(&self) -> Result<TaskReport, EngineError> {
        run_missing_pdf(self.library)
    }

    /// Answer a question from the prior summaries of a collection scope
    ///
    /// The answer is written as a standalone note into
    /// `#LLM QA/<TopLevel>`. `include_references` overrides the configured
    /// `qa_include_references`.
    ///
    /// # Errors
    ///
    /// `InvalidScope` for single-item scopes, `Config` for an empty
    /// question, and the usual scope-resolution errors.
    pub fn run_summary_qa(
        &mut self,
        request: &ScopeRequest,
        question: &str,
        include_references: Option<bool>,
    ) -> Result<TaskReport, EngineError> {
        let kind = TaskKind::SummaryQa;
        let question = question.trim();
        if question.is_empty() {
            return Err(EngineError::Config("summary_qa requires a question".to_string()));
        }
        let selector = request.selector().map_err(EngineError::InvalidScope)?;
        if selector.is_single_item() {
            return Err(EngineError::InvalidScope(format!(
                "summary_qa works on collections, not on {}",
                selector.describe()
            )));
        }
        let scope = ScopeResolver::new(self.library).resolve(selector)?;

        let mut report = TaskReport::new(kind, scope.selector().describe());
        report.unresolved_paths = scope.unresolved_paths().to_vec();

        let include_references =
            include_references.unwrap_or(self.config.tasks.qa_include_references);
        let aggregate = ContentAssembler::new(self.library, self.config.tasks.include_fulltext)
            .qa_aggregate(scope.items(), include_references);
        report.excluded = aggregate.excluded;
        report.failures.extend(aggregate.failures);

        if aggregate.entries.is_empty() {
            warn!(scope = %report.scope, "No prior summaries in scope, nothing to ask");
            return Ok(report);
        }
        info!(
            scope = %report.scope,
            documents = aggregate.entries.len(),
            excluded = report.excluded.len(),
            "Asking question over summaries"
        );

        let template = self.config.prompts.template(kind);
        let prompt = PromptBuilder::new(template.instruction)
            .with_question(question)
            .with_documents(&aggregate.entries)
            .build();
        let scope_label = report.scope.clone();
        if let Err(failure) = check_prompt_size(&prompt, self.config.tasks.max_prompt_chars) {
            error!(scope = %scope_label, reason = %failure, "Question not asked");
            report.record_failure(ItemFailure::new(&scope_label, kind.as_str(), failure));
            return Ok(report);
        }

        let answer = match self.provider.generate(
            &template.system_role,
            &prompt,
            Some(self.qa_timeout()),
        ) {
            Ok(answer) => answer,
            Err(e) => {
                error!(scope = %scope_label, error = %e, "Model call failed");
                report.record_failure(ItemFailure::new(&scope_label, kind.as_str(), FailureKind::Provider(e)));
                return Ok(report);
            }
        };

        let name = destination_name(&scope, &self.config.tasks.qa_fallback_collection);
        let destination = match self.organizer.ensure_destination(&name) {
            Ok(collection) => collection,
            Err(e) => {
                error!(scope = %scope_label, destination = %name, error = %e, "Cannot prepare QA collection");
                warn!(scope = %scope_label, answer = %answer, "Unsaved answer");
                report.record_failure(ItemFailure::new(
                    &scope_label,
                    kind.as_str(),
                    FailureKind::unsaved(e, answer),
                ));
                return Ok(report);
            }
        };

        let labels: Vec<String> = aggregate.entries.iter().map(|e| e.label.clone()).collect();
        let result = TaskResult {
            kind,
            sources: aggregate.entries.iter().map(|e| e.key.clone()).collect(),
            body: render_qa_note(
                kind.note_title().unwrap_or_default(),
                self.provider.model_name(),
                question,
                &labels,
                &answer,
            ),
            tags: vec![kind.marker_tag().to_string()],
            target: NoteTarget::Collection(destination.key.clone()),
        };

        match self.write_back(&result, None) {
            Ok((note_key, _)) => {
                let collection_path = format!("{}/{}", QA_ROOT_COLLECTION, destination.name);
                info!(note = %note_key, destination = %collection_path, "Answer written");
                for entry in aggregate.entries {
                    report.record_processed(ProcessedItem {
                        key: entry.key,
                        label: entry.label,
                        note_key: None,
                        note_updated: false,
                    });
                }
                report.qa_note = Some(QaNote {
                    note_key,
                    collection_key: destination.key,
                    collection_path,
                });
            }
            Err(e) => {
                error!(scope = %scope_label, error = %e, "Failed to write answer");
                warn!(scope = %scope_label, answer = %answer, "Unsaved answer");
                report.record_failure(ItemFailure::new(
                    &scope_label,
                    kind.as_str(),
                    FailureKind::unsaved(e, answer),
                ));
            }
        }
        Ok(report)
    }

    /// Timeout for the question-answering call
    ///
    /// Never shorter than the provider's own timeout.
    fn qa_timeout(&self) -> Duration {
        let qa = self.config.tasks.qa_timeout();
        self.provider
            .default_timeout()
            .map_or(qa, |provider| provider.max(qa))
    }

    /// Assemble, generate and write back one item
    fn process_document(&self, kind: TaskKind, item: &LibraryItem) -> Result<ProcessedItem, FailureKind> {
        let marker = kind.marker_tag();
        let title = kind.note_title().unwrap_or(kind.as_str());

        let children = self
            .library
            .get_children(&item.key)
            .map_err(FailureKind::Library)?;
        let full_text = ContentAssembler::new(self.library, self.config.tasks.include_fulltext)
            .full_text(item, &children)?;

        let template = self.config.prompts.template(kind);
        let prompt = PromptBuilder::new(template.instruction)
            .with_item(item)
            .with_full_text(full_text.as_deref())
            .build();
        check_prompt_size(&prompt, self.config.tasks.max_prompt_chars)?;

        let text = self
            .provider
            .generate(&template.system_role, &prompt, None)
            .map_err(FailureKind::Provider)?;

        let result = TaskResult {
            kind,
            sources: vec![item.key.clone()],
            body: render_note(title, self.provider.model_name(), &text),
            tags: vec![marker.to_string()],
            target: NoteTarget::Item(item.key.clone()),
        };
        let existing = children.find_note(marker, title).map(|n| n.key.as_str());
        let (note_key, note_updated) = match self.write_back(&result, existing) {
            Ok(written) => written,
            Err(e) => {
                warn!(item = %item.key, title = %item.title, text = %text, "Unsaved model output");
                return Err(FailureKind::unsaved(e, text));
            }
        };

        self.library
            .add_tag(&item.key, marker)
            .map_err(FailureKind::write)?;

        Ok(ProcessedItem {
            key: item.key.clone(),
            label: item.label(),
            note_key: Some(note_key),
            note_updated,
        })
    }

    /// Write a result as a new note, or over `existing_note`
    fn write_back(
        &self,
        result: &TaskResult,
        existing_note: Option<&str>,
    ) -> Result<(String, bool), LibraryError> {
        match existing_note {
            Some(key) => {
                self.library.update_note(key, &result.body)?;
                Ok((key.to_string(), true))
            }
            None => {
                let tags: Vec<&str> = result.tags.iter().map(String::as_str).collect();
                let key = self.library.create_note(&result.target, &result.body, &tags)?;
                Ok((key, false))
            }
        }
    }
}
