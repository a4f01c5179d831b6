//! Task dispatch.

use crate::cli::Command;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use tracing::info;
use zotllm_domain::traits::{LibraryClient, LlmProvider};
use zotllm_domain::TaskKind;
use zotllm_engine::{run_missing_pdf, EngineConfig, TaskEngine, TaskReport};
use zotllm_library::{LibraryError, ZoteroClient};
use zotllm_llm::{LlmError, Provider};

/// Validate the configuration, connect, and run the command.
pub fn execute(command: &Command, config: &AppConfig) -> Result<TaskReport> {
    let task = command.task();
    config.validate_for(task)?;

    let library = ZoteroClient::new(&config.zotero)?;
    info!(library = %library.library_url(), task = %task, "Starting task");

    if task == TaskKind::MissingPdf {
        return Ok(run_missing_pdf(&library)?);
    }

    let provider = Provider::from_config(&config.llm)?;
    info!(provider = %config.llm.provider, model = %provider.model_name(), "Model backend ready");
    run_command(command, &library, &provider, config.engine_config())
}

/// Run a command against any library and model backend.
pub fn run_command<L, P>(
    command: &Command,
    library: &L,
    provider: &P,
    config: EngineConfig,
) -> Result<TaskReport>
where
    L: LibraryClient<Error = LibraryError>,
    P: LlmProvider<Error = LlmError>,
{
    let mut engine = TaskEngine::new(library, provider, config);
    let report = match command {
        Command::LlmSummary(args) => engine.run_document_task(
            TaskKind::LlmSummary,
            &args.target.scope_request(),
            args.force(),
        ),
        Command::KeyReferences(args) => engine.run_document_task(
            TaskKind::KeyReferences,
            &args.target.scope_request(),
            args.force(),
        ),
        Command::MissingPdf => engine.run_missing_pdf(),
        Command::SummaryQa(args) => {
            let question = args
                .question
                .as_deref()
                .ok_or_else(|| CliError::Config("summary_qa requires --question".to_string()))?;
            engine.run_summary_qa(
                &args.target.scope_request(),
                question,
                args.include_references(),
            )
        }
    }?;
    Ok(report)
}
