//! End-to-end split pipeline: digest → prompt → generate → parse → assemble.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use opsplit_gateway::{GenerationBackend, GenerationParams};
use opsplit_kb::KnowledgeBase;
use opsplit_shared::{OperationRecord, Result, SplitRecord};

use crate::{assembler, parser, prompt};

/// Per-call options for a split.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Include the knowledge-base digest in the prompt.
    pub include_context: bool,
    /// Output file name recorded in the result (`.json` enforced).
    pub output_filename: Option<String>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            include_context: true,
            output_filename: None,
        }
    }
}

/// The operation-sequence splitter.
///
/// Holds the loaded knowledge base (immutable for the session) and the
/// configured generation backend. Each split is stateless with respect to
/// the others.
pub struct Splitter {
    kb: KnowledgeBase,
    backend: Box<dyn GenerationBackend>,
    params: GenerationParams,
    context_max_chars: usize,
}

impl Splitter {
    pub fn new(
        kb: KnowledgeBase,
        backend: Box<dyn GenerationBackend>,
        params: GenerationParams,
        context_max_chars: usize,
    ) -> Self {
        Self {
            kb,
            backend,
            params,
            context_max_chars,
        }
    }

    /// Split one operation into a persisted-record value.
    #[instrument(skip_all, fields(backend = self.backend.name()))]
    pub async fn split(&self, operation: &str, opts: &SplitOptions) -> Result<SplitRecord> {
        let digest = opts
            .include_context
            .then(|| self.kb.digest(self.context_max_chars));

        let prompt = prompt::build_prompt(operation, digest.as_deref());
        let response = self.backend.generate(&prompt, &self.params).await?;
        let steps = parser::parse_steps(&response, operation);

        info!(steps = steps.len(), "operation split");

        Ok(assembler::assemble(
            steps,
            operation,
            opts.output_filename.as_deref(),
        ))
    }

    /// Split one operation and write the record to `path`. The record's
    /// filename fields are derived from the path's file name.
    pub async fn split_to_file(
        &self,
        operation: &str,
        path: &Path,
        opts: &SplitOptions,
    ) -> Result<PathBuf> {
        let opts = SplitOptions {
            include_context: opts.include_context,
            output_filename: path.file_name().map(|s| s.to_string_lossy().to_string()),
        };

        let record = self.split(operation, &opts).await?;
        assembler::write_record(&record, path)
    }

    /// Split a batch of operations sequentially, isolating per-item
    /// failures: one failed item never aborts the rest.
    pub async fn split_batch(
        &self,
        operations: &[String],
        opts: &SplitOptions,
    ) -> Vec<(String, Result<SplitRecord>)> {
        let mut results = Vec::with_capacity(operations.len());

        for operation in operations {
            let result = self.split(operation, opts).await;
            if let Err(e) = &result {
                warn!(operation = %operation, error = %e, "split failed");
            }
            results.push((operation.clone(), result));
        }

        results
    }

    /// Knowledge-base lookup pass-through (by name or id).
    pub fn operation_info(&self, name_or_id: &str) -> Option<&OperationRecord> {
        self.kb.get_by_name(name_or_id)
    }

    /// The loaded knowledge base.
    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }
}
