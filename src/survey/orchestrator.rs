//! Response orchestrator.
//!
//! `generate` owns the random stream for a whole run: it validates the plan,
//! builds every population, shuffles the combined submission order and then
//! assembles one bundle per persona (identifier, ratings, tools).
//!
//! `submit` writes bundles to a [`RecordSink`], respondent row first so child
//! rows always find their parent. A failed bundle is logged, recorded in the
//! report and skipped; it never affects other bundles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::sink::{RecordSink, Table};

use super::catalog::SurveyCatalog;
use super::population::GenerationPlan;
use super::rng::SurveyRng;
use super::sampler::sample_ratings;
use super::tools::select_tools;
use super::types::{Persona, RespondentRecord, ResponseBundle, StakeholderType};

// ─────────────────────────────────────────────────────────────────
// Generation
// ─────────────────────────────────────────────────────────────────

/// Build every bundle of a run in submission order.
///
/// Fails before the first draw if the plan or catalog is inconsistent.
pub fn generate(
    plan: &GenerationPlan,
    catalog: &SurveyCatalog,
    rng: &mut SurveyRng,
) -> Result<Vec<ResponseBundle>> {
    plan.validate(catalog)?;

    let mut personas = plan.build_all(rng);
    rng.shuffle(&mut personas);

    let bundles: Vec<ResponseBundle> = personas
        .iter()
        .map(|persona| assemble(persona, catalog, rng))
        .collect();

    info!(bundles = bundles.len(), "Generated response bundles");
    Ok(bundles)
}

/// Identifier, then ratings, then tools.
fn assemble(persona: &Persona, catalog: &SurveyCatalog, rng: &mut SurveyRng) -> ResponseBundle {
    let id = rng.uuid();
    let stakeholder = persona.stakeholder();
    let ratings = sample_ratings(persona, catalog, rng);
    let tools = select_tools(persona, catalog, rng);

    ResponseBundle {
        respondent: RespondentRecord {
            id,
            stakeholder_type: stakeholder,
            access_code: stakeholder.access_code().to_string(),
            demographics: persona.demographics.clone(),
        },
        ratings,
        tools,
    }
}

// ─────────────────────────────────────────────────────────────────
// Row Encoding
// ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChildRow<'a, T: Serialize> {
    respondent_id: Uuid,
    #[serde(flatten)]
    row: &'a T,
}

fn child_rows<T: Serialize>(respondent_id: Uuid, rows: &[T]) -> Result<Vec<Value>> {
    rows.iter()
        .map(|row| serde_json::to_value(ChildRow { respondent_id, row }).map_err(Error::from))
        .collect()
}

/// Rows of one bundle per table, in insert order.
pub fn bundle_rows(bundle: &ResponseBundle) -> Result<Vec<(Table, Vec<Value>)>> {
    let id = bundle.respondent_id();
    Ok(vec![
        (Table::Respondents, vec![serde_json::to_value(&bundle.respondent)?]),
        (Table::ToolResponses, child_rows(id, &bundle.tools)?),
        (Table::RatingResponses, child_rows(id, &bundle.ratings)?),
    ])
}

// ─────────────────────────────────────────────────────────────────
// Submission
// ─────────────────────────────────────────────────────────────────

/// Pacing between bundles.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOptions {
    /// Pause after this many bundles; 0 disables pausing.
    pub pause_every: usize,
    pub pause: Duration,
}

impl Default for SubmissionOptions {
    fn default() -> Self {
        Self {
            pause_every: 10,
            pause: Duration::from_millis(500),
        }
    }
}

impl SubmissionOptions {
    /// No pauses at all.
    pub fn unpaced() -> Self {
        Self {
            pause_every: 0,
            pause: Duration::ZERO,
        }
    }
}

/// A bundle the sink did not accept.
#[derive(Debug, Clone)]
pub struct FailedBundle {
    /// Position in submission order
    pub index: usize,
    pub respondent_id: Uuid,
    pub stakeholder: StakeholderType,
    pub error: String,
    /// Retrying the bundle alone is safe and may succeed
    pub retryable: bool,
    /// Some rows of the bundle stayed in the sink
    pub left_partial: bool,
}

/// Outcome of a submission run.
#[derive(Debug, Clone, Default)]
pub struct SubmissionReport {
    pub submitted: usize,
    pub failed: Vec<FailedBundle>,
    /// Bundles never attempted because the run was cancelled
    pub skipped: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl SubmissionReport {
    pub fn attempted(&self) -> usize {
        self.submitted + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failed.is_empty()
    }
}

struct BundleFailure {
    error: Error,
    left_partial: bool,
}

/// Write one bundle completely or not at all.
///
/// When an insert fails, the respondent's rows already written are deleted
/// again, children before the respondent. A timed-out insert may still have
/// landed, so its table is cleaned up as well.
async fn submit_bundle(
    bundle: &ResponseBundle,
    sink: &dyn RecordSink,
) -> std::result::Result<(), BundleFailure> {
    let rows = bundle_rows(bundle).map_err(|error| BundleFailure {
        error,
        left_partial: false,
    })?;
    let respondent_id = bundle.respondent_id().to_string();

    for (position, (table, table_rows)) in rows.iter().enumerate() {
        if let Err(error) = sink.insert(*table, table_rows).await {
            let written = if matches!(error, Error::SinkTimeout { .. }) {
                position + 1
            } else {
                position
            };
            let tables: Vec<Table> = rows[..written].iter().map(|(t, _)| *t).collect();
            let left_partial = !roll_back(sink, &tables, &respondent_id).await;
            return Err(BundleFailure {
                error,
                left_partial,
            });
        }
    }
    Ok(())
}

/// Delete one respondent's rows from `tables`, last written first.
///
/// Returns `false` when a delete failed and rows may remain.
async fn roll_back(sink: &dyn RecordSink, tables: &[Table], respondent_id: &str) -> bool {
    for table in tables.iter().rev() {
        if let Err(e) = sink.delete_for_respondent(*table, respondent_id).await {
            warn!(
                table = %table,
                respondent = respondent_id,
                error = %e.format_for_log(),
                "Rollback failed, bundle left partially written"
            );
            return false;
        }
    }
    if !tables.is_empty() {
        debug!(respondent = respondent_id, tables = tables.len(), "Rolled back bundle");
    }
    true
}

/// Write bundles in order until done or `cancel` is set.
///
/// Each bundle is written whole or rolled back. Already written bundles stay
/// valid when a later one fails or the run is cancelled.
pub async fn submit(
    bundles: &[ResponseBundle],
    sink: &dyn RecordSink,
    options: &SubmissionOptions,
    cancel: &AtomicBool,
) -> SubmissionReport {
    let started = Instant::now();
    let mut report = SubmissionReport::default();

    info!(
        bundles = bundles.len(),
        sink = sink.name(),
        "Submitting responses"
    );

    for (index, bundle) in bundles.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            report.cancelled = true;
            report.skipped = bundles.len() - index;
            warn!(skipped = report.skipped, "Submission cancelled");
            break;
        }

        match submit_bundle(bundle, sink).await {
            Ok(()) => {
                report.submitted += 1;
                info!(
                    index = index + 1,
                    stakeholder = %bundle.stakeholder(),
                    respondent = %bundle.respondent_id(),
                    "{}",
                    bundle.respondent.demographics.summary()
                );
            }
            Err(BundleFailure {
                error,
                left_partial,
            }) => {
                warn!(
                    index = index + 1,
                    respondent = %bundle.respondent_id(),
                    error = %error.format_for_log(),
                    left_partial,
                    "Bundle failed, skipping"
                );
                report.failed.push(FailedBundle {
                    index,
                    respondent_id: bundle.respondent_id(),
                    stakeholder: bundle.stakeholder(),
                    error: error.to_string(),
                    retryable: error.is_retryable() && !left_partial,
                    left_partial,
                });
            }
        }

        let done = index + 1;
        if options.pause_every > 0 && done % options.pause_every == 0 && done < bundles.len() {
            debug!(pause_ms = options.pause.as_millis() as u64, "Pausing");
            tokio::time::sleep(options.pause).await;
        }
    }

    report.elapsed = started.elapsed();
    info!(
        submitted = report.submitted,
        failed = report.failed.len(),
        skipped = report.skipped,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Submission finished"
    );
    report
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
