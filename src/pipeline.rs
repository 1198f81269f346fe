//! Scripted request pipeline that drives a tracker through a full request.
//!
//! The pipeline runs as a tokio task and only sends [`PipelineEvent`]s; the
//! owner of the tracker applies them on its own thread, so the tracker itself
//! is never shared.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

use crate::core::{DebugLogEntry, RequestStatusTracker};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read pipeline plan {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse pipeline plan {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid pipeline plan: {0}")]
    Invalid(String),
}

/// Phase durations and payloads for one simulated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelinePlan {
    pub thinking_ms: u64,
    pub fetch_ms: u64,
    pub sources: Vec<String>,
    pub total_tokens: u32,
    pub token_steps: u32,
    pub token_step_ms: u64,
    pub finish_ms: u64,
    /// Fixed response; a canned reply based on the message when unset.
    pub response: Option<String>,
    pub reset_after_ms: u64,
}

impl Default for PipelinePlan {
    fn default() -> Self {
        Self {
            thinking_ms: 1500,
            fetch_ms: 1200,
            sources: vec!["general_knowledge".to_string()],
            total_tokens: 350,
            token_steps: 10,
            token_step_ms: 150,
            finish_ms: 300,
            response: None,
            reset_after_ms: 500,
        }
    }
}

impl PipelinePlan {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let plan: PipelinePlan = toml::from_str(&content).map_err(|source| PlanError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.sources.is_empty() {
            return Err(PlanError::Invalid(
                "sources must name at least one context source".to_string(),
            ));
        }
        if self.token_steps == 0 {
            return Err(PlanError::Invalid("token_steps must be at least 1".to_string()));
        }
        if self.total_tokens < self.token_steps {
            return Err(PlanError::Invalid(format!(
                "total_tokens ({}) must be at least token_steps ({})",
                self.total_tokens, self.token_steps
            )));
        }
        Ok(())
    }

    /// Token count reported after `step` (1-based); the last step reports the total.
    fn tokens_after(&self, step: u32) -> u32 {
        let total = u64::from(self.total_tokens);
        let scaled = total * u64::from(step) / u64::from(self.token_steps);
        u32::try_from(scaled).unwrap_or(self.total_tokens)
    }
}

/// One step of pipeline progress, to be applied to the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    FetchingContext(Vec<String>),
    Generating { total_tokens: u32 },
    Tokens(u32),
    Completed(String),
    ResetRequested,
}

impl PipelineEvent {
    pub fn apply(self, tracker: &mut RequestStatusTracker) {
        match self {
            PipelineEvent::FetchingContext(sources) => tracker.set_fetching_context(sources),
            PipelineEvent::Generating { total_tokens } => tracker.set_generating(total_tokens),
            PipelineEvent::Tokens(generated) => tracker.update_tokens(generated),
            PipelineEvent::Completed(response) => tracker.complete(response),
            PipelineEvent::ResetRequested => tracker.reset(),
        }
    }
}

/// Run `plan` for `message` in the background.
///
/// The caller has already called `start_request`. The task stops early once
/// the receiving side is dropped.
pub fn spawn_pipeline(
    plan: PipelinePlan,
    message: String,
    tx: UnboundedSender<PipelineEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if run_pipeline(&plan, &message, &tx).await.is_none() {
            tracing::debug!("pipeline receiver dropped; stopping");
        }
    })
}

async fn run_pipeline(
    plan: &PipelinePlan,
    message: &str,
    tx: &UnboundedSender<PipelineEvent>,
) -> Option<()> {
    sleep_ms(plan.thinking_ms).await;
    tx.send(PipelineEvent::FetchingContext(plan.sources.clone()))
        .ok()?;

    sleep_ms(plan.fetch_ms).await;
    tx.send(PipelineEvent::Generating {
        total_tokens: plan.total_tokens,
    })
    .ok()?;

    for step in 1..=plan.token_steps {
        sleep_ms(plan.token_step_ms).await;
        tx.send(PipelineEvent::Tokens(plan.tokens_after(step))).ok()?;
    }

    sleep_ms(plan.finish_ms).await;
    let response = plan
        .response
        .clone()
        .unwrap_or_else(|| simulated_response(message));
    tx.send(PipelineEvent::Completed(response)).ok()?;

    sleep_ms(plan.reset_after_ms).await;
    tx.send(PipelineEvent::ResetRequested).ok()
}

/// Run a whole request against `tracker` on the current task.
///
/// `on_entry` sees every debug-log entry as it is appended. Returns the
/// response once the pipeline has finished and the tracker is idle again.
pub async fn drive(
    tracker: &mut RequestStatusTracker,
    npc_name: &str,
    message: &str,
    plan: PipelinePlan,
    mut on_entry: impl FnMut(&DebugLogEntry),
) -> Option<String> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tracker.start_request(npc_name, message);
    let mut reported = report_new_entries(tracker, 0, &mut on_entry);

    let handle = spawn_pipeline(plan, message.to_string(), tx);
    let mut response = None;
    while let Some(event) = rx.recv().await {
        if let PipelineEvent::Completed(text) = &event {
            response = Some(text.clone());
        }
        event.apply(tracker);
        reported = report_new_entries(tracker, reported, &mut on_entry);
    }
    if let Err(err) = handle.await {
        tracing::warn!(error = %err, "pipeline task failed");
    }
    response
}

fn report_new_entries(
    tracker: &RequestStatusTracker,
    reported: usize,
    on_entry: &mut impl FnMut(&DebugLogEntry),
) -> usize {
    let entries = tracker.status().debug_log().entries();
    // A reset empties the log.
    let start = if reported > entries.len() { 0 } else { reported };
    for entry in &entries[start..] {
        on_entry(entry);
    }
    entries.len()
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// === Canned replies ===

struct CannedReply {
    stems: &'static [&'static str],
    english: &'static str,
    russian: &'static str,
}

const CANNED_REPLIES: &[CannedReply] = &[
    CannedReply {
        stems: &["hello", "greet", "привет", "здравствуй"],
        english: "Greetings, traveler! How can I help you?",
        russian: "Приветствую тебя, путник! Чем могу помочь?",
    },
    CannedReply {
        stems: &["trade", "trading", "goods", "торговл", "товар"],
        english: "Trade is my calling! I have fine goods from distant lands. \
                  Ask me about the price of grain, iron or silk.",
        russian: "Торговля - моё призвание! У меня есть отличные товары из далёких земель. \
                  Могу рассказать о ценах на зерно, железо или шёлк.",
    },
    CannedReply {
        stems: &["war", "battle", "army", "armies", "война", "бой", "армия"],
        english: "War... Hard times have come. I hear Vlandia is preparing a march \
                  north. Best keep away from the borders.",
        russian: "Война... Тяжёлые времена настали. Слышал, что Вландия готовит поход на север. \
                  Лучше держаться подальше от границ.",
    },
    CannedReply {
        stems: &["king", "queen", "realm", "корол"],
        english: "I know a fair bit about the kingdoms! The Empire is split in three, \
                  Vlandia grows strong in the west and Sturgia suffers raids from the south.",
        russian: "О королевствах я знаю немало! Империя раздроблена на три части, \
                  Вландия крепнет на западе, а Стургия терпит набеги с юга.",
    },
];

const FALLBACK_ENGLISH: &str = "An interesting question! Let me think... In all my years on the \
                                road I have seen a great deal. Tell me more about what you want to know.";
const FALLBACK_RUSSIAN: &str = "Интересный вопрос! Дай-ка подумаю... Знаешь, за годы странствий я \
                                многое повидал. Расскажи подробнее, что тебя интересует?";

/// Keyword-matched reply, in Russian when the message contains Cyrillic.
#[must_use]
pub fn simulated_response(message: &str) -> String {
    let lower = message.to_lowercase();
    let russian = lower.chars().any(|c| matches!(c, 'а'..='я' | 'ё'));
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    let reply = CANNED_REPLIES.iter().find(|reply| {
        words
            .iter()
            .any(|word| reply.stems.iter().any(|stem| word.starts_with(stem)))
    });

    let text = match (reply, russian) {
        (Some(reply), true) => reply.russian,
        (Some(reply), false) => reply.english,
        (None, true) => FALLBACK_RUSSIAN,
        (None, false) => FALLBACK_ENGLISH,
    };
    text.to_string()
}
