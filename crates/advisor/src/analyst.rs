//! The streamed analysis session.
//!
//! [`Analyst::run`] reports progress as [`AnalysisEvent`]s on a channel:
//! a few `step` events, one `content` event per model delta (or a single
//! one when streaming is off), then exactly one terminal `result` or
//! `error` event. A dropped receiver ends the session early without error.

use std::sync::Arc;

use chainscope_core::{Assessment, Assessor};
use chainscope_sources::{ChainDataService, ChainProfile};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::extract::{extract_analysis, AiAnalysis};
use crate::llm::{ChatMessage, LlmClient, LlmError, DEFAULT_MODEL};
use crate::prompt::build_messages;
use crate::scaffold::{scaffold, GeneratedCode};

pub const STEP_MESSAGES: [&str; 4] = [
    "Querying documentation...",
    "Activating web search...",
    "Finalizing complexity analysis...",
    "Generating integration code...",
];

/// One event of an analysis session. Serialized with a `type` tag.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalysisEvent {
    Step {
        step: u32,
        message: String,
    },
    Content {
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    Result {
        analysis: AiAnalysis,
        discovered_metadata: ChainProfile,
        assessment: Assessment,
        generated_code: GeneratedCode,
    },
    Error {
        error: String,
    },
}

impl AnalysisEvent {
    /// `result` and `error` end a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisEvent::Result { .. } | AnalysisEvent::Error { .. })
    }
}

pub struct Analyst {
    llm: Arc<dyn LlmClient>,
    data: ChainDataService,
    assessor: Assessor,
    model: String,
    streaming: bool,
}

impl Analyst {
    pub fn new(llm: Arc<dyn LlmClient>, data: ChainDataService, assessor: Assessor) -> Self {
        Self {
            llm,
            data,
            assessor,
            model: DEFAULT_MODEL.to_string(),
            streaming: true,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// With streaming off the model is asked for the whole answer at once
    /// and it arrives as one `content` event.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    async fn answer(
        &self,
        messages: &[ChatMessage],
        events: &mpsc::Sender<AnalysisEvent>,
    ) -> Result<String, LlmError> {
        if !self.streaming {
            let full = self.llm.complete(messages, &self.model).await?;
            if !full.is_empty() {
                let _ = events
                    .send(AnalysisEvent::Content {
                        content: full.clone(),
                    })
                    .await;
            }
            return Ok(full);
        }

        let (tx, mut rx) = mpsc::channel::<String>(64);
        let forward = async {
            while let Some(content) = rx.recv().await {
                if events.send(AnalysisEvent::Content { content }).await.is_err() {
                    break;
                }
            }
        };
        let (outcome, ()) = tokio::join!(self.llm.stream(messages, &self.model, tx), forward);
        outcome
    }

    /// Run one analysis of `chain`, reporting on `events`.
    pub async fn run(&self, chain: &str, events: mpsc::Sender<AnalysisEvent>) {
        let step = |n: usize| AnalysisEvent::Step {
            step: n as u32 + 1,
            message: STEP_MESSAGES[n].to_string(),
        };

        if events.send(step(0)).await.is_err() {
            return;
        }
        let profile = self.data.profile(chain).await;
        let assessment = self.assessor.assess(profile.snapshot(chain));

        for n in 1..3 {
            if events.send(step(n)).await.is_err() {
                return;
            }
        }

        let messages = build_messages(chain, &assessment, &profile, self.assessor.history());
        info!(chain, model = %self.model, streaming = self.streaming, "requesting AI analysis");

        let full = match self.answer(&messages, &events).await {
            Ok(full) => full,
            Err(e) => {
                warn!(chain, error = %e, "AI analysis failed");
                let _ = events
                    .send(AnalysisEvent::Error {
                        error: format!("Failed to generate analysis: {}", e),
                    })
                    .await;
                return;
            }
        };
        if events.is_closed() {
            info!(chain, "analysis consumer went away");
            return;
        }

        let analysis = extract_analysis(&full);
        if events.send(step(3)).await.is_err() {
            return;
        }
        let generated_code = scaffold(chain, &analysis);

        let _ = events
            .send(AnalysisEvent::Result {
                analysis,
                discovered_metadata: profile,
                assessment,
                generated_code,
            })
            .await;
    }
}
