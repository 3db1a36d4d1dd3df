//! Scripted transport for exercising retry and timeout paths without a network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use eventlens_core::{Error, Result};
use eventlens_llm::{CompletionRequest, LlmTransport};
use futures::future::BoxFuture;
use parking_lot::Mutex;

pub(crate) enum Step {
    Reply(String),
    Fail,
    /// Reply only after the given delay.
    Hang(Duration, String),
}

/// Plays back `Step`s in order; repeats the last one when exhausted.
pub(crate) struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

impl LlmTransport for ScriptedTransport {
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'static, Result<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(request.prompt);

        let step = {
            let mut steps = self.steps.lock();
            if steps.len() > 1 {
                steps.pop_front()
            } else {
                steps.front().map(|s| match s {
                    Step::Reply(r) => Step::Reply(r.clone()),
                    Step::Fail => Step::Fail,
                    Step::Hang(d, r) => Step::Hang(*d, r.clone()),
                })
            }
        };

        Box::pin(async move {
            match step {
                Some(Step::Reply(r)) => Ok(r),
                Some(Step::Hang(delay, r)) => {
                    tokio::time::sleep(delay).await;
                    Ok(r)
                }
                Some(Step::Fail) | None => Err(Error::Llm("scripted failure".into())),
            }
        })
    }
}

/// Reply body in the enhancer's expected shape.
pub(crate) fn enhancement_reply(items: &[(&str, f64)]) -> String {
    let list: Vec<serde_json::Value> = items
        .iter()
        .map(|(p, s)| serde_json::json!({"phrase": p, "score": s, "reason": "relevant"}))
        .collect();
    format!(
        "Here are the curated keyphrases:\n{}",
        serde_json::json!({ "enhanced_keyphrases": list })
    )
}
