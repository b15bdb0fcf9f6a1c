//! Scripted command runner for tests.
//!
//! Captures every [`CommandSpec`] and replays queued responses, so the
//! adapters and pipelines can be exercised without the real tools
//! installed.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use shipwright_core::{CommandRunner, CommandSpec, Error, Result, ToolOutput};

/// Successful response with the given stdout.
pub fn ok(stdout: impl Into<String>) -> ToolOutput {
    ToolOutput {
        exit_code: Some(0),
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

/// Failed response with the given exit code and stderr.
pub fn fail(exit_code: i32, stderr: impl Into<String>) -> ToolOutput {
    ToolOutput {
        exit_code: Some(exit_code),
        stdout: String::new(),
        stderr: stderr.into(),
    }
}

struct Rule {
    needle: String,
    responses: VecDeque<ToolOutput>,
    last: ToolOutput,
}

/// Mock command runner.
///
/// Rules are matched in registration order against the rendered command
/// line; the first rule whose needle is contained in the line responds.
/// Sequenced rules replay their queue, then repeat the final response.
/// A command no rule matches is an error, so tests notice unexpected
/// invocations.
///
/// Clones share state, so a test can keep a handle for assertions while
/// the pipeline owns another.
#[derive(Clone, Default)]
pub struct MockRunner {
    rules: Arc<Mutex<Vec<Rule>>>,
    calls: Arc<Mutex<Vec<CommandSpec>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to every command whose rendered line contains `needle`.
    pub fn on(self, needle: impl Into<String>, response: ToolOutput) -> Self {
        self.on_sequence(needle, vec![response])
    }

    /// Respond with a sequence of outputs; the last one repeats.
    pub fn on_sequence(self, needle: impl Into<String>, responses: Vec<ToolOutput>) -> Self {
        assert!(!responses.is_empty(), "a rule needs at least one response");
        let mut responses = VecDeque::from(responses);
        let last = responses.back().cloned().unwrap();
        responses.pop_back();
        self.rules.lock().unwrap().push(Rule {
            needle: needle.into(),
            responses,
            last,
        });
        self
    }

    /// Every command that was run, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Rendered lines of the commands that match `needle`.
    pub fn calls_matching(&self, needle: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|spec| spec.display_line())
            .filter(|line| line.contains(needle))
            .collect()
    }

    pub fn call_count(&self, needle: &str) -> usize {
        self.calls_matching(needle).len()
    }

    fn respond(&self, spec: &CommandSpec) -> Result<ToolOutput> {
        let line = spec.display_line();
        let mut rules = self.rules.lock().unwrap();
        for rule in rules.iter_mut() {
            if line.contains(&rule.needle) {
                return Ok(rule.responses.pop_front().unwrap_or_else(|| rule.last.clone()));
            }
        }
        Err(Error::Internal(format!(
            "no scripted response for '{}'",
            line
        )))
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, spec: CommandSpec) -> Result<ToolOutput> {
        let response = self.respond(&spec);
        self.calls.lock().unwrap().push(spec);
        response
    }

    async fn run_streaming(
        &self,
        spec: CommandSpec,
        lines: Option<mpsc::Sender<String>>,
    ) -> Result<ToolOutput> {
        let response = self.run(spec).await?;
        if let Some(tx) = lines {
            for line in response.stdout.lines() {
                let _ = tx.send(line.to_string()).await;
            }
        }
        Ok(response)
    }
}
