//! Per-tool lifecycle as an explicit state machine.
//!
//! ```text
//! Idle ──select──► FileSelected ──begin──► Processing ──┬─► Succeeded(R)
//!  ▲                    ▲                                └─► Failed(msg)
//!  └──────clear─────────┴────────select (supersedes the old result)
//! ```
//!
//! A session owns at most one result. Clearing it, or selecting new files
//! from a terminal state, drops the previous result.
//!
//! Cancelling a run fires the run's [`CancelToken`] and mutes progress. The
//! operation in flight is not interrupted; whatever it returns is
//! discarded and the session falls back to `FileSelected`.

use crate::error::DocToolsError;
use crate::progress::CancelToken;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum ToolState<R> {
    Idle,
    FileSelected { files: usize },
    Processing { files: usize, percent: f32, cancelled: bool },
    Succeeded(R),
    Failed(String),
}

impl<R> ToolState<R> {
    pub fn name(&self) -> &'static str {
        match self {
            ToolState::Idle => "idle",
            ToolState::FileSelected { .. } => "file-selected",
            ToolState::Processing { .. } => "processing",
            ToolState::Succeeded(_) => "succeeded",
            ToolState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ToolState::Succeeded(_) | ToolState::Failed(_))
    }
}

/// Lifecycle of one tool, e.g. the compressor.
#[derive(Debug)]
pub struct ToolSession<R> {
    tool: &'static str,
    state: ToolState<R>,
    cancel: CancelToken,
}

impl<R> ToolSession<R> {
    pub fn new(tool: &'static str) -> Self {
        Self {
            tool,
            state: ToolState::Idle,
            cancel: CancelToken::new(),
        }
    }

    pub fn tool(&self) -> &'static str {
        self.tool
    }

    pub fn state(&self) -> &ToolState<R> {
        &self.state
    }

    /// The result of the last successful run, if the session holds one.
    pub fn result(&self) -> Option<&R> {
        match &self.state {
            ToolState::Succeeded(r) => Some(r),
            _ => None,
        }
    }

    /// Consume the session, handing back whatever it holds.
    pub fn into_state(self) -> ToolState<R> {
        self.state
    }

    /// Select `files` inputs. Allowed from every state except `Processing`.
    pub fn select_files(&mut self, files: usize) -> Result<(), DocToolsError> {
        if matches!(self.state, ToolState::Processing { .. }) {
            return Err(self.invalid("select files"));
        }
        if files == 0 {
            return Err(DocToolsError::NoFiles);
        }
        if self.state.is_terminal() {
            debug!("{}: previous {} result superseded", self.tool, self.state.name());
        }
        self.state = ToolState::FileSelected { files };
        Ok(())
    }

    /// Start a run. Returns a fresh token the operation should observe.
    pub fn begin(&mut self) -> Result<CancelToken, DocToolsError> {
        let ToolState::FileSelected { files } = self.state else {
            return Err(self.invalid("begin"));
        };
        self.cancel = CancelToken::new();
        self.state = ToolState::Processing {
            files,
            percent: 0.0,
            cancelled: false,
        };
        Ok(self.cancel.clone())
    }

    /// Record progress. Values below the current mark, and any value after
    /// cancellation, are ignored.
    pub fn report_progress(&mut self, value: f32) -> Result<(), DocToolsError> {
        match &mut self.state {
            ToolState::Processing {
                percent, cancelled, ..
            } => {
                if !*cancelled && value > *percent {
                    *percent = value.min(100.0);
                }
                Ok(())
            }
            _ => Err(self.invalid("report progress")),
        }
    }

    /// Stop the current run from reporting and ask it to wind down.
    pub fn cancel(&mut self) -> Result<(), DocToolsError> {
        match &mut self.state {
            ToolState::Processing { cancelled, .. } => {
                *cancelled = true;
                self.cancel.cancel();
                Ok(())
            }
            _ => Err(self.invalid("cancel")),
        }
    }

    pub fn succeed(&mut self, result: R) -> Result<(), DocToolsError> {
        self.finish(Ok(result))
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), DocToolsError> {
        self.finish(Err(message.into()))
    }

    /// Settle a run from the operation's own result.
    pub fn complete(&mut self, outcome: Result<R, DocToolsError>) -> Result<(), DocToolsError> {
        self.finish(outcome.map_err(|e| e.to_string()))
    }

    fn finish(&mut self, outcome: Result<R, String>) -> Result<(), DocToolsError> {
        let ToolState::Processing {
            files, cancelled, ..
        } = self.state
        else {
            return Err(self.invalid("finish"));
        };
        self.state = match outcome {
            _ if cancelled => {
                debug!("{}: cancelled run settled, result discarded", self.tool);
                ToolState::FileSelected { files }
            }
            Ok(result) => ToolState::Succeeded(result),
            Err(message) => ToolState::Failed(message),
        };
        Ok(())
    }

    /// Back to `Idle`, dropping any result. Not allowed mid-run.
    pub fn clear(&mut self) -> Result<(), DocToolsError> {
        if matches!(self.state, ToolState::Processing { .. }) {
            return Err(self.invalid("clear"));
        }
        self.state = ToolState::Idle;
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> DocToolsError {
        DocToolsError::InvalidState {
            action,
            state: self.state.name(),
        }
    }
}
