//! Common imports for Parley users.

pub use crate::broadcast::{BroadcastSink, PartySink, CONFIRM_TOKEN, DONE_TOKEN};
pub use crate::config::ParleyConfig;
pub use crate::error::{ParleyError, Result};
pub use crate::orchestrator::{Orchestrator, RunOutcome, RunRequest, RunStatus};
pub use crate::provider::{ChatProvider, OpenAiProvider};
pub use crate::service::ChatService;
pub use crate::substrate::{EventBus, InProcess, Substrate};
pub use crate::tools::{FnTool, Tool, ToolParameters, ToolRegistry};
pub use crate::types::{ChatMessage, FunctionCall, ParsedCall, RequestId, Role};
