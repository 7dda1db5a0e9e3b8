//! Parley — tool-calling chat orchestration with coalesced streaming
//! broadcast.
//!
//! Parley drives a multi-turn conversation with a language model that may
//! request execution of registered functions, gates dangerous calls behind
//! out-of-band human confirmation, and relays partial model output to a
//! broadcast room as rate-limited coalesced messages.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use parley::prelude::*;
//!
//! # async fn example() -> parley::error::Result<()> {
//! let config = ParleyConfig::from_env();
//! let provider = Arc::new(OpenAiProvider::from_config(&config)?);
//! let registry = Arc::new(ToolRegistry::new().with(Arc::new(FnTool::new(
//!     "search_issues",
//!     "Search all issues for the given text",
//!     ToolParameters::object()
//!         .string("search", "The search term", true)
//!         .build(),
//!     |call, _history| async move { Ok(call.arguments) },
//! ))));
//! let sink = Arc::new(PartySink::new("http://localhost:1999/party/chat"));
//! let substrate = Arc::new(InProcess::new());
//!
//! let orchestrator = Orchestrator::new(provider, registry, sink, substrate, config);
//! let handle = orchestrator.start(RunRequest::new(vec![ChatMessage::user(
//!     "find the issue about login",
//! )]));
//! let outcome = handle.wait().await;
//! println!("{} messages", outcome.messages.len());
//! # Ok(())
//! # }
//! ```

pub mod broadcast;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prelude;
pub mod provider;
pub mod service;
pub mod substrate;
pub mod tools;
pub mod types;
