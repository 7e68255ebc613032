//! cosmicflow core
//!
//! Provider-independent building blocks for the Cosmic provisioning plugin:
//! remote rule collections are reconciled against their configured shape by
//! fanning independent rule operations out over a bounded worker pool.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │               host runtime (CRUD)               │
//! └─────────────────┬───────────────────────────────┘
//!                   │ ApplyResult
//! ┌─────────────────▼───────────────────────────────┐
//! │                cosmicflow-cloud                 │
//! │  ┌────────────┐  ┌────────────┐  ┌───────────┐  │
//! │  │ reconcile  │─▶│   batch    │─▶│   retry   │  │
//! │  └────────────┘  └────────────┘  └───────────┘  │
//! │  ┌────────────┐  ┌────────────┐                 │
//! │  │  classify  │  │    poll    │                 │
//! │  └────────────┘  └────────────┘                 │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │         Cosmic API client (CosmicApi)           │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod batch;
pub mod classify;
pub mod error;
pub mod poll;
pub mod reconcile;
pub mod retry;
pub mod rule;

// Re-exports
pub use action::{ActionType, ApplyResult};
pub use batch::{BatchExecutor, BatchOutcome};
pub use error::{ApiError, BatchError, CloudError, ItemError, Result};
pub use poll::{PollConfig, PollOutcome, poll_until};
pub use reconcile::{Reconciled, delete_all, reconcile};
pub use retry::{RetryConfig, retry};
pub use rule::{Rule, RuleSet, observe};
