//! Alert Lifecycle
//!
//! Per-unit threat notices with send / acknowledge / expire semantics.
//!
//! # State machine (per unit)
//!
//! ```text
//!            dispatch                acknowledge
//!  (none) ───────────▶ SENT ─────────────────────▶ ACKNOWLEDGED ──▶ (none)
//!                      │  ▲
//!            dispatch  │  │ (supersede: same id, new message)
//!                      └──┘
//!                      │
//!                      │ TTL elapsed (checked on next access)
//!                      ▼
//!                   EXPIRED ──▶ (none)
//! ```
//!
//! At most one `SENT` alert exists per unit. Dispatching again while one is
//! active supersedes it in place rather than queueing a second notice.
//!
//! Every state change appends an [`AlertLogEntry`] to the unit's audit
//! history and, if configured, forwards it to an [`AlertSink`]. Sink failures
//! never roll back in-memory state.
//!
//! # Concurrency
//!
//! Each unit has its own lock, so operations on different units never block
//! each other. [`AlertLifecycle`] is `Send + Sync` and is meant to be shared
//! behind an `Arc` by every session that needs it.

mod alert;
mod lifecycle;
mod sink;
mod unit;

pub use alert::{Alert, AlertEvent, AlertId, AlertLogEntry, AlertState, UnitCondition, UnitStatus};
pub use lifecycle::AlertLifecycle;
pub use sink::{AlertSink, MemorySink, SinkError};
pub use unit::{ParseUnitError, Role, UnitId};
