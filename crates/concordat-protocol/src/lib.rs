//! Shared types for the Concordat grand-strategy backend.
//!
//! Everything that crosses a crate boundary lives here: the persisted save
//! document and its sub-collections, the read-only nation registry entries,
//! the context structures handed to the generation backend, and the wire
//! shape the backend is expected to return. All types are plain serde data;
//! the logic that mutates them lives in `concordat-core`.

pub mod action;
pub mod chat;
pub mod context;
pub mod event;
pub mod nation;
pub mod save;
pub mod types;
pub mod unit;

pub use action::{Action, ActionStatus};
pub use chat::{ChatMessage, ChatSummary, ChatType, DiplomaticChat};
pub use context::{AdvisorContext, NationBrief, PlayerBrief, TurnContext, WorldStateSummary};
pub use event::{EventType, GeneratedEvent, Severity, StateChange, TurnGeneration, WorldEvent};
pub use nation::{NationInfo, NationState};
pub use save::{Save, SaveSummary};
pub use types::{GameDate, NationCode, TimeJump};
pub use unit::{Unit, UnitType};
