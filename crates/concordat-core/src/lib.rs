//! Concordat game logic: the save store, nation registry, context builder,
//! calendar arithmetic, and event application.
//!
//! This crate is deliberately free of async and networking. The server crate
//! orchestrates turns and diplomacy on top of these pieces; everything here
//! is synchronous, deterministic, and unit-testable.

pub mod apply;
pub mod calendar;
pub mod context;
pub mod registry;
pub mod setup;
pub mod store;

pub use apply::apply_state_changes;
pub use calendar::advance_date;
pub use context::{
    advisor_context, world_state_summary, DIPLOMACY_EVENT_WINDOW, RECENT_EVENT_WINDOW,
};
pub use registry::{NationRegistry, RegistryError};
pub use setup::new_save;
pub use store::{SaveStore, StoreError};
