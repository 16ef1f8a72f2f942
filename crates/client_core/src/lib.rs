//! Client-side event lifecycle: the remote store client, the chronological ordering
//! policy and the per-view collection controller.

pub mod controller;
pub mod ordering;
pub mod store;

pub use controller::{EventCollectionController, EventIntent, EventView};
pub use ordering::{compare, event_instant, sort_events};
pub use store::{EventStore, HttpEventStore, RequestError, RequestFailure, StoreOperation};
