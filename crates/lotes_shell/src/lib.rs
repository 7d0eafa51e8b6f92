//! Request routing for the lote tracking form UI.
//!
//! The UI (create, deliver and report views) calls one handler per user
//! action and renders the returned envelope.

mod api;

pub use api::{
    ActionResponse, PendingItem, PendingListResponse, ReportItem, ReportResponse, Shell,
};
