//! Record types produced by the wizards
//!
//! - [`Event`] - a published cultural event
//! - [`Partner`] - an organizer, sponsor or partner attached to an event

pub mod event;
pub mod partner;

pub use event::{Category, Event, EventStatus, HighlightType, Ticketing};
pub use partner::{Partner, PartnerRole, Partners};
