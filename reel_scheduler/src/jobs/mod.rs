//! The three periodic jobs plus the heartbeat tick, each a plain async
//! function so it can be driven directly in tests without spinning up the
//! cron engine in [`crate::scheduler`].

pub mod discover;
pub mod dispatch_due;
pub mod heartbeat;
pub mod reschedule;
