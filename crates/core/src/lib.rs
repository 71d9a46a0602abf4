// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wsched-core: entity model, parameter cache, and status machine for the
//! workflow scheduler.

pub mod macros;

pub mod cache;
pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod job;
pub mod job_group;
pub mod paramfmt;

pub use cache::ParameterCache;
pub use clock::{Clock, FakeClock, SystemClock};
pub use entity::{Conditions, Entity, EntityMeta, ExceptionHandling, ObjectType};
pub use error::SchedulerError;
pub use id::EntityId;
pub use job::{Job, JobConfig, RunType};
pub use job_group::{JobGroup, Process};

/// Reserved parameter key injected by the cache for every lookup (§4.1).
pub const ENTITY_ID_KEY: &str = "entity_id";

/// Status codes, exactly as in the glossary: initialized=-3, running=-2,
/// re_running=-1, finished=0, unsuccessful=1, failure=2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Initialized,
    Running,
    ReRunning,
    Finished,
    Unsuccessful,
    Failure,
}

impl Status {
    pub fn code(self) -> i32 {
        match self {
            Status::Initialized => -3,
            Status::Running => -2,
            Status::ReRunning => -1,
            Status::Finished => 0,
            Status::Unsuccessful => 1,
            Status::Failure => 2,
        }
    }

    /// Map a raw execution status code back onto a `Status`. Used when a
    /// `repeat` exception-handling policy re-enters `unsuccessful`.
    pub fn from_code(code: i32) -> Option<Status> {
        match code {
            -3 => Some(Status::Initialized),
            -2 => Some(Status::Running),
            -1 => Some(Status::ReRunning),
            0 => Some(Status::Finished),
            1 => Some(Status::Unsuccessful),
            2 => Some(Status::Failure),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Finished | Status::Failure)
    }

    pub fn is_running(self) -> bool {
        matches!(self, Status::Running | Status::ReRunning)
    }
}

crate::simple_display! {
    Status {
        Initialized => "initialized",
        Running => "running",
        ReRunning => "re_running",
        Finished => "finished",
        Unsuccessful => "unsuccessful",
        Failure => "failure",
    }
}
