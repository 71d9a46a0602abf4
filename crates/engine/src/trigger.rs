// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger subsystem (§3 "Trigger", §4.5).
//!
//! A trigger owns a single upcoming trigger date and a loop that sleeps
//! until it arrives, fires a callback, then advances to the next date (or
//! stops, for one-shot triggers). Before firing, an optional date
//! modifier gets a chance to move the date; the modifier's result is
//! applied according to a [`DateModifierPolicy`].

use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use wsched_core::SchedulerError;

pub type TriggerCallback = Arc<dyn Fn() + Send + Sync>;
pub type DateModifierFn = Arc<dyn Fn(DateTime<Utc>) -> DateTime<Utc> + Send + Sync>;

/// What to do when a date modifier proposes a different trigger date
/// (§3 "Trigger", §9 open question: default is `keep`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateModifierPolicy {
    #[default]
    Keep,
    Unmodify,
    Delete,
}

enum TriggerKindInner {
    Cron(Box<cron::Schedule>),
    Date,
    Instant,
}

/// Tag-only view of a trigger's kind, for logging and factory bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Cron,
    Date,
    Instant,
}

pub struct Trigger {
    kind: TriggerKindInner,
    trigger_date: Option<DateTime<Utc>>,
    date_modifier: Option<DateModifierFn>,
    modifier_action: DateModifierPolicy,
    callback: TriggerCallback,
}

impl Trigger {
    /// Recurring trigger driven by a cron expression (§4.5, grounded on
    /// the original's `CronTrigger`).
    pub fn cron(
        expression: &str,
        callback: TriggerCallback,
        date_modifier: Option<DateModifierFn>,
        modifier_action: DateModifierPolicy,
    ) -> Result<Self, SchedulerError> {
        let schedule = cron::Schedule::from_str(expression)
            .map_err(|e| SchedulerError::Config(format!("invalid cron expression '{expression}': {e}")))?;
        let trigger_date = schedule.upcoming(Utc).next();
        Ok(Self {
            kind: TriggerKindInner::Cron(Box::new(schedule)),
            trigger_date,
            date_modifier,
            modifier_action,
            callback,
        })
    }

    /// One-shot trigger fired at a specific date (§4.5, grounded on the
    /// original's `DateTrigger`).
    pub fn date(
        trigger_date: DateTime<Utc>,
        callback: TriggerCallback,
        date_modifier: Option<DateModifierFn>,
        modifier_action: DateModifierPolicy,
    ) -> Self {
        Self {
            kind: TriggerKindInner::Date,
            trigger_date: Some(trigger_date),
            date_modifier,
            modifier_action,
            callback,
        }
    }

    /// One-shot trigger fired immediately (§4.5, grounded on the
    /// original's `InstantTrigger`).
    pub fn instant(callback: TriggerCallback) -> Self {
        Self {
            kind: TriggerKindInner::Instant,
            trigger_date: Some(Utc::now()),
            date_modifier: None,
            modifier_action: DateModifierPolicy::default(),
            callback,
        }
    }

    pub fn kind(&self) -> TriggerKind {
        match self.kind {
            TriggerKindInner::Cron(_) => TriggerKind::Cron,
            TriggerKindInner::Date => TriggerKind::Date,
            TriggerKindInner::Instant => TriggerKind::Instant,
        }
    }

    pub fn trigger_date(&self) -> Option<DateTime<Utc>> {
        self.trigger_date
    }

    fn next(&self) -> Option<DateTime<Utc>> {
        match &self.kind {
            TriggerKindInner::Cron(schedule) => schedule.upcoming(Utc).next(),
            TriggerKindInner::Date | TriggerKindInner::Instant => None,
        }
    }

    fn apply_modification(&mut self, new_date: DateTime<Utc>) {
        let Some(current) = self.trigger_date else { return };
        if new_date == current {
            return;
        }
        match self.modifier_action {
            DateModifierPolicy::Keep => self.trigger_date = Some(new_date),
            DateModifierPolicy::Delete => self.trigger_date = self.next(),
            DateModifierPolicy::Unmodify => {}
        }
    }

    /// Run until the trigger stops producing dates (§4.5 "activate_trigger").
    /// Consumes `self` so the background task that owns it can be
    /// cancelled by dropping its `JoinHandle`.
    pub async fn activate(mut self) {
        while let Some(mut trigger_date) = self.trigger_date {
            if let Some(modifier) = self.date_modifier.clone() {
                let new_date = (*modifier)(trigger_date);
                self.apply_modification(new_date);
                trigger_date = match self.trigger_date {
                    Some(date) => date,
                    None => break,
                };
            }

            let sleep_for = (trigger_date - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(sleep_for).await;
            (*self.callback)();
            self.trigger_date = self.next();
        }
        info!("trigger will no longer fire");
    }
}

/// Spawn a trigger's activation loop on the current runtime, logging a
/// critical-level message if it ever panics (§7 "trigger_task_exception").
pub fn spawn(trigger: Trigger) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        trigger.activate().await;
    })
}

pub fn log_trigger_task_panic(file: &str, join_error: &tokio::task::JoinError) {
    error!(file, error = %join_error, "trigger task panicked");
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
