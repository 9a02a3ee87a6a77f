//! Rydberg Program Scheduler
//!
//! A pure rewrite pass that annotates a straight-line program with the
//! hardware's timing reality: native-gate durations, measurement cooldown
//! and duration, per-arity and per-zone parallelism limits, and legal wait
//! chunking. The output is the rewritten program (with inserted `Wait`
//! instructions) plus a nanosecond-resolution [`TimelineEntry`] plan.
//!
//! [`schedule_program`] is deterministic: a fixed `(program, hardware)`
//! pair yields byte-identical output on every call.

pub mod scheduler;
pub mod timeline;

pub use scheduler::{schedule_program, ScheduleResult};
pub use timeline::TimelineEntry;
