// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{env, io};

use log::{log_enabled, Level};
use tracing::subscriber::{set_global_default as set_subscriber, SetGlobalDefaultError};
use tracing_subscriber::{layer::SubscriberExt as _, EnvFilter, FmtSubscriber, Registry};

use crate::env::is_activated;

/// Where and how log lines are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Native `systemd-journald` entries.
    Journal,
    Pretty,
    Compact,
    Json,
    Full,
}

impl Format {
    /// Choose the format for a process which was (or wasn't) socket activated,
    /// given the value of `TRACING_FMT`.
    ///
    /// Socket activated processes log to the journal, `TRACING_FMT` only
    /// applies otherwise.
    pub fn select(activated: bool, tracing_fmt: Option<&str>) -> Self {
        if activated {
            return Self::Journal;
        }
        match tracing_fmt {
            Some("pretty") => Self::Pretty,
            Some("compact") => Self::Compact,
            Some("json") => Self::Json,
            _ => Self::Full,
        }
    }
}

/// Initialise logging / tracing
///
/// Until this is called, all logging of this crate goes nowhere.
///
/// If the process was socket activated, events are sent to `systemd-journald`
/// as structured journal entries. If the journal socket can not be reached,
/// lines are written to stderr without timestamps and without ANSI colours,
/// in the compact format.
///
/// Otherwise the `TRACING_FMT` environment variable can be used to control
/// the log formatting. Supported values:
///
/// * "pretty": [`tracing_subscriber::fmt::format::Pretty`]
/// * "compact": [`tracing_subscriber::fmt::format::Compact`]
/// * "json": [`tracing_subscriber::fmt::format::Json`]
///
/// If the variable is not set, or set to any other value, the
/// [`tracing_subscriber::fmt::format::Full`] format is used.
///
/// Calling this more than once is a no-op.
pub fn init() -> Result<(), SetGlobalDefaultError> {
    if env_logger::builder().try_init().is_err() {
        return Ok(());
    }

    let mut builder = FmtSubscriber::builder()
        .with_env_filter(env_filter())
        .with_writer(io::stderr);
    if log_enabled!(target: "link_activation", Level::Trace) {
        builder = builder.with_thread_ids(true);
    }

    let tracing_fmt = env::var("TRACING_FMT").ok();
    match Format::select(is_activated(), tracing_fmt.as_deref()) {
        Format::Journal => match tracing_journald::layer() {
            Ok(journald) => set_subscriber(Registry::default().with(env_filter()).with(journald)),
            Err(err) => {
                set_subscriber(builder.with_ansi(false).without_time().compact().finish())?;
                tracing::warn!(%err, "journal unavailable, logging to stderr");
                Ok(())
            },
        },
        Format::Pretty => set_subscriber(builder.pretty().finish()),
        Format::Compact => set_subscriber(builder.compact().finish()),
        Format::Json => set_subscriber(builder.json().flatten_event(true).finish()),
        Format::Full => set_subscriber(builder.finish()),
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
