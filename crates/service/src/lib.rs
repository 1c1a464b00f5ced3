// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LaunchService and the built-in description primitives, built on top of
//! `launch-core`'s context/dispatch machinery and `launch-process`'s
//! `ProcessAction`.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod error;
pub mod primitives;
pub mod service;

pub use error::ServiceError;
pub use primitives::{
    on_process_exit, on_process_exit_with, on_process_io, EmitEvent, LogInfo, ProcessIoHandlers,
    RegisterEventHandler, UnregisterEventHandler,
};
pub use service::LaunchService;
