//! HTTP handlers for the relay.
//!
//! Every handler is a single pass: validate, call one upstream, map the
//! answer. Failures never escape as anything but a JSON body.

pub mod chat;
pub mod diagnostics;
pub mod places;
