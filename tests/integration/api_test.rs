//! HTTP API integration tests
//!
//! Drives the composed router with `oneshot` requests against an in-memory store.

#![allow(dead_code)]

mod common;
mod http;
