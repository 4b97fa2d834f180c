//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod images;
pub mod socket_guard;
