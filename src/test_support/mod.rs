//! Helpers shared by the crate's unit tests.

pub(crate) mod images;
pub(crate) mod socket_guard;
