//! HTTP surface of Herald: schedule management, announcements and the
//! notification inbox, behind JWT bearer auth.

pub mod middleware;
pub mod routes;
pub mod state;
