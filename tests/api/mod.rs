//! API endpoint tests

mod events_tests;
mod health_tests;
mod rooms_tests;
