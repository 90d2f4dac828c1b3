#[path = "support.rs"]
mod support;

#[path = "auth_tests.rs"]
mod auth_tests;
#[path = "lookup_tests.rs"]
mod lookup_tests;
