//! Integration tests for Ripple-Parse
//!
//! Static parsing runs on real markup; dynamic parsing runs against scripted
//! in-memory sessions and against a wiremock stand-in for a WebDriver endpoint.

mod dynamic_tests;
mod parse_tests;
