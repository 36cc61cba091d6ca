//! Binary-side test suite: command-line handling plus end-to-end checks of
//! the library through its public API.

mod cli_tests;
mod pipeline_tests;
