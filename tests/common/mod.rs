#![allow(dead_code)]

pub use rlaunch_test_utils::{init_tracing, FakeRemote, SettingsBuilder};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
