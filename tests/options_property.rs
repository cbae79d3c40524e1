// tests/options_property.rs
use proptest::prelude::*;

use rlaunch::config::options::{COPY_KEYS, SHELL_KEYS};
use rlaunch::config::LaunchOptions;
use rlaunch::launcher::{CopyLauncher, Launcher, ShellLauncher};

const ALL_KEYS: &[&str] = &[
    "launcher",
    "options",
    "source",
    "destination",
    "command",
    "rhost",
    "background",
];

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_.~/-]{1,12}"
}

// A list of (key, value) updates; later entries for the same key win.
fn updates_strategy() -> impl Strategy<Value = Vec<(usize, String)>> {
    proptest::collection::vec((0..ALL_KEYS.len(), value_strategy()), 1..12)
}

fn to_options(key: &str, value: &str) -> LaunchOptions {
    let opts = LaunchOptions::new();
    match key {
        "launcher" => opts.launcher(value),
        "options" => opts.options(value),
        "source" => opts.source(value),
        "destination" => opts.destination(value),
        "command" => opts.command(value),
        "rhost" => opts.rhost(value),
        "background" => opts.background(value.len() % 2 == 0),
        _ => opts,
    }
}

fn field(record: &LaunchOptions, key: &str) -> Option<String> {
    let value = match key {
        "launcher" => record.launcher.as_deref(),
        "options" => record.options.as_deref(),
        "source" => record.source.as_deref(),
        "destination" => record.destination.as_deref(),
        "command" => record.command.as_deref(),
        "rhost" => record.rhost.as_deref(),
        "background" => return record.background.map(|b| b.to_string()),
        _ => None,
    };
    value.map(str::to_string)
}

fn expected(key: &str, value: &str) -> String {
    if key == "background" {
        (value.len() % 2 == 0).to_string()
    } else {
        value.to_string()
    }
}

proptest! {
    #[test]
    fn copy_record_holds_last_value_per_allowed_key(updates in updates_strategy()) {
        let mut copier = CopyLauncher::new("prop-copy");
        let mut record = LaunchOptions::new();
        for (idx, value) in &updates {
            record = copier.config(to_options(ALL_KEYS[*idx], value));
        }

        for key in ALL_KEYS {
            let last = updates.iter().rev().find(|(idx, _)| ALL_KEYS[*idx] == *key);
            let got = field(&record, key);
            if COPY_KEYS.contains(key) {
                if let Some((_, value)) = last {
                    prop_assert_eq!(got, Some(expected(key, value)));
                } else {
                    prop_assert!(got.is_some(), "allowed key {} always reported", key);
                }
            } else {
                prop_assert_eq!(got, None, "key {} is not a copy key", key);
            }
        }
    }

    #[test]
    fn shell_record_holds_last_value_per_allowed_key(updates in updates_strategy()) {
        let mut shell = ShellLauncher::new("prop-shell");
        let mut record = LaunchOptions::new();
        for (idx, value) in &updates {
            record = shell.config(to_options(ALL_KEYS[*idx], value));
        }

        for key in ALL_KEYS {
            let last = updates.iter().rev().find(|(idx, _)| ALL_KEYS[*idx] == *key);
            let got = field(&record, key);
            if SHELL_KEYS.contains(key) {
                if let Some((_, value)) = last {
                    prop_assert_eq!(got, Some(expected(key, value)));
                }
            } else {
                prop_assert_eq!(got, None, "key {} is not a shell key", key);
            }
        }
    }

    #[test]
    fn merge_prefers_later_values(a in value_strategy(), b in value_strategy()) {
        let merged = LaunchOptions::new()
            .rhost(a.clone())
            .command(a.clone())
            .merge(LaunchOptions::new().rhost(b.clone()));

        prop_assert_eq!(merged.rhost.as_deref(), Some(b.as_str()));
        prop_assert_eq!(merged.command.as_deref(), Some(a.as_str()));
    }
}
