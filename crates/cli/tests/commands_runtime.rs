use std::env;
use std::sync::{Mutex, OnceLock};

use quartermaster_cli::commands::{bank, config, doctor, events};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn bank_reports_the_empty_ledger_on_a_fresh_data_dir() {
    let dir = TempDir::new().expect("tempdir");
    let data_dir = dir.path().join("data");

    with_env(
        &[
            ("QM_DISCORD_BOT_TOKEN", "test-token"),
            ("QM_STORAGE_DATA_DIR", data_dir.to_str().expect("utf8 path")),
        ],
        || {
            let result = bank::run();
            assert_eq!(result.exit_code, 0, "expected successful bank summary");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "bank");
            assert_eq!(payload["status"], "ok");
            let message = payload["message"].as_str().unwrap_or_default();
            assert!(message.contains("total: 0 aUEC"));
            assert!(message.contains("transactions: 0"));
        },
    );
}

#[test]
fn bank_fails_with_config_error_class_without_a_token() {
    with_env(&[], || {
        let result = bank::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "bank");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn events_lists_a_seeded_roster() {
    let dir = TempDir::new().expect("tempdir");
    let data_dir = dir.path().join("data");
    std::fs::create_dir_all(&data_dir).expect("create data dir");
    std::fs::write(
        data_dir.join("events.json"),
        r#"{
  "next_event_id": 1,
  "events": [
    {
      "id": 0,
      "title": "Mining run",
      "date": "Friday 20:00",
      "description": "Meet at pad 3",
      "participants": ["U1", "U2"],
      "declined": ["U3"]
    }
  ]
}"#,
    )
    .expect("seed events document");

    with_env(
        &[
            ("QM_DISCORD_BOT_TOKEN", "test-token"),
            ("QM_STORAGE_DATA_DIR", data_dir.to_str().expect("utf8 path")),
        ],
        || {
            let result = events::run();
            assert_eq!(result.exit_code, 0, "expected successful events listing");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["status"], "ok");
            let message = payload["message"].as_str().unwrap_or_default();
            assert!(message.contains("[0] #0 Mining run"));
            assert!(message.contains("(2 in / 1 out)"));
        },
    );
}

#[test]
fn doctor_passes_with_a_token_and_writable_data_dir() {
    let dir = TempDir::new().expect("tempdir");
    let data_dir = dir.path().join("data");

    with_env(
        &[
            ("QM_DISCORD_BOT_TOKEN", "test-token"),
            ("QM_STORAGE_DATA_DIR", data_dir.to_str().expect("utf8 path")),
        ],
        || {
            let report: Value =
                serde_json::from_str(&doctor::run(true)).expect("doctor output should be JSON");
            assert_eq!(report["overall_status"], "pass");
            let checks = report["checks"].as_array().expect("checks array");
            assert!(checks
                .iter()
                .any(|check| check["name"] == "data_dir_writable" && check["status"] == "pass"));
        },
    );
}

#[test]
fn doctor_reports_config_failure_without_a_token() {
    with_env(&[], || {
        let report: Value =
            serde_json::from_str(&doctor::run(true)).expect("doctor output should be JSON");
        assert_eq!(report["overall_status"], "fail");
    });
}

#[test]
fn config_output_redacts_the_token_and_names_the_source() {
    with_env(&[("QM_DISCORD_BOT_TOKEN", "very-secret-token")], || {
        let output = config::run();

        assert!(!output.contains("very-secret-token"));
        assert!(output.contains("<redacted:17 chars>"));
        assert!(output.contains("env:QM_DISCORD_BOT_TOKEN"));
        assert!(output.contains("storage.data_dir"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "QM_DISCORD_BOT_TOKEN",
        "QM_COMMAND_PREFIX",
        "QM_CHANNEL_UPDATE",
        "QM_CHANNEL_WELCOME",
        "QM_CHANNEL_LOGS",
        "QM_CHANNEL_ROLE_PICKER",
        "QM_PERMISSIONS_MANAGE",
        "QM_PERMISSIONS_CHANNEL_CLOSE",
        "QM_STORAGE_DATA_DIR",
        "QM_STORAGE_CHANGELOG_PATH",
        "QM_LOGGING_LEVEL",
        "QM_LOGGING_FORMAT",
        "QM_LOG_LEVEL",
        "QM_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
