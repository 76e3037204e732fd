// tests/config_env.rs
// Run single-threaded because we mutate process env:
//   cargo test -- --test-threads=1

use std::env;

use enjo_risk_analyzer::{
    build_completion_client, AppConfig, CompletionClient as _, ConfigError, DiagnosisVariant,
};

/// Small RAII helper to snapshot & restore env vars in each test.
struct EnvSnapshot {
    saved: Vec<(String, Option<String>)>,
}
impl EnvSnapshot {
    /// Provide a list of (KEY, Some(VALUE)) to set, or (KEY, None) to remove.
    fn set(pairs: &[(&str, Option<&str>)]) -> Self {
        let mut saved = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            let key = k.to_string();
            let prev = env::var(k).ok();
            saved.push((key.clone(), prev));
            match v {
                Some(val) => env::set_var(&key, val),
                None => env::remove_var(&key),
            }
        }
        Self { saved }
    }
}
impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (k, maybe_v) in self.saved.drain(..) {
            match maybe_v {
                Some(v) => env::set_var(&k, v),
                None => env::remove_var(&k),
            }
        }
    }
}

#[serial_test::serial]
#[test]
fn missing_api_key_refuses_to_boot() {
    let _env = EnvSnapshot::set(&[
        ("GEMINI_API_KEY", None),
        ("GEMINI_MODEL", None),
        ("GEMINI_API_URL", None),
        ("DIAGNOSIS_VARIANT", None),
        ("APP_PUBLIC_URL", None),
    ]);

    let err = AppConfig::from_env().expect_err("no credential, no boot");
    assert!(matches!(err, ConfigError::MissingApiKey));
    assert!(
        err.to_string().contains("GEMINI_API_KEY"),
        "the error text doubles as the setup instruction"
    );
}

#[serial_test::serial]
#[test]
fn blank_api_key_counts_as_missing() {
    let _env = EnvSnapshot::set(&[("GEMINI_API_KEY", Some("   "))]);

    let err = AppConfig::from_env().expect_err("blank credential, no boot");
    assert!(matches!(err, ConfigError::MissingApiKey));
}

#[serial_test::serial]
#[test]
fn key_alone_yields_defaults() {
    let _env = EnvSnapshot::set(&[
        ("GEMINI_API_KEY", Some("k-123")),
        ("GEMINI_MODEL", None),
        ("GEMINI_API_URL", None),
        ("DIAGNOSIS_VARIANT", None),
        ("APP_PUBLIC_URL", None),
    ]);

    let cfg = AppConfig::from_env().expect("key is the only required var");
    assert_eq!(cfg.api_key, "k-123");
    assert_eq!(cfg.model, "gemini-1.5-flash");
    assert_eq!(
        cfg.api_url,
        "https://generativelanguage.googleapis.com/v1beta"
    );
    assert_eq!(cfg.variant, DiagnosisVariant::Extended);
    assert_eq!(cfg.app_public_url, "https://enjo-risk-analyzer.shuttleapp.rs");
}

#[serial_test::serial]
#[test]
fn overrides_are_honored_and_url_is_normalized() {
    let _env = EnvSnapshot::set(&[
        ("GEMINI_API_KEY", Some("k-123")),
        ("GEMINI_MODEL", Some("gemini-2.0-flash")),
        ("GEMINI_API_URL", Some("https://proxy.example/v1beta///")),
        ("DIAGNOSIS_VARIANT", Some("base")),
        ("APP_PUBLIC_URL", Some("https://enjo.example")),
    ]);

    let cfg = AppConfig::from_env().expect("all overrides valid");
    assert_eq!(cfg.model, "gemini-2.0-flash");
    assert_eq!(cfg.api_url, "https://proxy.example/v1beta");
    assert_eq!(cfg.variant, DiagnosisVariant::Base);
    assert_eq!(cfg.app_public_url, "https://enjo.example");
}

#[serial_test::serial]
#[test]
fn unknown_variant_is_a_startup_error() {
    let _env = EnvSnapshot::set(&[
        ("GEMINI_API_KEY", Some("k-123")),
        ("DIAGNOSIS_VARIANT", Some("turbo")),
    ]);

    let err = AppConfig::from_env().expect_err("unknown variant must not default");
    match err {
        ConfigError::InvalidVariant(v) => assert_eq!(v, "turbo"),
        other => panic!("expected InvalidVariant, got {other:?}"),
    }
}

#[serial_test::serial]
#[test]
fn mock_mode_swaps_in_the_scripted_client() {
    let _env = EnvSnapshot::set(&[
        ("GEMINI_API_KEY", Some("k-123")),
        ("AI_TEST_MODE", Some("mock")),
        ("DIAGNOSIS_VARIANT", None),
    ]);

    let cfg = AppConfig::from_env().expect("config ok");
    let client = build_completion_client(&cfg);
    assert_eq!(client.model_id(), "scripted");
}

#[serial_test::serial]
#[test]
fn without_mock_mode_the_real_model_is_selected() {
    let _env = EnvSnapshot::set(&[
        ("GEMINI_API_KEY", Some("k-123")),
        ("GEMINI_MODEL", Some("gemini-1.5-pro")),
        ("AI_TEST_MODE", None),
    ]);

    let cfg = AppConfig::from_env().expect("config ok");
    // Builds the HTTP client; no request is sent here.
    let client = build_completion_client(&cfg);
    assert_eq!(client.model_id(), "gemini-1.5-pro");
}
