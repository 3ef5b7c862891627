use std::str::FromStr;

use polaroidcli::error::ClientError;
use polaroidcli::management::SessionState;
use polaroidcli::routes::{GuardDecision, Route, guard};
use polaroidcli::types::{TimeRange, TokenRecord};
use polaroidcli::utils::*;

const ALLOWED: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

#[test]
fn test_generate_code_verifier() {
    let verifier = generate_code_verifier(DEFAULT_VERIFIER_LENGTH).unwrap();

    assert_eq!(verifier.len(), 128);
    assert!(verifier.chars().all(|c| ALLOWED.contains(c)));

    // Two generated verifiers should be different
    let verifier2 = generate_code_verifier(DEFAULT_VERIFIER_LENGTH).unwrap();
    assert_ne!(verifier, verifier2);
}

#[test]
fn test_generate_code_verifier_lengths() {
    for length in MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH {
        let verifier = generate_code_verifier(length).unwrap();
        assert_eq!(verifier.len(), length);
        assert!(verifier.chars().all(|c| ALLOWED.contains(c)));
    }
}

#[test]
fn test_generate_code_verifier_rejects_out_of_range() {
    assert_eq!(
        generate_code_verifier(42),
        Err(ClientError::InvalidVerifierLength(42))
    );
    assert_eq!(
        generate_code_verifier(129),
        Err(ClientError::InvalidVerifierLength(129))
    );
    assert!(check_verifier_length(0).is_err());
}

#[test]
fn test_generate_code_challenge() {
    // RFC 7636 appendix B
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    assert_eq!(
        generate_code_challenge(verifier),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );

    // Same input produces same output
    assert_eq!(
        generate_code_challenge(verifier),
        generate_code_challenge(verifier)
    );
    assert_ne!(
        generate_code_challenge(verifier),
        generate_code_challenge("different_verifier")
    );
}

#[test]
fn test_generate_code_challenge_is_url_safe() {
    for _ in 0..50 {
        let verifier = generate_code_verifier(64).unwrap();
        let challenge = generate_code_challenge(&verifier);

        // SHA-256 digest, base64url without padding
        assert_eq!(challenge.len(), 43);
        assert!(!challenge.contains('+'));
        assert!(!challenge.contains('/'));
        assert!(!challenge.contains('='));
    }
}

#[test]
fn test_expires_at() {
    let before = now_millis();
    let expiry = expires_at(3600);
    let after = now_millis();

    assert!(expiry >= before + 3_600_000);
    assert!(expiry <= after + 3_600_000);
}

#[test]
fn test_token_record_expiry_is_inclusive() {
    let record = TokenRecord {
        access_token: "A".to_string(),
        refresh_token: None,
        expires_at: 1_000,
    };

    assert!(!record.is_expired_at(999));
    assert!(record.is_expired_at(1_000));
    assert!(record.is_expired_at(1_001));
}

#[test]
fn test_format_duration_ms() {
    assert_eq!(format_duration_ms(0), "0:00");
    assert_eq!(format_duration_ms(61_000), "1:01");
    assert_eq!(format_duration_ms(215_999), "3:35");
}

#[test]
fn test_format_expiry() {
    assert_eq!(format_expiry(now_millis() + 3_600_000 + 500), "in 60m");
    assert_eq!(format_expiry(now_millis() - 120_500), "2m ago");
}

#[test]
fn test_format_expiry_extreme_timestamps() {
    // corrupt expiry values must not overflow
    assert!(format_expiry(i64::MIN).ends_with(" ago"));
    assert!(format_expiry(i64::MAX).starts_with("in "));
    assert!(format_expiry(0).ends_with(" ago"));
}

#[test]
fn test_time_range_parse() {
    assert_eq!(
        TimeRange::from_str("short_term").unwrap(),
        TimeRange::ShortTerm
    );
    assert_eq!(
        TimeRange::from_str("medium_term").unwrap(),
        TimeRange::MediumTerm
    );
    assert_eq!(
        TimeRange::from_str("long_term").unwrap(),
        TimeRange::LongTerm
    );
    assert_eq!(TimeRange::default(), TimeRange::MediumTerm);

    assert_eq!(
        TimeRange::from_str("forever"),
        Err(ClientError::InvalidTimeRange("forever".to_string()))
    );
}

#[test]
fn test_time_range_labels() {
    assert_eq!(TimeRange::ShortTerm.to_string(), "short_term");
    assert_eq!(TimeRange::LongTerm.as_str(), "long_term");
    assert_eq!(TimeRange::MediumTerm.display_label(), "Past 6 Months");
}

#[test]
fn test_guard_protected_route() {
    assert_eq!(
        guard(SessionState::Authenticated, Route::Home),
        GuardDecision::Render(Route::Home)
    );
    assert_eq!(
        guard(SessionState::Refreshing, Route::Home),
        GuardDecision::Render(Route::Home)
    );

    for state in [
        SessionState::Unresolved,
        SessionState::Unauthenticated,
        SessionState::Authenticating,
    ] {
        assert_eq!(
            guard(state, Route::Home),
            GuardDecision::Redirect(Route::Entry)
        );
    }
}

#[test]
fn test_guard_public_routes() {
    for route in [Route::Entry, Route::Login, Route::Callback, Route::Logout] {
        assert_eq!(
            guard(SessionState::Unauthenticated, route),
            GuardDecision::Render(route)
        );
        assert_eq!(
            guard(SessionState::Authenticated, route),
            GuardDecision::Render(route)
        );
    }
}
