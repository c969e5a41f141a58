//! Property-based tests for input validation and the persisted credential
//! record.

use proptest::prelude::*;

use foodcare_session::auth::{
    AuthError, Credentials, RecordError, StoredCredentials, TokenPair, ValidationPolicy,
};

fn token() -> impl Strategy<Value = String> {
    "[A-Za-z0-9._-]{1,64}"
}

fn optional_text() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-zA-Z0-9 ]{1,24}")
}

fn credentials() -> impl Strategy<Value = Credentials> {
    (
        "[a-z0-9-]{1,16}",
        optional_text(),
        optional_text(),
        token(),
        token(),
    )
        .prop_map(|(user_id, login, display_name, access, refresh)| {
            Credentials::logged_in(user_id, login, display_name, TokenPair::new(access, refresh, None))
        })
}

proptest! {
    /// A stored record reads back as the same credentials.
    #[test]
    fn stored_record_reads_back(creds in credentials()) {
        let json = StoredCredentials::from_credentials(&creds).to_json().expect("encode");
        let parsed = StoredCredentials::parse(&json).expect("parse");
        prop_assert_eq!(parsed.into_credentials().expect("convert"), creds);
    }

    /// A record never yields only one of the two tokens.
    #[test]
    fn record_with_one_token_is_rejected(creds in credentials(), drop_access in any::<bool>()) {
        let mut record = StoredCredentials::from_credentials(&creds);
        if drop_access {
            record.access_token = None;
        } else {
            record.refresh_token = Some(String::new());
        }
        prop_assert_eq!(record.into_credentials().unwrap_err(), RecordError::PartialTokens);
    }

    /// Passwords shorter than the minimum never pass, longer ones always do.
    #[test]
    fn password_length_rule(
        login in "[a-z]{1,12}",
        password in "[a-zA-Z0-9]{1,16}",
        min in 1usize..12,
    ) {
        let policy = ValidationPolicy::new(min);
        let result = policy.validate_login(&login, &password);
        if password.chars().count() >= min {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(AuthError::Validation(_))));
        }
    }

    /// Whitespace-only logins are always rejected.
    #[test]
    fn blank_login_rejected(login in "[ \t]{0,8}", password in "[a-z]{8,16}") {
        let result = ValidationPolicy::default().validate_login(&login, &password);
        prop_assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    /// Registration fails whenever the confirmation differs.
    #[test]
    fn mismatched_confirmation_rejected(
        password in "[a-z]{8,16}",
        confirm in "[a-z]{8,16}",
    ) {
        prop_assume!(password != confirm);
        let result = ValidationPolicy::default()
            .validate_register("alice", "Alice", &password, &confirm);
        prop_assert!(matches!(result, Err(AuthError::Validation(_))));
    }
}
