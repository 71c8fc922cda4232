use super::entity::TOKEN_PLAINTEXT_LEN;
use crate::domain::validation::Validator;

/// Whether `token` could have been produced by the issuer
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_PLAINTEXT_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
}

pub fn validate_token_plaintext(v: &mut Validator, token: &str) {
    v.check(!token.is_empty(), "token", "must be provided");
    v.check(is_well_formed(token), "token", "must be 26 bytes long");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed() {
        assert!(is_well_formed("Y3QMGX3PJ3WLRL2YRTQGQ6KRHU"));
    }

    #[test]
    fn test_rejects_wrong_length_and_alphabet() {
        assert!(!is_well_formed("Y3QMGX3PJ3WLRL2YRTQGQ6KRH"));
        assert!(!is_well_formed("Y3QMGX3PJ3WLRL2YRTQGQ6KRHUU"));
        // 0, 1, 8 and lowercase are outside the base32 alphabet
        assert!(!is_well_formed("Y3QMGX3PJ3WLRL2YRTQGQ6KRH0"));
        assert!(!is_well_formed("y3qmgx3pj3wlrl2yrtqgq6krhu"));
    }

    #[test]
    fn test_validator_messages() {
        let mut v = Validator::new();
        validate_token_plaintext(&mut v, "");
        assert_eq!(v.errors().get("token").map(String::as_str), Some("must be provided"));

        let mut v = Validator::new();
        validate_token_plaintext(&mut v, "short");
        assert_eq!(v.errors().get("token").map(String::as_str), Some("must be 26 bytes long"));
    }
}
