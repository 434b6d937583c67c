use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn payment_mac(secret: &str, order_id: &str, payment_id: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac
}

/// Hex HMAC-SHA256 over `"{order_id}|{payment_id}"`, as the provider signs
/// its checkout callbacks.
pub fn sign_payment(secret: &str, order_id: &str, payment_id: &str) -> String {
    hex::encode(payment_mac(secret, order_id, payment_id).finalize().into_bytes())
}

/// Length of a hex encoded HMAC-SHA256 digest.
const SIGNATURE_LEN: usize = 64;

/// Checks a client-supplied callback signature.
///
/// Only the exact lowercase hex form [`sign_payment`] produces is accepted;
/// the digest itself is compared in constant time.
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let canonical = signature.len() == SIGNATURE_LEN
        && signature
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !canonical {
        return false;
    }
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    payment_mac(secret, order_id, payment_id)
        .verify_slice(&expected)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "rzp_test_secret";

    #[test]
    fn test_signature_is_lowercase_hex_sha256() {
        let sig = sign_payment("key", "order_1", "pay_1");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert!(verify_payment_signature("key", "order_1", "pay_1", &sig));
    }

    #[test]
    fn test_valid_signature() {
        let sig = sign_payment(SECRET, "order_Nx1", "pay_Qz9");
        assert!(verify_payment_signature(SECRET, "order_Nx1", "pay_Qz9", &sig));
    }

    #[test]
    fn test_single_character_mutations_fail() {
        let sig = sign_payment(SECRET, "order_Nx1", "pay_Qz9");
        assert!(!verify_payment_signature(SECRET, "order_Nx2", "pay_Qz9", &sig));
        assert!(!verify_payment_signature(SECRET, "order_Nx1", "pay_Qz8", &sig));
        assert!(!verify_payment_signature("rzp_test_secreT", "order_Nx1", "pay_Qz9", &sig));

        let mut tampered = sig.clone().into_bytes();
        tampered[10] = if tampered[10] == b'0' { b'1' } else { b'0' };
        let tampered = String::from_utf8(tampered).unwrap();
        assert!(!verify_payment_signature(SECRET, "order_Nx1", "pay_Qz9", &tampered));
    }

    #[test]
    fn test_separator_is_significant() {
        let sig = sign_payment(SECRET, "order_1", "pay_1");
        assert!(!verify_payment_signature(SECRET, "order_1|", "pay_1", &sig));
        assert!(!verify_payment_signature(SECRET, "order_", "1|pay_1", &sig));
    }

    #[test]
    fn test_malformed_signature_rejected() {
        assert!(!verify_payment_signature(SECRET, "o", "p", "not-hex"));
        assert!(!verify_payment_signature(SECRET, "o", "p", ""));
        assert!(!verify_payment_signature(SECRET, "o", "p", "abcd"));

        let sig = sign_payment(SECRET, "order_1", "pay_1");
        assert!(verify_payment_signature(SECRET, "order_1", "pay_1", &sig));
        assert!(!verify_payment_signature(SECRET, "order_1", "pay_1", &sig.to_uppercase()));
        assert!(!verify_payment_signature(
            SECRET,
            "order_1",
            "pay_1",
            &format!(" {}\n", sig)
        ));
        assert!(!verify_payment_signature(SECRET, "order_1", "pay_1", &format!("{}00", sig)));
    }
}
