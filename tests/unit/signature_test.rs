use bigpagos::pse::SignatureCodec;
use md5::{Digest, Md5};
use proptest::prelude::*;

const CLIENT_ID: &str = "client-123";
const CLIENT_SECRET: &str = "s3cret";

fn codec() -> SignatureCodec {
    SignatureCodec::new(CLIENT_ID, CLIENT_SECRET)
}

/// The digest the gateway computes for a webhook it sends us
fn gateway_signature(transaction_id: &str, amount: &str, currency: &str) -> String {
    let input = format!(
        "{}^{}^{}^{}^{}",
        CLIENT_ID, CLIENT_SECRET, transaction_id, amount, currency
    );
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[test]
fn verify_accepts_gateway_digest_under_same_secret() {
    assert!(codec().verify("T1", "50000", "COP", &gateway_signature("T1", "50000", "COP")));
}

#[test]
fn verify_rejects_digest_from_different_secret() {
    let foreign = SignatureCodec::new(CLIENT_ID, "other-secret");
    let signature = gateway_signature("T1", "50000", "COP");
    assert!(!foreign.verify("T1", "50000", "COP", &signature));
}

#[test]
fn sign_matches_gateway_scheme_over_the_reference() {
    // Outbound intents are signed over the merchant reference in the
    // same position the webhook digest carries the transaction id.
    let signature = codec().sign("50000", "BP000100420001");
    assert_eq!(signature, gateway_signature("BP000100420001", "50000", "COP"));
}

#[test]
fn verify_rejects_tampered_amount() {
    let signature = gateway_signature("T1", "50000", "COP");
    assert!(!codec().verify("T1", "500000", "COP", &signature));
}

proptest! {
    /// Any single-character mutation of a valid signature fails verification
    #[test]
    fn any_single_byte_mutation_fails(position in 0usize..32, replacement in "[0-9a-f]") {
        let valid = gateway_signature("T1", "50000", "COP");
        let replacement = replacement.chars().next().unwrap();

        let mut mutated: Vec<char> = valid.chars().collect();
        prop_assume!(mutated[position] != replacement);
        mutated[position] = replacement;
        let mutated: String = mutated.into_iter().collect();

        prop_assert!(!codec().verify("T1", "50000", "COP", &mutated));
    }

    /// Signing is deterministic and verification round-trips for
    /// arbitrary amounts and references under one secret
    #[test]
    fn round_trip_for_arbitrary_inputs(
        amount in "[1-9][0-9]{0,9}",
        reference in "BP[0-9]{8,14}",
    ) {
        let codec = codec();
        prop_assert_eq!(codec.sign(&amount, &reference), codec.sign(&amount, &reference));
        prop_assert!(codec.verify(&reference, &amount, "COP", &codec.sign(&amount, &reference)));
    }
}
