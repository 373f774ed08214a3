//! # Identifier and Coefficient Tests
//!
//! The 4-byte identifier policy: short names are space padded, anything that
//! cannot fit is rejected rather than truncated.

use crate::{Coefficient, ConstituentId, ConstituentSet, Otps2Error};

/// Test that names shorter than 4 bytes are right-padded with spaces.
#[test]
fn short_names_are_space_padded() {
    for (name, bytes) in [
        ("M2", b"M2  "),
        ("K1", b"K1  "),
        ("M4", b"M4  "),
        ("MS4", b"MS4 "),
        ("MSQM", b"MSQM"),
        ("Q", b"Q   "),
    ] {
        let id = ConstituentId::new(name).unwrap();
        assert_eq!(id.as_bytes(), bytes, "padding for {name}");
        assert_eq!(id.name(), name);
        assert_eq!(id.to_string(), name);
    }
}

/// Test that long, empty, whitespace and non-ASCII names are rejected.
#[test]
fn names_that_do_not_fit_are_rejected() {
    for name in ["SIGMA1", "2MK3x", "", "M 2", "M2\t", "Mé"] {
        let err = ConstituentId::new(name).unwrap_err();
        assert!(
            matches!(err, Otps2Error::InvalidConstituentId { .. }),
            "{name:?} should be rejected, got {err}"
        );
    }
}

/// Test that the rejection message names the offending constituent.
#[test]
fn rejection_message_names_the_constituent() {
    let err = ConstituentId::new("LAMBDA2").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("LAMBDA2"));
    assert!(message.contains("4 bytes"));
}

/// Test that a slice of identifiers is a contiguous `char[n][4]`.
#[test]
fn identifier_slice_has_native_layout() {
    let ids: Vec<ConstituentId> = ["M2", "S2", "K1"]
        .iter()
        .map(|name| name.parse().unwrap())
        .collect();

    assert_eq!(std::mem::size_of::<ConstituentId>(), 4);
    assert_eq!(std::mem::align_of::<ConstituentId>(), 1);

    // SAFETY: ConstituentId is repr(transparent) over [u8; 4]
    let raw = unsafe { std::slice::from_raw_parts(ids.as_ptr().cast::<u8>(), ids.len() * 4) };
    assert_eq!(raw, b"M2  S2  K1  ");
}

/// Test that identifiers serialize as trimmed names and validate on the way in.
#[test]
fn identifiers_serialize_as_plain_names() {
    let id = ConstituentId::new("N2").unwrap();
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"N2\"");

    let parsed: ConstituentId = serde_json::from_str("\"O1\"").unwrap();
    assert_eq!(parsed.as_bytes(), b"O1  ");

    assert!(serde_json::from_str::<ConstituentId>("\"TOOLONG\"").is_err());
}

/// Test amplitude and phase recovery from the complex coefficient.
#[test]
fn amplitude_phase_roundtrip() {
    for (amplitude, phase) in [(1.0, 0.0), (0.42, 37.5), (2.5, 180.0), (0.1, 300.0)] {
        let z = Coefficient::from_amplitude_phase(amplitude, phase);
        assert!((z.amplitude() - amplitude).abs() < 1e-12);
        assert!((z.phase_degrees() - phase).abs() < 1e-9, "phase {phase}");
    }
}

/// Test building a set from `(re, im)` tuples.
#[test]
fn tuple_pairs_convert_to_coefficients() {
    let set: ConstituentSet<Coefficient> = [("M2", (1.0, -0.5)), ("S2", (0.2, 0.0))]
        .into_iter()
        .map(|(name, pair)| (name.parse::<ConstituentId>().unwrap(), pair.into()))
        .collect();

    assert_eq!(
        set.get(&"M2".parse().unwrap()),
        Some(&Coefficient::new(1.0, -0.5))
    );
    assert_eq!(set.len(), 2);
}
