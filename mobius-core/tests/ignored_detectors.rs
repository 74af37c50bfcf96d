//! Detectors annotated with a 4th coordinate of -1 take part in nothing.

use mobius_core::{DemInstruction, Decoder, DecoderConfigOptions, DetectorErrorModel};

/// A small patch plus four ignored detectors (20..24) that a few errors touch.
fn dem_with_ignored() -> DetectorErrorModel {
    "
        error(0.1) D0 L0
        error(0.1) D0 D1 L1
        error(0.1) D1 D20 L2
        error(0.1) D1 D21 D22
        error(0.1) D20 D21 D22 D23
        detector(0, 0, 0, 0) D0
        detector(0, 1, 0, 1) D1
        detector(9, 0, 0, -1) D20
        detector(9, 1, 0, -1) D21
        detector(9, 2, 0, -1) D22
        detector(9, 3, 0, -1) D23
    "
    .parse()
    .unwrap()
}

/// The same model with the ignored detectors absent.
fn dem_without_ignored() -> DetectorErrorModel {
    "
        error(0.1) D0 L0
        error(0.1) D0 D1 L1
        error(0.1) D1 L2
        error(0.1) D1
        detector(0, 0, 0, 0) D0
        detector(0, 1, 0, 1) D1
    "
    .parse()
    .unwrap()
}

fn error_instructions(dem: &DetectorErrorModel) -> Vec<DemInstruction> {
    dem.instructions
        .iter()
        .filter(|inst| matches!(inst, DemInstruction::Error { .. }))
        .cloned()
        .collect()
}

#[test]
fn ignored_detectors_vanish_from_the_mobius_dem() {
    let with = Decoder::from_dem(&dem_with_ignored(), DecoderConfigOptions::default()).unwrap();
    let without =
        Decoder::from_dem(&dem_without_ignored(), DecoderConfigOptions::default()).unwrap();

    // The error instructions agree exactly. (The trailing padding detector
    // declaration differs because the ignored detectors still count toward
    // the doubled detector total.)
    assert_eq!(
        error_instructions(&with.mobius_dem),
        error_instructions(&without.mobius_dem)
    );
    assert!(matches!(
        with.mobius_dem.instructions.last(),
        Some(DemInstruction::Detector { .. })
    ));
}

#[test]
fn error_reduced_to_empty_by_ignoring_is_dropped() {
    let with = Decoder::from_dem(&dem_with_ignored(), DecoderConfigOptions::default()).unwrap();
    // Five errors went in; the one touching only ignored detectors is gone.
    assert_eq!(error_instructions(&with.mobius_dem).len(), 4);
}

#[test]
fn decoding_ignores_events_on_ignored_detectors() {
    let mut with = Decoder::from_dem(&dem_with_ignored(), DecoderConfigOptions::default()).unwrap();
    let mut without =
        Decoder::from_dem(&dem_without_ignored(), DecoderConfigOptions::default()).unwrap();

    for shot in [0b00u8, 0b01, 0b10, 0b11] {
        // The with-ignored decoder gets extra junk events on detectors 20..24.
        let padded = [shot, 0, 0b0011_0000];
        assert_eq!(
            with.decode_detection_events(&padded).unwrap(),
            without.decode_detection_events(&[shot]).unwrap(),
            "shot {:#b}",
            shot
        );
    }
}
