//! End-to-end decoding of a three-detector repetition-style model.

use mobius_core::{Decoder, DecoderConfigOptions, DetectorErrorModel};

fn repetition_decoder() -> Decoder {
    let dem: DetectorErrorModel = "
        error(0.1) D0 L0
        error(0.1) D0 D1 L1
        error(0.1) D1 L2
        detector(0, 0, 0, 0) D0
        detector(0, 0, 0, 1) D1
    "
    .parse()
    .unwrap();
    Decoder::from_dem(&dem, DecoderConfigOptions::default()).unwrap()
}

#[test]
fn all_quiet_predicts_nothing() {
    let mut decoder = repetition_decoder();
    assert_eq!(decoder.decode_detection_events(&[0b00]).unwrap(), 0);
}

#[test]
fn single_events_map_to_boundary_observables() {
    let mut decoder = repetition_decoder();
    assert_eq!(decoder.decode_detection_events(&[0b01]).unwrap(), 0b001);
    assert_eq!(decoder.decode_detection_events(&[0b10]).unwrap(), 0b100);
}

#[test]
fn pair_event_maps_to_middle_observable() {
    let mut decoder = repetition_decoder();
    assert_eq!(decoder.decode_detection_events(&[0b11]).unwrap(), 0b010);
}

#[test]
fn shots_do_not_contaminate_each_other() {
    let mut decoder = repetition_decoder();
    assert_eq!(decoder.decode_detection_events(&[0b11]).unwrap(), 0b010);
    assert_eq!(decoder.decode_detection_events(&[0b00]).unwrap(), 0);
    assert_eq!(decoder.decode_detection_events(&[0b01]).unwrap(), 0b001);
    assert_eq!(decoder.decode_detection_events(&[0b10]).unwrap(), 0b100);
    assert_eq!(decoder.decode_detection_events(&[0b11]).unwrap(), 0b010);
}
