//! Every single error mechanism, fired alone, must decode to exactly its own
//! observable mask.

use mobius_core::graph::extract_obs_and_dets_from_error_instruction;
use mobius_core::types::SparseXorVec;
use mobius_core::{Decoder, DecoderConfigOptions, DetectorErrorModel};

fn verify_single_error_resilience(dem_text: &str) {
    let dem: DetectorErrorModel = dem_text.parse().unwrap();
    let mut decoder = Decoder::from_dem(&dem, DecoderConfigOptions::default()).unwrap();
    decoder.check_invariants().unwrap();
    let node_colors = decoder.node_colors.clone();
    let num_detectors = dem.count_detectors() as usize;
    let num_bytes = num_detectors.div_ceil(8);

    let mut failures = Vec::new();
    let mut err_index = 0usize;
    let mut dets = SparseXorVec::new();
    let mut obs_actual = 0u64;
    let mut shots: Vec<(usize, Vec<u8>, u64)> = Vec::new();
    dem.for_each_flattened_error(&mut |_, targets| {
        extract_obs_and_dets_from_error_instruction(
            targets,
            &node_colors,
            &mut dets,
            &mut obs_actual,
        )
        .unwrap();
        let mut shot = vec![0u8; num_bytes];
        for &d in dets.items() {
            shot[d as usize / 8] |= 1 << (d % 8);
        }
        shots.push((err_index, shot, obs_actual));
        err_index += 1;
    });

    for (err_index, shot, obs_actual) in shots {
        match decoder.decode_detection_events(&shot) {
            Ok(obs_predicted) => {
                if obs_predicted != obs_actual {
                    failures.push(format!(
                        "error #{}: predicted {:#b}, actual {:#b}",
                        err_index, obs_predicted, obs_actual
                    ));
                }
            }
            Err(e) => failures.push(format!("error #{}: decode failed: {}", err_index, e)),
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn repetition_code_errors_decode_to_themselves() {
    verify_single_error_resilience(
        "
        error(0.1) D0 L0
        error(0.1) D0 D1 L1
        error(0.1) D1 L2
        detector(0, 0, 0, 0) D0
        detector(0, 0, 0, 1) D1
        ",
    );
}

#[test]
fn d5_color_code_errors_decode_to_themselves() {
    verify_single_error_resilience(
        "
        error(0.1) D0 L0 L1
        error(0.1) D0 D2 L0
        error(0.1) D2 D3 L0
        error(0.1) D3 D7 L0
        error(0.1) D7 L0
        error(0.1) D0 D1
        error(0.1) D0 D1 D2 L1
        error(0.1) D1 D2 D4 L1
        error(0.1) D1 D4
        error(0.1) D4 D6
        error(0.1) D6
        error(0.1) D6 D8
        error(0.1) D4 D5 D8 L1
        error(0.1) D2 D4 D5
        error(0.1) D3 D5 D7
        error(0.1) D5 D7
        error(0.1) D5 D8 L1
        error(0.1) D2 D3 D5
        error(0.1) D4 D6 D8
        detector(0, 0, 0, 0) D0
        detector(0, 2, 0, 1) D2
        detector(0, 4, 0, 2) D5
        detector(1, 1, 0, 2) D1
        detector(1, 3, 0, 0) D4
        detector(1, 5, 0, 1) D8
        detector(2, 4, 0, 2) D6
        detector(-1, 3, 0, 0) D3
        detector(-1, 5, 0, 1) D7
        ",
    );
}

#[test]
fn two_basis_phenom_style_errors_decode_to_themselves() {
    // One round of measurement errors linking two layers, in both bases.
    verify_single_error_resilience(
        "
        error(0.1) D0 D1 D2
        error(0.1) D0 D3 L0
        error(0.1) D1 D4
        error(0.1) D2 D5
        error(0.1) D3 D4 D5
        error(0.1) D6 D7 D8
        error(0.1) D6 L1
        error(0.1) D7 D8
        detector(0, 0, 0, 0) D0
        detector(0, 1, 0, 1) D1
        detector(0, 2, 0, 2) D2
        detector(0, 0, 1, 0) D3
        detector(0, 1, 1, 1) D4
        detector(0, 2, 1, 2) D5
        detector(1, 0, 0, 3) D6
        detector(1, 1, 0, 4) D7
        detector(1, 2, 0, 5) D8
        ",
    );
}
