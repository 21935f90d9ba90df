mod common;

use ndarray::Array2;
use superres_core::fusion::shift_add_fusion;
use superres_core::image_data::{ImageData, ImageSize};
use superres_core::model::{DownsamplingModule, ImageModel, MotionModule};
use superres_core::motion::{MotionShift, MotionShiftSequence};
use superres_core::simulate::simulate_low_res_frames;

use common::*;

fn sequence(shifts: &[(i32, i32)]) -> MotionShiftSequence {
    MotionShiftSequence::new(shifts.iter().map(|&(dx, dy)| MotionShift::new(dx, dy)).collect())
}

fn sampling_model(shifts: &[(i32, i32)], scale: usize) -> ImageModel {
    let mut model = ImageModel::new();
    model
        .add_degradation_operator(Box::new(MotionModule::new(sequence(shifts))))
        .unwrap();
    model
        .add_degradation_operator(Box::new(DownsamplingModule::new(scale).unwrap()))
        .unwrap();
    model
}

#[test]
fn test_full_coverage_is_exact() {
    let shifts = [(0, 0), (-1, 0), (0, -1), (-1, -1)];
    let truth = gradient_image(ImageSize::new(8, 6));
    let frames = simulate_low_res_frames(&truth, &sampling_model(&shifts, 2), 4).unwrap();

    let fused = shift_add_fusion(&frames, &sequence(&shifts), 2).unwrap();
    assert_eq!(fused.size(), truth.size());
    assert_matrix_eq(fused.channel(0).unwrap(), truth.channel(0).unwrap(), 0.0);
}

#[test]
fn test_single_frame_is_inpainted() {
    let frames = vec![ImageData::from_gray(Array2::from_elem((3, 3), 0.4))];
    let fused = shift_add_fusion(&frames, &sequence(&[(0, 0)]), 2).unwrap();
    assert_eq!(fused.size(), ImageSize::new(6, 6));
    for &v in fused.channel(0).unwrap() {
        assert!((v - 0.4).abs() < 1e-12, "value {v}");
    }
}

#[test]
fn test_inpainting_averages_neighbours() {
    let frames = vec![ImageData::from_gray(array_from_rows(&[&[0.0, 1.0]]))];
    let fused = shift_add_fusion(&frames, &sequence(&[(0, 0)]), 2).unwrap();
    let hr = fused.channel(0).unwrap();
    // Placed samples at (0, 0) and (0, 2); (0, 1) sits between them.
    assert_eq!(hr[[0, 0]], 0.0);
    assert_eq!(hr[[0, 2]], 1.0);
    assert!((hr[[0, 1]] - 0.5).abs() < 1e-12);
    assert!(hr.iter().all(|v| v.is_finite()));
}

#[test]
fn test_later_frames_overwrite_earlier() {
    let frames = vec![
        ImageData::from_gray(Array2::from_elem((2, 2), 0.1)),
        ImageData::from_gray(Array2::from_elem((2, 2), 0.9)),
    ];
    let fused = shift_add_fusion(&frames, &sequence(&[(0, 0), (0, 0)]), 2).unwrap();
    assert_eq!(fused.channel(0).unwrap()[[0, 0]], 0.9);
}

#[test]
fn test_fusion_keeps_channels() {
    let red = Array2::from_elem((2, 2), 0.2);
    let green = Array2::from_elem((2, 2), 0.6);
    let blue = Array2::from_elem((2, 2), 1.0);
    let frames = vec![ImageData::new(vec![red, green, blue]).unwrap()];
    let fused = shift_add_fusion(&frames, &sequence(&[(0, 0)]), 2).unwrap();
    assert_eq!(fused.num_channels(), 3);
    assert!((fused.channel(1).unwrap()[[1, 1]] - 0.6).abs() < 1e-12);
}

#[test]
fn test_fusion_errors() {
    let frame = ImageData::from_gray(Array2::zeros((2, 2)));
    assert!(shift_add_fusion(&[], &sequence(&[(0, 0)]), 2).is_err());
    assert!(shift_add_fusion(&[frame.clone()], &sequence(&[(0, 0)]), 0).is_err());
    assert!(shift_add_fusion(&[frame.clone(), frame.clone()], &sequence(&[(0, 0)]), 2).is_err());

    let other = ImageData::from_gray(Array2::zeros((3, 3)));
    assert!(shift_add_fusion(&[frame, other], &sequence(&[(0, 0), (0, 0)]), 2).is_err());
}
