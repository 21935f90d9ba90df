mod common;

use superres_core::consts::MIN_TOTAL_VARIATION;
use superres_core::image_data::{ImageData, ImageSize};
use superres_core::model::{DegradationConfig, ImageModel};
use superres_core::motion::{MotionShift, MotionShiftSequence};
use superres_core::regularize::TotalVariationRegularizer;
use superres_core::simulate::simulate_low_res_frames;
use superres_core::solver::{
    numerical_gradient, IrlsCostProcessor, MapCostFunction, ObjectiveFunction,
};

use common::*;

const HR_SIZE: ImageSize = ImageSize {
    width: 6,
    height: 4,
};

fn model(shifts: &[(i32, i32)]) -> ImageModel {
    let motion = MotionShiftSequence::new(
        shifts.iter().map(|&(dx, dy)| MotionShift::new(dx, dy)).collect(),
    );
    DegradationConfig::default()
        .build_reconstruction_model(motion)
        .unwrap()
}

fn processor<'m>(
    model: &'m ImageModel,
    frames: &[ImageData],
    lambda: f64,
) -> IrlsCostProcessor<'m> {
    IrlsCostProcessor::new(
        frames,
        model,
        HR_SIZE,
        Box::new(TotalVariationRegularizer::new(HR_SIZE)),
        lambda,
    )
    .unwrap()
}

fn perturbed(truth: &ImageData) -> Vec<f64> {
    truth
        .channel_vector(0)
        .unwrap()
        .iter()
        .enumerate()
        .map(|(i, v)| v + 0.05 * ((i * 7 % 5) as f64 - 2.0))
        .collect()
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn test_processor_dimensions_and_initial_weights() {
    let model = model(&[(0, 0), (1, 0)]);
    let truth = gradient_image(HR_SIZE);
    let frames = simulate_low_res_frames(&truth, &model, 2).unwrap();
    let p = processor(&model, &frames, 0.1);

    assert_eq!(p.num_pixels(), 24);
    assert_eq!(p.num_images(), 2);
    assert_eq!(p.num_channels(), 1);
    assert_eq!(p.image_size(), HR_SIZE);
    assert!(p.irls_weights(0).unwrap().iter().all(|&w| w == 1.0));
    assert!(p.irls_weights(1).is_err());
}

#[test]
fn test_processor_rejects_bad_inputs() {
    let model = model(&[(0, 0)]);
    let reg = || Box::new(TotalVariationRegularizer::new(HR_SIZE));

    assert!(IrlsCostProcessor::new(&[], &model, HR_SIZE, reg(), 0.1).is_err());

    let wrong_size = vec![ImageData::zeros(ImageSize::new(2, 2), 1)];
    assert!(IrlsCostProcessor::new(&wrong_size, &model, HR_SIZE, reg(), 0.1).is_err());

    let good = vec![ImageData::zeros(ImageSize::new(3, 2), 1)];
    assert!(IrlsCostProcessor::new(&good, &model, HR_SIZE, reg(), -1.0).is_err());
    assert!(IrlsCostProcessor::new(&good, &model, HR_SIZE, reg(), f64::NAN).is_err());

    let other_reg = Box::new(TotalVariationRegularizer::new(ImageSize::new(4, 4)));
    assert!(IrlsCostProcessor::new(&good, &model, HR_SIZE, other_reg, 0.1).is_err());
}

// ---------------------------------------------------------------------------
// Data term
// ---------------------------------------------------------------------------

#[test]
fn test_data_residuals_vanish_at_truth() {
    let model = model(&[(0, 0), (1, 1), (-1, 0)]);
    let truth = gradient_image(HR_SIZE);
    let frames = simulate_low_res_frames(&truth, &model, 3).unwrap();
    let p = processor(&model, &frames, 0.0);
    let x = truth.channel_vector(0).unwrap().to_vec();

    for k in 0..3 {
        let residuals = p.compute_data_term_residuals(k, 0, &x).unwrap();
        assert_eq!(residuals.len(), 24);
        assert!(residuals.iter().all(|r| r.abs() < 1e-12), "frame {k}");
    }
    assert!(p.compute_objective_function(0, &x, None).unwrap() < 1e-20);
}

#[test]
fn test_data_residuals_zero_off_the_lr_grid() {
    let model = model(&[(0, 0)]);
    let truth = gradient_image(HR_SIZE);
    let frames = simulate_low_res_frames(&truth, &model, 1).unwrap();
    let p = processor(&model, &frames, 0.0);

    let x = vec![1.0; 24];
    let residuals = p.compute_data_term_residuals(0, 0, &x).unwrap();
    for (i, r) in residuals.iter().enumerate() {
        let (row, col) = (i / 6, i % 6);
        if row % 2 == 1 || col % 2 == 1 {
            assert_eq!(*r, 0.0, "off-grid residual at {i}");
        }
    }
    assert!(p.compute_data_term_residuals(1, 0, &x).is_err());
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

#[test]
fn test_update_irls_weights() {
    let model = model(&[(0, 0)]);
    let truth = gradient_image(HR_SIZE);
    let frames = simulate_low_res_frames(&truth, &model, 1).unwrap();
    let mut p = processor(&model, &frames, 0.1);

    let x = perturbed(&truth);
    p.update_irls_weights(0, &x).unwrap();

    let tv = TotalVariationRegularizer::new(HR_SIZE);
    let g = superres_core::regularize::Regularizer::apply_to_image(&tv, &x).unwrap();
    for (w, g) in p.irls_weights(0).unwrap().iter().zip(&g) {
        assert!(w.is_finite() && *w > 0.0);
        assert!((w - 1.0 / g.max(MIN_TOTAL_VARIATION)).abs() <= 1e-9 * w);
    }
}

#[test]
fn test_flat_image_weights_are_bounded() {
    let model = model(&[(0, 0)]);
    let frames = vec![ImageData::zeros(ImageSize::new(3, 2), 1)];
    let mut p = processor(&model, &frames, 0.1);
    p.update_irls_weights(0, &vec![0.3; 24]).unwrap();
    for &w in p.irls_weights(0).unwrap() {
        assert!((w - 1.0 / MIN_TOTAL_VARIATION).abs() < 1e-3);
    }
}

#[test]
fn test_huge_finite_estimate_gives_finite_weights() {
    let model = model(&[(0, 0)]);
    let frames = vec![ImageData::zeros(ImageSize::new(3, 2), 1)];
    let mut p = processor(&model, &frames, 0.1);

    // Neighbour difference of 2e200 would overflow dx^2.
    let mut x = vec![0.0; 24];
    x[0] = 1e200;
    x[1] = -1e200;
    p.update_irls_weights(0, &x).unwrap();
    assert!(p.irls_weights(0).unwrap().iter().all(|&w| w > 0.0 && w.is_finite()));

    // Difference overflows f64 itself; the weight clamps to the smallest positive value.
    x[0] = f64::MAX;
    x[1] = -f64::MAX;
    p.update_irls_weights(0, &x).unwrap();
    let weights = p.irls_weights(0).unwrap();
    assert!(weights.iter().all(|&w| w > 0.0 && w.is_finite()));
    assert_eq!(weights[0], f64::MIN_POSITIVE);
}

#[test]
fn test_non_finite_estimate_rejected() {
    let model = model(&[(0, 0)]);
    let frames = vec![ImageData::zeros(ImageSize::new(3, 2), 1)];
    let mut p = processor(&model, &frames, 0.1);
    let mut x = vec![0.0; 24];
    x[5] = f64::NAN;
    assert!(p.update_irls_weights(0, &x).is_err());
    assert!(p.compute_objective_function(0, &x, None).is_err());
}

// ---------------------------------------------------------------------------
// Objective and gradient
// ---------------------------------------------------------------------------

#[test]
fn test_objective_is_sum_of_squared_residuals() {
    let model = model(&[(0, 0), (1, 1)]);
    let truth = gradient_image(HR_SIZE);
    let frames = simulate_low_res_frames(&truth, &model, 2).unwrap();
    let mut p = processor(&model, &frames, 0.05);
    let x = perturbed(&truth);
    p.update_irls_weights(0, &x).unwrap();
    let estimate: Vec<f64> = x.iter().map(|v| v * 0.9).collect();

    let mut expected = 0.0;
    for k in 0..2 {
        expected += p
            .compute_data_term_residuals(k, 0, &estimate)
            .unwrap()
            .iter()
            .map(|r| r * r)
            .sum::<f64>();
    }
    expected += p
        .compute_regularization_residuals(0, &estimate)
        .unwrap()
        .iter()
        .map(|r| r * r)
        .sum::<f64>();

    let objective = p.compute_objective_function(0, &estimate, None).unwrap();
    assert!((objective - expected).abs() < 1e-12 * expected.max(1.0));
}

#[test]
fn test_analytic_gradient_matches_numerical() {
    let model = model(&[(0, 0), (1, 1), (-1, 0), (0, -1), (1, -1)]);
    let truth = gradient_image(HR_SIZE);
    let frames = simulate_low_res_frames(&truth, &model, 5).unwrap();
    let mut p = processor(&model, &frames, 0.02);
    let x = perturbed(&truth);
    p.update_irls_weights(0, &x).unwrap();

    let cost = MapCostFunction::new(&p, 0);
    assert_eq!(cost.num_parameters(), 24);
    let mut analytic = vec![0.0; 24];
    cost.evaluate(&x, Some(&mut analytic)).unwrap();
    let numeric = numerical_gradient(&cost, &x).unwrap();

    for (i, (a, n)) in analytic.iter().zip(&numeric).enumerate() {
        assert!(
            (a - n).abs() < 1e-5 * a.abs().max(1.0),
            "pixel {i}: analytic {a}, numeric {n}"
        );
    }
}

#[test]
fn test_regularization_derivatives_scale_with_lambda() {
    let model = model(&[(0, 0)]);
    let truth = gradient_image(HR_SIZE);
    let frames = simulate_low_res_frames(&truth, &model, 1).unwrap();
    let x = perturbed(&truth);

    let small = processor(&model, &frames, 0.1);
    let large = processor(&model, &frames, 0.4);
    let d_small = small.compute_regularization_derivatives(0, &x).unwrap();
    let d_large = large.compute_regularization_derivatives(0, &x).unwrap();
    for (s, l) in d_small.iter().zip(&d_large) {
        assert!((4.0 * s - l).abs() < 1e-12 * l.abs().max(1.0));
    }
}

#[test]
fn test_zero_lambda_ignores_prior() {
    let model = model(&[(0, 0), (1, 0)]);
    let truth = gradient_image(HR_SIZE);
    let frames = simulate_low_res_frames(&truth, &model, 2).unwrap();
    let p = processor(&model, &frames, 0.0);
    let x = perturbed(&truth);

    let reg = p.compute_regularization_residuals(0, &x).unwrap();
    assert!(reg.iter().all(|&r| r == 0.0));

    let data: f64 = (0..2)
        .map(|k| {
            p.compute_data_term_residuals(k, 0, &x)
                .unwrap()
                .iter()
                .map(|r| r * r)
                .sum::<f64>()
        })
        .sum();
    let objective = p.compute_objective_function(0, &x, None).unwrap();
    assert!((objective - data).abs() < 1e-12);
}

#[test]
fn test_gradient_buffer_length_checked() {
    let model = model(&[(0, 0)]);
    let frames = vec![ImageData::zeros(ImageSize::new(3, 2), 1)];
    let p = processor(&model, &frames, 0.1);
    let mut short = vec![0.0; 3];
    assert!(p
        .compute_objective_function(0, &vec![0.0; 24], Some(&mut short))
        .is_err());
}
