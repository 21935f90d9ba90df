use std::path::Path;
use std::time::Duration;

use console::Style;
use superres_core::image_data::ImageData;
use superres_core::pipeline::ReconstructionConfig;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn row(s: &Styles, label: &str, value: impl std::fmt::Display) {
    println!("  {:<14}{}", s.label.apply_to(label), s.value.apply_to(value));
}

pub fn print_reconstruction_summary(config: &ReconstructionConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Super-Resolution"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(16)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Motion"),
        s.path.apply_to(config.motion_file.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );

    println!();
    println!("  {}", s.header.apply_to("Model"));
    let degradation = &config.degradation;
    row(&s, "Scale", format!("{}x", degradation.scale));
    if degradation.blur_sigma > 0.0 {
        row(
            &s,
            "Blur",
            format!(
                "{0}x{0} kernel, sigma {1}",
                degradation.blur_kernel_size, degradation.blur_sigma
            ),
        );
    } else {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Blur"),
            s.disabled.apply_to("disabled")
        );
    }

    println!();
    println!("  {}", s.header.apply_to("Solver"));
    let solver = &config.solver;
    row(&s, "Lambda", solver.regularization_parameter);
    row(&s, "IRLS", format!("{} iterations", solver.irls_iterations));
    row(
        &s,
        "Minimizer",
        format!(
            "conjugate gradient, {} iterations{}",
            solver.minimizer.max_iterations,
            if solver.minimizer.numerical_gradient {
                ", numerical gradient"
            } else {
                ""
            }
        ),
    );
    row(&s, "Initial", solver.initial_estimate);
    println!();
}

pub fn print_result(result: &ImageData, output: &Path, elapsed: Duration) {
    let s = Styles::new();
    println!();
    row(&s, "Result", format!("{} ({} channels)", result.size(), result.num_channels()));
    row(&s, "Elapsed", format!("{:.2}s", elapsed.as_secs_f64()));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Saved to"),
        s.path.apply_to(output.display())
    );
}
