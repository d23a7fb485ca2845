//! Command-line inspection of curvegraph documents.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use curvegraph::LibraryError;
use curvegraph::animation::sample_shared;
use curvegraph::document::Document;
use log::info;
use uuid::Uuid;

/// Upper bound on rows printed per input by `sample`.
const MAX_SAMPLES: u64 = 1_000_000;

#[derive(Parser)]
#[command(name = "curvegraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize children, connections, animation and layers
    Inspect {
        /// Path to the document JSON
        file: PathBuf,
    },

    /// Print stored curve values over a time range
    Sample {
        /// Path to the document JSON
        file: PathBuf,

        #[arg(long, default_value_t = 0.0)]
        from: f64,

        #[arg(long, default_value_t = 1.0)]
        to: f64,

        #[arg(long, default_value_t = 0.1)]
        step: f64,

        /// Only sample inputs of this instance
        #[arg(short, long)]
        instance: Option<Uuid>,
    },
}

fn main() -> Result<(), LibraryError> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Inspect { file } => inspect(&Document::load_from_file(&file)?),
        Commands::Sample {
            file,
            from,
            to,
            step,
            instance,
        } => {
            let steps = sample_steps(from, to, step)?;
            sample(&Document::load_from_file(&file)?, from, step, steps, instance)
        }
    }
}

fn inspect(document: &Document) -> Result<(), LibraryError> {
    println!("{} ({})", document.name, document.id);

    println!("Children: {}", document.children.len());
    for child in &document.children {
        println!(
            "  {} {} {}",
            child.id,
            child.operator_id,
            child.name.as_deref().unwrap_or("")
        );
    }

    println!("Connections: {}", document.connections.len());
    for connection in &document.connections {
        println!(
            "  {}.{} -> {}.{}",
            connection.source_instance_id,
            connection.source_slot_id,
            connection.target_instance_id,
            connection.target_slot_id
        );
    }

    let bound = document.animator.bound_inputs();
    println!("Animated inputs: {}", bound.len());
    for (instance_id, input_id) in bound {
        let curves = document.animator.curves_for_id(instance_id, input_id);
        let key_counts: Vec<usize> = curves
            .iter()
            .map(|curve| curve.read().map(|curve| curve.len()).unwrap_or(0))
            .collect();
        println!("  {}.{} keys {:?}", instance_id, input_id, key_counts);
    }

    println!("Layers: {}", document.layers.len());
    for layer in &document.layers {
        println!("  {} ({} clips)", layer.name, layer.clips.len());
        for clip in &layer.clips {
            println!("    {} [{}, {})", clip.name, clip.start_time, clip.end_time);
        }
    }
    Ok(())
}

/// Number of steps after `from` for `sample`, rejecting ranges it cannot walk.
fn sample_steps(from: f64, to: f64, step: f64) -> Result<u64, LibraryError> {
    if step.is_nan() || step <= 0.0 {
        return Err(LibraryError::InvalidArgument(format!(
            "step must be positive, got {}",
            step
        )));
    }
    if !from.is_finite() || !to.is_finite() {
        return Err(LibraryError::InvalidArgument(format!(
            "time range must be finite, got {} to {}",
            from, to
        )));
    }
    let steps = ((to - from) / step).floor().max(0.0);
    if steps >= MAX_SAMPLES as f64 {
        return Err(LibraryError::InvalidArgument(format!(
            "{} to {} by {} exceeds {} samples",
            from, to, step, MAX_SAMPLES
        )));
    }
    Ok(steps as u64)
}

fn sample(
    document: &Document,
    from: f64,
    step: f64,
    steps: u64,
    instance: Option<Uuid>,
) -> Result<(), LibraryError> {
    let inputs: Vec<(Uuid, Uuid)> = document
        .animator
        .bound_inputs()
        .into_iter()
        .filter(|(instance_id, _)| instance.is_none_or(|wanted| wanted == *instance_id))
        .collect();
    info!(
        "Sampling {} input(s) from {} in {} step(s) of {}",
        inputs.len(),
        from,
        steps,
        step
    );

    for (instance_id, input_id) in inputs {
        println!("{}.{}", instance_id, input_id);
        let curves = document.animator.curves_for_id(instance_id, input_id);
        for i in 0..=steps {
            let time = from + i as f64 * step;
            let values: Vec<String> = curves
                .iter()
                .map(|curve| format!("{:.4}", sample_shared(curve, time)))
                .collect();
            println!("  {:.4}\t{}", time, values.join("\t"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_steps_covers_the_range() {
        assert_eq!(sample_steps(0.0, 1.0, 0.25).unwrap(), 4);
        assert_eq!(sample_steps(2.0, 1.0, 0.5).unwrap(), 0);
    }

    #[test]
    fn sample_steps_rejects_unbounded_ranges() {
        for (from, to, step) in [
            (0.0, f64::INFINITY, 1.0),
            (f64::NAN, 1.0, 1.0),
            (0.0, 1.0, 0.0),
            (0.0, 1e12, 1e-3),
        ] {
            let err = sample_steps(from, to, step).unwrap_err();
            assert!(matches!(err, LibraryError::InvalidArgument(_)));
        }
    }
}
