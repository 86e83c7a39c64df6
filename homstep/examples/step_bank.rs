use homstep::probe::probe;
use homstep::tracked::{TrackedEncoder, TrackedEvaluator};
use homstep::{ApproxConfigBuilder, NoiseCapacity, StepApproximator, StepInputs, StepSeries, SLOT_DEPTH};
use tracing_forest::util::LevelFilter;
use tracing_forest::ForestLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

fn main() -> anyhow::Result<()> {
	let env_filter = EnvFilter::builder()
		.with_default_directive(LevelFilter::DEBUG.into())
		.from_env_lossy();

	Registry::default()
		.with(env_filter)
		.with(ForestLayer::default())
		.try_init()
		.ok();

	println!("Example: step bank for thresholds [2, 6] with 4 harmonics");

	let config = ApproxConfigBuilder::new()
		.set_degree(4)
		.set_slot_count(16)
		.build()?;

	// Stand-in for a scheme with ten levels and a 2^-40 fixed-point encoder.
	let evaluator = TrackedEvaluator::new(SLOT_DEPTH);
	let encoder = TrackedEncoder::with_scale_bits(40);

	let approximator = StepApproximator::new(config, NoiseCapacity::levels(SLOT_DEPTH), &encoder)?;
	let plan = approximator.plan();
	println!(
		"Depth per slot: {}, multiplications: {}",
		plan.slot_depth,
		plan.total.multiplications()
	);

	let b1 = evaluator.encrypt(2.0);
	let b2 = evaluator.encrypt(6.0);
	let amplitude = evaluator.encrypt(1.0);

	let bank = approximator.evaluate(
		&evaluator,
		StepInputs {
			b1: &b1,
			b2: &b2,
			amplitude: &amplitude,
		},
	)?;

	let expected = approximator.plain_bank(2.0, 6.0, 1.0);
	let series = StepSeries::new(2.0, 6.0, config.degree)?;

	for (i, ct) in bank.iter().enumerate() {
		let inspection = probe(&evaluator, &format!("slot {}", i), ct)?;
		println!(
			"slot {:2}: {:>10.6} (plain circuit {:>10.6}, exact series {:>8.4}, budget {})",
			i,
			inspection.value,
			expected[i],
			series.evaluate(i as f64),
			inspection.noise_budget
		);
	}

	Ok(())
}
