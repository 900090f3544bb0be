use std::path::PathBuf;
use std::time::Instant;

use voice101::{
    engines::xtts::{Device, XttsEngine, XttsModelParamsBuilder},
    SynthesisEngine,
};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let reference = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("presets/sample.wav"));

    let params = XttsModelParamsBuilder::default()
        .device(Device::Cpu)
        .language("en")
        .build()?;

    let mut engine = XttsEngine::new();

    let load_start = Instant::now();
    engine.load_model_with_params(params)?;
    println!("Model loaded in {:.2?}", load_start.elapsed());

    let text = "Hello! This voice was cloned from a few seconds of reference audio.";

    let synth_start = Instant::now();
    let result = engine.synthesize_to_file(text, &reference, &PathBuf::from("output.wav"))?;
    let synth_dur = synth_start.elapsed();

    let speedup = result.duration_secs() / synth_dur.as_secs_f64();
    println!(
        "Synthesized {:.2}s audio in {:.2?} ({:.1}x real-time)",
        result.duration_secs(),
        synth_dur,
        speedup
    );
    println!("Saved to output.wav");

    engine.unload_model();
    Ok(())
}
