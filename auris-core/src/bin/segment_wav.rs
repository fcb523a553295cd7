#[cfg(not(feature = "onnx"))]
fn main() {
    eprintln!("segment_wav requires the 'onnx' feature");
    std::process::exit(1);
}

#[cfg(feature = "onnx")]
fn main() {
    if let Err(e) = run() {
        eprintln!("segment_wav failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(feature = "onnx")]
fn run() -> Result<(), String> {
    use auris_core::{AudioChunk, DetectorSession, SegmentConfig, SileroScorer, SAMPLE_RATE};
    use serde::Serialize;
    use std::path::{Path, PathBuf};
    use std::time::Instant;

    #[derive(Debug)]
    struct Args {
        inputs: Vec<PathBuf>,
        model: Option<PathBuf>,
        threshold: Option<f32>,
        min_silence_ms: Option<u64>,
        speech_pad_ms: Option<u64>,
        output: Option<PathBuf>,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct SegmentRow {
        start: usize,
        end: usize,
        start_secs: f64,
        end_secs: f64,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct FileReport {
        file: String,
        samples: usize,
        duration_secs: f64,
        latency_ms: f64,
        speech_secs: f64,
        segments: Vec<SegmentRow>,
    }

    fn parse_args() -> Result<Args, String> {
        let mut args = Args {
            inputs: Vec::new(),
            model: None,
            threshold: None,
            min_silence_ms: None,
            speech_pad_ms: None,
            output: None,
        };

        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--model" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --model".into());
                    };
                    args.model = Some(PathBuf::from(v));
                }
                "--threshold" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --threshold".into());
                    };
                    args.threshold = Some(
                        v.parse::<f32>()
                            .map_err(|_| "invalid value for --threshold".to_string())?,
                    );
                }
                "--min-silence-ms" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --min-silence-ms".into());
                    };
                    args.min_silence_ms = Some(
                        v.parse::<u64>()
                            .map_err(|_| "invalid value for --min-silence-ms".to_string())?,
                    );
                }
                "--speech-pad-ms" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --speech-pad-ms".into());
                    };
                    args.speech_pad_ms = Some(
                        v.parse::<u64>()
                            .map_err(|_| "invalid value for --speech-pad-ms".to_string())?,
                    );
                }
                "--output" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --output".into());
                    };
                    args.output = Some(PathBuf::from(v));
                }
                "--help" | "-h" => {
                    println!(
                        "Usage: cargo run -p auris-core --features onnx --bin segment_wav -- \\
  <file.wav | dir>... [--model <silero_vad.onnx>] [--threshold <f>] \\
  [--min-silence-ms <n>] [--speech-pad-ms <n>] [--output <report.json>]"
                    );
                    std::process::exit(0);
                }
                other if other.starts_with("--") => {
                    return Err(format!("unknown argument: {other}"));
                }
                positional => args.inputs.push(PathBuf::from(positional)),
            }
        }

        if args.inputs.is_empty() {
            return Err("no input files given (see --help)".into());
        }
        Ok(args)
    }

    fn collect_wavs(path: &Path, out: &mut Vec<PathBuf>) -> Result<(), String> {
        if path.is_dir() {
            let entries = std::fs::read_dir(path).map_err(|e| e.to_string())?;
            for entry in entries {
                let entry = entry.map_err(|e| e.to_string())?;
                collect_wavs(&entry.path(), out)?;
            }
            return Ok(());
        }
        let is_wav = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);
        if is_wav {
            out.push(path.to_path_buf());
        }
        Ok(())
    }

    fn read_wav_mono_f32(path: &Path) -> Result<(Vec<f32>, u32), String> {
        let mut reader = hound::WavReader::open(path).map_err(|e| e.to_string())?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map_err(|e| e.to_string()))
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                if spec.bits_per_sample <= 16 {
                    reader
                        .samples::<i16>()
                        .map(|s| {
                            s.map(|v| (v as f32) / (i16::MAX as f32))
                                .map_err(|e| e.to_string())
                        })
                        .collect::<Result<Vec<_>, _>>()?
                } else {
                    let max = ((1_i64 << (spec.bits_per_sample - 1)) - 1) as f32;
                    reader
                        .samples::<i32>()
                        .map(|s| s.map(|v| (v as f32) / max).map_err(|e| e.to_string()))
                        .collect::<Result<Vec<_>, _>>()?
                }
            }
        };

        if channels == 1 {
            return Ok((interleaved, spec.sample_rate));
        }

        let mut mono = Vec::with_capacity(interleaved.len() / channels);
        for frame in interleaved.chunks(channels) {
            let sum = frame.iter().copied().sum::<f32>();
            mono.push(sum / channels as f32);
        }
        Ok((mono, spec.sample_rate))
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = parse_args()?;

    let mut wav_files = Vec::new();
    for input in &args.inputs {
        if !input.exists() {
            return Err(format!("input not found: {}", input.display()));
        }
        collect_wavs(input, &mut wav_files)?;
    }
    wav_files.sort();
    if wav_files.is_empty() {
        return Err("no .wav files found in the given inputs".into());
    }

    let mut config = SegmentConfig::default();
    if let Some(threshold) = args.threshold {
        config.threshold = threshold.clamp(0.16, 0.99);
    }
    if let Some(ms) = args.min_silence_ms {
        config.min_silence_duration_ms = ms;
    }
    if let Some(ms) = args.speech_pad_ms {
        config.speech_pad_ms = ms;
    }

    let model_path = args
        .model
        .clone()
        .unwrap_or_else(SileroScorer::default_model_path);
    let scorer = SileroScorer::new(&model_path).map_err(|e| e.to_string())?;
    let mut session = DetectorSession::new(scorer);

    let mut reports = Vec::new();
    for wav in &wav_files {
        let (samples, sample_rate) = read_wav_mono_f32(wav)?;
        if sample_rate != SAMPLE_RATE {
            return Err(format!(
                "{}: sample rate {} Hz is unsupported; resample to {} Hz first",
                wav.display(),
                sample_rate,
                SAMPLE_RATE
            ));
        }

        let chunk = AudioChunk::new(samples, sample_rate);
        let started = Instant::now();
        let segments = session
            .detect_segments(&chunk, &config)
            .map_err(|e| format!("{}: {e}", wav.display()))?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let rows: Vec<SegmentRow> = segments
            .iter()
            .map(|seg| SegmentRow {
                start: seg.start,
                end: seg.end,
                start_secs: seg.start as f64 / f64::from(SAMPLE_RATE),
                end_secs: seg.end as f64 / f64::from(SAMPLE_RATE),
            })
            .collect();
        let speech_secs: f64 = rows.iter().map(|r| r.end_secs - r.start_secs).sum();

        println!(
            "{}: {} segment(s), {:.2}s speech of {:.2}s audio ({:.1} ms)",
            wav.display(),
            rows.len(),
            speech_secs,
            chunk.duration_secs(),
            latency_ms
        );

        reports.push(FileReport {
            file: wav.display().to_string(),
            samples: chunk.len(),
            duration_secs: chunk.duration_secs(),
            latency_ms,
            speech_secs,
            segments: rows,
        });
    }

    let json = serde_json::to_string_pretty(&reports).map_err(|e| e.to_string())?;
    if let Some(out) = args.output {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        std::fs::write(&out, json).map_err(|e| e.to_string())?;
        println!("Wrote segmentation report: {}", out.display());
    } else {
        println!("{json}");
    }

    Ok(())
}
