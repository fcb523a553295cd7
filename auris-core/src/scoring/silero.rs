//! Silero VAD neural window scorer.
//!
//! Wraps the official Silero VAD v4 ONNX export published at
//! <https://github.com/snakers4/silero-vad>.
//!
//! ## Model I/O
//!
//! | Name     | Shape      | DType | Direction |
//! |----------|------------|-------|-----------|
//! | `input`  | `[1, N]`   | f32   | in        |
//! | `sr`     | `[1]`      | i64   | in        |
//! | `h`      | `[2,1,64]` | f32   | in        |
//! | `c`      | `[2,1,64]` | f32   | in        |
//! | `output` | `[1, 1]`   | f32   | out       |
//! | `hn`     | `[2,1,64]` | f32   | out       |
//! | `cn`     | `[2,1,64]` | f32   | out       |
//!
//! Unlike the GRU-based v5 export, v4 keeps hidden and cell memory as
//! separate tensors — exactly the `RecurrentState` pair a detection session
//! carries between calls. Models that do not expose the LSTM tensors are
//! rejected at load time rather than degraded to stateless scoring: a scorer
//! that forgets its context produces subtly different probabilities, which is
//! worse than a hard failure.

use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Array3};
use ort::session::builder::SessionBuilder;
use ort::session::SessionInputValue;
use ort::value::Value;
use tracing::info;

use crate::error::ScoreError;
use crate::scoring::{Scored, WindowScorer};
use crate::state::{RecurrentState, STATE_HIDDEN, STATE_LAYERS};

/// Neural window scorer backed by the Silero VAD v4 LSTM ONNX model.
pub struct SileroScorer {
    session: ort::session::Session,
    input_name: String,
    sr_name: String,
    h_name: String,
    c_name: String,
    output_name: String,
    hn_name: String,
    cn_name: String,
}

impl SileroScorer {
    /// Load the Silero VAD ONNX model from `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ScoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScoreError::ModelNotFound {
                path: path.to_path_buf(),
            });
        }

        let size_mb = std::fs::metadata(path)
            .map(|m| m.len() as f64 / 1_048_576.0)
            .unwrap_or(0.0);

        info!("=== SileroScorer startup ===");
        info!("  path: {:?}", path);
        info!("  size: {:.2} MB", size_mb);

        let session = SessionBuilder::new()
            .map_err(|e| ScoreError::OnnxSession(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| ScoreError::OnnxSession(e.to_string()))?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|outlet| outlet.name().to_string())
            .collect();
        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|outlet| outlet.name().to_string())
            .collect();

        info!("  inputs: {:?}", input_names);
        info!("  outputs: {:?}", output_names);

        let input_name = require_name(&input_names, &["input", "audio", "x"], "sample input")?;
        let sr_name = require_name(&input_names, &["sr", "sample_rate"], "sample-rate input")?;
        let h_name = require_name(&input_names, &["h", "state_h"], "hidden-state input")?;
        let c_name = require_name(&input_names, &["c", "state_c"], "cell-state input")?;
        let output_name = require_name(
            &output_names,
            &["output", "speech_prob", "prob"],
            "probability output",
        )?;
        let hn_name = require_name(&output_names, &["hn", "state_hn", "h_out"], "hidden-state output")?;
        let cn_name = require_name(&output_names, &["cn", "state_cn", "c_out"], "cell-state output")?;

        info!("=== SileroScorer ready ===");

        Ok(Self {
            session,
            input_name,
            sr_name,
            h_name,
            c_name,
            output_name,
            hn_name,
            cn_name,
        })
    }

    /// Default model location: the `AURIS_MODEL_PATH` override when set,
    /// otherwise `silero_vad.onnx` in the platform models directory.
    pub fn default_model_path() -> PathBuf {
        if let Some(explicit) = std::env::var_os("AURIS_MODEL_PATH") {
            if !explicit.is_empty() {
                return PathBuf::from(explicit);
            }
        }
        default_models_dir().join("silero_vad.onnx")
    }

    fn extract_state_tensor(
        outputs: &ort::session::SessionOutputs<'_>,
        name: &str,
    ) -> Result<Vec<f32>, ScoreError> {
        let value = outputs
            .get(name)
            .ok_or_else(|| ScoreError::MalformedOutput(format!("missing output tensor {name}")))?;
        let (_, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| ScoreError::OnnxSession(e.to_string()))?;
        Ok(data.to_vec())
    }
}

/// Platform default directory for model files.
pub fn default_models_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(|p| {
                PathBuf::from(p)
                    .join("Meridian Audio")
                    .join("Auris")
                    .join("models")
            })
            .unwrap_or_else(|| PathBuf::from("models"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("auris")
            .join("models")
    }
}

fn require_name(
    candidates: &[String],
    preferred: &[&str],
    what: &str,
) -> Result<String, ScoreError> {
    preferred
        .iter()
        .find_map(|needle| {
            candidates
                .iter()
                .find(|name| name.eq_ignore_ascii_case(needle))
                .cloned()
        })
        .ok_or_else(|| {
            ScoreError::OnnxSession(format!(
                "model exposes no {what} tensor (looked for any of {preferred:?})"
            ))
        })
}

impl WindowScorer for SileroScorer {
    fn score(
        &mut self,
        window: &[f32],
        sample_rate: u32,
        state: RecurrentState,
    ) -> Result<Scored, ScoreError> {
        let batch = state.batch_size();

        let input_arr = Array2::<f32>::from_shape_vec((1, window.len()), window.to_vec())
            .map_err(|e| ScoreError::OnnxSession(e.to_string()))?;
        let sr_arr = Array1::<i64>::from_elem(1, i64::from(sample_rate));
        let h_arr = Array3::<f32>::from_shape_vec(
            (STATE_LAYERS, batch, STATE_HIDDEN),
            state.hidden().to_vec(),
        )
        .map_err(|e| ScoreError::OnnxSession(e.to_string()))?;
        let c_arr = Array3::<f32>::from_shape_vec(
            (STATE_LAYERS, batch, STATE_HIDDEN),
            state.cell().to_vec(),
        )
        .map_err(|e| ScoreError::OnnxSession(e.to_string()))?;

        let input_val = Value::from_array(input_arr)
            .map_err(|e: ort::Error| ScoreError::OnnxSession(e.to_string()))?;
        let sr_val = Value::from_array(sr_arr)
            .map_err(|e: ort::Error| ScoreError::OnnxSession(e.to_string()))?;
        let h_val = Value::from_array(h_arr)
            .map_err(|e: ort::Error| ScoreError::OnnxSession(e.to_string()))?;
        let c_val = Value::from_array(c_arr)
            .map_err(|e: ort::Error| ScoreError::OnnxSession(e.to_string()))?;

        let input_values: Vec<(String, SessionInputValue<'_>)> = vec![
            (self.input_name.clone(), input_val.into()),
            (self.sr_name.clone(), sr_val.into()),
            (self.h_name.clone(), h_val.into()),
            (self.c_name.clone(), c_val.into()),
        ];

        let outputs = self
            .session
            .run(input_values)
            .map_err(|e| ScoreError::OnnxSession(e.to_string()))?;

        let prob_output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            ScoreError::MalformedOutput(format!("missing output tensor {}", self.output_name))
        })?;
        let (_, prob_data) = prob_output
            .try_extract_tensor::<f32>()
            .map_err(|e| ScoreError::OnnxSession(e.to_string()))?;
        let probability = prob_data
            .first()
            .copied()
            .ok_or_else(|| ScoreError::MalformedOutput("empty probability tensor".into()))?;

        let hn = Self::extract_state_tensor(&outputs, self.hn_name.as_str())?;
        let cn = Self::extract_state_tensor(&outputs, self.cn_name.as_str())?;
        let state = RecurrentState::from_parts(hn, cn, batch).ok_or_else(|| {
            ScoreError::MalformedOutput("state tensors have unexpected shape".into())
        })?;

        Ok(Scored {
            probability: probability.clamp(0.0, 1.0),
            state,
        })
    }
}
