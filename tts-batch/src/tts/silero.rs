//! Silero TTS backend using PyO3 to embed Python.
//!
//! Loads `snakers4/silero-models` through `torch.hub` once and keeps the
//! model for every segment of the batch.

use super::{SynthesisOptions, Synthesizer};
use crate::config::TtsBatchConfig;
use crate::error::SynthesisError;
use anyhow::{Context, Result};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

const HUB_REPO: &str = "snakers4/silero-models";
const HUB_MODEL: &str = "silero_tts";

/// Silero TTS backend using PyO3.
pub struct SileroBackend {
    /// Loaded `torch.nn.Module`
    model: Py<PyAny>,
    /// Display name with the device the model was moved to, e.g. `silero/cuda`
    name: String,
}

impl SileroBackend {
    /// Load the model described by `settings` onto its device.
    pub fn load(settings: &TtsBatchConfig) -> Result<Self> {
        pyo3::prepare_freethreaded_python();

        Python::with_gil(|py| {
            let torch = py.import("torch").context("Failed to import torch")?;

            // https://github.com/snakers4/silero-models/issues/183
            torch
                .getattr("_C")?
                .call_method1("_jit_set_profiling_mode", (false,))?;

            let device = Self::resolve_device(&torch, &settings.device)?;
            torch.call_method1("set_num_threads", (settings.threads,))?;

            let kwargs = PyDict::new(py);
            kwargs.set_item("repo_or_dir", HUB_REPO)?;
            kwargs.set_item("model", HUB_MODEL)?;
            kwargs.set_item("language", &settings.language)?;
            kwargs.set_item("speaker", &settings.model_id)?;
            let loaded = torch
                .getattr("hub")?
                .call_method("load", (), Some(&kwargs))
                .with_context(|| format!("Failed to load Silero model {}", settings.model_id))?;
            let model = loaded.get_item(0)?;

            let torch_device = if device == "cuda" {
                torch.call_method1("device", ("cuda", 0))?
            } else {
                torch.call_method1("device", (device.as_str(),))?
            };
            model.call_method1("to", (torch_device,))?;

            if device == "cuda" {
                torch.getattr("cuda")?.call_method0("synchronize")?;
            }

            log::info!("Silero model {} loaded on {}", settings.model_id, device);
            Ok(Self {
                model: model.unbind(),
                name: format!("silero/{}", device),
            })
        })
    }

    /// Map the configured device (auto, cuda, cpu, ...) to the one actually used.
    fn resolve_device(torch: &Bound<'_, PyModule>, requested: &str) -> Result<String> {
        let cuda_available: bool = torch
            .getattr("cuda")?
            .call_method0("is_available")?
            .extract()?;

        let device = match requested {
            "auto" if cuda_available => "cuda",
            "auto" => "cpu",
            other => other,
        };
        Ok(device.to_string())
    }
}

/// `ValueError` means the model rejected the text; `RuntimeError` is what
/// torch raises when the input produces tensors beyond the model's size.
fn classify(py: Python<'_>, err: PyErr, chars: usize) -> SynthesisError {
    let message = err.to_string();
    if err.is_instance_of::<PyValueError>(py) {
        SynthesisError::InvalidText(message)
    } else if err.is_instance_of::<PyRuntimeError>(py) {
        SynthesisError::TooLong { chars, message }
    } else {
        SynthesisError::Backend(message)
    }
}

impl Synthesizer for SileroBackend {
    fn synthesize(
        &self,
        text: &str,
        voice: &str,
        options: &SynthesisOptions,
    ) -> Result<Vec<f32>, SynthesisError> {
        let chars = text.chars().count();

        Python::with_gil(|py| {
            let kwargs = PyDict::new(py);
            let prepared: PyResult<()> = (|| {
                kwargs.set_item("text", text)?;
                kwargs.set_item("speaker", voice)?;
                kwargs.set_item("sample_rate", options.sample_rate)?;
                kwargs.set_item("put_accent", options.put_accent)?;
                kwargs.set_item("put_yo", options.put_yo)?;
                Ok(())
            })();
            prepared.map_err(|e| SynthesisError::Backend(e.to_string()))?;

            let audio = self
                .model
                .bind(py)
                .call_method("apply_tts", (), Some(&kwargs))
                .map_err(|e| classify(py, e, chars))?;

            audio
                .call_method0("cpu")
                .and_then(|cpu| cpu.call_method0("tolist"))
                .and_then(|list| list.extract::<Vec<f32>>())
                .map_err(|e| SynthesisError::Backend(e.to_string()))
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
