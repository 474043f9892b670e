//! Training launch builder
//!
//! Builds the shell program that launches a training run on the node: the
//! program activates the preconfigured virtualenv, waits for the GPU to
//! come up, exports every hyperparameter as an environment variable with a
//! default fallback (so the remote entry point can also be invoked manually
//! with overrides), runs the trainer under a wall-clock bound, and, when
//! auto-shutdown is enabled, powers the node off whatever the exit class,
//! logging a distinct reason per exit class.
//!
//! Hyperparameter defaults are organized as mode presets: a small table of
//! per-mode overrides over one base configuration. Unknown modes fall back
//! to mode 1.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::batch::CommandBatch;
use crate::error::{BatchError, Result};

/// Flat training configuration, merged over a mode preset.
///
/// Field names follow the environment variables the remote trainer reads,
/// so a request body is the same shape as the exported environment.
/// Unrecognized keys are kept in `extra` and echoed back to the caller
/// rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TrainingConfig {
    pub batch_size: u32,
    pub mixed_precision: u8,
    pub gpu_optimized: u8,
    pub lstm_layers: u32,
    pub lstm_units: u32,
    pub dense_units: u32,
    pub dropout_rnn: f64,
    pub dropout_dense: f64,
    pub l2_reg: f64,
    pub early_stopping_patience: u32,
    pub early_stopping_min_delta: f64,
    pub epochs: u32,
    pub data_augmentation: u8,
    pub remove_duplicates: u8,
    pub augmentation_factor: u32,
    pub train_split: f64,
    pub val_split: f64,
    pub test_split: f64,
    pub training_mode: String,
    pub restricted_labels: Vec<String>,
    pub max_samples_per_label: u32,
    pub auto_shutdown_enabled: bool,
    pub cleanup_csv_enabled: bool,
    /// Caller-supplied keys outside the known set, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for TrainingConfig {
    /// Mode 1: the baseline preset
    fn default() -> Self {
        Self {
            batch_size: 512,
            mixed_precision: 0,
            gpu_optimized: 1,
            lstm_layers: 2,
            lstm_units: 16,
            dense_units: 64,
            dropout_rnn: 0.5,
            dropout_dense: 0.6,
            l2_reg: 0.01,
            early_stopping_patience: 8,
            early_stopping_min_delta: 0.001,
            epochs: 600,
            data_augmentation: 1,
            remove_duplicates: 1,
            augmentation_factor: 2,
            train_split: 0.6,
            val_split: 0.2,
            test_split: 0.2,
            training_mode: "1".to_string(),
            restricted_labels: Vec::new(),
            max_samples_per_label: 0,
            auto_shutdown_enabled: false,
            cleanup_csv_enabled: false,
            extra: BTreeMap::new(),
        }
    }
}

/// Preset hyperparameter table keyed by training mode.
///
/// Presets are field overrides over the mode-1 baseline; an unknown mode
/// falls back to mode 1 rather than failing.
pub fn mode_defaults(mode: u64) -> TrainingConfig {
    let base = TrainingConfig::default();
    match mode {
        // Fast iteration: small epochs, early stop quickly
        2 => TrainingConfig {
            batch_size: 256,
            epochs: 150,
            early_stopping_patience: 4,
            training_mode: "2".to_string(),
            ..base
        },
        // High capacity: wider layers, mixed precision, longer run
        3 => TrainingConfig {
            lstm_units: 64,
            dense_units: 128,
            dropout_rnn: 0.4,
            dropout_dense: 0.5,
            mixed_precision: 1,
            epochs: 800,
            training_mode: "3".to_string(),
            ..base
        },
        // Regularization sweep: heavier dropout and weight decay
        4 => TrainingConfig {
            l2_reg: 0.05,
            dropout_rnn: 0.6,
            dropout_dense: 0.7,
            augmentation_factor: 3,
            training_mode: "4".to_string(),
            ..base
        },
        _ => base,
    }
}

/// Merge a caller-supplied request body over the defaults for its mode.
///
/// The body's `mode` key (number or numeric string) selects the preset;
/// every other key overlays the preset field by field. Unspecified defaults
/// are never dropped, and unrecognized keys pass through into
/// [`TrainingConfig::extra`].
pub fn merge_request(body: Option<&Value>) -> Result<TrainingConfig> {
    let body = match body {
        None | Some(Value::Null) => return Ok(TrainingConfig::default()),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(BatchError::ConfigValidation(format!(
                "request body must be a JSON object, got {}",
                json_type_name(other)
            )))
        }
    };

    let mode = body
        .get("mode")
        .and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
        .unwrap_or(1);

    let defaults = serde_json::to_value(mode_defaults(mode))
        .map_err(|e| BatchError::ConfigValidation(e.to_string()))?;
    let mut merged = match defaults {
        Value::Object(map) => map,
        _ => {
            return Err(BatchError::ConfigValidation(
                "default configuration is not a JSON object".to_string(),
            ))
        }
    };
    for (key, value) in body {
        if key == "mode" {
            continue;
        }
        merged.insert(key.clone(), value.clone());
    }

    serde_json::from_value(Value::Object(merged))
        .map_err(|e| BatchError::ConfigValidation(e.to_string()))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Remote-side layout and bounds for the generated training program.
#[derive(Debug, Clone)]
pub struct TrainingScript {
    /// Directory holding the trainer checkout and its virtualenv
    pub work_dir: String,
    /// Log file the run's output is redirected to
    pub log_path: String,
    /// Trainer entry point, run from `work_dir`
    pub entry_point: String,
    /// Account the trainer runs as
    pub run_as: String,
    /// Wall-clock bound on the training invocation, in seconds
    pub wall_clock_secs: u64,
}

impl Default for TrainingScript {
    fn default() -> Self {
        Self {
            work_dir: "/home/ubuntu/trainer".to_string(),
            log_path: "/home/ubuntu/train.log".to_string(),
            entry_point: "run_training.py".to_string(),
            run_as: "ubuntu".to_string(),
            wall_clock_secs: 7200,
        }
    }
}

impl TrainingScript {
    /// Set the trainer working directory
    pub fn with_work_dir(mut self, work_dir: impl Into<String>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Set the wall-clock bound
    pub fn with_wall_clock_secs(mut self, secs: u64) -> Self {
        self.wall_clock_secs = secs;
        self
    }

    /// Generate the training program for a merged configuration.
    ///
    /// Deterministic: identical configs yield byte-identical batches.
    pub fn build(&self, cfg: &TrainingConfig) -> CommandBatch {
        let mut batch = CommandBatch::new();

        batch.push("#!/bin/bash");
        batch.push("set -euo pipefail");
        batch.push("echo \"=== launching training job ===\"");

        // Inner script, written to disk and run as the trainer account so
        // the run detaches from the channel agent's environment.
        batch.push("cat <<'EOSUB' > /tmp/run_training_job.sh");
        batch.push("#!/usr/bin/env bash");
        batch.push("set -euo pipefail");
        batch.push(format!(": > {}", self.log_path));
        batch.push(format!("exec > {} 2>&1", self.log_path));
        batch.push("echo \"[train] start $(date -Iseconds)\"");
        batch.push(format!("cd {}", self.work_dir));
        batch.push("if [ -f ~/.profile ]; then set +u; source ~/.profile || true; set -u; fi");
        batch.push("source venv/bin/activate || { echo \"virtualenv missing\"; exit 1; }");
        batch.push(
            "for i in {1..12}; do if nvidia-smi > /dev/null 2>&1; then echo \"GPU ready\"; \
             break; fi; echo \"waiting for GPU...\"; sleep 5; done",
        );
        batch.push("nvidia-smi || true");
        batch.push("export CUDA_VISIBLE_DEVICES=0");
        batch.push("export TF_FORCE_GPU_ALLOW_GROWTH=true");

        for line in self.export_lines(cfg) {
            batch.push(line);
        }

        batch.push("EXIT_CODE=0");
        batch.push("set +e");
        batch.push(format!(
            "timeout {} python {}",
            self.wall_clock_secs, self.entry_point
        ));
        batch.push("EXIT_CODE=$?");
        batch.push("set -e");
        batch.push("if [ -n \"${VIRTUAL_ENV:-}\" ]; then deactivate || true; fi");
        batch.push("echo \"[train] finished with code $EXIT_CODE\"");

        // Shutdown is unconditional once enabled; only the logged reason
        // distinguishes the exit classes.
        batch.push("if [ \"${AUTO_SHUTDOWN:-0}\" = \"1\" ]; then");
        batch.push("  if [ \"$EXIT_CODE\" -eq 0 ]; then");
        batch.push("    echo \"[train] shutting down: training succeeded\"");
        batch.push("  elif [ \"$EXIT_CODE\" -eq 124 ]; then");
        batch.push("    echo \"[train] shutting down: wall-clock limit reached\"");
        batch.push("  else");
        batch.push("    echo \"[train] shutting down: fatal error (exit $EXIT_CODE)\"");
        batch.push("  fi");
        batch.push("  sudo shutdown -h now");
        batch.push("fi");
        batch.push("exit $EXIT_CODE");
        batch.push("EOSUB");

        batch.push("chmod +x /tmp/run_training_job.sh");
        batch.push(format!(
            "sudo -iu {} bash -lc /tmp/run_training_job.sh",
            self.run_as
        ));

        batch
    }

    /// Environment exports, one per configuration field, each overridable
    /// from the caller's environment via `${NAME:-default}`.
    fn export_lines(&self, cfg: &TrainingConfig) -> Vec<String> {
        let labels_json = serde_json::to_string(&cfg.restricted_labels)
            .unwrap_or_else(|_| "[]".to_string());

        vec![
            export_with_default("BATCH_SIZE", cfg.batch_size),
            export_with_default("MIXED_PRECISION", cfg.mixed_precision),
            export_with_default("GPU_OPTIMIZED", cfg.gpu_optimized),
            export_with_default("LSTM_LAYERS", cfg.lstm_layers),
            export_with_default("LSTM_UNITS", cfg.lstm_units),
            export_with_default("DENSE_UNITS", cfg.dense_units),
            export_with_default("DROPOUT_RNN", cfg.dropout_rnn),
            export_with_default("DROPOUT_DENSE", cfg.dropout_dense),
            export_with_default("L2_REG", cfg.l2_reg),
            export_with_default("EARLY_STOPPING_PATIENCE", cfg.early_stopping_patience),
            export_with_default("EARLY_STOPPING_MIN_DELTA", cfg.early_stopping_min_delta),
            export_with_default("EPOCHS", cfg.epochs),
            export_with_default("DATA_AUGMENTATION", cfg.data_augmentation),
            export_with_default("REMOVE_DUPLICATES", cfg.remove_duplicates),
            export_with_default("AUGMENTATION_FACTOR", cfg.augmentation_factor),
            export_with_default("TRAIN_SPLIT", cfg.train_split),
            export_with_default("VAL_SPLIT", cfg.val_split),
            export_with_default("TEST_SPLIT", cfg.test_split),
            export_with_default("AUTO_SHUTDOWN", flag(cfg.auto_shutdown_enabled)),
            export_with_default("CLEANUP_CSV", flag(cfg.cleanup_csv_enabled)),
            export_with_default("TRAINING_MODE", &cfg.training_mode),
            format!("export RESTRICTED_LABELS=${{RESTRICTED_LABELS:-'{}'}}", labels_json),
            export_with_default("MAX_SAMPLES_PER_LABEL", cfg.max_samples_per_label),
        ]
    }
}

fn export_with_default(name: &str, value: impl fmt::Display) -> String {
    format!("export {name}=${{{name}:-{value}}}")
}

fn flag(enabled: bool) -> u8 {
    if enabled {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_is_deterministic() {
        let cfg = mode_defaults(3);
        let script = TrainingScript::default();
        assert_eq!(script.build(&cfg).joined(), script.build(&cfg).joined());
    }

    #[test]
    fn test_merge_keeps_unspecified_defaults() {
        let body = serde_json::json!({ "BATCH_SIZE": 64 });
        let cfg = merge_request(Some(&body)).unwrap();

        assert_eq!(cfg.batch_size, 64);
        // Everything else stays at the mode-1 baseline
        assert_eq!(cfg.epochs, 600);
        assert_eq!(cfg.lstm_units, 16);
        assert_eq!(cfg.train_split, 0.6);
    }

    #[test]
    fn test_mode_selects_preset() {
        let body = serde_json::json!({ "mode": 3 });
        let cfg = merge_request(Some(&body)).unwrap();

        assert_eq!(cfg.lstm_units, 64);
        assert_eq!(cfg.mixed_precision, 1);
        assert_eq!(cfg.training_mode, "3");
    }

    #[test]
    fn test_unknown_mode_falls_back_to_baseline() {
        let body = serde_json::json!({ "mode": 99 });
        let cfg = merge_request(Some(&body)).unwrap();
        assert_eq!(cfg, TrainingConfig::default());
    }

    #[test]
    fn test_mode_accepts_numeric_string() {
        let body = serde_json::json!({ "mode": "2" });
        let cfg = merge_request(Some(&body)).unwrap();
        assert_eq!(cfg.epochs, 150);
    }

    #[test]
    fn test_body_overrides_preset() {
        let body = serde_json::json!({ "mode": 3, "LSTM_UNITS": 32 });
        let cfg = merge_request(Some(&body)).unwrap();
        assert_eq!(cfg.lstm_units, 32);
        assert_eq!(cfg.dense_units, 128);
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let body = serde_json::json!({ "GPU_WARMUP": 1, "BATCH_SIZE": 128 });
        let cfg = merge_request(Some(&body)).unwrap();

        assert_eq!(cfg.batch_size, 128);
        assert_eq!(cfg.extra.get("GPU_WARMUP"), Some(&serde_json::json!(1)));
    }

    #[test]
    fn test_wrong_typed_field_rejected() {
        let body = serde_json::json!({ "BATCH_SIZE": "lots" });
        let err = merge_request(Some(&body)).unwrap_err();
        assert!(matches!(err, BatchError::ConfigValidation(_)));
    }

    #[test]
    fn test_non_object_body_rejected() {
        let body = serde_json::json!([1, 2, 3]);
        let err = merge_request(Some(&body)).unwrap_err();
        assert!(matches!(err, BatchError::ConfigValidation(_)));
    }

    #[test]
    fn test_missing_body_yields_baseline() {
        assert_eq!(merge_request(None).unwrap(), TrainingConfig::default());
    }

    #[test]
    fn test_exports_carry_override_fallbacks() {
        let program = TrainingScript::default().build(&TrainingConfig::default()).joined();

        assert!(program.contains("export BATCH_SIZE=${BATCH_SIZE:-512}"));
        assert!(program.contains("export DROPOUT_RNN=${DROPOUT_RNN:-0.5}"));
        assert!(program.contains("export TRAINING_MODE=${TRAINING_MODE:-1}"));
        assert!(program.contains("export AUTO_SHUTDOWN=${AUTO_SHUTDOWN:-0}"));
    }

    #[test]
    fn test_auto_shutdown_toggle() {
        let mut cfg = TrainingConfig::default();
        cfg.auto_shutdown_enabled = true;
        let program = TrainingScript::default().build(&cfg).joined();

        assert!(program.contains("export AUTO_SHUTDOWN=${AUTO_SHUTDOWN:-1}"));
        // Shutdown happens for every exit class, with a distinct reason
        assert!(program.contains("shutting down: training succeeded"));
        assert!(program.contains("shutting down: wall-clock limit reached"));
        assert!(program.contains("shutting down: fatal error"));
    }

    #[test]
    fn test_restricted_labels_exported_as_json() {
        let mut cfg = TrainingConfig::default();
        cfg.restricted_labels = vec!["agua".to_string(), "hola".to_string()];
        let program = TrainingScript::default().build(&cfg).joined();

        assert!(program
            .contains("export RESTRICTED_LABELS=${RESTRICTED_LABELS:-'[\"agua\",\"hola\"]'}"));
    }

    #[test]
    fn test_script_structure() {
        let script = TrainingScript::default();
        let program = script.build(&TrainingConfig::default()).joined();

        assert!(program.starts_with("#!/bin/bash"));
        assert!(program.contains("timeout 7200 python run_training.py"));
        assert!(program.contains("sudo -iu ubuntu bash -lc /tmp/run_training_job.sh"));
        // Heredoc opens and closes
        assert_eq!(program.matches("EOSUB").count(), 2);
    }

    #[test]
    fn test_wall_clock_override() {
        let script = TrainingScript::default().with_wall_clock_secs(60);
        let program = script.build(&TrainingConfig::default()).joined();
        assert!(program.contains("timeout 60 python run_training.py"));
    }
}
