//! Scripted engine for tests and local development.
//!
//! Jobs are scripted per target path: frame count, an optional failure
//! point, and a per-frame delay for exercising concurrent pollers. The
//! engine records the order in which jobs were begun so scheduler tests
//! can assert priority-then-sequence execution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fswap_models::JobInput;

use crate::engine::{SwapEngine, TransformOutput, TransformSession, UnitProgress};
use crate::error::{EngineError, EngineResult};

/// Marker bytes that make `probe_faces` report no face.
pub const NO_FACE_IMAGE: &[u8] = b"no-face";

/// Script for one fake job.
#[derive(Debug, Clone)]
pub struct ScriptedJob {
    /// Units the session will process
    pub frames: u64,
    /// Report the total upfront, or 0 as for an unprobeable container
    pub total_known: bool,
    /// Fail `begin` with an open error
    pub fail_open: bool,
    /// Fail the unit at this zero-based index
    pub fail_at_frame: Option<u64>,
    /// Sleep per unit, to give pollers something to observe
    pub frame_delay: Duration,
    /// Result extension (".mp4" or ".jpg")
    pub extension: String,
}

impl Default for ScriptedJob {
    fn default() -> Self {
        Self {
            frames: 2,
            total_known: true,
            fail_open: false,
            fail_at_frame: None,
            frame_delay: Duration::ZERO,
            extension: ".mp4".to_string(),
        }
    }
}

impl ScriptedJob {
    pub fn with_frames(frames: u64) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }
}

/// `SwapEngine` driven by per-path scripts. Unscripted paths run a
/// two-frame default, which is what the dev-mode binary relies on.
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    scripts: Arc<Mutex<HashMap<PathBuf, ScriptedJob>>>,
    begun: Arc<Mutex<Vec<PathBuf>>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the script for a target path.
    pub fn script(&self, target: impl Into<PathBuf>, job: ScriptedJob) {
        self.scripts.lock().unwrap().insert(target.into(), job);
    }

    /// Target paths in the order their sessions were begun.
    pub fn begin_order(&self) -> Vec<PathBuf> {
        self.begun.lock().unwrap().clone()
    }

    fn script_for(&self, target: &Path) -> ScriptedJob {
        self.scripts
            .lock()
            .unwrap()
            .get(target)
            .cloned()
            .unwrap_or_default()
    }
}

impl SwapEngine for ScriptedEngine {
    fn probe_faces(&self, image: &[u8], label: &str, many: bool) -> EngineResult<usize> {
        if image == NO_FACE_IMAGE {
            return Err(EngineError::no_face(label));
        }
        Ok(if many { 2 } else { 1 })
    }

    fn begin(&self, input: &JobInput) -> EngineResult<Box<dyn TransformSession>> {
        let script = self.script_for(&input.target_path);
        if script.fail_open {
            return Err(EngineError::open_failed("Could not open target video"));
        }
        self.begun.lock().unwrap().push(input.target_path.clone());
        Ok(Box::new(ScriptedSession {
            script,
            next_frame: 0,
            processed: 0,
        }))
    }
}

struct ScriptedSession {
    script: ScriptedJob,
    next_frame: u64,
    processed: u64,
}

impl TransformSession for ScriptedSession {
    fn total_frames(&self) -> u64 {
        if self.script.total_known {
            self.script.frames
        } else {
            0
        }
    }

    fn advance(&mut self) -> EngineResult<UnitProgress> {
        if self.next_frame >= self.script.frames {
            return Ok(UnitProgress::Exhausted);
        }
        let index = self.next_frame;
        self.next_frame += 1;

        if !self.script.frame_delay.is_zero() {
            std::thread::sleep(self.script.frame_delay);
        }
        if self.script.fail_at_frame == Some(index) {
            return Err(EngineError::frame(index, "swap failed"));
        }
        self.processed += 1;
        Ok(UnitProgress::Processed)
    }

    fn finish(self: Box<Self>) -> EngineResult<TransformOutput> {
        Ok(TransformOutput {
            bytes: format!("result:{} frames", self.processed).into_bytes(),
            extension: self.script.extension.clone(),
        })
    }
}
