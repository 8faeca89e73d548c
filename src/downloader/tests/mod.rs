use super::test_helpers::*;
use super::*;
use crate::engine::{FormatCandidate, StreamMode, candidates_for};
use crate::error::EngineError;
use crate::types::{FormatKind, ProgressEvent, TaskStatus};
use std::sync::Arc;


/// Wrap a scripted engine so the test keeps a handle for inspection
fn scripted(steps: Vec<Step>) -> (Arc<ScriptedEngine>, Arc<dyn crate::engine::FetchEngine>) {
    let engine = Arc::new(ScriptedEngine::new(steps));
    let dynamic: Arc<dyn crate::engine::FetchEngine> = engine.clone();
    (engine, dynamic)
}

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
