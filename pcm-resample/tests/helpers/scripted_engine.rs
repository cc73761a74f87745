//! Scripted conversion engine
//!
//! Lets tests dictate exactly how many frames the engine reads and writes on
//! each call, inject engine failures, and inspect the calls the adapter made
//! after the engine has been moved into a resampler.

use pcm_resample::{ConversionEngine, EngineSpec, Error, Processed, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// One engine call as seen by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub frames_in: usize,
    pub capacity: usize,
    pub last: bool,
}

/// Everything the adapter did to the engine
#[derive(Debug, Default)]
pub struct EngineLog {
    pub calls: Vec<Call>,
    pub clears: usize,
    pub drops: usize,
}

impl EngineLog {
    pub fn shared() -> Rc<RefCell<EngineLog>> {
        Rc::new(RefCell::new(EngineLog::default()))
    }

    /// Calls made with no input (drain calls)
    pub fn drain_calls(&self) -> usize {
        self.calls.iter().filter(|c| c.frames_in == 0).count()
    }
}

/// Scripted response for one `process` call
#[derive(Debug, Clone)]
pub enum Step {
    /// Report `read` input frames and return `written` frames of output
    Respond { read: usize, written: usize },
    /// Fail with an engine error
    Fail(String),
}

/// Engine returning scripted responses.
///
/// With an empty script, input calls read everything and return
/// `min(frames_in, capacity)` frames; drain calls return nothing.
pub struct ScriptedEngine {
    frame_size: usize,
    script: VecDeque<Step>,
    log: Rc<RefCell<EngineLog>>,
}

impl ScriptedEngine {
    pub fn new(spec: &EngineSpec, log: Rc<RefCell<EngineLog>>) -> Self {
        Self {
            frame_size: spec.frame_size(),
            script: VecDeque::new(),
            log,
        }
    }

    pub fn with_script(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.script.extend(steps);
        self
    }

    fn frames(&self, count: usize) -> Vec<u8> {
        vec![0x5A; count * self.frame_size]
    }
}

impl ConversionEngine for ScriptedEngine {
    fn process(
        &mut self,
        _input: Option<&[u8]>,
        frames_in: usize,
        capacity: usize,
        last: bool,
    ) -> Result<Processed> {
        self.log.borrow_mut().calls.push(Call {
            frames_in,
            capacity,
            last,
        });

        match self.script.pop_front() {
            Some(Step::Respond { read, written }) => Ok(Processed {
                output: self.frames(written),
                frames_read: read,
                frames_written: written,
            }),
            Some(Step::Fail(message)) => Err(Error::Engine(message)),
            None => {
                let written = frames_in.min(capacity);
                Ok(Processed {
                    output: self.frames(written),
                    frames_read: frames_in,
                    frames_written: written,
                })
            }
        }
    }

    fn clear(&mut self) {
        self.log.borrow_mut().clears += 1;
    }
}

impl Drop for ScriptedEngine {
    fn drop(&mut self) {
        self.log.borrow_mut().drops += 1;
    }
}
