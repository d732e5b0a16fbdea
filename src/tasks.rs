//! Closures handed from producer threads to the render thread
//!
//! Two queues share one mutex: one-shot tasks drained every frame in
//! submission order, and named per-frame callbacks that run on every frame
//! until removed.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::util::lock;
use crate::window::WindowManager;

/// One-shot work executed on the render thread with exclusive registry access
pub type Task = Box<dyn FnOnce(&mut WindowManager) + Send>;

/// Work executed on every frame (e.g. drawing extra windows)
pub type PerFrameCallback = Arc<dyn Fn(&egui::Context) + Send + Sync>;

#[derive(Default)]
struct Queues {
    one_shot: Vec<Task>,
    per_frame: BTreeMap<String, PerFrameCallback>,
}

/// Work collected for a single frame
pub struct FrameTasks {
    pub one_shot: Vec<Task>,
    pub per_frame: Vec<PerFrameCallback>,
}

/// Mutex-guarded task queues
#[derive(Default)]
pub struct TaskQueue {
    queues: Mutex<Queues>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task for the next frame
    pub fn push(&self, task: Task) {
        lock(&self.queues).one_shot.push(task);
    }

    /// Install (`Some`) or remove (`None`) a per-frame callback
    pub fn set_per_frame(&self, name: &str, callback: Option<PerFrameCallback>) {
        let mut queues = lock(&self.queues);
        match callback {
            Some(callback) => {
                queues.per_frame.insert(name.to_string(), callback);
            }
            None => {
                queues.per_frame.remove(name);
            }
        }
    }

    /// Take every queued task and snapshot the per-frame callbacks
    ///
    /// The lock is released before anything runs, so tasks may queue more
    /// work; that work lands in the next frame.
    pub fn take_frame(&self) -> FrameTasks {
        let mut queues = lock(&self.queues);
        FrameTasks {
            one_shot: std::mem::take(&mut queues.one_shot),
            per_frame: queues.per_frame.values().cloned().collect(),
        }
    }

    pub fn pending_len(&self) -> usize {
        lock(&self.queues).one_shot.len()
    }

    pub fn per_frame_len(&self) -> usize {
        lock(&self.queues).per_frame.len()
    }
}
