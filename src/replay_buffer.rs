use ndarray::Array1;
use rand::seq::index;
use rand::Rng;
use std::collections::VecDeque;

use crate::error::{Result, TrafficError};

/// One decision step as seen by the learner: `(state, action, reward, next_state, done)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Experience {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

/// Fixed-capacity FIFO memory of experiences.
///
/// Appending to a full buffer silently evicts the oldest entry, so
/// `len() <= capacity()` holds at all times.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Experience>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        ReplayBuffer {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn add(&mut self, experience: Experience) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(experience);
    }

    /// Draw `batch_size` distinct experiences uniformly at random.
    ///
    /// Asking for more than the buffer holds is a caller error.
    pub fn sample(&self, batch_size: usize) -> Result<Vec<&Experience>> {
        self.sample_with(&mut rand::thread_rng(), batch_size)
    }

    /// Same as [`ReplayBuffer::sample`] with a caller-supplied generator.
    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R, batch_size: usize) -> Result<Vec<&Experience>> {
        if batch_size > self.buffer.len() {
            return Err(TrafficError::InsufficientSamples {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }

        Ok(index::sample(rng, self.buffer.len(), batch_size)
            .into_iter()
            .map(|i| &self.buffer[i])
            .collect())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Stored experiences, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Experience> {
        self.buffer.iter()
    }
}
