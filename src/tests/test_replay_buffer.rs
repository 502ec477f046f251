use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use crate::error::TrafficError;
use crate::replay_buffer::{Experience, ReplayBuffer};

fn numbered(i: usize) -> Experience {
    Experience {
        state: array![i as f32],
        action: i % 2,
        reward: i as f32,
        next_state: array![(i + 1) as f32],
        done: false,
    }
}

#[test]
fn test_replay_buffer_add_and_sample() {
    let mut replay_buffer = ReplayBuffer::new(10);
    let experience = Experience {
        state: array![0.5, -0.5],
        action: 0,
        reward: 1.0,
        next_state: array![0.6, -0.4],
        done: false,
    };
    replay_buffer.add(experience.clone());
    assert_eq!(replay_buffer.len(), 1);
    let sample = replay_buffer.sample(1).unwrap();
    assert_eq!(sample[0], &experience);
}

#[test]
fn test_replay_buffer_capacity() {
    let mut buffer = ReplayBuffer::new(3);
    for i in 0..5 {
        buffer.add(numbered(i));
    }

    // Should only keep last 3, oldest first
    assert_eq!(buffer.len(), 3);
    let states: Vec<f32> = buffer.iter().map(|e| e.state[0]).collect();
    assert_eq!(states, vec![2.0, 3.0, 4.0]);
}

#[test]
fn test_replay_buffer_is_empty() {
    let mut buffer = ReplayBuffer::new(10);
    assert!(buffer.is_empty());

    buffer.add(numbered(0));
    assert!(!buffer.is_empty());

    buffer.clear();
    assert!(buffer.is_empty());
    assert_eq!(buffer.capacity(), 10);
}

#[test]
fn test_sample_insufficient() {
    let mut buffer = ReplayBuffer::new(10);
    for i in 0..3 {
        buffer.add(numbered(i));
    }

    match buffer.sample(4) {
        Err(TrafficError::InsufficientSamples { requested, available }) => {
            assert_eq!(requested, 4);
            assert_eq!(available, 3);
        }
        other => panic!("expected InsufficientSamples, got {:?}", other.map(|s| s.len())),
    }
}

#[test]
fn test_sample_without_replacement() {
    let mut buffer = ReplayBuffer::new(100);
    for i in 0..64 {
        buffer.add(numbered(i));
    }
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..20 {
        let sample = buffer.sample_with(&mut rng, 64).unwrap();
        assert_eq!(sample.len(), 64);
        let distinct: HashSet<i64> = sample.iter().map(|e| e.reward as i64).collect();
        assert_eq!(distinct.len(), 64);
    }
}

#[test]
fn test_sample_covers_buffer() {
    let mut buffer = ReplayBuffer::new(10);
    for i in 0..10 {
        buffer.add(numbered(i));
    }
    let mut rng = StdRng::seed_from_u64(11);

    let mut seen = HashSet::new();
    for _ in 0..200 {
        for e in buffer.sample_with(&mut rng, 2).unwrap() {
            seen.insert(e.reward as i64);
        }
    }
    assert_eq!(seen.len(), 10);
}

#[test]
fn test_zero_capacity_stays_empty() {
    let mut buffer = ReplayBuffer::new(0);
    buffer.add(numbered(0));
    assert!(buffer.is_empty());
}
