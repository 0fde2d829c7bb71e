//! `Scratchpad` (§3.1, §4.10): a per-session, append-only rolling log of
//! `AcuteCandidate`s, trimmed to the most recent capacity entries.

use std::collections::VecDeque;

use recall_core::signals::AcuteCandidate;

pub struct Scratchpad {
    capacity: usize,
    entries: VecDeque<AcuteCandidate>,
}

impl Scratchpad {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: VecDeque::with_capacity(capacity) }
    }

    pub fn push(&mut self, candidate: AcuteCandidate) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(candidate);
    }

    /// Entries captured after `step_number` — the decider's trigger 2
    /// (§4.8).
    pub fn get_new_since(&self, step_number: u32) -> Vec<&AcuteCandidate> {
        self.entries.iter().filter(|c| c.step_number > step_number).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use recall_core::signals::SignalType;

    use super::*;

    fn candidate(step: u32) -> AcuteCandidate {
        AcuteCandidate { signal_type: SignalType::SelfCorrection, raw_data: format!("step {step}"), priority: 1, captured_at: Utc::now(), step_number: step }
    }

    #[test]
    fn caps_at_capacity_dropping_oldest() {
        let mut pad = Scratchpad::new(2);
        pad.push(candidate(1));
        pad.push(candidate(2));
        pad.push(candidate(3));

        assert_eq!(pad.len(), 2);
        assert!(pad.get_new_since(0).iter().all(|c| c.step_number != 1));
    }

    #[test]
    fn get_new_since_only_returns_later_steps() {
        let mut pad = Scratchpad::new(200);
        pad.push(candidate(4));
        pad.push(candidate(5));

        let found = pad.get_new_since(4);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].step_number, 5);
    }
}
