use crate::runner::ds::value::JsValue;

struct Timer {
    id: i64,
    due: u64,
    interval: Option<u64>,
    seq: u64,
    callback: JsValue,
    args: Vec<JsValue>,
}

/// Timer queue driven by a virtual clock. Nothing fires until the host
/// advances the clock.
pub struct TimerQueue {
    now: u64,
    next_id: i64,
    seq: u64,
    timers: Vec<Timer>,
}

impl Default for TimerQueue {
    fn default() -> Self {
        TimerQueue::new()
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        TimerQueue {
            now: 0,
            next_id: 1,
            seq: 0,
            timers: vec![],
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }

    pub fn schedule(&mut self, callback: JsValue, delay: u64, args: Vec<JsValue>, repeat: bool) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.seq += 1;
        self.timers.push(Timer {
            id,
            due: self.now + delay,
            // Zero-delay intervals would never let the clock move on.
            interval: if repeat { Some(delay.max(1)) } else { None },
            seq: self.seq,
            callback,
            args,
        });
        id
    }

    pub fn cancel(&mut self, id: i64) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        before != self.timers.len()
    }

    pub fn is_pending(&self, id: i64) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Takes the earliest timer due at or before `until` and moves the clock to
    /// its due time. Repeating timers are put back with their next due time.
    pub fn pop_due(&mut self, until: u64) -> Option<(JsValue, Vec<JsValue>)> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;
        let timer = self.timers.remove(index);
        self.now = self.now.max(timer.due);
        let fired = (timer.callback.clone(), timer.args.clone());
        if let Some(interval) = timer.interval {
            self.seq += 1;
            self.timers.push(Timer {
                due: timer.due + interval,
                seq: self.seq,
                ..timer
            });
        }
        Some(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_fire_in_due_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(JsValue::string("late"), 20, vec![], false);
        queue.schedule(JsValue::string("early"), 5, vec![], false);
        assert_eq!(queue.pop_due(30).map(|(c, _)| c), Some(JsValue::string("early")));
        assert_eq!(queue.now(), 5);
        assert_eq!(queue.pop_due(30).map(|(c, _)| c), Some(JsValue::string("late")));
        assert!(queue.pop_due(30).is_none());
    }

    #[test]
    fn test_interval_is_rescheduled_until_cancelled() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule(JsValue::Null, 10, vec![], true);
        assert!(queue.pop_due(25).is_some());
        assert!(queue.pop_due(25).is_some());
        assert!(queue.pop_due(25).is_none());
        assert!(queue.cancel(id));
        assert_eq!(queue.pending(), 0);
    }
}
