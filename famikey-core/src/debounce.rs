//! Per-key debounce and edge detection.
//!
//! Each position keeps the last level accepted as stable and the level
//! sampled this cycle. A transition between the two is reported once and
//! opens a short debounce window; samples taken while the window is open
//! are discarded, so contact bounce around an accepted edge cannot emit
//! further events.

use crate::keycode::KeyCode;
use crate::keymap::{COLS, KEY_CODES, KEY_COUNT, MODIFIER_SCAN_ORDER};
use crate::EventSink;

/// Debounce counter wrap mask. The counter advances once per scan cycle
/// while nonzero, so mask 1 discards one cycle after each accepted edge
/// (10 ms at the 5 ms scan cadence).
pub const DEBOUNCE_MASK: u8 = 1;

/// State carried per matrix position.
#[derive(Copy, Clone)]
struct KeyState {
    /// Keycode emitted for this position. Assigned once, never changes.
    code: KeyCode,
    /// Last level accepted as stable (0 = released, 1 = pressed).
    prev: u8,
    /// Level sampled in the most recent scan cycle.
    curr: u8,
    /// Nonzero while the debounce window is open.
    debounce: u8,
}

/// All key positions, in matrix scan order.
pub struct KeySet {
    keys: [KeyState; KEY_COUNT],
}

impl KeySet {
    pub const fn new() -> Self {
        let mut keys = [KeyState {
            code: KEY_CODES[0],
            prev: 0,
            curr: 0,
            debounce: 0,
        }; KEY_COUNT];
        let mut i = 0;
        while i < KEY_COUNT {
            keys[i].code = KEY_CODES[i];
            i += 1;
        }
        Self { keys }
    }

    /// Store one row's sampled levels, bit i of `bits` going to column i.
    pub fn set_levels(&mut self, row: usize, bits: u8) {
        for col in 0..COLS {
            self.keys[COLS * row + col].curr = (bits >> col) & 1;
        }
    }

    /// Level sampled for a position in the most recent cycle.
    pub fn level(&self, index: usize) -> u8 {
        self.keys[index].curr
    }

    /// Run one debounce/edge evaluation over the whole set, reporting
    /// accepted transitions to `sink`.
    ///
    /// The five modifier positions are evaluated first, then every
    /// position in index order. A modifier edge accepted in the first
    /// pass leaves that key inside its debounce window, so the second
    /// visit in the same cycle never duplicates the event.
    pub fn update<S: EventSink>(&mut self, sink: &mut S) {
        for &i in MODIFIER_SCAN_ORDER.iter() {
            self.step(i, sink);
        }
        for i in 0..KEY_COUNT {
            self.step(i, sink);
        }
    }

    fn step<S: EventSink>(&mut self, index: usize, sink: &mut S) {
        let key = &mut self.keys[index];

        if key.debounce != 0 {
            key.debounce = (key.debounce + 1) & DEBOUNCE_MASK;
            return;
        }

        match (key.prev << 1) | key.curr {
            0b01 => {
                sink.press(key.code);
                key.debounce += 1;
                key.prev = key.curr;
            }
            0b10 => {
                sink.release(key.code);
                key.debounce += 1;
                key.prev = key.curr;
            }
            // 0b00 idle, 0b11 held
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    enum Event {
        Press(KeyCode),
        Release(KeyCode),
    }

    struct Recorder {
        events: Vec<Event>,
    }

    impl Recorder {
        fn new() -> Self {
            Self { events: Vec::new() }
        }
    }

    impl EventSink for Recorder {
        fn press(&mut self, code: KeyCode) {
            self.events.push(Event::Press(code));
        }

        fn release(&mut self, code: KeyCode) {
            self.events.push(Event::Release(code));
        }
    }

    /// Feed one cycle: a single key at `index` sampled at `level`, then
    /// a full evaluation.
    fn cycle(set: &mut KeySet, rec: &mut Recorder, index: usize, level: u8) {
        set.keys[index].curr = level;
        set.update(rec);
    }

    #[test]
    fn test_press_edge() {
        let mut set = KeySet::new();
        let mut rec = Recorder::new();

        cycle(&mut set, &mut rec, 19, 1);
        assert_eq!(rec.events, vec![Event::Press(KeyCode::K)]);
        assert_eq!(set.keys[19].debounce, 1);
    }

    #[test]
    fn test_release_edge() {
        let mut set = KeySet::new();
        let mut rec = Recorder::new();

        cycle(&mut set, &mut rec, 19, 1);
        cycle(&mut set, &mut rec, 19, 1); // debounce decay
        rec.events.clear();

        cycle(&mut set, &mut rec, 19, 0);
        assert_eq!(rec.events, vec![Event::Release(KeyCode::K)]);
    }

    #[test]
    fn test_idle_and_held_are_silent() {
        let mut set = KeySet::new();
        let mut rec = Recorder::new();

        for _ in 0..5 {
            cycle(&mut set, &mut rec, 19, 0);
        }
        assert!(rec.events.is_empty());

        cycle(&mut set, &mut rec, 19, 1);
        rec.events.clear();
        for _ in 0..5 {
            cycle(&mut set, &mut rec, 19, 1);
        }
        assert!(rec.events.is_empty(), "held key repeated an event");
    }

    #[test]
    fn test_bounce_yields_one_press() {
        let mut set = KeySet::new();
        let mut rec = Recorder::new();

        // Contact bounce settling into a press.
        for level in [0, 1, 0, 1, 1, 1] {
            cycle(&mut set, &mut rec, 19, level);
        }
        assert_eq!(rec.events, vec![Event::Press(KeyCode::K)]);
    }

    #[test]
    fn test_debounce_window_decays() {
        let mut set = KeySet::new();
        let mut rec = Recorder::new();

        // Idle for three cycles.
        for _ in 0..3 {
            cycle(&mut set, &mut rec, 19, 0);
        }
        assert!(rec.events.is_empty());

        // Cycle 4: key goes down, edge accepted, window opens.
        cycle(&mut set, &mut rec, 19, 1);
        assert_eq!(rec.events, vec![Event::Press(KeyCode::K)]);
        assert_eq!(set.keys[19].debounce, 1);

        // Cycle 5: window consumes the sample and closes.
        cycle(&mut set, &mut rec, 19, 1);
        assert_eq!(rec.events.len(), 1);
        assert_eq!(set.keys[19].debounce, 0);

        // Cycle 6: stable held level, nothing to report.
        cycle(&mut set, &mut rec, 19, 1);
        assert_eq!(rec.events.len(), 1);
    }

    #[test]
    fn test_modifiers_reported_first() {
        let mut set = KeySet::new();
        let mut rec = Recorder::new();

        // Left shift (position 60) and K (position 19) land in the same
        // cycle. K has the lower index but shift must come out first.
        set.keys[19].curr = 1;
        set.keys[60].curr = 1;
        set.update(&mut rec);

        assert_eq!(
            rec.events,
            vec![Event::Press(KeyCode::LShift), Event::Press(KeyCode::K)]
        );
    }

    #[test]
    fn test_modifier_pass_is_idempotent() {
        let mut set = KeySet::new();
        let mut rec = Recorder::new();

        cycle(&mut set, &mut rec, 60, 1);
        assert_eq!(rec.events, vec![Event::Press(KeyCode::LShift)]);

        rec.events.clear();
        cycle(&mut set, &mut rec, 60, 1);
        cycle(&mut set, &mut rec, 60, 1);
        assert!(rec.events.is_empty());
    }

    #[test]
    fn test_full_sweep_covers_every_position() {
        let mut set = KeySet::new();
        let mut rec = Recorder::new();

        for row in 0..crate::keymap::ROWS {
            set.set_levels(row, 0xFF);
        }
        set.update(&mut rec);

        assert_eq!(rec.events.len(), KEY_COUNT);
        for (i, &pos) in MODIFIER_SCAN_ORDER.iter().enumerate() {
            assert_eq!(rec.events[i], Event::Press(KEY_CODES[pos]));
        }
    }

    #[test]
    fn test_set_levels_distributes_bits() {
        let mut set = KeySet::new();

        set.set_levels(2, 0b0000_1000);
        assert_eq!(set.level(19), 1);
        for i in 16..24 {
            if i != 19 {
                assert_eq!(set.level(i), 0);
            }
        }
    }
}
