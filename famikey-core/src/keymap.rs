//! Key table for the Family BASIC keyboard (HVC-007).
//!
//! The keyboard is a 9-row, 8-column matrix. Row-major position
//! `row * 8 + col` is the stable identity of a key; the table below maps
//! each position to the HID keycode the adapter emits for it. Positions
//! whose Famicom legend differs from the emitted US key are noted per row.

use crate::keycode::KeyCode;

/// Number of matrix rows.
pub const ROWS: usize = 9;
/// Number of key positions per row (two nibble reads of four data lines).
pub const COLS: usize = 8;
/// Total number of key positions.
pub const KEY_COUNT: usize = ROWS * COLS;

/// Shorthand aliases for readability.
const ENT: KeyCode = KeyCode::Enter;
const ESC: KeyCode = KeyCode::Escape;
const BSP: KeyCode = KeyCode::Backspace;
const TAB: KeyCode = KeyCode::Tab;
const SPC: KeyCode = KeyCode::Space;
const DEL: KeyCode = KeyCode::Delete;
const INS: KeyCode = KeyCode::Insert;
const GRV: KeyCode = KeyCode::Grave;
const LCTL: KeyCode = KeyCode::LCtrl;
const LSFT: KeyCode = KeyCode::LShift;
const LALT: KeyCode = KeyCode::LAlt;
const LGUI: KeyCode = KeyCode::LGui;
const RSFT: KeyCode = KeyCode::RShift;
const RALT: KeyCode = KeyCode::RAlt;
const LBRK: KeyCode = KeyCode::LBracket;
const RBRK: KeyCode = KeyCode::RBracket;
const BSLH: KeyCode = KeyCode::Backslash;

/// Emitted keycode per matrix position.
///
/// Legend notes: kana is sent as RAlt, GRPH as LGui, STOP as Backspace,
/// ESC as Tab and CLR HOME as Esc, so a host keymap can rebind them.
pub const KEY_CODES: [KeyCode; KEY_COUNT] = [
    // Row 0: F8, RETURN, [, ], kana, right SHIFT, yen, STOP
    KeyCode::F8, ENT, RBRK, BSLH, RALT, RSFT, GRV, BSP,
    // Row 1: F7, @, :, ;, _, /, -, ^
    KeyCode::F7, LBRK, KeyCode::Quote, KeyCode::Semicolon, LALT,
    KeyCode::Slash, KeyCode::Minus, KeyCode::Equal,
    // Row 2: F6, O, L, K, ., ,, P, 0
    KeyCode::F6, KeyCode::O, KeyCode::L, KeyCode::K, KeyCode::Dot,
    KeyCode::Comma, KeyCode::P, KeyCode::N0,
    // Row 3: F5, I, U, J, M, N, 9, 8
    KeyCode::F5, KeyCode::I, KeyCode::U, KeyCode::J, KeyCode::M,
    KeyCode::N, KeyCode::N9, KeyCode::N8,
    // Row 4: F4, Y, G, H, B, V, 7, 6
    KeyCode::F4, KeyCode::Y, KeyCode::G, KeyCode::H, KeyCode::B,
    KeyCode::V, KeyCode::N7, KeyCode::N6,
    // Row 5: F3, T, R, D, F, C, 5, 4
    KeyCode::F3, KeyCode::T, KeyCode::R, KeyCode::D, KeyCode::F,
    KeyCode::C, KeyCode::N5, KeyCode::N4,
    // Row 6: F2, W, S, A, X, Z, E, 3
    KeyCode::F2, KeyCode::W, KeyCode::S, KeyCode::A, KeyCode::X,
    KeyCode::Z, KeyCode::E, KeyCode::N3,
    // Row 7: F1, ESC, Q, CTR, left SHIFT, GRPH, 1, 2
    KeyCode::F1, TAB, KeyCode::Q, LCTL, LSFT, LGUI,
    KeyCode::N1, KeyCode::N2,
    // Row 8: CLR HOME, up, right, left, down, SPACE, DEL, INS
    ESC, KeyCode::Up, KeyCode::Right, KeyCode::Left, KeyCode::Down,
    SPC, DEL, INS,
];

/// Positions evaluated ahead of the full sweep: kana, right shift, ctrl,
/// left shift, GRPH. A modifier's edge must reach the host before the
/// edge of any key pressed together with it.
pub const MODIFIER_SCAN_ORDER: [usize; 5] = [4, 5, 59, 60, 61];

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[test]
    fn test_known_positions() {
        assert_eq!(KEY_CODES[0], KeyCode::F8);
        assert_eq!(KEY_CODES[19], KeyCode::K); // row 2, col 3
        assert_eq!(KEY_CODES[64], KeyCode::Escape);
        assert_eq!(KEY_CODES[71], KeyCode::Insert);
    }

    #[test]
    fn test_modifier_order_points_at_modifiers() {
        for &i in MODIFIER_SCAN_ORDER.iter() {
            assert!(KEY_CODES[i].is_modifier(), "position {} is not a modifier", i);
        }
    }

    #[test]
    fn test_underscore_key_is_the_only_late_modifier() {
        let in_table: Vec<usize> = KEY_CODES
            .iter()
            .enumerate()
            .filter(|(_, code)| code.is_modifier())
            .map(|(i, _)| i)
            .collect();
        // The _ key sends LAlt but is not part of the early pass.
        assert_eq!(in_table, vec![4, 5, 12, 59, 60, 61]);
        assert_eq!(KEY_CODES[12], KeyCode::LAlt);
    }
}
