//! USB HID keycodes.
//! See USB HID Usage Tables, Section 10 (Keyboard/Keypad Page 0x07).

/// HID keycode emitted for a matrix position.
///
/// HID keycodes are layout-agnostic — the OS interprets them based on the
/// active input language. The values here are the usage IDs sent in the
/// keyboard report.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum KeyCode {
    // Letters
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0A,
    H = 0x0B,
    I = 0x0C,
    J = 0x0D,
    K = 0x0E,
    L = 0x0F,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1A,
    X = 0x1B,
    Y = 0x1C,
    Z = 0x1D,

    // Numbers
    N1 = 0x1E,
    N2 = 0x1F,
    N3 = 0x20,
    N4 = 0x21,
    N5 = 0x22,
    N6 = 0x23,
    N7 = 0x24,
    N8 = 0x25,
    N9 = 0x26,
    N0 = 0x27,

    // Control keys
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    LBracket = 0x2F,
    RBracket = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Grave = 0x35,
    Comma = 0x36,
    Dot = 0x37,
    Slash = 0x38,

    // Function keys
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,

    // Navigation
    Insert = 0x49,
    Delete = 0x4C,
    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,

    // Modifiers (sent in the modifier byte, not in the keycode array)
    LCtrl = 0xE0,
    LShift = 0xE1,
    LAlt = 0xE2,
    LGui = 0xE3,
    RCtrl = 0xE4,
    RShift = 0xE5,
    RAlt = 0xE6,
    RGui = 0xE7,
}

impl KeyCode {
    /// Check if this keycode is a modifier (LCtrl..RGui).
    pub fn is_modifier(self) -> bool {
        let v = self as u8;
        (0xE0..=0xE7).contains(&v)
    }

    /// Get the modifier bit mask (bit 0 = LCtrl, bit 7 = RGui).
    pub fn modifier_bit(self) -> u8 {
        if self.is_modifier() {
            1 << (self as u8 - 0xE0)
        } else {
            0
        }
    }

    /// Display name for logging and layout listings.
    pub fn name(self) -> &'static str {
        match self {
            KeyCode::A => "A",
            KeyCode::B => "B",
            KeyCode::C => "C",
            KeyCode::D => "D",
            KeyCode::E => "E",
            KeyCode::F => "F",
            KeyCode::G => "G",
            KeyCode::H => "H",
            KeyCode::I => "I",
            KeyCode::J => "J",
            KeyCode::K => "K",
            KeyCode::L => "L",
            KeyCode::M => "M",
            KeyCode::N => "N",
            KeyCode::O => "O",
            KeyCode::P => "P",
            KeyCode::Q => "Q",
            KeyCode::R => "R",
            KeyCode::S => "S",
            KeyCode::T => "T",
            KeyCode::U => "U",
            KeyCode::V => "V",
            KeyCode::W => "W",
            KeyCode::X => "X",
            KeyCode::Y => "Y",
            KeyCode::Z => "Z",
            KeyCode::N1 => "1",
            KeyCode::N2 => "2",
            KeyCode::N3 => "3",
            KeyCode::N4 => "4",
            KeyCode::N5 => "5",
            KeyCode::N6 => "6",
            KeyCode::N7 => "7",
            KeyCode::N8 => "8",
            KeyCode::N9 => "9",
            KeyCode::N0 => "0",
            KeyCode::Enter => "Ent",
            KeyCode::Escape => "Esc",
            KeyCode::Backspace => "Bksp",
            KeyCode::Tab => "Tab",
            KeyCode::Space => "Spc",
            KeyCode::Minus => "-",
            KeyCode::Equal => "=",
            KeyCode::LBracket => "[",
            KeyCode::RBracket => "]",
            KeyCode::Backslash => "\\",
            KeyCode::Semicolon => ";",
            KeyCode::Quote => "'",
            KeyCode::Grave => "`",
            KeyCode::Comma => ",",
            KeyCode::Dot => ".",
            KeyCode::Slash => "/",
            KeyCode::F1 => "F1",
            KeyCode::F2 => "F2",
            KeyCode::F3 => "F3",
            KeyCode::F4 => "F4",
            KeyCode::F5 => "F5",
            KeyCode::F6 => "F6",
            KeyCode::F7 => "F7",
            KeyCode::F8 => "F8",
            KeyCode::Insert => "Ins",
            KeyCode::Delete => "Del",
            KeyCode::Right => "Right",
            KeyCode::Left => "Left",
            KeyCode::Down => "Down",
            KeyCode::Up => "Up",
            KeyCode::LCtrl => "Ctrl",
            KeyCode::LShift => "Shft",
            KeyCode::LAlt => "Alt",
            KeyCode::LGui => "Gui",
            KeyCode::RCtrl => "RCtl",
            KeyCode::RShift => "RSft",
            KeyCode::RAlt => "RAlt",
            KeyCode::RGui => "RGui",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_bits() {
        assert_eq!(KeyCode::LCtrl.modifier_bit(), 0x01);
        assert_eq!(KeyCode::LShift.modifier_bit(), 0x02);
        assert_eq!(KeyCode::LAlt.modifier_bit(), 0x04);
        assert_eq!(KeyCode::LGui.modifier_bit(), 0x08);
        assert_eq!(KeyCode::RShift.modifier_bit(), 0x20);
        assert_eq!(KeyCode::RAlt.modifier_bit(), 0x40);
    }

    #[test]
    fn test_non_modifier_has_no_bit() {
        assert!(!KeyCode::K.is_modifier());
        assert_eq!(KeyCode::K.modifier_bit(), 0);
        assert!(!KeyCode::Space.is_modifier());
        assert_eq!(KeyCode::Space.modifier_bit(), 0);
    }
}
