use evdev::KeyCode;

/// Keyboard key names as used in RetroArch configuration files
const SYMBOLS: &[(&str, KeyCode)] = &[
    ("left", KeyCode::KEY_LEFT),
    ("right", KeyCode::KEY_RIGHT),
    ("up", KeyCode::KEY_UP),
    ("down", KeyCode::KEY_DOWN),
    ("enter", KeyCode::KEY_ENTER),
    ("kp_enter", KeyCode::KEY_KPENTER),
    ("tab", KeyCode::KEY_TAB),
    ("insert", KeyCode::KEY_INSERT),
    ("del", KeyCode::KEY_DELETE),
    ("end", KeyCode::KEY_END),
    ("home", KeyCode::KEY_HOME),
    ("pageup", KeyCode::KEY_PAGEUP),
    ("pagedown", KeyCode::KEY_PAGEDOWN),
    ("shift", KeyCode::KEY_LEFTSHIFT),
    ("rshift", KeyCode::KEY_RIGHTSHIFT),
    ("ctrl", KeyCode::KEY_LEFTCTRL),
    ("rctrl", KeyCode::KEY_RIGHTCTRL),
    ("alt", KeyCode::KEY_LEFTALT),
    ("ralt", KeyCode::KEY_RIGHTALT),
    ("space", KeyCode::KEY_SPACE),
    ("escape", KeyCode::KEY_ESC),
    ("backspace", KeyCode::KEY_BACKSPACE),
    ("capslock", KeyCode::KEY_CAPSLOCK),
    ("numlock", KeyCode::KEY_NUMLOCK),
    ("scroll_lock", KeyCode::KEY_SCROLLLOCK),
    ("print_screen", KeyCode::KEY_SYSRQ),
    ("pause", KeyCode::KEY_PAUSE),
    ("period", KeyCode::KEY_DOT),
    ("comma", KeyCode::KEY_COMMA),
    ("minus", KeyCode::KEY_MINUS),
    ("equals", KeyCode::KEY_EQUAL),
    ("slash", KeyCode::KEY_SLASH),
    ("backslash", KeyCode::KEY_BACKSLASH),
    ("semicolon", KeyCode::KEY_SEMICOLON),
    ("quote", KeyCode::KEY_APOSTROPHE),
    ("tilde", KeyCode::KEY_GRAVE),
    ("leftbracket", KeyCode::KEY_LEFTBRACE),
    ("rightbracket", KeyCode::KEY_RIGHTBRACE),
    ("add", KeyCode::KEY_KPPLUS),
    ("subtract", KeyCode::KEY_KPMINUS),
    ("multiply", KeyCode::KEY_KPASTERISK),
    ("divide", KeyCode::KEY_KPSLASH),
    ("kp_period", KeyCode::KEY_KPDOT),
    ("kp_equals", KeyCode::KEY_KPEQUAL),
    ("f1", KeyCode::KEY_F1),
    ("f2", KeyCode::KEY_F2),
    ("f3", KeyCode::KEY_F3),
    ("f4", KeyCode::KEY_F4),
    ("f5", KeyCode::KEY_F5),
    ("f6", KeyCode::KEY_F6),
    ("f7", KeyCode::KEY_F7),
    ("f8", KeyCode::KEY_F8),
    ("f9", KeyCode::KEY_F9),
    ("f10", KeyCode::KEY_F10),
    ("f11", KeyCode::KEY_F11),
    ("f12", KeyCode::KEY_F12),
    ("num0", KeyCode::KEY_0),
    ("num1", KeyCode::KEY_1),
    ("num2", KeyCode::KEY_2),
    ("num3", KeyCode::KEY_3),
    ("num4", KeyCode::KEY_4),
    ("num5", KeyCode::KEY_5),
    ("num6", KeyCode::KEY_6),
    ("num7", KeyCode::KEY_7),
    ("num8", KeyCode::KEY_8),
    ("num9", KeyCode::KEY_9),
    ("keypad0", KeyCode::KEY_KP0),
    ("keypad1", KeyCode::KEY_KP1),
    ("keypad2", KeyCode::KEY_KP2),
    ("keypad3", KeyCode::KEY_KP3),
    ("keypad4", KeyCode::KEY_KP4),
    ("keypad5", KeyCode::KEY_KP5),
    ("keypad6", KeyCode::KEY_KP6),
    ("keypad7", KeyCode::KEY_KP7),
    ("keypad8", KeyCode::KEY_KP8),
    ("keypad9", KeyCode::KEY_KP9),
    ("a", KeyCode::KEY_A),
    ("b", KeyCode::KEY_B),
    ("c", KeyCode::KEY_C),
    ("d", KeyCode::KEY_D),
    ("e", KeyCode::KEY_E),
    ("f", KeyCode::KEY_F),
    ("g", KeyCode::KEY_G),
    ("h", KeyCode::KEY_H),
    ("i", KeyCode::KEY_I),
    ("j", KeyCode::KEY_J),
    ("k", KeyCode::KEY_K),
    ("l", KeyCode::KEY_L),
    ("m", KeyCode::KEY_M),
    ("n", KeyCode::KEY_N),
    ("o", KeyCode::KEY_O),
    ("p", KeyCode::KEY_P),
    ("q", KeyCode::KEY_Q),
    ("r", KeyCode::KEY_R),
    ("s", KeyCode::KEY_S),
    ("t", KeyCode::KEY_T),
    ("u", KeyCode::KEY_U),
    ("v", KeyCode::KEY_V),
    ("w", KeyCode::KEY_W),
    ("x", KeyCode::KEY_X),
    ("y", KeyCode::KEY_Y),
    ("z", KeyCode::KEY_Z),
];

/// Find the key for a RetroArch key name like "enter" or "num1"
pub fn key_from_symbol(symbol: &str) -> Option<KeyCode> {
    SYMBOLS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(symbol))
        .map(|(_, key)| *key)
}

pub fn key_symbol(key: KeyCode) -> Option<&'static str> {
    SYMBOLS
        .iter()
        .find(|(_, k)| *k == key)
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols() {
        assert_eq!(key_from_symbol("kp_enter"), Some(KeyCode::KEY_KPENTER));
        assert_eq!(key_from_symbol("Escape"), Some(KeyCode::KEY_ESC));
        assert_eq!(key_from_symbol("nul"), None);
        assert_eq!(key_symbol(KeyCode::KEY_7), Some("num7"));
        assert_eq!(key_symbol(KeyCode::KEY_MUTE), None);
    }
}
