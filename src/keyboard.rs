pub const NUM_KEYS: usize = 16;

/// Key's variants are the 16 keys from the CHIP-8's hexadecimal keyboard.
/// The recommended key mapping is:
///
/// Keypad                   Keyboard
/// +-+-+-+-+                +-+-+-+-+
/// |1|2|3|C|                |1|2|3|4|
/// +-+-+-+-+                +-+-+-+-+
/// |4|5|6|D|                |Q|W|E|R|
/// +-+-+-+-+       =>       +-+-+-+-+
/// |7|8|9|E|                |A|S|D|F|
/// +-+-+-+-+                +-+-+-+-+
/// |A|0|B|F|                |Z|X|C|V|
/// +-+-+-+-+                +-+-+-+-+
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Key {
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Key {
    /// The hex value of this key, which is also its index in the key state array
    pub fn index(self) -> usize {
        self as usize
    }

    /// The Key for a hex value, or None if `idx` is above 0xF
    pub fn from_index(idx: usize) -> Option<Key> {
        const KEYS: [Key; NUM_KEYS] = [
            Key::Key0,
            Key::Key1,
            Key::Key2,
            Key::Key3,
            Key::Key4,
            Key::Key5,
            Key::Key6,
            Key::Key7,
            Key::Key8,
            Key::Key9,
            Key::A,
            Key::B,
            Key::C,
            Key::D,
            Key::E,
            Key::F,
        ];
        KEYS.get(idx).copied()
    }
}

/// Implemented by whatever polls the host's input devices (a window, a test
/// script) so the Emulator can learn which keys are currently held down
pub trait AsKeyboard {
    fn keys_down(&self) -> Vec<Key>;
}

/// Contains the state (up or down) of the CHIP-8's 16 keys. Only the input
/// side ever changes it, the interpreter just reads it
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Keyboard {
    key_input: [bool; NUM_KEYS],
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    /// Handle the key down event for one of the 16 possible keys
    pub fn handle_key_down(&mut self, k: Key) {
        self.key_input[k.index()] = true;
    }

    /// Handle the key up event for one of the 16 possible keys
    pub fn handle_key_up(&mut self, k: Key) {
        self.key_input[k.index()] = false;
    }

    /// Given the keys pressed down on the system keyboard, fire the appropriate
    /// key_up and key_down handlers
    pub fn update_keyboard_with_vec(&mut self, keys: &[Key]) {
        for key in (0..NUM_KEYS).filter_map(Key::from_index) {
            let system_key_is_down = keys.contains(&key);

            if system_key_is_down != self.key_input[key.index()] {
                if system_key_is_down {
                    self.handle_key_down(key);
                } else {
                    self.handle_key_up(key);
                }
            }
        }
    }

    /// Return true if the key with the given hex value is held down. Values
    /// above 0xF don't name a key and always read as up
    pub fn get_key_state(&self, idx: usize) -> bool {
        self.key_input.get(idx).copied().unwrap_or(false)
    }

    /// The lowest hex value among the keys currently held down
    pub fn first_pressed(&self) -> Option<u8> {
        self.key_input.iter().position(|&down| down).map(|idx| idx as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_index_round_trips_through_hex_value() {
        assert_eq!(Key::Key0.index(), 0x0);
        assert_eq!(Key::A.index(), 0xA);
        assert_eq!(Key::F.index(), 0xF);
        assert_eq!(Key::from_index(0xC), Some(Key::C));
        assert_eq!(Key::from_index(0x10), None);
    }

    #[test]
    fn key_down_and_up() {
        let mut keyboard = Keyboard::new();
        assert_eq!(keyboard.get_key_state(0x5), false);

        keyboard.handle_key_down(Key::Key5);
        assert_eq!(keyboard.get_key_state(0x5), true);

        keyboard.handle_key_up(Key::Key5);
        assert_eq!(keyboard.get_key_state(0x5), false);
    }

    #[test]
    fn out_of_range_keys_read_as_up() {
        let keyboard = Keyboard::new();
        assert_eq!(keyboard.get_key_state(0x10), false);
        assert_eq!(keyboard.get_key_state(0xFF), false);
    }

    #[test]
    fn update_keyboard_with_vec_syncs_every_key() {
        let mut keyboard = Keyboard::new();
        keyboard.handle_key_down(Key::Key1);

        keyboard.update_keyboard_with_vec(&[Key::C, Key::Key2]);

        assert_eq!(keyboard.get_key_state(0x1), false);
        assert_eq!(keyboard.get_key_state(0x2), true);
        assert_eq!(keyboard.get_key_state(0xC), true);
    }

    #[test]
    fn first_pressed_picks_lowest_key() {
        let mut keyboard = Keyboard::new();
        assert_eq!(keyboard.first_pressed(), None);

        keyboard.handle_key_down(Key::E);
        keyboard.handle_key_down(Key::Key3);
        assert_eq!(keyboard.first_pressed(), Some(0x3));
    }
}
