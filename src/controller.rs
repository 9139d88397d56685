/*!
Controller abstraction for NES-style serial input via $4016/$4017.

Behavior:
- Buttons are a bitmask in the order the CPU shifts them out, most significant first:
  A=0x80, B=0x40, Select=0x20, Start=0x10, Up=0x08, Down=0x04, Left=0x02, Right=0x01.
- A CPU write to the port copies the live buttons into the shift latch.
- Each CPU read returns bit 7 of the latch and shifts it left by one, so after eight
  reads the port reads 0 until the next write.
*/

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
    ];

    #[inline]
    pub fn mask(self) -> u8 {
        match self {
            Button::A => 0x80,
            Button::B => 0x40,
            Button::Select => 0x20,
            Button::Start => 0x10,
            Button::Up => 0x08,
            Button::Down => 0x04,
            Button::Left => 0x02,
            Button::Right => 0x01,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Controller {
    // Live button states. Bit set = pressed.
    buttons: u8,
    // Snapshot being shifted out to the CPU.
    shift: u8,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_buttons(&mut self, mask: u8) {
        self.buttons = mask;
    }

    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons |= button.mask();
        } else {
            self.buttons &= !button.mask();
        }
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.buttons & button.mask() != 0
    }

    /// CPU write to the port.
    pub fn latch(&mut self) {
        self.shift = self.buttons;
    }

    /// CPU read from the port.
    pub fn read(&mut self) -> u8 {
        let bit = (self.shift & 0x80 != 0) as u8;
        self.shift <<= 1;
        bit
    }

    pub(crate) fn shift_register(&self) -> u8 {
        self.shift
    }

    pub(crate) fn restore(&mut self, buttons: u8, shift: u8) {
        self.buttons = buttons;
        self.shift = shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_out_msb_first() {
        let mut pad = Controller::new();
        pad.set_button(Button::A, true);
        pad.set_button(Button::Start, true);
        pad.set_button(Button::Right, true);
        pad.latch();

        let bits: Vec<u8> = (0..8).map(|_| pad.read()).collect();
        assert_eq!(bits, vec![1, 0, 0, 1, 0, 0, 0, 1]);
        assert_eq!(pad.read(), 0);
    }

    #[test]
    fn latch_snapshots_live_state() {
        let mut pad = Controller::new();
        pad.set_buttons(Button::B.mask());
        pad.latch();
        pad.set_buttons(0);
        assert_eq!(pad.read(), 0);
        assert_eq!(pad.read(), 1);
    }

    #[test]
    fn release_clears_bit() {
        let mut pad = Controller::new();
        pad.set_button(Button::Left, true);
        assert!(pad.is_pressed(Button::Left));
        pad.set_button(Button::Left, false);
        assert_eq!(pad.buttons(), 0);
    }

    #[test]
    fn masks_are_distinct() {
        let all = Button::ALL.iter().fold(0u8, |acc, b| acc | b.mask());
        assert_eq!(all, 0xFF);
    }
}
