// Held-control flags read by the driving model every frame.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Forward,
    Backward,
    Left,
    Right,
    Drift,
    Nitro,
}

impl Control {
    /// Maps browser-style key codes to controls.
    pub fn from_key_code(code: &str) -> Option<Self> {
        match code {
            "KeyW" => Some(Control::Forward),
            "KeyS" => Some(Control::Backward),
            "KeyA" => Some(Control::Left),
            "KeyD" => Some(Control::Right),
            "Space" => Some(Control::Drift),
            "ShiftLeft" | "ShiftRight" => Some(Control::Nitro),
            _ => None,
        }
    }
}

/// Handling preset chosen by the player. Drift mode loosens steering permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    #[default]
    Grip,
    Drift,
}

impl ControlMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grip" | "arcade" => Some(ControlMode::Grip),
            "drift" => Some(ControlMode::Drift),
            _ => None,
        }
    }
}

/// Six independent held flags, flipped by key edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub drift: bool,
    pub nitro: bool,
}

impl ControlState {
    pub fn set(&mut self, control: Control, held: bool) {
        match control {
            Control::Forward => self.forward = held,
            Control::Backward => self.backward = held,
            Control::Left => self.left = held,
            Control::Right => self.right = held,
            Control::Drift => self.drift = held,
            Control::Nitro => self.nitro = held,
        }
    }

    /// `+1` for left, `-1` for right, `0` when both or neither are held.
    pub fn turn_input(&self) -> f32 {
        (self.left as i8 - self.right as i8) as f32
    }

    pub fn release_all(&mut self) {
        *self = ControlState::default();
    }
}
