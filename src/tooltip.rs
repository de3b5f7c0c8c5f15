//! Hover tooltip that follows the pointer.

#[derive(Debug, Clone, PartialEq, Default)]
pub enum TooltipState {
    #[default]
    Hidden,
    Shown { country: String, x: f32, y: f32 },
}

impl TooltipState {
    pub fn is_visible(&self) -> bool {
        matches!(self, TooltipState::Shown { .. })
    }

    pub fn country(&self) -> Option<&str> {
        match self {
            TooltipState::Shown { country, .. } => Some(country),
            TooltipState::Hidden => None,
        }
    }

    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            TooltipState::Shown { x, y, .. } => Some((*x, *y)),
            TooltipState::Hidden => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TooltipController {
    state: TooltipState,
}

impl TooltipController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TooltipState {
        &self.state
    }

    pub fn hover(&mut self, country: &str, x: f32, y: f32) {
        match &mut self.state {
            TooltipState::Shown {
                country: current,
                x: cx,
                y: cy,
            } if current == country => {
                *cx = x;
                *cy = y;
            }
            _ => {
                self.state = TooltipState::Shown {
                    country: country.to_string(),
                    x,
                    y,
                };
            }
        }
    }

    /// Pointer moved within the current feature. No-op while hidden.
    pub fn move_to(&mut self, x: f32, y: f32) {
        if let TooltipState::Shown { x: cx, y: cy, .. } = &mut self.state {
            *cx = x;
            *cy = y;
        }
    }

    pub fn leave(&mut self) {
        self.state = TooltipState::Hidden;
    }
}
