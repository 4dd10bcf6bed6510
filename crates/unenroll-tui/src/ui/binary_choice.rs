use crossterm::event::{KeyCode, KeyEvent};

use crate::keymap;

/// Two-button prompt; `No` is preselected so a stray Enter never confirms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BinaryChoice {
    yes_selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryChoiceEvent {
    Continue,
    ConfirmYes,
    ConfirmNo,
    Back,
}

impl BinaryChoice {
    pub(crate) fn on_key(&mut self, key: KeyEvent) -> BinaryChoiceEvent {
        if keymap::is_back(key) {
            return BinaryChoiceEvent::Back;
        }

        match key.code {
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('n') => {
                self.yes_selected = false;
                return BinaryChoiceEvent::Continue;
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('y') => {
                self.yes_selected = true;
                return BinaryChoiceEvent::Continue;
            }
            _ => {}
        }

        if keymap::is_toggle(key) {
            self.yes_selected = !self.yes_selected;
            return BinaryChoiceEvent::Continue;
        }

        if keymap::is_confirm(key) {
            if self.yes_selected {
                BinaryChoiceEvent::ConfirmYes
            } else {
                BinaryChoiceEvent::ConfirmNo
            }
        } else {
            BinaryChoiceEvent::Continue
        }
    }

    pub(crate) fn yes_selected(&self) -> bool {
        self.yes_selected
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
