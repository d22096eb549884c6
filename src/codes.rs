//! Typed key codes for the two developer shortcuts.

/// Switches between the new and the classic look.
pub const GRAPHICS_CODE: &str = "retro";
/// Zeroes the stored high score.
pub const RESET_CODE: &str = "reset";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeAction {
    ToggleGraphics,
    ResetHighScore,
}

/// Rolling window over the most recently typed characters.
#[derive(Clone, Debug, Default)]
pub struct CodeBuffer {
    typed: String,
}

impl CodeBuffer {
    /// Record `c` and report a code completed by it. The buffer empties after
    /// a match so a code fires once per typing.
    pub fn push(&mut self, c: char) -> Option<CodeAction> {
        self.typed.push(c);

        let window = GRAPHICS_CODE.len().max(RESET_CODE.len());
        while self.typed.chars().count() > window {
            self.typed.remove(0);
        }

        let action = if self.typed.ends_with(GRAPHICS_CODE) {
            Some(CodeAction::ToggleGraphics)
        } else if self.typed.ends_with(RESET_CODE) {
            Some(CodeAction::ResetHighScore)
        } else {
            None
        };
        if action.is_some() {
            self.typed.clear();
        }
        action
    }
}
