//! Plain-text presentation of display states.

use crate::games::hangman::{Cell, DisplayState, KeyStatus, Outcome};
use crate::replay::ReplayFrame;

/// Gallows drawings indexed by mistake count.
pub const GALLOWS: [&str; 7] = [
    "  +---+\n  |   |\n      |\n      |\n      |\n      |\n=========",
    "  +---+\n  |   |\n  O   |\n      |\n      |\n      |\n=========",
    "  +---+\n  |   |\n  O   |\n  |   |\n      |\n      |\n=========",
    "  +---+\n  |   |\n  O   |\n /|   |\n      |\n      |\n=========",
    "  +---+\n  |   |\n  O   |\n /|\\  |\n      |\n      |\n=========",
    "  +---+\n  |   |\n  O   |\n /|\\  |\n /    |\n      |\n=========",
    "  +---+\n  |   |\n  O   |\n /|\\  |\n / \\  |\n      |\n=========\nGAME OVER",
];

const KEYBOARD_ROW: usize = 11;

/// Returns the gallows drawing for a mistake count, saturating at the last
/// frame.
pub fn gallows(mistakes: u8) -> &'static str {
    GALLOWS[usize::from(mistakes).min(GALLOWS.len() - 1)]
}

/// Word cells separated by spaces: `_` for blanks, lowercase for letters
/// revealed only because the game was lost.
pub fn word_line(state: &DisplayState) -> String {
    state
        .cells()
        .iter()
        .map(|cell| match cell {
            Cell::Blank => "_".to_string(),
            Cell::Revealed(c) => c.to_string(),
            Cell::Missed(c) => c.to_lowercase().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keyboard rows: `+X` hit, `-X` miss, ` X` unused.
pub fn keyboard_lines(state: &DisplayState) -> Vec<String> {
    state
        .keyboard()
        .chunks(KEYBOARD_ROW)
        .map(|row| {
            row.iter()
                .map(|key| {
                    let mark = match key.status {
                        KeyStatus::Unused => ' ',
                        KeyStatus::Hit => '+',
                        KeyStatus::Miss => '-',
                    };
                    format!("{}{}", mark, key.letter)
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Message shown when a game ends.
pub fn outcome_banner(outcome: Outcome) -> Option<&'static str> {
    match outcome {
        Outcome::Playing => None,
        Outcome::Won => Some("YOU WIN! The word was guessed."),
        Outcome::Lost => Some("GAME OVER. No attempts left."),
    }
}

/// Full text rendering of a display state.
pub fn render_text(state: &DisplayState) -> String {
    let mut out = format!(
        "{}\n\n  {}\n  Mistakes: {}/{}\n\n",
        gallows(*state.mistakes()),
        word_line(state),
        state.mistakes(),
        state.max_mistakes()
    );
    for line in keyboard_lines(state) {
        out.push_str("  ");
        out.push_str(&line);
        out.push('\n');
    }
    if let Some(banner) = outcome_banner(*state.outcome()) {
        out.push_str(&format!("\n  {}\n", banner));
    }
    out
}

/// Caption for a replay frame.
pub fn frame_caption(frame: &ReplayFrame) -> String {
    format!(
        "Step {}: player chose {} ({})",
        frame.step_number(),
        frame.letter(),
        frame.result()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::hangman::Session;

    #[test]
    fn test_gallows_saturates() {
        assert_eq!(gallows(0), GALLOWS[0]);
        assert!(gallows(6).ends_with("GAME OVER"));
        assert_eq!(gallows(200), GALLOWS[6]);
    }

    #[test]
    fn test_render_lost_game() {
        let mut session = Session::create("КЛИЕНТ").unwrap();
        for letter in "КАОУЫЪЮ".chars() {
            session.guess(letter).unwrap();
        }
        let text = render_text(&session.render(true));
        assert!(text.contains("К л и е н т"));
        assert!(text.contains("Mistakes: 6/6"));
        assert!(text.contains("GAME OVER. No attempts left."));
        assert!(text.contains("+К"));
        assert!(text.contains("-А"));
    }

    #[test]
    fn test_keyboard_rows_cover_alphabet() {
        let state = Session::create("БАЙТЫ").unwrap().render(false);
        let lines = keyboard_lines(&state);
        assert_eq!(lines.len(), 3);
        let keys: usize = lines.iter().map(|l| l.split(' ').filter(|s| !s.is_empty()).count()).sum();
        assert_eq!(keys, 32);
    }

    #[test]
    fn test_render_playing_layout() {
        let mut session = Session::create("ДА").unwrap();
        session.guess('Д').unwrap();
        let state = session.render(false);
        let text = render_text(&state);

        let expected_head = format!("{}\n\n  Д _\n  Mistakes: 0/6\n\n", GALLOWS[0]);
        assert!(text.starts_with(&expected_head));
        assert!(text.ends_with('\n'));
        assert!(!text.contains("YOU WIN"));
        assert_eq!(text[expected_head.len()..].lines().count(), 3);
    }
}
