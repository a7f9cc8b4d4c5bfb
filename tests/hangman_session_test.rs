//! Tests for the hangman session state machine.

use strictly_hangman::{
    Cell, GameError, GuessResult, KeyStatus, MAX_MISTAKES, Outcome, Session,
};

fn play(word: &str, letters: &str) -> Session {
    let mut session = Session::create(word).expect("Valid word");
    for letter in letters.chars() {
        session.guess(letter).expect("Valid guess");
    }
    session
}

#[test]
fn test_server_is_won_without_mistakes() {
    let session = play("СЕРВЕР", "ЕСРВ");
    assert_eq!(session.outcome(), Outcome::Won);
    assert_eq!(session.mistakes(), 0);

    let state = session.render(true);
    assert!(state.is_word_revealed());
    assert_eq!(state.masked_word(), "СЕРВЕР");
}

#[test]
fn test_client_is_lost_after_six_misses() {
    let mut session = Session::create("КЛИЕНТ").expect("Valid word");
    for (i, letter) in "АОУЫЪЮ".chars().enumerate() {
        let applied = session.guess(letter).expect("Valid guess");
        assert_eq!(applied.result, GuessResult::Miss);
        let expected = if i + 1 == usize::from(MAX_MISTAKES) {
            Outcome::Lost
        } else {
            Outcome::Playing
        };
        assert_eq!(applied.outcome, expected);
    }
    assert_eq!(session.mistakes(), MAX_MISTAKES);

    let revealed = session.render(true);
    assert_eq!(
        revealed.cells(),
        &"КЛИЕНТ".chars().map(Cell::Missed).collect::<Vec<_>>()
    );
    assert!(!revealed.accepts_input());

    let hidden = session.render(false);
    assert!(hidden.cells().iter().all(|c| *c == Cell::Blank));
}

#[test]
fn test_guess_after_win_is_rejected_without_change() {
    let mut session = play("СЕРВЕР", "ЕСРВ");
    let before = session.clone();
    assert_eq!(
        session.guess('А').unwrap_err(),
        GameError::SessionTerminated(Outcome::Won)
    );
    assert_eq!(session, before);
}

#[test]
fn test_guess_after_loss_is_rejected_without_change() {
    let mut session = play("КЛИЕНТ", "АОУЫЪЮ");
    let before = session.clone();
    assert_eq!(
        session.guess('К').unwrap_err(),
        GameError::SessionTerminated(Outcome::Lost)
    );
    assert_eq!(session, before);
}

#[test]
fn test_duplicate_miss_is_not_counted_twice() {
    let mut session = Session::create("БАЙТЫ").expect("Valid word");
    session.guess('Я').expect("Valid guess");
    assert_eq!(session.mistakes(), 1);

    assert_eq!(
        session.guess('Я').unwrap_err(),
        GameError::DuplicateGuess('Я')
    );
    assert_eq!(session.mistakes(), 1);
    assert_eq!(session.guessed().len(), 1);
}

#[test]
fn test_duplicate_hit_is_rejected() {
    let mut session = Session::create("БАЙТЫ").expect("Valid word");
    session.guess('Б').expect("Valid guess");
    assert_eq!(
        session.guess('б').unwrap_err(),
        GameError::DuplicateGuess('Б')
    );
}

#[test]
fn test_win_on_last_allowed_mistake_margin() {
    // Five misses, then the remaining letters: still a win.
    let session = play("ФАЙЛЫ", "ОУЭЮЯФАЙЛЫ");
    assert_eq!(session.mistakes(), 5);
    assert_eq!(session.outcome(), Outcome::Won);
}

#[test]
fn test_render_is_pure() {
    let session = play("ПАРОЛЬ", "ПЯ");
    let first = session.render(true);
    let second = session.render(true);
    assert_eq!(first, second);
    assert_eq!(session, play("ПАРОЛЬ", "ПЯ"));
}

#[test]
fn test_keyboard_after_mixed_guesses() {
    let session = play("ДОМЕНЫ", "ДЖ");
    let state = session.render(false);
    let find = |letter| state.keyboard().iter().find(|k| k.letter == letter).expect("Key exists");
    assert_eq!(find('Д').status, KeyStatus::Hit);
    assert_eq!(find('Ж').status, KeyStatus::Miss);
    assert_eq!(find('Ы').status, KeyStatus::Unused);
    assert_eq!(*state.max_mistakes(), MAX_MISTAKES);
}
