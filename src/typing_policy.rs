use crate::key::Key;
use crate::session::{Session, Status};

/// Apply one keystroke to a session, returning the next state.
///
/// Finished sessions, ignored keys and backspace at the start of the prompt
/// return an identical copy. The first accepted character moves an idle
/// session to running.
pub fn apply(session: &Session, key: Key) -> Session {
    let mut next = session.clone();
    if session.status == Status::Finished {
        return next;
    }

    match key {
        Key::Backspace => backspace(&mut next),
        Key::Char(c) => write(&mut next, c),
        Key::Ignored => {}
    }

    next
}

fn backspace(session: &mut Session) {
    if session.cursor == 0 {
        return;
    }

    let expected = session.expected_char(session.cursor - 1);
    if let Some(removed) = session.typed.pop() {
        if Some(removed) == expected {
            session.correct = session.correct.saturating_sub(1);
        } else {
            session.incorrect = session.incorrect.saturating_sub(1);
        }
        session.cursor -= 1;
    }
}

fn write(session: &mut Session, c: char) {
    let Some(expected) = session.expected_char(session.cursor) else {
        return;
    };

    if session.status == Status::Idle {
        session.status = Status::Running;
    }

    let is_correct = c == expected;
    if is_correct {
        session.correct += 1;
    } else {
        session.incorrect += 1;
    }

    let tally = session.key_tally.entry(fold(c)).or_default();
    if is_correct {
        tally.correct += 1;
    } else {
        tally.incorrect += 1;
    }

    session.typed.push(c);
    session.cursor += 1;

    if session.cursor == session.prompt_len() {
        session.status = Status::Finished;
    }
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}
