//! Turn input parsing and conversation history.

use crate::engine::types::{EngineState, Task};
use crate::preprocessing::Cleaner;

pub fn parse_input(text: &str) -> Task {
    if Cleaner::is_exit_command(text) {
        return Task::Exit;
    }
    match Cleaner::clean(text) {
        Ok(cleaned) => Task::Chat(cleaned),
        Err(e) => Task::Skip(e),
    }
}

pub fn update_state(state: &mut EngineState, user_msg: &str, assistant_msg: &str) {
    state
        .turns
        .push_back((user_msg.to_string(), assistant_msg.to_string()));
    while state.turns.len() > state.max_turns {
        state.turns.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::CleanerError;

    #[test]
    fn exit_words_end_the_loop() {
        assert_eq!(parse_input("EXIT"), Task::Exit);
        assert_eq!(parse_input("  bye \n"), Task::Exit);
        assert_eq!(
            parse_input("bye bye amigo"),
            Task::Chat("bye bye amigo".to_string())
        );
    }

    #[test]
    fn blank_and_oversized_turns_are_skipped() {
        assert_eq!(parse_input("   "), Task::Skip(CleanerError::EmptyInput));
        let long = "a".repeat(Cleaner::MAX_LENGTH + 1);
        assert!(matches!(parse_input(&long), Task::Skip(CleanerError::TooLong(_))));
    }

    #[test]
    fn history_is_capped() {
        let mut state = EngineState::new(2);
        update_state(&mut state, "uno", "one");
        update_state(&mut state, "dos", "two");
        update_state(&mut state, "tres", "three");

        let users: Vec<_> = state.turns.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(users, vec!["dos", "tres"]);
    }
}
