use proptest::prelude::*;
use shell_jobs::parser::{ParsingError, construct_command};
use std::ffi::OsString;

fn os(words: &[String]) -> Vec<OsString> {
    words.iter().map(OsString::from).collect()
}

fn word() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_./=:+,-]{1,12}"
}

fn blanks() -> impl Strategy<Value = String> {
    "[ \t]{1,3}"
}

proptest! {
    #[test]
    fn plain_words_become_argv(words in prop::collection::vec(word(), 0..8), sep in blanks()) {
        let line = words.join(&sep);
        let cmd = construct_command(&line).unwrap();
        prop_assert_eq!(cmd.argv, os(&words));
        prop_assert!(cmd.input.is_none());
        prop_assert!(cmd.output.is_none());
        prop_assert!(!cmd.background);
    }

    #[test]
    fn redirect_targets_round_trip(
        words in prop::collection::vec(word(), 1..4),
        input in word(),
        output in word(),
        input_first in any::<bool>(),
    ) {
        let tail = if input_first {
            format!("< {input} > {output}")
        } else {
            format!(">{output} <{input}")
        };
        let cmd = construct_command(&format!("{} {}", words.join(" "), tail)).unwrap();
        prop_assert_eq!(cmd.argv, os(&words));
        prop_assert_eq!(cmd.input, Some(OsString::from(input)));
        prop_assert_eq!(cmd.output, Some(OsString::from(output)));
    }

    #[test]
    fn parsing_is_deterministic(line in "[a-z<>& \t]{0,30}") {
        prop_assert_eq!(construct_command(&line), construct_command(&line));
    }

    #[test]
    fn words_after_the_tail_are_rejected(
        words in prop::collection::vec(word(), 1..4),
        extra in word(),
    ) {
        let line = format!("{} & {}", words.join(" "), extra);
        prop_assert_eq!(construct_command(&line), Err(ParsingError::UnexpectedToken(extra.into())));
    }

    #[test]
    fn background_marker_counts_once(words in prop::collection::vec(word(), 0..4)) {
        let once = construct_command(&format!("{} &", words.join(" "))).unwrap();
        prop_assert!(once.background);
        prop_assert_eq!(
            construct_command(&format!("{} & &", words.join(" "))),
            Err(ParsingError::Background)
        );
    }
}
