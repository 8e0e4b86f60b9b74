#[cfg(test)]
mod tests {
    use crate::cli::{CliApp, Commands, ParseError, ReaderCommand};
    use chrono::NaiveDate;
    use clap::Parser;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_navigation_commands() {
        assert_eq!(CliApp::parse_command("today").unwrap(), ReaderCommand::Today);
        assert_eq!(CliApp::parse_command("next").unwrap(), ReaderCommand::Next);
        assert_eq!(CliApp::parse_command("prev").unwrap(), ReaderCommand::Previous);
        assert_eq!(CliApp::parse_command("previous").unwrap(), ReaderCommand::Previous);
        assert_eq!(CliApp::parse_command("retry").unwrap(), ReaderCommand::Retry);
    }

    #[test]
    fn test_parse_date_command() {
        assert_eq!(
            CliApp::parse_command("date 2026-12-25").unwrap(),
            ReaderCommand::Date(date(2026, 12, 25))
        );

        match CliApp::parse_command("date") {
            Err(ParseError::MissingArgument { command, .. }) => assert_eq!(command, "date"),
            other => panic!("Expected MissingArgument, got {:?}", other),
        }

        match CliApp::parse_command("date christmas") {
            Err(ParseError::InvalidDate { input }) => assert_eq!(input, "christmas"),
            other => panic!("Expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_playback_words_all_toggle() {
        for word in ["play", "pause", "toggle", "PLAY"] {
            assert_eq!(CliApp::parse_command(word).unwrap(), ReaderCommand::Toggle, "{}", word);
        }
    }

    #[test]
    fn test_parse_views_and_info() {
        assert_eq!(CliApp::parse_command("read").unwrap(), ReaderCommand::Read);
        assert_eq!(CliApp::parse_command("reflect").unwrap(), ReaderCommand::Reflect);
        assert_eq!(CliApp::parse_command("reflection").unwrap(), ReaderCommand::Reflect);
        assert_eq!(CliApp::parse_command("status").unwrap(), ReaderCommand::Status);
        assert_eq!(CliApp::parse_command("devices").unwrap(), ReaderCommand::Devices);
        assert_eq!(CliApp::parse_command("quit").unwrap(), ReaderCommand::Exit);
        assert_eq!(CliApp::parse_command("  exit  ").unwrap(), ReaderCommand::Exit);
    }

    #[test]
    fn test_parse_volume() {
        assert_eq!(CliApp::parse_command("volume 0").unwrap(), ReaderCommand::Volume(0));
        assert_eq!(CliApp::parse_command("volume 100").unwrap(), ReaderCommand::Volume(100));

        match CliApp::parse_command("volume 101") {
            Err(ParseError::InvalidArgument { expected, .. }) => assert_eq!(expected, "0-100"),
            other => panic!("Expected InvalidArgument, got {:?}", other),
        }
        match CliApp::parse_command("volume loud") {
            Err(ParseError::InvalidArgument { value, expected, .. }) => {
                assert_eq!(value, "loud");
                assert_eq!(expected, "number 0-100");
            }
            other => panic!("Expected InvalidArgument, got {:?}", other),
        }
        assert!(matches!(
            CliApp::parse_command("volume"),
            Err(ParseError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(CliApp::parse_command(""), Err(ParseError::EmptyCommand)));
        assert!(matches!(CliApp::parse_command("   "), Err(ParseError::EmptyCommand)));
        assert!(matches!(CliApp::parse_command("help"), Err(ParseError::HelpRequested)));

        match CliApp::parse_command("seek 1:30") {
            Err(ParseError::UnknownCommand { command }) => assert_eq!(command, "seek"),
            other => panic!("Expected UnknownCommand, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_messages() {
        let error = ParseError::InvalidDate { input: "2026-13-01".to_string() };
        assert_eq!(error.to_string(), "Invalid date '2026-13-01', expected YYYY-MM-DD");

        let error = ParseError::MissingArgument {
            command: "volume".to_string(),
            argument: "level".to_string(),
        };
        assert_eq!(error.to_string(), "Missing argument for volume: level");
    }

    #[test]
    fn test_one_shot_arguments() {
        let app = CliApp::try_parse_from(["liturgy", "read", "--date", "2026-10-04"]).unwrap();
        match app.command {
            Some(Commands::Read { date: Some(d) }) => assert_eq!(d, date(2026, 10, 4)),
            other => panic!("Expected Read with date, got {:?}", other),
        }

        let app = CliApp::try_parse_from(["liturgy", "--config", "/tmp/reader.toml", "play"]).unwrap();
        assert_eq!(app.config.as_deref(), Some(std::path::Path::new("/tmp/reader.toml")));
        assert!(matches!(app.command, Some(Commands::Play { date: None })));

        let app = CliApp::try_parse_from(["liturgy"]).unwrap();
        assert!(app.command.is_none());

        assert!(CliApp::try_parse_from(["liturgy", "reflect", "--date", "tomorrow"]).is_err());
    }
}
