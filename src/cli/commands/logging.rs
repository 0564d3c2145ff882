use clap::{builder::ValueParser, Arg, ArgMatches, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Names accepted by `TICKBOX_LOG_LEVEL`, indexed by the equivalent `-v` count.
const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accept either a level name or its `-v` count.
fn parse_log_level(value: &str) -> Result<u8, String> {
    let value = value.trim();
    let index = value.parse::<usize>().ok().map_or_else(
        || {
            LEVEL_NAMES
                .iter()
                .position(|name| name.eq_ignore_ascii_case(value))
        },
        |count| (count < LEVEL_NAMES.len()).then_some(count),
    );

    index
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| {
            format!(
                "invalid log level '{value}', expected 0-{} or one of: {}",
                LEVEL_NAMES.len() - 1,
                LEVEL_NAMES.join(", ")
            )
        })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log level: repeat -v or set error, warn, info, debug, trace (default: error)")
            .env("TICKBOX_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(ValueParser::new(parse_log_level)),
    )
}

/// The `-v` count, or the count matching `TICKBOX_LOG_LEVEL`.
#[must_use]
pub fn verbosity(matches: &ArgMatches) -> u8 {
    matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(parse_log_level("error"), Ok(0));
        assert_eq!(parse_log_level(" Info "), Ok(2));
        assert_eq!(parse_log_level("TRACE"), Ok(4));
    }

    #[test]
    fn parses_counts_within_range() {
        assert_eq!(parse_log_level("0"), Ok(0));
        assert_eq!(parse_log_level("3"), Ok(3));
        assert!(parse_log_level("5").is_err());
    }

    #[test]
    fn rejects_unknown_levels() {
        let err = parse_log_level("loud").err().unwrap_or_default();
        assert!(err.contains("loud"));
        assert!(err.contains("debug"));
    }
}
