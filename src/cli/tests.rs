use super::*;
use crate::core::params::DEFAULT_MAX_TOKENS;

mod test_helpers {
    use super::*;

    pub(super) fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }
}

use test_helpers::parse_args;

#[test]
fn no_subcommand_means_chat() {
    let args = parse_args(&["playground"]);
    assert!(args.command.is_none());
    assert!(args.model.is_none());
    assert!(args.log.is_none());
}

#[test]
fn global_flags_parse_after_subcommand() {
    let args = parse_args(&[
        "playground",
        "chat",
        "--model",
        "openai/gpt-oss-120b",
        "--base-url",
        "http://localhost:8080/v1",
        "-l",
        "/tmp/playground.log",
    ]);
    assert!(matches!(args.command, Some(Commands::Chat)));
    assert_eq!(args.model.as_deref(), Some("openai/gpt-oss-120b"));
    assert_eq!(args.base_url.as_deref(), Some("http://localhost:8080/v1"));
    assert_eq!(args.log, Some(PathBuf::from("/tmp/playground.log")));
}

#[test]
fn unknown_model_is_rejected() {
    let err = Args::try_parse_from(["playground", "-m", "gpt-4o"]).expect_err("invalid model");
    assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
}

#[test]
fn say_collects_prompt_words_and_flags() {
    let args = parse_args(&["playground", "say", "--no-stream", "--json", "what", "is", "-1?"]);
    match args.command {
        Some(Commands::Say {
            no_stream,
            json,
            prompt,
        }) => {
            assert!(no_stream);
            assert!(json);
            assert_eq!(prompt, ["what", "is", "-1?"]);
        }
        other => panic!("expected say, got {other:?}"),
    }

    assert!(Args::try_parse_from(["playground", "say"]).is_err());
}

#[test]
fn set_joins_value_words() {
    let args = parse_args(&["playground", "set", "stop-sequence", "The", "End"]);
    match args.command {
        Some(Commands::Set { key, value }) => {
            assert_eq!(key, "stop-sequence");
            assert_eq!(value.join(" "), "The End");
        }
        other => panic!("expected set, got {other:?}"),
    }
}

#[test]
fn flags_override_config_and_commands_adjust_last() {
    let config = Config {
        default_model: Some("llama-3.3-70b-versatile".into()),
        temperature: Some(0.3),
        stream: Some(true),
        ..Default::default()
    };

    let from_config = startup_parameters(&config, None, |_| {});
    assert_eq!(from_config.model, "llama-3.3-70b-versatile");
    assert_eq!(from_config.temperature, 0.3);
    assert_eq!(from_config.max_tokens, DEFAULT_MAX_TOKENS);

    let overridden = startup_parameters(&config, Some("openai/gpt-oss-20b".into()), |seed| {
        seed.streaming = false;
        seed.json_mode = true;
    });
    assert_eq!(overridden.model, "openai/gpt-oss-20b");
    assert!(!overridden.streaming);
    assert!(overridden.json_mode);
    assert_eq!(overridden.temperature, 0.3);
}
