mod debug_report;

use std::io::{self, IsTerminal, Read};
use tokalign::{AlignOptions, Entity, Mention, MentionKind, Slack, align_with, regex};
use tracing_subscriber::EnvFilter;

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    init_tracing(config.verbosity);

    let tokens = tokenize(&config.text);
    match align_with(&config.text, tokens.iter().copied(), &config.entities, &config.options) {
        Ok(out) => debug_report::print_run(&config.text, &tokens, &out, config.color),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

struct CliConfig {
    text: String,
    entities: Vec<Entity>,
    options: AlignOptions,
    color: bool,
    verbosity: u8,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut text: Option<String> = None;
    let mut entities: Vec<Entity> = Vec::new();
    let mut options = AlignOptions::default();
    let mut color = io::stdout().is_terminal();
    let mut verbosity = 0u8;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("tokalign {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "-v" => verbosity = verbosity.saturating_add(1),
            "-vv" => verbosity = verbosity.saturating_add(2),
            "--all-mentions" => options.include_nominal_and_pronominal = true,
            "--text" | "-t" => {
                let value = args.next().ok_or_else(|| "error: --text expects a value".to_string())?;
                set_text(&mut text, value)?;
            }
            "--mention" | "-m" => {
                let value = args.next().ok_or_else(|| "error: --mention expects a value".to_string())?;
                add_mention(&mut entities, &value)?;
            }
            "--no-slack" => {
                let value = args.next().ok_or_else(|| "error: --no-slack expects a value".to_string())?;
                disable_slack(&mut options, &value)?;
            }
            _ if arg.starts_with("--text=") => {
                set_text(&mut text, arg.trim_start_matches("--text=").to_string())?;
            }
            _ if arg.starts_with("--mention=") => {
                add_mention(&mut entities, arg.trim_start_matches("--mention="))?;
            }
            _ if arg.starts_with("--no-slack=") => {
                disable_slack(&mut options, arg.trim_start_matches("--no-slack="))?;
            }
            _ => return Err(format!("error: unknown option '{arg}'")),
        }
    }

    let text = match text {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if text.trim().is_empty() {
        return Err(format!("error: no text provided\n\n{}", help_text()));
    }
    if entities.is_empty() {
        return Err(format!("error: no mentions provided\n\n{}", help_text()));
    }

    Ok(CliConfig { text, entities, options, color, verbosity })
}

fn set_text(text: &mut Option<String>, value: String) -> Result<(), String> {
    if text.is_some() {
        return Err("error: text provided multiple times".to_string());
    }
    *text = Some(value);
    Ok(())
}

fn disable_slack(options: &mut AlignOptions, name: &str) -> Result<(), String> {
    let slack: Slack = name.parse().map_err(|err| format!("error: {err}"))?;
    options.slack.remove(slack.flag());
    Ok(())
}

/// Parse `[ENTITY/]LABEL:KIND:OFFSET+LENGTH` and file the mention under its
/// entity. Mentions without an entity id get one of their own, named with a
/// `/` so it can never match an id given on the command line.
fn add_mention(entities: &mut Vec<Entity>, value: &str) -> Result<(), String> {
    let re = regex!(r"^(?:(?P<entity>[^/:]+)/)?(?P<label>[^:/]+):(?P<kind>[A-Z]+):(?P<offset>\d+)\+(?P<length>\d+)$");
    let caps = re
        .captures(value)
        .ok_or_else(|| format!("error: invalid --mention '{value}' (expected [ENTITY/]LABEL:KIND:OFFSET+LENGTH)"))?;

    let label = &caps["label"];
    let kind: MentionKind = caps["kind"].parse().map_err(|err| format!("error: {err}"))?;
    let offset: usize = caps["offset"].parse().map_err(|err| format!("error: invalid offset in '{value}': {err}"))?;
    let length: usize = caps["length"].parse().map_err(|err| format!("error: invalid length in '{value}': {err}"))?;
    let id = match caps.name("entity") {
        Some(m) => m.as_str().to_string(),
        None => format!("mention/{}", entities.iter().map(|e| e.mentions.len()).sum::<usize>() + 1),
    };

    let mention = Mention::new(label, kind, offset, length);
    match entities.iter_mut().find(|e| e.id == id) {
        Some(entity) => entity.push(mention),
        None => {
            let mut entity = Entity::new(id, label);
            entity.push(mention);
            entities.push(entity);
        }
    }
    Ok(())
}

/// Word runs and single punctuation marks, as byte spans.
fn tokenize(text: &str) -> Vec<(usize, usize)> {
    regex!(r"\w+|[^\w\s]").find_iter(text).map(|m| (m.start(), m.end())).collect()
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "tokalign {version}

Align character-offset mentions onto word tokens.

Usage:
  tokalign [OPTIONS] --text <text> --mention <mention>...
  echo <text> | tokalign [OPTIONS] --mention <mention>...

Options:
  -t, --text <text>          Source text. Read from stdin when omitted.
  -m, --mention <mention>    Mention as [ENTITY/]LABEL:KIND:OFFSET+LENGTH, where
                             KIND is NAM, NOM or PRO. Repeatable; mentions
                             sharing an ENTITY id are grouped in order.
  --all-mentions             Keep NOM and PRO mentions (mention layer).
  --no-slack <name>          Disable a tolerance: {slacks}.
                             Repeatable.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -v, -vv                    Log offset errors at info / debug level.
                             RUST_LOG overrides this.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Exit codes:
  0  Success.
  1  Alignment failed.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        slacks = Slack::ALL.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_words_and_punctuation() {
        assert_eq!(tokenize("Dr. Smith's"), vec![(0, 2), (2, 3), (4, 9), (9, 10), (10, 11)]);
    }

    #[test]
    fn mentions_group_by_entity_id() {
        let mut entities = Vec::new();
        add_mention(&mut entities, "e1/PER:NAM:0+5").unwrap();
        add_mention(&mut entities, "ORG:NOM:10+3").unwrap();
        add_mention(&mut entities, "e1/PER:PRO:20+3").unwrap();

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].id, "e1");
        assert_eq!(entities[0].mentions.len(), 2);
        assert_eq!(entities[0].mentions[1].kind, MentionKind::Pronominal);
        assert_eq!(entities[1].label, "ORG");
    }

    #[test]
    fn unnamed_mentions_never_join_a_named_entity() {
        let mut entities = Vec::new();
        add_mention(&mut entities, "PER:NAM:0+5").unwrap();
        add_mention(&mut entities, "m2/ORG:NAM:6+3").unwrap();
        add_mention(&mut entities, "m3/ORG:NAM:10+3").unwrap();
        add_mention(&mut entities, "LOC:NAM:14+4").unwrap();

        let ids: Vec<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["mention/1", "m2", "m3", "mention/4"]);
        assert!(entities.iter().all(|e| e.mentions.len() == 1));
    }

    #[test]
    fn malformed_mentions_are_rejected() {
        let mut entities = Vec::new();
        assert!(add_mention(&mut entities, "PER:NAM:5").is_err());
        assert!(add_mention(&mut entities, "PER:XYZ:0+5").is_err());
        assert!(entities.is_empty());
    }

    #[test]
    fn disabling_a_slack_clears_its_flag() {
        let mut options = AlignOptions::default();
        disable_slack(&mut options, "subword-end").unwrap();
        assert!(!options.slack.contains(Slack::SubwordEnd.flag()));
        assert!(options.slack.contains(Slack::TrailingDelimiter.flag()));
        assert!(disable_slack(&mut options, "fuzzy").is_err());
    }
}
