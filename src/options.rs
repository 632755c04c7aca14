//! Parsing Options.
//! `--mode {mode}` or `-m`: simulate, stepgraph or all

use clap::{Arg, Command};
use std::error::Error;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Mode {
    All,
    Simulate,
    StepGraph,
}

fn make_options_parser() -> clap::Command {
    Command::new("pn-step")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Petri net simulation and step graph exploration")
        .arg(
            Arg::new("net")
                .short('n')
                .long("net")
                .value_name("FILE")
                .help("Net to analyse (.json or .ron)")
                .required(true),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .help("What to run on the net")
                .default_value("all")
                .value_parser(["simulate", "stepgraph", "all"]),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML file with exploration limits")
                .default_value("pn-step.toml"),
        )
        .arg(
            Arg::new("dot")
                .short('o')
                .long("dot")
                .value_name("FILE")
                .help("Where to write the step graph in dot format"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub mode: Mode,
    pub net: PathBuf,
    pub config: PathBuf,
    pub dot: Option<PathBuf>,
}

impl Options {
    pub fn parse_from_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let flags = shellwords::split(s)?;
        Self::parse_from_args(&flags)
    }

    pub fn parse_from_args(flags: &[String]) -> Result<Self, Box<dyn Error>> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;
        let mode = match matches.get_one::<String>("mode").map(String::as_str) {
            Some("simulate") => Mode::Simulate,
            Some("stepgraph") => Mode::StepGraph,
            Some("all") | None => Mode::All,
            Some(_) => return Err("UnsupportedMode")?,
        };

        let net = matches
            .get_one::<String>("net")
            .map(PathBuf::from)
            .ok_or("missing --net")?;
        let config = matches
            .get_one::<String>("config")
            .map(PathBuf::from)
            .unwrap_or_default();
        let dot = matches.get_one::<String>("dot").map(PathBuf::from);

        Ok(Options {
            mode,
            net,
            config,
            dot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_str_defaults() {
        let options = Options::parse_from_str("-n nets/mutex.json").unwrap();
        assert_eq!(options.mode, Mode::All);
        assert_eq!(options.net, PathBuf::from("nets/mutex.json"));
        assert_eq!(options.config, PathBuf::from("pn-step.toml"));
        assert_eq!(options.dot, None);
    }

    #[test]
    fn test_parse_from_str_full() {
        let options =
            Options::parse_from_str("--net 'my nets/a.ron' -m stepgraph -o out/sg.dot").unwrap();
        assert_eq!(options.mode, Mode::StepGraph);
        assert_eq!(options.net, PathBuf::from("my nets/a.ron"));
        assert_eq!(options.dot, Some(PathBuf::from("out/sg.dot")));
    }

    #[test]
    fn test_parse_from_str_err() {
        assert!(Options::parse_from_str("-n a.json -m unknown").is_err());
        assert!(Options::parse_from_str("-m simulate").is_err());
    }

    #[test]
    fn test_parse_from_args_err() {
        let options = Options::parse_from_args(&["-k".to_owned(), "unknown".to_owned()]);
        assert!(options.is_err());
    }
}
