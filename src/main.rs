use std::env;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use desk_scene::{run_headless, run_interactive, AppConfig, WindowInitError};

const USAGE: &str = "Usage: desk-scene [--title <text>] [--width <px>] [--height <px>] \
[--assets <dir>] [--headless] [--frames <n>]";

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,desk_scene=info"),
    )
    .init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;

    if options.headless {
        let stdout = io::stdout();
        return run_headless(&options.config, options.frames, &mut stdout.lock())
            .context("headless run failed");
    }

    match run_interactive(options.config) {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => Err(err.context(
            "no window could be opened (set DISPLAY or run with --headless)",
        )),
        Err(err) => Err(err),
    }
}

#[derive(Debug)]
struct CliOptions {
    config: AppConfig,
    headless: bool,
    frames: u32,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut config = AppConfig::default();
        let mut headless = false;
        let mut frames = 1;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--title" => config.title = value_of(&arg, args.next())?,
                "--width" => config.width = parse_value(&arg, args.next())?,
                "--height" => config.height = parse_value(&arg, args.next())?,
                "--assets" => config.assets = PathBuf::from(value_of(&arg, args.next())?),
                "--frames" => frames = parse_value(&arg, args.next())?,
                "--headless" => headless = true,
                "--help" | "-h" => return Err(anyhow!(USAGE)),
                other => return Err(anyhow!("Unknown argument: {other}. {USAGE}")),
            }
        }

        if config.width == 0 || config.height == 0 {
            return Err(anyhow!("window size must be non-zero"));
        }

        Ok(Self {
            config,
            headless,
            frames,
        })
    }
}

fn value_of(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))
}

fn parse_value<T>(flag: &str, value: Option<String>) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = value_of(flag, value)?;
    value
        .parse()
        .with_context(|| format!("invalid value for {flag}: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions> {
        CliOptions::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn defaults_without_arguments() {
        let options = parse(&[]).unwrap();
        assert!(!options.headless);
        assert_eq!(options.frames, 1);
        assert_eq!(options.config, AppConfig::default());
    }

    #[test]
    fn flags_override_config() {
        let options = parse(&[
            "--title", "Desk", "--width", "1024", "--height", "768", "--assets", "/tmp/a",
            "--headless", "--frames", "3",
        ])
        .unwrap();
        assert!(options.headless);
        assert_eq!(options.frames, 3);
        assert_eq!(options.config.title, "Desk");
        assert_eq!((options.config.width, options.config.height), (1024, 768));
        assert_eq!(options.config.assets, PathBuf::from("/tmp/a"));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["--width"]).is_err());
        assert!(parse(&["--width", "wide"]).is_err());
        assert!(parse(&["--height", "0"]).is_err());
    }
}
