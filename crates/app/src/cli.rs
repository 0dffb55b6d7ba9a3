use std::path::PathBuf;

use tracing_subscriber::filter::LevelFilter;

use crate::logging::parse_level;

#[derive(Debug, PartialEq)]
pub(crate) struct CliArgs {
    pub folder: PathBuf,
    pub library: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub save: Option<PathBuf>,
    pub print: bool,
    pub log_level: Option<LevelFilter>,
}

impl CliArgs {
    /// Where the catalog file lives: `--library`, else the directory the
    /// snapshot is saved to, else the working directory.
    pub fn library_dir(&self) -> PathBuf {
        if let Some(library) = &self.library {
            return library.clone();
        }
        self.save
            .as_ref()
            .and_then(|save| save.parent())
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(|parent| parent.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum Command {
    Run(CliArgs),
    Help,
}

fn value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<&'a String, String> {
    iter.next().ok_or_else(|| format!("{flag} requires a value"))
}

/// Parses the arguments after the program name.
pub(crate) fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut folder = None;
    let mut library = None;
    let mut config = None;
    let mut save = None;
    let mut print = false;
    let mut log_level = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--folder" => folder = Some(PathBuf::from(value(&mut iter, "--folder")?)),
            "--library" => library = Some(PathBuf::from(value(&mut iter, "--library")?)),
            "--config" => config = Some(PathBuf::from(value(&mut iter, "--config")?)),
            "--save" => save = Some(PathBuf::from(value(&mut iter, "--save")?)),
            "--print" => print = true,
            "--log-level" => log_level = Some(parse_level(value(&mut iter, "--log-level")?)?),
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(format!("unknown argument {other:?}")),
        }
    }

    let folder = folder.ok_or_else(|| "--folder is required".to_string())?;
    Ok(Command::Run(CliArgs {
        folder,
        library,
        config,
        save,
        print,
        log_level,
    }))
}

pub(crate) fn print_help() {
    println!(
        "Usage: batch_import --folder <dir> [options]\n  \
         --library <dir>       directory holding the asset catalog file\n  \
         --config <path>       import settings (JSON)\n  \
         --save <path>         write the resulting library snapshot (JSON)\n  \
         --print               print the batch report (JSON)\n  \
         --log-level <level>   off, error, warn, info, debug or trace"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_all_options() {
        let command = parse_args(&args(&[
            "--folder",
            "assets",
            "--library",
            "lib",
            "--config",
            "settings.json",
            "--save",
            "out/library.json",
            "--print",
            "--log-level",
            "debug",
        ]))
        .unwrap();
        let Command::Run(cli) = command else {
            panic!("expected run command");
        };
        assert_eq!(cli.folder, PathBuf::from("assets"));
        assert_eq!(cli.config, Some(PathBuf::from("settings.json")));
        assert!(cli.print);
        assert_eq!(cli.log_level, Some(LevelFilter::DEBUG));
        assert_eq!(cli.library_dir(), PathBuf::from("lib"));
    }

    #[test]
    fn library_defaults_to_snapshot_directory() {
        let Command::Run(cli) =
            parse_args(&args(&["--folder", "a", "--save", "out/library.json"])).unwrap()
        else {
            panic!("expected run command");
        };
        assert_eq!(cli.library_dir(), PathBuf::from("out"));

        let Command::Run(cli) = parse_args(&args(&["--folder", "a"])).unwrap() else {
            panic!("expected run command");
        };
        assert_eq!(cli.library_dir(), PathBuf::from("."));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["--folder"])).is_err());
        assert!(parse_args(&args(&["--folder", "a", "--bogus"])).is_err());
        assert_eq!(parse_args(&args(&["-h"])).unwrap(), Command::Help);
    }
}
