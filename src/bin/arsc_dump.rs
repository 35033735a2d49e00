use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use arsc_decoder::json_output::table_to_json;
use arsc_decoder::{ArscParser, ParserSettings, ResourceTable};

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

struct ArscDump {
    parser_settings: ParserSettings,
    input: PathBuf,
    output: Option<PathBuf>,
    include_values: bool,
    indent: bool,
    verbosity_level: Option<LevelFilter>,
}

impl ArscDump {
    pub fn from_cli_matches(matches: &ArgMatches) -> Result<Self> {
        let input = PathBuf::from(
            matches
                .get_one::<String>("INPUT")
                .context("an input file is required")?,
        );

        let verbosity_level = match matches.get_count("verbose") {
            0 => None,
            1 => Some(LevelFilter::Info),
            2 => Some(LevelFilter::Debug),
            3 => Some(LevelFilter::Trace),
            _ => {
                eprintln!("using more than -vvv does not affect verbosity level");
                Some(LevelFilter::Trace)
            }
        };

        Ok(ArscDump {
            parser_settings: ParserSettings::new().keep_broken(matches.get_flag("keep-broken")),
            input,
            output: matches
                .get_one::<String>("output-target")
                .map(PathBuf::from),
            include_values: matches.get_flag("values"),
            indent: !matches.get_flag("no-indent"),
            verbosity_level,
        })
    }

    pub fn run(&self) -> Result<()> {
        self.try_to_initialize_logging();

        let parser = ArscParser::from_path(&self.input)
            .with_context(|| format!("failed to read `{}`", self.input.display()))?
            .with_configuration(self.parser_settings.clone());

        let mut table = ResourceTable::new();
        let data = parser
            .decode_into(&mut table)
            .with_context(|| format!("failed to decode `{}`", self.input.display()))?;
        let anomalies = data.diagnostics.len();
        table.load_decoded(data)?;

        let json = table_to_json(&table, self.include_values);
        let mut out: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(Self::create_output_file(path)?),
            None => Box::new(io::stdout().lock()),
        };
        if self.indent {
            serde_json::to_writer_pretty(&mut out, &json)?;
        } else {
            serde_json::to_writer(&mut out, &json)?;
        }
        writeln!(out)?;
        out.flush()?;

        if anomalies > 0 {
            eprintln!("decoded with {anomalies} tolerated anomalies (use -v to see them)");
        }
        Ok(())
    }

    fn create_output_file(path: &Path) -> Result<File> {
        if path.is_dir() {
            bail!(
                "There is a directory at {}, refusing to overwrite",
                path.display()
            );
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(File::create(path)?)
    }

    fn try_to_initialize_logging(&self) {
        if let Some(level) = self.verbosity_level {
            if let Err(e) = TermLogger::init(
                level,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ) {
                eprintln!("Failed to initialize logging: {e}");
            }
        }
    }
}

fn command() -> Command {
    Command::new("arsc_dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility to decode Android compiled resource tables (resources.arsc)")
        .arg(Arg::new("INPUT").required(true))
        .arg(
            Arg::new("keep-broken")
                .long("keep-broken")
                .action(ArgAction::SetTrue)
                .help("Keep resources under invalid configurations and let duplicates overwrite each other."),
        )
        .arg(
            Arg::new("values")
                .long("values")
                .action(ArgAction::SetTrue)
                .help("Include the value of every resource in every configuration."),
        )
        .arg(
            Arg::new("output-target")
                .long("output")
                .short('f')
                .value_name("FILE")
                .help("Writes output to the file specified instead of stdout. Will create parent directories if needed."),
        )
        .arg(
            Arg::new("no-indent")
                .long("no-indent")
                .action(ArgAction::SetTrue)
                .help("When set, output will not be indented."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("-v - info, -vv - debug, -vvv - trace. Trace output is only available in debug builds."),
        )
}

fn main() {
    let matches = command().get_matches();

    let result = ArscDump::from_cli_matches(&matches).and_then(|app| app.run());
    if let Err(e) = result {
        eprintln!("{e:?}");
        exit(1);
    }
}
