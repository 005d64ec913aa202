use std::{ffi::OsString, path::PathBuf, time::Instant};

use anyhow::{bail, Context};
use clap::{ArgAction, ArgGroup, ArgMatches, CommandFactory, FromArgMatches, Parser};
use something_to_xes::{
    convert_path,
    converter::TRACE_NAME_KEY,
    extensions::Extension,
    pseudonym::PoolKind,
    record::{CSVSourceOptions, ElementSelector},
    typing::ElementaryType,
    ConversionOptions, InputFormat,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Convert CSV or XML event records into a XES event log
///
/// Templates reference raw record fields as `%(field)s`; `%%` is a literal `%`.
#[derive(Debug, Parser)]
#[command(name = "something-to-xes", version)]
#[command(group(ArgGroup::new("format").required(true).args(["csv", "xml"])))]
#[command(group(ArgGroup::new("selector").args(["xpath", "css"])))]
struct Cli {
    /// Input file (`-` or omitted: stdin); gz-compressed input is detected automatically
    input: Option<PathBuf>,

    /// Output file (`-` or omitted: stdout); written gz-compressed if it ends with `.gz`
    output: Option<PathBuf>,

    /// Read CSV records (header row + one record per row)
    #[arg(long)]
    csv: bool,

    /// CSV field delimiter
    #[arg(long, default_value_t = ';', requires = "csv")]
    delimiter: char,

    /// Read XML records (one record per selected element)
    #[arg(long)]
    xml: bool,

    /// XPath selecting the event elements (e.g., `//entry`)
    #[arg(long, requires = "xml")]
    xpath: Option<String>,

    /// CSS selector selecting the event elements (e.g., `log > entry`)
    #[arg(long, requires = "xml")]
    css: Option<String>,

    /// Event attribute mapping
    #[arg(long, num_args = 2, value_names = ["NAME", "TEMPLATE"], action = ArgAction::Append)]
    mapping: Vec<String>,

    /// Trace key template (shorthand for `--trace-mapping concept:name TEMPLATE`); later ones are tried first
    #[arg(long, value_name = "TEMPLATE")]
    trace: Vec<String>,

    /// Trace attribute mapping (must agree for all events of a trace)
    #[arg(long, num_args = 2, value_names = ["NAME", "TEMPLATE"], action = ArgAction::Append)]
    trace_mapping: Vec<String>,

    /// Attribute type (string, date, int, float, boolean, id)
    #[arg(long = "type", num_args = 2, value_names = ["NAME", "TYPE"], action = ArgAction::Append)]
    types: Vec<String>,

    /// Additional XES extension
    #[arg(long, num_args = 3, value_names = ["PREFIX", "NAME", "URI"], action = ArgAction::Append)]
    extension: Vec<String>,

    /// Pseudonymize a raw field (kinds: name, place, uuid)
    #[arg(long, num_args = 2, value_names = ["FIELD", "KIND"], action = ArgAction::Append)]
    pseudonymize: Vec<String>,

    /// Also emit all raw fields as string attributes
    #[arg(long)]
    preserve: bool,

    /// Only emit the first N traces
    #[arg(long, value_name = "N")]
    max_traces: Option<usize>,

    /// Custom date format (chrono syntax), tried before the built-in formats
    #[arg(long, value_name = "FORMAT")]
    date_format: Option<String>,

    /// Seed of the pseudonym pools
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// JSON file with conversion options; flags are applied on top
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v: info, -vv: debug, -vvv: trace); `RUST_LOG` takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// `--trace` and `--trace-mapping` rules in command line order
    #[arg(skip)]
    trace_rules: Vec<(String, String)>,
}

impl Cli {
    fn try_parse_ordered<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        let mut cli = Self::from_arg_matches(&matches)?;
        cli.trace_rules = cli.trace_rules_in_order(&matches);
        Ok(cli)
    }

    /// Interleave `--trace-mapping NAME TEMPLATE` and `--trace TEMPLATE` by their position
    fn trace_rules_in_order(&self, matches: &ArgMatches) -> Vec<(String, String)> {
        let mapping_indices: Vec<usize> = matches
            .indices_of("trace_mapping")
            .map(|i| i.collect())
            .unwrap_or_default();
        let trace_indices: Vec<usize> = matches
            .indices_of("trace")
            .map(|i| i.collect())
            .unwrap_or_default();

        let mut rules: Vec<(usize, String, String)> = self
            .trace_mapping
            .chunks_exact(2)
            .zip(mapping_indices.chunks_exact(2))
            .map(|(pair, index)| (index[0], pair[0].clone(), pair[1].clone()))
            .collect();
        rules.extend(
            self.trace
                .iter()
                .zip(trace_indices)
                .map(|(template, index)| (index, TRACE_NAME_KEY.to_string(), template.clone())),
        );
        rules.sort_by_key(|(index, _, _)| *index);
        rules
            .into_iter()
            .map(|(_, name, template)| (name, template))
            .collect()
    }

    fn input_format(&self) -> anyhow::Result<InputFormat> {
        if self.csv {
            if !self.delimiter.is_ascii() {
                bail!("Delimiter {:?} is not an ASCII character", self.delimiter);
            }
            return Ok(InputFormat::CSV(CSVSourceOptions {
                delimiter: self.delimiter as u8,
                ..Default::default()
            }));
        }
        let selector = match (&self.xpath, &self.css) {
            (Some(xpath), _) => ElementSelector::xpath(xpath)?,
            (None, Some(css)) => ElementSelector::css(css)?,
            (None, None) => bail!("--xml requires --xpath or --css"),
        };
        Ok(InputFormat::XML(selector))
    }

    fn conversion_options(&self) -> anyhow::Result<ConversionOptions> {
        let mut options = match &self.config {
            Some(path) => ConversionOptions::from_json_path(path)
                .with_context(|| format!("Could not load config {}", path.display()))?,
            None => ConversionOptions::default(),
        };
        for pair in self.mapping.chunks_exact(2) {
            options = options.with_event_mapping(&pair[0], &pair[1]);
        }
        for (name, template) in &self.trace_rules {
            options = options.with_trace_mapping(name, template);
        }
        for pair in self.types.chunks_exact(2) {
            let elementary_type: ElementaryType = pair[1].parse()?;
            options = options.with_type(&pair[0], elementary_type);
        }
        for ext in self.extension.chunks_exact(3) {
            options
                .extensions
                .push(Extension::new(&ext[0], &ext[1], &ext[2]));
        }
        for pair in self.pseudonymize.chunks_exact(2) {
            let kind: PoolKind = pair[1].parse()?;
            options = options.with_pseudonymized_field(&pair[0], kind);
        }
        options.preserve |= self.preserve;
        if self.max_traces.is_some() {
            options.max_traces = self.max_traces;
        }
        if self.date_format.is_some() {
            options.date_format.clone_from(&self.date_format);
        }
        if let Some(seed) = self.seed {
            options.pseudonym_seed = seed;
        }
        Ok(options)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::try_parse_ordered(std::env::args_os()).unwrap_or_else(|e| e.exit());
    init_logging(cli.verbose);

    let format = cli.input_format()?;
    let options = cli.conversion_options()?;
    let now = Instant::now();
    let document = convert_path(
        cli.input.as_deref(),
        cli.output.as_deref(),
        format,
        options,
    )
    .context("Conversion failed")?;
    info!(
        traces = document.traces.len(),
        events = document.num_events(),
        "Wrote XES in {:?}",
        now.elapsed()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Cli;

    #[test]
    fn test_pairs_and_overrides() {
        let cli = Cli::try_parse_ordered([
            "something-to-xes",
            "in.csv",
            "out.xes.gz",
            "--csv",
            "--delimiter",
            ",",
            "--mapping",
            "concept:name",
            "%(activity)s",
            "--mapping",
            "time:timestamp",
            "%(ts)s",
            "--trace",
            "%(case)s",
            "--type",
            "amount",
            "float",
            "--pseudonymize",
            "user",
            "name",
            "--max-traces",
            "3",
        ])
        .unwrap();
        let options = cli.conversion_options().unwrap();
        assert_eq!(options.event_mappings.len(), 2);
        assert_eq!(options.event_mappings[1].0, "time:timestamp");
        assert_eq!(
            options.trace_mappings,
            vec![("concept:name".to_string(), "%(case)s".to_string())]
        );
        assert_eq!(options.max_traces, Some(3));
        assert!(cli.input_format().is_ok());
    }

    #[test]
    fn test_trace_rules_keep_command_line_order() {
        let cli = Cli::try_parse_ordered([
            "something-to-xes",
            "--csv",
            "--trace",
            "%(case)s",
            "--trace-mapping",
            "concept:name",
            "%(case)s-%(sub)s",
            "--trace-mapping",
            "ward",
            "%(ward)s",
            "--trace",
            "%(patient)s",
        ])
        .unwrap();
        let options = cli.conversion_options().unwrap();
        let rules: Vec<(&str, &str)> = options
            .trace_mappings
            .iter()
            .map(|(n, t)| (n.as_str(), t.as_str()))
            .collect();
        assert_eq!(
            rules,
            vec![
                ("concept:name", "%(case)s"),
                ("concept:name", "%(case)s-%(sub)s"),
                ("ward", "%(ward)s"),
                ("concept:name", "%(patient)s"),
            ]
        );
    }

    #[test]
    fn test_format_is_required() {
        assert!(Cli::try_parse_ordered(["something-to-xes", "in.csv"]).is_err());
        assert!(Cli::try_parse_ordered(["something-to-xes", "--csv", "--xml"]).is_err());
    }

    #[test]
    fn test_xml_requires_selector() {
        let cli = Cli::try_parse_ordered(["something-to-xes", "--xml"]).unwrap();
        assert!(cli.input_format().is_err());
        let cli = Cli::try_parse_ordered(["something-to-xes", "--xml", "--css", "log > entry"]).unwrap();
        assert!(cli.input_format().is_ok());
    }

    #[test]
    fn test_unknown_type_and_pool() {
        let cli = Cli::try_parse_ordered(["something-to-xes", "--csv", "--type", "a", "decimal"]).unwrap();
        assert!(cli.conversion_options().is_err());
        let cli =
            Cli::try_parse_ordered(["something-to-xes", "--csv", "--pseudonymize", "a", "city"]).unwrap();
        assert!(cli.conversion_options().is_err());
    }
}
