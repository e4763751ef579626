use clap::Parser;

/// This is a tabulation program for ranked-choice polls.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the poll description in JSON.
    /// It lists the options, the ballot files and the rules. See the manual of the
    /// preference_tally library for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of a poll in JSON format. If provided, preftally will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the results will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the ballots are read from this file instead of the
    /// sources listed in the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv, csv_likert or json.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (list of comma-separated values or not specified) The names of the options of the poll,
    /// when no configuration file is given. If not specified, the options are the names
    /// found in the ballots, in order of appearance.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub options: Option<Vec<String>>,

    /// If passed as an argument, the test ballots are counted too.
    #[clap(long, takes_value = false)]
    pub include_test: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
