use clap::Parser;

/// Terminal dashboard for commercial performance against monthly quotas.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file overriding the built-in feed URL,
    /// cache validity, quota table and alias table.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (url, optional) The published CSV feed to load. Overrides the URL from the
    /// configuration file.
    #[clap(short, long, value_parser)]
    pub source: Option<String>,

    /// (default monthly) The view to render: intro, monthly, annual, totals or help.
    #[clap(long, value_parser)]
    pub view: Option<String>,

    /// (optional) Restrict the analysis to the given year. Defaults to the most recent
    /// year present in the data.
    #[clap(short, long, value_parser)]
    pub year: Option<i32>,

    /// (list of comma-separated month names or not specified) Restrict the analysis to the
    /// given months. Portuguese and English month names are accepted.
    #[clap(long, value_parser, use_value_delimiter = true, value_delimiter = ',')]
    pub months: Option<Vec<String>>,

    /// (list of comma-separated names or not specified) Restrict the analysis to the given
    /// representatives.
    #[clap(long, value_parser, use_value_delimiter = true, value_delimiter = ',')]
    pub reps: Option<Vec<String>>,

    /// (default ano) Period preset for the annual view: ano (full year), sem1 or sem2.
    /// Ignored when --months is specified.
    #[clap(long, value_parser)]
    pub period: Option<String>,

    /// (file path, 'stdout' or empty) If specified, a summary of the aggregation will be
    /// written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing an aggregation summary in JSON format. If
    /// provided, quotadash will check that the produced summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
