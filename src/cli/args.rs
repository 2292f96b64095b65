use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "disneycards",
    version,
    about = "browse Disney characters and keep your favourites",
    long_about = "disneycards lists characters from the Disney character catalog, searches them by name and keeps a persisted list of favourites.\n\nExamples:\n  disneycards\n  disneycards fav 4703\n  disneycards search mickey --search-mode swap\n  disneycards close 4703\n  disneycards shell\n\nTip: Use --config to persist settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'q',
        long = "qt",
        visible_alias = "quiet",
        global = true,
        help_heading = "Output",
        help = "Only log errors."
    )]
    pub quiet: bool,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        global = true,
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        global = true,
        help_heading = "Output",
        help = "Also write the final lists to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'O',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        global = true,
        help_heading = "Output",
        help = "Output format (text, json or html)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.disneycards/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        global = true,
        help_heading = "Input",
        help = "Write a commented default config file if none exists, then continue."
    )]
    pub init_config: bool,

    #[arg(
        short = 's',
        long = "st",
        visible_alias = "storage",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "File that keeps favourites between runs."
    )]
    pub storage: Option<String>,

    #[arg(
        short = 'u',
        long = "api",
        visible_alias = "api-url",
        value_name = "URL",
        global = true,
        help_heading = "Catalog",
        help = "Base URL of the character catalog."
    )]
    pub api_url: Option<String>,

    #[arg(
        short = 'n',
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        global = true,
        help_heading = "Catalog",
        help = "Number of characters fetched on start."
    )]
    pub page_size: Option<u32>,

    #[arg(
        short = 'm',
        long = "sm",
        visible_alias = "search-mode",
        value_name = "MODE",
        global = true,
        help_heading = "Catalog",
        help = "Where search results go: replace (the character list) or swap (a separate list)."
    )]
    pub search_mode: Option<String>,

    #[arg(
        long = "ph",
        visible_alias = "placeholder-image",
        value_name = "URL",
        global = true,
        help_heading = "Catalog",
        help = "Image shown for characters without a picture."
    )]
    pub placeholder_image: Option<String>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<usize>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load the default page and print the lists (default).
    List,
    /// Mark or unmark characters as favourites, as if their cards were clicked.
    Fav {
        #[arg(value_name = "ID", required = true)]
        ids: Vec<i64>,
    },
    /// Remove favourites through their close control.
    Close {
        #[arg(value_name = "ID", required = true)]
        ids: Vec<i64>,
    },
    /// Search characters by name.
    Search {
        #[arg(value_name = "TEXT", default_value = "")]
        text: String,
    },
    /// Remove every favourite.
    Reset,
    /// Print the favourites without contacting the catalog.
    Favourites,
    /// Read commands from stdin until `quit`.
    Shell,
}
