use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Load a CSV file into a SQL Server table
    Load {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        target: TargetArgs,

        /// ADO.NET style connection string, `${VAR}` references are expanded
        #[arg(long)]
        conn_str: String,

        #[arg(long, help = "Optional .env file used to expand the connection string")]
        env_file: Option<String>,

        #[arg(
            long,
            help = "If specified, writes the JSON load report to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Print the CREATE TABLE statement a load would issue
    Plan {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        target: TargetArgs,
    },
    /// Print the inferred column types of a CSV file as JSON
    Inspect {
        #[command(flatten)]
        input: InputArgs,

        #[arg(
            long,
            help = "If specified, writes metadata to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Test a SQL Server connection string
    TestConn {
        #[arg(long)]
        conn_str: String,

        #[arg(long)]
        env_file: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// CSV file to read
    #[arg(long)]
    pub file: String,

    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    #[arg(long, help = "The first line holds data, not column names")]
    pub no_header: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Destination table name, without schema
    #[arg(long)]
    pub table: String,

    #[arg(long, help = "JSON file with load options; flags below override it")]
    pub options: Option<String>,

    #[arg(long)]
    pub schema: Option<String>,

    /// append, replace, fail, delete or truncate
    #[arg(long)]
    pub if_exists: Option<String>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long, help = "Reseed the identity column after delete or truncate")]
    pub reset_identity: bool,

    #[arg(long)]
    pub workers: Option<usize>,

    #[arg(long)]
    pub prefetch: Option<usize>,

    /// Declared NVARCHAR length, as COLUMN=LENGTH; repeatable
    #[arg(long = "string-size", value_name = "COLUMN=LENGTH")]
    pub string_sizes: Vec<String>,
}
