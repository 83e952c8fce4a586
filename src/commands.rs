//! CLI command definitions
//!
//! Defines the clap commands for sls-tdd.

use clap::Subcommand;
use std::path::PathBuf;

use crate::testing::InvokeTestOptions;

#[derive(Subcommand)]
pub enum Commands {
    /// Scaffold tests and functions
    #[command(subcommand)]
    Create(CreateCommands),

    /// Run tests
    #[command(subcommand)]
    Invoke(InvokeCommands),
}

#[derive(Subcommand)]
pub enum CreateCommands {
    /// Create a test file for an existing function
    Test {
        /// Name of the function
        #[arg(long, short)]
        function: String,

        /// Folder for the test file (default: test)
        #[arg(long, short)]
        path: Option<String>,
    },

    /// Add a function to serverless.yml with a handler and a test
    Function {
        /// Name of the function
        #[arg(long, short)]
        function: String,

        /// Handler, e.g. src/users/create.handler
        #[arg(long)]
        handler: String,

        /// Folder for the test file (default: test)
        #[arg(long, short)]
        path: Option<String>,

        /// HTTP event as "<VERB> <route>", e.g. "POST api/users"
        /// Can be specified multiple times
        #[arg(long = "httpEvent", alias = "http-event")]
        http_event: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum InvokeCommands {
    /// Run the tests of the service's functions
    Test {
        /// Function to test; all functions when omitted
        /// Can be specified multiple times
        #[arg(long, short)]
        function: Vec<String>,

        /// Runner reporter
        #[arg(long, short = 'R')]
        reporter: Option<String>,

        /// Reporter options as key=value,key2=value2
        #[arg(long = "reporter-options", short = 'O')]
        reporter_options: Option<String>,

        /// Only run tests matching this pattern
        #[arg(long, short = 'G')]
        grep: Option<String>,

        /// Test the deployed function instead of the local code
        #[arg(long, short)]
        live: bool,

        /// Service root of the code under test
        #[arg(long, short)]
        root: Option<PathBuf>,

        /// Folder holding the test files (default: test)
        #[arg(long, short)]
        path: Option<String>,

        /// Compilers as extension:module,extension2:module2
        #[arg(long)]
        compilers: Option<String>,

        /// Force the runner to exit when the tests finish
        #[arg(long)]
        exit: bool,

        /// Stage of the deployed service (live mode)
        #[arg(long, short)]
        stage: Option<String>,

        /// Region of the deployed service (live mode)
        #[arg(long)]
        region: Option<String>,
    },
}

impl InvokeCommands {
    pub fn into_options(self) -> InvokeTestOptions {
        match self {
            InvokeCommands::Test {
                function,
                reporter,
                reporter_options,
                grep,
                live,
                root,
                path,
                compilers,
                exit,
                stage,
                region,
            } => InvokeTestOptions {
                functions: function,
                reporter,
                reporter_options,
                grep,
                live,
                root,
                path,
                compilers,
                exit,
                stage,
                region,
            },
        }
    }
}
