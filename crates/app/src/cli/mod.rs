use clap::{Parser, Subcommand};

mod token;

#[derive(Debug, Parser)]
#[command(name = "tollgate-app", about = "Tollgate admin CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Token(token::TokenCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Token(command) => token::run(command).await,
        }
    }
}
