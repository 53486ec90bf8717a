//! Read-only precompile queries

use clap::Subcommand;
use exo_sdk::{QueryOperation, QueryResult};

use super::{token_to_json, token_to_text, Session};
use crate::{output::Output, CliError};

/// Query subcommands
#[derive(Debug, Subcommand)]
pub enum QueryCommand {
    /// List registered client chain ids
    ClientChains,
    /// Check whether a client chain is registered
    IsRegisteredClientChain {
        /// Chain id; defaults to the network id
        #[arg(long)]
        client_chain_id: Option<u32>,
    },
}

impl QueryCommand {
    /// Typed query for this command
    pub fn into_query(self, network_id: u32) -> QueryOperation {
        match self {
            QueryCommand::ClientChains => QueryOperation::ClientChains,
            QueryCommand::IsRegisteredClientChain { client_chain_id } => {
                QueryOperation::IsRegisteredClientChain {
                    client_chain_id: client_chain_id.unwrap_or(network_id),
                }
            }
        }
    }

    pub async fn execute(self, session: &Session) -> Result<(), CliError> {
        let query = self.into_query(session.config.network_id);
        let dispatcher = session.dispatcher()?;
        let client = session.client()?;
        let result = dispatcher.query(&client, query).await?;
        report(&result, session.json).print();
        Ok(())
    }
}

fn report(result: &QueryResult, json: bool) -> Output {
    let mut out = Output::new(json)
        .field("operation", &result.operation)
        .field("destination", &result.destination.to_hex());
    for (name, value) in &result.outputs {
        out = out
            .field_value(name, token_to_json(value))
            .line(format!("{}: {}", name, token_to_text(value)));
    }
    out
}
