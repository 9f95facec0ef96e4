use crate::lib::environment::Environment;
use crate::lib::error::MeshAuthResult;
use clap::Subcommand;

mod login;
mod paths;
mod schema;
mod whois;

#[derive(Subcommand)]
pub enum MeshAuthCommand {
    Login(login::LoginOpts),
    Paths(paths::PathsOpts),
    Schema(schema::SchemaOpts),
    #[command(name = "whois")]
    WhoIs(whois::WhoIsOpts),
}

pub fn exec(env: &Environment, cmd: MeshAuthCommand) -> MeshAuthResult {
    match cmd {
        MeshAuthCommand::Login(v) => login::exec(env, v),
        MeshAuthCommand::Paths(v) => paths::exec(env, v),
        MeshAuthCommand::Schema(v) => schema::exec(v),
        MeshAuthCommand::WhoIs(v) => whois::exec(env, v),
    }
}

pub fn exec_without_env(cmd: MeshAuthCommand) -> MeshAuthResult {
    match cmd {
        MeshAuthCommand::Schema(v) => schema::exec(v),
        _ => unreachable!("only schema runs without an environment"),
    }
}
