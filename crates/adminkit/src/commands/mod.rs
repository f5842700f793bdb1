//! Command dispatch for everything that talks to the server.

pub mod config_cmd;
pub mod request;
pub mod screen;
pub mod util;

use adminkit_api::ApiClient;
use adminkit_core::Screen;

use crate::cli::{Command, GlobalOpts, PostsCommand};
use crate::error::CliError;

/// Run a server command. `page_size` is the configured default list size.
pub async fn dispatch(
    cmd: Command,
    client: &ApiClient,
    global: &GlobalOpts,
    page_size: u32,
) -> Result<(), CliError> {
    match cmd {
        Command::Users(args) => {
            screen::handle(client, &Screen::users(), args.command, global, page_size).await
        }
        Command::Posts(args) => {
            let posts = Screen::posts();
            match args.command {
                PostsCommand::Crud(command) => {
                    screen::handle(client, &posts, command, global, page_size).await
                }
                PostsCommand::Move(args) => {
                    screen::move_row(client, &posts, args, global, page_size).await
                }
            }
        }
        Command::Request(args) => request::handle(client, args, global).await,
        Command::Hello(args) => request::hello(client, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to server dispatch".into(),
        )),
    }
}
