use crate::cli::actions::{account, inspect, Action};
use anyhow::Result;

/// Execute the provided action and print its report.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    let report = match action {
        Action::Login(args) => account::login(args).await?,
        Action::Register(args) => account::register(args).await?,
        Action::Logout(args) => account::logout(&args)?,
        Action::WhoAmI(args) => inspect::whoami(args).await?,
        Action::Visit(args) => inspect::visit(args).await?,
        Action::Can(args) => inspect::can(args).await?,
    };

    println!("{report}");

    Ok(())
}
