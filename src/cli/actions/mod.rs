pub mod account;
pub mod inspect;

// Internal "interpreter" for `Action`.
// We keep the match in a separate module so `mod.rs` stays small as more actions are added.
mod run;

#[derive(Debug)]
pub enum Action {
    Login(account::LoginArgs),
    Register(account::RegisterArgs),
    Logout(account::LogoutArgs),
    WhoAmI(inspect::WhoAmIArgs),
    Visit(inspect::VisitArgs),
    Can(inspect::CanArgs),
}

impl Action {
    // Convenience wrapper so call sites can do `action.execute().await`.
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
