//! Subcommands that drive the session store and the route guard.

use crate::authz::Role;
use clap::{builder::PossibleValuesParser, Arg, Command};

fn role_values() -> PossibleValuesParser {
    PossibleValuesParser::new(Role::ALL.map(Role::as_str))
}

fn email_arg() -> Arg {
    Arg::new("email")
        .short('e')
        .long("email")
        .help("Account email")
        .env("AULA_EMAIL")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new("password")
        .long("password")
        .help("Account password")
        .env("AULA_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn subcommands() -> Vec<Command> {
    vec![
        Command::new("login")
            .about("Sign in and persist the session")
            .arg(email_arg())
            .arg(password_arg()),
        Command::new("register")
            .about("Create an account and sign in with it")
            .arg(
                Arg::new("first-name")
                    .long("first-name")
                    .help("Given name")
                    .required(true),
            )
            .arg(
                Arg::new("last-name")
                    .long("last-name")
                    .help("Family name")
                    .required(true),
            )
            .arg(email_arg())
            .arg(password_arg())
            .arg(
                Arg::new("role")
                    .long("role")
                    .help("Requested role (the service may ignore it)")
                    .value_parser(role_values()),
            ),
        Command::new("logout").about("Forget the persisted session"),
        Command::new("whoami").about("Resolve the persisted session and show the identity"),
        Command::new("visit")
            .about("Run the route guard for a path and print the decision")
            .arg(
                Arg::new("path")
                    .help("Client route, e.g. /admin or /courses/rust-101")
                    .required(true),
            ),
        Command::new("can")
            .about("Ranked permission check for the current identity")
            .arg(
                Arg::new("role")
                    .help("Minimum role")
                    .required(true)
                    .value_parser(role_values()),
            ),
    ]
}
