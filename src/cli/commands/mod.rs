pub mod logging;
mod session;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("aula")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-url")
                .short('u')
                .long("api-url")
                .help("Auth service base URL, example: https://api.aula.dev")
                .env("AULA_API_URL")
                .global(true),
        )
        .arg(
            Arg::new("storage-path")
                .long("storage-path")
                .help("File holding the persisted session (default: <config dir>/aula/session.json)")
                .env("AULA_STORAGE_PATH")
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Request timeout in seconds")
                .env("AULA_TIMEOUT_SECONDS")
                .global(true)
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..=300)),
        )
        .arg(
            Arg::new("login-path")
                .long("login-path")
                .help("Route anonymous visitors are redirected to")
                .env("AULA_LOGIN_PATH")
                .global(true)
                .default_value(crate::config::DEFAULT_LOGIN_PATH),
        )
        .arg(
            Arg::new("landing-path")
                .long("landing-path")
                .help("Route visitors without the required role are redirected to")
                .env("AULA_LANDING_PATH")
                .global(true)
                .default_value(crate::config::DEFAULT_LANDING_PATH),
        )
        .subcommands(session::subcommands());

    logging::with_args(command)
}
