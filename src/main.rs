// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod api;
mod command;
mod config;
mod credential;
mod error;
mod gate;
mod metadata;
mod model;
mod password;
mod pipeline;
mod session;
mod storage;
mod transport;

use std::{path::PathBuf, process, sync::Arc};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use command::Context;
use config::Config;
use credential::{CookieJar, CookieStore, CredentialStore, Credentials};
use error::Result;
use gate::Route;
use log::{debug, error, warn};
use pipeline::{ExpiryHandler, Pipeline};
use session::Session;
use storage::{IsPersistent, Storage};
use transport::{HttpTransport, Transport};
use url::Url;

#[derive(Debug, Subcommand)]
enum Command {
    Login(command::account::Login),
    Logout(command::account::Logout),
    Register(command::account::Register),
    Status(command::account::Status),
    Dashboard(command::dashboard::Command),
    Task(command::task::Command),
    Label(command::label::Command),
    Open(command::open::Command),
}

#[async_trait]
impl command::Command for Command {
    fn route(&self) -> Option<Route> {
        match *self {
            Self::Login(ref cmd) => cmd.route(),
            Self::Logout(ref cmd) => cmd.route(),
            Self::Register(ref cmd) => cmd.route(),
            Self::Status(ref cmd) => cmd.route(),
            Self::Dashboard(ref cmd) => cmd.route(),
            Self::Task(ref cmd) => cmd.route(),
            Self::Label(ref cmd) => cmd.route(),
            Self::Open(ref cmd) => cmd.route(),
        }
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            Self::Login(cmd) => cmd.execute(ctx).await,
            Self::Logout(cmd) => cmd.execute(ctx).await,
            Self::Register(cmd) => cmd.execute(ctx).await,
            Self::Status(cmd) => cmd.execute(ctx).await,
            Self::Dashboard(cmd) => cmd.execute(ctx).await,
            Self::Task(cmd) => cmd.execute(ctx).await,
            Self::Label(cmd) => cmd.execute(ctx).await,
            Self::Open(cmd) => cmd.execute(ctx).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The base URL of the TaskMaster API.
    #[arg(long, env = "TASKMASTER_API_BASE_URL", default_value = config::DEFAULT_BASE_URL, value_parser = Url::parse)]
    url: Url,

    /// The name of the cookie that carries the access token.
    #[arg(long, env = "TASKMASTER_COOKIE_NAME", default_value = config::DEFAULT_COOKIE_NAME)]
    cookie_name: String,

    /// How many days a login stays valid on this machine.
    #[arg(long, env = "TASKMASTER_TOKEN_DAYS", default_value_t = config::DEFAULT_TOKEN_DAYS)]
    token_days: u32,

    /// Where to keep the session cookie. Defaults to the user's data
    /// directory.
    #[arg(long, env = "TASKMASTER_COOKIE_FILE", value_hint = clap::ValueHint::FilePath)]
    cookie_file: Option<PathBuf>,

    /// Keep the session in memory only, so it ends with this process.
    #[arg(long, conflicts_with = "cookie_file")]
    no_persist: bool,

    /// The path to the Pinentry program to use when asking for a password.
    #[arg(long, value_hint = clap::ValueHint::ExecutablePath)]
    pinentry_program: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

fn get_cookie_storage(args: &Args) -> Box<dyn Storage<CookieJar>> {
    if !args.no_persist {
        let file_storage = match args.cookie_file {
            Some(ref path) => Some(storage::File::at(path)),
            None => storage::File::new("cookies.json"),
        };
        if let Some(file_storage) = file_storage {
            debug!("Keeping cookies in {}", file_storage.path().display());
            return Box::new(file_storage);
        }
        warn!(
            "We need to fall back to memory because there is no data directory to keep cookies in"
        );
    }

    Box::new(storage::Memory::<CookieJar>::new())
}

async fn run(args: Args) -> Result<()> {
    let config = Config::new(args.url.clone())
        .with_cookie_name(&args.cookie_name)
        .with_token_days(args.token_days);

    let cookies = get_cookie_storage(&args);
    if !cookies.is_persistent() {
        warn!("Your login will not outlive this command");
    }
    let store: Arc<dyn CredentialStore> = Arc::new(CookieStore::new(cookies));
    let credentials = Credentials::new(store, &config);

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.base_url().clone())?);
    let handler: Arc<dyn ExpiryHandler> = Arc::new(command::Terminal);
    let pipeline = Arc::new(Pipeline::new(
        transport,
        credentials,
        handler,
        config.expiry_delay(),
    ));

    let session = Arc::new(Session::new(Arc::clone(&pipeline)));
    session.recover().await;

    let prompt: Vec<Box<dyn password::Prompt>> = vec![
        Box::new(args.pinentry_program.clone().map_or_else(
            password::PinentryPrompt::new,
            password::PinentryPrompt::new_with_executable,
        )),
        Box::new(password::RpasswordPrompt),
    ];

    let ctx = Context {
        session,
        pipeline,
        prompt: Box::new(prompt),
    };
    let result = command::dispatch(args.command, &ctx).await;
    ctx.pipeline.settled().await?;

    result
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("TASKMASTER_LOG", "warn")
        .write_style("TASKMASTER_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}
