pub mod output;

use std::path::PathBuf;

use ansi_term::Colour;
use anyhow::Result;
use clap::{Parser, Subcommand};
use output::{render_blocked, render_tab, render_tab_bar, render_tracking, TODAY_SITE_LIMIT};
use tracing::{info, level_filters::LevelFilter};

use crate::{
    backend::{HttpBackend, DEFAULT_BACKEND_URL},
    error::PopupError,
    ledger::entities::Mutation,
    session::{tab::Tab, PopupSession},
    storage::{settings::JsonSettingsStore, time_source::FileTimeSource},
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, create_application_path},
        logging::enable_logging,
        time::format_duration,
    },
};

#[derive(Parser, Debug)]
#[command(name = "Sitetally", version, long_about = None)]
#[command(about = "Tracks time spent on sites, blocks distracting ones and shows weekly reports", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "SITETALLY_BACKEND",
        default_value = DEFAULT_BACKEND_URL,
        help = "Base url of the reports backend"
    )]
    backend: String,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Show today's activity")]
    Today {
        #[arg(short = 'n', long, default_value_t = TODAY_SITE_LIMIT, help = "Number of sites to show")]
        top: usize,
    },
    #[command(about = "Show a single tab of the popup")]
    Show {
        #[arg(help = "today, blocked or reports. Anything else shows today")]
        tab: Tab,
    },
    #[command(about = "Manage blocked sites")]
    Block {
        #[command(subcommand)]
        action: BlockAction,
    },
    #[command(about = "Show whether tracking is enabled")]
    Tracking {
        #[arg(long, help = "Switch tracking on or off")]
        toggle: bool,
    },
    #[command(about = "Record active time for a site, the way the background tracker does")]
    Track {
        site: String,
        #[arg(help = "Active time in milliseconds")]
        ms: u64,
    },
    #[command(about = "Display weekly reports")]
    Reports {},
    #[command(about = "Log into the reports backend")]
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SITETALLY_PASSWORD")]
        password: String,
    },
    #[command(about = "Forget the stored login")]
    Logout {},
}

#[derive(Subcommand, Debug)]
enum BlockAction {
    List {},
    Add { site: String },
    Remove { site: String },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, create_application_path)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&app_dir.join("logs"), logging_level, args.log)?;

    let store = JsonSettingsStore::new(app_dir.join("settings.json"));
    let source = FileTimeSource::new(app_dir.clone(), Box::new(DefaultClock));
    let backend = HttpBackend::new(&args.backend)?;
    let mut session: CliSession = PopupSession::open(store, source, backend).await;
    info!("Opened session in {app_dir:?}");

    let needs_login = !matches!(
        args.commands,
        Commands::Track { .. } | Commands::Login { .. } | Commands::Logout {}
    );
    if needs_login {
        ensure_logged_in(&session)?;
    }

    let result = run_command(&mut session, args.commands).await;
    if let Some(error) = session.error() {
        eprintln!("{}", Colour::Red.paint(error));
    }
    result
}

type CliSession = PopupSession<JsonSettingsStore, FileTimeSource, HttpBackend>;

fn ensure_logged_in(session: &CliSession) -> Result<(), PopupError> {
    match session.user() {
        Some(_) => Ok(()),
        None => {
            eprintln!("Login to Sitetally first: sitetally login --email <EMAIL>");
            Err(PopupError::NotLoggedIn)
        }
    }
}

async fn run_command(session: &mut CliSession, commands: Commands) -> Result<()> {
    match commands {
        Commands::Track { site, ms } => match session.time_source().record(&site, ms).await? {
            Some(total) => println!("{site}: {}", format_duration(total)),
            None => println!("Nothing recorded, tracking is off"),
        },
        Commands::Login { email, password } => {
            let user = session.login(&email, &password).await?;
            println!("Logged in as {}", user.display_name());
        }
        Commands::Logout {} => {
            session.logout().await?;
            println!("Logged out");
        }
        Commands::Today { top } => {
            println!("{}", render_tracking(session.ledger().is_tracking()));
            print!("{}", render_tab(Tab::Today, session.ledger(), top));
        }
        Commands::Show { tab } => {
            session.switch_tab(tab).await;
            println!("{}", render_tab_bar(session.active_tab()));
            print!(
                "{}",
                render_tab(session.active_tab(), session.ledger(), TODAY_SITE_LIMIT)
            );
        }
        Commands::Reports {} => {
            session.switch_tab(Tab::Reports).await;
            print!("{}", render_tab(Tab::Reports, session.ledger(), 0));
        }
        Commands::Tracking { toggle } => {
            if toggle {
                session.toggle_tracking().await?;
            }
            println!("{}", render_tracking(session.ledger().is_tracking()));
        }
        Commands::Block { action } => {
            let mutation = match action {
                BlockAction::List {} => None,
                BlockAction::Add { site } => Some(session.add_blocked_site(&site).await?),
                BlockAction::Remove { site } => Some(session.remove_blocked_site(&site).await?),
            };
            if mutation == Some(Mutation::Unchanged) {
                println!("Block list unchanged");
            }
            print!("{}", render_blocked(session.ledger().blocked_sites()));
        }
    }
    Ok(())
}
