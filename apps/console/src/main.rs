use std::{io::Write as _, path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    entities,
    lookup::{course_lookup, student_lookup, teacher_lookup},
    messages::user_message,
    ActionKind, AuthService, AuthenticatedClient, ClientError, FileSessionStore, Locale,
    LookupOutcome, Operation, Resource, ResourceController, Session, SessionEvent,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use shared::domain::ResourceId;
use tokio::sync::broadcast;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod fields;

use config::{load_settings, Overrides};

#[derive(Parser, Debug)]
#[command(name = "edu-console", about = "Admin console for the course-management backend")]
struct Cli {
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    timeout_seconds: Option<u64>,
    #[arg(long)]
    session_file: Option<PathBuf>,
    #[arg(long)]
    locale: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        email: String,
        /// Read from stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    Whoami,
    List {
        entity: Entity,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        search: Option<String>,
        /// Billing month (`YYYY-MM`) for payments; defaults to the current month.
        #[arg(long)]
        month: Option<String>,
    },
    Create {
        entity: Entity,
        /// `key=value` pairs.
        fields: Vec<String>,
    },
    Update {
        entity: Entity,
        id: String,
        fields: Vec<String>,
    },
    Remove {
        entity: Entity,
        id: String,
    },
    Action {
        entity: Entity,
        id: String,
        kind: ActionKind,
        fields: Vec<String>,
    },
    Lookup {
        target: LookupTarget,
        query: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Entity {
    Admins,
    Managers,
    Teachers,
    Students,
    Groups,
    Courses,
    Payments,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LookupTarget {
    Teacher,
    Course,
    Student,
}

enum ResourceOp {
    List {
        status: Option<String>,
        search: Option<String>,
    },
    Create(Map<String, Value>),
    Update(String, Map<String, Value>),
    Remove(String),
    Action(String, ActionKind, Map<String, Value>),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let overrides = Overrides {
        base_url: cli.base_url.clone(),
        timeout_seconds: cli.timeout_seconds,
        session_file: cli.session_file.clone(),
        locale: cli.locale.clone(),
    };
    let settings = load_settings(&cli.config, &overrides)
        .with_context(|| format!("failed to load settings from '{}'", cli.config.display()))?;
    debug!(base_url = %settings.base_url, session_file = %settings.session_file.display(), "settings loaded");

    let session = Arc::new(Session::new(Arc::new(FileSessionStore::new(
        settings.session_file.clone(),
    ))));
    let client = AuthenticatedClient::new(settings.client_config(), session)?;
    let mut events = client.subscribe_session_events();

    let outcome = run(cli.command, client, settings.locale).await;
    report_session_events(&mut events, settings.locale);
    outcome
}

async fn run(command: Command, client: Arc<AuthenticatedClient>, locale: Locale) -> Result<()> {
    let auth = AuthService::new(client.clone());
    match command {
        Command::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            let user = auth
                .sign_in(&email, &password)
                .await
                .map_err(|err| explain(&err, Operation::SignIn, locale))?;
            let name = user.map(|user| user.display_name()).unwrap_or(email);
            println!("Signed in as {name}");
        }
        Command::Logout => {
            auth.sign_out().await;
            println!("Signed out");
        }
        Command::Whoami => match client.session().get_user() {
            Some(user) => println!(
                "{} ({})",
                user.display_name(),
                user.role.as_deref().unwrap_or("-")
            ),
            None if client.session().is_authenticated() => println!("signed in"),
            None => bail!("not signed in"),
        },
        Command::Lookup { target, query } => {
            require_session(&auth)?;
            let lookup = match target {
                LookupTarget::Teacher => teacher_lookup(client),
                LookupTarget::Course => course_lookup(client),
                LookupTarget::Student => student_lookup(client),
            };
            match lookup.search(&query).await {
                LookupOutcome::Applied(_) => {
                    for hit in lookup.results() {
                        println!("{}\t{}", hit.id, hit.label());
                    }
                }
                LookupOutcome::Cleared => println!("query too short"),
                LookupOutcome::Stale => {}
                LookupOutcome::Failed(kind) => bail!("lookup failed ({kind:?})"),
            }
        }
        Command::List {
            entity,
            status,
            search,
            month,
        } => {
            require_session(&auth)?;
            run_entity(client, locale, entity, month, ResourceOp::List { status, search }).await?;
        }
        Command::Create { entity, fields } => {
            require_session(&auth)?;
            let fields = fields::parse_assignments(&fields)?;
            run_entity(client, locale, entity, None, ResourceOp::Create(fields)).await?;
        }
        Command::Update { entity, id, fields } => {
            require_session(&auth)?;
            let fields = fields::parse_assignments(&fields)?;
            run_entity(client, locale, entity, None, ResourceOp::Update(id, fields)).await?;
        }
        Command::Remove { entity, id } => {
            require_session(&auth)?;
            run_entity(client, locale, entity, None, ResourceOp::Remove(id)).await?;
        }
        Command::Action {
            entity,
            id,
            kind,
            fields,
        } => {
            require_session(&auth)?;
            let fields = fields::parse_assignments(&fields)?;
            run_entity(client, locale, entity, None, ResourceOp::Action(id, kind, fields)).await?;
        }
    }
    Ok(())
}

async fn run_entity(
    client: Arc<AuthenticatedClient>,
    locale: Locale,
    entity: Entity,
    month: Option<String>,
    op: ResourceOp,
) -> Result<()> {
    match entity {
        Entity::Admins => {
            let controller = entities::admin_controller(client).with_locale(locale);
            run_resource(controller, locale, op, &[("role", Value::from("Admin"))]).await
        }
        Entity::Managers => {
            let controller = entities::manager_controller(client).with_locale(locale);
            run_resource(controller, locale, op, &[("role", Value::from("Manager"))]).await
        }
        Entity::Teachers => {
            let controller = entities::teacher_controller(client).with_locale(locale);
            run_resource(controller, locale, op, &[]).await
        }
        Entity::Students => {
            let controller = entities::student_controller(client).with_locale(locale);
            run_resource(controller, locale, op, &[]).await
        }
        Entity::Groups => {
            let controller = entities::group_controller(client).with_locale(locale);
            run_resource(controller, locale, op, &[]).await
        }
        Entity::Courses => {
            let controller = entities::course_controller(client).with_locale(locale);
            run_resource(controller, locale, op, &[]).await
        }
        Entity::Payments => {
            let month = month.unwrap_or_else(entities::current_month);
            let today = Local::now().format("%Y-%m-%d").to_string();
            let controller = entities::debtor_controller(client, &month).with_locale(locale);
            let defaults = [
                ("month", Value::from(month)),
                ("method", Value::from("naqd")),
                ("paidAt", Value::from(today)),
            ];
            run_resource(controller, locale, op, &defaults).await
        }
    }
}

async fn run_resource<E>(
    controller: ResourceController<E>,
    locale: Locale,
    op: ResourceOp,
    defaults: &[(&str, Value)],
) -> Result<()>
where
    E: Resource + Serialize,
    E::Draft: DeserializeOwned,
{
    let name = controller.config().name;
    let operation = match op {
        ResourceOp::List { status, search } => {
            controller
                .load()
                .await
                .map_err(|err| explain(&err, Operation::Load, locale))?;
            if let Some(status) = status {
                controller.set_filter(status.as_str());
            }
            if let Some(search) = search {
                controller.set_search(search);
            }
            let snapshot = controller.snapshot();
            for item in &snapshot.filtered_items {
                println!("{}", serde_json::to_string(item)?);
            }
            info!(resource = name, shown = snapshot.filtered_items.len(), total = snapshot.items.len(), "listed");
            if let Some(notice) = snapshot.notice {
                eprintln!("{notice}");
            }
            return Ok(());
        }
        ResourceOp::Create(fields) => {
            let fields = defaults
                .iter()
                .fold(fields, |fields, (key, value)| fields::with_default(fields, key, value.clone()));
            let draft: E::Draft = fields::into_draft(fields, name)?;
            controller
                .open_create_dialog()
                .map_err(|err| explain(&err, Operation::Create, locale))?;
            controller
                .submit(&draft)
                .await
                .map_err(|err| explain(&err, Operation::Create, locale))?;
            Operation::Create
        }
        ResourceOp::Update(raw_id, fields) => {
            let id = parse_id(&controller, &raw_id)?;
            let fields = defaults
                .iter()
                .fold(fields, |fields, (key, value)| fields::with_default(fields, key, value.clone()));
            let draft: E::Draft = fields::into_draft(fields, name)?;
            controller
                .open_edit_dialog(id)
                .map_err(|err| explain(&err, Operation::Update, locale))?;
            controller
                .submit(&draft)
                .await
                .map_err(|err| explain(&err, Operation::Update, locale))?;
            Operation::Update
        }
        ResourceOp::Remove(raw_id) => {
            let id = parse_id(&controller, &raw_id)?;
            controller.request_delete(id.clone());
            controller
                .remove(id)
                .await
                .map_err(|err| explain(&err, Operation::Remove, locale))?;
            Operation::Remove
        }
        ResourceOp::Action(raw_id, kind, extra) => {
            let id = parse_id(&controller, &raw_id)?;
            controller
                .secondary_action_with(id, kind, extra)
                .await
                .map_err(|err| explain(&err, Operation::Action(kind), locale))?;
            Operation::Action(kind)
        }
    };

    let snapshot = controller.snapshot();
    info!(resource = name, %operation, items = snapshot.items.len(), "done");
    if let Some(notice) = snapshot.notice {
        println!("{notice}");
    }
    if let Some(error) = snapshot.error {
        // The change went through but the refreshed list could not be fetched.
        eprintln!("{}", error.message);
    }
    Ok(())
}

fn parse_id<E: Resource>(controller: &ResourceController<E>, raw: &str) -> Result<ResourceId> {
    controller
        .resolve_id(raw)
        .with_context(|| format!("missing id for {}", controller.config().name))
}

fn require_session(auth: &AuthService) -> Result<()> {
    auth.require_session()
        .map(|_| ())
        .map_err(|_| anyhow!("not signed in; run `edu-console login <email>` first"))
}

fn explain(err: &ClientError, operation: Operation, locale: Locale) -> anyhow::Error {
    debug!(error = %err, %operation, "command failed");
    anyhow!(user_message(err, operation, locale))
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush().context("failed to flush prompt")?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn report_session_events(events: &mut broadcast::Receiver<SessionEvent>, locale: Locale) {
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::Expired => match locale {
                Locale::Uz => eprintln!("Sessiya tugadi. Qaytadan kiring: edu-console login <email>"),
                Locale::En => eprintln!("Session expired. Sign in again: edu-console login <email>"),
            },
            SessionEvent::SignedIn { .. } => info!("session stored"),
            SessionEvent::SignedOut => info!("session removed"),
        }
    }
}
