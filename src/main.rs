use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};

use haaflah::{
    core::{
        auth::{Credential, CredentialStore, LoginCredentials, NewAccount, StoredSession, User},
        coordinator::{spawn_roster_actor, RosterActor, RosterRequest},
        event::{EventForm, EventType},
        filter::StatusFilter,
        gateway::ParticipantGateway,
        participant::ParticipantPatch,
        registration::RegistrationForm,
        session::Applied,
        settings::{self, Settings},
    },
    integrations::ApiClient,
    send_message,
};

#[derive(Parser, Debug)]
#[command(name = "haaflah")]
#[command(version = "0.1")]
#[command(about = "Operator console for Haaflah events.", long_about = None)]
struct Args {
    /// Settings file. Defaults are used when omitted.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Base URL of the Haaflah API, overriding settings and environment.
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session token.
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Create an organizer account and store its session token.
    Signup {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Sign out and forget the stored token.
    Logout,

    /// Request a password reset link.
    ForgotPassword { email: String },

    /// Set a new password with a reset token.
    ResetPassword {
        token: String,

        #[arg(short, long)]
        password: String,
    },

    /// List the events you organize, with your dashboard figures.
    Events,

    /// Show one event and its statistics.
    Event { id: String },

    /// Create a new event.
    CreateEvent {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long)]
        banner_url: Option<String>,

        /// YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// HH:MM, 24-hour
        #[arg(long)]
        time: String,

        #[arg(long)]
        venue: String,

        #[arg(short = 't', long, value_enum, default_value_t = EventType::Physical)]
        event_type: EventType,

        /// Expected attendees
        #[arg(long)]
        capacity: Option<i64>,

        /// YYYY-MM-DD, on or before the event date
        #[arg(long)]
        deadline: Option<String>,

        #[arg(long)]
        face_id: bool,

        #[arg(long)]
        live_stream: bool,
    },

    /// Register someone for an event.
    Register {
        event_id: String,

        #[arg(long)]
        first: String,

        #[arg(long)]
        last: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        organisation: Option<String>,

        #[arg(long)]
        face_id: bool,
    },

    /// Manage an event's registrations.
    Roster {
        event_id: String,

        /// Case-insensitive search on name or email.
        #[arg(short, long, default_value = "")]
        query: String,

        #[arg(short, long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,

        #[command(subcommand)]
        action: Option<RosterAction>,
    },
}

#[derive(Subcommand, Debug)]
enum RosterAction {
    /// Print the rows matching the search and status filter.
    List,

    CheckIn { id: String },

    /// Check in several participants with one request.
    BulkCheckIn {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    Edit {
        id: String,

        #[arg(long)]
        first: Option<String>,

        #[arg(long)]
        last: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    Delete {
        id: String,

        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Write the matching rows to a CSV file.
    Export {
        /// Output directory, defaults to the settings' export directory.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn signed_in(store: &CredentialStore) -> anyhow::Result<Credential> {
    store
        .load()?
        .map(|session| session.token)
        .ok_or_else(|| anyhow::anyhow!("Not signed in, run `haaflah login` first"))
}

fn save_session(store: &CredentialStore, token: Credential, user: User) -> anyhow::Result<()> {
    println!("Signed in as {} <{}>", user.name, user.email);
    store.save(&StoredSession {
        token,
        user: Some(user),
    })
}

async fn run_roster(
    client: Arc<ApiClient>,
    credential: Credential,
    settings: &Settings,
    event_id: String,
    query: String,
    status: StatusFilter,
    action: RosterAction,
) -> anyhow::Result<()> {
    let event_name = match client.get_event(&event_id).await {
        Ok(event) => Some(event.name),
        Err(e) => {
            log::warn!("Could not fetch event {}: {}", event_id, e);
            None
        }
    };

    let (actor, task) = spawn_roster_actor(client, credential);
    let result = roster_action(&actor, settings, event_id, event_name, query, status, action).await;

    send_message!(actor, RosterRequest, Shutdown)?;
    task.await??;
    result
}

async fn roster_action(
    actor: &RosterActor,
    settings: &Settings,
    event_id: String,
    event_name: Option<String>,
    query: String,
    status: StatusFilter,
    action: RosterAction,
) -> anyhow::Result<()> {
    let loaded = send_message!(actor, RosterRequest, Open, event_id, event_name)?;
    log::info!("Loaded {} participant(s)", loaded);
    send_message!(actor, RosterRequest, SetQuery, query)?;
    send_message!(actor, RosterRequest, SetStatusFilter, status)?;

    let applied = match action {
        RosterAction::List => {
            let rows = send_message!(actor, RosterRequest, Visible)?;
            for p in &rows {
                println!(
                    "[{}] {:<24} {:<32} {}",
                    if p.checked_in { "x" } else { " " },
                    p.full_name(),
                    p.email,
                    p.id
                );
            }
            let snapshot = send_message!(actor, RosterRequest, Snapshot)?;
            println!(
                "{} shown, {} of {} checked in",
                snapshot.visible, snapshot.checked_in, snapshot.total
            );
            return Ok(());
        }
        RosterAction::Export { out } => {
            let export = send_message!(actor, RosterRequest, Export)?;
            let path = export.write_to(&out.unwrap_or_else(|| settings.export_dir()))?;
            println!("Wrote {}", path.display());
            return Ok(());
        }
        RosterAction::CheckIn { id } => send_message!(actor, RosterRequest, CheckIn, id)?,
        RosterAction::BulkCheckIn { ids } => {
            for id in ids {
                send_message!(actor, RosterRequest, Toggle, id, true)?;
            }
            send_message!(actor, RosterRequest, BulkCheckIn)?
        }
        RosterAction::Edit {
            id,
            first,
            last,
            email,
        } => {
            send_message!(actor, RosterRequest, BeginEdit, id)?;
            let patch = ParticipantPatch {
                first_name: first,
                last_name: last,
                email,
            };
            send_message!(actor, RosterRequest, UpdateDraft, patch)?;
            send_message!(actor, RosterRequest, SaveEdit)?
        }
        RosterAction::Delete { id, yes } => send_message!(actor, RosterRequest, Delete, id, yes)?,
    };

    match applied {
        Applied::CheckedIn(id) => println!("Checked in {}", id),
        Applied::Updated(p) => println!("Updated {} <{}>", p.full_name(), p.email),
        Applied::Deleted(id) => println!("Deleted {}", id),
        Applied::BulkCheckedIn { affected, .. } => {
            println!("Checked in {} participant(s)", affected)
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    settings::logger(settings::LOG_ENV).init();

    let args = Args::parse();
    let mut settings = Settings::load(args.settings.as_deref())?;
    settings.apply_api_url_override(args.api_url);

    let client = Arc::new(ApiClient::from_settings(&settings).context("Invalid API settings")?);
    let store = CredentialStore::new(settings.token_file());
    log::debug!("Using API at {}", client.base());

    match args.command {
        Command::Login { email, password } => {
            let response = client.login(&LoginCredentials { email, password }).await?;
            save_session(&store, response.token, response.user)?;
        }
        Command::Signup {
            name,
            email,
            password,
        } => {
            let response = client
                .register_account(&NewAccount {
                    name,
                    email,
                    password,
                    role: Some("organizer".to_owned()),
                })
                .await?;
            save_session(&store, response.token, response.user)?;
        }
        Command::Logout => {
            if let Some(session) = store.load()? {
                if let Err(e) = client.logout(&session.token).await {
                    log::warn!("Logout request failed: {}", e);
                }
            }
            store.clear()?;
            println!("Signed out");
        }
        Command::ForgotPassword { email } => println!("{}", client.forgot_password(&email).await?),
        Command::ResetPassword { token, password } => {
            println!("{}", client.reset_password(&token, &password).await?)
        }
        Command::Events => {
            let credential = signed_in(&store)?;
            let stats = client.my_stats(&credential).await?;
            println!(
                "{} events ({} published, {} drafts), {} registrations, {} attendees",
                stats.total_events,
                stats.published_events,
                stats.draft_events,
                stats.total_registrations,
                stats.total_attendees
            );
            for event in client.my_events(&credential).await? {
                println!(
                    "{:<24} {} {:<10} {:?} {}",
                    event.id, event.date, event.time, event.status, event.name
                );
            }
        }
        Command::Event { id } => {
            let event = client.get_event(&id).await?;
            println!("{} ({:?}, {:?})", event.name, event.event_type, event.status);
            println!("{} {} at {}", event.date, event.time, event.venue);
            if let Some(description) = &event.description {
                println!("{}", description);
            }
            match store.load()? {
                Some(session) => {
                    let stats = client.event_stats(&id, &session.token).await?;
                    println!(
                        "{} registered, {} attended ({:.1}% attendance), {} seats left",
                        stats.total_registrations,
                        stats.total_attendees,
                        stats.attendance_rate,
                        stats.remaining_seats
                    );
                }
                None => log::debug!("Not signed in, skipping statistics"),
            }
        }
        Command::CreateEvent {
            name,
            description,
            banner_url,
            date,
            time,
            venue,
            event_type,
            capacity,
            deadline,
            face_id,
            live_stream,
        } => {
            let credential = signed_in(&store)?;
            let form = EventForm {
                name,
                description,
                banner_url,
                date,
                time,
                venue,
                event_type,
                capacity,
                registration_deadline: deadline,
                face_id_check_in: face_id,
                live_streaming: live_stream,
            };
            let event = client.create_event(&form, &credential).await?;
            println!("Created event {}", event.id);
        }
        Command::Register {
            event_id,
            first,
            last,
            email,
            phone,
            organisation,
            face_id,
        } => {
            let form = RegistrationForm {
                first_name: first,
                last_name: last,
                email,
                phone_number: phone,
                organisation,
                face_id_enabled: face_id,
            };
            client.register(&event_id, &form).await?;
            println!("Registered {}", form.display_name());
        }
        Command::Roster {
            event_id,
            query,
            status,
            action,
        } => {
            let credential = signed_in(&store)?;
            run_roster(
                client,
                credential,
                &settings,
                event_id,
                query,
                status,
                action.unwrap_or(RosterAction::List),
            )
            .await?;
        }
    }

    Ok(())
}
