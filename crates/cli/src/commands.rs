//! Command-line surface of the `attendance` binary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use client::identity::LoginKind;
use client::{ApiClient, FileStore, SessionGateway};
use domain::models::attendance::{format_duration, ManualAction, ManualAttendanceRequest};
use domain::models::user::{
    full_name, role_label, CreateAdminRequest, CreateRoleRequest, CreateUserRequest,
    ForgotPasswordRequest, LoginRequest, ResetPasswordRequest,
};
use domain::models::zone::CreateTrackRequest;
use domain::models::{AttendanceRecord, AttendanceStatus, Session, Zone};
use domain::services::{
    AttendanceSummary, CheckInFlow, CheckInOutcome, CheckOutFailure, CheckOutFlow, DashboardStats,
    HistoryFilter,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Config, ZoneSource};
use crate::sensor::FixedLocationSensor;

/// Exit code of a check-in or check-out that was denied or refused.
const EXIT_DENIED: u8 = 2;
/// Exit code of a submission the server did not accept.
const EXIT_SUBMIT_FAILED: u8 = 3;
/// Exit code after the user interrupted an attempt.
const EXIT_CANCELLED: u8 = 130;

#[derive(Debug, Parser)]
#[command(name = "attendance")]
#[command(about = "Geofence-gated attendance check-in client")]
#[command(version)]
pub struct Cli {
    /// Configuration file to use instead of config/default.toml.
    #[arg(long, global = true, env = "ATTENDANCE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Use the administrator login.
        #[arg(long)]
        admin: bool,
    },
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List the zones check-in is evaluated against.
    Zones,
    /// Check in at the given location.
    CheckIn(CheckInArgs),
    /// Check out of today's open record.
    CheckOut,
    /// Attendance history, newest first.
    History {
        /// User id; defaults to the signed-in user.
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        status: Option<AttendanceStatus>,
    },
    /// Today's records across all users.
    Today,
    /// Attendance summary for a user, or the dashboard counters.
    Stats {
        #[arg(long)]
        user: Option<String>,
        /// Roster size for the dashboard; defaults to users seen today.
        #[arg(long)]
        roster: Option<usize>,
    },
    /// Request a password reset link.
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    /// Set a new password with a reset token.
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    /// Manage users.
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// Manage administrators.
    Admins {
        #[command(subcommand)]
        command: AdminsCommand,
    },
    /// Manage roles.
    Roles {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Manage tracks.
    Tracks {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Record attendance on behalf of a user.
    Manual {
        #[command(subcommand)]
        command: ManualCommand,
    },
}

#[derive(Debug, Args)]
pub struct CheckInArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: f64,
    /// Reported accuracy radius in meters.
    #[arg(long, default_value_t = 0.0)]
    pub accuracy: f64,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    Create {
        /// First word is the first name, the rest the last name.
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Role id or name.
        #[arg(long)]
        role: String,
        /// Track id; required for students.
        #[arg(long)]
        track: Option<String>,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdminsCommand {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "admin")]
        role: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    List,
    Create {
        #[arg(long)]
        name: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ManualCommand {
    CheckIn(ManualArgs),
    CheckOut(ManualArgs),
}

#[derive(Debug, Args)]
pub struct ManualArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub date: NaiveDate,
    /// Wall-clock time, `HH:MM`.
    #[arg(long)]
    pub time: String,
}

/// Everything a command needs.
pub struct App {
    pub config: Config,
    pub api: ApiClient,
    pub store: FileStore,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(&config.api).context("Failed to build API client")?;
        let store = FileStore::new(config.session.path.clone());
        Ok(Self { config, api, store })
    }

    fn session(&self) -> Result<Session> {
        let session = Session::load(&self.store).context("Failed to read stored session")?;
        if !session.is_authenticated() {
            bail!("Not signed in. Run `attendance login` first.");
        }
        Ok(session)
    }

    async fn zones(&self, session: &Session) -> Result<Vec<Zone>> {
        match self.config.check_in.zone_source {
            ZoneSource::Static => Ok(self.config.zones.clone()),
            ZoneSource::Remote => Ok(self.api.remote_zones(session).await?),
        }
    }
}

/// Runs one command.
pub async fn execute(command: Command, ctx: &App) -> Result<ExitCode> {
    match command {
        Command::Login {
            email,
            password,
            admin,
        } => {
            let kind = if admin { LoginKind::Admin } else { LoginKind::User };
            let session = ctx
                .api
                .login(&LoginRequest { email, password }, kind)
                .await?;
            session.save(&ctx.store)?;
            println!(
                "Signed in as {} ({})",
                full_name(session.user()),
                role_label(session.user())
            );
        }
        Command::Logout => {
            let mut session = Session::load(&ctx.store)?;
            session.clear(&ctx.store)?;
            println!("Signed out");
        }
        Command::Whoami => {
            let session = Session::load(&ctx.store)?;
            println!("{}", full_name(session.user()));
            println!("{}", role_label(session.user()));
            if let Some(user) = session.user() {
                println!("{}", user.email);
            }
        }
        Command::Zones => {
            let session = Session::load(&ctx.store)?;
            let zones = ctx.zones(&session).await?;
            if zones.is_empty() {
                println!("No check-in locations are configured.");
            }
            for zone in zones {
                println!(
                    "{:<12} {:<24} {:>10.5} {:>10.5} {:>6.0} m",
                    zone.id, zone.name, zone.latitude, zone.longitude, zone.radius_meters
                );
            }
        }
        Command::CheckIn(args) => return check_in(ctx, args).await,
        Command::CheckOut => return check_out(ctx).await,
        Command::History { user, date, status } => {
            let session = ctx.session()?;
            let user_id = resolve_user(&session, user)?;
            let records = ctx.api.user_attendance(&user_id, &session).await?;
            let filter = HistoryFilter {
                date,
                status,
                user_id: Some(user_id),
            };
            print_records(&filter.apply(&records));
        }
        Command::Today => {
            let session = ctx.session()?;
            let records = ctx.api.today_attendance(&session).await?;
            print_records(&HistoryFilter::default().apply(&records));
        }
        Command::Stats { user, roster } => stats(ctx, user, roster).await?,
        Command::ForgotPassword { email } => {
            let message = ctx
                .api
                .forgot_password(&ForgotPasswordRequest { email })
                .await?;
            println!("{}", message.as_deref().unwrap_or("Reset link sent"));
        }
        Command::ResetPassword {
            token,
            password,
            confirm,
        } => {
            let request = ResetPasswordRequest::new(token, password, &confirm)?;
            let message = ctx.api.reset_password(&request).await?;
            println!("{}", message.as_deref().unwrap_or("Password updated"));
        }
        Command::Users { command } => users(ctx, command).await?,
        Command::Admins {
            command:
                AdminsCommand::Create {
                    name,
                    email,
                    password,
                    role,
                },
        } => {
            let session = ctx.session()?;
            let request = CreateAdminRequest {
                name,
                email,
                password,
                role,
            };
            ctx.api.create_admin(&request, &session).await?;
            println!("Administrator {} created", request.email);
        }
        Command::Roles { command } => {
            let session = ctx.session()?;
            match command {
                CatalogCommand::List => {
                    for role in ctx.api.list_roles(&session).await? {
                        println!("{:<26} {}", role.id, role.role().label());
                    }
                }
                CatalogCommand::Create { name } => {
                    ctx.api
                        .create_role(&CreateRoleRequest { name: name.clone() }, &session)
                        .await?;
                    println!("Role {} created", name);
                }
            }
        }
        Command::Tracks { command } => {
            let session = ctx.session()?;
            match command {
                CatalogCommand::List => {
                    for track in ctx.api.list_tracks(&session).await? {
                        let geofence = match track.to_zone() {
                            Some(zone) => format!("{:.0} m geofence", zone.radius_meters),
                            None => "no geofence".to_string(),
                        };
                        println!("{:<26} {:<24} {}", track.id, track.name, geofence);
                    }
                }
                CatalogCommand::Create { name } => {
                    ctx.api
                        .create_track(&CreateTrackRequest { name: name.clone() }, &session)
                        .await?;
                    println!("Track {} created", name);
                }
            }
        }
        Command::Manual { command } => {
            let session = ctx.session()?;
            let (action, args) = match command {
                ManualCommand::CheckIn(args) => (ManualAction::CheckIn, args),
                ManualCommand::CheckOut(args) => (ManualAction::CheckOut, args),
            };
            let request = ManualAttendanceRequest {
                email: args.email,
                date: args.date,
                time: args.time,
            };
            let message = ctx
                .api
                .manual_attendance(action, &request, &session)
                .await?;
            println!("{}", message.as_deref().unwrap_or("Attendance recorded"));
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn check_in(ctx: &App, args: CheckInArgs) -> Result<ExitCode> {
    let session = ctx.session()?;
    let zones = ctx.zones(&session).await?;

    let sensor = Arc::new(FixedLocationSensor::new(
        args.latitude,
        args.longitude,
        args.accuracy,
    ));
    let gateway = Arc::new(SessionGateway::new(ctx.api.clone(), session));
    let flow = CheckInFlow::new(sensor, gateway)
        .with_sensor_timeout(ctx.config.check_in.sensor_timeout());

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, cancelling check-in");
                cancel.cancel();
            }
        })
    };

    let outcome = flow.run(&zones, &cancel).await;
    interrupt.abort();

    let code = match outcome? {
        CheckInOutcome::Confirmed(record) => {
            println!(
                "Checked in at {} ({})",
                record.check_in_time.with_timezone(&Local).format("%H:%M"),
                record.status.label()
            );
            ExitCode::SUCCESS
        }
        CheckInOutcome::Denied(failure) => {
            eprintln!("{}", failure.user_message());
            if failure.is_retryable() {
                eprintln!("You can try again.");
            }
            ExitCode::from(EXIT_DENIED)
        }
        CheckInOutcome::SubmitFailed(failure) => {
            eprintln!("{}", failure.user_message());
            ExitCode::from(EXIT_SUBMIT_FAILED)
        }
        CheckInOutcome::Cancelled => {
            eprintln!("Check-in cancelled");
            ExitCode::from(EXIT_CANCELLED)
        }
    };
    Ok(code)
}

async fn check_out(ctx: &App) -> Result<ExitCode> {
    let session = ctx.session()?;
    let now = Local::now();
    let open = ctx.api.open_record(now.date_naive(), &session).await?;

    let gateway = Arc::new(SessionGateway::new(ctx.api.clone(), session));
    let flow = CheckOutFlow::new(gateway);

    match flow.run(open.as_ref(), now.time()).await? {
        Ok(record) => {
            match record.worked_duration() {
                Some(worked) => println!("Checked out. Worked {}", format_duration(worked)),
                None => println!("Checked out"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            warn!(error = %failure, "Check-out not completed");
            eprintln!("{}", failure);
            let code = match failure {
                CheckOutFailure::NotCheckedIn => EXIT_DENIED,
                CheckOutFailure::SubmissionFailed(_) => EXIT_SUBMIT_FAILED,
            };
            Ok(ExitCode::from(code))
        }
    }
}

async fn stats(ctx: &App, user: Option<String>, roster: Option<usize>) -> Result<()> {
    let session = ctx.session()?;

    if user.is_some() || !session.is_admin() {
        let user_id = resolve_user(&session, user)?;
        let records = ctx.api.user_attendance(&user_id, &session).await?;
        let summary = AttendanceSummary::from_records(&records);
        println!("Records        {}", summary.total);
        println!("On time        {}", summary.on_time);
        println!("Late           {}", summary.late);
        println!("Absent         {}", summary.absent);
        println!("Open           {}", summary.open);
        println!("Punctuality    {}%", summary.on_time_percentage);
        return Ok(());
    }

    let records = ctx.api.today_attendance(&session).await?;
    let stats = today_dashboard(&records, Local::now().date_naive(), roster);
    println!("Total users       {}", stats.total_users);
    println!("Checked in today  {}", stats.checked_in_today);
    println!("On location       {}", stats.on_location);
    println!("On time today     {}", stats.on_time);
    println!("Late today        {}", stats.late);
    Ok(())
}

/// Dashboard counters from `/attendance/today`.
///
/// Only today's records are available, so punctuality covers today alone.
/// The roster defaults to the users seen today.
fn today_dashboard(
    records: &[AttendanceRecord],
    today: NaiveDate,
    roster: Option<usize>,
) -> DashboardStats {
    let stats = DashboardStats::compute(0, records, today, 1);
    DashboardStats {
        total_users: roster.unwrap_or(stats.checked_in_today),
        ..stats
    }
}

async fn users(ctx: &App, command: UsersCommand) -> Result<()> {
    let session = ctx.session()?;
    match command {
        UsersCommand::Create {
            name,
            email,
            role,
            track,
        } => {
            let roles = ctx.api.list_roles(&session).await?;
            let entry = roles
                .iter()
                .find(|r| r.id == role || r.name.eq_ignore_ascii_case(&role))
                .ok_or_else(|| anyhow!("Unknown role: {}", role))?;
            let request = CreateUserRequest::from_full_name(&name, email, entry, track)?;
            ctx.api.create_user(&request, &session).await?;
            println!(
                "User {} {} created as {}",
                request.first_name,
                request.last_name,
                entry.role().label()
            );
        }
        UsersCommand::Delete { id } => {
            ctx.api.delete_user(&id, &session).await?;
            println!("User {} deleted", id);
        }
    }
    Ok(())
}

fn resolve_user(session: &Session, user: Option<String>) -> Result<String> {
    match user {
        Some(user) => Ok(user),
        None => session
            .user()
            .map(|u| u.id.clone())
            .ok_or_else(|| anyhow!("Stored session has no user profile; sign in again")),
    }
}

fn print_records(records: &[AttendanceRecord]) {
    if records.is_empty() {
        println!("No attendance records");
        return;
    }
    for record in records {
        let check_out = record
            .check_out_time
            .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string());
        let worked = record
            .worked_duration()
            .map(format_duration)
            .unwrap_or_default();
        println!(
            "{}  {:<12} {} - {}  {:<12} {}",
            record.date,
            record.user_id,
            record.check_in_time.with_timezone(&Local).format("%H:%M"),
            check_out,
            record.status.label(),
            worked
        );
    }
}
