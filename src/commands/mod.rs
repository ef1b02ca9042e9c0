/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `auth`:    Sign in, sign out, show the current user
- `chat`:    Travel assistant chat (single message or interactive)
- `weather`: Forecast for a destination

Handlers are small; they build nothing themselves and work on the shared
[`AppContext`].
*/

use crate::api::{AuthApi, ChatApi};
use crate::config::Config;
use crate::error::{FintripError, Result};
use crate::http::ApiClient;
use crate::navigation::TerminalNavigator;
use crate::session::SessionStore;
use crate::storage::{ClientStorage, FileStorage};
use crate::weather::WeatherService;
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;

/// Everything a command needs, wired once per process
pub struct AppContext {
    pub config: Config,
    pub navigator: Arc<TerminalNavigator>,
    pub session: Arc<SessionStore>,
    pub api: Arc<ApiClient>,
    pub weather: WeatherService,
}

impl AppContext {
    /// Open client storage, restore the persisted session and build the
    /// backend and weather clients.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `location` - The invocation being run, remembered on session expiry
    pub fn build(config: Config, location: String) -> Result<Self> {
        let dir = config.storage_dir()?;
        tracing::debug!("Using client storage in {}", dir.display());

        let storage: Arc<dyn ClientStorage> =
            Arc::new(FileStorage::new_with_path(dir.join("storage.json"))?);
        let cookies: Arc<dyn ClientStorage> =
            Arc::new(FileStorage::new_with_path(dir.join("cookies.json"))?);

        let navigator = Arc::new(TerminalNavigator::new(Some(location)));
        let session = Arc::new(
            SessionStore::new(storage.clone(), cookies, navigator.clone())
                .with_cookie_max_age(config.storage.cookie_max_age()),
        );
        session.restore();

        let timeout = Duration::from_secs(config.api.timeout_seconds);
        let api = Arc::new(ApiClient::new(
            &config.api.base_url,
            timeout,
            Arc::clone(&session),
        )?);
        let weather =
            WeatherService::new(config.weather.clone(), timeout, storage, config.cache.ttl())?;

        Ok(Self {
            config,
            navigator,
            session,
            api,
            weather,
        })
    }
}

/// Text shown to the user for a failed command.
///
/// Network problems collapse into one generic line; everything else keeps
/// its own message.
pub fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<FintripError>() {
        Some(e) if e.is_network() => {
            "Could not reach the server. Please try again later.".to_string()
        }
        Some(FintripError::Validation(msg)) => msg.clone(),
        Some(FintripError::Authentication(msg)) => format!("Login failed: {}", msg),
        Some(FintripError::NotFound(msg)) => msg.clone(),
        Some(FintripError::Unauthorized(_)) => {
            crate::http::SESSION_EXPIRED_MESSAGE.to_string()
        }
        _ => err.to_string(),
    }
}

// Auth command handlers
pub mod auth {
    //! `login`, `logout` and `whoami`.

    use super::*;

    /// Sign in and report where to pick up after a forced logout.
    pub async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<()> {
        let outcome = AuthApi::new(Arc::clone(&ctx.api))
            .login(email, password)
            .await?;

        println!(
            "{} {}",
            "Welcome,".green(),
            outcome.profile.display_name().green().bold()
        );
        if let Some(location) = outcome.return_to {
            println!("Pick up where you left off: {}", location.cyan());
        }
        Ok(())
    }

    /// Sign out; a no-op when nobody is signed in.
    pub fn logout(ctx: &AppContext) -> Result<()> {
        if !ctx.session.is_authenticated() {
            println!("Not logged in.");
            return Ok(());
        }

        AuthApi::new(Arc::clone(&ctx.api)).logout();
        println!("Signed out.");
        Ok(())
    }

    /// Print the signed-in profile.
    pub fn whoami(ctx: &AppContext) -> Result<()> {
        let snapshot = ctx.session.current_session();
        let profile = match (snapshot.is_authenticated, snapshot.profile) {
            (true, Some(profile)) => profile,
            _ => {
                println!("Not logged in.");
                return Ok(());
            }
        };

        println!("{}", profile.display_name().bold());
        if let Some(email) = &profile.email {
            println!("  email:  {}", email);
        }
        if let Some(status) = &profile.status {
            println!("  status: {}", status);
        }
        if let Some(created_at) = profile.created_at {
            println!("  member since {}", created_at.format("%Y-%m-%d"));
        }
        for membership in &profile.group_memberships {
            let name = membership
                .group_name
                .as_deref()
                .unwrap_or(&membership.group_id);
            match &membership.role {
                Some(role) => println!("  group:  {} ({})", name, role),
                None => println!("  group:  {}", name),
            }
        }
        Ok(())
    }
}

// Chat command handler
pub mod chat {
    //! Travel assistant chat.
    //!
    //! With `--message` a single exchange is made. Otherwise a readline
    //! loop runs until `/exit`, Ctrl-D or session expiry.

    use super::*;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Input recognised by the interactive loop before it reaches the backend
    #[derive(Debug, PartialEq, Eq)]
    pub enum ChatInput<'a> {
        Empty,
        Exit,
        Help,
        Message(&'a str),
    }

    /// Classify one line of user input.
    pub fn parse_input(line: &str) -> ChatInput<'_> {
        let trimmed = line.trim();
        match trimmed {
            "" => ChatInput::Empty,
            "/exit" | "/quit" | "exit" | "quit" => ChatInput::Exit,
            "/help" | "help" => ChatInput::Help,
            _ => ChatInput::Message(trimmed),
        }
    }

    fn print_help() {
        println!("Ask anything about your trip. Commands:");
        println!("  /help   show this help");
        println!("  /exit   leave the chat");
    }

    /// Run the chat command.
    pub async fn run_chat(ctx: &AppContext, message: Option<String>) -> Result<()> {
        let chat = ChatApi::new(Arc::clone(&ctx.api));

        if let Some(message) = message {
            let reply = chat.send(&message).await?;
            println!("{}", reply);
            return Ok(());
        }

        tracing::info!("Starting interactive chat");
        let mut rl = DefaultEditor::new()?;
        println!("{}", "FinTrip assistant. Type /help for commands.".bold());

        loop {
            match rl.readline(&format!("{} ", "you>".cyan())) {
                Ok(line) => match parse_input(&line) {
                    ChatInput::Empty => continue,
                    ChatInput::Exit => break,
                    ChatInput::Help => print_help(),
                    ChatInput::Message(text) => {
                        rl.add_history_entry(text)?;
                        match chat.send(text).await {
                            Ok(reply) => println!("{} {}", "assistant>".green(), reply),
                            Err(e) => {
                                if matches!(
                                    e.downcast_ref::<FintripError>(),
                                    Some(FintripError::Unauthorized(_))
                                ) {
                                    return Err(e);
                                }
                                eprintln!("{}", user_message(&e).red());
                            }
                        }
                    }
                },
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}

// Weather command handler
pub mod weather {
    //! Forecast for a destination.

    use super::*;
    use crate::weather::PlaceWeather;
    use chrono::NaiveDate;

    /// Look up and print the forecast for `place` on `date` (today by default).
    pub async fn show_weather(ctx: &AppContext, place: &str, date: Option<NaiveDate>) -> Result<()> {
        let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
        let result = ctx.weather.weather_for_place(place, date).await?;
        print!("{}", render(&result));
        Ok(())
    }

    fn unit_suffix(units: &str) -> (&'static str, &'static str) {
        match units {
            "imperial" => ("°F", "mph"),
            "standard" => ("K", "m/s"),
            _ => ("°C", "m/s"),
        }
    }

    /// Plain-text rendering of a forecast.
    pub fn render(result: &PlaceWeather) -> String {
        let loc = &result.location;
        let w = &result.weather;
        let (temp_unit, speed_unit) = unit_suffix(&w.units);

        let mut place = loc.name.clone();
        if let Some(state) = &loc.state {
            place.push_str(&format!(", {}", state));
        }
        if let Some(country) = &loc.country {
            place.push_str(&format!(", {}", country));
        }

        let mut out = format!("{} on {}\n", place, w.date);
        out.push_str(&format!("  {}\n", w.description));
        out.push_str(&format!(
            "  {:.1}{unit} (low {:.1}{unit}, high {:.1}{unit})\n",
            w.temp_avg,
            w.temp_min,
            w.temp_max,
            unit = temp_unit
        ));
        out.push_str(&format!(
            "  humidity {:.0}%, wind up to {:.1} {}\n",
            w.humidity_avg, w.wind_speed_max, speed_unit
        ));
        for slot in &w.slots {
            out.push_str(&format!(
                "    {}  {:>5.1}{}  {}\n",
                slot.time.format("%H:%M UTC"),
                slot.temp,
                temp_unit,
                slot.description
            ));
        }
        out
    }
}
