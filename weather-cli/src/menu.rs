use std::io::Write;

use thiserror::Error;
use tracing::{debug, warn};
use weather_core::{
    LocationQuery, Units, WeatherProvider, classify_with_country, classify::is_postal_code,
    render::{render, rule},
};

use crate::prompt::{PromptError, Prompter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    MainMenu,
    CheckingWeather,
    ChangingUnits,
    Exited,
}

/// Failure of a single menu action.
#[derive(Debug, Error)]
enum ActionError {
    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<PromptError> for ActionError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::Interrupted => ActionError::Interrupted,
            PromptError::Other(e) => ActionError::Unexpected(e),
        }
    }
}

impl From<std::io::Error> for ActionError {
    fn from(err: std::io::Error) -> Self {
        ActionError::Unexpected(err.into())
    }
}

/// Interactive session: owns the provider, the prompts, stdout and the unit preference.
#[derive(Debug)]
pub struct Session<P, R, W> {
    provider: P,
    prompter: R,
    out: W,
    units: Units,
    default_country: String,
}

impl<P, R, W> Session<P, R, W>
where
    P: WeatherProvider,
    R: Prompter,
    W: Write,
{
    pub fn new(provider: P, prompter: R, out: W, units: Units, default_country: String) -> Self {
        Self { provider, prompter, out, units, default_country }
    }

    /// Run until the user exits or interrupts. Action failures never end the loop.
    ///
    /// Ctrl-C during a lookup ends the session like Ctrl-C at a prompt.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.run_until_interrupted(|| async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to install Ctrl-C handler");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Like [`Session::run`], but every action races a fresh future from
    /// `interrupt`; whichever finishes first wins, the action being polled first.
    pub async fn run_until_interrupted<F, S>(&mut self, mut interrupt: F) -> anyhow::Result<()>
    where
        F: FnMut() -> S,
        S: Future<Output = ()>,
    {
        self.welcome()?;

        let mut state = MenuState::MainMenu;
        while state != MenuState::Exited {
            let step = tokio::select! {
                biased;
                step = self.step(state) => step,
                () = interrupt() => Err(ActionError::Interrupted),
            };

            state = match step {
                Ok(next) => next,
                Err(ActionError::Interrupted) => {
                    writeln!(self.out, "\n\nProgram interrupted. Exiting...")?;
                    MenuState::Exited
                }
                Err(ActionError::Unexpected(err)) => {
                    warn!(error = %err, ?state, "menu action failed");
                    writeln!(self.out, "An unexpected error occurred: {err}")?;
                    MenuState::MainMenu
                }
            };
            debug!(?state, "menu transition");
        }

        Ok(())
    }

    async fn step(&mut self, state: MenuState) -> Result<MenuState, ActionError> {
        match state {
            MenuState::MainMenu => self.main_menu(),
            MenuState::CheckingWeather => self.check_weather().await.map(|()| MenuState::MainMenu),
            MenuState::ChangingUnits => self.change_units().map(|()| MenuState::MainMenu),
            MenuState::Exited => Ok(MenuState::Exited),
        }
    }

    fn welcome(&mut self) -> std::io::Result<()> {
        let heavy = rule('=', 50);
        writeln!(self.out, "{heavy}")?;
        writeln!(self.out, "🌤️  BASIC WEATHER APPLICATION 🌤️")?;
        writeln!(self.out, "{heavy}")?;
        writeln!(self.out, "\nWelcome to the Weather App!")?;
        writeln!(self.out, "You can search weather by city name or ZIP code.")
    }

    fn main_menu(&mut self) -> Result<MenuState, ActionError> {
        let light = rule('-', 30);
        writeln!(self.out, "\n{light}")?;
        writeln!(self.out, "MAIN MENU")?;
        writeln!(self.out, "{light}")?;
        writeln!(self.out, "1. Check weather by location")?;
        writeln!(self.out, "2. Change temperature units")?;
        writeln!(self.out, "3. Exit")?;
        self.out.flush()?;

        let choice = self.prompter.ask("\nEnter your choice (1-3): ")?;

        let next = match choice.trim() {
            "1" => MenuState::CheckingWeather,
            "2" => MenuState::ChangingUnits,
            "3" => {
                writeln!(self.out, "\nThank you for using the Weather App! Goodbye! 👋")?;
                MenuState::Exited
            }
            _ => {
                writeln!(self.out, "Invalid choice. Please enter 1, 2, or 3.")?;
                MenuState::MainMenu
            }
        };

        Ok(next)
    }

    async fn check_weather(&mut self) -> Result<(), ActionError> {
        self.out.flush()?;
        let location = self.prompter.ask("\nEnter city name or ZIP code: ")?;
        let location = location.trim();

        // Only postal codes need a country, so ask before classifying.
        let country = if is_postal_code(location) {
            let answer = self
                .prompter
                .ask("Enter country code (e.g., US, UK, IN) or press Enter for US: ")?;
            match answer.trim() {
                "" => self.default_country.clone(),
                code => code.to_string(),
            }
        } else {
            self.default_country.clone()
        };

        let query = match classify_with_country(location, &country) {
            Ok(query) => query,
            Err(_) => {
                writeln!(self.out, "Invalid input. Please try again.")?;
                return Ok(());
            }
        };

        match &query {
            LocationQuery::City { name } => debug!(%name, "looking up city"),
            LocationQuery::PostalCode { code, country } => {
                debug!(%code, %country, "looking up postal code")
            }
        }

        match self.provider.fetch(&query, self.units).await {
            Ok(raw) => writeln!(self.out, "{}", render(&raw, self.units))?,
            Err(err) => {
                warn!(error = %err, "weather lookup failed");
                writeln!(self.out, "Error fetching weather data: {err}")?;
                writeln!(
                    self.out,
                    "Could not retrieve weather data. Please check your input and try again."
                )?;
            }
        }

        Ok(())
    }

    fn change_units(&mut self) -> Result<(), ActionError> {
        let light = rule('-', 30);
        writeln!(self.out, "\n{light}")?;
        writeln!(self.out, "TEMPERATURE UNITS")?;
        writeln!(self.out, "{light}")?;
        writeln!(self.out, "1. {}", Units::Metric)?;
        writeln!(self.out, "2. {}", Units::Imperial)?;
        self.out.flush()?;

        let choice = self.prompter.ask("\nChoose temperature unit (1 or 2): ")?;

        let units = match choice.trim() {
            "1" => Units::Metric,
            "2" => Units::Imperial,
            _ => {
                writeln!(self.out, "Invalid choice. Keeping current units.")?;
                return Ok(());
            }
        };

        self.units = units;
        writeln!(
            self.out,
            "Temperature units changed to {} ({})",
            units.label(),
            units.temperature_symbol()
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::scripted::ScriptedPrompter;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use weather_core::{FetchError, ProbeOutcome, RawResponse};

    /// Records every request and answers with a canned body (or an error).
    #[derive(Debug, Clone, Default)]
    struct FakeProvider {
        requests: Arc<Mutex<Vec<String>>>,
        fail: bool,
        hang: bool,
    }

    impl FakeProvider {
        fn failing() -> Self {
            Self { fail: true, ..Self::default() }
        }

        /// Lookups never complete, like a server that stops answering.
        fn hanging() -> Self {
            Self { hang: true, ..Self::default() }
        }

        fn respond(&self, request: String) -> Result<RawResponse, FetchError> {
            self.requests.lock().unwrap().push(request);
            if self.fail {
                return Err(FetchError::Network("connection refused".into()));
            }
            Ok(serde_json::from_value(serde_json::json!({
                "cod": 200,
                "name": "New York",
                "main": {"temp": 20, "feels_like": 19, "humidity": 50, "pressure": 1015},
                "weather": [{"main": "Clear", "description": "clear sky"}],
                "wind": {"speed": 3.2},
                "sys": {"country": "US"}
            }))
            .unwrap())
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn fetch_by_city(&self, name: &str, units: Units) -> Result<RawResponse, FetchError> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.respond(format!("q={name}&units={}", units.as_str()))
        }

        async fn fetch_by_postal_code(
            &self,
            code: &str,
            country: &str,
            units: Units,
        ) -> Result<RawResponse, FetchError> {
            self.respond(format!("zip={code},{country}&units={}", units.as_str()))
        }

        async fn probe(&self) -> ProbeOutcome {
            ProbeOutcome::Valid
        }
    }

    async fn run_session(
        provider: FakeProvider,
        prompter: ScriptedPrompter,
    ) -> (String, Units, ScriptedPrompter) {
        let mut session = Session::new(provider, prompter, Vec::new(), Units::Metric, "US".into());
        session.run_until_interrupted(std::future::pending::<()>).await.unwrap();

        let Session { out, prompter, units, .. } = session;
        (String::from_utf8(out).unwrap(), units, prompter)
    }

    #[tokio::test]
    async fn exit_choice_prints_farewell() {
        let (out, _, _) = run_session(FakeProvider::default(), ScriptedPrompter::new(["3"])).await;

        assert!(out.contains("BASIC WEATHER APPLICATION"));
        assert!(out.contains("MAIN MENU"));
        assert!(out.ends_with("\nThank you for using the Weather App! Goodbye! 👋\n"));
    }

    #[tokio::test]
    async fn interrupt_at_menu_exits_cleanly() {
        let (out, _, _) = run_session(FakeProvider::default(), ScriptedPrompter::default()).await;

        assert!(out.ends_with("\n\nProgram interrupted. Exiting...\n"));
    }

    #[tokio::test]
    async fn invalid_menu_choice_shows_menu_again() {
        let (out, _, prompter) =
            run_session(FakeProvider::default(), ScriptedPrompter::new(["9", "3"])).await;

        assert!(out.contains("Invalid choice. Please enter 1, 2, or 3."));
        assert_eq!(out.matches("MAIN MENU").count(), 2);
        assert_eq!(prompter.asked.len(), 2);
    }

    #[tokio::test]
    async fn city_lookup_renders_report() {
        let provider = FakeProvider::default();
        let requests = provider.requests.clone();

        let (out, _, _) = run_session(provider, ScriptedPrompter::new(["1", "  New York ", "3"])).await;

        assert_eq!(*requests.lock().unwrap(), vec!["q=New York&units=metric"]);
        assert!(out.contains("WEATHER FORECAST - New York, US"));
        assert!(out.contains("Current Conditions: Clear Sky"));
        assert!(!out.contains("Wind Direction"));
    }

    #[tokio::test]
    async fn postal_code_defaults_country_to_us() {
        let provider = FakeProvider::default();
        let requests = provider.requests.clone();

        let (_, _, prompter) = run_session(provider, ScriptedPrompter::new(["1", "10001", "", "3"])).await;

        assert_eq!(*requests.lock().unwrap(), vec!["zip=10001,US&units=metric"]);
        assert!(prompter.asked[2].starts_with("Enter country code"));
    }

    #[tokio::test]
    async fn postal_code_uses_given_country() {
        let provider = FakeProvider::default();
        let requests = provider.requests.clone();

        run_session(provider, ScriptedPrompter::new(["1", "75008", "FR", "3"])).await;

        assert_eq!(*requests.lock().unwrap(), vec!["zip=75008,FR&units=metric"]);
    }

    #[tokio::test]
    async fn empty_location_is_rejected_without_fetch() {
        let provider = FakeProvider::default();
        let requests = provider.requests.clone();

        let (out, _, _) = run_session(provider, ScriptedPrompter::new(["1", "   ", "3"])).await;

        assert!(out.contains("Invalid input. Please try again."));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_fetch_reports_and_returns_to_menu() {
        let (out, _, _) =
            run_session(FakeProvider::failing(), ScriptedPrompter::new(["1", "London", "3"])).await;

        assert!(out.contains("Error fetching weather data: Connection failed: connection refused"));
        assert!(out.contains("Could not retrieve weather data."));
        assert!(out.contains("Goodbye!"));
    }

    #[tokio::test]
    async fn switching_to_fahrenheit_affects_next_fetch_and_render() {
        let provider = FakeProvider::default();
        let requests = provider.requests.clone();

        let (out, units, _) =
            run_session(provider, ScriptedPrompter::new(["2", "2", "1", "Boston", "3"])).await;

        assert_eq!(units, Units::Imperial);
        assert!(out.contains("1. Celsius (°C)\n2. Fahrenheit (°F)"));
        assert!(out.contains("Temperature units changed to Fahrenheit (°F)"));
        assert_eq!(*requests.lock().unwrap(), vec!["q=Boston&units=imperial"]);
        assert!(out.contains("Temperature: 20°F (Feels like: 19°F)"));
        assert!(out.contains("Wind Speed: 3.2 m/s"));
    }

    #[tokio::test]
    async fn invalid_unit_choice_keeps_current_units() {
        let (out, units, _) =
            run_session(FakeProvider::default(), ScriptedPrompter::new(["2", "x", "3"])).await;

        assert_eq!(units, Units::Metric);
        assert!(out.contains("Invalid choice. Keeping current units."));
    }

    #[tokio::test]
    async fn interrupt_inside_action_exits() {
        let provider = FakeProvider::default();
        let requests = provider.requests.clone();

        let (out, _, _) = run_session(provider, ScriptedPrompter::new(["1"])).await;

        assert!(out.ends_with("Program interrupted. Exiting...\n"));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unexpected_error_returns_to_menu() {
        let prompter = ScriptedPrompter::new(["1"])
            .then_fail(PromptError::Other(anyhow::anyhow!("terminal went away")))
            .then_answer("3");

        let (out, _, _) = run_session(FakeProvider::default(), prompter).await;

        assert!(out.contains("An unexpected error occurred: terminal went away"));
        assert_eq!(out.matches("MAIN MENU").count(), 2);
        assert!(out.contains("Goodbye!"));
    }

    #[tokio::test]
    async fn signal_during_lookup_exits_with_farewell() {
        let provider = FakeProvider::hanging();
        let prompter = ScriptedPrompter::new(["1", "London", "3"]);
        let mut session = Session::new(provider, prompter, Vec::new(), Units::Metric, "US".into());

        // Fires as soon as an action has to wait.
        session.run_until_interrupted(|| std::future::ready(())).await.unwrap();

        let Session { out, prompter, .. } = session;
        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("\n\nProgram interrupted. Exiting...\n"));
        assert!(!out.contains("Goodbye!"));
        assert_eq!(prompter.asked.len(), 2);
    }

    #[tokio::test]
    async fn pending_signal_does_not_preempt_prompts() {
        let prompter = ScriptedPrompter::new(["2", "2", "3"]);
        let mut session =
            Session::new(FakeProvider::default(), prompter, Vec::new(), Units::Metric, "US".into());

        session.run_until_interrupted(|| std::future::ready(())).await.unwrap();

        let Session { out, units, .. } = session;
        let out = String::from_utf8(out).unwrap();
        assert_eq!(units, Units::Imperial);
        assert!(out.ends_with("Goodbye! 👋\n"));
    }
}
