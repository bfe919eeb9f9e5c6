use std::io::Write;

use tracing::{debug, info};
use weather_core::{DeclinedDemo, ProbeOutcome, WeatherProvider, demo_report};

use crate::prompt::{PromptError, Prompter};

/// Expected length of an OpenWeatherMap API key.
const API_KEY_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeDecision {
    /// Enter the interactive menu.
    StartMenu,
    Exit,
}

/// Check the API key once before the menu. Only a working key, or a declined
/// demo with [`DeclinedDemo::Continue`], leads to the menu.
pub async fn startup_probe<P, R, W>(
    provider: &P,
    prompter: &mut R,
    out: &mut W,
    api_key: &str,
    on_demo_declined: DeclinedDemo,
) -> anyhow::Result<ProbeDecision>
where
    P: WeatherProvider,
    R: Prompter,
    W: Write,
{
    writeln!(out, "🔐 Testing your OpenWeatherMap API key...")?;
    out.flush()?;

    let outcome = provider.probe().await;
    info!(valid = matches!(outcome, ProbeOutcome::Valid), "API key probe finished");

    match outcome {
        ProbeOutcome::Valid => {
            writeln!(out, "✅ API key is VALID and working!")?;
            writeln!(out, "Starting Weather App...\n")?;
            Ok(ProbeDecision::StartMenu)
        }
        ProbeOutcome::Unauthorized { test_url } => {
            writeln!(out, "❌ ERROR 401: Invalid API Key")?;
            writeln!(out, "\nDon't worry! This usually means:")?;
            writeln!(out, "1. Your key needs 10-15 minutes to activate (just wait)")?;
            writeln!(out, "2. Check if you verified your email")?;
            writeln!(out, "3. Make sure you're using HTTP (not HTTPS)")?;
            writeln!(out, "4. Run `weather configure` if no key is saved yet")?;
            writeln!(out, "\nYour key: {}", mask_key(api_key))?;
            writeln!(out, "{}", key_length_line(api_key))?;
            writeln!(out, "\n💡 Quick test in browser:")?;
            writeln!(out, "Open: {test_url}")?;
            out.flush()?;

            let answer = match prompter.ask("\nUse demo mode while waiting? (yes/no): ") {
                Ok(answer) => answer,
                Err(PromptError::Interrupted) => {
                    writeln!(out, "\n\nProgram interrupted. Exiting...")?;
                    return Ok(ProbeDecision::Exit);
                }
                Err(PromptError::Other(err)) => return Err(err),
            };

            if answer.trim().eq_ignore_ascii_case("yes") {
                writeln!(out, "{}", demo_report())?;
                return Ok(ProbeDecision::Exit);
            }

            Ok(match on_demo_declined {
                DeclinedDemo::Exit => ProbeDecision::Exit,
                DeclinedDemo::Continue => ProbeDecision::StartMenu,
            })
        }
        ProbeOutcome::Status { status, body } => {
            writeln!(out, "⚠️  Status {status}: {body}")?;
            writeln!(out, "\nTrying demo mode...")?;
            writeln!(out, "{}", demo_report())?;
            Ok(ProbeDecision::Exit)
        }
        ProbeOutcome::Unreachable(reason) => {
            debug!(%reason, "no connection to provider");
            writeln!(out, "❌ No internet connection. Please check your network.")?;
            writeln!(out, "\nTrying demo mode...")?;
            writeln!(out, "{}", demo_report())?;
            Ok(ProbeDecision::Exit)
        }
        ProbeOutcome::Failed(reason) => {
            writeln!(out, "❌ Error: {reason}")?;
            writeln!(out, "\nTrying demo mode...")?;
            writeln!(out, "{}", demo_report())?;
            Ok(ProbeDecision::Exit)
        }
    }
}

/// Show only the first and last four characters of the key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        n if n <= 8 => "*".repeat(n),
        n => {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[n - 4..].iter().collect();
            format!("{head}{}{tail}", "*".repeat(n - 8))
        }
    }
}

fn key_length_line(key: &str) -> String {
    let len = key.chars().count();
    if len == API_KEY_LEN {
        format!("Key length: {len} characters ✓")
    } else {
        format!("Key length: {len} characters ✗ (expected {API_KEY_LEN})")
    }
}
